//! flintkv server entry point.
//!
//! Parses startup options, wires the store, router, worker pool, and
//! sweeper together, then runs the accept loop until Ctrl+C.

use flintkv::commands::Router;
use flintkv::connection::{handle_connection, ConnectionStats};
use flintkv::store::{start_sweeper, Store};
use flintkv::worker::WorkerPool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Server configuration.
struct Config {
    /// Port to listen on.
    port: u16,
    /// Number of keyspace shards. 0 means auto (hardware concurrency).
    shards: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: flintkv::DEFAULT_PORT,
            shards: 0,
        }
    }
}

impl Config {
    /// Parses configuration from command-line arguments.
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--port" | "-p" => {
                    if i + 1 < args.len() {
                        config.port = args[i + 1].parse().unwrap_or_else(|_| {
                            eprintln!("Error: invalid port number");
                            std::process::exit(1);
                        });
                        i += 2;
                    } else {
                        eprintln!("Error: --port requires a value");
                        std::process::exit(1);
                    }
                }
                "--shards" => {
                    if i + 1 < args.len() {
                        config.shards = args[i + 1].parse().unwrap_or_else(|_| {
                            eprintln!("Error: invalid shard count");
                            std::process::exit(1);
                        });
                        i += 2;
                    } else {
                        eprintln!("Error: --shards requires a value");
                        std::process::exit(1);
                    }
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("flintkv version {}", flintkv::VERSION);
                    std::process::exit(0);
                }
                arg if i == 1 && arg.bytes().all(|b| b.is_ascii_digit()) => {
                    // Backward-compat: a bare integer first argument is the port.
                    config.port = arg.parse().unwrap_or_else(|_| {
                        eprintln!("Error: invalid port number");
                        std::process::exit(1);
                    });
                    i += 1;
                }
                other => {
                    eprintln!("Unknown argument: {}", other);
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        config
    }

    fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    /// Shard count after resolving auto mode.
    fn shard_count(&self) -> usize {
        if self.shards > 0 {
            self.shards
        } else {
            num_cpus::get().max(1)
        }
    }
}

fn print_help() {
    println!(
        r#"flintkv - A Sharded In-Memory Key-Value Server

USAGE:
    flintkv [PORT] [OPTIONS]

OPTIONS:
    -p, --port <PORT>    Port to listen on (default: 6379)
        --shards <N>     Number of keyspace shards (default: CPU count)
    -v, --version        Print version information
        --help           Print this help message

CONNECTING:
    Use redis-cli or any Redis client:
    $ redis-cli -p 6379
    127.0.0.1:6379> PING
    PONG
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_args();

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let shards = config.shard_count();
    let store = Arc::new(Store::new(shards));
    let router = Arc::new(Router::new(Arc::clone(&store)));
    let pool = Arc::new(WorkerPool::new(WorkerPool::default_threads()));
    let stats = Arc::new(ConnectionStats::new());
    info!(shards, workers = pool.size(), "storage initialized");

    let _sweeper = start_sweeper(Arc::clone(&store));

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("listening on {}", config.bind_address());
    println!(
        "flintkv v{} on port {} with {} shard{}",
        flintkv::VERSION,
        config.port,
        shards,
        if shards == 1 { "" } else { "s" }
    );

    let shutdown = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
        info!("shutdown signal received, stopping server");
    };

    tokio::select! {
        _ = accept_loop(listener, router, pool, stats) => {}
        _ = shutdown => {}
    }

    info!("server shutdown complete");
    Ok(())
}

/// Accepts connections forever, spawning one session task per client.
async fn accept_loop(
    listener: TcpListener,
    router: Arc<Router>,
    pool: Arc<WorkerPool>,
    stats: Arc<ConnectionStats>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                tokio::spawn(handle_connection(
                    stream,
                    addr,
                    Arc::clone(&router),
                    Arc::clone(&pool),
                    Arc::clone(&stats),
                ));
            }
            Err(e) => {
                error!("failed to accept connection: {}", e);
            }
        }
    }
}
