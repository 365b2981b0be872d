//! # flintkv - A Sharded In-Memory Key-Value Server
//!
//! flintkv is a Redis-compatible, in-memory key-value server speaking a
//! RESP2 subset. It stores binary-safe strings and hashes, supports
//! millisecond-precision expiration, and executes pipelined commands
//! concurrently while keeping per-connection reply order.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                               flintkv                                │
//! │                                                                      │
//! │  ┌────────────┐    ┌────────────┐    ┌─────────────┐                 │
//! │  │  Listener  │───▶│  Session   │───▶│ Worker pool │                 │
//! │  │ (tokio)    │    │ read+parse │    │ (dispatch)  │                 │
//! │  └────────────┘    └─────┬──────┘    └──────┬──────┘                 │
//! │                          │                  │                        │
//! │                    reply lane ◀─────────────┤ Router                 │
//! │                  (ordered writes)           ▼                        │
//! │                     ┌───────────────────────────────────────────┐    │
//! │                     │                  Store                    │    │
//! │                     │  ┌────────┐ ┌────────┐ ┌────────┐         │    │
//! │                     │  │Shard 0 │ │Shard 1 │ │Shard N │ ◀─────┐ │    │
//! │                     │  │RwLock  │ │RwLock  │ │RwLock  │       │ │    │
//! │                     │  └────────┘ └────────┘ └────────┘   Sweeper    │
//! │                     └───────────────────────────────────────────┘    │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Bytes arrive on a socket; the session appends them to a parse buffer and
//! extracts complete frames; each frame goes to the worker pool, where the
//! router resolves the owning shard, executes, and produces reply bytes;
//! the session's writer lane delivers replies in submission order. A
//! periodic sweeper evicts expired keys that nothing observes.
//!
//! ## Supported commands
//!
//! - Connection: `PING [msg]`, `ECHO msg`
//! - Strings: `SET key value [EX s | PX ms]`, `GET`, `DEL`, `EXISTS`,
//!   `MSET`, `MGET`
//! - Expiry: `EXPIRE`, `PEXPIRE`, `PERSIST`, `TTL`
//! - Keys: `TYPE`
//! - Hashes: `HSET`, `HGET`, `HDEL`, `HEXISTS`, `HLEN`, `HGETALL`, `HMGET`
//!
//! ## Module overview
//!
//! - [`protocol`]: RESP2 request parser and reply emitters
//! - [`store`]: sharded keyspace with TTL support and the sweeper
//! - [`commands`]: command table, validation, execution
//! - [`connection`]: per-client session pipeline
//! - [`worker`]: the dispatch thread pool
//!
//! ## Design highlights
//!
//! The keyspace is split across independently locked shards; a key's shard
//! is a stable hash of its bytes, fixed at startup. Observers take a shard's
//! lock shared, mutations take it exclusive, and expired keys are evicted
//! the moment anything observes them. Dispatch runs off the I/O thread on a
//! dedicated pool, with a per-session reply lane restoring request order.

pub mod commands;
pub mod connection;
pub mod protocol;
pub mod store;
pub mod worker;

pub use commands::Router;
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{parse_frame, Parsed, Reply};
pub use store::{start_sweeper, Store, Sweeper, SweeperConfig};
pub use worker::WorkerPool;

/// The default port the server listens on (same as Redis).
pub const DEFAULT_PORT: u16 = 6379;

/// Version of flintkv.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
