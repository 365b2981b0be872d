//! Client Session
//!
//! One session per accepted socket. The socket is split in two: the session
//! task owns the read half and the parse buffer, a companion writer task
//! owns the write half and the reply lane.
//!
//! ## Pipelining and reply order
//!
//! Commands execute concurrently on the worker pool, but RESP requires
//! replies in request order. The session threads a oneshot through the lane
//! for every submitted frame *before* handing the frame to the pool:
//!
//! ```text
//! read half ──parse──▶ frame ──▶ worker pool ──▶ reply bytes
//!                        │                           │
//!                        │ slot (oneshot)            │ fills slot
//!                        ▼                           ▼
//!                  reply lane (FIFO) ──await──▶ write half
//! ```
//!
//! The writer resolves slots strictly in lane order, so a fast command
//! queued behind a slow one waits its turn. That is the whole ordering
//! story - the pool itself promises nothing.
//!
//! ## Teardown
//!
//! Read or write errors close the session silently. Jobs already on the
//! pool still run; their replies land in a closed lane and are dropped.

use crate::commands::Router;
use crate::protocol::{parse_frame, Parsed, Reply};
use crate::worker::WorkerPool;
use bytes::{Buf, Bytes, BytesMut};
use std::net::SocketAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

/// Hard cap on the per-session parse buffer (64 KB).
const MAX_BUFFER_SIZE: usize = 64 * 1024;

/// Initial parse buffer capacity.
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Canned reply for malformed framing.
const PROTO_ERROR_REPLY: &[u8] = b"-ERR proto\r\n";

/// Counters shared across all sessions.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total connections accepted.
    pub connections_accepted: AtomicU64,
    /// Currently open connections.
    pub active_connections: AtomicU64,
    /// Frames handed to the worker pool.
    pub commands_dispatched: AtomicU64,
    /// Bytes read off client sockets.
    pub bytes_read: AtomicU64,
    /// Bytes written back to clients.
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    fn command_dispatched(&self) {
        self.commands_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    fn add_bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    fn add_bytes_written(&self, count: usize) {
        self.bytes_written.fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// One entry in the reply lane. Protocol errors are ready immediately;
/// dispatched commands resolve when their worker finishes.
enum ReplySlot {
    Ready(Bytes),
    Pending(oneshot::Receiver<Bytes>),
}

/// Why a session ended.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("client disconnected")]
    ClientDisconnected,

    #[error("connection closed mid-frame")]
    UnexpectedEof,

    #[error("parse buffer limit exceeded")]
    BufferFull,
}

/// The read side of one client connection.
pub struct Session {
    reader: OwnedReadHalf,
    addr: SocketAddr,
    pending: BytesMut,
    router: Arc<Router>,
    pool: Arc<WorkerPool>,
    lane_tx: mpsc::UnboundedSender<ReplySlot>,
    stats: Arc<ConnectionStats>,
}

impl Session {
    /// Reads, parses, and submits frames until the connection ends.
    async fn run(&mut self) -> Result<(), SessionError> {
        loop {
            // Drain every complete frame already buffered before re-arming
            // the read, so a pipelined burst dispatches in one pass.
            loop {
                match parse_frame(&self.pending) {
                    Parsed::Incomplete => break,
                    Parsed::Frame { args, consumed } => {
                        self.pending.advance(consumed);
                        trace!(client = %self.addr, consumed, "dispatching frame");
                        self.submit(args);
                    }
                    Parsed::Error { error, skip } => {
                        warn!(client = %self.addr, %error, "protocol error");
                        let _ = self
                            .lane_tx
                            .send(ReplySlot::Ready(Bytes::from_static(PROTO_ERROR_REPLY)));
                        // Always make progress past the malformed token.
                        self.pending
                            .advance(skip.max(1).min(self.pending.len()));
                    }
                }
            }

            self.read_more().await?;
        }
    }

    /// Reserves a slot in the reply lane, then hands the frame to the pool.
    /// The slot reservation happens first - that is what pins this frame's
    /// reply position regardless of worker scheduling.
    fn submit(&self, args: Vec<Bytes>) {
        let (tx, rx) = oneshot::channel();
        if self.lane_tx.send(ReplySlot::Pending(rx)).is_err() {
            // Writer already gone; the connection is tearing down.
            return;
        }
        self.stats.command_dispatched();

        let router = Arc::clone(&self.router);
        self.pool.execute(move || {
            let reply = match catch_unwind(AssertUnwindSafe(|| router.dispatch(&args))) {
                Ok(reply) => reply,
                Err(panic) => server_error_reply(panic.as_ref()),
            };
            // The session may have closed while we ran; the reply is
            // simply dropped in that case.
            let _ = tx.send(reply);
        });
    }

    /// Reads another chunk off the socket into the parse buffer.
    async fn read_more(&mut self) -> Result<(), SessionError> {
        if self.pending.len() >= MAX_BUFFER_SIZE {
            return Err(SessionError::BufferFull);
        }
        if self.pending.capacity() - self.pending.len() < 1024 {
            self.pending.reserve(4096);
        }

        let n = self.reader.read_buf(&mut self.pending).await?;
        if n == 0 {
            return if self.pending.is_empty() {
                Err(SessionError::ClientDisconnected)
            } else {
                Err(SessionError::UnexpectedEof)
            };
        }
        self.stats.add_bytes_read(n);
        Ok(())
    }
}

/// Converts a caught panic payload into a `-ERR server error` reply.
fn server_error_reply(panic: &(dyn std::any::Any + Send)) -> Bytes {
    let msg = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned());
    match msg {
        Some(m) => Reply::error(format!("server error: {}", m.replace(['\r', '\n'], " "))),
        None => Reply::error("server error"),
    }
    .into_bytes()
}

/// The single-writer half: pulls slots off the lane in FIFO order, resolves
/// each to its reply bytes, and writes them to the socket.
async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut lane_rx: mpsc::UnboundedReceiver<ReplySlot>,
    stats: Arc<ConnectionStats>,
) {
    while let Some(slot) = lane_rx.recv().await {
        let reply = match slot {
            ReplySlot::Ready(bytes) => bytes,
            ReplySlot::Pending(rx) => match rx.await {
                Ok(bytes) => bytes,
                // Pool shut down before the job ran; nothing sane to send.
                Err(_) => break,
            },
        };
        if writer.write_all(&reply).await.is_err() {
            // Transport failure: close silently, remaining replies drop.
            break;
        }
        stats.add_bytes_written(reply.len());
    }
}

/// Runs one client connection to completion.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    router: Arc<Router>,
    pool: Arc<WorkerPool>,
    stats: Arc<ConnectionStats>,
) {
    stats.connection_opened();
    info!(client = %addr, "client connected");

    let (reader, writer) = stream.into_split();
    let (lane_tx, lane_rx) = mpsc::unbounded_channel();
    let writer_task = tokio::spawn(write_loop(writer, lane_rx, Arc::clone(&stats)));

    let mut session = Session {
        reader,
        addr,
        pending: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
        router,
        pool,
        lane_tx,
        stats: Arc::clone(&stats),
    };

    let result = session.run().await;
    match &result {
        Err(SessionError::ClientDisconnected) => {
            debug!(client = %addr, "client disconnected")
        }
        Err(SessionError::Io(e)) if e.kind() == std::io::ErrorKind::ConnectionReset => {
            debug!(client = %addr, "connection reset by client")
        }
        Err(e) => debug!(client = %addr, error = %e, "session closed"),
        Ok(()) => {}
    }

    // Dropping the session closes the lane; the writer drains what is
    // already queued (including a trailing proto-error reply) and exits.
    drop(session);
    let _ = writer_task.await;

    stats.connection_closed();
}
