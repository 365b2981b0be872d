//! Connection Handling
//!
//! Per-client plumbing between the socket and the dispatch pool.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP listener                           │
//! │                       (main.rs)                             │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │ accept() → spawn
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Session                              │
//! │                                                             │
//! │  read half ──▶ parse buffer ──▶ frames ──▶ worker pool      │
//! │                                               │             │
//! │  write half ◀── reply lane (ordered) ◀────────┘             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each session splits its socket: the read side parses and submits frames,
//! a writer task serializes replies back in request order. See
//! [`session`] for the ordering mechanics.

pub mod session;

pub use session::{handle_connection, ConnectionStats, SessionError};
