//! Command Dispatch
//!
//! The routing layer between parsed frames and the store.
//!
//! ```text
//! Parsed frame (Vec<Bytes>)
//!       │
//!       ▼
//! ┌─────────────────┐
//! │     Router      │
//! │                 │
//! │  - arity check  │
//! │  - kind check   │
//! │  - execute      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │      Store      │
//! └─────────────────┘
//! ```
//!
//! Handlers produce ready-to-send reply bytes, so workers on the dispatch
//! pool hand finished wire data back to the connection's write lane.

pub mod router;

pub use router::Router;
