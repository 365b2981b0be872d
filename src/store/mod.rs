//! Sharded Keyspace
//!
//! Storage layer for the server: a fixed set of shards, each holding one
//! partition of the keyspace behind its own readers-writer lock.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Store                               │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │           │
//! │  │ 3 maps  │ │ 3 maps  │ │ 3 maps  │ │ 3 maps  │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                            │ sweep_all, every 200 ms
//!              ┌─────────────┴─────────────┐
//!              │          Sweeper          │
//!              │   (background tokio task) │
//!              └───────────────────────────┘
//! ```
//!
//! Each shard keeps strings, hashes, and expiry deadlines for its keys. A
//! key holds one value kind at a time. Expired keys are evicted lazily at
//! observation and actively by the [`Sweeper`].
//!
//! ## Example
//!
//! ```
//! use flintkv::store::Store;
//! use bytes::Bytes;
//!
//! let store = Store::new(4);
//! let key = Bytes::from("name");
//!
//! store.shard_for(&key).set(key.clone(), Bytes::from("flint"));
//! assert_eq!(store.shard_for(&key).get(&key), Some(Bytes::from("flint")));
//! ```

pub mod engine;
pub mod shard;
pub mod sweeper;

pub use engine::Store;
pub use shard::{Shard, ValueKind};
pub use sweeper::{start_sweeper, Sweeper, SweeperConfig};
