//! Sharded Store
//!
//! The store owns a fixed set of [`Shard`]s and routes every key to its
//! owning shard with a stable hash. The shard count is chosen once at
//! startup; after that the key-to-shard mapping never changes.
//!
//! Multi-key commands resolve each key through the store independently, so
//! locking stays per-shard and no operation ever holds two shard locks at
//! once.

use crate::store::shard::Shard;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::Instant;

/// The fixed set of shards making up the keyspace.
#[derive(Debug)]
pub struct Store {
    shards: Vec<Shard>,
}

impl Store {
    /// Creates a store with `n_shards` partitions (minimum 1).
    pub fn new(n_shards: usize) -> Self {
        let n_shards = n_shards.max(1);
        let shards = (0..n_shards).map(|_| Shard::new()).collect();
        Self { shards }
    }

    /// Index of the shard owning `key`. A pure function of the key and the
    /// shard count.
    #[inline]
    fn shard_index(&self, key: &[u8]) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shards.len()
    }

    /// The shard owning `key`.
    #[inline]
    pub fn shard_for(&self, key: &[u8]) -> &Shard {
        &self.shards[self.shard_index(key)]
    }

    /// Number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Runs an expiry sweep on every shard. Each shard acquires only its own
    /// lock, so a slow shard never blocks the others' readers for longer
    /// than its own sweep.
    pub fn sweep_all(&self, now: Instant) {
        for shard in &self.shards {
            shard.sweep(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::time::Duration;

    #[test]
    fn zero_shards_clamps_to_one() {
        assert_eq!(Store::new(0).shard_count(), 1);
        assert_eq!(Store::new(16).shard_count(), 16);
    }

    #[test]
    fn shard_assignment_is_stable() {
        let store = Store::new(8);
        let a = store.shard_index(b"some-key");
        for _ in 0..100 {
            assert_eq!(store.shard_index(b"some-key"), a);
        }
    }

    #[test]
    fn keys_round_trip_through_their_shard() {
        let store = Store::new(4);
        for i in 0..64 {
            let key = Bytes::from(format!("key-{}", i));
            store.shard_for(&key).set(key.clone(), Bytes::from("v"));
            assert_eq!(store.shard_for(&key).get(&key), Some(Bytes::from("v")));
        }
    }

    #[test]
    fn sweep_all_covers_every_shard() {
        let store = Store::new(4);
        for i in 0..64 {
            let key = Bytes::from(format!("key-{}", i));
            let shard = store.shard_for(&key);
            shard.set(key.clone(), Bytes::from("v"));
            shard.set_expire(&key, Instant::now() + Duration::from_millis(5));
        }

        std::thread::sleep(Duration::from_millis(20));
        store.sweep_all(Instant::now());

        for i in 0..64 {
            let key = Bytes::from(format!("key-{}", i));
            assert_eq!(store.shard_for(&key).ttl_ms(&key, Instant::now()), -2);
        }
    }
}
