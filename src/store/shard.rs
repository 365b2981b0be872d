//! Keyspace Shard
//!
//! One partition of the keyspace. A shard owns three maps behind a single
//! `RwLock`: string values, hash values, and expiry deadlines. A key holds at
//! most one value kind at a time, and a deadline exists only while the key
//! itself does.
//!
//! ## Locking discipline
//!
//! Pure observers take the lock in shared mode. Mutations take it exclusive.
//! An observer that finds an expired key re-acquires the lock in exclusive
//! mode and evicts before reporting the key absent, so no caller ever sees a
//! value past its deadline even between sweeper ticks.
//!
//! Locks are never held across I/O; every operation runs to completion
//! synchronously under at most one acquisition mode at a time.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Instant;

/// The kind of value a key currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// The key is absent (or expired, which observers treat the same).
    None,
    /// An opaque byte string.
    String,
    /// A field-to-value mapping.
    Hash,
}

/// The three maps a shard owns. Guarded as a unit by the shard lock, which
/// keeps the one-kind-per-key invariant atomic with respect to readers.
#[derive(Debug, Default)]
struct Tables {
    strings: HashMap<Bytes, Bytes>,
    hashes: HashMap<Bytes, HashMap<Bytes, Bytes>>,
    ttls: HashMap<Bytes, Instant>,
}

impl Tables {
    /// True if the key has a deadline at or before `now`.
    fn is_expired(&self, key: &[u8], now: Instant) -> bool {
        self.ttls.get(key).is_some_and(|deadline| now >= *deadline)
    }

    /// True if the key holds a value of either kind.
    fn holds(&self, key: &[u8]) -> bool {
        self.strings.contains_key(key) || self.hashes.contains_key(key)
    }

    /// Removes the key from all three maps.
    fn evict(&mut self, key: &[u8]) {
        self.strings.remove(key);
        self.hashes.remove(key);
        self.ttls.remove(key);
    }
}

/// One partition of the keyspace with its own readers-writer lock.
#[derive(Debug, Default)]
pub struct Shard {
    tables: RwLock<Tables>,
}

impl Shard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evicts the key if its deadline has passed. Returns `true` if the key
    /// is now (or was already going to be treated as) absent.
    ///
    /// Checks under the read lock first so the common case of a live key
    /// costs no exclusive acquisition; only an actually-expired key pays for
    /// the write lock, where the expiry is re-checked before evicting.
    fn evict_if_expired(&self, key: &[u8], now: Instant) -> bool {
        {
            let tables = self.tables.read().unwrap();
            if !tables.is_expired(key, now) {
                return false;
            }
        }

        let mut tables = self.tables.write().unwrap();
        if tables.is_expired(key, now) {
            tables.evict(key);
            return true;
        }
        // Another writer replaced the deadline between the two acquisitions.
        false
    }

    // ------------------------------------------------------------------
    // String operations
    // ------------------------------------------------------------------

    /// Returns the string value, or `None` if the key is absent, expired, or
    /// holds a hash. Expired keys are evicted before returning.
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        let now = Instant::now();
        if self.evict_if_expired(key, now) {
            return None;
        }
        let tables = self.tables.read().unwrap();
        tables.strings.get(key).cloned()
    }

    /// Installs a string value. Any pre-existing hash at the key and any
    /// expiry are dropped: a fresh SET replaces the key wholesale.
    pub fn set(&self, key: Bytes, value: Bytes) {
        let mut tables = self.tables.write().unwrap();
        tables.hashes.remove(&key);
        tables.ttls.remove(&key);
        tables.strings.insert(key, value);
    }

    /// Removes the key from all maps. Returns `true` if a live value of
    /// either kind was present.
    pub fn del(&self, key: &[u8]) -> bool {
        let now = Instant::now();
        let mut tables = self.tables.write().unwrap();
        if tables.is_expired(key, now) {
            tables.evict(key);
            return false;
        }
        tables.ttls.remove(key);
        let had_string = tables.strings.remove(key).is_some();
        let had_hash = tables.hashes.remove(key).is_some();
        had_string || had_hash
    }

    // ------------------------------------------------------------------
    // Expiry operations
    // ------------------------------------------------------------------

    /// Installs or replaces the key's deadline, but only if the key currently
    /// holds a value. No-op for absent keys.
    pub fn set_expire(&self, key: &Bytes, deadline: Instant) {
        let mut tables = self.tables.write().unwrap();
        if tables.holds(key) {
            tables.ttls.insert(key.clone(), deadline);
        }
    }

    /// Remaining lifetime in milliseconds: `-2` if the key is absent, `-1`
    /// if present without a deadline, `0` if the deadline has elapsed
    /// (callers treat this as absent), otherwise the positive remainder.
    pub fn ttl_ms(&self, key: &[u8], now: Instant) -> i64 {
        let tables = self.tables.read().unwrap();
        if !tables.holds(key) {
            return -2;
        }
        match tables.ttls.get(key) {
            None => -1,
            Some(deadline) if now >= *deadline => 0,
            Some(deadline) => (*deadline - now).as_millis() as i64,
        }
    }

    /// Erases the key's deadline. The value itself is untouched.
    pub fn clear_expire(&self, key: &[u8]) {
        let mut tables = self.tables.write().unwrap();
        tables.ttls.remove(key);
    }

    /// Removes every key whose deadline is at or before `now`, values
    /// included. Called periodically by the sweeper.
    pub fn sweep(&self, now: Instant) {
        let mut tables = self.tables.write().unwrap();
        let due: Vec<Bytes> = tables
            .ttls
            .iter()
            .filter(|(_, deadline)| now >= **deadline)
            .map(|(key, _)| key.clone())
            .collect();
        for key in due {
            tables.evict(&key);
        }
    }

    /// The key's current value kind, evicting first if it has expired.
    pub fn kind_of(&self, key: &[u8], now: Instant) -> ValueKind {
        if self.evict_if_expired(key, now) {
            return ValueKind::None;
        }
        let tables = self.tables.read().unwrap();
        if tables.strings.contains_key(key) {
            ValueKind::String
        } else if tables.hashes.contains_key(key) {
            ValueKind::Hash
        } else {
            ValueKind::None
        }
    }

    // ------------------------------------------------------------------
    // Hash operations
    // ------------------------------------------------------------------

    /// Inserts or overwrites one field. Returns `1` if the field was newly
    /// created, `0` if an existing field was updated.
    pub fn hset(&self, key: &Bytes, field: Bytes, value: Bytes) -> i64 {
        let now = Instant::now();
        let mut tables = self.tables.write().unwrap();
        if tables.is_expired(key, now) {
            tables.evict(key);
        }
        let hash = tables.hashes.entry(key.clone()).or_default();
        if hash.insert(field, value).is_none() {
            1
        } else {
            0
        }
    }

    /// Returns the field's value, or `None` if the key or field is absent.
    pub fn hget(&self, key: &[u8], field: &[u8]) -> Option<Bytes> {
        let now = Instant::now();
        if self.evict_if_expired(key, now) {
            return None;
        }
        let tables = self.tables.read().unwrap();
        tables.hashes.get(key)?.get(field).cloned()
    }

    /// Removes one field. Returns `1` if it existed. A hash left empty is
    /// removed entirely, along with the key's deadline if nothing else holds
    /// the key.
    pub fn hdel(&self, key: &[u8], field: &[u8]) -> i64 {
        let now = Instant::now();
        let mut tables = self.tables.write().unwrap();
        if tables.is_expired(key, now) {
            tables.evict(key);
            return 0;
        }
        let Some(hash) = tables.hashes.get_mut(key) else {
            return 0;
        };
        let removed = hash.remove(field).is_some();
        if hash.is_empty() {
            tables.hashes.remove(key);
            if !tables.strings.contains_key(key) {
                tables.ttls.remove(key);
            }
        }
        i64::from(removed)
    }

    /// `1` if the field exists, else `0`.
    pub fn hexists(&self, key: &[u8], field: &[u8]) -> i64 {
        let now = Instant::now();
        if self.evict_if_expired(key, now) {
            return 0;
        }
        let tables = self.tables.read().unwrap();
        let present = tables
            .hashes
            .get(key)
            .is_some_and(|hash| hash.contains_key(field));
        i64::from(present)
    }

    /// Number of fields in the hash, `0` if the key is absent.
    pub fn hlen(&self, key: &[u8]) -> i64 {
        let now = Instant::now();
        if self.evict_if_expired(key, now) {
            return 0;
        }
        let tables = self.tables.read().unwrap();
        tables.hashes.get(key).map_or(0, |hash| hash.len() as i64)
    }

    /// All fields and values as a flat `[f1, v1, f2, v2, ...]` sequence.
    /// Iteration order is unspecified.
    pub fn hgetall(&self, key: &[u8]) -> Vec<Bytes> {
        let now = Instant::now();
        if self.evict_if_expired(key, now) {
            return Vec::new();
        }
        let tables = self.tables.read().unwrap();
        let Some(hash) = tables.hashes.get(key) else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(hash.len() * 2);
        for (field, value) in hash {
            out.push(field.clone());
            out.push(value.clone());
        }
        out
    }
}
