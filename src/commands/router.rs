//! Command Router
//!
//! Maps an uppercased command name to its handler, validates arity and
//! argument syntax, enforces value-kind preconditions, and executes against
//! the store. Handlers receive the full argument list (the command name is
//! the first argument) and produce a ready-to-send reply.
//!
//! ## Validation order
//!
//! Arity, numeric parsing, and syntax are all checked before any state is
//! touched, so a rejected command never leaves a partial write behind. Kind
//! checks go through [`Shard::kind_of`], which lazily evicts expired keys -
//! every keyed command therefore observes a keyspace with no stale entries.
//!
//! ## Multi-key commands
//!
//! MGET, MSET, and EXISTS resolve each key through the store independently
//! and take one shard lock at a time. There is no cross-shard atomicity: a
//! concurrent observer may see a partially applied MSET. Each command still
//! returns a single reply built from its own per-shard observations.
//!
//! [`Shard::kind_of`]: crate::store::Shard::kind_of

use crate::protocol::{parse_int, Reply};
use crate::store::{Store, ValueKind};
use bytes::Bytes;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Error payload for commands issued against the wrong value kind.
const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

/// Dispatches parsed command frames against the store.
#[derive(Debug, Clone)]
pub struct Router {
    store: Arc<Store>,
}

impl Router {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Executes one command frame and returns the serialized reply.
    ///
    /// `args[0]` is the command name; matching is case-insensitive.
    pub fn dispatch(&self, args: &[Bytes]) -> Bytes {
        self.route(args).into_bytes()
    }

    fn route(&self, args: &[Bytes]) -> Reply {
        if args.is_empty() {
            return Reply::error("empty");
        }
        let cmd = String::from_utf8_lossy(&args[0]).to_uppercase();

        match cmd.as_str() {
            "PING" => self.cmd_ping(args),
            "ECHO" => self.cmd_echo(args),

            "SET" => self.cmd_set(args),
            "GET" => self.cmd_get(args),
            "DEL" => self.cmd_del(args),
            "EXISTS" => self.cmd_exists(args),
            "MSET" => self.cmd_mset(args),
            "MGET" => self.cmd_mget(args),

            "EXPIRE" => self.cmd_expire(args),
            "PEXPIRE" => self.cmd_pexpire(args),
            "PERSIST" => self.cmd_persist(args),
            "TTL" => self.cmd_ttl(args),
            "TYPE" => self.cmd_type(args),

            "HSET" => self.cmd_hset(args),
            "HGET" => self.cmd_hget(args),
            "HDEL" => self.cmd_hdel(args),
            "HEXISTS" => self.cmd_hexists(args),
            "HLEN" => self.cmd_hlen(args),
            "HGETALL" => self.cmd_hgetall(args),
            "HMGET" => self.cmd_hmget(args),

            _ => Reply::error("unknown command"),
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn wrong_args(cmd: &str) -> Reply {
        Reply::error(format!("wrong #args for '{}'", cmd))
    }

    fn wrongtype() -> Reply {
        Reply::raw_error(WRONGTYPE)
    }

    fn not_an_integer() -> Reply {
        Reply::error("value is not an integer or out of range")
    }

    /// The key's current kind, evicting it first if expired. Every keyed
    /// command goes through here before touching the value maps.
    fn kind(&self, key: &[u8]) -> ValueKind {
        self.store.shard_for(key).kind_of(key, Instant::now())
    }

    /// Absolute deadline `ms` milliseconds from now. Non-positive durations
    /// clamp to zero (expired on next observation). `None` if the deadline
    /// is not representable.
    fn deadline_after_ms(ms: i64) -> Option<Instant> {
        let ms = ms.max(0) as u64;
        Instant::now().checked_add(Duration::from_millis(ms))
    }

    // ------------------------------------------------------------------
    // Connection commands
    // ------------------------------------------------------------------

    /// PING [msg]
    fn cmd_ping(&self, args: &[Bytes]) -> Reply {
        match args.len() {
            1 => Reply::pong(),
            2 => Reply::bulk(args[1].clone()),
            _ => Self::wrong_args("ping"),
        }
    }

    /// ECHO msg
    fn cmd_echo(&self, args: &[Bytes]) -> Reply {
        if args.len() != 2 {
            return Self::wrong_args("echo");
        }
        Reply::bulk(args[1].clone())
    }

    // ------------------------------------------------------------------
    // String commands
    // ------------------------------------------------------------------

    /// SET key value [EX seconds | PX milliseconds]
    fn cmd_set(&self, args: &[Bytes]) -> Reply {
        if args.len() < 3 {
            return Self::wrong_args("set");
        }

        // Either the bare form or exactly one EX/PX option.
        let ttl_ms = match args.len() {
            3 => None,
            5 => {
                let opt = String::from_utf8_lossy(&args[3]).to_uppercase();
                let amount = match parse_int(&args[4]) {
                    Some(n) => n,
                    None => return Self::not_an_integer(),
                };
                match opt.as_str() {
                    "EX" => match amount.checked_mul(1000) {
                        Some(ms) => Some(ms),
                        None => return Self::not_an_integer(),
                    },
                    "PX" => Some(amount),
                    _ => return Reply::error("syntax error"),
                }
            }
            _ => return Reply::error("syntax error"),
        };

        let deadline = match ttl_ms {
            Some(ms) => match Self::deadline_after_ms(ms) {
                Some(deadline) => Some(deadline),
                None => return Self::not_an_integer(),
            },
            None => None,
        };

        let key = &args[1];
        let shard = self.store.shard_for(key);
        shard.set(key.clone(), args[2].clone());
        if let Some(deadline) = deadline {
            shard.set_expire(key, deadline);
        }
        Reply::ok()
    }

    /// GET key
    fn cmd_get(&self, args: &[Bytes]) -> Reply {
        if args.len() != 2 {
            return Self::wrong_args("get");
        }
        let key = &args[1];
        if self.kind(key) == ValueKind::Hash {
            return Self::wrongtype();
        }
        match self.store.shard_for(key).get(key) {
            Some(value) => Reply::bulk(value),
            None => Reply::nil(),
        }
    }

    /// DEL key
    fn cmd_del(&self, args: &[Bytes]) -> Reply {
        if args.len() != 2 {
            return Self::wrong_args("del");
        }
        let key = &args[1];
        let deleted = self.store.shard_for(key).del(key);
        Reply::integer(i64::from(deleted))
    }

    /// EXISTS key [key ...]
    fn cmd_exists(&self, args: &[Bytes]) -> Reply {
        if args.len() < 2 {
            return Self::wrong_args("exists");
        }
        let count = args[1..]
            .iter()
            .filter(|key| self.kind(key) != ValueKind::None)
            .count();
        Reply::integer(count as i64)
    }

    /// MSET key value [key value ...]
    fn cmd_mset(&self, args: &[Bytes]) -> Reply {
        if args.len() < 3 || (args.len() - 1) % 2 != 0 {
            return Self::wrong_args("mset");
        }
        for pair in args[1..].chunks(2) {
            let key = &pair[0];
            self.store.shard_for(key).set(key.clone(), pair[1].clone());
        }
        Reply::ok()
    }

    /// MGET key [key ...]
    fn cmd_mget(&self, args: &[Bytes]) -> Reply {
        if args.len() < 2 {
            return Self::wrong_args("mget");
        }

        // Kind check across all targets before reading any of them.
        for key in &args[1..] {
            if self.kind(key) == ValueKind::Hash {
                return Self::wrongtype();
            }
        }

        let values = args[1..]
            .iter()
            .map(|key| match self.store.shard_for(key).get(key) {
                Some(value) => Reply::bulk(value),
                None => Reply::nil(),
            })
            .collect();
        Reply::array(values)
    }

    // ------------------------------------------------------------------
    // Expiry commands
    // ------------------------------------------------------------------

    /// EXPIRE key seconds
    fn cmd_expire(&self, args: &[Bytes]) -> Reply {
        if args.len() != 3 {
            return Reply::error("wrong number of arguments for 'expire'");
        }
        let Some(seconds) = parse_int(&args[2]) else {
            return Self::not_an_integer();
        };
        let Some(ms) = seconds.checked_mul(1000) else {
            return Self::not_an_integer();
        };
        self.apply_expire(&args[1], ms)
    }

    /// PEXPIRE key milliseconds
    fn cmd_pexpire(&self, args: &[Bytes]) -> Reply {
        if args.len() != 3 {
            return Self::wrong_args("pexpire");
        }
        let Some(ms) = parse_int(&args[2]) else {
            return Self::not_an_integer();
        };
        self.apply_expire(&args[1], ms)
    }

    fn apply_expire(&self, key: &Bytes, ms: i64) -> Reply {
        if self.kind(key) == ValueKind::None {
            return Reply::integer(0);
        }
        let Some(deadline) = Self::deadline_after_ms(ms) else {
            return Self::not_an_integer();
        };
        self.store.shard_for(key).set_expire(key, deadline);
        Reply::integer(1)
    }

    /// PERSIST key
    fn cmd_persist(&self, args: &[Bytes]) -> Reply {
        if args.len() != 2 {
            return Self::wrong_args("persist");
        }
        let key = &args[1];
        if self.kind(key) == ValueKind::None {
            return Reply::integer(0);
        }
        self.store.shard_for(key).clear_expire(key);
        Reply::integer(1)
    }

    /// TTL key - remaining lifetime in seconds, rounded up.
    fn cmd_ttl(&self, args: &[Bytes]) -> Reply {
        if args.len() != 2 {
            return Reply::error("wrong number of arguments for 'ttl'");
        }
        let key = &args[1];
        if self.kind(key) == ValueKind::None {
            return Reply::integer(-2);
        }
        match self.store.shard_for(key).ttl_ms(key, Instant::now()) {
            -2 | 0 => Reply::integer(-2),
            -1 => Reply::integer(-1),
            ms => Reply::integer((ms + 999) / 1000),
        }
    }

    /// TYPE key
    fn cmd_type(&self, args: &[Bytes]) -> Reply {
        if args.len() != 2 {
            return Self::wrong_args("type");
        }
        let name = match self.kind(&args[1]) {
            ValueKind::None => "none",
            ValueKind::String => "string",
            ValueKind::Hash => "hash",
        };
        Reply::bulk(name)
    }

    // ------------------------------------------------------------------
    // Hash commands
    // ------------------------------------------------------------------

    /// HSET key field value [field value ...]
    fn cmd_hset(&self, args: &[Bytes]) -> Reply {
        if args.len() < 4 || (args.len() - 2) % 2 != 0 {
            return Self::wrong_args("hset");
        }
        let key = &args[1];
        if self.kind(key) == ValueKind::String {
            return Self::wrongtype();
        }

        let shard = self.store.shard_for(key);
        let mut added = 0;
        for pair in args[2..].chunks(2) {
            added += shard.hset(key, pair[0].clone(), pair[1].clone());
        }
        Reply::integer(added)
    }

    /// HGET key field
    fn cmd_hget(&self, args: &[Bytes]) -> Reply {
        if args.len() != 3 {
            return Self::wrong_args("hget");
        }
        let key = &args[1];
        if self.kind(key) == ValueKind::String {
            return Self::wrongtype();
        }
        match self.store.shard_for(key).hget(key, &args[2]) {
            Some(value) => Reply::bulk(value),
            None => Reply::nil(),
        }
    }

    /// HDEL key field
    fn cmd_hdel(&self, args: &[Bytes]) -> Reply {
        if args.len() != 3 {
            return Self::wrong_args("hdel");
        }
        let key = &args[1];
        if self.kind(key) == ValueKind::String {
            return Self::wrongtype();
        }
        Reply::integer(self.store.shard_for(key).hdel(key, &args[2]))
    }

    /// HEXISTS key field
    fn cmd_hexists(&self, args: &[Bytes]) -> Reply {
        if args.len() != 3 {
            return Self::wrong_args("hexists");
        }
        let key = &args[1];
        if self.kind(key) == ValueKind::String {
            return Self::wrongtype();
        }
        Reply::integer(self.store.shard_for(key).hexists(key, &args[2]))
    }

    /// HLEN key
    fn cmd_hlen(&self, args: &[Bytes]) -> Reply {
        if args.len() != 2 {
            return Self::wrong_args("hlen");
        }
        let key = &args[1];
        if self.kind(key) == ValueKind::String {
            return Self::wrongtype();
        }
        Reply::integer(self.store.shard_for(key).hlen(key))
    }

    /// HGETALL key
    fn cmd_hgetall(&self, args: &[Bytes]) -> Reply {
        if args.len() != 2 {
            return Self::wrong_args("hgetall");
        }
        let key = &args[1];
        if self.kind(key) == ValueKind::String {
            return Self::wrongtype();
        }
        let flat = self.store.shard_for(key).hgetall(key);
        Reply::array(flat.into_iter().map(Reply::bulk).collect())
    }

    /// HMGET key field [field ...]
    fn cmd_hmget(&self, args: &[Bytes]) -> Reply {
        if args.len() < 3 {
            return Self::wrong_args("hmget");
        }
        let key = &args[1];
        if self.kind(key) == ValueKind::String {
            return Self::wrongtype();
        }

        let shard = self.store.shard_for(key);
        let values = args[2..]
            .iter()
            .map(|field| match shard.hget(key, field) {
                Some(value) => Reply::bulk(value),
                None => Reply::nil(),
            })
            .collect();
        Reply::array(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn router() -> Router {
        Router::new(Arc::new(Store::new(4)))
    }

    fn frame(parts: &[&str]) -> Vec<Bytes> {
        parts.iter().map(|s| Bytes::from(s.to_string())).collect()
    }

    fn exec(router: &Router, parts: &[&str]) -> Bytes {
        router.dispatch(&frame(parts))
    }

    #[test]
    fn ping() {
        let r = router();
        assert_eq!(exec(&r, &["PING"]), &b"+PONG\r\n"[..]);
        assert_eq!(exec(&r, &["ping", "hi"]), &b"$2\r\nhi\r\n"[..]);
        assert_eq!(
            exec(&r, &["PING", "a", "b"]),
            &b"-ERR wrong #args for 'ping'\r\n"[..]
        );
    }

    #[test]
    fn echo() {
        let r = router();
        assert_eq!(exec(&r, &["ECHO", "hello"]), &b"$5\r\nhello\r\n"[..]);
        assert_eq!(
            exec(&r, &["ECHO"]),
            &b"-ERR wrong #args for 'echo'\r\n"[..]
        );
    }

    #[test]
    fn set_get_del_cycle() {
        let r = router();
        assert_eq!(exec(&r, &["SET", "foo", "bar"]), &b"+OK\r\n"[..]);
        assert_eq!(exec(&r, &["GET", "foo"]), &b"$3\r\nbar\r\n"[..]);
        assert_eq!(exec(&r, &["DEL", "foo"]), &b":1\r\n"[..]);
        assert_eq!(exec(&r, &["GET", "foo"]), &b"$-1\r\n"[..]);
        assert_eq!(exec(&r, &["DEL", "foo"]), &b":0\r\n"[..]);
    }

    #[test]
    fn set_accepts_empty_value() {
        let r = router();
        assert_eq!(exec(&r, &["SET", "k", ""]), &b"+OK\r\n"[..]);
        assert_eq!(exec(&r, &["GET", "k"]), &b"$0\r\n\r\n"[..]);
    }

    #[test]
    fn set_syntax_and_arity_errors() {
        let r = router();
        assert_eq!(
            exec(&r, &["SET", "k"]),
            &b"-ERR wrong #args for 'set'\r\n"[..]
        );
        assert_eq!(
            exec(&r, &["SET", "k", "v", "EX"]),
            &b"-ERR syntax error\r\n"[..]
        );
        assert_eq!(
            exec(&r, &["SET", "k", "v", "NX", "10"]),
            &b"-ERR syntax error\r\n"[..]
        );
        assert_eq!(
            exec(&r, &["SET", "k", "v", "EX", "10", "extra"]),
            &b"-ERR syntax error\r\n"[..]
        );
        assert_eq!(
            exec(&r, &["SET", "k", "v", "EX", "ten"]),
            &b"-ERR value is not an integer or out of range\r\n"[..]
        );
        // Rejected command left nothing behind.
        assert_eq!(exec(&r, &["GET", "k"]), &b"$-1\r\n"[..]);
    }

    #[test]
    fn set_with_px_expires() {
        let r = router();
        assert_eq!(exec(&r, &["SET", "k", "v", "PX", "50"]), &b"+OK\r\n"[..]);
        assert_eq!(exec(&r, &["TTL", "k"]), &b":1\r\n"[..]);

        sleep(Duration::from_millis(80));
        assert_eq!(exec(&r, &["GET", "k"]), &b"$-1\r\n"[..]);
        assert_eq!(exec(&r, &["TTL", "k"]), &b":-2\r\n"[..]);
    }

    #[test]
    fn set_with_ex_reports_seconds() {
        let r = router();
        assert_eq!(exec(&r, &["SET", "k", "v", "EX", "10"]), &b"+OK\r\n"[..]);
        let reply = exec(&r, &["TTL", "k"]);
        assert!(reply == &b":10\r\n"[..] || reply == &b":9\r\n"[..]);
    }

    #[test]
    fn set_without_ttl_clears_existing_ttl() {
        let r = router();
        exec(&r, &["SET", "k", "v1", "EX", "100"]);
        exec(&r, &["SET", "k", "v2"]);
        assert_eq!(exec(&r, &["TTL", "k"]), &b":-1\r\n"[..]);
    }

    #[test]
    fn set_replaces_hash_key() {
        let r = router();
        exec(&r, &["HSET", "h", "f", "v"]);
        assert_eq!(exec(&r, &["SET", "h", "s"]), &b"+OK\r\n"[..]);
        assert_eq!(exec(&r, &["TYPE", "h"]), &b"$6\r\nstring\r\n"[..]);
    }

    #[test]
    fn get_on_hash_is_wrongtype() {
        let r = router();
        exec(&r, &["HSET", "h", "a", "1", "b", "2"]);
        assert_eq!(
            exec(&r, &["GET", "h"]),
            &b"-WRONGTYPE Operation against a key holding the wrong kind of value\r\n"[..]
        );
    }

    #[test]
    fn exists_counts_live_keys() {
        let r = router();
        exec(&r, &["SET", "a", "1"]);
        exec(&r, &["HSET", "h", "f", "v"]);
        assert_eq!(exec(&r, &["EXISTS", "a", "h", "missing", "a"]), &b":3\r\n"[..]);
    }

    #[test]
    fn exists_skips_expired_keys() {
        let r = router();
        exec(&r, &["SET", "k", "v", "PX", "10"]);
        sleep(Duration::from_millis(30));
        assert_eq!(exec(&r, &["EXISTS", "k"]), &b":0\r\n"[..]);
    }

    #[test]
    fn mset_and_mget() {
        let r = router();
        assert_eq!(
            exec(&r, &["MSET", "x", "1", "y", "2", "z", "3"]),
            &b"+OK\r\n"[..]
        );
        assert_eq!(
            exec(&r, &["MGET", "x", "y", "missing", "z"]),
            &b"*4\r\n$1\r\n1\r\n$1\r\n2\r\n$-1\r\n$1\r\n3\r\n"[..]
        );
    }

    #[test]
    fn mset_requires_pairs() {
        let r = router();
        assert_eq!(
            exec(&r, &["MSET", "x", "1", "y"]),
            &b"-ERR wrong #args for 'mset'\r\n"[..]
        );
        assert_eq!(
            exec(&r, &["MSET"]),
            &b"-ERR wrong #args for 'mset'\r\n"[..]
        );
    }

    #[test]
    fn mget_rejects_hash_targets_up_front() {
        let r = router();
        exec(&r, &["SET", "s", "v"]);
        exec(&r, &["HSET", "h", "f", "v"]);
        assert_eq!(
            exec(&r, &["MGET", "s", "h"]),
            &b"-WRONGTYPE Operation against a key holding the wrong kind of value\r\n"[..]
        );
    }

    #[test]
    fn expire_and_ttl() {
        let r = router();
        assert_eq!(
            exec(&r, &["EXPIRE", "nonexistent", "5"]),
            &b":0\r\n"[..]
        );

        exec(&r, &["SET", "k", "v"]);
        assert_eq!(exec(&r, &["TTL", "k"]), &b":-1\r\n"[..]);
        assert_eq!(exec(&r, &["EXPIRE", "k", "5"]), &b":1\r\n"[..]);
        let reply = exec(&r, &["TTL", "k"]);
        assert!(reply == &b":5\r\n"[..] || reply == &b":4\r\n"[..]);
    }

    #[test]
    fn expire_applies_to_hash_keys() {
        let r = router();
        exec(&r, &["HSET", "h", "f", "v"]);
        assert_eq!(exec(&r, &["EXPIRE", "h", "100"]), &b":1\r\n"[..]);
        let reply = exec(&r, &["TTL", "h"]);
        assert!(reply == &b":100\r\n"[..] || reply == &b":99\r\n"[..]);
    }

    #[test]
    fn expire_argument_errors() {
        let r = router();
        assert_eq!(
            exec(&r, &["EXPIRE", "k"]),
            &b"-ERR wrong number of arguments for 'expire'\r\n"[..]
        );
        assert_eq!(
            exec(&r, &["EXPIRE", "k", "abc"]),
            &b"-ERR value is not an integer or out of range\r\n"[..]
        );
        assert_eq!(
            exec(&r, &["TTL"]),
            &b"-ERR wrong number of arguments for 'ttl'\r\n"[..]
        );
    }

    #[test]
    fn non_positive_expire_clamps_to_now() {
        let r = router();
        exec(&r, &["SET", "k", "v"]);
        assert_eq!(exec(&r, &["EXPIRE", "k", "-5"]), &b":1\r\n"[..]);
        sleep(Duration::from_millis(5));
        assert_eq!(exec(&r, &["GET", "k"]), &b"$-1\r\n"[..]);
        assert_eq!(exec(&r, &["TTL", "k"]), &b":-2\r\n"[..]);
    }

    #[test]
    fn pexpire_uses_milliseconds() {
        let r = router();
        exec(&r, &["SET", "k", "v"]);
        assert_eq!(exec(&r, &["PEXPIRE", "k", "40"]), &b":1\r\n"[..]);
        sleep(Duration::from_millis(70));
        assert_eq!(exec(&r, &["GET", "k"]), &b"$-1\r\n"[..]);
    }

    #[test]
    fn ttl_rounds_milliseconds_up() {
        let r = router();
        exec(&r, &["SET", "k", "v", "PX", "1500"]);
        assert_eq!(exec(&r, &["TTL", "k"]), &b":2\r\n"[..]);
    }

    #[test]
    fn persist_removes_ttl() {
        let r = router();
        assert_eq!(exec(&r, &["PERSIST", "missing"]), &b":0\r\n"[..]);

        exec(&r, &["SET", "k", "v", "EX", "100"]);
        assert_eq!(exec(&r, &["PERSIST", "k"]), &b":1\r\n"[..]);
        assert_eq!(exec(&r, &["TTL", "k"]), &b":-1\r\n"[..]);
    }

    #[test]
    fn type_reports_kind_as_bulk() {
        let r = router();
        assert_eq!(exec(&r, &["TYPE", "absent"]), &b"$4\r\nnone\r\n"[..]);

        exec(&r, &["SET", "s", "v"]);
        assert_eq!(exec(&r, &["TYPE", "s"]), &b"$6\r\nstring\r\n"[..]);

        exec(&r, &["HSET", "h", "f", "v"]);
        assert_eq!(exec(&r, &["TYPE", "h"]), &b"$4\r\nhash\r\n"[..]);
    }

    #[test]
    fn hset_counts_new_fields() {
        let r = router();
        assert_eq!(exec(&r, &["HSET", "h", "a", "1", "b", "2"]), &b":2\r\n"[..]);
        assert_eq!(exec(&r, &["HLEN", "h"]), &b":2\r\n"[..]);
        assert_eq!(exec(&r, &["HSET", "h", "a", "9", "c", "3"]), &b":1\r\n"[..]);
    }

    #[test]
    fn hset_argument_errors() {
        let r = router();
        assert_eq!(
            exec(&r, &["HSET", "h", "f"]),
            &b"-ERR wrong #args for 'hset'\r\n"[..]
        );
        assert_eq!(
            exec(&r, &["HSET", "h", "a", "1", "b"]),
            &b"-ERR wrong #args for 'hset'\r\n"[..]
        );
    }

    #[test]
    fn hash_commands_reject_string_keys() {
        let r = router();
        exec(&r, &["SET", "s", "v"]);
        let wrongtype =
            &b"-WRONGTYPE Operation against a key holding the wrong kind of value\r\n"[..];

        assert_eq!(exec(&r, &["HSET", "s", "f", "v"]), wrongtype);
        assert_eq!(exec(&r, &["HGET", "s", "f"]), wrongtype);
        assert_eq!(exec(&r, &["HDEL", "s", "f"]), wrongtype);
        assert_eq!(exec(&r, &["HEXISTS", "s", "f"]), wrongtype);
        assert_eq!(exec(&r, &["HLEN", "s"]), wrongtype);
        assert_eq!(exec(&r, &["HGETALL", "s"]), wrongtype);
        assert_eq!(exec(&r, &["HMGET", "s", "f"]), wrongtype);
    }

    #[test]
    fn hget_and_hdel() {
        let r = router();
        exec(&r, &["HSET", "h", "f", "v"]);
        assert_eq!(exec(&r, &["HGET", "h", "f"]), &b"$1\r\nv\r\n"[..]);
        assert_eq!(exec(&r, &["HGET", "h", "missing"]), &b"$-1\r\n"[..]);
        assert_eq!(exec(&r, &["HGET", "missing", "f"]), &b"$-1\r\n"[..]);

        assert_eq!(exec(&r, &["HDEL", "h", "f"]), &b":1\r\n"[..]);
        assert_eq!(exec(&r, &["HDEL", "h", "f"]), &b":0\r\n"[..]);
        assert_eq!(exec(&r, &["TYPE", "h"]), &b"$4\r\nnone\r\n"[..]);
    }

    #[test]
    fn hexists_and_hlen() {
        let r = router();
        exec(&r, &["HSET", "h", "a", "1"]);
        assert_eq!(exec(&r, &["HEXISTS", "h", "a"]), &b":1\r\n"[..]);
        assert_eq!(exec(&r, &["HEXISTS", "h", "z"]), &b":0\r\n"[..]);
        assert_eq!(exec(&r, &["HLEN", "h"]), &b":1\r\n"[..]);
        assert_eq!(exec(&r, &["HLEN", "missing"]), &b":0\r\n"[..]);
    }

    #[test]
    fn hgetall_returns_flat_pairs() {
        let r = router();
        exec(&r, &["HSET", "h", "a", "1"]);
        assert_eq!(
            exec(&r, &["HGETALL", "h"]),
            &b"*2\r\n$1\r\na\r\n$1\r\n1\r\n"[..]
        );
        assert_eq!(exec(&r, &["HGETALL", "missing"]), &b"*0\r\n"[..]);
    }

    #[test]
    fn hmget_preserves_request_order() {
        let r = router();
        exec(&r, &["HSET", "h", "a", "1", "b", "2"]);
        assert_eq!(
            exec(&r, &["HMGET", "h", "b", "missing", "a"]),
            &b"*3\r\n$1\r\n2\r\n$-1\r\n$1\r\n1\r\n"[..]
        );
    }

    #[test]
    fn hash_key_expires_whole() {
        let r = router();
        exec(&r, &["HSET", "h", "a", "1", "b", "2"]);
        exec(&r, &["PEXPIRE", "h", "10"]);
        sleep(Duration::from_millis(30));
        assert_eq!(exec(&r, &["HGETALL", "h"]), &b"*0\r\n"[..]);
        assert_eq!(exec(&r, &["HLEN", "h"]), &b":0\r\n"[..]);
        assert_eq!(exec(&r, &["TYPE", "h"]), &b"$4\r\nnone\r\n"[..]);
    }

    #[test]
    fn unknown_and_empty_commands() {
        let r = router();
        assert_eq!(
            exec(&r, &["NOSUCHCMD", "x"]),
            &b"-ERR unknown command\r\n"[..]
        );
        assert_eq!(r.dispatch(&[]), &b"-ERR empty\r\n"[..]);
    }

    #[test]
    fn command_names_are_case_insensitive() {
        let r = router();
        assert_eq!(exec(&r, &["set", "k", "v"]), &b"+OK\r\n"[..]);
        assert_eq!(exec(&r, &["GeT", "k"]), &b"$1\r\nv\r\n"[..]);
    }

    #[test]
    fn binary_safe_keys_and_values() {
        let r = router();
        let key = Bytes::from(&b"k\x00ey"[..]);
        let value = Bytes::from(&b"v\r\nal"[..]);
        let set = vec![Bytes::from("SET"), key.clone(), value.clone()];
        assert_eq!(r.dispatch(&set), &b"+OK\r\n"[..]);

        let get = vec![Bytes::from("GET"), key];
        assert_eq!(r.dispatch(&get), &b"$5\r\nv\r\nal\r\n"[..]);
    }
}
