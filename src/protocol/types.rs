//! RESP Reply Types
//!
//! Outbound half of the RESP2 codec: the server builds a [`Reply`] and
//! serializes it into the wire format. Replies use the five classic RESP2
//! type prefixes:
//!
//! - `+` Simple String
//! - `-` Error
//! - `:` Integer
//! - `$` Bulk String (`$-1` for nil)
//! - `*` Array
//!
//! All types are terminated with CRLF (`\r\n`). Bulk strings are
//! length-prefixed and binary-safe.
//!
//! ## Examples
//!
//! Simple String: `+OK\r\n`
//! Error: `-ERR unknown command\r\n`
//! Integer: `:1000\r\n`
//! Bulk String: `$5\r\nhello\r\n`
//! Nil: `$-1\r\n`
//! Array: `*2\r\n$1\r\na\r\n$1\r\nb\r\n`

use bytes::Bytes;

/// The CRLF terminator used throughout RESP.
pub const CRLF: &[u8] = b"\r\n";

/// RESP type prefix bytes.
pub mod prefix {
    pub const SIMPLE_STRING: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// A reply the server sends back to a client.
///
/// Covers the RESP2 subset the server emits. Requests never arrive as
/// `Reply` values; the inbound direction is handled by
/// [`crate::protocol::parser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Non-binary-safe string, e.g. `+OK\r\n`. Must not contain CRLF.
    Simple(String),

    /// Error line, e.g. `-ERR unknown command\r\n`. The stored string is the
    /// full payload after `-` (including the `ERR ` / `WRONGTYPE ` prefix).
    Error(String),

    /// 64-bit signed integer: `:<n>\r\n`.
    Integer(i64),

    /// Binary-safe, length-prefixed string: `$<len>\r\n<bytes>\r\n`.
    Bulk(Bytes),

    /// Null bulk string: `$-1\r\n`.
    Nil,

    /// Array of replies: `*<count>\r\n<element>...`. The server only nests
    /// bulks and nils inside arrays (MGET, HGETALL, HMGET).
    Array(Vec<Reply>),
}

impl Reply {
    /// Builds a simple string reply.
    pub fn simple(s: impl Into<String>) -> Self {
        Reply::Simple(s.into())
    }

    /// Builds an `-ERR <msg>` reply.
    pub fn error(msg: impl AsRef<str>) -> Self {
        Reply::Error(format!("ERR {}", msg.as_ref()))
    }

    /// Builds an error reply whose payload is used verbatim (for errors with
    /// their own prefix, like `WRONGTYPE ...`).
    pub fn raw_error(msg: impl Into<String>) -> Self {
        Reply::Error(msg.into())
    }

    /// Builds an integer reply.
    pub fn integer(n: i64) -> Self {
        Reply::Integer(n)
    }

    /// Builds a bulk string reply.
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Reply::Bulk(data.into())
    }

    /// Builds the nil reply.
    pub fn nil() -> Self {
        Reply::Nil
    }

    /// Builds an array reply.
    pub fn array(items: Vec<Reply>) -> Self {
        Reply::Array(items)
    }

    /// `+OK\r\n`
    pub fn ok() -> Self {
        Reply::Simple("OK".to_string())
    }

    /// `+PONG\r\n`
    pub fn pong() -> Self {
        Reply::Simple("PONG".to_string())
    }

    /// Serializes into a fresh byte vector.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            Reply::Simple(s) => {
                buf.push(prefix::SIMPLE_STRING);
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(CRLF);
            }
            Reply::Error(s) => {
                buf.push(prefix::ERROR);
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(CRLF);
            }
            Reply::Integer(n) => {
                buf.push(prefix::INTEGER);
                buf.extend_from_slice(n.to_string().as_bytes());
                buf.extend_from_slice(CRLF);
            }
            Reply::Bulk(data) => {
                buf.push(prefix::BULK_STRING);
                buf.extend_from_slice(data.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                buf.extend_from_slice(data);
                buf.extend_from_slice(CRLF);
            }
            Reply::Nil => {
                buf.push(prefix::BULK_STRING);
                buf.extend_from_slice(b"-1");
                buf.extend_from_slice(CRLF);
            }
            Reply::Array(items) => {
                buf.push(prefix::ARRAY);
                buf.extend_from_slice(items.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                for item in items {
                    item.serialize_into(buf);
                }
            }
        }
    }

    /// Serializes and hands the result off as a ready-to-send `Bytes`.
    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.serialize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_string_serialize() {
        assert_eq!(Reply::ok().serialize(), b"+OK\r\n");
        assert_eq!(Reply::pong().serialize(), b"+PONG\r\n");
    }

    #[test]
    fn error_serialize() {
        let reply = Reply::error("unknown command");
        assert_eq!(reply.serialize(), b"-ERR unknown command\r\n");

        let raw =
            Reply::raw_error("WRONGTYPE Operation against a key holding the wrong kind of value");
        assert_eq!(
            raw.serialize(),
            b"-WRONGTYPE Operation against a key holding the wrong kind of value\r\n".to_vec()
        );
    }

    #[test]
    fn integer_serialize() {
        assert_eq!(Reply::integer(1000).serialize(), b":1000\r\n");
        assert_eq!(Reply::integer(-2).serialize(), b":-2\r\n");
    }

    #[test]
    fn bulk_serialize() {
        assert_eq!(Reply::bulk("hello").serialize(), b"$5\r\nhello\r\n");

        // Binary-safe: embedded NUL and CR are preserved.
        let binary = Reply::bulk(Bytes::from(&b"a\x00\rb"[..]));
        assert_eq!(binary.serialize(), b"$4\r\na\x00\rb\r\n");
    }

    #[test]
    fn empty_bulk_serialize() {
        assert_eq!(Reply::bulk("").serialize(), b"$0\r\n\r\n");
    }

    #[test]
    fn nil_serialize() {
        assert_eq!(Reply::nil().serialize(), b"$-1\r\n");
    }

    #[test]
    fn array_serialize() {
        let reply = Reply::array(vec![Reply::bulk("a"), Reply::nil(), Reply::bulk("b")]);
        assert_eq!(reply.serialize(), b"*3\r\n$1\r\na\r\n$-1\r\n$1\r\nb\r\n");
    }

    #[test]
    fn empty_array_serialize() {
        assert_eq!(Reply::array(vec![]).serialize(), b"*0\r\n");
    }
}
