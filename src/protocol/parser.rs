//! Incremental RESP Request Parser
//!
//! Consumes a growing byte buffer and extracts at most one command frame per
//! call. The accepted grammar is deliberately narrow: a top-level array of
//! bulk strings (`*<n>\r\n` followed by `n` length-prefixed bulks), which is
//! the only form Redis clients use for commands. Inline commands and every
//! other top-level type are protocol errors.
//!
//! ## How the parser is driven
//!
//! The connection layer appends incoming network data to a pending buffer and
//! calls [`parse_frame`] in a loop:
//!
//! - [`Parsed::Frame`] - a complete command; erase `consumed` bytes from the
//!   head of the buffer and keep going (pipelining).
//! - [`Parsed::Incomplete`] - nothing consumed; wait for more data.
//! - [`Parsed::Error`] - malformed input; `skip` bytes may be dropped to move
//!   past the offending token before the stream is terminated.
//!
//! A null bulk (`$-1`) inside a frame is surfaced as an empty argument.

use bytes::Bytes;
use thiserror::Error;

/// Maximum size of a single bulk string (512 MB, same as Redis).
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Errors produced while parsing a request frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The frame does not start with `*` (inline commands are rejected).
    #[error("expected array")]
    ExpectedArray,

    /// The array header count is not a valid non-negative integer.
    #[error("bad array length")]
    BadArrayLength,

    /// An array element does not start with `$`.
    #[error("expected bulk string")]
    ExpectedBulk,

    /// A bulk length is not a valid integer, or is negative (other than -1).
    #[error("bad bulk length")]
    BadBulkLength,

    /// A bulk payload is not followed by CRLF.
    #[error("bulk missing CRLF")]
    MissingCrlf,

    /// A bulk length exceeds [`MAX_BULK_SIZE`].
    #[error("bulk too large: {0} bytes")]
    BulkTooLarge(usize),
}

/// Outcome of one [`parse_frame`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    /// No complete frame in the buffer yet. Nothing was consumed.
    Incomplete,

    /// One complete command frame. The caller must erase `consumed` bytes
    /// from the head of its buffer.
    Frame {
        /// The command arguments; the first is the command name itself.
        args: Vec<Bytes>,
        consumed: usize,
    },

    /// Malformed input. `skip` bytes may be dropped to move past the
    /// offending token; the connection may be closed afterwards.
    Error { error: ParseError, skip: usize },
}

/// Attempts to parse exactly one command frame from `buf`.
pub fn parse_frame(buf: &[u8]) -> Parsed {
    if buf.is_empty() {
        return Parsed::Incomplete;
    }

    if buf[0] != b'*' {
        return Parsed::Error {
            error: ParseError::ExpectedArray,
            skip: skip_line(buf, 0),
        };
    }

    // Array header: *<n>\r\n
    let header_end = match find_crlf(buf, 1) {
        Some(pos) => pos,
        None => return Parsed::Incomplete,
    };
    let count = match parse_int(&buf[1..header_end]) {
        Some(n) if n >= 0 => n as usize,
        _ => {
            return Parsed::Error {
                error: ParseError::BadArrayLength,
                skip: header_end + 2,
            }
        }
    };

    // Cap the pre-allocation: the count is attacker-controlled and may be
    // declared long before any element data arrives.
    let mut args = Vec::with_capacity(count.min(1024));
    let mut offset = header_end + 2;

    for _ in 0..count {
        if offset >= buf.len() {
            return Parsed::Incomplete;
        }
        if buf[offset] != b'$' {
            return Parsed::Error {
                error: ParseError::ExpectedBulk,
                skip: skip_line(buf, offset),
            };
        }

        // Bulk header: $<len>\r\n
        let len_end = match find_crlf(buf, offset + 1) {
            Some(pos) => pos,
            None => return Parsed::Incomplete,
        };
        let len = match parse_int(&buf[offset + 1..len_end]) {
            Some(n) => n,
            None => {
                return Parsed::Error {
                    error: ParseError::BadBulkLength,
                    skip: len_end + 2,
                }
            }
        };
        offset = len_end + 2;

        if len == -1 {
            // Null bulk: surfaced as an empty argument.
            args.push(Bytes::new());
            continue;
        }
        if len < 0 {
            return Parsed::Error {
                error: ParseError::BadBulkLength,
                skip: offset,
            };
        }
        let len = len as usize;
        if len > MAX_BULK_SIZE {
            return Parsed::Error {
                error: ParseError::BulkTooLarge(len),
                skip: offset,
            };
        }

        // Payload plus trailing CRLF must be present in full.
        if offset + len + 2 > buf.len() {
            return Parsed::Incomplete;
        }
        if &buf[offset + len..offset + len + 2] != b"\r\n" {
            return Parsed::Error {
                error: ParseError::MissingCrlf,
                skip: offset + len,
            };
        }
        args.push(Bytes::copy_from_slice(&buf[offset..offset + len]));
        offset += len + 2;
    }

    Parsed::Frame {
        args,
        consumed: offset,
    }
}

/// Parses a signed base-10 integer from raw bytes.
///
/// Accepts an optional leading `-` followed by at least one digit. No leading
/// `+`, no whitespace. Overflow is detected and rejected. Shared with the
/// command router for TTL arguments, which follow the same rules.
pub fn parse_int(s: &[u8]) -> Option<i64> {
    let (negative, digits) = match s.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, s),
    };
    if digits.is_empty() {
        return None;
    }

    // Accumulate in the signed direction so i64::MIN parses without overflow.
    let mut value: i64 = 0;
    for &c in digits {
        if !c.is_ascii_digit() {
            return None;
        }
        let digit = i64::from(c - b'0');
        value = value.checked_mul(10)?;
        value = if negative {
            value.checked_sub(digit)?
        } else {
            value.checked_add(digit)?
        };
    }
    Some(value)
}

/// Position of the first CRLF at or after `from`, as the index of the `\r`.
#[inline]
fn find_crlf(buf: &[u8], from: usize) -> Option<usize> {
    if buf.len() < 2 {
        return None;
    }
    (from..buf.len() - 1).find(|&i| buf[i] == b'\r' && buf[i + 1] == b'\n')
}

/// Bytes to drop to get past the line starting at `from`: through the next
/// CRLF if one exists, otherwise the whole buffer.
fn skip_line(buf: &[u8], from: usize) -> usize {
    match find_crlf(buf, from) {
        Some(pos) => pos + 2,
        None => buf.len(),
    }
}
