//! RESP2 Codec
//!
//! Wire protocol layer for the server. The codec is deliberately asymmetric,
//! mirroring how the protocol is actually used:
//!
//! - Inbound ([`parser`]): an incremental parser that only accepts the
//!   command form - a top-level array of bulk strings. It extracts at most
//!   one frame per call from a growing byte buffer, so the connection layer
//!   can drain pipelined requests without framing ambiguity.
//! - Outbound ([`types`]): a [`Reply`] value covering the five RESP2 reply
//!   types, serialized to bytes before being handed to the write path.
//!
//! ## Example
//!
//! ```
//! use flintkv::protocol::{parse_frame, Parsed, Reply};
//!
//! let data = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n";
//! match parse_frame(data) {
//!     Parsed::Frame { args, consumed } => {
//!         assert_eq!(args.len(), 2);
//!         assert_eq!(consumed, data.len());
//!     }
//!     _ => unreachable!(),
//! }
//!
//! let reply = Reply::bulk("value");
//! assert_eq!(reply.serialize(), b"$5\r\nvalue\r\n");
//! ```

pub mod parser;
pub mod types;

pub use parser::{parse_frame, parse_int, ParseError, Parsed, MAX_BULK_SIZE};
pub use types::Reply;
