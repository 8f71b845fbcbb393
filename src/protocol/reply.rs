// src/protocol/reply.rs

//! Defines the reply type delivered to command callbacks.

use super::RespFrame;
use bytes::Bytes;

/// `Reply` is the domain-level view of a decoded [`RespFrame`].
///
/// Two status strings are folded into dedicated markers during conversion:
/// the `OK` acknowledgment becomes [`Reply::Ok`] and the `QUEUED`
/// acknowledgment (sent for commands buffered inside a transaction) becomes
/// [`Reply::Queued`]. Every other status payload passes through verbatim as
/// [`Reply::Status`].
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The `OK` success acknowledgment.
    Ok,
    /// The `QUEUED` transactional acknowledgment.
    Queued,
    Status(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Null,
    NullArray,
    Array(Vec<Reply>),
}

impl Reply {
    /// True if the server tagged this reply as an error. Passed alongside
    /// the reply to callbacks so callers can branch without re-inspecting
    /// the value's shape.
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

/// Implements the conversion from the wire-level `RespFrame` to the
/// domain-level `Reply`, applying the status sentinels.
impl From<RespFrame> for Reply {
    fn from(frame: RespFrame) -> Self {
        match frame {
            RespFrame::SimpleString(s) if s.eq_ignore_ascii_case("OK") => Reply::Ok,
            RespFrame::SimpleString(s) if s.eq_ignore_ascii_case("QUEUED") => Reply::Queued,
            RespFrame::SimpleString(s) => Reply::Status(s),
            RespFrame::Error(s) => Reply::Error(s),
            RespFrame::Integer(i) => Reply::Integer(i),
            RespFrame::BulkString(b) => Reply::Bulk(b),
            RespFrame::Null => Reply::Null,
            RespFrame::NullArray => Reply::NullArray,
            // Recursively convert elements of an array.
            RespFrame::Array(items) => Reply::Array(items.into_iter().map(Into::into).collect()),
        }
    }
}
