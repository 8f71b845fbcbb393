// src/protocol/frame.rs

//! Wire-level RESP frames and the incremental decoder that produces them.

use crate::errors::PeridotError;
use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;

/// The CRLF (Carriage Return, Line Feed) sequence terminating lines in RESP.
const CRLF: &[u8] = b"\r\n";
const CRLF_LEN: usize = 2;

// Protocol-level limits guarding against malformed or hostile payloads.
const MAX_ARRAY_ELEMENTS: usize = 1_024 * 1_024;
const MAX_BULK_LEN: usize = 512 * 1024 * 1024; // 512MB max bulk string size.
const MAX_NESTING_DEPTH: usize = 32;

/// A single frame of the RESP protocol as read off the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum RespFrame {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Bytes),
    Null,
    NullArray,
    Array(Vec<RespFrame>),
}

/// An incremental `tokio_util::codec` decoder producing [`RespFrame`]s.
///
/// `decode` returns `Ok(None)` while the buffered bytes do not yet form a
/// complete frame; callers feed more bytes and try again.
#[derive(Debug, Default)]
pub struct RespFrameDecoder;

impl Decoder for RespFrameDecoder {
    type Item = RespFrame;
    type Error = PeridotError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<RespFrame>, PeridotError> {
        match parse_frame(&src[..], 0)? {
            Some((frame, consumed)) => {
                src.advance(consumed);
                Ok(Some(frame))
            }
            None => Ok(None),
        }
    }
}

/// Parses one frame from the front of `input`, returning the frame and the
/// number of bytes it occupied, or `None` if the input is incomplete.
fn parse_frame(input: &[u8], depth: usize) -> Result<Option<(RespFrame, usize)>, PeridotError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(PeridotError::Protocol(
            "frame nesting exceeds depth limit".to_string(),
        ));
    }
    if input.is_empty() {
        return Ok(None);
    }

    let body = &input[1..];
    let parsed = match input[0] {
        b'+' => split_line(body).map(|(line, used)| {
            let text = String::from_utf8_lossy(line).into_owned();
            (RespFrame::SimpleString(text), used)
        }),
        b'-' => split_line(body).map(|(line, used)| {
            let text = String::from_utf8_lossy(line).into_owned();
            (RespFrame::Error(text), used)
        }),
        b':' => match split_line(body) {
            Some((line, used)) => Some((RespFrame::Integer(parse_int(line)?), used)),
            None => None,
        },
        // Bulk strings and arrays account for their own prefix byte.
        b'$' => return Ok(parse_bulk(body)?.map(|(frame, used)| (frame, used + 1))),
        b'*' => return Ok(parse_array(body, depth)?.map(|(frame, used)| (frame, used + 1))),
        other => {
            return Err(PeridotError::Protocol(format!(
                "unexpected type prefix byte 0x{other:02x}"
            )));
        }
    };

    Ok(parsed.map(|(frame, used)| (frame, used + 1)))
}

/// Parses a bulk string (e.g. `$5\r\nhello\r\n`), starting after the prefix.
fn parse_bulk(input: &[u8]) -> Result<Option<(RespFrame, usize)>, PeridotError> {
    let Some((line, header)) = split_line(input) else {
        return Ok(None);
    };
    let declared = parse_int(line)?;
    if declared == -1 {
        return Ok(Some((RespFrame::Null, header)));
    }
    if declared < 0 {
        return Err(PeridotError::Protocol("negative bulk length".to_string()));
    }
    let len = declared as usize;
    if len > MAX_BULK_LEN {
        return Err(PeridotError::Protocol(
            "bulk length exceeds limit".to_string(),
        ));
    }

    let rest = &input[header..];
    if rest.len() < len + CRLF_LEN {
        return Ok(None);
    }
    if &rest[len..len + CRLF_LEN] != CRLF {
        return Err(PeridotError::Protocol(
            "bulk payload missing terminator".to_string(),
        ));
    }

    let data = Bytes::copy_from_slice(&rest[..len]);
    Ok(Some((RespFrame::BulkString(data), header + len + CRLF_LEN)))
}

/// Parses an array (e.g. `*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n`), starting after
/// the prefix. Element parsing recurses through `parse_frame`.
fn parse_array(input: &[u8], depth: usize) -> Result<Option<(RespFrame, usize)>, PeridotError> {
    let Some((line, header)) = split_line(input) else {
        return Ok(None);
    };
    let declared = parse_int(line)?;
    if declared == -1 {
        return Ok(Some((RespFrame::NullArray, header)));
    }
    if declared < 0 {
        return Err(PeridotError::Protocol("negative array length".to_string()));
    }
    let count = declared as usize;
    if count > MAX_ARRAY_ELEMENTS {
        return Err(PeridotError::Protocol(
            "array length exceeds limit".to_string(),
        ));
    }

    // Capacity is capped: the declared count is attacker-controlled and may
    // be announced long before the elements arrive.
    let mut elements = Vec::with_capacity(count.min(64));
    let mut consumed = header;
    for _ in 0..count {
        let Some((frame, used)) = parse_frame(&input[consumed..], depth + 1)? else {
            return Ok(None);
        };
        elements.push(frame);
        consumed += used;
    }
    Ok(Some((RespFrame::Array(elements), consumed)))
}

/// Returns the next CRLF-terminated line and the bytes it consumed, or
/// `None` if no full line is buffered yet.
fn split_line(input: &[u8]) -> Option<(&[u8], usize)> {
    let pos = input.windows(CRLF_LEN).position(|window| window == CRLF)?;
    Some((&input[..pos], pos + CRLF_LEN))
}

fn parse_int(line: &[u8]) -> Result<i64, PeridotError> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| PeridotError::Protocol("invalid integer payload".to_string()))
}
