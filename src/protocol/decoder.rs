// src/protocol/decoder.rs

//! The stateful decode adapter feeding raw socket bytes into frame decoding.

use super::{Reply, RespFrameDecoder};
use crate::errors::PeridotError;
use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// Accumulates raw bytes from the socket and yields decoded [`Reply`] values.
///
/// Exclusively owned by one connection: created alongside it and released
/// with it on every exit path. Feeding the same logical reply split across
/// any number of chunks yields the same value as feeding it whole.
#[derive(Debug, Default)]
pub struct ReplyDecoder {
    buf: BytesMut,
    frames: RespFrameDecoder,
}

impl ReplyDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends raw bytes to the internal decode state.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Removes and returns one decoded reply, or `None` while the buffered
    /// bytes do not yet form a complete one.
    pub fn poll_reply(&mut self) -> Result<Option<Reply>, PeridotError> {
        Ok(self.frames.decode(&mut self.buf)?.map(Reply::from))
    }

    /// Discards any partially buffered bytes, so a later connection never
    /// decodes stale input.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Number of bytes buffered but not yet decoded.
    pub fn pending_bytes(&self) -> usize {
        self.buf.len()
    }
}
