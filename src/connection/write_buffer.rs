// src/connection/write_buffer.rs

//! The outgoing byte accumulator for serialized-but-unsent commands.

use bytes::{Buf, BytesMut};

/// Accumulates encoded command bytes until the socket can take them.
///
/// Append is the only growth operation and the buffer is unbounded:
/// submitting commands faster than the socket drains grows it without limit.
#[derive(Debug, Default)]
pub struct WriteBuffer {
    bytes: BytesMut,
}

impl WriteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends encoded bytes to the back of the buffer.
    pub fn append(&mut self, payload: &[u8]) {
        self.bytes.extend_from_slice(payload);
    }

    /// Returns up to `max` bytes from the front without consuming them.
    pub fn peek(&self, max: usize) -> &[u8] {
        &self.bytes[..self.bytes.len().min(max)]
    }

    /// Removes exactly the first `n` bytes. `n` is reconciled against the
    /// bytes the socket actually accepted and must not exceed the length.
    pub fn consume(&mut self, n: usize) {
        self.bytes.advance(n);
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Drops every buffered byte, used on disconnect.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}
