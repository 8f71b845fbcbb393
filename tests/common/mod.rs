// tests/common/mod.rs

//! Shared test doubles: a scripted in-memory transport.

use parking_lot::Mutex;
use peridot::connection::Transport;
use std::collections::VecDeque;
use std::io;

/// A scripted non-blocking socket.
///
/// Reads pop from a queue of canned results (an empty chunk models a peer
/// close), writes accept at most `write_limit` bytes per call and are
/// captured, and `take_error` reports an optionally scripted socket error.
/// With nothing scripted, reads and writes behave like an idle healthy
/// socket: reads would block, writes accept everything.
#[derive(Default)]
pub struct MockTransport {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    reads: VecDeque<io::Result<Vec<u8>>>,
    written: Vec<u8>,
    write_limit: Option<usize>,
    write_error: Option<io::Error>,
    pending_error: Option<io::Error>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a chunk to be returned by the next `try_read`.
    pub fn push_read(&self, bytes: &[u8]) {
        self.inner.lock().reads.push_back(Ok(bytes.to_vec()));
    }

    pub fn push_read_error(&self, err: io::Error) {
        self.inner.lock().reads.push_back(Err(err));
    }

    /// Caps how many bytes each `try_write` call accepts.
    pub fn set_write_limit(&self, limit: usize) {
        self.inner.lock().write_limit = Some(limit);
    }

    pub fn fail_next_write(&self, err: io::Error) {
        self.inner.lock().write_error = Some(err);
    }

    /// Scripts the socket-level error reported by `take_error`.
    pub fn set_pending_error(&self, err: io::Error) {
        self.inner.lock().pending_error = Some(err);
    }

    /// Everything written so far, in order.
    pub fn written(&self) -> Vec<u8> {
        self.inner.lock().written.clone()
    }
}

impl Transport for MockTransport {
    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.inner.lock();
        match inner.reads.pop_front() {
            Some(Ok(bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    inner.reads.push_front(Ok(bytes[n..].to_vec()));
                }
                Ok(n)
            }
            Some(Err(err)) => Err(err),
            None => Err(io::ErrorKind::WouldBlock.into()),
        }
    }

    fn try_write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.inner.lock();
        if let Some(err) = inner.write_error.take() {
            return Err(err);
        }
        let n = inner.write_limit.map_or(buf.len(), |limit| limit.min(buf.len()));
        inner.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn take_error(&self) -> io::Result<Option<io::Error>> {
        Ok(self.inner.lock().pending_error.take())
    }
}
