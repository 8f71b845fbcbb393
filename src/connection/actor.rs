// src/connection/actor.rs

//! The connection core: state machine, buffering, pairing, and dispatch.

use super::queue::{CommandQueue, QueuedCommand};
use super::state::{ConnectCallback, ConnectionState, ErrorCallback, ReplyCallback, StreamingMode};
use super::transport::Transport;
use super::write_buffer::WriteBuffer;
use crate::command::{Command, CommandKind};
use crate::config::ConnectionConfig;
use crate::errors::PeridotError;
use crate::protocol::{Reply, ReplyDecoder};
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Upper bound on bytes moved per socket operation.
const IO_CHUNK_SIZE: usize = 4096;

/// The single-owner connection core.
///
/// The actor owns the write buffer, the command queue, the decoder, and the
/// user callbacks. It performs no waiting itself: every entry point is
/// invoked from one driving task when the socket or timer is ready, makes a
/// fully observable transition, and returns. Errors never escape to the
/// driver; every fatal condition funnels through `fail`, which tears the
/// connection down before the user error callback runs.
pub struct ConnectionActor {
    endpoint: String,
    connect_timeout: Duration,
    state: ConnectionState,
    write_buffer: WriteBuffer,
    queue: CommandQueue,
    decoder: ReplyDecoder,
    streaming: Option<StreamingMode>,
    connect_deadline: Option<Instant>,
    on_connect: Option<ConnectCallback>,
    on_error: Option<ErrorCallback>,
}

impl ConnectionActor {
    pub fn new(config: &ConnectionConfig) -> Self {
        Self {
            endpoint: config.endpoint(),
            connect_timeout: config.connect_timeout,
            state: ConnectionState::Disconnected,
            write_buffer: WriteBuffer::new(),
            queue: CommandQueue::new(),
            decoder: ReplyDecoder::new(),
            streaming: None,
            connect_deadline: None,
            on_connect: None,
            on_error: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// True while buffered bytes are waiting for the socket, i.e. while
    /// write readiness is worth arming.
    pub fn wants_write(&self) -> bool {
        self.is_connected() && !self.write_buffer.is_empty()
    }

    /// The pending connect deadline, if establishment is in progress.
    pub fn connect_deadline(&self) -> Option<Instant> {
        self.connect_deadline
    }

    /// Stable textual identifier (`host:port` or the unix socket path).
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Number of commands sent but not yet fully replied.
    pub fn pending_commands(&self) -> usize {
        self.queue.len()
    }

    pub fn set_connect_callback(&mut self, callback: ConnectCallback) {
        self.on_connect = Some(callback);
    }

    pub fn set_error_callback(&mut self, callback: ErrorCallback) {
        self.on_error = Some(callback);
    }

    /// Starts connection establishment and arms the connect deadline.
    /// Fails if the connection is not currently disconnected.
    pub fn begin_connect(&mut self) -> Result<(), PeridotError> {
        if self.state != ConnectionState::Disconnected {
            return Err(PeridotError::AlreadyConnected);
        }
        self.state = ConnectionState::Connecting;
        self.connect_deadline = Some(Instant::now() + self.connect_timeout);
        debug!("{}: connecting", self.endpoint);
        Ok(())
    }

    /// Completes establishment once the socket reports writable. The socket
    /// is health-checked first: a pending socket error means the connect
    /// actually failed even though the socket signaled readiness.
    pub fn complete_connect<T: Transport>(&mut self, io: &T) {
        if self.state != ConnectionState::Connecting {
            return;
        }
        match io.take_error() {
            Ok(None) => {}
            Ok(Some(err)) => {
                self.fail(err.into());
                return;
            }
            Err(err) => {
                self.fail(err.into());
                return;
            }
        }
        self.connect_deadline = None;
        self.state = ConnectionState::Ready;
        info!("{}: connected", self.endpoint);
        if let Some(cb) = self.on_connect.as_mut() {
            cb();
        }
    }

    /// Records a failed establishment attempt (socket creation or connect
    /// error reported by the driver).
    pub fn fail_connect(&mut self, err: PeridotError) {
        if self.state != ConnectionState::Connecting {
            return;
        }
        self.fail(err);
    }

    /// Fires when the connect deadline elapses before establishment. A
    /// deadline canceled by a successful connect never reaches this point
    /// in the `Connecting` state, so a late timer tick is a no-op.
    pub fn on_connect_timeout(&mut self) {
        if self.state != ConnectionState::Connecting {
            return;
        }
        self.fail(PeridotError::ConnectTimeout);
    }

    /// Encodes and buffers a command and queues its callback. Valid in any
    /// state: bytes buffered while disconnected are flushed once a later
    /// connect succeeds. Returns true when the write buffer was empty
    /// before this call, i.e. when write interest newly needs arming.
    pub fn execute(&mut self, command: Command, callback: Option<ReplyCallback>) -> bool {
        let was_empty = self.write_buffer.is_empty();
        let payload = command.encode();
        self.write_buffer.append(&payload);
        self.queue.enqueue(QueuedCommand {
            kind: command.kind(),
            verb: command.verb().to_string(),
            callback,
        });
        debug!(
            "{}: queued {} ({} bytes buffered, {} commands pending)",
            self.endpoint,
            command.verb(),
            self.write_buffer.len(),
            self.queue.len()
        );
        was_empty
    }

    /// Drains one chunk of buffered bytes to the socket. Partial writes are
    /// normal: only the prefix the socket actually accepted is consumed,
    /// the remainder stays buffered for the next writable event.
    pub fn on_writable<T: Transport>(&mut self, io: &T) {
        if !self.is_connected() {
            return;
        }
        if let Err(err) = self.flush_chunk(io) {
            self.fail(err);
        }
    }

    fn flush_chunk<T: Transport>(&mut self, io: &T) -> Result<(), PeridotError> {
        if self.write_buffer.is_empty() {
            return Ok(());
        }
        match io.try_write(self.write_buffer.peek(IO_CHUNK_SIZE)) {
            Ok(0) => Err(PeridotError::ConnectionClosed),
            Ok(written) => {
                self.write_buffer.consume(written);
                debug!(
                    "{}: wrote {} bytes, {} left",
                    self.endpoint,
                    written,
                    self.write_buffer.len()
                );
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Performs one non-blocking read and dispatches every reply that
    /// becomes decodable. A zero-length read means the peer closed the
    /// connection.
    pub fn on_readable<T: Transport>(&mut self, io: &T) {
        if !self.is_connected() {
            return;
        }
        if let Err(err) = self.read_chunk(io) {
            self.fail(err);
        }
    }

    fn read_chunk<T: Transport>(&mut self, io: &T) -> Result<(), PeridotError> {
        let mut chunk = [0u8; IO_CHUNK_SIZE];
        match io.try_read(&mut chunk) {
            Ok(0) => Err(PeridotError::ConnectionClosed),
            Ok(read) => {
                self.decoder.feed(&chunk[..read]);
                self.drain_replies()
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Dispatches every complete reply currently buffered, so a single
    /// socket read holding several pipelined replies is fully processed
    /// before control returns to the event loop.
    fn drain_replies(&mut self) -> Result<(), PeridotError> {
        while let Some(reply) = self.decoder.poll_reply()? {
            self.dispatch_reply(reply)?;
        }
        Ok(())
    }

    fn dispatch_reply(&mut self, reply: Reply) -> Result<(), PeridotError> {
        match self.state {
            ConnectionState::Subscribed | ConnectionState::Monitoring => {
                let is_error = reply.is_error();
                if let Some(mode) = self.streaming.as_mut() {
                    (mode.callback_mut())(reply, is_error);
                }
                Ok(())
            }
            ConnectionState::Ready => self.dispatch_queued(reply),
            other => Err(PeridotError::InvalidState(format!(
                "reply decoded while {other}"
            ))),
        }
    }

    /// Dequeues the front command and routes the reply to its callback.
    ///
    /// A subscribe-family or monitor verb only changes dispatch once its own
    /// successful reply reaches the queue front, so commands pipelined ahead
    /// of it drain normally first. An error reply or a transactional QUEUED
    /// acknowledgment leaves the mode untouched.
    fn dispatch_queued(&mut self, reply: Reply) -> Result<(), PeridotError> {
        let mut entry = self.queue.dequeue()?;
        let is_error = reply.is_error();

        let enters = match entry.kind {
            CommandKind::Regular => None,
            _ if is_error || matches!(reply, Reply::Queued) => None,
            CommandKind::Subscribe => Some(ConnectionState::Subscribed),
            CommandKind::Monitor => Some(ConnectionState::Monitoring),
        };

        let Some(next_state) = enters else {
            if let Some(cb) = entry.callback.as_mut() {
                cb(reply, is_error);
            }
            return Ok(());
        };

        debug!(
            "{}: {} reply switches dispatch to {}",
            self.endpoint, entry.verb, next_state
        );
        self.state = next_state;
        let mut callback = entry.callback.take();
        if let Some(cb) = callback.as_mut() {
            cb(reply, is_error);
        }
        self.streaming = callback.map(|cb| match next_state {
            ConnectionState::Subscribed => StreamingMode::PubSub(cb),
            _ => StreamingMode::Monitor(cb),
        });
        Ok(())
    }

    /// Entry point for failures the driver observes itself, e.g. awaiting
    /// socket readiness failing.
    pub fn on_io_error(&mut self, err: PeridotError) {
        if self.state == ConnectionState::Disconnected {
            return;
        }
        self.fail(err);
    }

    /// Tears the connection down and reports `err` to the error callback.
    /// The state observed by the callback is always `Disconnected`.
    fn fail(&mut self, err: PeridotError) {
        warn!("{}: connection failed: {}", self.endpoint, err);
        self.disconnect();
        if let Some(cb) = self.on_error.as_mut() {
            cb(&err);
        }
    }

    /// Returns the connection to `Disconnected`, dropping buffered bytes,
    /// pending callbacks, the streaming mode, the connect deadline, and any
    /// partially decoded input. Idempotent and valid from every state.
    pub fn disconnect(&mut self) {
        if self.state != ConnectionState::Disconnected {
            debug!("{}: disconnecting", self.endpoint);
        }
        self.state = ConnectionState::Disconnected;
        self.connect_deadline = None;
        self.streaming = None;
        self.write_buffer.clear();
        self.queue.clear();
        self.decoder.reset();
    }
}
