// src/connection/driver.rs

//! The tokio event loop driving one connection actor, and the cheap handle
//! callers use to talk to it.

use super::actor::ConnectionActor;
use super::state::{ConnectCallback, ConnectionState, ErrorCallback, ReplyCallback};
use super::transport::ClientStream;
use crate::command::Command;
use crate::config::ConnectionConfig;
use crate::errors::PeridotError;
use crate::protocol::Reply;
use futures::future::BoxFuture;
use std::io;
use tokio::io::{Interest, Ready};
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Operations a handle can ask the handler to perform.
enum Op {
    Connect,
    Disconnect,
    Execute {
        command: Command,
        callback: Option<ReplyCallback>,
    },
    SetConnectCallback(ConnectCallback),
    SetErrorCallback(ErrorCallback),
}

/// The outcome of one event-loop turn.
enum Event {
    Op(Op),
    HandleDropped,
    Connected(io::Result<ClientStream>),
    ConnectTimedOut,
    Io(io::Result<Ready>),
}

/// Drives a single [`ConnectionActor`] on the tokio runtime: socket
/// readiness maps to the actor's readiness handlers, connect-future
/// completion to establishment, and the armed deadline to the timeout path.
pub struct ConnectionHandler {
    config: ConnectionConfig,
    actor: ConnectionActor,
    stream: Option<ClientStream>,
    connect_fut: Option<BoxFuture<'static, io::Result<ClientStream>>>,
    ops: mpsc::UnboundedReceiver<Op>,
    state_tx: watch::Sender<ConnectionState>,
}

impl ConnectionHandler {
    fn new(
        config: ConnectionConfig,
        ops: mpsc::UnboundedReceiver<Op>,
        state_tx: watch::Sender<ConnectionState>,
    ) -> Self {
        let actor = ConnectionActor::new(&config);
        Self {
            config,
            actor,
            stream: None,
            connect_fut: None,
            ops,
            state_tx,
        }
    }

    /// The main event loop. Exits once every handle has been dropped,
    /// tearing the connection down on the way out.
    async fn run(mut self) {
        loop {
            let event = self.next_event().await;
            let keep_running = self.handle_event(event);
            self.reconcile();
            if !keep_running {
                break;
            }
        }
        debug!("{}: connection handler exiting", self.actor.endpoint());
    }

    /// Interest to arm on the socket this turn. Read interest is armed for
    /// the whole lifetime of the socket; write interest only while bytes
    /// are buffered, so an idle connection never spins the loop.
    fn io_interest(&self) -> Interest {
        if self.actor.wants_write() {
            Interest::READABLE | Interest::WRITABLE
        } else {
            Interest::READABLE
        }
    }

    async fn next_event(&mut self) -> Event {
        let deadline = self
            .actor
            .connect_deadline()
            .map(tokio::time::Instant::from_std);
        let connecting = self.connect_fut.is_some();
        let io_armed = self.stream.is_some() && self.actor.is_connected();
        let interest = self.io_interest();
        let stream = self.stream.as_ref();
        let connect_fut = self.connect_fut.as_mut();

        tokio::select! {
            biased;
            op = self.ops.recv() => match op {
                Some(op) => Event::Op(op),
                None => Event::HandleDropped,
            },
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(tokio::time::Instant::now)),
                if deadline.is_some() =>
            {
                Event::ConnectTimedOut
            }
            result = async { connect_fut.unwrap().await }, if connecting => {
                Event::Connected(result)
            }
            result = async { stream.unwrap().ready(interest).await }, if io_armed => {
                Event::Io(result)
            }
        }
    }

    fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::Op(Op::Connect) => {
                if self.actor.begin_connect().is_ok() {
                    let config = self.config.clone();
                    self.connect_fut =
                        Some(Box::pin(async move { ClientStream::connect(&config).await }));
                }
            }
            Event::Op(Op::Disconnect) => self.actor.disconnect(),
            Event::Op(Op::Execute { command, callback }) => {
                self.actor.execute(command, callback);
            }
            Event::Op(Op::SetConnectCallback(cb)) => self.actor.set_connect_callback(cb),
            Event::Op(Op::SetErrorCallback(cb)) => self.actor.set_error_callback(cb),
            Event::HandleDropped => {
                self.actor.disconnect();
                return false;
            }
            Event::Connected(Ok(stream)) => {
                self.actor.complete_connect(&stream);
                if self.actor.is_connected() {
                    self.stream = Some(stream);
                }
            }
            Event::Connected(Err(err)) => self.actor.fail_connect(err.into()),
            Event::ConnectTimedOut => self.actor.on_connect_timeout(),
            Event::Io(Ok(ready)) => {
                if let Some(stream) = self.stream.as_ref() {
                    if ready.is_readable() || ready.is_read_closed() {
                        self.actor.on_readable(stream);
                    }
                    if (ready.is_writable() || ready.is_write_closed()) && self.actor.is_connected()
                    {
                        self.actor.on_writable(stream);
                    }
                }
            }
            Event::Io(Err(err)) => self.actor.on_io_error(err.into()),
        }
        true
    }

    /// Aligns driver-owned resources with the actor's state after each
    /// event: a completed or abandoned establishment drops the connect
    /// future, a teardown releases the socket, and the published state is
    /// refreshed for handles.
    fn reconcile(&mut self) {
        let state = self.actor.state();
        if state != ConnectionState::Connecting {
            self.connect_fut = None;
        }
        if !state.is_connected() {
            self.stream = None;
        }
        self.state_tx.send_replace(state);
    }
}

/// A cheap, cloneable handle to a connection driven on the tokio runtime.
///
/// All methods return immediately; establishment progress and failures are
/// reported through the registered callbacks, and replies through the
/// per-command callbacks.
#[derive(Clone)]
pub struct Connection {
    ops: mpsc::UnboundedSender<Op>,
    state_rx: watch::Receiver<ConnectionState>,
    endpoint: String,
}

impl Connection {
    /// Spawns the connection's event loop. Must be called inside a tokio
    /// runtime.
    pub fn new(config: ConnectionConfig) -> Self {
        let (ops_tx, ops_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let endpoint = config.endpoint();
        let handler = ConnectionHandler::new(config, ops_rx, state_tx);
        tokio::spawn(handler.run());
        Self {
            ops: ops_tx,
            state_rx,
            endpoint,
        }
    }

    fn send(&self, op: Op) -> Result<(), PeridotError> {
        self.ops.send(op).map_err(|_| PeridotError::HandlerClosed)
    }

    /// Starts connection establishment. Fails when the connection is not
    /// currently disconnected; completion is reported via the connect or
    /// error callback.
    pub fn connect(&self) -> Result<(), PeridotError> {
        if *self.state_rx.borrow() != ConnectionState::Disconnected {
            return Err(PeridotError::AlreadyConnected);
        }
        self.send(Op::Connect)
    }

    /// Tears the connection down. Safe to call repeatedly or while already
    /// disconnected.
    pub fn disconnect(&self) {
        let _ = self.send(Op::Disconnect);
    }

    /// Submits a command whose reply is delivered to `callback` along with
    /// the error tag. Callable in any state: commands submitted while
    /// disconnected are buffered and flushed once a connect succeeds.
    pub fn execute(
        &self,
        command: Command,
        callback: impl FnMut(Reply, bool) + Send + 'static,
    ) -> Result<(), PeridotError> {
        self.send(Op::Execute {
            command,
            callback: Some(Box::new(callback)),
        })
    }

    /// Submits a command and discards its reply.
    pub fn execute_detached(&self, command: Command) -> Result<(), PeridotError> {
        self.send(Op::Execute {
            command,
            callback: None,
        })
    }

    pub fn set_connect_callback(
        &self,
        callback: impl FnMut() + Send + 'static,
    ) -> Result<(), PeridotError> {
        self.send(Op::SetConnectCallback(Box::new(callback)))
    }

    pub fn set_error_callback(
        &self,
        callback: impl FnMut(&PeridotError) + Send + 'static,
    ) -> Result<(), PeridotError> {
        self.send(Op::SetErrorCallback(Box::new(callback)))
    }

    /// The connection's current protocol-level state.
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Stable textual identifier (`host:port` or the unix socket path).
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Waits until the connection state satisfies `predicate`, returning
    /// the matching state.
    pub async fn wait_for_state(
        &self,
        predicate: impl FnMut(&ConnectionState) -> bool,
    ) -> Result<ConnectionState, PeridotError> {
        let mut rx = self.state_rx.clone();
        let state = *rx
            .wait_for(predicate)
            .await
            .map_err(|_| PeridotError::HandlerClosed)?;
        Ok(state)
    }
}
