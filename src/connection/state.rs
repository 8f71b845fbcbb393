// src/connection/state.rs

//! Connection states, streaming modes, and the typed callback contracts.

use crate::errors::PeridotError;
use crate::protocol::Reply;
use strum_macros::Display;

/// Invoked with each reply paired to a submitted command, or with every
/// pushed message while the connection is in a streaming mode. The second
/// argument is true when the server tagged the reply as an error.
pub type ReplyCallback = Box<dyn FnMut(Reply, bool) + Send + 'static>;

/// Invoked once the connection reaches [`ConnectionState::Ready`].
pub type ConnectCallback = Box<dyn FnMut() + Send + 'static>;

/// Invoked after any fatal connection failure. The connection is already
/// back in [`ConnectionState::Disconnected`] when this runs, and the
/// outcomes of all in-flight commands are unknown.
pub type ErrorCallback = Box<dyn FnMut(&PeridotError) + Send + 'static>;

/// The protocol-level mode of a connection. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Ready,
    /// Pub/sub streaming: the server pushes messages outside
    /// request/response pairing.
    Subscribed,
    /// Diagnostic streaming of every command the server processes.
    Monitoring,
}

impl ConnectionState {
    /// True for every state with an established socket.
    pub fn is_connected(&self) -> bool {
        matches!(
            self,
            ConnectionState::Ready | ConnectionState::Subscribed | ConnectionState::Monitoring
        )
    }
}

/// The streaming sub-mode entered when a subscribe-family or monitor
/// command's first reply arrives. Pub/sub and monitor are distinct
/// protocols, so each carries its own sticky callback slot; the callback
/// receives every subsequent message until disconnect.
pub enum StreamingMode {
    PubSub(ReplyCallback),
    Monitor(ReplyCallback),
}

impl StreamingMode {
    /// The connection state this mode corresponds to.
    pub fn state(&self) -> ConnectionState {
        match self {
            StreamingMode::PubSub(_) => ConnectionState::Subscribed,
            StreamingMode::Monitor(_) => ConnectionState::Monitoring,
        }
    }

    pub fn callback_mut(&mut self) -> &mut ReplyCallback {
        match self {
            StreamingMode::PubSub(cb) | StreamingMode::Monitor(cb) => cb,
        }
    }
}
