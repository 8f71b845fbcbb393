// src/connection/mod.rs

//! Manages the lifecycle of a single client connection: write buffering,
//! reply pairing, the state machine, and the tokio driver gluing them to a
//! real socket.

// Declare the private sub-modules of the `connection` module.
mod actor;
mod driver;
mod queue;
mod state;
mod transport;
mod write_buffer;

// Publicly re-export the primary types from the sub-modules.
// This creates a clean public API for the `connection` module, hiding the
// internal file structure from the rest of the crate.
pub use actor::ConnectionActor;
pub use driver::Connection;
pub use queue::{CommandQueue, QueuedCommand};
pub use state::{ConnectCallback, ConnectionState, ErrorCallback, ReplyCallback, StreamingMode};
pub use transport::{ClientStream, Transport};
pub use write_buffer::WriteBuffer;
