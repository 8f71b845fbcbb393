// src/connection/queue.rs

//! The FIFO pairing queue matching replies to submitted commands.

use super::state::ReplyCallback;
use crate::command::CommandKind;
use crate::errors::PeridotError;
use std::collections::VecDeque;
use std::fmt;

/// One submitted command awaiting its reply. The callback is exclusively
/// held here until the entry is dequeued.
pub struct QueuedCommand {
    pub kind: CommandKind,
    pub verb: String,
    pub callback: Option<ReplyCallback>,
}

impl fmt::Debug for QueuedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedCommand")
            .field("kind", &self.kind)
            .field("verb", &self.verb)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// Strict FIFO of commands sent but not yet fully replied.
///
/// The protocol guarantees one reply per command in submission order, so
/// queue order is the sole reply-matching mechanism.
#[derive(Debug, Default)]
pub struct CommandQueue {
    entries: VecDeque<QueuedCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, entry: QueuedCommand) {
        self.entries.push_back(entry);
    }

    /// Removes and returns the front entry. An empty queue means a reply
    /// arrived with no outstanding command: an unrecoverable
    /// desynchronization that callers must surface as a fatal connection
    /// error, never swallow.
    pub fn dequeue(&mut self) -> Result<QueuedCommand, PeridotError> {
        self.entries.pop_front().ok_or(PeridotError::QueueUnderflow)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every pending entry without invoking callbacks. Their outcomes
    /// are unknown once the connection is gone.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
