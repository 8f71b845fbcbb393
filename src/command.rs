// src/command.rs

//! Command descriptors: a protocol verb plus its arguments.

use crate::protocol::encode_command;
use bytes::Bytes;

/// Classifies how a command's reply affects dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// One request, one reply, matched through the command queue.
    Regular,
    /// Switches the connection into subscriber streaming once its reply arrives.
    Subscribe,
    /// Switches the connection into monitor streaming once its reply arrives.
    Monitor,
}

/// A single command to submit over a connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    verb: String,
    args: Vec<Bytes>,
}

impl Command {
    pub fn new(verb: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            args: Vec::new(),
        }
    }

    /// Appends one argument. Builder-style, so pipelined call sites stay flat.
    pub fn arg(mut self, arg: impl Into<Bytes>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub fn args(&self) -> &[Bytes] {
        &self.args
    }

    /// The command's dispatch classification, decided by its verb.
    pub fn kind(&self) -> CommandKind {
        if self.verb.eq_ignore_ascii_case("SUBSCRIBE") || self.verb.eq_ignore_ascii_case("PSUBSCRIBE")
        {
            CommandKind::Subscribe
        } else if self.verb.eq_ignore_ascii_case("MONITOR") {
            CommandKind::Monitor
        } else {
            CommandKind::Regular
        }
    }

    /// Encodes the command into its wire representation.
    pub fn encode(&self) -> Bytes {
        encode_command(&self.verb, &self.args)
    }
}
