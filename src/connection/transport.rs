// src/connection/transport.rs

//! The non-blocking socket seam between the actor core and real networking.

use crate::config::ConnectionConfig;
use std::io;
use tokio::io::{Interest, Ready};
use tokio::net::TcpStream;
#[cfg(unix)]
use tokio::net::UnixStream;

/// Non-blocking socket operations the connection core depends on.
///
/// Implementations must return `WouldBlock` rather than wait; partial reads
/// and writes are normal and handled by the caller.
pub trait Transport {
    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize>;
    fn try_write(&self, buf: &[u8]) -> io::Result<usize>;

    /// Reports a pending socket-level error, clearing it. Consulted after
    /// establishment to verify the connect actually succeeded rather than
    /// merely signaled writability.
    fn take_error(&self) -> io::Result<Option<io::Error>>;
}

/// A connected client socket, TCP or unix domain.
#[derive(Debug)]
pub enum ClientStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl ClientStream {
    /// Opens the socket described by `config`.
    pub async fn connect(config: &ConnectionConfig) -> io::Result<Self> {
        #[cfg(unix)]
        if let Some(path) = &config.unix_socket_path {
            return Ok(ClientStream::Unix(UnixStream::connect(path).await?));
        }
        #[cfg(not(unix))]
        if config.unix_socket_path.is_some() {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "unix sockets are not available on this platform",
            ));
        }

        let stream = TcpStream::connect((config.host.as_str(), config.port)).await?;
        stream.set_nodelay(true)?;
        Ok(ClientStream::Tcp(stream))
    }

    /// Waits until the socket is ready for any of `interest`.
    pub async fn ready(&self, interest: Interest) -> io::Result<Ready> {
        match self {
            ClientStream::Tcp(stream) => stream.ready(interest).await,
            #[cfg(unix)]
            ClientStream::Unix(stream) => stream.ready(interest).await,
        }
    }
}

impl Transport for ClientStream {
    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ClientStream::Tcp(stream) => stream.try_read(buf),
            #[cfg(unix)]
            ClientStream::Unix(stream) => stream.try_read(buf),
        }
    }

    fn try_write(&self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ClientStream::Tcp(stream) => stream.try_write(buf),
            #[cfg(unix)]
            ClientStream::Unix(stream) => stream.try_write(buf),
        }
    }

    fn take_error(&self) -> io::Result<Option<io::Error>> {
        match self {
            ClientStream::Tcp(stream) => stream.take_error(),
            #[cfg(unix)]
            ClientStream::Unix(stream) => stream.take_error(),
        }
    }
}
