// src/config.rs

//! Manages connection configuration: loading, defaults, and endpoint naming.

use crate::errors::PeridotError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// Parameters for a single logical connection. Supplied at construction and
/// never mutated afterwards.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// When set, the connection uses a unix domain socket instead of TCP.
    #[serde(default)]
    pub unix_socket_path: Option<String>,

    /// How long connection establishment may take before it is aborted.
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub connect_timeout: Duration,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    6379
}
fn default_connect_timeout() -> Duration {
    Duration::from_secs(2)
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            unix_socket_path: None,
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl ConnectionConfig {
    /// A TCP configuration for the given host and port.
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// A unix-domain-socket configuration for the given path.
    pub fn unix(path: impl Into<String>) -> Self {
        Self {
            unix_socket_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Loads a configuration from a TOML file.
    pub fn from_file(path: &str) -> Result<Self, PeridotError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| PeridotError::Config(format!("failed to read \"{path}\": {e}")))?;
        Ok(toml::from_str(&raw)?)
    }

    /// A stable textual identifier for logging and equality checks:
    /// `host:port` for TCP, the socket path for unix sockets.
    pub fn endpoint(&self) -> String {
        match &self.unix_socket_path {
            Some(path) => path.clone(),
            None => format!("{}:{}", self.host, self.port),
        }
    }
}
