//! Connection configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::types::TransferMode;

/// Default FTP control port.
pub const DEFAULT_PORT: u16 = 21;

/// FTP connection configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server hostname.
    pub host: String,
    /// Control port.
    pub port: u16,
    /// Timeout for establishing control and data connections.
    pub connect_timeout: Duration,
    /// Timeout for each control reply.
    pub io_timeout: Duration,
    /// Directory downloads are written to.
    pub local_dir: PathBuf,
    /// Transfer mode a new session starts in.
    pub transfer_mode: TransferMode,
}

impl Config {
    /// Creates a new configuration for port 21.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        ConfigBuilder::new(host).build()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(host)
    }

    /// Returns the `host:port` string to dial.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builder for connection configuration.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    host: String,
    port: u16,
    connect_timeout: Duration,
    io_timeout: Duration,
    local_dir: PathBuf,
    transfer_mode: TransferMode,
}

impl ConfigBuilder {
    /// Creates a new builder with the given hostname.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_secs(30),
            io_timeout: Duration::from_secs(60),
            local_dir: PathBuf::from("."),
            transfer_mode: TransferMode::Binary,
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the reply timeout.
    #[must_use]
    pub const fn io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Sets the download directory.
    #[must_use]
    pub fn local_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_dir = dir.into();
        self
    }

    /// Sets the initial transfer mode.
    #[must_use]
    pub const fn transfer_mode(mut self, mode: TransferMode) -> Self {
        self.transfer_mode = mode;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        Config {
            host: self.host,
            port: self.port,
            connect_timeout: self.connect_timeout,
            io_timeout: self.io_timeout,
            local_dir: self.local_dir,
            transfer_mode: self.transfer_mode,
        }
    }
}
