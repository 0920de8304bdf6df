//! Error types for FTP operations.

use std::io;

use crate::types::Endpoint;

/// Result type alias for FTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// FTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Could not reach the server's control port.
    #[error("Connection to {addr} failed: {source}")]
    Connect {
        /// Address that was dialed.
        addr: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// Login did not end with 230.
    #[error("Login failed ({code}): {message}")]
    Auth {
        /// Terminal reply code.
        code: u16,
        /// Reply text.
        message: String,
    },

    /// Control stream ended before the terminal line of a reply.
    #[error("Control connection closed mid-reply")]
    TruncatedReply {
        /// Lines received before the stream ended.
        partial: Vec<String>,
    },

    /// A control line could not be read as a reply line.
    #[error("Malformed reply: {0}")]
    MalformedReply(String),

    /// PASV reply had no usable address.
    #[error("Malformed PASV reply: {0}")]
    MalformedPasvReply(String),

    /// Could not open the negotiated data connection.
    #[error("Data connection to {endpoint} failed: {source}")]
    DataConnect {
        /// Endpoint announced by the server.
        endpoint: Endpoint,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// Server refused the transfer command with a 5xx reply.
    #[error("Server refused transfer ({code}): {message}")]
    RemoteRefused {
        /// Reply code (e.g., 550).
        code: u16,
        /// Reply text.
        message: String,
    },

    /// Reply code matches none of the codes the operation expects.
    #[error("Unexpected reply ({code}): {message}")]
    UnexpectedReply {
        /// Reply code.
        code: u16,
        /// Raw reply text.
        message: String,
    },

    /// Data channel reached EOF but the server did not confirm the transfer.
    #[error("Transfer incomplete after {bytes} bytes ({code}): {message}")]
    TransferIncomplete {
        /// Trailing reply code.
        code: u16,
        /// Trailing reply text.
        message: String,
        /// Bytes moved before the data channel closed.
        bytes: u64,
    },

    /// Requested data-connection mode is not implemented.
    #[error("Unsupported mode: {0}")]
    UnsupportedMode(String),

    /// A command was sent while a reply to the previous one was still unread.
    #[error("A reply is still pending on the control channel")]
    CommandPending,

    /// A reply was requested but no command is awaiting one.
    #[error("No command is awaiting a reply")]
    NoReplyPending,

    /// Caller supplied an argument that is never sent to the server.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A connect or read deadline elapsed.
    #[error("Timed out while {0}")]
    Timeout(&'static str),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Creates a refusal from a reply code and message.
    #[must_use]
    pub fn remote_refused(code: u16, message: impl Into<String>) -> Self {
        Self::RemoteRefused {
            code,
            message: message.into(),
        }
    }

    /// Returns true if the error ends only the current transfer.
    ///
    /// The control channel stays in sync and the session remains usable.
    #[must_use]
    pub const fn is_transfer_scoped(&self) -> bool {
        matches!(
            self,
            Self::MalformedPasvReply(_)
                | Self::DataConnect { .. }
                | Self::RemoteRefused { .. }
                | Self::UnexpectedReply { .. }
                | Self::TransferIncomplete { .. }
        )
    }

    /// Returns true if the session cannot continue after this error.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Connect { .. } | Self::Timeout(_))
    }
}
