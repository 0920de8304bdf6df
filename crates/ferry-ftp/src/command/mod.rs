//! FTP command builder.

use crate::error::{Error, Result};
use crate::types::TransferMode;

/// FTP control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// USER - Identify the user
    User {
        /// Login name
        name: String,
    },
    /// PASS - Password for the preceding USER
    Pass {
        /// Password
        password: String,
    },
    /// CWD - Change working directory
    Cwd {
        /// Remote path
        path: String,
    },
    /// CDUP - Change to parent directory
    Cdup,
    /// PWD - Print working directory
    Pwd,
    /// TYPE - Set representation type
    Type(TransferMode),
    /// PASV - Ask the server to listen for a data connection
    Pasv,
    /// RETR - Retrieve a file
    Retr {
        /// Remote path
        path: String,
    },
    /// STOR - Store a file
    Stor {
        /// Remote path
        path: String,
    },
    /// LIST - List the working directory
    List,
    /// NOOP - No operation
    Noop,
    /// QUIT - Close connection
    Quit,
}

impl Command {
    /// Returns the command verb.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::User { .. } => "USER",
            Self::Pass { .. } => "PASS",
            Self::Cwd { .. } => "CWD",
            Self::Cdup => "CDUP",
            Self::Pwd => "PWD",
            Self::Type(_) => "TYPE",
            Self::Pasv => "PASV",
            Self::Retr { .. } => "RETR",
            Self::Stor { .. } => "STOR",
            Self::List => "LIST",
            Self::Noop => "NOOP",
            Self::Quit => "QUIT",
        }
    }

    /// Returns the argument, if the command takes one.
    fn argument(&self) -> Option<&str> {
        match self {
            Self::User { name } => Some(name),
            Self::Pass { password } => Some(password),
            Self::Cwd { path } | Self::Retr { path } | Self::Stor { path } => Some(path),
            Self::Type(mode) => Some(mode.type_code()),
            Self::Cdup | Self::Pwd | Self::Pasv | Self::List | Self::Noop | Self::Quit => None,
        }
    }

    /// Checks that the argument cannot end the command line early.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the argument contains CR or LF.
    pub fn validate(&self) -> Result<()> {
        match self.argument() {
            Some(arg) if arg.contains(['\r', '\n']) => Err(Error::InvalidArgument(format!(
                "{} argument contains a line break",
                self.verb()
            ))),
            _ => Ok(()),
        }
    }

    /// Serializes the command to bytes.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(self.verb().as_bytes());
        if let Some(arg) = self.argument() {
            buf.push(b' ');
            buf.extend_from_slice(arg.as_bytes());
        }
        buf.extend_from_slice(b"\r\n");
        buf
    }
}

/// Log-safe rendering; the PASS argument is masked.
impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self, self.argument()) {
            (Self::Pass { .. }, _) => f.write_str("PASS ****"),
            (_, Some(arg)) => write!(f, "{} {arg}", self.verb()),
            (_, None) => f.write_str(self.verb()),
        }
    }
}
