//! Transfer and connection modes.

/// Representation type used for file transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    /// `TYPE A`: line-oriented text, line endings normalized locally.
    Ascii,
    /// `TYPE I`: raw bytes, copied verbatim.
    #[default]
    Binary,
}

impl TransferMode {
    /// Returns the `TYPE` argument for this mode.
    #[must_use]
    pub const fn type_code(self) -> &'static str {
        match self {
            Self::Ascii => "A",
            Self::Binary => "I",
        }
    }
}

impl std::fmt::Display for TransferMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ascii => f.write_str("ascii"),
            Self::Binary => f.write_str("binary"),
        }
    }
}

impl std::str::FromStr for TransferMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ascii" | "a" => Ok(Self::Ascii),
            "binary" | "image" | "i" => Ok(Self::Binary),
            other => Err(format!("unknown transfer mode: {other}")),
        }
    }
}

/// Who opens the data connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataMode {
    /// Client dials the endpoint from a PASV reply.
    #[default]
    Passive,
    /// Server dials a client listener announced with PORT. Not implemented.
    Active,
}

/// Direction of bytes on a data channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Server to client (RETR, LIST).
    Download,
    /// Client to server (STOR).
    Upload,
}
