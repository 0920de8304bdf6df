//! FTP reply types.

/// FTP reply from server.
///
/// Complete once the terminal line (`NNN text`) has been read; immutable after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply code (e.g., 226).
    pub code: ReplyCode,
    /// True if the reply spanned more than one line.
    pub is_multiline: bool,
    /// Reply text lines, with the leading `NNN-`/`NNN ` stripped.
    pub text: Vec<String>,
}

impl Reply {
    /// Creates a new reply.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec is not const-compatible
    pub fn new(code: ReplyCode, text: Vec<String>) -> Self {
        Self {
            code,
            is_multiline: text.len() > 1,
            text,
        }
    }

    /// Returns true if this is a preliminary reply (1xx).
    #[must_use]
    pub const fn is_preliminary(&self) -> bool {
        self.code.is_preliminary()
    }

    /// Returns true if this is a success reply (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Returns true if this is an intermediate reply (3xx).
    #[must_use]
    pub const fn is_intermediate(&self) -> bool {
        self.code.is_intermediate()
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient_error(&self) -> bool {
        self.code.is_transient()
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent_error(&self) -> bool {
        self.code.is_permanent()
    }

    /// Returns the full text as a single string.
    #[must_use]
    pub fn message_text(&self) -> String {
        self.text.join("\n")
    }
}

impl std::fmt::Display for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.code, self.message_text())
    }
}

/// FTP reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// Creates a new reply code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns true if this is a preliminary code (1xx).
    #[must_use]
    pub const fn is_preliminary(self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Returns true if this is a success code (2xx).
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Returns true if this is an intermediate code (3xx).
    #[must_use]
    pub const fn is_intermediate(self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient(self) -> bool {
        self.0 >= 400 && self.0 < 500
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        self.0 >= 500 && self.0 < 600
    }
}

impl std::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Common reply codes
impl ReplyCode {
    /// 120 Service ready in nnn minutes
    pub const READY_SOON: Self = Self(120);
    /// 125 Data connection already open; transfer starting
    pub const ALREADY_OPEN: Self = Self(125);
    /// 150 File status okay; about to open data connection
    pub const FILE_STATUS_OK: Self = Self(150);
    /// 200 Command okay
    pub const COMMAND_OK: Self = Self(200);
    /// 220 Service ready for new user
    pub const SERVICE_READY: Self = Self(220);
    /// 221 Service closing control connection
    pub const CLOSING: Self = Self(221);
    /// 226 Closing data connection; transfer complete
    pub const TRANSFER_COMPLETE: Self = Self(226);
    /// 227 Entering passive mode
    pub const PASSIVE_MODE: Self = Self(227);
    /// 230 User logged in
    pub const LOGGED_IN: Self = Self(230);
    /// 250 Requested file action okay, completed
    pub const FILE_ACTION_OK: Self = Self(250);
    /// 257 Pathname created / current directory
    pub const PATH_CREATED: Self = Self(257);
    /// 331 User name okay, need password
    pub const NEED_PASSWORD: Self = Self(331);
    /// 332 Need account for login
    pub const NEED_ACCOUNT: Self = Self(332);
    /// 421 Service not available, closing control connection
    pub const SERVICE_UNAVAILABLE: Self = Self(421);
    /// 425 Can't open data connection
    pub const CANNOT_OPEN_DATA: Self = Self(425);
    /// 426 Connection closed; transfer aborted
    pub const TRANSFER_ABORTED: Self = Self(426);
    /// 500 Syntax error, command unrecognized
    pub const SYNTAX_ERROR: Self = Self(500);
    /// 502 Command not implemented
    pub const NOT_IMPLEMENTED: Self = Self(502);
    /// 503 Bad sequence of commands
    pub const BAD_SEQUENCE: Self = Self(503);
    /// 530 Not logged in
    pub const NOT_LOGGED_IN: Self = Self(530);
    /// 550 File unavailable (not found, no access)
    pub const FILE_UNAVAILABLE: Self = Self(550);
}
