//! FTP reply parser.
//!
//! Replies are single-line or multi-line:
//! - Single: `226 Transfer complete\r\n`
//! - Multi: `150-First line\r\n150-Second line\r\n150 Last line\r\n`
//!
//! Inside a multi-line reply only a line starting with the opening code
//! followed by a non-`-` separator ends the reply; anything else, including
//! lines that look like other replies, is body text.

use crate::error::{Error, Result};
use crate::types::{Endpoint, Reply, ReplyCode};

/// How a single control line relates to the reply it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `NNN text` or bare `NNN`.
    Terminal,
    /// `NNN-text`.
    Continuation,
    /// Any other line; only valid inside a multi-line reply.
    Text,
}

/// Classifies a line, returning its code (if any) and kind.
///
/// # Errors
///
/// Returns [`Error::MalformedReply`] for a blank line.
pub fn classify_line(line: &str) -> Result<(Option<ReplyCode>, LineKind)> {
    let Some(token) = line.split_whitespace().next() else {
        return Err(Error::MalformedReply("blank line".into()));
    };

    let bytes = token.as_bytes();
    if bytes.len() < 3 || !bytes[..3].iter().all(u8::is_ascii_digit) {
        return Ok((None, LineKind::Text));
    }

    let code = bytes[..3]
        .iter()
        .fold(0u16, |acc, b| acc * 10 + u16::from(b - b'0'));
    let kind = match bytes.get(3) {
        Some(b'-') => LineKind::Continuation,
        Some(b) if b.is_ascii_digit() => return Ok((None, LineKind::Text)),
        _ => LineKind::Terminal,
    };

    // Token is taken after leading whitespace; an indented code is body text.
    if line.len() != line.trim_start().len() {
        return Ok((None, LineKind::Text));
    }

    Ok((Some(ReplyCode::new(code)), kind))
}

/// Strips the code and the separator character after it from a coded line.
fn line_text(line: &str) -> String {
    let mut rest = line.get(3..).unwrap_or_default().chars();
    rest.next();
    rest.as_str().to_string()
}

/// Incremental reply parser.
///
/// Feed it control lines (without the CRLF) one at a time; it yields a
/// [`Reply`] once the terminal line arrives.
#[derive(Debug, Default)]
pub struct ReplyParser {
    open: Option<ReplyCode>,
    lines: Vec<String>,
}

impl ReplyParser {
    /// Creates an idle parser.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no reply is in progress.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.open.is_none()
    }

    /// Feeds one line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedReply`] for a blank line, or for a first
    /// line that does not start with a three-digit code.
    pub fn feed_line(&mut self, line: &str) -> Result<Option<Reply>> {
        let (code, kind) = classify_line(line)?;

        let Some(open) = self.open else {
            let Some(code) = code else {
                return Err(Error::MalformedReply(format!("no reply code: {line}")));
            };
            if kind == LineKind::Terminal {
                return Ok(Some(Reply::new(code, vec![line_text(line)])));
            }
            self.open = Some(code);
            self.lines.push(line_text(line));
            return Ok(None);
        };

        match (code, kind) {
            (Some(code), LineKind::Terminal) if code == open => {
                self.lines.push(line_text(line));
                self.open = None;
                let lines = std::mem::take(&mut self.lines);
                Ok(Some(Reply {
                    code,
                    is_multiline: true,
                    text: lines,
                }))
            }
            (Some(code), LineKind::Continuation) if code == open => {
                self.lines.push(line_text(line));
                Ok(None)
            }
            _ => {
                self.lines.push(line.to_string());
                Ok(None)
            }
        }
    }

    /// Consumes the parser, returning any lines of an unfinished reply.
    #[must_use]
    pub fn into_partial(self) -> Vec<String> {
        self.lines
    }
}

/// Parses a complete reply from a slice of lines.
///
/// # Errors
///
/// Returns [`Error::TruncatedReply`] if the slice ends before the terminal
/// line and [`Error::MalformedReply`] if lines follow it.
pub fn parse_reply(lines: &[String]) -> Result<Reply> {
    let mut parser = ReplyParser::new();
    for (idx, line) in lines.iter().enumerate() {
        if let Some(reply) = parser.feed_line(line)? {
            if idx + 1 != lines.len() {
                return Err(Error::MalformedReply(format!(
                    "{} trailing line(s) after reply {}",
                    lines.len() - idx - 1,
                    reply.code
                )));
            }
            return Ok(reply);
        }
    }
    Err(Error::TruncatedReply {
        partial: parser.into_partial(),
    })
}

/// Extracts the data endpoint from a `227` reply.
///
/// The address is the first `(h1,h2,h3,h4,p1,p2)` group in the text.
///
/// # Errors
///
/// Returns [`Error::MalformedPasvReply`] if the code is not 227 or no group
/// of exactly six byte-sized integers exists.
pub fn parse_pasv_reply(reply: &Reply) -> Result<Endpoint> {
    let text = reply.message_text();
    let malformed = || Error::MalformedPasvReply(format!("{} {text}", reply.code));

    if reply.code != ReplyCode::PASSIVE_MODE {
        return Err(malformed());
    }

    let start = text.find('(').ok_or_else(malformed)?;
    let end = text[start..].find(')').ok_or_else(malformed)? + start;
    let fields: Vec<&str> = text[start + 1..end].split(',').map(str::trim).collect();
    if fields.len() != 6 {
        return Err(malformed());
    }

    let mut octets = [0u8; 6];
    for (slot, field) in octets.iter_mut().zip(&fields) {
        *slot = field.parse().map_err(|_| malformed())?;
    }
    Ok(Endpoint::from_pasv_fields(octets))
}
