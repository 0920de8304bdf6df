//! The persistent FTP control channel.
//!
//! The control channel is half-duplex at the application layer: exactly one
//! command may be outstanding. A preliminary (1xx) reply leaves the command
//! outstanding, since the server owes a second reply once the data transfer
//! ends.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use super::framed::ControlStream;
use super::Config;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::ReplyParser;
use crate::types::{Reply, ReplyCode};

const WIRE_TARGET: &str = "ferry_ftp::wire";

/// Control connection to an FTP server.
pub struct ControlChannel<S> {
    stream: ControlStream<S>,
    pending: bool,
    closed: bool,
    last_code: Option<ReplyCode>,
    io_timeout: Duration,
    wire_trace: bool,
}

impl ControlChannel<TcpStream> {
    /// Dials the server and reads its greeting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] if the connection cannot be established
    /// within the configured timeout or the greeting is not 2xx.
    pub async fn connect(config: &Config) -> Result<(Self, Reply)> {
        let addr = config.address();
        let tcp = match tokio::time::timeout(config.connect_timeout, TcpStream::connect(&addr)).await
        {
            Ok(Ok(tcp)) => tcp,
            Ok(Err(source)) => return Err(Error::Connect { addr, source }),
            Err(_) => {
                return Err(Error::Connect {
                    addr,
                    source: io::Error::new(io::ErrorKind::TimedOut, "connect timed out"),
                });
            }
        };
        debug!("Control connection established to {addr}");

        let mut channel = Self::new(tcp, config.io_timeout);
        let greeting = channel.read_greeting().await.map_err(|err| match err {
            Error::Connect { source, .. } => Error::Connect {
                addr: addr.clone(),
                source,
            },
            other => Error::Connect {
                addr: addr.clone(),
                source: io::Error::other(other.to_string()),
            },
        })?;
        Ok((channel, greeting))
    }
}

impl<S> ControlChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a connected stream. The server greeting is the first pending reply.
    pub fn new(stream: S, io_timeout: Duration) -> Self {
        Self {
            stream: ControlStream::new(stream),
            pending: true,
            closed: false,
            last_code: None,
            io_timeout,
            wire_trace: false,
        }
    }

    /// Reads the server greeting, waiting through `120` replies.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] if the greeting is not 2xx.
    pub async fn read_greeting(&mut self) -> Result<Reply> {
        loop {
            let reply = self.read_reply().await?;
            if reply.code == ReplyCode::READY_SOON {
                continue;
            }
            if !reply.is_success() {
                return Err(Error::Connect {
                    addr: "server".to_string(),
                    source: io::Error::new(io::ErrorKind::ConnectionRefused, reply.to_string()),
                });
            }
            return Ok(reply);
        }
    }

    /// Writes a command and flushes it immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CommandPending`] if the previous command's reply has
    /// not been read yet, and [`Error::InvalidArgument`] (with nothing
    /// written) if the argument holds a line break.
    pub async fn send(&mut self, command: &Command) -> Result<()> {
        if self.closed {
            return Err(Error::Io(io::Error::from(io::ErrorKind::NotConnected)));
        }
        if self.pending {
            return Err(Error::CommandPending);
        }
        command.validate()?;

        if self.wire_trace {
            info!(target: WIRE_TARGET, "--> {command}");
        } else {
            debug!("--> {command}");
        }
        self.stream.write_command(&command.serialize()).await?;
        self.pending = true;
        Ok(())
    }

    /// Reads exactly one reply for the outstanding command.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoReplyPending`] if no command is outstanding,
    /// [`Error::TruncatedReply`] if the server closes mid-reply, and
    /// [`Error::Timeout`] if no complete reply arrives in time.
    pub async fn read_reply(&mut self) -> Result<Reply> {
        if !self.pending {
            return Err(Error::NoReplyPending);
        }

        let read = tokio::time::timeout(self.io_timeout, Self::read_lines(&mut self.stream));
        let reply = match read.await {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => {
                self.pending = false;
                return Err(err);
            }
            Err(_) => return Err(Error::Timeout("waiting for a control reply")),
        };

        for line in &reply.text {
            if self.wire_trace {
                info!(target: WIRE_TARGET, "<-- {} {line}", reply.code);
            } else {
                debug!("<-- {} {line}", reply.code);
            }
        }

        self.last_code = Some(reply.code);
        self.pending = reply.is_preliminary();
        Ok(reply)
    }

    /// Reads one whole reply.
    ///
    /// A bad line inside a multi-line reply is reported only after the
    /// reply's terminal line, so the next command still reads its own reply.
    async fn read_lines(stream: &mut ControlStream<S>) -> Result<Reply> {
        let mut parser = ReplyParser::new();
        let mut deferred: Option<Error> = None;
        loop {
            let Some(line) = stream.read_line().await? else {
                return Err(Error::TruncatedReply {
                    partial: parser.into_partial(),
                });
            };
            if stream.take_overlong() && deferred.is_none() {
                deferred = Some(Error::MalformedReply("line too long".into()));
            }

            match parser.feed_line(&line) {
                Ok(Some(reply)) => return deferred.map_or(Ok(reply), Err),
                Ok(None) => {}
                Err(err) if parser.is_idle() => return Err(err),
                Err(err) => {
                    warn!("Skipping rest of malformed reply: {err}");
                    deferred.get_or_insert(err);
                }
            }
        }
    }

    /// Sends a command and reads its reply.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Self::send`] and [`Self::read_reply`].
    pub async fn execute(&mut self, command: &Command) -> Result<Reply> {
        self.send(command).await?;
        self.read_reply().await
    }

    /// Sends `USER` then `PASS`, returning the final reply.
    ///
    /// `PASS` is skipped if `USER` already produced a terminal reply (230
    /// or an error). The caller decides whether the reply means success.
    ///
    /// # Errors
    ///
    /// Returns an error only for transport or protocol failures.
    pub async fn authenticate(&mut self, user: &str, pass: &str) -> Result<Reply> {
        let reply = self
            .execute(&Command::User {
                name: user.to_string(),
            })
            .await?;
        if !reply.is_intermediate() {
            return Ok(reply);
        }

        self.execute(&Command::Pass {
            password: pass.to_string(),
        })
        .await
    }

    /// Sends `QUIT`, reads the reply, and shuts the connection down.
    ///
    /// The socket is released whatever the reply says. If a reply is still
    /// pending the channel cannot issue `QUIT` and is shut down directly.
    ///
    /// # Errors
    ///
    /// Returns an error if `QUIT` could not be sent or answered.
    pub async fn close(&mut self) -> Result<Option<Reply>> {
        if self.closed {
            return Ok(None);
        }

        let result = if self.pending {
            warn!("Closing control channel with a reply still pending");
            Ok(None)
        } else {
            self.execute(&Command::Quit).await.map(Some)
        };

        if let Ok(Some(reply)) = &result {
            if !reply.is_success() {
                warn!("QUIT answered with {reply}");
            }
        }

        self.closed = true;
        if let Err(err) = self.stream.shutdown().await {
            debug!("Control shutdown failed: {err}");
        }
        result
    }

    /// Returns the code of the most recently read reply.
    #[must_use]
    pub const fn last_code(&self) -> Option<ReplyCode> {
        self.last_code
    }

    /// Returns true if a reply is owed for the outstanding command.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending
    }

    /// Returns true once [`Self::close`] has run.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Logs control traffic at info level when enabled.
    pub const fn set_wire_trace(&mut self, enabled: bool) {
        self.wire_trace = enabled;
    }

    /// Returns whether control traffic is logged at info level.
    #[must_use]
    pub const fn wire_trace(&self) -> bool {
        self.wire_trace
    }

    /// Returns a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.stream.get_ref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_greeting() {
        let mock = Builder::new().read(b"220-Welcome\r\n220 Ready\r\n").build();
        let mut channel = ControlChannel::new(mock, TIMEOUT);

        let greeting = channel.read_greeting().await.unwrap();
        assert_eq!(greeting.code, ReplyCode::SERVICE_READY);
        assert_eq!(greeting.text, vec!["Welcome", "Ready"]);
        assert!(!channel.is_pending());
    }

    #[tokio::test]
    async fn test_greeting_waits_through_120() {
        let mock = Builder::new()
            .read(b"120 Ready in 1 minute\r\n")
            .read(b"220 Ready\r\n")
            .build();
        let mut channel = ControlChannel::new(mock, TIMEOUT);

        let greeting = channel.read_greeting().await.unwrap();
        assert_eq!(greeting.code, ReplyCode::SERVICE_READY);
    }

    #[tokio::test]
    async fn test_greeting_refused() {
        let mock = Builder::new().read(b"421 Too many users\r\n").build();
        let mut channel = ControlChannel::new(mock, TIMEOUT);

        assert!(matches!(
            channel.read_greeting().await,
            Err(Error::Connect { .. })
        ));
    }

    #[tokio::test]
    async fn test_send_and_read_pairing() {
        let mock = Builder::new()
            .read(b"220 Ready\r\n")
            .write(b"PWD\r\n")
            .read(b"257 \"/\" is current directory\r\n")
            .build();
        let mut channel = ControlChannel::new(mock, TIMEOUT);
        channel.read_greeting().await.unwrap();

        let reply = channel.execute(&Command::Pwd).await.unwrap();
        assert_eq!(reply.code, ReplyCode::PATH_CREATED);
        assert_eq!(channel.last_code(), Some(ReplyCode::PATH_CREATED));
    }

    #[tokio::test]
    async fn test_blank_line_inside_reply_keeps_pairing() {
        let mock = Builder::new()
            .read(b"220 Ready\r\n")
            .write(b"PWD\r\n")
            .read(b"257-first\r\n\r\n257 \"/\" is cwd\r\n")
            .write(b"NOOP\r\n")
            .read(b"200 NOOP ok\r\n")
            .build();
        let mut channel = ControlChannel::new(mock, TIMEOUT);
        channel.read_greeting().await.unwrap();

        assert!(matches!(
            channel.execute(&Command::Pwd).await,
            Err(Error::MalformedReply(_))
        ));
        assert!(!channel.is_pending());

        let next = channel.execute(&Command::Noop).await.unwrap();
        assert_eq!(next.code, ReplyCode::COMMAND_OK);
    }

    #[tokio::test]
    async fn test_overlong_line_inside_reply_keeps_pairing() {
        let mut reply = b"211-Features\r\n".to_vec();
        reply.extend(std::iter::repeat_n(b'x', 70 * 1024));
        reply.extend_from_slice(b"\r\n211 End\r\n");
        let mock = Builder::new()
            .read(b"220 Ready\r\n")
            .write(b"NOOP\r\n")
            .read(&reply)
            .write(b"PWD\r\n")
            .read(b"257 \"/\"\r\n")
            .build();
        let mut channel = ControlChannel::new(mock, TIMEOUT);
        channel.read_greeting().await.unwrap();

        assert!(matches!(
            channel.execute(&Command::Noop).await,
            Err(Error::MalformedReply(_))
        ));
        let next = channel.execute(&Command::Pwd).await.unwrap();
        assert_eq!(next.code, ReplyCode::PATH_CREATED);
    }

    #[tokio::test]
    async fn test_second_command_rejected_while_pending() {
        let mock = Builder::new()
            .read(b"220 Ready\r\n")
            .write(b"PWD\r\n")
            .read(b"257 \"/\"\r\n")
            .build();
        let mut channel = ControlChannel::new(mock, TIMEOUT);
        channel.read_greeting().await.unwrap();

        channel.send(&Command::Pwd).await.unwrap();
        assert!(matches!(
            channel.send(&Command::Noop).await,
            Err(Error::CommandPending)
        ));
        channel.read_reply().await.unwrap();
        assert!(matches!(
            channel.read_reply().await,
            Err(Error::NoReplyPending)
        ));
    }

    #[tokio::test]
    async fn test_preliminary_reply_keeps_command_outstanding() {
        let mock = Builder::new()
            .read(b"220 Ready\r\n")
            .write(b"LIST\r\n")
            .read(b"150 Here comes the listing\r\n")
            .read(b"226 Directory send OK\r\n")
            .build();
        let mut channel = ControlChannel::new(mock, TIMEOUT);
        channel.read_greeting().await.unwrap();

        let first = channel.execute(&Command::List).await.unwrap();
        assert!(first.is_preliminary());
        assert!(channel.is_pending());
        assert!(matches!(
            channel.send(&Command::Pwd).await,
            Err(Error::CommandPending)
        ));

        let second = channel.read_reply().await.unwrap();
        assert_eq!(second.code, ReplyCode::TRANSFER_COMPLETE);
        assert!(!channel.is_pending());
    }

    #[tokio::test]
    async fn test_truncated_reply() {
        let mock = Builder::new()
            .read(b"220 Ready\r\n")
            .write(b"PWD\r\n")
            .read(b"257-first\r\n")
            .build();
        let mut channel = ControlChannel::new(mock, TIMEOUT);
        channel.read_greeting().await.unwrap();

        let err = channel.execute(&Command::Pwd).await.unwrap_err();
        assert!(matches!(err, Error::TruncatedReply { .. }));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let mock = Builder::new()
            .read(b"220 Ready\r\n")
            .write(b"USER demo\r\n")
            .read(b"331 Password required\r\n")
            .write(b"PASS secret\r\n")
            .read(b"230 Logged in\r\n")
            .build();
        let mut channel = ControlChannel::new(mock, TIMEOUT);
        channel.read_greeting().await.unwrap();

        let reply = channel.authenticate("demo", "secret").await.unwrap();
        assert_eq!(reply.code, ReplyCode::LOGGED_IN);
    }

    #[tokio::test]
    async fn test_authenticate_rejected_user_skips_pass() {
        let mock = Builder::new()
            .read(b"220 Ready\r\n")
            .write(b"USER nobody\r\n")
            .read(b"530 Not allowed\r\n")
            .build();
        let mut channel = ControlChannel::new(mock, TIMEOUT);
        channel.read_greeting().await.unwrap();

        let reply = channel.authenticate("nobody", "x").await.unwrap();
        assert_eq!(reply.code, ReplyCode::NOT_LOGGED_IN);
    }

    #[tokio::test]
    async fn test_close_sends_quit() {
        let mock = Builder::new()
            .read(b"220 Ready\r\n")
            .write(b"QUIT\r\n")
            .read(b"221 Goodbye\r\n")
            .build();
        let mut channel = ControlChannel::new(mock, TIMEOUT);
        channel.read_greeting().await.unwrap();

        let reply = channel.close().await.unwrap().unwrap();
        assert_eq!(reply.code, ReplyCode::CLOSING);
        assert!(channel.is_closed());
        assert!(channel.send(&Command::Noop).await.is_err());
    }

    #[tokio::test]
    async fn test_close_tolerates_error_reply() {
        let mock = Builder::new()
            .read(b"220 Ready\r\n")
            .write(b"QUIT\r\n")
            .read(b"500 What?\r\n")
            .build();
        let mut channel = ControlChannel::new(mock, TIMEOUT);
        channel.read_greeting().await.unwrap();

        let reply = channel.close().await.unwrap().unwrap();
        assert_eq!(reply.code, ReplyCode::SYNTAX_ERROR);
        assert!(channel.is_closed());
    }
}
