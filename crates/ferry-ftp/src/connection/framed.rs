//! Framed I/O for the FTP control connection.
//!
//! The control connection carries CRLF-terminated text lines in both
//! directions. Commands are written and flushed one at a time; replies are
//! read a line at a time with a bounded line length.

use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::{Error, Result};

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Maximum line length to prevent memory exhaustion.
const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Line-framed control stream.
pub struct ControlStream<S> {
    reader: BufReader<S>,
    write_buffer: BytesMut,
    overlong: bool,
}

impl<S> ControlStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new framed stream.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream),
            write_buffer: BytesMut::with_capacity(256),
            overlong: false,
        }
    }

    /// Reads one line with its terminator stripped.
    ///
    /// Returns `None` once the peer has closed the connection. A final line
    /// without a terminator is still returned. A line longer than the cap is
    /// consumed through its terminator and returned cut to the cap; check
    /// [`Self::take_overlong`] afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure.
    pub async fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = Vec::new();
        let mut saw_data = false;

        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                if !saw_data {
                    return Ok(None);
                }
                break;
            }
            saw_data = true;

            let (chunk, done) = match buf.iter().position(|&b| b == b'\n') {
                Some(pos) => (pos + 1, true),
                None => (buf.len(), false),
            };
            let room = MAX_LINE_LENGTH.saturating_sub(line.len());
            if chunk > room {
                self.overlong = true;
            }
            line.extend_from_slice(&buf[..chunk.min(room)]);
            self.reader.consume(chunk);

            if done {
                break;
            }
        }

        while matches!(line.last(), Some(b'\n' | b'\r')) {
            line.pop();
        }
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }

    /// Returns true (once) if the last line read exceeded the length cap.
    pub const fn take_overlong(&mut self) -> bool {
        std::mem::replace(&mut self.overlong, false)
    }

    /// Writes a serialized command and flushes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the write or flush fails.
    pub async fn write_command(&mut self, data: &[u8]) -> Result<()> {
        self.write_buffer.clear();
        self.write_buffer.extend_from_slice(data);

        let stream = self.reader.get_mut();
        stream.write_all(&self.write_buffer).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Shuts down the write half of the underlying stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the shutdown fails.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.reader.get_mut().shutdown().await?;
        Ok(())
    }

    /// Returns a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.reader.get_ref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_read_crlf_lines() {
        let mock = Builder::new().read(b"220 Ready\r\n331 Need").read(b" password\r\n").build();
        let mut framed = ControlStream::new(mock);

        assert_eq!(framed.read_line().await.unwrap().as_deref(), Some("220 Ready"));
        assert_eq!(
            framed.read_line().await.unwrap().as_deref(),
            Some("331 Need password")
        );
        assert_eq!(framed.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_bare_lf_and_unterminated() {
        let mock = Builder::new().read(b"200 OK\n226 Done").build();
        let mut framed = ControlStream::new(mock);

        assert_eq!(framed.read_line().await.unwrap().as_deref(), Some("200 OK"));
        assert_eq!(framed.read_line().await.unwrap().as_deref(), Some("226 Done"));
        assert_eq!(framed.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overlong_line_is_consumed_whole() {
        let mut long = vec![b'2', b'1', b'1', b' '];
        long.resize(MAX_LINE_LENGTH + 100, b'x');
        long.extend_from_slice(b"\r\n200 Next\r\n");
        let mock = Builder::new().read(&long).build();
        let mut framed = ControlStream::new(mock);

        let first = framed.read_line().await.unwrap().unwrap();
        assert_eq!(first.len(), MAX_LINE_LENGTH);
        assert!(first.starts_with("211 xxx"));
        assert!(framed.take_overlong());
        assert!(!framed.take_overlong());

        assert_eq!(framed.read_line().await.unwrap().as_deref(), Some("200 Next"));
        assert!(!framed.take_overlong());
    }

    #[tokio::test]
    async fn test_write_command() {
        let mock = Builder::new().write(b"PWD\r\n").build();
        let mut framed = ControlStream::new(mock);

        framed.write_command(b"PWD\r\n").await.unwrap();
    }
}
