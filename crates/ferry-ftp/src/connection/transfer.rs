//! Data-channel transfers: RETR, LIST and STOR.
//!
//! Every transfer follows the same sequence:
//!
//! ```text
//! TYPE A|I ─→ PASV ─→ connect ─→ RETR/LIST/STOR ─→ 1xx
//!                                                   │
//!            read trailing 2xx ←─ close data ←─ stream until EOF
//! ```
//!
//! The trailing control reply is only read after the data channel has hit
//! EOF and been closed. On every failure path the data channel is closed
//! and each command sent gets exactly one terminal reply read.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, warn};

use super::passive::{DataChannel, PassiveNegotiator};
use super::ControlChannel;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::types::{Direction, Reply, TransferMode};

/// Line terminator written for ascii-mode downloads.
#[cfg(windows)]
const LOCAL_EOL: &[u8] = b"\r\n";
#[cfg(not(windows))]
const LOCAL_EOL: &[u8] = b"\n";

/// Result of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    /// Payload bytes moved over the data channel.
    pub bytes: u64,
    /// Local file read or written, if any.
    pub local_path: Option<PathBuf>,
    /// Trailing control reply (typically 226).
    pub reply: Reply,
}

/// Orchestrates one data-channel operation end to end.
#[derive(Debug, Clone, Copy)]
pub struct TransferEngine {
    negotiator: PassiveNegotiator,
}

impl TransferEngine {
    /// Creates an engine using the given negotiator.
    #[must_use]
    pub const fn new(negotiator: PassiveNegotiator) -> Self {
        Self { negotiator }
    }

    /// Downloads `remote_path` into `local_dir` under its base name.
    ///
    /// An existing file of the same name is truncated. The file is only
    /// created once the server has accepted `RETR`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty path,
    /// [`Error::RemoteRefused`] for a 5xx answer to `RETR`, and
    /// [`Error::TransferIncomplete`] if the server does not confirm the
    /// transfer after EOF.
    pub async fn download<S>(
        &self,
        channel: &mut ControlChannel<S>,
        mode: TransferMode,
        remote_path: &str,
        local_dir: &Path,
    ) -> Result<TransferOutcome>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let local_path = local_dir.join(base_name(remote_path)?);
        let command = Command::Retr {
            path: remote_path.to_string(),
        };
        command.validate()?;

        set_type(channel, mode).await?;
        let mut data = self.open(channel, command, Direction::Download).await?;

        let drained = drain_to_file(&mut data, mode, &local_path).await;
        let outcome = finish(channel, data, drained).await;
        if outcome.is_err() {
            warn!("Download of {remote_path} did not complete; {} may be partial", local_path.display());
        }
        let (bytes, reply) = outcome?;

        Ok(TransferOutcome {
            bytes,
            local_path: Some(local_path),
            reply,
        })
    }

    /// Lists the remote working directory.
    ///
    /// An empty directory yields an empty vector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RemoteRefused`] if the server rejects `LIST` and
    /// [`Error::TransferIncomplete`] if it does not confirm the listing.
    pub async fn list<S>(&self, channel: &mut ControlChannel<S>) -> Result<Vec<String>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        set_type(channel, TransferMode::Ascii).await?;
        let mut data = self.open(channel, Command::List, Direction::Download).await?;

        let mut lines = Vec::new();
        let drained = read_lines(&mut data, &mut lines).await;
        finish(channel, data, drained).await?;
        Ok(lines)
    }

    /// Uploads `local_path` as `remote_name`.
    ///
    /// Closing the data channel marks end of file for the server.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the local file cannot be opened (nothing is
    /// sent in that case), plus the same errors as [`Self::download`].
    pub async fn upload<S>(
        &self,
        channel: &mut ControlChannel<S>,
        mode: TransferMode,
        local_path: &Path,
        remote_name: &str,
    ) -> Result<TransferOutcome>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        if remote_name.is_empty() {
            return Err(Error::InvalidArgument("remote file name is empty".into()));
        }
        let command = Command::Stor {
            path: remote_name.to_string(),
        };
        command.validate()?;
        let file = File::open(local_path).await?;

        set_type(channel, mode).await?;
        let mut data = self.open(channel, command, Direction::Upload).await?;

        let sent = send_file(&mut data, mode, file).await;
        let (bytes, reply) = finish(channel, data, sent).await?;

        Ok(TransferOutcome {
            bytes,
            local_path: Some(local_path.to_path_buf()),
            reply,
        })
    }

    /// Negotiates a data channel and issues the transfer command.
    ///
    /// Returns the channel only if the server answered 1xx; otherwise the
    /// unused channel is closed and the reply becomes the error.
    async fn open<S>(
        &self,
        channel: &mut ControlChannel<S>,
        command: Command,
        direction: Direction,
    ) -> Result<DataChannel>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let data = self.negotiator.negotiate(channel, direction).await?;
        let reply = channel.execute(&command).await?;

        if reply.is_preliminary() {
            debug!("{} accepted: {reply}", command.verb());
            return Ok(data);
        }

        data.close().await;
        let code = reply.code.as_u16();
        if reply.is_permanent_error() {
            Err(Error::remote_refused(code, reply.message_text()))
        } else {
            Err(Error::UnexpectedReply {
                code,
                message: reply.message_text(),
            })
        }
    }
}

/// Sends `TYPE`; a non-2xx answer is only a warning.
async fn set_type<S>(channel: &mut ControlChannel<S>, mode: TransferMode) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let reply = channel.execute(&Command::Type(mode)).await?;
    if !reply.is_success() {
        warn!("TYPE {} answered with {reply}", mode.type_code());
    }
    Ok(())
}

/// Closes the data channel, then reads the trailing reply.
async fn finish<S>(
    channel: &mut ControlChannel<S>,
    data: DataChannel,
    moved: Result<u64>,
) -> Result<(u64, Reply)>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    data.close().await;
    let reply = channel.read_reply().await?;
    let bytes = moved?;

    if !reply.is_success() {
        warn!("Transfer ended after {bytes} bytes without confirmation: {reply}");
        return Err(Error::TransferIncomplete {
            code: reply.code.as_u16(),
            message: reply.message_text(),
            bytes,
        });
    }
    Ok((bytes, reply))
}

/// Returns the final path component of a remote path.
fn base_name(remote_path: &str) -> Result<&str> {
    if remote_path.is_empty() {
        return Err(Error::InvalidArgument("remote path is empty".into()));
    }
    match remote_path.rsplit(['/', '\\']).next() {
        Some(name) if !name.is_empty() && name != "." && name != ".." => Ok(name),
        _ => Err(Error::InvalidArgument(format!(
            "no file name in remote path: {remote_path}"
        ))),
    }
}

/// Copies the data channel into `local_path` until EOF.
async fn drain_to_file(data: &mut DataChannel, mode: TransferMode, local_path: &Path) -> Result<u64> {
    let file = File::create(local_path).await?;
    let mut out = BufWriter::new(file);

    let bytes = match mode {
        TransferMode::Binary => tokio::io::copy(data.stream_mut(), &mut out).await?,
        TransferMode::Ascii => {
            let mut reader = BufReader::new(data.stream_mut());
            let mut line = Vec::new();
            let mut total = 0u64;
            loop {
                line.clear();
                let n = reader.read_until(b'\n', &mut line).await?;
                if n == 0 {
                    break;
                }
                total += n as u64;
                let had_eol = line.last() == Some(&b'\n');
                out.write_all(strip_eol(&line)).await?;
                if had_eol {
                    out.write_all(LOCAL_EOL).await?;
                }
            }
            total
        }
    };

    out.flush().await?;
    Ok(bytes)
}

/// Reads listing lines until EOF.
async fn read_lines(data: &mut DataChannel, lines: &mut Vec<String>) -> Result<u64> {
    let mut reader = BufReader::new(data.stream_mut());
    let mut line = Vec::new();
    let mut total = 0u64;
    loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line).await?;
        if n == 0 {
            return Ok(total);
        }
        total += n as u64;
        lines.push(String::from_utf8_lossy(strip_eol(&line)).into_owned());
    }
}

/// Writes a local file to the data channel.
///
/// Ascii mode sends every line terminator as CRLF.
async fn send_file(data: &mut DataChannel, mode: TransferMode, file: File) -> Result<u64> {
    let stream = data.stream_mut();
    let bytes = match mode {
        TransferMode::Binary => {
            let mut reader = BufReader::new(file);
            tokio::io::copy_buf(&mut reader, stream).await?
        }
        TransferMode::Ascii => {
            let mut reader = BufReader::new(file);
            let mut line = Vec::new();
            let mut total = 0u64;
            loop {
                line.clear();
                if reader.read_until(b'\n', &mut line).await? == 0 {
                    break;
                }
                let had_eol = line.last() == Some(&b'\n');
                let body = strip_eol(&line);
                stream.write_all(body).await?;
                total += body.len() as u64;
                if had_eol {
                    stream.write_all(b"\r\n").await?;
                    total += 2;
                }
            }
            total
        }
    };
    stream.flush().await?;
    Ok(bytes)
}

fn strip_eol(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("readme.txt").unwrap(), "readme.txt");
        assert_eq!(base_name("/pub/dist/file.tar.gz").unwrap(), "file.tar.gz");
        assert_eq!(base_name("pub\\file.bin").unwrap(), "file.bin");
    }

    #[test]
    fn test_base_name_rejects_unusable_paths() {
        assert!(matches!(base_name(""), Err(Error::InvalidArgument(_))));
        assert!(matches!(base_name("/pub/"), Err(Error::InvalidArgument(_))));
        assert!(matches!(base_name(".."), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_strip_eol() {
        assert_eq!(strip_eol(b"line\r\n"), b"line");
        assert_eq!(strip_eol(b"line\n"), b"line");
        assert_eq!(strip_eol(b"line"), b"line");
        assert_eq!(strip_eol(b"\r\n"), b"");
    }
}
