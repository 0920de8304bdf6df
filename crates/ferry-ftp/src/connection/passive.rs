//! Passive-mode data connection negotiation.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use super::ControlChannel;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::parse_pasv_reply;
use crate::types::{Direction, Endpoint};

/// An open data connection for one transfer.
///
/// Consumed by [`DataChannel::close`], so it is closed at most once; dropping
/// it without calling `close` also releases the socket.
#[derive(Debug)]
pub struct DataChannel {
    stream: TcpStream,
    direction: Direction,
    endpoint: Endpoint,
}

impl DataChannel {
    /// Returns the transfer direction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the endpoint this channel is connected to.
    #[must_use]
    pub const fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// Returns the underlying socket for reading or writing payload.
    pub const fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// Shuts the socket down and releases it.
    ///
    /// For uploads the shutdown is the end-of-file signal to the server.
    pub async fn close(mut self) {
        if let Err(err) = self.stream.shutdown().await {
            debug!("Data channel shutdown to {}: {err}", self.endpoint);
        }
    }
}

/// Issues `PASV` and opens the announced data connection.
#[derive(Debug, Clone, Copy)]
pub struct PassiveNegotiator {
    connect_timeout: Duration,
}

impl PassiveNegotiator {
    /// Creates a negotiator with the given data-connect timeout.
    #[must_use]
    pub const fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    /// Negotiates a fresh endpoint and connects to it.
    ///
    /// Must be called once per transfer; servers accept exactly one
    /// connection per `PASV`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedPasvReply`] if the reply is not a usable
    /// 227, and [`Error::DataConnect`] if the endpoint cannot be reached.
    pub async fn negotiate<S>(
        &self,
        channel: &mut ControlChannel<S>,
        direction: Direction,
    ) -> Result<DataChannel>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let reply = channel.execute(&Command::Pasv).await?;
        let endpoint = parse_pasv_reply(&reply)?;
        debug!("Opening data connection to {endpoint}");

        let stream = self.connect(endpoint).await?;
        Ok(DataChannel {
            stream,
            direction,
            endpoint,
        })
    }

    async fn connect(&self, endpoint: Endpoint) -> Result<TcpStream> {
        let connect = TcpStream::connect(endpoint.socket_addr());
        match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(source)) => Err(Error::DataConnect { endpoint, source }),
            Err(_) => Err(Error::DataConnect {
                endpoint,
                source: io::Error::new(io::ErrorKind::TimedOut, "data connect timed out"),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tokio_test::io::Builder;

    const TIMEOUT: Duration = Duration::from_secs(5);

    async fn greeted(mock: tokio_test::io::Mock) -> ControlChannel<tokio_test::io::Mock> {
        let mut channel = ControlChannel::new(mock, TIMEOUT);
        channel.read_greeting().await.unwrap();
        channel
    }

    #[tokio::test]
    async fn test_negotiate_connects_to_announced_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let reply = format!(
            "227 Entering Passive Mode (127,0,0,1,{},{}).\r\n",
            port / 256,
            port % 256
        );

        let mock = Builder::new()
            .read(b"220 Ready\r\n")
            .write(b"PASV\r\n")
            .read(reply.as_bytes())
            .build();
        let mut channel = greeted(mock).await;

        let negotiator = PassiveNegotiator::new(TIMEOUT);
        let data = negotiator
            .negotiate(&mut channel, Direction::Download)
            .await
            .unwrap();
        assert_eq!(data.endpoint().port, port);
        assert_eq!(data.direction(), Direction::Download);

        let (mut accepted, _) = listener.accept().await.unwrap();
        data.close().await;
        let mut buf = Vec::new();
        assert_eq!(accepted.read_to_end(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_negotiate_malformed_reply() {
        let mock = Builder::new()
            .read(b"220 Ready\r\n")
            .write(b"PASV\r\n")
            .read(b"227 Entering Passive Mode\r\n")
            .build();
        let mut channel = greeted(mock).await;

        let err = PassiveNegotiator::new(TIMEOUT)
            .negotiate(&mut channel, Direction::Download)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedPasvReply(_)));
        assert!(!channel.is_pending());
    }

    #[tokio::test]
    async fn test_negotiate_refused_pasv() {
        let mock = Builder::new()
            .read(b"220 Ready\r\n")
            .write(b"PASV\r\n")
            .read(b"530 Please login with USER and PASS\r\n")
            .build();
        let mut channel = greeted(mock).await;

        let err = PassiveNegotiator::new(TIMEOUT)
            .negotiate(&mut channel, Direction::Download)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedPasvReply(_)));
    }

    #[tokio::test]
    async fn test_negotiate_unreachable_endpoint() {
        // Bind then drop to obtain a port with no listener.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let reply = format!(
            "227 Entering Passive Mode (127,0,0,1,{},{})\r\n",
            port / 256,
            port % 256
        );
        let mock = Builder::new()
            .read(b"220 Ready\r\n")
            .write(b"PASV\r\n")
            .read(reply.as_bytes())
            .build();
        let mut channel = greeted(mock).await;

        let err = PassiveNegotiator::new(TIMEOUT)
            .negotiate(&mut channel, Direction::Download)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DataConnect { .. }));
        assert!(err.is_transfer_scoped());
    }
}
