//! Passive-mode data endpoint.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// Address a server announced in its PASV reply.
///
/// Single-use: each transfer negotiates its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// Four-octet host address.
    pub host: Ipv4Addr,
    /// TCP port.
    pub port: u16,
}

impl Endpoint {
    /// Creates a new endpoint.
    #[must_use]
    pub const fn new(host: Ipv4Addr, port: u16) -> Self {
        Self { host, port }
    }

    /// Builds an endpoint from the six PASV fields `h1,h2,h3,h4,p1,p2`.
    #[must_use]
    pub fn from_pasv_fields(fields: [u8; 6]) -> Self {
        let [h1, h2, h3, h4, p1, p2] = fields;
        Self {
            host: Ipv4Addr::new(h1, h2, h3, h4),
            port: u16::from(p1) * 256 + u16::from(p2),
        }
    }

    /// Returns the socket address to dial.
    #[must_use]
    pub const fn socket_addr(self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.host, self.port))
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_pasv_fields() {
        let ep = Endpoint::from_pasv_fields([127, 0, 0, 1, 200, 10]);
        assert_eq!(ep.host, Ipv4Addr::LOCALHOST);
        assert_eq!(ep.port, 51210);
        assert_eq!(ep.to_string(), "127.0.0.1:51210");
    }

    #[test]
    fn port_bounds() {
        assert_eq!(Endpoint::from_pasv_fields([0, 0, 0, 0, 0, 0]).port, 0);
        assert_eq!(Endpoint::from_pasv_fields([0, 0, 0, 0, 255, 255]).port, 65535);
    }
}
