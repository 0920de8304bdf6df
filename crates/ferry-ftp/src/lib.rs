//! # ferry-ftp
//!
//! An FTP client library covering the control-channel reply protocol and
//! passive-mode data transfers (RFC 959).
//!
//! ## Features
//!
//! - **Reply parsing**: single and multi-line `NNN text` / `NNN-text` replies
//! - **Half-duplex control channel**: one outstanding command at a time,
//!   enforced at runtime
//! - **Passive mode**: `PASV` negotiation with a fresh endpoint per transfer
//! - **Transfers**: `RETR`, `LIST` and `STOR` in ascii or binary mode
//!
//! ## Quick Start
//!
//! ```ignore
//! use ferry_ftp::{Config, Session};
//!
//! #[tokio::main]
//! async fn main() -> ferry_ftp::Result<()> {
//!     let config = Config::builder("ftp.example.com").port(21).build();
//!     let (mut session, _greeting) = Session::connect(&config).await?;
//!
//!     session.login("anonymous", "guest@example.com").await?;
//!     for line in session.list().await? {
//!         println!("{line}");
//!     }
//!
//!     let outcome = session.download("readme.txt").await?;
//!     println!("{} bytes", outcome.bytes);
//!
//!     session.quit().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Transfer sequence
//!
//! ```text
//! TYPE ─→ PASV ─→ connect data ─→ RETR ─→ 150 ─→ read to EOF ─→ close data ─→ 226
//! ```
//!
//! ## Modules
//!
//! - [`command`]: FTP command builders
//! - [`connection`]: Control channel, passive negotiation and transfers
//! - [`parser`]: Reply and PASV parser
//! - [`session`]: Client session and command dispatch
//! - [`types`]: Core FTP types (replies, endpoints, modes)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod session;
pub mod types;

pub use connection::{
    Config, ConfigBuilder, ControlChannel, DataChannel, PassiveNegotiator, TransferEngine,
    TransferOutcome,
};
pub use error::{Error, Result};
pub use session::Session;
pub use types::{DataMode, Direction, Endpoint, Reply, ReplyCode, TransferMode};
