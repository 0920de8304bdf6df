//! FTP connection management.
//!
//! - [`ControlChannel`]: the persistent command/reply connection
//! - [`PassiveNegotiator`]: `PASV` and the per-transfer [`DataChannel`]
//! - [`TransferEngine`]: RETR, LIST and STOR sequencing

mod config;
mod control;
mod framed;
mod passive;
mod transfer;

pub use config::{Config, ConfigBuilder, DEFAULT_PORT};
pub use control::ControlChannel;
pub use framed::ControlStream;
pub use passive::{DataChannel, PassiveNegotiator};
pub use transfer::{TransferEngine, TransferOutcome};
