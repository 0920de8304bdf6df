//! Core FTP types.

mod endpoint;
mod mode;
mod reply;

pub use endpoint::Endpoint;
pub use mode::{DataMode, Direction, TransferMode};
pub use reply::{Reply, ReplyCode};
