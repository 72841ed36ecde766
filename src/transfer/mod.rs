//! Transfer module for FTP server
//!
//! Handles passive data channels, file transfers and transfer types.

pub mod data_channel;
pub mod file_ops;
pub mod modes;

pub use data_channel::{DataChannel, PassiveListener};
pub use file_ops::{handle_file_download, handle_file_upload};
pub use modes::TransferType;
