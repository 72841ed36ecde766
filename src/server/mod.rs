//! Server core functionality
//!
//! The control listener and its configuration.

pub mod config;
pub mod core;

pub use config::{ConfigOverrides, ServerConfig};
pub use core::Server;
