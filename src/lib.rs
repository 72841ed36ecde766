pub mod error;
pub mod navigate;
pub mod protocol;
pub mod server;
pub mod session;
pub mod storage;
pub mod transfer;

pub use error::FtpServerError;
pub use server::{ConfigOverrides, Server, ServerConfig};
pub use session::Session;
