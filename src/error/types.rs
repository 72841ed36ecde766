//! Error types
//!
//! Defines domain-specific error types for each layer of the FTP session.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Command-level protocol errors, always recovered into a reply.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("missing or invalid argument for {0}")]
    Syntax(&'static str),

    #[error("{0} received out of sequence")]
    BadSequence(&'static str),

    #[error("{0} requires an authenticated session")]
    NotLoggedIn(&'static str),

    #[error("unrecognized command verb: {0}")]
    Unrecognized(String),
}

/// Filesystem errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Data channel errors. These abort only the transfer in progress.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("no passive listener has been advertised")]
    NoPassiveListener,

    #[error("failed to bind passive listener on {addr}: {source}")]
    BindFailed {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("passive listener is bound to a non-IPv4 address")]
    UnsupportedAddress,

    #[error("no data connection within {0:?}")]
    AcceptTimeout(Duration),

    #[error("data connection failed: {0}")]
    Connection(#[source] io::Error),

    #[error("file I/O failed during transfer: {0}")]
    File(#[source] io::Error),
}

/// Control channel errors. These end the session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("control channel I/O failure: {0}")]
    Control(#[from] io::Error),

    #[error("control channel idle for {0:?}")]
    IdleTimeout(Duration),
}

/// General FTP server error that encompasses all error types
#[derive(Debug, Error)]
pub enum FtpServerError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("network error: {0}")]
    Network(#[from] io::Error),
}
