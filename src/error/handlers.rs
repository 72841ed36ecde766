//! Error handlers
//!
//! Maps errors onto FTP reply codes and reply lines.

use crate::error::types::{FtpServerError, ProtocolError, StorageError, TransferError};
use crate::protocol::responses;
use log::error;

/// Handle an FTP server error
pub fn handle_error(err: &FtpServerError) {
    error!("FTP Server Error [{}]: {}", error_to_ftp_code(err), err);
}

/// Convert error to FTP response code
pub fn error_to_ftp_code(err: &FtpServerError) -> u16 {
    match err {
        FtpServerError::Protocol(e) => protocol_code(e),
        FtpServerError::Storage(StorageError::NotFound(_))
        | FtpServerError::Storage(StorageError::NotADirectory(_)) => 550,
        FtpServerError::Storage(StorageError::Io { .. }) => 450,
        FtpServerError::Transfer(TransferError::NoPassiveListener)
        | FtpServerError::Transfer(TransferError::BindFailed { .. })
        | FtpServerError::Transfer(TransferError::UnsupportedAddress)
        | FtpServerError::Transfer(TransferError::AcceptTimeout(_)) => 425,
        FtpServerError::Transfer(TransferError::Connection(_)) => 426,
        FtpServerError::Transfer(TransferError::File(_)) => 451,
        FtpServerError::Session(_) | FtpServerError::Network(_) => 421,
        FtpServerError::Config(_) => 451,
    }
}

fn protocol_code(err: &ProtocolError) -> u16 {
    match err {
        ProtocolError::Syntax(_) => 501,
        ProtocolError::BadSequence(_) => 503,
        ProtocolError::NotLoggedIn(_) => 530,
        ProtocolError::Unrecognized(_) => 500,
    }
}

/// Reply line for a recoverable protocol error.
pub fn protocol_reply(err: &ProtocolError) -> &'static str {
    match err {
        ProtocolError::Syntax(_) => responses::SYNTAX_ERROR_ARGS,
        ProtocolError::BadSequence(_) => responses::BAD_SEQUENCE,
        ProtocolError::NotLoggedIn(_) => responses::NOT_LOGGED_IN,
        ProtocolError::Unrecognized(_) => responses::UNRECOGNIZED,
    }
}

/// Reply line for a data channel failure.
pub fn transfer_reply(err: &TransferError) -> &'static str {
    match err {
        TransferError::NoPassiveListener => responses::USE_PASV_FIRST,
        TransferError::BindFailed { .. }
        | TransferError::UnsupportedAddress
        | TransferError::AcceptTimeout(_) => responses::CANT_OPEN_DATA,
        TransferError::Connection(_) => responses::TRANSFER_ABORTED,
        TransferError::File(_) => responses::LOCAL_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::time::Duration;

    #[test]
    fn protocol_errors_map_to_reply_codes() {
        let cases = [
            (ProtocolError::Syntax("USER"), 501),
            (ProtocolError::BadSequence("PASS"), 503),
            (ProtocolError::NotLoggedIn("LIST"), 530),
            (ProtocolError::Unrecognized("XYZZ".into()), 500),
        ];
        for (err, code) in cases {
            let reply = protocol_reply(&err);
            assert!(reply.starts_with(&code.to_string()), "{reply}");
            assert_eq!(error_to_ftp_code(&FtpServerError::from(err)), code);
        }
    }

    #[test]
    fn transfer_errors_keep_session_codes() {
        let timeout = TransferError::AcceptTimeout(Duration::from_secs(1));
        assert!(transfer_reply(&timeout).starts_with("425"));

        let reset = TransferError::Connection(io::Error::from(io::ErrorKind::ConnectionReset));
        assert!(transfer_reply(&reset).starts_with("426"));
        assert_eq!(error_to_ftp_code(&FtpServerError::from(reset)), 426);
    }

    #[test]
    fn startup_errors_have_codes() {
        let config = FtpServerError::from(config::ConfigError::Message("bad".into()));
        assert_eq!(error_to_ftp_code(&config), 451);

        let bind = FtpServerError::Network(io::Error::from(io::ErrorKind::AddrInUse));
        assert_eq!(error_to_ftp_code(&bind), 421);

        let missing = FtpServerError::from(StorageError::NotFound("/srv/none".into()));
        assert_eq!(error_to_ftp_code(&missing), 550);
    }
}
