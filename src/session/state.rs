//! Module `state`
//!
//! Defines `SessionState`, the protocol state of one control connection:
//! login progress, working directory and transfer type.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::transfer::TransferType;

/// Per-connection protocol state, fully initialised at construction.
#[derive(Debug, Clone)]
pub struct SessionState {
    peer_addr: SocketAddr,
    username: Option<String>,
    password: Option<String>,
    working_dir: PathBuf,
    is_logged_in: bool,
    transfer_type: Option<TransferType>,
}

impl SessionState {
    pub fn new(peer_addr: SocketAddr, home_dir: impl Into<PathBuf>) -> Self {
        Self {
            peer_addr,
            username: None,
            password: None,
            working_dir: home_dir.into(),
            is_logged_in: false,
            transfer_type: None,
        }
    }

    // --------------------
    // Getter methods
    // --------------------

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Returns whether the client completed USER followed by PASS.
    pub fn is_logged_in(&self) -> bool {
        self.is_logged_in
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Transfer type chosen by TYPE, `None` until the first valid TYPE.
    pub fn transfer_type(&self) -> Option<TransferType> {
        self.transfer_type
    }

    // --------------------
    // State transitions
    // --------------------

    /// Records a USER. Any earlier login is discarded.
    pub fn begin_login(&mut self, username: String) {
        self.username = Some(username);
        self.password = None;
        self.is_logged_in = false;
    }

    /// Records a PASS and logs in. Returns `false`, leaving the state
    /// untouched, when no USER came first.
    pub fn complete_login(&mut self, password: String) -> bool {
        if self.username.as_deref().is_none_or(str::is_empty) {
            return false;
        }
        self.password = Some(password);
        self.is_logged_in = true;
        true
    }

    pub fn set_working_dir(&mut self, path: PathBuf) {
        self.working_dir = path;
    }

    pub fn set_transfer_type(&mut self, transfer_type: TransferType) {
        self.transfer_type = Some(transfer_type);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> SessionState {
        SessionState::new("127.0.0.1:40000".parse().unwrap(), "/srv/ftp")
    }

    #[test]
    fn starts_logged_out_in_home() {
        let s = state();
        assert!(!s.is_logged_in());
        assert_eq!(s.username(), None);
        assert_eq!(s.working_dir(), Path::new("/srv/ftp"));
        assert_eq!(s.transfer_type(), None);
    }

    #[test]
    fn pass_without_user_is_rejected() {
        let mut s = state();
        assert!(!s.complete_login("secret".into()));
        assert!(!s.is_logged_in());
        assert_eq!(s.password(), None);
    }

    #[test]
    fn user_then_pass_logs_in_and_new_user_logs_out() {
        let mut s = state();
        s.begin_login("alice".into());
        assert!(s.complete_login("secret".into()));
        assert!(s.is_logged_in());
        assert_eq!(s.username(), Some("alice"));
        assert_eq!(s.password(), Some("secret"));

        s.begin_login("bob".into());
        assert!(!s.is_logged_in());
        assert_eq!(s.password(), None);
    }
}
