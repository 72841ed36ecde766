//! FTP reply lines
//!
//! Every reply sent on the control channel is CRLF terminated.

use std::net::SocketAddrV4;
use std::path::Path;

pub const WELCOME: &str = "220 Welcome.\r\n";
pub const GOODBYE: &str = "221 Goodbye.\r\n";
pub const IDLE_TIMEOUT: &str = "421 Idle timeout, closing control connection.\r\n";

pub const USER_OK: &str = "331 User name okay, need password.\r\n";
pub const LOGGED_IN: &str = "230 User logged in, proceed.\r\n";
pub const NOT_LOGGED_IN: &str = "530 User not logged in.\r\n";
pub const STOR_NOT_LOGGED_IN: &str = "530 STOR failed User not logged in.\r\n";

pub const BINARY_MODE: &str = "200 Binary mode.\r\n";
pub const ASCII_MODE: &str = "200 Ascii mode.\r\n";
pub const NOOP_OK: &str = "200 NOOP ok.\r\n";

pub const CWD_OK: &str = "250 CWD Command successful.\r\n";
pub const CWD_NOT_FOUND: &str = "550 CWD failed Directory not exists.\r\n";
pub const FILE_DELETED: &str = "250 File deleted.\r\n";
pub const FILE_ACTION_NOT_TAKEN: &str = "450 Requested file action not taken.\r\n";

pub const LIST_START: &str = "150 Here is listing.\r\n";
pub const LIST_DONE: &str = "226 List done.\r\n";
pub const LIST_NOT_FOUND: &str = "550 LIST failed Path name not exists.\r\n";

pub const OPENING_DATA: &str = "150 Opening data connection.\r\n";
pub const RETR_DONE: &str = "226 Transfer complete.\r\n";
pub const RETR_NOT_FOUND: &str = "550 RETR failed File not exists.\r\n";
pub const RETR_CANNOT_OPEN: &str = "550 RETR failed Cannot open file.\r\n";
pub const STOR_DONE: &str = "226 Transfer completed.\r\n";
pub const STOR_CANNOT_CREATE: &str = "550 STOR failed Cannot create file.\r\n";

pub const USE_PASV_FIRST: &str = "425 Use PASV first.\r\n";
pub const CANT_OPEN_DATA: &str = "425 Can't open data connection.\r\n";
pub const TRANSFER_ABORTED: &str = "426 Connection closed; transfer aborted.\r\n";
pub const LOCAL_ERROR: &str = "451 Requested action aborted. Local error in processing.\r\n";

pub const UNRECOGNIZED: &str = "500 Syntax error, command unrecognized. \
     This may include errors such as command line too long.\r\n";
pub const SYNTAX_ERROR_ARGS: &str = "501 Syntax error in parameters or arguments.\r\n";
pub const BAD_SEQUENCE: &str = "503 Bad sequence of commands.\r\n";

/// `257` reply carrying the working directory.
pub fn working_directory(path: &Path) -> String {
    format!("257 \"{}\".\r\n", path.display())
}

/// `550` reply for a `DELE` on a missing path.
pub fn dele_not_found(path: &Path) -> String {
    format!("550 DELE failed File {} not exists.\r\n", path.display())
}

/// `227` reply advertising a passive listener.
pub fn entering_passive_mode(addr: SocketAddrV4) -> String {
    let [h1, h2, h3, h4] = addr.ip().octets();
    let port = addr.port();
    format!(
        "227 Entering Passive Mode ({},{},{},{},{},{}).\r\n",
        h1,
        h2,
        h3,
        h4,
        port >> 8,
        port & 0xFF
    )
}

/// Decodes the `(h1,h2,h3,h4,p1,p2)` tuple of a `227` reply.
pub fn parse_passive_reply(reply: &str) -> Option<SocketAddrV4> {
    let start = reply.find('(')? + 1;
    let end = start + reply[start..].find(')')?;
    let fields = reply[start..end]
        .split(',')
        .map(|f| f.trim().parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()
        .ok()?;
    if fields.len() != 6 {
        return None;
    }
    let port = (fields[4] as u16) << 8 | fields[5] as u16;
    Some(SocketAddrV4::new(
        [fields[0], fields[1], fields[2], fields[3]].into(),
        port,
    ))
}
