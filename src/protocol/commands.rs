//! Module `commands`
//!
//! Defines the closed set of FTP commands understood by a session, along with
//! the status and result types returned by command handlers.

use std::fmt;

/// Represents an FTP command parsed from a control channel line.
///
/// Every verb carries its trailing argument as an `Option`, so a handler can
/// decide for itself whether a missing argument is a syntax error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    USER(Option<String>), // Username for login
    PASS(Option<String>), // Password for login
    TYPE(Option<String>), // Transfer type, `A` or `I`
    PWD,
    CWD(Option<String>),  // Change working directory
    DELE(Option<String>), // Delete file
    PASV,                 // Enter passive mode
    LIST(Option<String>), // Directory listing over the data channel
    RETR(Option<String>), // Retrieve/download file
    STOR(Option<String>), // Store/upload file
    NOOP,
    QUIT,
    UNKNOWN(String), // Unrecognized verb, kept for logging
}

impl Command {
    /// Builds a command from an already split verb and argument.
    pub fn from_parts(verb: &str, arg: Option<String>) -> Self {
        match verb {
            "USER" => Command::USER(arg),
            "PASS" => Command::PASS(arg),
            "TYPE" => Command::TYPE(arg),
            "PWD" => Command::PWD,
            "CWD" => Command::CWD(arg),
            "DELE" => Command::DELE(arg),
            "PASV" => Command::PASV,
            "LIST" => Command::LIST(arg),
            "RETR" => Command::RETR(arg),
            "STOR" => Command::STOR(arg),
            "NOOP" => Command::NOOP,
            "QUIT" => Command::QUIT,
            other => Command::UNKNOWN(other.to_string()),
        }
    }

    /// The verb as it appears on the wire.
    pub fn verb(&self) -> &str {
        match self {
            Command::USER(_) => "USER",
            Command::PASS(_) => "PASS",
            Command::TYPE(_) => "TYPE",
            Command::PWD => "PWD",
            Command::CWD(_) => "CWD",
            Command::DELE(_) => "DELE",
            Command::PASV => "PASV",
            Command::LIST(_) => "LIST",
            Command::RETR(_) => "RETR",
            Command::STOR(_) => "STOR",
            Command::NOOP => "NOOP",
            Command::QUIT => "QUIT",
            Command::UNKNOWN(verb) => verb,
        }
    }
}

/// Log-friendly rendering. Passwords are masked.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arg = match self {
            Command::PASS(Some(_)) => Some("****"),
            Command::USER(arg)
            | Command::PASS(arg)
            | Command::TYPE(arg)
            | Command::CWD(arg)
            | Command::DELE(arg)
            | Command::LIST(arg)
            | Command::RETR(arg)
            | Command::STOR(arg) => arg.as_deref(),
            _ => None,
        };
        match arg {
            Some(arg) => write!(f, "{} {}", self.verb(), arg),
            None => f.write_str(self.verb()),
        }
    }
}

/// Represents the outcome status of executing a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Struct encapsulating the full result of a command execution.
///
/// `message` is the final reply line. It is `None` when the protocol defines
/// no reply for the outcome (for instance an unsupported `TYPE` argument).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub message: Option<String>,
}

impl CommandResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Success,
            message: Some(message.into()),
        }
    }

    pub fn failure(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Failure(reason.into()),
            message: Some(message.into()),
        }
    }

    pub fn silent(reason: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Failure(reason.into()),
            message: None,
        }
    }

    pub fn close(message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::CloseConnection,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_masks_passwords() {
        assert_eq!(Command::PASS(Some("hunter2".into())).to_string(), "PASS ****");
        assert_eq!(Command::RETR(Some("a.bin".into())).to_string(), "RETR a.bin");
        assert_eq!(Command::PWD.to_string(), "PWD");
    }

    #[test]
    fn verb_round_trips_through_from_parts() {
        for verb in ["USER", "PASS", "TYPE", "PWD", "CWD", "DELE", "PASV", "LIST", "RETR", "STOR", "NOOP", "QUIT"] {
            assert_eq!(Command::from_parts(verb, None).verb(), verb);
        }
        assert_eq!(Command::from_parts("SITE", None), Command::UNKNOWN("SITE".into()));
    }
}
