//! Command handlers module.
//!
//! Each handler turns one parsed command into a `CommandResult`. Handlers
//! that only touch session state are synchronous; the transfer handlers also
//! drive the control channel (for the `150` reply) and a data channel.

use log::{error, info, warn};
use tokio::fs::{File, OpenOptions};

use crate::error::handlers::{protocol_reply, transfer_reply};
use crate::error::{ProtocolError, SessionError, StorageError, TransferError};
use crate::navigate::change_directory;
use crate::protocol::responses;
use crate::protocol::{Command, CommandResult};
use crate::session::{Session, SessionState};
use crate::storage::{delete_file, list_target, resolve_path};
use crate::transfer::{
    DataChannel, PassiveListener, TransferType, handle_file_download, handle_file_upload,
};

/// Dispatches a received FTP command to its corresponding handler.
///
/// Only control channel failures are returned as errors; everything else is
/// folded into the reply.
pub async fn handle_command(
    session: &mut Session,
    command: Command,
) -> Result<CommandResult, SessionError> {
    let result = match command {
        Command::USER(arg) => handle_cmd_user(&mut session.state, arg),
        Command::PASS(arg) => handle_cmd_pass(&mut session.state, arg),
        Command::TYPE(arg) => handle_cmd_type(&mut session.state, arg),
        Command::PWD => handle_cmd_pwd(&session.state),
        Command::CWD(arg) => handle_cmd_cwd(&mut session.state, arg),
        Command::DELE(arg) => handle_cmd_dele(&session.state, arg),
        Command::PASV => handle_cmd_pasv(session).await,
        Command::LIST(arg) => handle_cmd_list(session, arg).await?,
        Command::RETR(arg) => handle_cmd_retr(session, arg).await?,
        Command::STOR(arg) => handle_cmd_stor(session, arg).await?,
        Command::NOOP => CommandResult::success(responses::NOOP_OK),
        Command::QUIT => CommandResult::close(responses::GOODBYE),
        Command::UNKNOWN(verb) => rejected(ProtocolError::Unrecognized(verb)),
    };
    Ok(result)
}

fn rejected(err: ProtocolError) -> CommandResult {
    CommandResult::failure(err.to_string(), protocol_reply(&err))
}

fn transfer_failed(err: TransferError) -> CommandResult {
    CommandResult::failure(err.to_string(), transfer_reply(&err))
}

/// Handles the USER command: records the username and asks for a password.
pub fn handle_cmd_user(state: &mut SessionState, arg: Option<String>) -> CommandResult {
    let Some(username) = arg else {
        return rejected(ProtocolError::Syntax("USER"));
    };

    info!("USER {} from {}", username, state.peer_addr());
    state.begin_login(username);
    CommandResult::success(responses::USER_OK)
}

/// Handles the PASS command. Any password is accepted once USER was given.
pub fn handle_cmd_pass(state: &mut SessionState, arg: Option<String>) -> CommandResult {
    let Some(password) = arg else {
        return rejected(ProtocolError::Syntax("PASS"));
    };

    if !state.complete_login(password) {
        return rejected(ProtocolError::BadSequence("PASS"));
    }

    info!(
        "User {} logged in from {}",
        state.username().unwrap_or_default(),
        state.peer_addr()
    );
    CommandResult::success(responses::LOGGED_IN)
}

/// Handles the TYPE command. Unsupported types are ignored without a reply.
pub fn handle_cmd_type(state: &mut SessionState, arg: Option<String>) -> CommandResult {
    match arg.as_deref().and_then(TransferType::from_type_arg) {
        Some(TransferType::Binary) => {
            state.set_transfer_type(TransferType::Binary);
            CommandResult::success(responses::BINARY_MODE)
        }
        Some(TransferType::Ascii) => {
            state.set_transfer_type(TransferType::Ascii);
            CommandResult::success(responses::ASCII_MODE)
        }
        None => {
            warn!(
                "Ignoring unsupported TYPE {:?} from {}",
                arg,
                state.peer_addr()
            );
            CommandResult::silent("unsupported transfer type")
        }
    }
}

pub fn handle_cmd_pwd(state: &SessionState) -> CommandResult {
    CommandResult::success(responses::working_directory(state.working_dir()))
}

/// Handles the CWD command. The working directory only changes on success.
pub fn handle_cmd_cwd(state: &mut SessionState, arg: Option<String>) -> CommandResult {
    let Some(target) = arg else {
        return rejected(ProtocolError::Syntax("CWD"));
    };

    match change_directory(state.working_dir(), &target) {
        Ok(new_dir) => {
            info!(
                "Client {} changed directory to {}",
                state.peer_addr(),
                new_dir.display()
            );
            state.set_working_dir(new_dir);
            CommandResult::success(responses::CWD_OK)
        }
        Err(e) => CommandResult::failure(e.to_string(), responses::CWD_NOT_FOUND),
    }
}

/// Handles the DELE command for logged-in clients.
pub fn handle_cmd_dele(state: &SessionState, arg: Option<String>) -> CommandResult {
    if !state.is_logged_in() {
        return rejected(ProtocolError::NotLoggedIn("DELE"));
    }
    let Some(name) = arg else {
        return rejected(ProtocolError::Syntax("DELE"));
    };

    let path = resolve_path(state.working_dir(), &name);
    match delete_file(&path) {
        Ok(()) => CommandResult::success(responses::FILE_DELETED),
        Err(StorageError::NotFound(path)) => {
            CommandResult::failure("file not found", responses::dele_not_found(&path))
        }
        Err(e) => {
            warn!("DELE {} failed for {}: {}", name, state.peer_addr(), e);
            CommandResult::failure(e.to_string(), responses::FILE_ACTION_NOT_TAKEN)
        }
    }
}

/// Whether PASV and RETR may run for this session.
fn reads_permitted(session: &Session) -> bool {
    session.state.is_logged_in() || session.config.allow_anonymous_reads
}

/// Handles the PASV command: opens a fresh listener and advertises it.
///
/// A listener left over from an earlier PASV is closed first.
pub async fn handle_cmd_pasv(session: &mut Session) -> CommandResult {
    if !reads_permitted(session) {
        return rejected(ProtocolError::NotLoggedIn("PASV"));
    }

    if let Some(previous) = session.passive.take() {
        info!(
            "Replacing passive listener {} for client {}",
            previous.local_addr(),
            session.state.peer_addr()
        );
    }

    match PassiveListener::bind(session.config.pasv_ip()).await {
        Ok(listener) => {
            let reply = responses::entering_passive_mode(listener.local_addr());
            info!(
                "Client {} entering passive mode on {}",
                session.state.peer_addr(),
                listener.local_addr()
            );
            session.passive = Some(listener);
            CommandResult::success(reply)
        }
        Err(e) => {
            error!("PASV failed for {}: {}", session.state.peer_addr(), e);
            transfer_failed(e)
        }
    }
}

/// Accepts the client's data connection on the advertised passive listener.
async fn accept_data_channel(session: &mut Session) -> Result<DataChannel, TransferError> {
    let listener = session
        .passive
        .take()
        .ok_or(TransferError::NoPassiveListener)?;
    listener
        .accept(
            session.state.peer_addr().ip(),
            session.config.data_accept_timeout(),
        )
        .await
}

/// Drops leading `ls`-style flags such as `-la`, which many clients send.
fn list_path_argument(arg: Option<&str>) -> Option<&str> {
    let mut rest = arg?.trim();
    while rest.starts_with('-') {
        rest = rest
            .split_once(char::is_whitespace)
            .map(|(_, tail)| tail.trim_start())
            .unwrap_or("");
    }
    (!rest.is_empty()).then_some(rest)
}

/// Handles the LIST command: sends one line per entry over the data channel.
pub async fn handle_cmd_list(
    session: &mut Session,
    arg: Option<String>,
) -> Result<CommandResult, SessionError> {
    if !session.state.is_logged_in() {
        return Ok(rejected(ProtocolError::NotLoggedIn("LIST")));
    }

    let target = match list_path_argument(arg.as_deref()) {
        Some(path) => resolve_path(session.state.working_dir(), path),
        None => session.state.working_dir().to_path_buf(),
    };

    let lines = match list_target(&target) {
        Ok(lines) => lines,
        Err(StorageError::NotFound(_)) => {
            return Ok(CommandResult::failure(
                "path not found",
                responses::LIST_NOT_FOUND,
            ));
        }
        Err(e) => {
            error!("LIST {} failed: {}", target.display(), e);
            return Ok(CommandResult::failure(
                e.to_string(),
                responses::FILE_ACTION_NOT_TAKEN,
            ));
        }
    };

    if session.passive.is_none() {
        return Ok(transfer_failed(TransferError::NoPassiveListener));
    }

    session.control.send(responses::LIST_START).await?;

    let mut channel = match accept_data_channel(session).await {
        Ok(channel) => channel,
        Err(e) => {
            warn!("LIST data connection failed: {}", e);
            return Ok(transfer_failed(e));
        }
    };

    let mut listing = String::new();
    for line in &lines {
        listing.push_str(line);
        listing.push_str("\r\n");
    }

    if let Err(e) = channel.write_all(listing.as_bytes()).await {
        warn!("LIST transfer to {} aborted: {}", channel.peer_addr(), e);
        return Ok(transfer_failed(e));
    }
    if let Err(e) = channel.close().await {
        return Ok(transfer_failed(e));
    }

    info!(
        "Client {} listed {} ({} entries)",
        session.state.peer_addr(),
        target.display(),
        lines.len()
    );
    Ok(CommandResult::success(responses::LIST_DONE))
}

/// Handles the RETR command: streams a file to the client.
pub async fn handle_cmd_retr(
    session: &mut Session,
    arg: Option<String>,
) -> Result<CommandResult, SessionError> {
    if !reads_permitted(session) {
        return Ok(rejected(ProtocolError::NotLoggedIn("RETR")));
    }
    let Some(name) = arg else {
        return Ok(rejected(ProtocolError::Syntax("RETR")));
    };

    let path = resolve_path(session.state.working_dir(), &name);
    info!("RETR {} for {}", path.display(), session.state.peer_addr());

    if !path.is_file() {
        return Ok(CommandResult::failure(
            "file not found",
            responses::RETR_NOT_FOUND,
        ));
    }

    let mut file = match File::open(&path).await {
        Ok(file) => file,
        Err(e) => {
            error!("RETR failed to open {}: {}", path.display(), e);
            return Ok(CommandResult::failure(
                e.to_string(),
                responses::RETR_CANNOT_OPEN,
            ));
        }
    };

    if session.passive.is_none() {
        return Ok(transfer_failed(TransferError::NoPassiveListener));
    }

    session.control.send(responses::OPENING_DATA).await?;

    let mut channel = match accept_data_channel(session).await {
        Ok(channel) => channel,
        Err(e) => {
            warn!("RETR data connection failed: {}", e);
            return Ok(transfer_failed(e));
        }
    };

    let mode = session.state.transfer_type().unwrap_or(TransferType::Ascii);
    let buffer_size = session.config.buffer_size;

    if let Err(e) = handle_file_download(&mut file, &mut channel, mode, buffer_size).await {
        warn!("RETR {} aborted: {}", path.display(), e);
        return Ok(transfer_failed(e));
    }
    drop(file);

    if let Err(e) = channel.close().await {
        return Ok(transfer_failed(e));
    }

    Ok(CommandResult::success(responses::RETR_DONE))
}

/// Handles the STOR command: writes the uploaded bytes to a file,
/// replacing any existing content.
pub async fn handle_cmd_stor(
    session: &mut Session,
    arg: Option<String>,
) -> Result<CommandResult, SessionError> {
    if !session.state.is_logged_in() {
        return Ok(CommandResult::failure(
            "not logged in",
            responses::STOR_NOT_LOGGED_IN,
        ));
    }
    let Some(name) = arg else {
        return Ok(rejected(ProtocolError::Syntax("STOR")));
    };

    let path = resolve_path(session.state.working_dir(), &name);
    info!("STOR {} for {}", path.display(), session.state.peer_addr());

    if session.passive.is_none() {
        return Ok(transfer_failed(TransferError::NoPassiveListener));
    }

    // Truncated only once the data connection is up.
    let mut file = match OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)
        .await
    {
        Ok(file) => file,
        Err(e) => {
            error!("STOR failed to create {}: {}", path.display(), e);
            return Ok(CommandResult::failure(
                e.to_string(),
                responses::STOR_CANNOT_CREATE,
            ));
        }
    };

    session.control.send(responses::OPENING_DATA).await?;

    let mut channel = match accept_data_channel(session).await {
        Ok(channel) => channel,
        Err(e) => {
            warn!("STOR data connection failed: {}", e);
            return Ok(transfer_failed(e));
        }
    };

    if let Err(e) = file.set_len(0).await {
        error!("STOR failed to truncate {}: {}", path.display(), e);
        return Ok(transfer_failed(TransferError::File(e)));
    }

    let mode = session.state.transfer_type().unwrap_or(TransferType::Ascii);
    let upload = handle_file_upload(
        &mut channel,
        &mut file,
        mode,
        session.config.buffer_size,
        session.config.data_idle_timeout(),
    )
    .await;

    if let Err(e) = upload {
        warn!("STOR {} aborted: {}", path.display(), e);
        return Ok(transfer_failed(e));
    }
    drop(file);

    if let Err(e) = channel.close().await {
        // The client may already have closed its end after sending.
        warn!("Closing STOR data connection failed: {}", e);
    }

    Ok(CommandResult::success(responses::STOR_DONE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::CommandStatus;
    use std::fs;
    use tempfile::TempDir;

    fn state_in(dir: &TempDir) -> SessionState {
        SessionState::new("127.0.0.1:40000".parse().unwrap(), dir.path())
    }

    fn reply(result: &CommandResult) -> &str {
        result.message.as_deref().unwrap_or("")
    }

    #[test]
    fn user_without_name_is_a_syntax_error() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        let result = handle_cmd_user(&mut state, None);
        assert_eq!(reply(&result), responses::SYNTAX_ERROR_ARGS);
        assert_eq!(state.username(), None);
    }

    #[test]
    fn pass_before_user_is_bad_sequence() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        for pw in ["secret", "x", "anything at all"] {
            let result = handle_cmd_pass(&mut state, Some(pw.into()));
            assert_eq!(reply(&result), "503 Bad sequence of commands.\r\n");
        }
        assert!(!state.is_logged_in());
    }

    #[test]
    fn user_then_pass_logs_in() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        assert_eq!(
            reply(&handle_cmd_user(&mut state, Some("alice".into()))),
            "331 User name okay, need password.\r\n"
        );
        let result = handle_cmd_pass(&mut state, Some("secret".into()));
        assert_eq!(reply(&result), "230 User logged in, proceed.\r\n");
        assert_eq!(result.status, CommandStatus::Success);
        assert!(state.is_logged_in());
    }

    #[test]
    fn unsupported_type_is_silent_and_keeps_mode() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        handle_cmd_type(&mut state, Some("I".into()));
        let result = handle_cmd_type(&mut state, Some("E".into()));
        assert_eq!(result.message, None);
        assert_eq!(state.transfer_type(), Some(TransferType::Binary));

        assert_eq!(
            reply(&handle_cmd_type(&mut state, Some("A".into()))),
            "200 Ascii mode.\r\n"
        );
        assert_eq!(state.transfer_type(), Some(TransferType::Ascii));
    }

    #[test]
    fn pwd_is_stable_and_cwd_failure_keeps_directory() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        let first = handle_cmd_pwd(&state);
        assert_eq!(first, handle_cmd_pwd(&state));

        let result = handle_cmd_cwd(&mut state, Some("does-not-exist".into()));
        assert_eq!(reply(&result), "550 CWD failed Directory not exists.\r\n");
        assert_eq!(state.working_dir(), dir.path());
        assert_eq!(handle_cmd_pwd(&state), first);
    }

    #[test]
    fn cwd_into_subdirectory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("pub")).unwrap();
        let mut state = state_in(&dir);

        let result = handle_cmd_cwd(&mut state, Some("pub".into()));
        assert_eq!(reply(&result), "250 CWD Command successful.\r\n");
        assert_eq!(state.working_dir(), dir.path().join("pub"));
    }

    #[test]
    fn dele_requires_login_and_leaves_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("keep.txt");
        fs::write(&file, b"data").unwrap();
        let state = state_in(&dir);

        let result = handle_cmd_dele(&state, Some("keep.txt".into()));
        assert_eq!(reply(&result), "530 User not logged in.\r\n");
        assert!(file.exists());
    }

    #[test]
    fn dele_reports_missing_path_and_deletes_existing() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        state.begin_login("alice".into());
        state.complete_login("secret".into());

        let missing = dir.path().join("ghost.txt");
        assert_eq!(
            reply(&handle_cmd_dele(&state, Some("ghost.txt".into()))),
            format!("550 DELE failed File {} not exists.\r\n", missing.display())
        );

        let file = dir.path().join("old.txt");
        fs::write(&file, b"data").unwrap();
        assert_eq!(
            reply(&handle_cmd_dele(&state, Some("old.txt".into()))),
            "250 File deleted.\r\n"
        );
        assert!(!file.exists());

        fs::create_dir(dir.path().join("subdir")).unwrap();
        assert_eq!(
            reply(&handle_cmd_dele(&state, Some("subdir".into()))),
            responses::FILE_ACTION_NOT_TAKEN
        );
    }

    #[test]
    fn list_flags_are_stripped() {
        assert_eq!(list_path_argument(None), None);
        assert_eq!(list_path_argument(Some("-la")), None);
        assert_eq!(list_path_argument(Some("-l -a pub")), Some("pub"));
        assert_eq!(list_path_argument(Some("pub/docs")), Some("pub/docs"));
    }
}
