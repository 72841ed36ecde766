use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;

use crate::error::SessionError;
use crate::protocol::responses;
use crate::protocol::{CommandStatus, handle_command, parse_command};
use crate::server::config::ServerConfig;
use crate::session::control::{ControlChannel, ControlLine};
use crate::session::state::SessionState;
use crate::transfer::PassiveListener;

/// One client's control connection and everything it owns.
///
/// A session lives in its own task; nothing in here is shared with other
/// sessions, so no locking is needed.
pub struct Session {
    pub(crate) control: ControlChannel,
    pub(crate) state: SessionState,
    pub(crate) passive: Option<PassiveListener>,
    pub(crate) config: Arc<ServerConfig>,
}

impl Session {
    pub fn new(stream: TcpStream, peer_addr: SocketAddr, config: Arc<ServerConfig>) -> Self {
        Self {
            control: ControlChannel::new(stream, peer_addr),
            state: SessionState::new(peer_addr, config.home_dir.clone()),
            passive: None,
            config,
        }
    }

    /// Greets the client and serves commands until QUIT, disconnect,
    /// idle timeout or a control channel failure.
    pub async fn run(mut self) {
        let peer_addr = self.state.peer_addr();
        info!("New session from {}", peer_addr);

        if let Err(e) = self.control.send(responses::WELCOME).await {
            warn!("Failed to greet {}: {}", peer_addr, e);
            return;
        }

        if let Err(e) = self.serve().await {
            match e {
                SessionError::IdleTimeout(idle) => {
                    info!("Client {} idle for {:?}, closing", peer_addr, idle);
                    let _ = self.control.send(responses::IDLE_TIMEOUT).await;
                }
                SessionError::Control(e) => {
                    error!("Control connection to {} failed: {}", peer_addr, e);
                }
            }
        }

        self.control.shutdown().await;
        info!("Client {} disconnected", peer_addr);
    }

    async fn serve(&mut self) -> Result<(), SessionError> {
        let idle = self.config.idle_timeout();

        loop {
            let line = match self.control.read_line(idle).await? {
                ControlLine::Command(line) => line,
                ControlLine::TooLong => {
                    warn!("Command line too long from {}", self.state.peer_addr());
                    self.control.send(responses::UNRECOGNIZED).await?;
                    continue;
                }
                ControlLine::Closed => {
                    info!("Connection closed by client {}", self.state.peer_addr());
                    return Ok(());
                }
            };

            let command = parse_command(&line);
            info!("Received from {}: {}", self.state.peer_addr(), command);

            let result = handle_command(self, command).await?;

            if let Some(reply) = &result.message {
                self.control.send(reply).await?;
            }

            match result.status {
                CommandStatus::CloseConnection => {
                    info!("Client {} requested to quit", self.state.peer_addr());
                    return Ok(());
                }
                CommandStatus::Failure(reason) => {
                    debug!("Command from {} failed: {}", self.state.peer_addr(), reason);
                }
                CommandStatus::Success => {}
            }
        }
    }
}
