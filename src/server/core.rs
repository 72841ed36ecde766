use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::error::FtpServerError;
use crate::server::config::ServerConfig;
use crate::session::Session;

pub struct Server {
    listener: TcpListener,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Binds the control listener described by `config`.
    pub async fn bind(config: ServerConfig) -> Result<Self, FtpServerError> {
        let socket = config.control_socket();
        let listener = TcpListener::bind(&socket).await.map_err(|e| {
            error!("Failed to bind to {}: {}", socket, e);
            FtpServerError::Network(e)
        })?;

        info!("Server bound to {}", socket);
        info!("Serving files from {}", config.home_dir.display());

        Ok(Self {
            listener,
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, FtpServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts clients forever, one task per session.
    pub async fn start(&self) {
        info!(
            "Starting FTP server (passive address {})",
            self.config.pasv_address
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let session = Session::new(stream, addr, Arc::clone(&self.config));
                    // Spawn a task for each client so accept loop doesn't block
                    tokio::spawn(session.run());
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}
