//! Module `data_channel`
//!
//! Passive-mode listeners and the short-lived data connections accepted on
//! them. A listener is advertised by `PASV` and consumed by exactly one
//! transfer command; the accepted connection lives only for that transfer.

use log::{debug, info, warn};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{Instant, timeout, timeout_at};

use crate::error::TransferError;

/// Listener opened by `PASV`, waiting for the client's data connection.
#[derive(Debug)]
pub struct PassiveListener {
    listener: TcpListener,
    local_addr: SocketAddrV4,
}

impl PassiveListener {
    /// Binds an ephemeral port on `ip` and reads back the bound address.
    pub async fn bind(ip: Ipv4Addr) -> Result<Self, TransferError> {
        let listener = TcpListener::bind((ip, 0))
            .await
            .map_err(|source| TransferError::BindFailed {
                addr: ip.to_string(),
                source,
            })?;

        let local_addr = match listener.local_addr() {
            Ok(SocketAddr::V4(addr)) => addr,
            Ok(SocketAddr::V6(_)) => return Err(TransferError::UnsupportedAddress),
            Err(source) => {
                return Err(TransferError::BindFailed {
                    addr: ip.to_string(),
                    source,
                });
            }
        };

        debug!("Passive listener bound to {}", local_addr);
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Address advertised in the `227` reply.
    pub fn local_addr(&self) -> SocketAddrV4 {
        self.local_addr
    }

    /// Accepts the data connection, consuming the listener.
    ///
    /// Connections from an IP other than `owner_ip` are dropped and the wait
    /// continues until `wait` has elapsed.
    pub async fn accept(self, owner_ip: IpAddr, wait: Duration) -> Result<DataChannel, TransferError> {
        let deadline = Instant::now() + wait;

        loop {
            let (stream, peer_addr) = match timeout_at(deadline, self.listener.accept()).await {
                Ok(Ok(accepted)) => accepted,
                Ok(Err(e)) => return Err(TransferError::Connection(e)),
                Err(_) => return Err(TransferError::AcceptTimeout(wait)),
            };

            if !same_host(peer_addr.ip(), owner_ip) {
                warn!(
                    "Rejected data connection from {} on {} (expected {})",
                    peer_addr, self.local_addr, owner_ip
                );
                continue;
            }

            info!(
                "Data connection accepted from {} on {}",
                peer_addr, self.local_addr
            );
            return Ok(DataChannel { stream, peer_addr });
        }
    }
}

/// Compares IPs, treating IPv4-mapped IPv6 addresses as their IPv4 form.
fn same_host(a: IpAddr, b: IpAddr) -> bool {
    let canonical = |ip: IpAddr| match ip {
        IpAddr::V6(v6) => v6
            .to_ipv4_mapped()
            .map(IpAddr::V4)
            .unwrap_or(IpAddr::V6(v6)),
        v4 => v4,
    };
    canonical(a) == canonical(b)
}

/// An accepted data connection, owned by a single transfer.
#[derive(Debug)]
pub struct DataChannel {
    stream: TcpStream,
    peer_addr: SocketAddr,
}

impl DataChannel {
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub async fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransferError> {
        self.stream
            .write_all(bytes)
            .await
            .map_err(TransferError::Connection)
    }

    /// Reads the next chunk. Returns `Ok(0)` at end of stream, and also when
    /// nothing arrives within `idle`.
    pub async fn read_chunk(&mut self, buf: &mut [u8], idle: Duration) -> Result<usize, TransferError> {
        match timeout(idle, self.stream.read(buf)).await {
            Ok(Ok(n)) => Ok(n),
            Ok(Err(e)) => Err(TransferError::Connection(e)),
            Err(_) => {
                warn!(
                    "Data connection from {} idle for {:?}, ending transfer",
                    self.peer_addr, idle
                );
                Ok(0)
            }
        }
    }

    /// Flushes and shuts down the write side, then drops the socket.
    pub async fn close(mut self) -> Result<(), TransferError> {
        self.stream.flush().await.map_err(TransferError::Connection)?;
        self.stream
            .shutdown()
            .await
            .map_err(TransferError::Connection)?;
        debug!("Data connection to {} closed", self.peer_addr);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bound_port_matches_advertised_port() {
        let listener = PassiveListener::bind(Ipv4Addr::LOCALHOST).await.unwrap();
        let addr = listener.local_addr();
        assert_eq!(*addr.ip(), Ipv4Addr::LOCALHOST);
        assert_ne!(addr.port(), 0);

        let client = tokio::spawn(async move { TcpStream::connect(addr).await.unwrap() });
        let channel = listener
            .accept(IpAddr::V4(Ipv4Addr::LOCALHOST), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(channel.peer_addr().ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        client.await.unwrap();
    }

    #[tokio::test]
    async fn accept_times_out_without_a_client() {
        let listener = PassiveListener::bind(Ipv4Addr::LOCALHOST).await.unwrap();
        let err = listener
            .accept(IpAddr::V4(Ipv4Addr::LOCALHOST), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::AcceptTimeout(_)));
    }

    #[test]
    fn mapped_ipv6_matches_ipv4() {
        let v4 = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let mapped = IpAddr::V6(Ipv4Addr::LOCALHOST.to_ipv6_mapped());
        assert!(same_host(v4, mapped));
        assert!(!same_host(v4, IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))));
    }
}
