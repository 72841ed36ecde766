//! Control channel I/O
//!
//! Line-oriented reads with an idle bound, and CRLF reply writes.

use log::debug;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

use crate::error::SessionError;

/// Longest command line accepted, terminator included.
pub const MAX_COMMAND_LENGTH: usize = 512;

/// One line read from the control channel.
#[derive(Debug, PartialEq, Eq)]
pub enum ControlLine {
    Command(String),
    TooLong,
    Closed,
}

pub struct ControlChannel {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    peer_addr: SocketAddr,
    buf: Vec<u8>,
}

impl ControlChannel {
    pub fn new(stream: TcpStream, peer_addr: SocketAddr) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            peer_addr,
            buf: Vec::with_capacity(MAX_COMMAND_LENGTH),
        }
    }

    /// Waits for the next newline-terminated line.
    ///
    /// At most `MAX_COMMAND_LENGTH` bytes are buffered; the rest of an
    /// overlong line is drained and reported as `TooLong`. Invalid UTF-8 is
    /// replaced rather than rejected. A line without a terminator before EOF
    /// is still returned as a command.
    pub async fn read_line(&mut self, idle: Duration) -> Result<ControlLine, SessionError> {
        match timeout(idle, self.read_bounded_line()).await {
            Ok(result) => result,
            Err(_) => Err(SessionError::IdleTimeout(idle)),
        }
    }

    async fn read_bounded_line(&mut self) -> Result<ControlLine, SessionError> {
        self.buf.clear();
        let limit = MAX_COMMAND_LENGTH as u64 + 1;
        let n = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut self.buf)
            .await?;

        if n == 0 {
            return Ok(ControlLine::Closed);
        }
        if n > MAX_COMMAND_LENGTH {
            if self.buf.last() != Some(&b'\n') {
                self.discard_line().await?;
            }
            return Ok(ControlLine::TooLong);
        }

        let line = String::from_utf8_lossy(&self.buf).into_owned();
        Ok(ControlLine::Command(line))
    }

    /// Skips input up to and including the next `\n`, one buffer at a time.
    async fn discard_line(&mut self) -> Result<(), SessionError> {
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(());
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(end) => {
                    self.reader.consume(end + 1);
                    return Ok(());
                }
                None => {
                    let len = available.len();
                    self.reader.consume(len);
                }
            }
        }
    }

    /// Writes one reply and flushes it.
    pub async fn send(&mut self, reply: &str) -> Result<(), SessionError> {
        debug!("Sending to {}: {}", self.peer_addr, reply.trim_end());
        self.writer.write_all(reply.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Shuts down the write side, ignoring a peer that already left.
    pub async fn shutdown(&mut self) {
        let _ = self.writer.shutdown().await;
    }
}
