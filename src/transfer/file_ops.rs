//! Module `file_ops`
//!
//! Moves file contents between disk and an accepted data channel in
//! fixed-size chunks, applying the ASCII line-ending conversion when asked.

use log::{error, info};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::TransferError;
use crate::transfer::data_channel::DataChannel;
use crate::transfer::modes::{AsciiDecoder, AsciiEncoder, TransferType};

/// Streams `file` to the client until end of file.
///
/// Returns the number of bytes read from disk.
pub async fn handle_file_download(
    file: &mut File,
    channel: &mut DataChannel,
    mode: TransferType,
    buffer_size: usize,
) -> Result<u64, TransferError> {
    let mut buffer = vec![0u8; buffer_size];
    let mut encoded = Vec::new();
    let mut encoder = AsciiEncoder::default();
    let mut total_bytes_sent = 0u64;

    loop {
        let n = file.read(&mut buffer).await.map_err(|e| {
            error!("Read error while sending to {}: {}", channel.peer_addr(), e);
            TransferError::File(e)
        })?;
        if n == 0 {
            break;
        }

        match mode {
            TransferType::Binary => channel.write_all(&buffer[..n]).await?,
            TransferType::Ascii => {
                encoder.encode(&buffer[..n], &mut encoded);
                channel.write_all(&encoded).await?;
            }
        }
        total_bytes_sent += n as u64;
    }

    info!(
        "Sent {} bytes to {} ({:?})",
        total_bytes_sent,
        channel.peer_addr(),
        mode
    );
    Ok(total_bytes_sent)
}

/// Writes everything the client sends into `file`.
///
/// The upload ends when the client closes the data connection or stays
/// silent for `idle`. Returns the number of bytes written to disk.
pub async fn handle_file_upload(
    channel: &mut DataChannel,
    file: &mut File,
    mode: TransferType,
    buffer_size: usize,
    idle: Duration,
) -> Result<u64, TransferError> {
    let mut buffer = vec![0u8; buffer_size];
    let mut decoded = Vec::new();
    let mut decoder = AsciiDecoder::default();
    let mut total_bytes_written = 0u64;

    loop {
        let n = channel.read_chunk(&mut buffer, idle).await?;
        if n == 0 {
            break;
        }

        let chunk = match mode {
            TransferType::Binary => &buffer[..n],
            TransferType::Ascii => {
                decoder.decode(&buffer[..n], &mut decoded);
                &decoded[..]
            }
        };
        write_chunk(file, chunk).await?;
        total_bytes_written += chunk.len() as u64;
    }

    if mode == TransferType::Ascii {
        decoder.finish(&mut decoded);
        write_chunk(file, &decoded).await?;
        total_bytes_written += decoded.len() as u64;
    }

    file.flush().await.map_err(TransferError::File)?;

    info!(
        "Received {} bytes from {} ({:?})",
        total_bytes_written,
        channel.peer_addr(),
        mode
    );
    Ok(total_bytes_written)
}

async fn write_chunk(file: &mut File, chunk: &[u8]) -> Result<(), TransferError> {
    if chunk.is_empty() {
        return Ok(());
    }
    file.write_all(chunk).await.map_err(|e| {
        error!("Failed to write upload chunk: {}", e);
        TransferError::File(e)
    })
}
