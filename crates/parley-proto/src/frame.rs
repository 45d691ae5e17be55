//! Framed packet I/O over any async byte stream.
//!
//! A frame is an 8-byte header (`type` and `payload_len`, both
//! big-endian u32) followed by exactly `payload_len` payload bytes.
//! Reads use read-exact semantics: a short read is an error, never a
//! partial frame. The functions are generic over `AsyncRead`/`AsyncWrite`
//! so the same code drives server connections, test clients, and
//! in-memory loopback pipes.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{ProtoError, Result};

/// Size of the frame header in bytes.
pub const HEADER_LEN: usize = 8;

/// Receive ceiling for a single payload. A frame advertising more is a
/// protocol violation and fatal to the connection.
pub const MAX_PAYLOAD_LEN: usize = 64 * 1024;

/// Once a header has arrived, the rest of the frame must follow within
/// this window; a peer stalled mid-frame is torn down rather than
/// allowed to wedge the connection.
pub const PAYLOAD_READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Read one complete frame, returning `(type, payload)`.
///
/// Blocks until a header arrives (an idle peer may sit quietly for any
/// length of time), then applies [`PAYLOAD_READ_TIMEOUT`] to the payload
/// portion.
///
/// # Errors
///
/// Returns [`ProtoError::Io`] on socket failure or EOF,
/// [`ProtoError::PayloadTooLarge`] if the advertised length exceeds the
/// ceiling, and [`ProtoError::Timeout`] if the payload stalls.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<(u32, Vec<u8>)> {
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header).await?;

    let mut word = [0u8; 4];
    word.copy_from_slice(&header[..4]);
    let msg_type = u32::from_be_bytes(word);
    word.copy_from_slice(&header[4..]);
    let payload_len = u32::from_be_bytes(word) as usize;

    if payload_len > MAX_PAYLOAD_LEN {
        return Err(ProtoError::PayloadTooLarge(payload_len));
    }

    let mut payload = vec![0u8; payload_len];
    if payload_len > 0 {
        tokio::time::timeout(PAYLOAD_READ_TIMEOUT, reader.read_exact(&mut payload))
            .await
            .map_err(|_| ProtoError::Timeout)??;
    }

    Ok((msg_type, payload))
}

/// Write one complete frame.
///
/// The header and payload are flushed together so a frame is never left
/// half-written in the stream buffer.
///
/// # Errors
///
/// Returns [`ProtoError::Io`] on socket failure and
/// [`ProtoError::PayloadTooLarge`] if the payload exceeds the ceiling.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    msg_type: u32,
    payload: &[u8],
) -> Result<()> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(ProtoError::PayloadTooLarge(payload.len()));
    }

    let mut header = [0u8; HEADER_LEN];
    header[..4].copy_from_slice(&msg_type.to_be_bytes());
    header[4..].copy_from_slice(&(payload.len() as u32).to_be_bytes());

    writer.write_all(&header).await?;
    if !payload.is_empty() {
        writer.write_all(payload).await?;
    }
    writer.flush().await?;
    Ok(())
}
