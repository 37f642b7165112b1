//! Frame Codec
//!
//! Frames are the unit of transmission on TCP:
//!
//! ```text
//! [4-byte body length, u32 big-endian] [body]
//! ```
//!
//! The protocol defines no upper bound on body length; this implementation
//! caps it at [`MAX_FRAME_SIZE`] to bound memory. Zero-length frames are
//! disallowed in both directions.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::{Result, WirecallError};

/// Maximum frame body size (64 MiB).
pub const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// Writes one frame: a 4-byte big-endian length prefix followed by `body`,
/// then flushes.
pub async fn write_frame<W>(stream: &mut W, body: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if body.is_empty() {
        return Err(WirecallError::Transport("refusing to write empty frame".into()));
    }
    if body.len() > MAX_FRAME_SIZE {
        return Err(WirecallError::Transport(format!(
            "frame too large: {} bytes (max {} bytes)",
            body.len(),
            MAX_FRAME_SIZE
        )));
    }

    let len = body.len() as u32;
    stream
        .write_all(&len.to_be_bytes())
        .await
        .map_err(|e| map_io_error(e, "writing length prefix"))?;
    stream
        .write_all(body)
        .await
        .map_err(|e| map_io_error(e, "writing body"))?;
    stream
        .flush()
        .await
        .map_err(|e| map_io_error(e, "flushing stream"))?;

    Ok(())
}

/// Reads one frame body.
///
/// Fails on a zero or oversized declared length, on short read, and on any
/// underlying I/O error.
pub async fn read_frame<R>(stream: &mut R) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    stream
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| map_io_error(e, "reading length prefix"))?;

    let len = u32::from_be_bytes(len_buf) as usize;
    if len == 0 {
        return Err(WirecallError::Transport("zero-length frame".into()));
    }
    if len > MAX_FRAME_SIZE {
        return Err(WirecallError::Transport(format!(
            "frame too large: {len} bytes (max {MAX_FRAME_SIZE} bytes)"
        )));
    }

    let mut body = vec![0u8; len];
    stream
        .read_exact(&mut body)
        .await
        .map_err(|e| map_io_error(e, "reading body"))?;

    Ok(body)
}

/// Map IO errors to the transport taxonomy.
///
/// Connection-shaped errors become `Connection`; everything else stays `Io`
/// (notably `UnexpectedEof`, which the server treats as a clean peer close
/// when it lands on a frame boundary).
fn map_io_error(err: std::io::Error, context: &str) -> WirecallError {
    match err.kind() {
        std::io::ErrorKind::ConnectionReset
        | std::io::ErrorKind::ConnectionAborted
        | std::io::ErrorKind::NotConnected => {
            WirecallError::Connection(format!("{context}: connection lost"))
        }
        _ => WirecallError::Io(err),
    }
}
