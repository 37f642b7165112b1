//! TCP Serve Loop
//!
//! Each accepted connection runs on its own task and processes frames
//! serially: read one frame, decode the request batch, dispatch it (requests
//! within the batch run in parallel), write the response frame, repeat. The
//! response frame for batch N is always written before the read of batch N+1
//! begins; the client relies on this ordering.
//!
//! Any frame-level error ends the connection. Accept-loop errors are logged
//! and the loop continues.

use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};

use wirecall_common::codec::Codec;
use wirecall_common::protocol::{Result, WirecallError, PARSE_ERROR};
use wirecall_common::transport::frame;

use crate::dispatch::dispatch;
use crate::registry::Registry;

pub(crate) async fn serve(listener: TcpListener, codec: Arc<Codec>, registry: Arc<Registry>) {
    loop {
        let (stream, peer_addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                tracing::error!("failed to accept connection: {err}");
                continue;
            }
        };

        tracing::debug!(%peer_addr, "connection established");

        let codec = Arc::clone(&codec);
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            match handle_connection(stream, codec, registry).await {
                Ok(()) => tracing::debug!(%peer_addr, "connection closed by peer"),
                Err(err) => tracing::warn!(%peer_addr, "connection error: {err}"),
            }
        });
    }
}

/// Handles a single connection until the peer closes or a frame fails.
async fn handle_connection(
    mut stream: TcpStream,
    codec: Arc<Codec>,
    registry: Arc<Registry>,
) -> Result<()> {
    loop {
        let body = match frame::read_frame(&mut stream).await {
            Ok(body) => body,
            // clean close between frames
            Err(WirecallError::Io(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        let responses = match codec.read_request(&body) {
            Ok(batch) => {
                dispatch(Arc::clone(&codec), Arc::clone(&registry), batch.requests).await
            }
            Err(err) => {
                tracing::warn!("could not parse request: {err}");
                vec![codec.err_response(PARSE_ERROR, err.to_string())]
            }
        };

        let out = codec.encode_responses(&responses)?;
        frame::write_frame(&mut stream, &out).await?;
    }
}
