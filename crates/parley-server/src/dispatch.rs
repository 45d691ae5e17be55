//! Connection lifecycle and packet dispatch.
//!
//! The accept loop performs the TLS handshake inline, then splits each
//! connection into a read task (this module's loop) and a writer task
//! draining the connection's outbound queue. The read loop decodes one
//! frame at a time into a typed [`ClientMessage`] and hands it to the
//! domain handlers; transport and protocol failures tear the connection
//! down.

use std::sync::Arc;

use parley_proto::frame;
use parley_proto::message::{ClientMessage, ServerMessage};
use tokio::io::{AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_rustls::server::TlsStream;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, error, info, warn};

use crate::handlers;
use crate::registry::ConnId;
use crate::state::ServerState;

/// Accept connections until the listener fails fatally.
pub async fn serve(
    listener: TcpListener,
    acceptor: TlsAcceptor,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let acceptor = acceptor.clone();
                let state = state.clone();
                tokio::spawn(async move {
                    handle_connection(stream, addr, acceptor, state).await;
                });
            }
            Err(e) => {
                error!("accept error: {e}");
            }
        }
    }
}

/// Run one connection from TLS handshake to teardown.
async fn handle_connection(
    stream: TcpStream,
    addr: std::net::SocketAddr,
    acceptor: TlsAcceptor,
    state: Arc<ServerState>,
) {
    let _ = stream.set_nodelay(true);

    let tls = match acceptor.accept(stream).await {
        Ok(tls) => tls,
        Err(e) => {
            warn!(%addr, "TLS handshake failed: {e}");
            return;
        }
    };

    let (read_half, write_half) = tokio::io::split(tls);
    let (tx, rx) = mpsc::unbounded_channel();

    let conn_id = state.registry.lock().await.register(tx);
    info!(conn_id, %addr, "new secure connection");

    let writer = tokio::spawn(write_loop(write_half, rx));

    let result = read_loop(read_half, conn_id, &state).await;

    // Deregistering drops the queue sender, which lets the writer task
    // drain outstanding packets and close the TLS stream.
    let departed = state.registry.lock().await.deregister(conn_id);
    match departed {
        Some(client) if client.uid > 0 => {
            info!(conn_id, user = %client.username, "user disconnected");
        }
        _ => debug!(conn_id, "connection closed before login"),
    }

    match result {
        Ok(()) => {}
        Err(parley_proto::ProtoError::Io(e))
            if e.kind() == std::io::ErrorKind::UnexpectedEof =>
        {
            debug!(conn_id, "peer closed the connection");
        }
        Err(e) => warn!(conn_id, "connection torn down: {e}"),
    }

    let _ = writer.await;
}

/// Drain the outbound queue onto the socket, serializing all writes for
/// this connection.
async fn write_loop(
    mut writer: WriteHalf<TlsStream<TcpStream>>,
    mut rx: mpsc::UnboundedReceiver<ServerMessage>,
) {
    while let Some(msg) = rx.recv().await {
        let (msg_type, payload) = msg.encode();
        if let Err(e) = frame::write_frame(&mut writer, msg_type, &payload).await {
            debug!("write failed, dropping connection queue: {e}");
            break;
        }
    }
    let _ = writer.shutdown().await;
}

/// Read and dispatch frames until the peer goes away or violates the
/// protocol.
async fn read_loop(
    mut reader: ReadHalf<TlsStream<TcpStream>>,
    conn_id: ConnId,
    state: &Arc<ServerState>,
) -> parley_proto::Result<()> {
    loop {
        let (msg_type, payload) = frame::read_frame(&mut reader).await?;

        let msg = ClientMessage::decode(msg_type, &payload)?;

        let authenticated = state.registry.lock().await.uid_of(conn_id) > 0;
        if !authenticated && !msg.allowed_before_auth() {
            debug!(conn_id, msg_type, "dropping packet from unauthenticated connection");
            continue;
        }

        if let Err(e) = handlers::dispatch(state, conn_id, msg).await {
            // A handler failure (e.g. a database error) is logged and the
            // connection lives on; only transport errors are fatal here.
            error!(conn_id, "handler error: {e:#}");
        }
    }
}
