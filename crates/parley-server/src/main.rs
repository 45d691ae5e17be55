//! parley-server: the Parley messaging daemon.
//!
//! Single OS process running a Tokio async runtime. Clients speak the
//! framed binary protocol over TLS; see `parley-proto`.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use parley_crypto::cipher::MessageCipher;
use parley_server::config::ServerConfig;
use parley_server::state::ServerState;
use parley_server::{dispatch, tls};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("parley=info".parse()?),
        )
        .init();

    info!("Parley server starting");

    // 1. Load config
    let config = ServerConfig::load()?;
    info!(port = config.port, db = %config.db_path, "configuration loaded");

    // 2. Back up yesterday's database, then open and ensure the schema
    let db_path = Path::new(&config.db_path);
    parley_db::backup(db_path)?;
    let db = parley_db::open(db_path)
        .with_context(|| format!("cannot open database at {}", config.db_path))?;

    // 3. Seed the at-rest message key
    if config.db_encryption_key.is_empty() {
        warn!("db_encryption_key is empty; messages will be sealed under a key derived from an empty passphrase");
    }
    let cipher = MessageCipher::from_passphrase(&config.db_encryption_key);

    // 4. TLS
    let acceptor = tls::load_acceptor(
        Path::new(&config.server_cert_path),
        Path::new(&config.server_key_path),
    )?;
    info!("TLS context initialized");

    // 5. Bind and serve
    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("cannot bind port {}", config.port))?;
    info!(port = config.port, "secure server running");

    let state = Arc::new(ServerState::new(db, cipher));

    tokio::select! {
        result = dispatch::serve(listener, acceptor, state) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
            Ok(())
        }
    }
}
