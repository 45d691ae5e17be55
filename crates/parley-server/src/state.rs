//! Server-wide shared state.

use parley_crypto::cipher::MessageCipher;
use tokio::sync::Mutex;

use crate::registry::Registry;

/// Everything the handlers share, constructed once in the bootstrap and
/// threaded through by `Arc`.
///
/// The store sits behind a single async mutex, so handlers see no
/// concurrent mutation. Lock order is `db` before `registry`; neither
/// is ever held across a send on a connection queue that could block
/// (the queues are unbounded).
pub struct ServerState {
    /// Database connection.
    pub db: Mutex<rusqlite::Connection>,
    /// At-rest message key, derived once from the configured passphrase.
    pub cipher: MessageCipher,
    /// Online-connection registry.
    pub registry: Mutex<Registry>,
}

impl ServerState {
    pub fn new(db: rusqlite::Connection, cipher: MessageCipher) -> Self {
        Self {
            db: Mutex::new(db),
            cipher,
            registry: Mutex::new(Registry::new()),
        }
    }
}
