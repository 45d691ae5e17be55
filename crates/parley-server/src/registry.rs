//! Online-connection registry.
//!
//! Maps connection ids to the authenticated identity and outbound queue
//! of each live connection. Connection ids are process-local and
//! monotone; a uid may be logged in on several connections at once, in
//! which case the notifier routes to the most recently registered one.

use std::collections::HashMap;

use parley_proto::message::ServerMessage;
use tokio::sync::mpsc;

/// Process-local identifier of one accepted connection.
pub type ConnId = u64;

/// One live connection.
pub struct ClientHandle {
    pub conn_id: ConnId,
    /// Authenticated uid; 0 until a successful login.
    pub uid: u32,
    /// Cached username, updated on login and profile change.
    pub username: String,
    /// Set by a successful login, cleared only by disconnect.
    pub is_online: bool,
    sender: mpsc::UnboundedSender<ServerMessage>,
}

impl ClientHandle {
    /// Enqueue a packet on this connection's outbound queue.
    ///
    /// A send to a connection whose writer has already gone away is
    /// dropped silently; the read side will notice the close and
    /// deregister.
    pub fn send(&self, msg: ServerMessage) {
        if self.sender.send(msg).is_err() {
            tracing::debug!(conn_id = self.conn_id, "dropping packet for closed connection");
        }
    }
}

/// Registry of all live connections, keyed by connection id.
#[derive(Default)]
pub struct Registry {
    next_id: ConnId,
    clients: HashMap<ConnId, ClientHandle>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh unauthenticated connection, returning its id.
    pub fn register(&mut self, sender: mpsc::UnboundedSender<ServerMessage>) -> ConnId {
        self.next_id += 1;
        let conn_id = self.next_id;
        self.clients.insert(
            conn_id,
            ClientHandle {
                conn_id,
                uid: 0,
                username: String::new(),
                is_online: false,
                sender,
            },
        );
        conn_id
    }

    /// Remove a connection, returning its handle for final logging.
    pub fn deregister(&mut self, conn_id: ConnId) -> Option<ClientHandle> {
        self.clients.remove(&conn_id)
    }

    pub fn get(&self, conn_id: ConnId) -> Option<&ClientHandle> {
        self.clients.get(&conn_id)
    }

    /// Bind a connection to an authenticated user.
    pub fn bind(&mut self, conn_id: ConnId, uid: u32, username: String) {
        if let Some(client) = self.clients.get_mut(&conn_id) {
            client.uid = uid;
            client.username = username;
            client.is_online = true;
        }
    }

    /// Refresh the cached username after a profile update.
    pub fn set_username(&mut self, conn_id: ConnId, username: String) {
        if let Some(client) = self.clients.get_mut(&conn_id) {
            client.username = username;
        }
    }

    /// The authenticated uid of a connection, 0 if unauthenticated or
    /// gone.
    pub fn uid_of(&self, conn_id: ConnId) -> u32 {
        self.clients.get(&conn_id).map_or(0, |c| c.uid)
    }

    /// The online connection bound to `uid`, if any.
    ///
    /// With multiple logins for one uid, the most recently registered
    /// connection wins.
    pub fn online_by_uid(&self, uid: u32) -> Option<&ClientHandle> {
        self.clients
            .values()
            .filter(|c| c.is_online && c.uid == uid)
            .max_by_key(|c| c.conn_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (
        mpsc::UnboundedSender<ServerMessage>,
        mpsc::UnboundedReceiver<ServerMessage>,
    ) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn test_register_starts_unauthenticated() {
        let mut reg = Registry::new();
        let (tx, _rx) = channel();
        let id = reg.register(tx);

        let client = reg.get(id).expect("registered");
        assert_eq!(client.uid, 0);
        assert!(!client.is_online);
        assert_eq!(reg.uid_of(id), 0);
    }

    #[test]
    fn test_bind_marks_online() {
        let mut reg = Registry::new();
        let (tx, _rx) = channel();
        let id = reg.register(tx);

        reg.bind(id, 7, "alice".into());
        let client = reg.get(id).expect("registered");
        assert_eq!(client.uid, 7);
        assert_eq!(client.username, "alice");
        assert!(client.is_online);
        assert_eq!(reg.online_by_uid(7).expect("online").conn_id, id);
    }

    #[test]
    fn test_most_recent_connection_wins() {
        let mut reg = Registry::new();
        let (tx1, _rx1) = channel();
        let (tx2, _rx2) = channel();
        let first = reg.register(tx1);
        let second = reg.register(tx2);
        reg.bind(first, 7, "alice".into());
        reg.bind(second, 7, "alice".into());

        assert_eq!(reg.online_by_uid(7).expect("online").conn_id, second);

        // When the newer one disconnects, routing falls back to the older.
        reg.deregister(second);
        assert_eq!(reg.online_by_uid(7).expect("online").conn_id, first);
    }

    #[test]
    fn test_offline_uid_not_routed() {
        let mut reg = Registry::new();
        let (tx, _rx) = channel();
        reg.register(tx);
        assert!(reg.online_by_uid(7).is_none());
    }

    #[test]
    fn test_deregister_removes() {
        let mut reg = Registry::new();
        let (tx, _rx) = channel();
        let id = reg.register(tx);
        reg.bind(id, 3, "bob".into());

        let gone = reg.deregister(id).expect("was present");
        assert_eq!(gone.username, "bob");
        assert!(reg.get(id).is_none());
        assert!(reg.online_by_uid(3).is_none());
    }

    #[test]
    fn test_send_delivers_to_queue() {
        let mut reg = Registry::new();
        let (tx, mut rx) = channel();
        let id = reg.register(tx);

        reg.get(id)
            .expect("registered")
            .send(ServerMessage::RegisterSuccess);
        assert_eq!(
            rx.try_recv().expect("queued"),
            ServerMessage::RegisterSuccess
        );
    }
}
