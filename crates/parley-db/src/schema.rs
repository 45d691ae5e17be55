//! SQL schema definitions.

/// Complete schema for the Parley database.
///
/// `contacts` stores friendships as directed rows; both directions are
/// always inserted together, so symmetry is an invariant of the write
/// path. `requests` holds at most one pending row per ordered
/// (sender, receiver) pair via its primary key.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    uid INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT UNIQUE NOT NULL,
    email TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    friend_code TEXT UNIQUE NOT NULL
);

CREATE TABLE IF NOT EXISTS contacts (
    user_id INTEGER NOT NULL,
    contact_id INTEGER NOT NULL,
    PRIMARY KEY (user_id, contact_id)
);

CREATE TABLE IF NOT EXISTS requests (
    sender_id INTEGER NOT NULL,
    receiver_id INTEGER NOT NULL,
    PRIMARY KEY (sender_id, receiver_id)
);

CREATE TABLE IF NOT EXISTS conversations (
    conv_id INTEGER PRIMARY KEY AUTOINCREMENT,
    type INTEGER NOT NULL DEFAULT 0,
    name TEXT,
    description TEXT
);

CREATE TABLE IF NOT EXISTS participants (
    conv_id INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    role INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (conv_id, user_id)
);

CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    conv_id INTEGER NOT NULL,
    sender_id INTEGER NOT NULL,
    text TEXT NOT NULL,
    timestamp INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_messages_conv ON messages(conv_id, timestamp);
CREATE INDEX IF NOT EXISTS idx_participants_user ON participants(user_id);
"#;
