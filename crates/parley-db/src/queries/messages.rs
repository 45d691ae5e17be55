//! Message persistence and history rendering.
//!
//! Bodies are encrypted before they reach the `messages` table and only
//! decrypted while rendering history. A row that fails to decrypt
//! renders as a fixed placeholder line; one corrupt row must never take
//! the whole history down with it.

use chrono::TimeZone;
use parley_crypto::cipher::MessageCipher;
use rusqlite::Connection;

use crate::Result;

/// Rendered in place of a message body that fails to decrypt.
pub const UNREADABLE_PLACEHOLDER: &str = "[Unreadable Encrypted Message]";

/// History returns at most this many messages, the most recent ones.
pub const HISTORY_WINDOW: usize = 50;

/// Encrypt and append a message with the current wall-clock timestamp.
pub fn log(
    conn: &Connection,
    cipher: &MessageCipher,
    conv_id: u32,
    sender_uid: u32,
    text: &str,
) -> Result<()> {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    log_at(conn, cipher, conv_id, sender_uid, text, now)
}

/// Encrypt and append a message with an explicit timestamp.
pub fn log_at(
    conn: &Connection,
    cipher: &MessageCipher,
    conv_id: u32,
    sender_uid: u32,
    text: &str,
    timestamp: i64,
) -> Result<()> {
    let sealed = cipher.seal(text)?;
    conn.execute(
        "INSERT INTO messages (conv_id, sender_id, text, timestamp) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![conv_id, sender_uid, sealed, timestamp],
    )?;
    Ok(())
}

/// Render the last [`HISTORY_WINDOW`] messages of a conversation,
/// oldest first, one line per message:
///
/// ```text
/// [HH:MM] <username>: <text>\n
/// ```
///
/// Times are local to the server. An empty conversation renders as an
/// empty string.
pub fn history(conn: &Connection, cipher: &MessageCipher, conv_id: u32) -> Result<String> {
    let mut stmt = conn.prepare(
        "SELECT username, text, timestamp FROM (
             SELECT u.username AS username, m.text AS text,
                    m.timestamp AS timestamp, m.id AS id
             FROM messages m
             JOIN users u ON m.sender_id = u.uid
             WHERE m.conv_id = ?1
             ORDER BY m.timestamp DESC, m.id DESC
             LIMIT ?2
         ) ORDER BY timestamp ASC, id ASC",
    )?;

    let rows: Vec<(String, String, i64)> = stmt
        .query_map(
            rusqlite::params![conv_id, HISTORY_WINDOW as i64],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?
        .collect::<std::result::Result<_, _>>()?;

    let mut out = String::new();
    for (username, sealed, timestamp) in rows {
        let text = cipher
            .open(&sealed)
            .unwrap_or_else(|_| UNREADABLE_PLACEHOLDER.to_string());
        let clock = chrono::Local
            .timestamp_opt(timestamp, 0)
            .single()
            .map(|dt| dt.format("%H:%M").to_string())
            .unwrap_or_else(|| "00:00".to_string());
        out.push_str(&format!("[{clock}] {username}: {text}\n"));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{conversations, users};

    fn test_db() -> (Connection, MessageCipher) {
        let mut conn = crate::open_memory().expect("open test db");
        users::register(&conn, "a@x", "alice", "pw").expect("alice");
        users::register(&conn, "b@x", "bob", "pw").expect("bob");
        conversations::create(
            &mut conn,
            conversations::TYPE_GROUP,
            "team",
            "",
            &[1, 2],
        )
        .expect("conv");
        (conn, MessageCipher::from_passphrase("test key"))
    }

    #[test]
    fn test_messages_stored_encrypted() {
        let (conn, cipher) = test_db();
        log_at(&conn, &cipher, 1, 1, "hello", 1000).expect("log");

        let stored: String = conn
            .query_row("SELECT text FROM messages WHERE conv_id = 1", [], |row| {
                row.get(0)
            })
            .expect("row");
        assert_ne!(stored, "hello");
        assert!(stored.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_history_line_format() {
        let (conn, cipher) = test_db();
        log_at(&conn, &cipher, 1, 1, "hello", 1000).expect("log");

        let rendered = history(&conn, &cipher, 1).expect("history");
        // "[HH:MM] alice: hello\n" with a local-time clock.
        assert!(rendered.ends_with("] alice: hello\n") || rendered.contains("] alice: hello\n"));
        assert!(rendered.starts_with('['));
        assert_eq!(rendered.matches('\n').count(), 1);
    }

    #[test]
    fn test_history_ordering_ascending() {
        let (conn, cipher) = test_db();
        log_at(&conn, &cipher, 1, 1, "first", 1000).expect("log");
        log_at(&conn, &cipher, 1, 2, "second", 2000).expect("log");
        log_at(&conn, &cipher, 1, 1, "third", 3000).expect("log");

        let rendered = history(&conn, &cipher, 1).expect("history");
        let first = rendered.find("first").expect("first present");
        let second = rendered.find("second").expect("second present");
        let third = rendered.find("third").expect("third present");
        assert!(first < second && second < third);
    }

    #[test]
    fn test_history_window_keeps_most_recent() {
        let (conn, cipher) = test_db();
        for i in 0..60 {
            log_at(&conn, &cipher, 1, 1, &format!("msg{i}"), 1000 + i).expect("log");
        }

        let rendered = history(&conn, &cipher, 1).expect("history");
        assert_eq!(rendered.matches('\n').count(), HISTORY_WINDOW);
        // The ten oldest fell out of the window.
        assert!(!rendered.contains("msg0\n"));
        assert!(!rendered.contains("msg9\n"));
        assert!(rendered.contains("msg10\n"));
        assert!(rendered.contains("msg59\n"));
    }

    #[test]
    fn test_history_tie_broken_by_insertion_order() {
        let (conn, cipher) = test_db();
        log_at(&conn, &cipher, 1, 1, "earlier", 1000).expect("log");
        log_at(&conn, &cipher, 1, 1, "later", 1000).expect("log");

        let rendered = history(&conn, &cipher, 1).expect("history");
        assert!(rendered.find("earlier").expect("present") < rendered.find("later").expect("present"));
    }

    #[test]
    fn test_unreadable_row_renders_placeholder() {
        let (conn, cipher) = test_db();
        log_at(&conn, &cipher, 1, 1, "good", 1000).expect("log");
        conn.execute(
            "INSERT INTO messages (conv_id, sender_id, text, timestamp)
             VALUES (1, 2, 'deadbeef', 2000)",
            [],
        )
        .expect("insert corrupt row");

        let rendered = history(&conn, &cipher, 1).expect("history");
        assert!(rendered.contains("good"));
        assert!(rendered.contains(UNREADABLE_PLACEHOLDER));
        assert_eq!(rendered.matches('\n').count(), 2);
    }

    #[test]
    fn test_empty_history() {
        let (conn, cipher) = test_db();
        assert_eq!(history(&conn, &cipher, 1).expect("history"), "");
    }

    #[test]
    fn test_history_scoped_to_conversation() {
        let (mut conn, cipher) = test_db();
        conversations::create(&mut conn, conversations::TYPE_GROUP, "other", "", &[1])
            .expect("second conv");
        log_at(&conn, &cipher, 1, 1, "in one", 1000).expect("log");
        log_at(&conn, &cipher, 2, 1, "in two", 1000).expect("log");

        let rendered = history(&conn, &cipher, 1).expect("history");
        assert!(rendered.contains("in one"));
        assert!(!rendered.contains("in two"));
    }
}
