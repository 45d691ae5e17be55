//! Pending friend-request queries.

use rusqlite::Connection;

use crate::queries::contacts::ContactRow;
use crate::Result;

/// Record a pending request from `from_uid` to `to_uid`.
///
/// Returns `false` without touching the table when the request targets
/// the sender themself or an identical request is already pending.
pub fn add(conn: &Connection, from_uid: u32, to_uid: u32) -> Result<bool> {
    if from_uid == to_uid {
        return Ok(false);
    }
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO requests (sender_id, receiver_id) VALUES (?1, ?2)",
        rusqlite::params![from_uid, to_uid],
    )?;
    Ok(inserted > 0)
}

/// Remove a pending request. Silent if absent.
pub fn remove(conn: &Connection, from_uid: u32, to_uid: u32) -> Result<()> {
    conn.execute(
        "DELETE FROM requests WHERE sender_id = ?1 AND receiver_id = ?2",
        rusqlite::params![from_uid, to_uid],
    )?;
    Ok(())
}

/// List the pending requests addressed to a user, with sender names.
pub fn list_for(conn: &Connection, uid: u32) -> Result<Vec<ContactRow>> {
    let mut stmt = conn.prepare(
        "SELECT u.uid, u.username FROM requests r
         JOIN users u ON r.sender_id = u.uid
         WHERE r.receiver_id = ?1 ORDER BY u.username",
    )?;

    let rows = stmt
        .query_map([uid], |row| {
            Ok(ContactRow {
                uid: row.get(0)?,
                username: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::users;

    fn test_db() -> Connection {
        let conn = crate::open_memory().expect("open test db");
        users::register(&conn, "a@x", "alice", "pw").expect("alice");
        users::register(&conn, "b@x", "bob", "pw").expect("bob");
        conn
    }

    #[test]
    fn test_add_and_list() {
        let conn = test_db();
        assert!(add(&conn, 1, 2).expect("add"));

        let pending = list_for(&conn, 2).expect("list");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].uid, 1);
        assert_eq!(pending[0].username, "alice");

        // Nothing pending for the sender.
        assert!(list_for(&conn, 1).expect("list").is_empty());
    }

    #[test]
    fn test_self_request_rejected() {
        let conn = test_db();
        assert!(!add(&conn, 1, 1).expect("add"));
        assert!(list_for(&conn, 1).expect("list").is_empty());
    }

    #[test]
    fn test_duplicate_request_rejected() {
        let conn = test_db();
        assert!(add(&conn, 1, 2).expect("first"));
        assert!(!add(&conn, 1, 2).expect("duplicate"));
        assert_eq!(list_for(&conn, 2).expect("list").len(), 1);
    }

    #[test]
    fn test_remove_is_silent_when_absent() {
        let conn = test_db();
        remove(&conn, 1, 2).expect("remove nothing");

        add(&conn, 1, 2).expect("add");
        remove(&conn, 1, 2).expect("remove");
        assert!(list_for(&conn, 2).expect("list").is_empty());
    }

    #[test]
    fn test_opposite_directions_coexist() {
        let conn = test_db();
        assert!(add(&conn, 1, 2).expect("a to b"));
        assert!(add(&conn, 2, 1).expect("b to a"));
        assert_eq!(list_for(&conn, 1).expect("list").len(), 1);
        assert_eq!(list_for(&conn, 2).expect("list").len(), 1);
    }
}
