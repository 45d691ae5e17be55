//! Friendship queries.
//!
//! Friendships are symmetric: both directed rows are inserted in one
//! statement, so a crash can never leave half a friendship behind.

use rusqlite::Connection;

use crate::Result;

/// One row of a contact (or pending-request) listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRow {
    pub uid: u32,
    pub username: String,
}

/// Record a friendship between two users (both directions).
///
/// Duplicate friendships are ignored; self-friendship is the caller's
/// responsibility to exclude (the request layer already forbids it).
pub fn add_friendship(conn: &Connection, uid_a: u32, uid_b: u32) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO contacts (user_id, contact_id)
         VALUES (?1, ?2), (?2, ?1)",
        rusqlite::params![uid_a, uid_b],
    )?;
    Ok(())
}

/// List a user's contacts with usernames, ordered by username.
pub fn list_for(conn: &Connection, uid: u32) -> Result<Vec<ContactRow>> {
    let mut stmt = conn.prepare(
        "SELECT u.uid, u.username FROM contacts c
         JOIN users u ON c.contact_id = u.uid
         WHERE c.user_id = ?1 ORDER BY u.username",
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
