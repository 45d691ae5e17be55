//! Conversation and participant queries.
//!
//! Conversation type and participant role are stored as the raw wire
//! integers (0 = private / member, 1 = group / admin); translation to
//! typed enums happens at the protocol boundary.

use rusqlite::{Connection, OptionalExtension};

use crate::Result;

/// Conversation type tag for two-party private rooms.
pub const TYPE_PRIVATE: u8 = 0;
/// Conversation type tag for groups.
pub const TYPE_GROUP: u8 = 1;
/// Role tag for ordinary members.
pub const ROLE_MEMBER: u8 = 0;
/// Role tag for group admins.
pub const ROLE_ADMIN: u8 = 1;

/// One conversation as seen by a particular user. `name` is
/// recipient-relative for private rooms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationRow {
    pub conv_id: u32,
    pub conv_type: u8,
    pub name: String,
    pub description: String,
    pub my_role: u8,
}

/// One member of a conversation roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRow {
    pub uid: u32,
    pub username: String,
    pub role: u8,
}

/// Find the private conversation containing both users, if any.
pub fn find_private(conn: &Connection, uid_a: u32, uid_b: u32) -> Result<Option<u32>> {
    Ok(conn
        .query_row(
            "SELECT c.conv_id FROM conversations c
             JOIN participants p1 ON c.conv_id = p1.conv_id
             JOIN participants p2 ON c.conv_id = p2.conv_id
             WHERE c.type = 0 AND p1.user_id = ?1 AND p2.user_id = ?2",
            rusqlite::params![uid_a, uid_b],
            |row| row.get(0),
        )
        .optional()?)
}

/// Create a conversation with its participant rows, returning the new
/// conv_id.
///
/// For groups the first uid (the creator) becomes admin and the rest
/// members; private rooms have no meaningful role. Everything happens
/// in one transaction.
pub fn create(
    conn: &mut Connection,
    conv_type: u8,
    name: &str,
    description: &str,
    uids: &[u32],
) -> Result<u32> {
    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO conversations (type, name, description) VALUES (?1, ?2, ?3)",
        rusqlite::params![conv_type, name, description],
    )?;
    let conv_id = tx.last_insert_rowid() as u32;

    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO participants (conv_id, user_id, role) VALUES (?1, ?2, ?3)",
        )?;
        for (i, uid) in uids.iter().enumerate() {
            let role = if i == 0 && conv_type == TYPE_GROUP {
                ROLE_ADMIN
            } else {
                ROLE_MEMBER
            };
            stmt.execute(rusqlite::params![conv_id, uid, role])?;
        }
    }

    tx.commit()?;
    Ok(conv_id)
}

/// List a user's conversations.
///
/// Private rooms are named `Private with <other>` from the viewpoint of
/// `uid` and carry no description; groups use the stored name and
/// description.
pub fn list_for(conn: &Connection, uid: u32) -> Result<Vec<ConversationRow>> {
    let mut stmt = conn.prepare(
        "SELECT c.conv_id, c.type, c.name, c.description, p.role
         FROM conversations c
         JOIN participants p ON c.conv_id = p.conv_id
         WHERE p.user_id = ?1 ORDER BY c.conv_id",
    )?;

    let raw: Vec<(u32, u8, Option<String>, Option<String>, u8)> = stmt
        .query_map([uid], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
            ))
        })?
        .collect::<std::result::Result<_, _>>()?;

    let mut rows = Vec::with_capacity(raw.len());
    for (conv_id, conv_type, name, description, my_role) in raw {
        let (name, description) = if conv_type == TYPE_PRIVATE {
            let other: Option<String> = conn
                .query_row(
                    "SELECT u.username FROM participants p
                     JOIN users u ON p.user_id = u.uid
                     WHERE p.conv_id = ?1 AND p.user_id != ?2",
                    rusqlite::params![conv_id, uid],
                    |row| row.get(0),
                )
                .optional()?;
            let name = match other {
                Some(username) => format!("Private with {username}"),
                None => "Private Chat".to_string(),
            };
            (name, String::new())
        } else {
            (name.unwrap_or_default(), description.unwrap_or_default())
        };

        rows.push(ConversationRow {
            conv_id,
            conv_type,
            name,
            description,
            my_role,
        });
    }

    Ok(rows)
}

/// List the uids participating in a conversation.
pub fn participants_of(conn: &Connection, conv_id: u32) -> Result<Vec<u32>> {
    let mut stmt = conn.prepare("SELECT user_id FROM participants WHERE conv_id = ?1")?;
    let uids = stmt
        .query_map([conv_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(uids)
}

/// List the member roster of a conversation with usernames and roles.
pub fn members_of(conn: &Connection, conv_id: u32) -> Result<Vec<MemberRow>> {
    let mut stmt = conn.prepare(
        "SELECT u.uid, u.username, p.role FROM participants p
         JOIN users u ON p.user_id = u.uid
         WHERE p.conv_id = ?1 ORDER BY p.role DESC, u.username",
    )?;
    let rows = stmt
        .query_map([conv_id], |row| {
            Ok(MemberRow {
                uid: row.get(0)?,
                username: row.get(1)?,
                role: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Rename/re-describe a group.
pub fn update_group(conn: &Connection, conv_id: u32, name: &str, description: &str) -> Result<()> {
    conn.execute(
        "UPDATE conversations SET name = ?1, description = ?2 WHERE conv_id = ?3",
        rusqlite::params![name, description, conv_id],
    )?;
    Ok(())
}

/// Add a participant. Returns `false` if they were already in the
/// conversation.
pub fn add_participant(conn: &Connection, conv_id: u32, uid: u32, role: u8) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO participants (conv_id, user_id, role) VALUES (?1, ?2, ?3)",
        rusqlite::params![conv_id, uid, role],
    )?;
    Ok(inserted > 0)
}

/// Remove a participant.
pub fn remove_participant(conn: &Connection, conv_id: u32, uid: u32) -> Result<()> {
    conn.execute(
        "DELETE FROM participants WHERE conv_id = ?1 AND user_id = ?2",
        rusqlite::params![conv_id, uid],
    )?;
    Ok(())
}

/// Delete a conversation, cascading to participants and messages, in
/// one transaction.
pub fn delete(conn: &mut Connection, conv_id: u32) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM messages WHERE conv_id = ?1", [conv_id])?;
    tx.execute("DELETE FROM participants WHERE conv_id = ?1", [conv_id])?;
    tx.execute("DELETE FROM conversations WHERE conv_id = ?1", [conv_id])?;
    tx.commit()?;
    Ok(())
}

/// Whether `uid` holds the admin role in `conv_id`.
pub fn is_admin(conn: &Connection, conv_id: u32, uid: u32) -> Result<bool> {
    let role: Option<u8> = conn
        .query_row(
            "SELECT role FROM participants WHERE conv_id = ?1 AND user_id = ?2",
            rusqlite::params![conv_id, uid],
            |row| row.get(0),
        )
        .optional()?;
    Ok(role == Some(ROLE_ADMIN))
}

/// Whether `uid` participates in `conv_id` at all.
pub fn is_participant(conn: &Connection, conv_id: u32, uid: u32) -> Result<bool> {
    let found: Option<u32> = conn
        .query_row(
            "SELECT 1 FROM participants WHERE conv_id = ?1 AND user_id = ?2",
            rusqlite::params![conv_id, uid],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::users;

    fn test_db() -> Connection {
        let conn = crate::open_memory().expect("open test db");
        users::register(&conn, "a@x", "alice", "pw").expect("alice");
        users::register(&conn, "b@x", "bob", "pw").expect("bob");
        users::register(&conn, "c@x", "carol", "pw").expect("carol");
        conn
    }

    #[test]
    fn test_private_room_naming_is_recipient_relative() {
        let mut conn = test_db();
        create(&mut conn, TYPE_PRIVATE, "Private Chat", "", &[1, 2]).expect("create");

        let alices = list_for(&conn, 1).expect("list");
        let bobs = list_for(&conn, 2).expect("list");
        assert_eq!(alices[0].name, "Private with bob");
        assert_eq!(bobs[0].name, "Private with alice");
        assert!(alices[0].description.is_empty());
    }

    #[test]
    fn test_find_private_uniqueness() {
        let mut conn = test_db();
        assert_eq!(find_private(&conn, 1, 2).expect("find"), None);

        let id = create(&mut conn, TYPE_PRIVATE, "Private Chat", "", &[1, 2]).expect("create");
        assert_eq!(find_private(&conn, 1, 2).expect("find"), Some(id));
        assert_eq!(find_private(&conn, 2, 1).expect("find"), Some(id));
        // A different pair has no room.
        assert_eq!(find_private(&conn, 1, 3).expect("find"), None);
    }

    #[test]
    fn test_group_creator_is_admin() {
        let mut conn = test_db();
        let id = create(&mut conn, TYPE_GROUP, "team", "work", &[1, 2, 3]).expect("create");

        assert!(is_admin(&conn, id, 1).expect("query"));
        assert!(!is_admin(&conn, id, 2).expect("query"));

        let members = members_of(&conn, id).expect("members");
        assert_eq!(members.len(), 3);
        let alice = members.iter().find(|m| m.uid == 1).expect("alice present");
        assert_eq!(alice.role, ROLE_ADMIN);
    }

    #[test]
    fn test_private_room_has_no_admin() {
        let mut conn = test_db();
        let id = create(&mut conn, TYPE_PRIVATE, "Private Chat", "", &[1, 2]).expect("create");
        assert!(!is_admin(&conn, id, 1).expect("query"));
        assert!(!is_admin(&conn, id, 2).expect("query"));
    }

    #[test]
    fn test_group_listing_uses_stored_name() {
        let mut conn = test_db();
        create(&mut conn, TYPE_GROUP, "team", "work stuff", &[1, 2]).expect("create");

        let rows = list_for(&conn, 2).expect("list");
        assert_eq!(rows[0].name, "team");
        assert_eq!(rows[0].description, "work stuff");
        assert_eq!(rows[0].my_role, ROLE_MEMBER);
    }

    #[test]
    fn test_add_participant_idempotent() {
        let mut conn = test_db();
        let id = create(&mut conn, TYPE_GROUP, "g", "", &[1]).expect("create");

        assert!(add_participant(&conn, id, 2, ROLE_MEMBER).expect("add"));
        assert!(!add_participant(&conn, id, 2, ROLE_MEMBER).expect("re-add"));
        assert_eq!(participants_of(&conn, id).expect("list").len(), 2);
    }

    #[test]
    fn test_kick_removes_from_view() {
        let mut conn = test_db();
        let id = create(&mut conn, TYPE_GROUP, "g", "", &[1, 2]).expect("create");

        remove_participant(&conn, id, 2).expect("kick");
        assert!(list_for(&conn, 2).expect("list").is_empty());
        assert!(!is_participant(&conn, id, 2).expect("query"));
        // The remaining member still sees it.
        assert_eq!(list_for(&conn, 1).expect("list").len(), 1);
    }

    #[test]
    fn test_delete_cascades() {
        let mut conn = test_db();
        let id = create(&mut conn, TYPE_GROUP, "g", "", &[1, 2]).expect("create");
        conn.execute(
            "INSERT INTO messages (conv_id, sender_id, text, timestamp) VALUES (?1, 1, 'x', 0)",
            [id],
        )
        .expect("insert message");

        delete(&mut conn, id).expect("delete");

        let participants: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM participants WHERE conv_id = ?1",
                [id],
                |row| row.get(0),
            )
            .expect("count");
        let messages: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM messages WHERE conv_id = ?1",
                [id],
                |row| row.get(0),
            )
            .expect("count");
        assert_eq!(participants, 0);
        assert_eq!(messages, 0);
        assert!(list_for(&conn, 1).expect("list").is_empty());
    }

    #[test]
    fn test_update_group() {
        let mut conn = test_db();
        let id = create(&mut conn, TYPE_GROUP, "old", "", &[1]).expect("create");
        update_group(&conn, id, "new name", "new desc").expect("update");

        let rows = list_for(&conn, 1).expect("list");
        assert_eq!(rows[0].name, "new name");
        assert_eq!(rows[0].description, "new desc");
    }
}
