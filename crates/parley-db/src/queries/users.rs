//! User account queries: registration, credential checks, profile
//! updates, friend-code lookup.

use rusqlite::{Connection, OptionalExtension};

use crate::{DbError, Result};

/// How many fresh friend codes to try when the UNIQUE constraint trips
/// on a code collision before giving up on the registration.
const FRIEND_CODE_ATTEMPTS: usize = 5;

/// A full user row.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub uid: u32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub friend_code: String,
}

/// Register a new user, returning the generated friend code.
///
/// The password is hashed with a per-user random salt. On a friend-code
/// collision the insert is retried with a fresh code; a username or
/// email collision fails immediately.
///
/// # Errors
///
/// Returns [`DbError::Constraint`] when the username or email is taken
/// (or all code attempts collided).
pub fn register(
    conn: &Connection,
    email: &str,
    username: &str,
    password: &str,
) -> Result<String> {
    let hash = parley_crypto::password::hash_password(password)?;

    for _ in 0..FRIEND_CODE_ATTEMPTS {
        let code = parley_crypto::codes::generate_friend_code();
        let inserted = conn.execute(
            "INSERT INTO users (username, email, password_hash, friend_code)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![username, email, hash, code],
        );
        match inserted {
            Ok(_) => return Ok(code),
            Err(rusqlite::Error::SqliteFailure(e, Some(msg)))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
                    && msg.contains("friend_code") =>
            {
                // 16^6 codes, so a collision is rare; draw again.
                continue;
            }
            Err(rusqlite::Error::SqliteFailure(e, msg))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(DbError::Constraint(
                    msg.unwrap_or_else(|| "username or email already taken".into()),
                ));
            }
            Err(other) => return Err(other.into()),
        }
    }

    Err(DbError::Constraint(
        "could not allocate a unique friend code".into(),
    ))
}

/// Verify credentials, returning the user row on success and `None` on
/// unknown email or wrong password (indistinguishable to the caller).
pub fn check_credentials(
    conn: &Connection,
    email: &str,
    password: &str,
) -> Result<Option<UserRow>> {
    let row = conn
        .query_row(
            "SELECT uid, username, email, password_hash, friend_code
             FROM users WHERE email = ?1",
            [email],
            map_user_row,
        )
        .optional()?;

    Ok(row.filter(|u| parley_crypto::password::verify_password(password, &u.password_hash)))
}

/// Apply a profile update. Empty fields are left unchanged; a new
/// password is re-hashed with a fresh salt.
///
/// # Errors
///
/// Returns [`DbError::Constraint`] if the new username is taken.
pub fn update(
    conn: &Connection,
    uid: u32,
    new_username: &str,
    new_password: &str,
) -> Result<()> {
    if !new_username.is_empty() {
        conn.execute(
            "UPDATE users SET username = ?1 WHERE uid = ?2",
            rusqlite::params![new_username, uid],
        )
        .map_err(constraint_or_sqlite)?;
    }
    if !new_password.is_empty() {
        let hash = parley_crypto::password::hash_password(new_password)?;
        conn.execute(
            "UPDATE users SET password_hash = ?1 WHERE uid = ?2",
            rusqlite::params![hash, uid],
        )?;
    }
    Ok(())
}

/// Resolve a friend code to a uid.
pub fn get_uid_by_code(conn: &Connection, code: &str) -> Result<Option<u32>> {
    Ok(conn
        .query_row(
            "SELECT uid FROM users WHERE friend_code = ?1",
            [code],
            |row| row.get(0),
        )
        .optional()?)
}

/// Fetch a user row by uid.
pub fn get_by_uid(conn: &Connection, uid: u32) -> Result<Option<UserRow>> {
    Ok(conn
        .query_row(
            "SELECT uid, username, email, password_hash, friend_code
             FROM users WHERE uid = ?1",
            [uid],
            map_user_row,
        )
        .optional()?)
}

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        uid: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        friend_code: row.get(4)?,
    })
}

fn constraint_or_sqlite(e: rusqlite::Error) -> DbError {
    match e {
        rusqlite::Error::SqliteFailure(err, msg)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DbError::Constraint(msg.unwrap_or_else(|| "constraint violation".into()))
        }
        other => DbError::Sqlite(other),
    }
}
