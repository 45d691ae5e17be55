//! # parley-db
//!
//! Storage layer for the Parley messaging server. One SQLite database
//! holds users, friendships, pending friend requests, conversations,
//! participants, and encrypted messages.
//!
//! - WAL mode, foreign keys enforced
//! - All timestamps are Unix epoch seconds
//! - Message bodies are stored encrypted (hex strings, see
//!   `parley-crypto`)
//! - The schema is ensured at open with `CREATE TABLE IF NOT EXISTS`

pub mod queries;
pub mod schema;

use std::path::Path;

use rusqlite::Connection;

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] parley_crypto::CryptoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Open or create the Parley database at the given path.
///
/// Configures pragmas and ensures the schema. The parent directory is
/// created if missing.
pub fn open(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)?;
    configure(&conn)?;
    conn.execute_batch(schema::SCHEMA)?;
    Ok(conn)
}

/// Open an in-memory database (for testing).
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    conn.execute_batch(schema::SCHEMA)?;
    Ok(conn)
}

/// Configure SQLite pragmas.
fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(())
}

/// Copy an existing database file to `data/backups/<stem>_YYYY-MM-DD.<ext>`
/// before it is opened for the day's run.
///
/// A missing source file (first run) is a silent no-op. An existing
/// backup for the same date is overwritten.
pub fn backup(db_path: &Path) -> Result<()> {
    if !db_path.exists() {
        return Ok(());
    }

    let backups_dir = Path::new("data").join("backups");
    std::fs::create_dir_all(&backups_dir)?;

    let stem = db_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "parley".to_string());
    let ext = db_path
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "db".to_string());
    let date = chrono::Local::now().format("%Y-%m-%d");
    let dest = backups_dir.join(format!("{stem}_{date}.{ext}"));

    std::fs::copy(db_path, &dest)?;
    tracing::info!(dest = %dest.display(), "database backed up");
    Ok(())
}
