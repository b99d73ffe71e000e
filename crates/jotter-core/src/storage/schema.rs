//! SQLite schema for the notes table

use rusqlite::{Connection, Result};

/// Create the notes table if it does not exist yet
///
/// Safe to run on every open.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS notes (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        );

        -- Listing is always newest first
        CREATE INDEX IF NOT EXISTS idx_notes_created_at ON notes(created_at);
        "#,
    )
}
