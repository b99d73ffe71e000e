//! Note storage gateway
//!
//! `NoteStorage` is the sole owner of the SQLite connection. It is built once
//! at startup and handed to whoever needs it; the connection itself is opened
//! lazily by the first operation.
//!
//! ## Concurrency
//!
//! - The connection lives in a `OnceCell`, so concurrent first callers share
//!   a single initialization instead of racing to open the database.
//! - Statements run one at a time under a mutex, on tokio's blocking pool.
//! - A failed initialization leaves the cell empty; the next call retries.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::{IdGenerator, Note};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::schema::init_schema;

/// Column list shared by every query returning notes
const NOTE_COLUMNS: &str = "id, title, body, created_at, updated_at";

/// Formats accepted for timestamp text; the first is SQLite's CURRENT_TIMESTAMP
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Where the notes database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    /// A database file, created along with its directory if missing
    File(PathBuf),
    /// A private in-memory database (for testing)
    Memory,
}

impl DbLocation {
    pub fn from_config(config: &Config) -> Self {
        DbLocation::File(config.database_path())
    }
}

impl fmt::Display for DbLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbLocation::File(path) => write!(f, "{}", path.display()),
            DbLocation::Memory => write!(f, ":memory:"),
        }
    }
}

type Handle = Arc<Mutex<Connection>>;

/// Gateway to the `notes` table
pub struct NoteStorage {
    location: DbLocation,
    handle: OnceCell<Handle>,
    ids: IdGenerator,
}

impl NoteStorage {
    /// Create a gateway for the given location without touching the disk
    pub fn new(location: DbLocation) -> Self {
        Self {
            location,
            handle: OnceCell::new(),
            ids: IdGenerator::new(),
        }
    }

    /// Create a gateway for the database named by the configuration
    pub fn with_config(config: &Config) -> Self {
        Self::new(DbLocation::from_config(config))
    }

    /// Create a gateway backed by an in-memory database
    pub fn in_memory() -> Self {
        Self::new(DbLocation::Memory)
    }

    pub fn location(&self) -> &DbLocation {
        &self.location
    }

    /// Whether the connection has been opened
    pub fn is_initialized(&self) -> bool {
        self.handle.initialized()
    }

    /// Open the database and make sure the notes table exists
    ///
    /// Idempotent: once the connection is open, later calls return
    /// immediately without re-running the schema.
    pub async fn initialize(&self) -> StorageResult<()> {
        self.handle().await.map(|_| ())
    }

    /// Fetch up to `limit` notes, newest first, skipping `offset` rows
    pub async fn list_page(&self, limit: u32, offset: u64) -> StorageResult<Vec<Note>> {
        let notes = self
            .run(move |conn| {
                let mut stmt = conn.prepare_cached(&format!(
                    "SELECT {NOTE_COLUMNS} FROM notes \
                     ORDER BY created_at DESC, rowid DESC \
                     LIMIT ?1 OFFSET ?2"
                ))?;
                let offset = i64::try_from(offset).unwrap_or(i64::MAX);
                let notes = stmt
                    .query_map(params![i64::from(limit), offset], note_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(notes)
            })
            .await?;

        debug!(
            "Listed {} note(s) (limit={}, offset={})",
            notes.len(),
            limit,
            offset
        );
        Ok(notes)
    }

    /// Insert a new note and return it as stored
    pub async fn insert(&self, title: &str, body: &str) -> StorageResult<Note> {
        let id = self.ids.next_id();
        let title = title.to_owned();
        let body = body.to_owned();

        let note = self
            .run(move |conn| {
                conn.query_row(
                    &format!(
                        "INSERT INTO notes (id, title, body) VALUES (?1, ?2, ?3) \
                         RETURNING {NOTE_COLUMNS}"
                    ),
                    params![id, title, body],
                    note_from_row,
                )
            })
            .await?;

        debug!("Inserted note {}", note.id);
        Ok(note)
    }

    /// Replace the title and body of a note
    ///
    /// Returns `None` when no note has the given id.
    pub async fn update(&self, id: &str, title: &str, body: &str) -> StorageResult<Option<Note>> {
        let id = id.to_owned();
        let title = title.to_owned();
        let body = body.to_owned();

        let note = self
            .run(move |conn| {
                conn.query_row(
                    &format!(
                        "UPDATE notes SET title = ?1, body = ?2, updated_at = CURRENT_TIMESTAMP \
                         WHERE id = ?3 RETURNING {NOTE_COLUMNS}"
                    ),
                    params![title, body, id],
                    note_from_row,
                )
                .optional()
            })
            .await?;

        match &note {
            Some(note) => debug!("Updated note {}", note.id),
            None => debug!("Update matched no note"),
        }
        Ok(note)
    }

    /// Delete a note
    ///
    /// Returns `true` only when a row was actually deleted.
    pub async fn remove(&self, id: &str) -> StorageResult<bool> {
        let id = id.to_owned();
        let deleted = self
            .run(move |conn| conn.execute("DELETE FROM notes WHERE id = ?1", params![id]))
            .await?;

        debug!("Delete affected {} row(s)", deleted);
        Ok(deleted > 0)
    }

    /// Fetch a single note
    pub async fn get(&self, id: &str) -> StorageResult<Option<Note>> {
        let id = id.to_owned();
        self.run(move |conn| {
            conn.query_row(
                &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1"),
                params![id],
                note_from_row,
            )
            .optional()
        })
        .await
    }

    /// Number of notes in the table
    pub async fn count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .run(|conn| conn.query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0)))
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    // ==================== Private helpers ====================

    /// Get the connection, opening it on first use
    async fn handle(&self) -> StorageResult<&Handle> {
        self.handle
            .get_or_try_init(|| async {
                let location = self.location.clone();
                let conn = tokio::task::spawn_blocking(move || open_connection(&location)).await??;
                info!("Opened notes database at {}", self.location);
                Ok::<_, StorageError>(Arc::new(Mutex::new(conn)))
            })
            .await
    }

    /// Run a statement against the connection on the blocking pool
    async fn run<T, F>(&self, op: F) -> StorageResult<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let handle = Arc::clone(self.handle().await?);
        let conn = handle.lock_owned().await;
        let result = tokio::task::spawn_blocking(move || op(&*conn)).await?;
        Ok(result?)
    }
}

/// Open (creating if needed) the database and its table
fn open_connection(location: &DbLocation) -> StorageResult<Connection> {
    let conn = match location {
        DbLocation::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|source| {
                    StorageError::CreateDirectory {
                        path: parent.to_path_buf(),
                        source,
                    }
                })?;
            }
            Connection::open(path)
        }
        DbLocation::Memory => Connection::open_in_memory(),
    }
    .map_err(|source| StorageError::Open {
        location: location.to_string(),
        source,
    })?;

    init_schema(&conn).map_err(StorageError::Schema)?;
    Ok(conn)
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        created_at: timestamp_column(row, 3)?,
        updated_at: timestamp_column(row, 4)?,
    })
}

/// Read a timestamp column
///
/// Rows written by the schema defaults always parse. Anything else (NULL,
/// other text layouts, unix seconds) is read as best it can be, falling back
/// to the unix epoch. A listing never fails on a timestamp.
fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let parsed = match row.get_ref(idx)? {
        ValueRef::Text(bytes) => std::str::from_utf8(bytes).ok().and_then(parse_timestamp),
        ValueRef::Integer(secs) => DateTime::<Utc>::from_timestamp(secs, 0),
        ValueRef::Real(secs) => DateTime::<Utc>::from_timestamp(secs as i64, 0),
        ValueRef::Null | ValueRef::Blob(_) => None,
    };

    Ok(parsed.unwrap_or_else(|| {
        warn!("Unreadable timestamp in column {}, using the unix epoch", idx);
        DateTime::<Utc>::UNIX_EPOCH
    }))
}

/// Parse timestamp text, which SQLite writes in UTC
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(with_zone) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_zone.with_timezone(&Utc));
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_initialize_is_lazy_and_idempotent() {
        let storage = NoteStorage::in_memory();
        assert!(!storage.is_initialized());

        storage.initialize().await.unwrap();
        assert!(storage.is_initialized());

        storage.insert("Kept", "across init").await.unwrap();
        storage.initialize().await.unwrap();
        assert_eq!(storage.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_operations_initialize_on_demand() {
        let storage = NoteStorage::in_memory();
        assert!(storage.list_page(10, 0).await.unwrap().is_empty());
        assert!(storage.is_initialized());
    }

    #[tokio::test]
    async fn test_concurrent_first_calls_share_one_connection() {
        let storage = NoteStorage::in_memory();

        // With two separate in-memory connections each insert would land in
        // its own database and the count would be 1.
        let (a, b) = tokio::join!(storage.insert("A", "a"), storage.insert("B", "b"));
        a.unwrap();
        b.unwrap();

        assert_eq!(storage.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_insert_then_list_first() {
        let storage = NoteStorage::in_memory();
        let inserted = storage.insert("T1", "B1").await.unwrap();

        let page = storage.list_page(1, 0).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "T1");
        assert_eq!(page[0].body, "B1");
        assert!(!page[0].id.is_empty());
        assert_eq!(page[0], inserted);
        assert_eq!(inserted.created_at, inserted.updated_at);
    }

    #[tokio::test]
    async fn test_pagination_covers_every_note_once() {
        let storage = NoteStorage::in_memory();
        let mut inserted = Vec::new();
        for i in 0..12 {
            let note = storage
                .insert(&format!("Note {}", i), "body")
                .await
                .unwrap();
            inserted.push(note.id);
        }

        let first = storage.list_page(5, 0).await.unwrap();
        let second = storage.list_page(5, 5).await.unwrap();
        let third = storage.list_page(5, 10).await.unwrap();
        assert_eq!(
            (first.len(), second.len(), third.len()),
            (5, 5, 2)
        );

        let seen: Vec<String> = first
            .iter()
            .chain(&second)
            .chain(&third)
            .map(|n| n.id.clone())
            .collect();
        let unique: HashSet<_> = seen.iter().collect();
        assert_eq!(unique.len(), 12);

        // Newest first
        inserted.reverse();
        assert_eq!(seen, inserted);
    }

    #[tokio::test]
    async fn test_list_past_the_end_is_empty() {
        let storage = NoteStorage::in_memory();
        storage.insert("Only", "one").await.unwrap();

        assert!(storage.list_page(5, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_changes_only_content() {
        let storage = NoteStorage::in_memory();
        let original = storage.insert("Before", "old body").await.unwrap();

        let updated = storage
            .update(&original.id, "After", "new body")
            .await
            .unwrap()
            .expect("note exists");
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.title, "After");
        assert_eq!(updated.body, "new body");
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at >= original.updated_at);

        let stored = storage.get(&original.id).await.unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_update_missing_note() {
        let storage = NoteStorage::in_memory();
        storage.insert("Existing", "note").await.unwrap();

        let before = storage.count().await.unwrap();
        let result = storage.update("no-such-id", "T", "B").await.unwrap();
        assert!(result.is_none());
        assert_eq!(storage.count().await.unwrap(), before);

        let page = storage.list_page(10, 0).await.unwrap();
        assert_eq!(page[0].title, "Existing");
    }

    #[tokio::test]
    async fn test_remove() {
        let storage = NoteStorage::in_memory();
        let keep = storage.insert("Keep", "me").await.unwrap();
        let gone = storage.insert("Remove", "me").await.unwrap();

        assert!(storage.remove(&gone.id).await.unwrap());

        let ids: Vec<String> = storage
            .list_page(10, 0)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec![keep.id]);
    }

    #[tokio::test]
    async fn test_remove_missing_note_reports_false() {
        let storage = NoteStorage::in_memory();
        assert!(!storage.remove("no-such-id").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_missing_note() {
        let storage = NoteStorage::in_memory();
        assert!(storage.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_is_a_query_error() {
        let storage = NoteStorage::in_memory();
        let note = storage.insert("First", "body").await.unwrap();

        let id = note.id.clone();
        let err = storage
            .run(move |conn| {
                conn.execute(
                    "INSERT INTO notes (id, title, body) VALUES (?1, 'Second', 'body')",
                    params![id],
                )
            })
            .await
            .unwrap_err();

        assert!(!err.is_init());
        assert_eq!(err.code(), Some(rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY));
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("NotesApp.db");

        {
            let storage = NoteStorage::new(DbLocation::File(path.clone()));
            storage.insert("Persisted", "body").await.unwrap();
        }
        assert!(path.exists());

        let reopened = NoteStorage::new(DbLocation::File(path));
        let notes = reopened.list_page(10, 0).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Persisted");
    }

    #[tokio::test]
    async fn test_init_failure_is_reported_and_retried() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file in the way").unwrap();

        let storage = NoteStorage::new(DbLocation::File(blocker.join("NotesApp.db")));
        let err = storage.initialize().await.unwrap_err();
        assert!(err.is_init());
        assert!(matches!(err, StorageError::CreateDirectory { .. }));
        assert!(!storage.is_initialized());

        // Still failing on the next operation, not stuck on a stale handle
        let err = storage.count().await.unwrap_err();
        assert!(err.is_init());
    }

    #[test]
    fn test_parse_timestamp() {
        let parsed = parse_timestamp("2024-03-05 14:07:09").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-05T14:07:09+00:00");

        let fractional = parse_timestamp("2024-03-05 14:07:09.250").unwrap();
        assert_eq!(fractional.timestamp(), parsed.timestamp());
        assert_eq!(parse_timestamp("2024-03-05T16:07:09+02:00"), Some(parsed));
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[tokio::test]
    async fn test_odd_timestamps_do_not_fail_listing() {
        let storage = NoteStorage::in_memory();
        let good = storage.insert("Good", "row").await.unwrap();
        storage
            .run(|conn| {
                conn.execute_batch(
                    "INSERT INTO notes (id, title, body, created_at, updated_at)
                         VALUES ('null-ts', 'Null', 'row', NULL, NULL);
                     INSERT INTO notes (id, title, body, created_at, updated_at)
                         VALUES ('junk-ts', 'Junk', 'row', 'last tuesday', 'soon');
                     INSERT INTO notes (id, title, body, created_at, updated_at)
                         VALUES ('unix-ts', 'Unix', 'row', 1700000000, 1700000000);",
                )
            })
            .await
            .unwrap();

        let notes = storage.list_page(10, 0).await.unwrap();
        assert_eq!(notes.len(), 4);

        let by_id = |id: &str| notes.iter().find(|n| n.id == id).unwrap();
        assert_eq!(by_id(&good.id).created_at, good.created_at);
        assert_eq!(by_id("null-ts").created_at, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(by_id("junk-ts").updated_at, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(by_id("unix-ts").created_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_location_display() {
        assert_eq!(DbLocation::Memory.to_string(), ":memory:");
        let config = Config {
            data_dir: PathBuf::from("/data"),
            ..Config::default()
        };
        assert_eq!(
            DbLocation::from_config(&config).to_string(),
            "/data/NotesApp.db"
        );
    }
}
