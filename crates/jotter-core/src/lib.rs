//! Jotter Core Library
//!
//! This crate provides the core functionality for Jotter, a local note
//! keeper: a SQLite table of notes and a paginated in-memory view of it.
//!
//! # Architecture
//!
//! - **NoteStorage**: sole owner of the database handle, CRUD over `notes`
//! - **NotesState**: the notes loaded so far plus the page cursor and total
//! - **NotesStore**: runs each operation against storage, then applies the
//!   matching state transition and publishes progress events
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let storage = Arc::new(NoteStorage::with_config(&config));
//! let mut store = NotesStore::new(storage);
//!
//! store.create(NoteDraft::new("Groceries", "Milk, eggs")).await?;
//! store.load_page(PageRequest::first(config.page_size)).await?;
//! ```
//!
//! # Modules
//!
//! - `store`: orchestration (main entry point)
//! - `state`: cached notes and pure transitions
//! - `storage`: SQLite gateway
//! - `models`: notes and their create/edit payloads
//! - `events`: progress events and user notices
//! - `config`: application configuration

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod state;
pub mod storage;
pub mod store;

pub use config::Config;
pub use error::{NotesError, NotesResult};
pub use events::{Notice, Operation, StoreEvent};
pub use models::{IdGenerator, Note, NoteChanges, NoteDraft, ValidationError};
pub use state::{NotesState, PageCursor};
pub use storage::{DbLocation, NoteStorage, StorageError};
pub use store::{NotesStore, PageRequest};
