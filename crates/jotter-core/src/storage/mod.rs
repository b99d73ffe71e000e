//! Storage layer
//!
//! Owns the SQLite database holding the `notes` table and translates rows
//! into `Note` records.
//!
//! - `gateway`: the `NoteStorage` handle and its CRUD operations
//! - `schema`: table definition
//! - `error`: typed storage errors

pub mod error;
pub mod gateway;
pub mod schema;

pub use error::{StorageError, StorageResult};
pub use gateway::{DbLocation, NoteStorage};
pub use schema::init_schema;
