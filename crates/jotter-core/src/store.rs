//! Notes store
//!
//! `NotesStore` sequences each user action: it announces the start, runs the
//! storage call, applies the matching state transition and reports the
//! outcome both as the returned `Result` and as a `StoreEvent`.
//!
//! ## Usage
//!
//! ```ignore
//! let storage = Arc::new(NoteStorage::with_config(&config));
//! let mut store = NotesStore::new(storage);
//!
//! store.load_page(PageRequest::first(config.page_size)).await?;
//! store.create(NoteDraft::new("Groceries", "Milk, eggs")).await?;
//!
//! while store.state().has_more() {
//!     store.load_page(PageRequest::next(config.page_size)).await?;
//! }
//! ```

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, error, warn};

use crate::error::{NotesError, NotesResult};
use crate::events::{Operation, StoreEvent};
use crate::models::{Note, NoteChanges, NoteDraft, ValidationError};
use crate::state::NotesState;
use crate::storage::{NoteStorage, StorageResult};

/// Events buffered per subscriber before the oldest are dropped
const EVENT_CAPACITY: usize = 64;

/// Parameters of a page load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Notes per page
    pub limit: u32,
    /// Page to load; `None` continues from the state's cursor
    pub page: Option<u32>,
}

impl PageRequest {
    /// Load the first page
    pub fn first(limit: u32) -> Self {
        Self::at(limit, 0)
    }

    /// Load a specific page
    pub fn at(limit: u32, page: u32) -> Self {
        Self {
            limit,
            page: Some(page),
        }
    }

    /// Continue from where the last load stopped
    pub fn next(limit: u32) -> Self {
        Self { limit, page: None }
    }
}

/// Orchestrates note operations over storage and the cached state
pub struct NotesStore {
    storage: Arc<NoteStorage>,
    state: NotesState,
    events: broadcast::Sender<StoreEvent>,
}

impl NotesStore {
    /// Create a store with an empty state over the given storage
    pub fn new(storage: Arc<NoteStorage>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            storage,
            state: NotesState::new(),
            events,
        }
    }

    pub fn storage(&self) -> &Arc<NoteStorage> {
        &self.storage
    }

    /// Current cached state
    pub fn state(&self) -> &NotesState {
        &self.state
    }

    /// Receive events for every operation started after this call
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Load a page of notes and append it to the state
    ///
    /// The cursor advances by exactly one page on success, even when the
    /// page came back short or empty. Returns the notes as fetched.
    pub async fn load_page(&mut self, request: PageRequest) -> NotesResult<Vec<Note>> {
        if request.limit == 0 {
            return Err(ValidationError::ZeroPageSize.into());
        }

        let operation = Operation::LoadPage;
        self.emit(StoreEvent::Requested { operation });

        let cursor = self.state.cursor(request.limit, request.page);
        let (notes, total) = match fetch_page(&self.storage, request.limit, cursor.offset).await
        {
            Ok(fetched) => fetched,
            Err(err) => return Err(self.fail(operation, err.into())),
        };

        let added = self.state.apply_page_loaded(notes.clone(), cursor, total);
        debug!(
            "Loaded page {} at offset {}: {} fetched, {} new, {} total",
            cursor.page,
            cursor.offset,
            notes.len(),
            added,
            total
        );

        self.emit(StoreEvent::Succeeded { operation });
        Ok(notes)
    }

    /// Drop the cached state and load the first page again
    pub async fn refresh(&mut self, limit: u32) -> NotesResult<Vec<Note>> {
        if limit == 0 {
            return Err(ValidationError::ZeroPageSize.into());
        }

        self.clear();
        self.load_page(PageRequest::first(limit)).await
    }

    /// Persist a new note and put it at the top of the state
    pub async fn create(&mut self, draft: NoteDraft) -> NotesResult<Note> {
        draft.validate()?;

        let operation = Operation::Create;
        self.emit(StoreEvent::Requested { operation });

        let note = match self.storage.insert(&draft.title, &draft.body).await {
            Ok(note) => note,
            Err(err) => return Err(self.fail(operation, err.into())),
        };

        self.state.apply_created(note.clone());
        self.emit(StoreEvent::Succeeded { operation });
        Ok(note)
    }

    /// Replace a note's title and body
    pub async fn update(&mut self, id: &str, draft: NoteDraft) -> NotesResult<Note> {
        draft.validate()?;

        let operation = Operation::Update;
        self.emit(StoreEvent::Requested { operation });

        let note = match self.storage.update(id, &draft.title, &draft.body).await {
            Ok(Some(note)) => note,
            Ok(None) => {
                let id = id.to_string();
                return Err(self.fail(operation, NotesError::NotFound { id }));
            }
            Err(err) => return Err(self.fail(operation, err.into())),
        };

        self.state.apply_updated(id, NoteChanges::from_note(&note));
        self.emit(StoreEvent::Succeeded { operation });
        Ok(note)
    }

    /// Delete a note from storage and from the state
    pub async fn delete(&mut self, id: &str) -> NotesResult<()> {
        let operation = Operation::Delete;
        self.emit(StoreEvent::Requested { operation });

        match self.storage.remove(id).await {
            Ok(true) => {}
            Ok(false) => {
                let id = id.to_string();
                return Err(self.fail(operation, NotesError::NotFound { id }));
            }
            Err(err) => return Err(self.fail(operation, err.into())),
        }

        self.state.apply_removed(id);
        self.emit(StoreEvent::Succeeded { operation });
        Ok(())
    }

    /// Reset the cached state; storage is untouched
    pub fn clear(&mut self) {
        self.state.apply_cleared();
    }

    /// Look a note up, from the state when loaded, otherwise from storage
    pub async fn fetch(&self, id: &str) -> NotesResult<Option<Note>> {
        if let Some(note) = self.state.get(id) {
            return Ok(Some(note.clone()));
        }
        Ok(self.storage.get(id).await?)
    }

    // ==================== Private helpers ====================

    fn emit(&self, event: StoreEvent) {
        // Sending only fails when nobody is subscribed
        let _ = self.events.send(event);
    }

    /// Log a failure, publish its notice and hand the error back
    fn fail(&self, operation: Operation, err: NotesError) -> NotesError {
        match &err {
            NotesError::Storage(storage_err) => {
                error!("Failed to {}: {}", operation, storage_err)
            }
            _ => warn!("Failed to {}: {}", operation, err),
        }

        self.emit(StoreEvent::Failed {
            operation,
            notice: err.notice(),
        });
        err
    }
}

/// Read one page together with the table's row count
async fn fetch_page(
    storage: &NoteStorage,
    limit: u32,
    offset: u64,
) -> StorageResult<(Vec<Note>, u64)> {
    let notes = storage.list_page(limit, offset).await?;
    let total = storage.count().await?;
    Ok((notes, total))
}
