//! In-memory notes state
//!
//! `NotesState` caches the notes loaded so far, newest first, together with
//! the page cursor and the table's row count. It is only changed through the
//! `apply_*` transitions, which do no I/O.
//!
//! ## Keeping paging aligned
//!
//! `next_offset` is the table row just past the last page read. Every page
//! load sets it from the offset it actually read at, so cursor loads and
//! explicit-page loads can be mixed freely. Creating a note locally shifts
//! the table down by one row and removing a loaded note shifts it up, so
//! both move `next_offset` along. Page loads also skip ids already present.

use serde::{Deserialize, Serialize};

use crate::models::{Note, NoteChanges};

/// Where the next page load should read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    /// Zero-based page being requested
    pub page: u32,
    /// Rows to skip in the table
    pub offset: u64,
}

/// Cached projection of the notes table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotesState {
    notes: Vec<Note>,
    page: u32,
    total: u64,
    #[serde(default)]
    next_offset: u64,
}

impl NotesState {
    /// The empty initial state
    pub fn new() -> Self {
        Self::default()
    }

    /// Loaded notes, newest first
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Next page to request
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Row count of the table as last observed
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Table offset the next cursor load reads from
    pub fn next_offset(&self) -> u64 {
        self.next_offset
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Whether the table holds notes that have not been loaded yet
    pub fn has_more(&self) -> bool {
        (self.notes.len() as u64) < self.total
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    /// Work out which page to load and the offset to read it from
    ///
    /// An explicit page is addressed absolutely (`page * limit`). Without
    /// one, the load continues at `next_offset`.
    pub fn cursor(&self, limit: u32, explicit_page: Option<u32>) -> PageCursor {
        match explicit_page {
            Some(page) => PageCursor {
                page,
                offset: u64::from(page) * u64::from(limit),
            },
            None => PageCursor {
                page: self.page,
                offset: self.next_offset,
            },
        }
    }

    // ==================== Transitions ====================

    /// Append a page read at `cursor` and move past it
    ///
    /// Notes already present are skipped. `total` is the table's row count
    /// observed with this page. Returns how many notes were appended.
    pub fn apply_page_loaded(
        &mut self,
        notes: Vec<Note>,
        cursor: PageCursor,
        total: u64,
    ) -> usize {
        let before = self.notes.len();
        let fetched = notes.len() as u64;
        for note in notes {
            if self.get(&note.id).is_none() {
                self.notes.push(note);
            }
        }
        self.page = cursor.page.saturating_add(1);
        self.next_offset = cursor.offset.saturating_add(fetched);
        self.total = total;
        self.notes.len() - before
    }

    /// Put a newly created note at the top
    pub fn apply_created(&mut self, note: Note) {
        self.notes.insert(0, note);
        self.total += 1;
        self.next_offset += 1;
    }

    /// Drop a note that storage confirmed as deleted
    ///
    /// The row count shrinks even when the note was never loaded, since the
    /// row existed in the table. Returns whether a loaded note was dropped.
    pub fn apply_removed(&mut self, id: &str) -> bool {
        let before = self.notes.len();
        self.notes.retain(|note| note.id != id);
        let removed = self.notes.len() < before;

        if removed {
            self.next_offset = self.next_offset.saturating_sub(1);
        }
        self.total = self.total.saturating_sub(1);
        removed
    }

    /// Merge changed fields into a loaded note
    ///
    /// Returns `false`, leaving the state untouched, when no note matches.
    pub fn apply_updated(&mut self, id: &str, changes: NoteChanges) -> bool {
        match self.notes.iter_mut().find(|note| note.id == id) {
            Some(note) => {
                changes.apply_to(note);
                true
            }
            None => false,
        }
    }

    /// Reset to the empty initial state
    pub fn apply_cleared(&mut self) {
        *self = Self::default();
    }
}
