//! Data models for Jotter
//!
//! Defines the persisted `Note` record and the payloads used to create,
//! edit and merge notes.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A text note as stored in the `notes` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Note {
    /// Unique identifier, derived from the creation time
    pub id: String,
    /// Note title
    pub title: String,
    /// Note body, shown as the description
    pub body: String,
    /// When this note was created
    pub created_at: DateTime<Utc>,
    /// When this note was last updated
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Short form of the id for listings
    pub fn short_id(&self) -> &str {
        let start = self.id.len().saturating_sub(6);
        self.id.get(start..).unwrap_or(&self.id)
    }
}

/// Title and body entered for a new or edited note
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub body: String,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Check that both fields carry text
    ///
    /// The title is checked first, so a draft missing both reports the title.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.body.trim().is_empty() {
            return Err(ValidationError::EmptyBody);
        }
        Ok(())
    }
}

/// Fields to merge into a cached note; `None` leaves the field as is
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub body: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl NoteChanges {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Every mutable field of a freshly persisted note
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: Some(note.title.clone()),
            body: Some(note.body.clone()),
            updated_at: Some(note.updated_at),
        }
    }

    /// Write the provided fields into `note`
    pub fn apply_to(self, note: &mut Note) {
        if let Some(title) = self.title {
            note.title = title;
        }
        if let Some(body) = self.body {
            note.body = body;
        }
        if let Some(updated_at) = self.updated_at {
            note.updated_at = updated_at;
        }
    }
}

/// Input rejected before it reaches storage
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter the title")]
    EmptyTitle,

    #[error("Please enter the description")]
    EmptyBody,

    #[error("Page size must be greater than zero")]
    ZeroPageSize,
}

/// Generates note ids from the current time in milliseconds
///
/// Ids are strictly increasing for the life of the generator: when the clock
/// has not moved past the previous id, the previous id plus one is used.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicI64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the next id
    pub fn next_id(&self) -> String {
        self.next_at(Utc::now().timestamp_millis()).to_string()
    }

    fn next_at(&self, now_ms: i64) -> i64 {
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now_ms.max(current + 1);
            match self.last.compare_exchange_weak(
                current,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => current = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_note() -> Note {
        let now = Utc::now();
        Note {
            id: "1718000000000".to_string(),
            title: "Groceries".to_string(),
            body: "Milk, eggs".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_draft_validation() {
        assert!(NoteDraft::new("Title", "Body").validate().is_ok());
        assert_eq!(
            NoteDraft::new("", "Body").validate(),
            Err(ValidationError::EmptyTitle)
        );
        assert_eq!(
            NoteDraft::new("Title", "   ").validate(),
            Err(ValidationError::EmptyBody)
        );
        // Title is reported first
        assert_eq!(
            NoteDraft::new("", "").validate(),
            Err(ValidationError::EmptyTitle)
        );
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::EmptyTitle.to_string(),
            "Please enter the title"
        );
        assert_eq!(
            ValidationError::EmptyBody.to_string(),
            "Please enter the description"
        );
    }

    #[test]
    fn test_changes_merge_only_provided_fields() {
        let mut note = sample_note();
        let before = note.clone();

        NoteChanges::default().title("Shopping").apply_to(&mut note);

        assert_eq!(note.title, "Shopping");
        assert_eq!(note.body, before.body);
        assert_eq!(note.updated_at, before.updated_at);
        assert_eq!(note.id, before.id);
    }

    #[test]
    fn test_short_id() {
        let note = sample_note();
        assert_eq!(note.short_id(), "000000");

        let mut tiny = sample_note();
        tiny.id = "42".to_string();
        assert_eq!(tiny.short_id(), "42");
    }

    #[test]
    fn test_id_generator_is_strictly_increasing() {
        let ids = IdGenerator::new();

        // Same millisecond three times
        assert_eq!(ids.next_at(1_000), 1_000);
        assert_eq!(ids.next_at(1_000), 1_001);
        assert_eq!(ids.next_at(1_000), 1_002);

        // Clock jumps ahead
        assert_eq!(ids.next_at(5_000), 5_000);

        // Clock goes backwards
        assert_eq!(ids.next_at(4_000), 5_001);
    }

    #[test]
    fn test_id_generator_uses_clock() {
        let ids = IdGenerator::new();
        let before = Utc::now().timestamp_millis();
        let id: i64 = ids.next_id().parse().unwrap();
        assert!(id >= before);
    }
}
