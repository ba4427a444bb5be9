//! Note domain model.
//!
//! # Responsibility
//! - Define the `{id, content}` record stored per note.
//! - Derive storage keys from note ids and back.
//!
//! # Invariants
//! - Serialized form has exactly the fields `id` and `content`.
//! - Storage keys are the canonical decimal form of the id: no sign, no
//!   padding, no leading zeros.

use serde::{Deserialize, Serialize};

/// Note identifier, unique within its notebook.
pub type NoteId = u64;

/// One note inside a notebook.
///
/// `Note::default()` (id `0`, empty content) is what point reads return for
/// a missing note; sequences start at `1`, so no stored note has id `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub content: String,
}

impl Note {
    pub fn new(id: NoteId, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
        }
    }

    /// Storage key of this note inside its notebook bucket.
    pub fn key(&self) -> String {
        note_key(self.id)
    }
}

/// Returns the storage key for `id`.
pub fn note_key(id: NoteId) -> String {
    id.to_string()
}

/// Parses a storage key back into a note id.
///
/// Returns `None` for anything [`note_key`] would not produce, so a key
/// round-trips exactly or not at all.
pub fn parse_note_key(key: &[u8]) -> Option<NoteId> {
    let text = std::str::from_utf8(key).ok()?;
    if text.is_empty() || !text.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    if text.len() > 1 && text.starts_with('0') {
        return None;
    }
    text.parse().ok()
}
