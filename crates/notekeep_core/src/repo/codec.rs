//! Note payload encoding.
//!
//! The repository stores whatever bytes the codec produces; the default is
//! the JSON object `{"id": <u64>, "content": <string>}`.

use crate::model::note::Note;
use crate::repo::RepoResult;

/// Encodes notes for storage and decodes stored payloads.
pub trait NoteCodec {
    fn encode(&self, note: &Note) -> RepoResult<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> RepoResult<Note>;
}

/// JSON payloads via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonNoteCodec;

impl NoteCodec for JsonNoteCodec {
    fn encode(&self, note: &Note) -> RepoResult<Vec<u8>> {
        Ok(serde_json::to_vec(note)?)
    }

    fn decode(&self, bytes: &[u8]) -> RepoResult<Note> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
