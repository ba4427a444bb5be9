use notekeep_core::db::open_db_in_memory;
use notekeep_core::{
    BucketNoteRepository, JsonNoteCodec, Note, NoteCodec, NoteRepository, RepoError, RepoResult,
};
use std::cell::Cell;

/// JSON codec that fails on the n-th encode call.
struct FailingCodec {
    fail_on: usize,
    calls: Cell<usize>,
}

impl FailingCodec {
    fn failing_on(fail_on: usize) -> Self {
        Self {
            fail_on,
            calls: Cell::new(0),
        }
    }
}

impl NoteCodec for FailingCodec {
    fn encode(&self, note: &Note) -> RepoResult<Vec<u8>> {
        let call = self.calls.get() + 1;
        self.calls.set(call);
        if call == self.fail_on {
            return Err(RepoError::Serialization(
                <serde_json::Error as serde::ser::Error>::custom("forced encode failure"),
            ));
        }
        JsonNoteCodec.encode(note)
    }

    fn decode(&self, bytes: &[u8]) -> RepoResult<Note> {
        JsonNoteCodec.decode(bytes)
    }
}

#[test]
fn add_many_assigns_consecutive_ids_in_input_order() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = BucketNoteRepository::try_new(&mut conn).unwrap();

    let ids = repo.add_notes("work", &["a", "b", "c"]).unwrap();
    assert_eq!(ids, vec![1, 2, 3]);

    for (id, content) in ids.iter().zip(["a", "b", "c"]) {
        assert_eq!(repo.get_note("work", *id).unwrap(), Note::new(*id, content));
    }
}

#[test]
fn ids_keep_increasing_across_calls_and_deletes() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = BucketNoteRepository::try_new(&mut conn).unwrap();

    let first = repo.add_notes("work", &["one", "two"]).unwrap();
    repo.delete_notes("work", &first).unwrap();
    let second = repo.add_notes("work", &["three"]).unwrap();

    assert_eq!(first, vec![1, 2]);
    assert_eq!(second, vec![3]);
    assert!(!repo.note_exists("work", 1).unwrap());
    assert!(!repo.note_exists("work", 2).unwrap());
}

#[test]
fn ids_are_scoped_per_notebook() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = BucketNoteRepository::try_new(&mut conn).unwrap();

    repo.add_notes("work", &["w1", "w2"]).unwrap();
    let home = repo.add_notes("home", &["h1"]).unwrap();
    assert_eq!(home, vec![1]);

    assert_eq!(repo.get_note("work", 1).unwrap().content, "w1");
    assert_eq!(repo.get_note("home", 1).unwrap().content, "h1");
    assert_eq!(
        repo.list_notebooks().unwrap(),
        vec!["home".to_string(), "work".to_string()]
    );
}

#[test]
fn exists_tracks_add_and_delete() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = BucketNoteRepository::try_new(&mut conn).unwrap();

    let ids = repo.add_notes("work", &["keep", "drop"]).unwrap();
    assert!(repo.note_exists("work", ids[0]).unwrap());
    assert!(repo.note_exists("work", ids[1]).unwrap());
    assert!(!repo.note_exists("work", 99).unwrap());

    repo.delete_notes("work", &[ids[1]]).unwrap();
    assert!(repo.note_exists("work", ids[0]).unwrap());
    assert!(!repo.note_exists("work", ids[1]).unwrap());
}

#[test]
fn get_missing_note_returns_default_without_error() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = BucketNoteRepository::try_new(&mut conn).unwrap();
    repo.add_notes("work", &["present"]).unwrap();

    assert_eq!(repo.get_note("work", 42).unwrap(), Note::default());
    assert_eq!(repo.find_note("work", 42).unwrap(), None);
}

#[test]
fn reads_on_unknown_notebook_report_absent_and_create_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = BucketNoteRepository::try_new(&mut conn).unwrap();

    assert!(!repo.note_exists("ghost", 1).unwrap());
    assert_eq!(repo.get_note("ghost", 1).unwrap(), Note::default());
    assert!(repo.list_notes("ghost").unwrap().is_empty());
    assert!(repo.list_notebooks().unwrap().is_empty());
}

#[test]
fn delete_on_unknown_notebook_returns_notebook_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = BucketNoteRepository::try_new(&mut conn).unwrap();

    let err = repo.delete_notes("ghost", &[1, 2]).unwrap_err();
    match err {
        RepoError::NotebookNotFound(name) => assert_eq!(name, "ghost"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(repo.list_notebooks().unwrap().is_empty());
}

#[test]
fn delete_of_absent_ids_is_noop_and_keeps_existing_notes() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = BucketNoteRepository::try_new(&mut conn).unwrap();
    let ids = repo.add_notes("work", &["a", "b"]).unwrap();

    repo.delete_notes("work", &[7, 8, 9]).unwrap();
    repo.delete_notes("work", &[]).unwrap();

    let notes = repo.list_notes("work").unwrap();
    assert_eq!(notes, vec![Note::new(ids[0], "a"), Note::new(ids[1], "b")]);
}

#[test]
fn failed_batch_persists_no_notes() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo =
        BucketNoteRepository::with_codec(&mut conn, FailingCodec::failing_on(3)).unwrap();

    let err = repo.add_notes("work", &["first", "second", "third"]).unwrap_err();
    assert!(matches!(err, RepoError::Serialization(_)));

    assert!(!repo.note_exists("work", 1).unwrap());
    assert!(!repo.note_exists("work", 2).unwrap());
    // The notebook was created inside the failed transaction as well.
    assert!(repo.list_notebooks().unwrap().is_empty());

    // The rolled back sequence hands out the same ids again.
    let ids = repo.add_notes("work", &["retry"]).unwrap();
    assert_eq!(ids, vec![1]);
}

#[test]
fn failed_batch_leaves_existing_notes_untouched() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo =
        BucketNoteRepository::with_codec(&mut conn, FailingCodec::failing_on(4)).unwrap();

    let kept = repo.add_notes("work", &["kept"]).unwrap();
    assert!(repo.add_notes("work", &["x", "y", "z"]).is_err());

    assert_eq!(repo.list_notes("work").unwrap(), vec![Note::new(kept[0], "kept")]);
    assert!(!repo.note_exists("work", 2).unwrap());
}

#[test]
fn content_round_trips_exactly() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = BucketNoteRepository::try_new(&mut conn).unwrap();
    let samples = [
        "",
        "plain",
        "line one\nline two\r\n\ttabbed",
        "quotes \" and \\ backslashes",
        "unicode: 日本語 ✓ 🚀",
        "{\"id\": 999, \"content\": \"nested json\"}",
    ];

    let ids = repo.add_notes("samples", &samples).unwrap();
    for (id, content) in ids.into_iter().zip(samples) {
        let note = repo.get_note("samples", id).unwrap();
        assert_eq!(note.id, id);
        assert_eq!(note.content, content);
    }
}

#[test]
fn add_with_empty_batch_still_creates_notebook() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = BucketNoteRepository::try_new(&mut conn).unwrap();

    let ids = repo.add_notes::<&str>("empty", &[]).unwrap();
    assert!(ids.is_empty());
    assert_eq!(repo.list_notebooks().unwrap(), vec!["empty".to_string()]);
    repo.delete_notes("empty", &[1]).unwrap();
}

#[test]
fn add_with_empty_notebook_name_fails() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = BucketNoteRepository::try_new(&mut conn).unwrap();

    let err = repo.add_notes("", &["orphan"]).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}
