//! Storage collaborator: glossary and document persistence.
//!
//! The hashing engine is agnostic to where and how state lives; it talks to
//! storage through [`CorpusStore`]. This module defines that contract and
//! ships one adapter, [`JsonStore`], which keeps everything as JSON on the
//! filesystem.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tracing::info;

use crate::document::{Document, Element};
use crate::error::{Result, VeilError};
use crate::glossary::{DecodeEntry, Glossary};

/// Storage contract the hashing engine works against.
pub trait CorpusStore {
    /// Loads the glossary from a previous session, or an empty one for a
    /// fresh corpus location.
    fn load_glossary(&self) -> Result<Glossary>;

    /// Persists both glossary maps wholesale (overwrite, not append). Must
    /// only be called once a session's encoding is complete.
    fn save_glossary(&self, glossary: &Glossary) -> Result<()>;

    /// Writes one hashed document under its zero-based index.
    fn save_document(&self, index: usize, document: &[Element]) -> Result<()>;

    /// Reads back the hashed document stored under an index.
    fn load_document(&self, index: usize) -> Result<Document>;
}

/// JSON-on-filesystem store.
///
/// Layout under a corpus root:
///
/// ```text
/// private/encode_glossary.json    token -> digest
/// private/decode_glossary.json    digest -> [token, salt]
/// public/<timestamp>/<index>.json hashed documents, one directory per session
/// ```
///
/// `private/` is shared by every session against the same root; each session
/// writes its hashed documents into a fresh timestamped directory.
#[derive(Debug)]
pub struct JsonStore {
    private_dir: PathBuf,
    session_dir: PathBuf,
    indent: bool,
}

impl JsonStore {
    /// Opens a corpus root, creating it if needed, and starts a fresh
    /// session directory for hashed output.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let private_dir = root.join("private");
        fs::create_dir_all(&private_dir)?;

        let public_dir = root.join("public");
        let mut session_dir = public_dir.join(session_stamp());
        // Stamps have microsecond precision; spin until ours is unclaimed.
        while session_dir.exists() {
            session_dir = public_dir.join(session_stamp());
        }
        fs::create_dir_all(&session_dir)?;

        Ok(Self {
            private_dir,
            session_dir,
            indent: false,
        })
    }

    /// Attaches to an existing session directory instead of creating one
    /// (read-back and verification).
    pub fn attach(root: impl AsRef<Path>, session_dir: impl AsRef<Path>) -> Result<Self> {
        let session_dir = session_dir.as_ref();
        if !session_dir.is_dir() {
            return Err(VeilError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("session directory {:?} does not exist", session_dir),
            )));
        }
        Ok(Self {
            private_dir: root.as_ref().join("private"),
            session_dir: session_dir.to_path_buf(),
            indent: false,
        })
    }

    /// Most recent session directory under a corpus root, if any. Stamps
    /// sort lexicographically, so the latest name wins.
    pub fn latest_session(root: impl AsRef<Path>) -> Result<Option<PathBuf>> {
        let public_dir = root.as_ref().join("public");
        if !public_dir.is_dir() {
            return Ok(None);
        }
        let mut sessions: Vec<PathBuf> = fs::read_dir(&public_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        sessions.sort();
        Ok(sessions.pop())
    }

    /// Pretty-prints persisted JSON. Larger files, easier inspection.
    pub fn with_indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    /// Directory this session's hashed documents are written to.
    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    /// Number of documents stored in this session, counting contiguous
    /// indexes from zero.
    pub fn document_count(&self) -> usize {
        (0..)
            .take_while(|index| self.document_path(*index).is_file())
            .count()
    }

    /// Yields stored hashed documents for indexes `0..count` in order.
    pub fn iter_documents(&self, count: usize) -> impl Iterator<Item = Result<Document>> + '_ {
        (0..count).map(|index| self.load_document(index))
    }

    fn encode_path(&self) -> PathBuf {
        self.private_dir.join("encode_glossary.json")
    }

    fn decode_path(&self) -> PathBuf {
        self.private_dir.join("decode_glossary.json")
    }

    fn document_path(&self, index: usize) -> PathBuf {
        self.session_dir.join(format!("{}.json", index))
    }

    fn write_json<T: Serialize>(&self, value: &T, path: &Path) -> Result<()> {
        let body = if self.indent {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        fs::write(path, body)?;
        Ok(())
    }
}

impl CorpusStore for JsonStore {
    fn load_glossary(&self) -> Result<Glossary> {
        let encode_path = self.encode_path();
        let decode_path = self.decode_path();

        match (encode_path.is_file(), decode_path.is_file()) {
            (true, true) => {
                info!("glossary from a previous session found, loading it");
                let encode: HashMap<String, String> =
                    serde_json::from_str(&fs::read_to_string(&encode_path)?)?;
                let decode: HashMap<String, DecodeEntry> =
                    serde_json::from_str(&fs::read_to_string(&decode_path)?)?;
                Ok(Glossary::from_maps(encode, decode))
            }
            (false, false) => Ok(Glossary::new()),
            (true, false) => Err(VeilError::InconsistentGlossaryState {
                present: encode_path,
                missing: decode_path,
            }),
            (false, true) => Err(VeilError::InconsistentGlossaryState {
                present: decode_path,
                missing: encode_path,
            }),
        }
    }

    fn save_glossary(&self, glossary: &Glossary) -> Result<()> {
        self.write_json(glossary.encode_map(), &self.encode_path())?;
        self.write_json(glossary.decode_map(), &self.decode_path())?;
        info!(entries = glossary.len(), "glossary persisted");
        Ok(())
    }

    fn save_document(&self, index: usize, document: &[Element]) -> Result<()> {
        self.write_json(&document, &self.document_path(index))
    }

    fn load_document(&self, index: usize) -> Result<Document> {
        let body = fs::read_to_string(self.document_path(index))?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn session_stamp() -> String {
    let now = Local::now();
    format!(
        "{}-{:06}",
        now.format("%Y-%m-%d_%H-%M-%S"),
        now.timestamp_subsec_micros()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Element;
    use tempfile::TempDir;

    fn sample_glossary() -> Glossary {
        let mut glossary = Glossary::new();
        glossary.bind("alpha", "d1", "s1");
        glossary.bind("beta", "d2", "s2");
        glossary
    }

    #[test]
    fn test_fresh_root_layout() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("corpus");
        let store = JsonStore::open(&root).unwrap();

        assert!(root.join("private").is_dir());
        assert!(store.session_dir().starts_with(root.join("public")));
        assert!(store.load_glossary().unwrap().is_empty());
    }

    #[test]
    fn test_glossary_persist_and_reload() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        store.save_glossary(&sample_glossary()).unwrap();

        // A later session against the same root sees the same bindings.
        let reloaded = JsonStore::open(dir.path()).unwrap().load_glossary().unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.digest_for("alpha"), Some("d1"));
        assert_eq!(
            reloaded.entry_for("d2"),
            Some(&("beta".to_string(), "s2".to_string()))
        );
    }

    #[test]
    fn test_single_glossary_file_is_inconsistent() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        fs::write(store.encode_path(), "{}").unwrap();

        let err = store.load_glossary().unwrap_err();
        assert!(matches!(err, VeilError::InconsistentGlossaryState { .. }));
    }

    #[test]
    fn test_documents_round_trip_in_order() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();

        let documents: Vec<Document> = (0..3)
            .map(|i| vec![Element::token(format!("doc-{}", i))])
            .collect();
        for (index, document) in documents.iter().enumerate() {
            store.save_document(index, document).unwrap();
        }

        assert_eq!(store.document_count(), 3);
        let read_back: Vec<Document> = store
            .iter_documents(3)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(read_back, documents);
    }

    #[test]
    fn test_sessions_get_distinct_directories() {
        let dir = TempDir::new().unwrap();
        let first = JsonStore::open(dir.path()).unwrap();
        let second = JsonStore::open(dir.path()).unwrap();

        assert_ne!(first.session_dir(), second.session_dir());
        assert_eq!(
            JsonStore::latest_session(dir.path()).unwrap().as_deref(),
            Some(second.session_dir())
        );
    }

    #[test]
    fn test_attach_to_existing_session() {
        let dir = TempDir::new().unwrap();
        let writer = JsonStore::open(dir.path()).unwrap();
        writer
            .save_document(0, &[Element::token("x")])
            .unwrap();

        let reader = JsonStore::attach(dir.path(), writer.session_dir()).unwrap();
        assert_eq!(reader.load_document(0).unwrap(), vec![Element::token("x")]);

        let missing = dir.path().join("public").join("nope");
        assert!(JsonStore::attach(dir.path(), &missing).is_err());
    }
}
