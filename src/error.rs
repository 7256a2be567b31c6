//! Error types for the hashing engine and its storage adapter.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, VeilError>;

/// Errors surfaced by corpus-veil.
///
/// Digest collisions are deliberately absent: they are routine events the
/// engine resolves internally by re-salting, never surfaced to callers.
#[derive(Debug, Error)]
pub enum VeilError {
    #[error("hash function '{0}' is not supported")]
    UnsupportedAlgorithm(String),

    #[error("text encoding '{0}' is not supported")]
    UnsupportedEncoding(String),

    #[error("salt mode '{0}' is not recognized (expected 'per-token' or 'shared')")]
    InvalidSaltMode(String),

    #[error("salt length must be at least 1 byte")]
    InvalidSaltLength,

    /// Exactly one of the two glossary files exists. Neither side can be
    /// trusted as authoritative, so loading refuses rather than guessing.
    #[error("inconsistent glossary state: {present:?} exists but {missing:?} is missing")]
    InconsistentGlossaryState { present: PathBuf, missing: PathBuf },

    /// A shared-salt session was requested over a glossary whose entries
    /// were salted per token.
    #[error("cannot resume in shared-salt mode: existing glossary entries do not share one salt")]
    MixedSaltHistory,

    #[error("persisted salt could not be decoded: {0}")]
    SaltDecode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
