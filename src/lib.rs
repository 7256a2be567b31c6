//! corpus-veil: corpus pseudonymization with a reversible glossary
//!
//! Replaces every token of a nested, tokenized corpus with a salted one-way
//! digest while preserving the nesting structure exactly.
//!
//! ## How it works
//!
//! 1. **Glossary**: bidirectional token -> digest and digest -> (token, salt) record
//! 2. **Salting**: a fresh random salt per token, or one salt shared by the session
//! 3. **Collisions**: a digest bound to another token is never reused; fresh
//!    salts are drawn until the digest is unique
//! 4. **Resume**: previous glossaries are loaded and extended, never rewritten
//!
//! Tokenization and storage are collaborator concerns: the engine consumes
//! already-tokenized documents and talks to storage through
//! [`store::CorpusStore`].

pub mod digest;
pub mod document;
pub mod error;
pub mod glossary;
pub mod hasher;
pub mod store;

pub use digest::{hash_token, HashAlgorithm, TextEncoding};
pub use document::{text_split, walk_leaves, Document, Element};
pub use error::{Result, VeilError};
pub use glossary::Glossary;
pub use hasher::{hash_corpus, CorpusHasher, HasherConfig, SaltMode};
pub use store::{CorpusStore, JsonStore};
