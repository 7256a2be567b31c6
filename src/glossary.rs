//! Glossary module: the bidirectional token/digest record
//!
//! Holds both directions of the pseudonymization mapping: token -> digest
//! for encoding, and digest -> (token, salt) for decoding. The maps grow in
//! lockstep, and a digest bound once stays bound to that token for the
//! lifetime of the glossary, resumed sessions included.

use std::collections::HashMap;

/// Decode-side record: the original token and the text-encoded salt that
/// produced its digest.
pub type DecodeEntry = (String, String);

/// Bidirectional pseudonymization record.
///
/// Owned by exactly one hashing session at a time and passed by value or
/// exclusive reference, never shared as ambient state.
#[derive(Debug, Clone, Default)]
pub struct Glossary {
    /// Token to digest mapping.
    token_to_digest: HashMap<String, String>,
    /// Digest to (token, salt-text) mapping, for decoding.
    digest_to_token: HashMap<String, DecodeEntry>,
}

impl Glossary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a glossary from its two persisted maps.
    pub fn from_maps(
        token_to_digest: HashMap<String, String>,
        digest_to_token: HashMap<String, DecodeEntry>,
    ) -> Self {
        Self {
            token_to_digest,
            digest_to_token,
        }
    }

    /// Digest bound to a token, if any.
    pub fn digest_for(&self, token: &str) -> Option<&str> {
        self.token_to_digest.get(token).map(String::as_str)
    }

    /// Token and salt text bound to a digest, if any.
    pub fn entry_for(&self, digest: &str) -> Option<&DecodeEntry> {
        self.digest_to_token.get(digest)
    }

    pub fn contains_digest(&self, digest: &str) -> bool {
        self.digest_to_token.contains_key(digest)
    }

    /// Binds a token and a digest in both directions.
    ///
    /// The caller must have checked `contains_digest` first; rebinding an
    /// existing digest would break the one-digest-one-token guarantee.
    pub(crate) fn bind(&mut self, token: &str, digest: &str, salt_text: &str) {
        debug_assert!(!self.token_to_digest.contains_key(token));
        debug_assert!(!self.digest_to_token.contains_key(digest));
        self.token_to_digest
            .insert(token.to_string(), digest.to_string());
        self.digest_to_token.insert(
            digest.to_string(),
            (token.to_string(), salt_text.to_string()),
        );
    }

    /// Number of bindings (both maps always agree).
    pub fn len(&self) -> usize {
        self.token_to_digest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.token_to_digest.is_empty()
    }

    /// Token -> digest view (the encode map).
    pub fn encode_map(&self) -> &HashMap<String, String> {
        &self.token_to_digest
    }

    /// Digest -> (token, salt) view (the decode map).
    pub fn decode_map(&self) -> &HashMap<String, DecodeEntry> {
        &self.digest_to_token
    }
}
