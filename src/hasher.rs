//! The hashing engine: salt policy, collision resolution, corpus walking.

use std::fmt;
use std::str::FromStr;

use rand::rngs::OsRng;
use rand::{CryptoRng, Rng};
use tracing::{debug, info, warn};

use crate::digest::{hash_token, HashAlgorithm, TextEncoding};
use crate::document::{Document, Element};
use crate::error::{Result, VeilError};
use crate::glossary::Glossary;
use crate::store::CorpusStore;

/// Session salting policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaltMode {
    /// Every token is hashed with its own random salt.
    PerToken,
    /// All tokens of the session share one salt, recovered from a previous
    /// session when resuming.
    Shared,
}

impl fmt::Display for SaltMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SaltMode::PerToken => "per-token",
            SaltMode::Shared => "shared",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for SaltMode {
    type Err = VeilError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "per-token" | "per_token" => Ok(SaltMode::PerToken),
            "shared" | "one-salt" => Ok(SaltMode::Shared),
            _ => Err(VeilError::InvalidSaltMode(s.to_string())),
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Copy)]
pub struct HasherConfig {
    pub hash_function: HashAlgorithm,
    /// Salt length in bytes; must be at least 1.
    pub salt_length: usize,
    pub salt_mode: SaltMode,
    /// Text encoding for digests and persisted salts.
    pub encoding: TextEncoding,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            hash_function: HashAlgorithm::Sha256,
            salt_length: 32,
            salt_mode: SaltMode::PerToken,
            encoding: TextEncoding::Base64,
        }
    }
}

/// The pseudonymization engine for one corpus.
///
/// Owns the glossary for the duration of a session. A token seen before is
/// answered from the glossary without drawing entropy; an unseen token is
/// salted, hashed, and bound, re-salting until its digest collides with
/// nothing already bound.
#[derive(Debug)]
pub struct CorpusHasher {
    config: HasherConfig,
    glossary: Glossary,
    session_salt: Option<Vec<u8>>,
}

impl CorpusHasher {
    /// Builds an engine over a (possibly pre-loaded) glossary.
    pub fn new(config: HasherConfig, glossary: Glossary) -> Result<Self> {
        Self::new_with_rng(config, glossary, &mut OsRng)
    }

    /// Builds with a caller-supplied random source (for testing).
    pub fn new_with_rng<R: Rng + CryptoRng>(
        config: HasherConfig,
        glossary: Glossary,
        rng: &mut R,
    ) -> Result<Self> {
        if config.salt_length == 0 {
            return Err(VeilError::InvalidSaltLength);
        }
        let session_salt = select_session_salt(&config, &glossary, rng)?;
        Ok(Self {
            config,
            glossary,
            session_salt,
        })
    }

    pub fn config(&self) -> &HasherConfig {
        &self.config
    }

    pub fn glossary(&self) -> &Glossary {
        &self.glossary
    }

    /// Salt shared by this session, if running in shared mode.
    pub fn session_salt(&self) -> Option<&[u8]> {
        self.session_salt.as_deref()
    }

    /// Hands the (possibly grown) glossary back for persistence.
    pub fn into_glossary(self) -> Glossary {
        self.glossary
    }

    /// Digest for one token, binding it into the glossary if unseen.
    pub fn encode_token(&mut self, token: &str) -> String {
        self.encode_token_with_rng(token, &mut OsRng)
    }

    /// Digest for one token, with a caller-supplied random source.
    pub fn encode_token_with_rng<R: Rng + CryptoRng>(&mut self, token: &str, rng: &mut R) -> String {
        if let Some(digest) = self.glossary.digest_for(token) {
            return digest.to_string();
        }

        let mut salt = match &self.session_salt {
            Some(shared) => shared.clone(),
            None => random_salt(self.config.salt_length, rng),
        };
        let mut digest = hash_token(token, &salt, self.config.hash_function, self.config.encoding);

        // A digest already bound to another token is never reused. The
        // shared salt is abandoned for this token only and fresh salts are
        // drawn until the digest is free.
        while self.glossary.contains_digest(&digest) {
            debug!(digest = %digest, "digest collision, drawing a fresh salt");
            salt = random_salt(self.config.salt_length, rng);
            digest = hash_token(token, &salt, self.config.hash_function, self.config.encoding);
        }

        self.glossary
            .bind(token, &digest, &self.config.encoding.encode(&salt));
        digest
    }

    /// Hashes a document into an identically shaped tree of digests.
    pub fn hash_document(&mut self, document: &[Element]) -> Document {
        self.hash_document_with_rng(document, &mut OsRng)
    }

    /// Hashes a document, with a caller-supplied random source.
    pub fn hash_document_with_rng<R: Rng + CryptoRng>(
        &mut self,
        document: &[Element],
        rng: &mut R,
    ) -> Document {
        document
            .iter()
            .map(|element| self.hash_element(element, rng))
            .collect()
    }

    fn hash_element<R: Rng + CryptoRng>(&mut self, element: &Element, rng: &mut R) -> Element {
        match element {
            Element::Token(token) => Element::Token(self.encode_token_with_rng(token, rng)),
            Element::Node(children) => Element::Node(
                children
                    .iter()
                    .map(|child| self.hash_element(child, rng))
                    .collect(),
            ),
        }
    }
}

fn random_salt<R: Rng + CryptoRng>(length: usize, rng: &mut R) -> Vec<u8> {
    let mut salt = vec![0u8; length];
    rng.fill_bytes(&mut salt);
    salt
}

/// Picks the session salt for the configured mode.
///
/// Resuming a shared-salt corpus recovers the salt from the persisted
/// entries; the recovered salt wins over the configured length. A glossary
/// whose entries do not all share one salt cannot be resumed in shared mode.
fn select_session_salt<R: Rng + CryptoRng>(
    config: &HasherConfig,
    glossary: &Glossary,
    rng: &mut R,
) -> Result<Option<Vec<u8>>> {
    match config.salt_mode {
        SaltMode::PerToken => Ok(None),
        SaltMode::Shared => {
            let mut salt_texts = glossary.decode_map().values().map(|(_, salt)| salt.as_str());
            let first = match salt_texts.next() {
                None => return Ok(Some(random_salt(config.salt_length, rng))),
                Some(first) => first,
            };
            if salt_texts.any(|salt| salt != first) {
                return Err(VeilError::MixedSaltHistory);
            }
            let salt = config.encoding.decode(first)?;
            if salt.len() != config.salt_length {
                warn!(
                    recovered = salt.len(),
                    configured = config.salt_length,
                    "resuming with the previous session salt; configured salt length ignored"
                );
            }
            Ok(Some(salt))
        }
    }
}

/// Hashes a whole corpus through a storage collaborator.
///
/// Loads any prior glossary, hashes every document against it, writes each
/// hashed document under its zero-based index, and persists the updated
/// glossary once the session is complete. Returns the number of documents
/// hashed.
pub fn hash_corpus<S: CorpusStore>(
    corpus: &[Document],
    store: &S,
    config: HasherConfig,
) -> Result<usize> {
    hash_corpus_with_rng(corpus, store, config, &mut OsRng)
}

/// [`hash_corpus`] with a caller-supplied random source.
pub fn hash_corpus_with_rng<S: CorpusStore, R: Rng + CryptoRng>(
    corpus: &[Document],
    store: &S,
    config: HasherConfig,
    rng: &mut R,
) -> Result<usize> {
    let glossary = store.load_glossary()?;
    let mut hasher = CorpusHasher::new_with_rng(config, glossary, rng)?;

    for (index, document) in corpus.iter().enumerate() {
        let hashed = hasher.hash_document_with_rng(document, rng);
        store.save_document(index, &hashed)?;
    }

    // Only persisted now: collision retries mutate both maps until the last
    // token of the last document has been resolved.
    store.save_glossary(hasher.glossary())?;
    info!(
        documents = corpus.len(),
        entries = hasher.glossary().len(),
        "corpus hashed"
    );
    Ok(corpus.len())
}
