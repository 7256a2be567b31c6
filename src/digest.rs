//! Token digest computation.
//!
//! A digest is the configured one-way hash of `token bytes || salt`,
//! re-encoded as printable text. Identical inputs always produce the
//! identical digest, which is what makes later decoding verification
//! possible.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use blake2::{Blake2b512, Blake2s256};
use sha2::{Digest as _, Sha224, Sha256, Sha384, Sha512};

use crate::error::VeilError;

/// Hash functions the engine can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Blake2b,
    Blake2s,
}

impl HashAlgorithm {
    /// Digest size in bytes.
    pub fn digest_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha224 => 28,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
            HashAlgorithm::Blake2b => 64,
            HashAlgorithm::Blake2s => 32,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HashAlgorithm::Sha224 => "sha224",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Blake2b => "blake2b",
            HashAlgorithm::Blake2s => "blake2s",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for HashAlgorithm {
    type Err = VeilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha224" => Ok(HashAlgorithm::Sha224),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            "blake2b" | "blake2b512" => Ok(HashAlgorithm::Blake2b),
            "blake2s" | "blake2s256" => Ok(HashAlgorithm::Blake2s),
            _ => Err(VeilError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// Reversible printable encodings for digests and persisted salts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Base64,
    Hex,
}

impl TextEncoding {
    pub fn encode(&self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Base64 => BASE64.encode(bytes),
            TextEncoding::Hex => hex::encode(bytes),
        }
    }

    pub fn decode(&self, text: &str) -> Result<Vec<u8>, VeilError> {
        match self {
            TextEncoding::Base64 => BASE64
                .decode(text)
                .map_err(|e| VeilError::SaltDecode(e.to_string())),
            TextEncoding::Hex => {
                hex::decode(text).map_err(|e| VeilError::SaltDecode(e.to_string()))
            }
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TextEncoding::Base64 => "base64",
            TextEncoding::Hex => "hex",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for TextEncoding {
    type Err = VeilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base64" => Ok(TextEncoding::Base64),
            "hex" => Ok(TextEncoding::Hex),
            _ => Err(VeilError::UnsupportedEncoding(s.to_string())),
        }
    }
}

/// Hashes a token with the given salt.
///
/// Pure function of (token, salt, algorithm, encoding); no randomness is
/// drawn here. Uniqueness across a glossary is the caller's concern.
pub fn hash_token(
    token: &str,
    salt: &[u8],
    algorithm: HashAlgorithm,
    encoding: TextEncoding,
) -> String {
    let digest = match algorithm {
        HashAlgorithm::Sha224 => {
            let mut hasher = Sha224::new();
            hasher.update(token.as_bytes());
            hasher.update(salt);
            hasher.finalize().to_vec()
        }
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(token.as_bytes());
            hasher.update(salt);
            hasher.finalize().to_vec()
        }
        HashAlgorithm::Sha384 => {
            let mut hasher = Sha384::new();
            hasher.update(token.as_bytes());
            hasher.update(salt);
            hasher.finalize().to_vec()
        }
        HashAlgorithm::Sha512 => {
            let mut hasher = Sha512::new();
            hasher.update(token.as_bytes());
            hasher.update(salt);
            hasher.finalize().to_vec()
        }
        HashAlgorithm::Blake2b => {
            let mut hasher = Blake2b512::new();
            hasher.update(token.as_bytes());
            hasher.update(salt);
            hasher.finalize().to_vec()
        }
        HashAlgorithm::Blake2s => {
            let mut hasher = Blake2s256::new();
            hasher.update(token.as_bytes());
            hasher.update(salt);
            hasher.finalize().to_vec()
        }
    };

    encoding.encode(&digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_deterministic() {
        let salt = b"0123456789abcdef";
        let first = hash_token("alpha", salt, HashAlgorithm::Sha256, TextEncoding::Base64);
        let second = hash_token("alpha", salt, HashAlgorithm::Sha256, TextEncoding::Base64);
        assert_eq!(first, second);
    }

    #[test]
    fn test_hash_token_salt_changes_digest() {
        let first = hash_token("alpha", b"salt-one", HashAlgorithm::Sha256, TextEncoding::Hex);
        let second = hash_token("alpha", b"salt-two", HashAlgorithm::Sha256, TextEncoding::Hex);
        assert_ne!(first, second);
    }

    #[test]
    fn test_digest_lengths() {
        let salt = b"fixed";
        let hex = hash_token("token", salt, HashAlgorithm::Sha256, TextEncoding::Hex);
        assert_eq!(hex.len(), 64);

        // 32 digest bytes -> 44 base64 characters including padding.
        let b64 = hash_token("token", salt, HashAlgorithm::Sha256, TextEncoding::Base64);
        assert_eq!(b64.len(), 44);

        let blake = hash_token("token", salt, HashAlgorithm::Blake2b, TextEncoding::Hex);
        assert_eq!(blake.len(), HashAlgorithm::Blake2b.digest_len() * 2);
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let err = "md5croft".parse::<HashAlgorithm>().unwrap_err();
        assert!(matches!(err, VeilError::UnsupportedAlgorithm(name) if name == "md5croft"));
    }

    #[test]
    fn test_algorithm_names_round_trip() {
        for name in ["sha224", "sha256", "sha384", "sha512", "blake2b", "blake2s"] {
            let algorithm: HashAlgorithm = name.parse().unwrap();
            assert_eq!(algorithm.to_string(), name);
        }
    }

    #[test]
    fn test_encoding_round_trip() {
        let bytes: Vec<u8> = (0..=255).collect();
        for encoding in [TextEncoding::Base64, TextEncoding::Hex] {
            let text = encoding.encode(&bytes);
            assert_eq!(encoding.decode(&text).unwrap(), bytes);
        }
    }

    #[test]
    fn test_unknown_encoding_rejected() {
        let err = "base85".parse::<TextEncoding>().unwrap_err();
        assert!(matches!(err, VeilError::UnsupportedEncoding(_)));
    }

    #[test]
    fn test_bad_salt_text_rejected() {
        let err = TextEncoding::Hex.decode("not hex at all").unwrap_err();
        assert!(matches!(err, VeilError::SaltDecode(_)));
    }
}
