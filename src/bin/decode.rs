//! Standalone decoder binary for corpus-veil
//!
//! Minimal binary that decodes one hashed document to stdout, re-deriving
//! every digest from the decode glossary on the way. Any digest that fails
//! to re-derive aborts the decode: a mismatch means the glossary and the
//! document do not belong together.
//!
//! Usage:
//!   decode <corpus_root> <hashed_document.json> [--hash-function <name>] [--encoding <name>]

use std::collections::HashMap;
use std::env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process;

use corpus_veil::{hash_token, Document, Element, HashAlgorithm, TextEncoding};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!(
            "Usage: decode <corpus_root> <hashed_document.json> \
             [--hash-function <name>] [--encoding <name>]"
        );
        process::exit(1);
    }

    let root = PathBuf::from(&args[1]);
    let document_path = PathBuf::from(&args[2]);

    let mut algorithm = HashAlgorithm::Sha256;
    let mut encoding = TextEncoding::Base64;
    let mut rest = args[3..].iter();
    while let Some(flag) = rest.next() {
        let value = rest
            .next()
            .ok_or_else(|| format!("missing value for {}", flag))?;
        match flag.as_str() {
            "--hash-function" => algorithm = value.parse()?,
            "--encoding" => encoding = value.parse()?,
            other => return Err(format!("unknown flag: {}", other).into()),
        }
    }

    let glossary_path = root.join("private").join("decode_glossary.json");
    let glossary_content = fs::read_to_string(&glossary_path)
        .map_err(|e| format!("Failed to read glossary {:?}: {}", glossary_path, e))?;
    let glossary: HashMap<String, (String, String)> = serde_json::from_str(&glossary_content)
        .map_err(|e| format!("Failed to parse glossary: {}", e))?;

    let document_content = fs::read_to_string(&document_path)
        .map_err(|e| format!("Failed to read document {:?}: {}", document_path, e))?;
    let document: Document = serde_json::from_str(&document_content)
        .map_err(|e| format!("Failed to parse document: {}", e))?;

    let decoded: Document = document
        .iter()
        .map(|element| decode_element(element, &glossary, algorithm, encoding))
        .collect::<Result<_, _>>()?;

    println!("{}", serde_json::to_string(&decoded)?);
    Ok(())
}

/// Replaces each digest leaf with its original token, verifying that
/// `hash_token(token, salt)` reproduces the digest it stands for.
fn decode_element(
    element: &Element,
    glossary: &HashMap<String, (String, String)>,
    algorithm: HashAlgorithm,
    encoding: TextEncoding,
) -> Result<Element, Box<dyn Error>> {
    match element {
        Element::Token(digest) => {
            let (token, salt_text) = glossary
                .get(digest)
                .ok_or_else(|| format!("digest {} is not in the glossary", digest))?;
            let salt = encoding.decode(salt_text)?;
            let derived = hash_token(token, &salt, algorithm, encoding);
            if &derived != digest {
                return Err(format!(
                    "token {:?} does not re-derive digest {}; wrong glossary, \
                     hash function, or encoding",
                    token, digest
                )
                .into());
            }
            Ok(Element::Token(token.clone()))
        }
        Element::Node(children) => children
            .iter()
            .map(|child| decode_element(child, glossary, algorithm, encoding))
            .collect::<Result<Vec<_>, _>>()
            .map(Element::Node),
    }
}
