//! Document structure and traversal.
//!
//! A document is an ordered tree whose leaves are tokens. The nesting is
//! opaque to the hashing engine: a node may stand for a sentence, a
//! paragraph, or any deeper grouping, and the engine only promises to give
//! the hashed output the exact same shape.

use serde::{Deserialize, Serialize};

/// One element of a document tree: a leaf token or a nested group.
///
/// Serializes untagged, so a document round-trips as nested JSON arrays of
/// strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Element {
    Token(String),
    Node(Vec<Element>),
}

/// A document: an ordered sequence of elements.
pub type Document = Vec<Element>;

impl Element {
    /// Leaf constructor.
    pub fn token(token: impl Into<String>) -> Self {
        Element::Token(token.into())
    }

    pub fn is_token(&self) -> bool {
        matches!(self, Element::Token(_))
    }
}

/// Yields the leaves of a document left to right, depth first.
///
/// The order is fixed: positional comparison between a document and its
/// hashed counterpart relies on both walks visiting leaves in the same
/// sequence.
pub fn walk_leaves(document: &[Element]) -> WalkLeaves<'_> {
    WalkLeaves {
        stack: document.iter().rev().collect(),
    }
}

/// Iterator returned by [`walk_leaves`].
pub struct WalkLeaves<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for WalkLeaves<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(element) = self.stack.pop() {
            match element {
                Element::Token(token) => return Some(token),
                Element::Node(children) => self.stack.extend(children.iter().rev()),
            }
        }
        None
    }
}

/// Characters stripped from word edges by [`text_split`].
const STRIP_CHARS: &[char] = &[
    ' ', '.', '(', ')', '[', ']', '{', ':', '}', ',', '"', '\'', ';',
];

/// Splits plain text into a line -> sentence -> word document.
///
/// Meant for tests and the CLI; real corpora should arrive already
/// tokenized by something less naive.
pub fn text_split(text: &str) -> Document {
    let mut lines = Vec::new();
    for line in text.lines() {
        let mut sentences = Vec::new();
        for sentence in line.split('.') {
            let words: Vec<Element> = sentence
                .split_whitespace()
                .filter_map(|word| {
                    let stripped = word.trim_matches(STRIP_CHARS);
                    (!stripped.is_empty()).then(|| Element::token(stripped))
                })
                .collect();
            if !words.is_empty() {
                sentences.push(Element::Node(words));
            }
        }
        if !sentences.is_empty() {
            lines.push(Element::Node(sentences));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_leaves_depth_first_order() {
        let document = vec![
            Element::token("a"),
            Element::Node(vec![
                Element::token("b"),
                Element::Node(vec![Element::token("c"), Element::token("d")]),
            ]),
            Element::token("e"),
        ];

        let leaves: Vec<&str> = walk_leaves(&document).collect();
        assert_eq!(leaves, vec!["a", "b", "c", "d", "e"]);
        assert!(document[0].is_token());
        assert!(!document[1].is_token());
    }

    #[test]
    fn test_walk_leaves_empty_nodes() {
        let document = vec![Element::Node(vec![]), Element::token("x")];
        let leaves: Vec<&str> = walk_leaves(&document).collect();
        assert_eq!(leaves, vec!["x"]);
    }

    #[test]
    fn test_text_split_shape() {
        let document = text_split("the quick fox. jumps over\nthe lazy dog");

        // Two lines; the first has two sentences.
        assert_eq!(document.len(), 2);
        match &document[0] {
            Element::Node(sentences) => assert_eq!(sentences.len(), 2),
            _ => panic!("expected a node for the first line"),
        }

        let leaves: Vec<&str> = walk_leaves(&document).collect();
        assert_eq!(
            leaves,
            vec!["the", "quick", "fox", "jumps", "over", "the", "lazy", "dog"]
        );
    }

    #[test]
    fn test_text_split_strips_punctuation() {
        let document = text_split("(hello), \"world\"; {ok}:");
        let leaves: Vec<&str> = walk_leaves(&document).collect();
        assert_eq!(leaves, vec!["hello", "world", "ok"]);
    }

    #[test]
    fn test_text_split_skips_empty_pieces() {
        assert!(text_split("").is_empty());
        assert!(text_split("...\n\n").is_empty());
    }

    #[test]
    fn test_element_serializes_as_nested_arrays() {
        let document = vec![
            Element::Node(vec![Element::token("a"), Element::token("b")]),
            Element::token("c"),
        ];

        let json = serde_json::to_string(&document).unwrap();
        assert_eq!(json, r#"[["a","b"],"c"]"#);

        let parsed: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, document);
    }
}
