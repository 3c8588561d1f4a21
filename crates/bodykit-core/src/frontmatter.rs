//! Front matter parsing for source documents.
//!
//! A document may start with `key: value` lines closed by a line holding only
//! [`DELIMITER`]. Everything after the delimiter is the body.

use serde::{Deserialize, Serialize};

/// Line that closes the metadata block.
pub const DELIMITER: &str = "----";

/// Ordered string-to-string metadata. Re-inserting a key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    /// Create empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value; the last insert of a key wins.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Get a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Check if a key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterate entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A document split into metadata and body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    /// Parsed `key: value` pairs.
    pub metadata: Metadata,

    /// Trimmed text after the delimiter line.
    pub body: String,
}

/// Split a document at the first delimiter line.
///
/// Returns the metadata block and the remainder, or `None` when the document
/// has no delimiter line.
pub fn split_front_matter(source: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    for line in source.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            return Some((&source[..offset], &source[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// Parse the `key: value` lines of a metadata block.
pub fn parse_metadata(block: &str) -> Metadata {
    let mut metadata = Metadata::new();
    for line in block.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            continue;
        }
        metadata.insert(key, value);
    }
    metadata
}

/// Parse a whole document. A document without a delimiter is all body.
pub fn parse_front_matter(source: &str) -> FrontMatter {
    match split_front_matter(source) {
        Some((block, rest)) => FrontMatter {
            metadata: parse_metadata(block),
            body: rest.trim().to_string(),
        },
        None => FrontMatter {
            metadata: Metadata::new(),
            body: source.trim().to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_document() {
        let fm = parse_front_matter("title: Hello\n----\nBody **text**");
        assert_eq!(fm.metadata.get("title"), Some("Hello"));
        assert_eq!(fm.metadata.len(), 1);
        assert_eq!(fm.body, "Body **text**");
    }

    #[test]
    fn test_no_delimiter_is_all_body() {
        let fm = parse_front_matter("  title: not metadata\n\nJust body.  ");
        assert!(fm.metadata.is_empty());
        assert_eq!(fm.body, "title: not metadata\n\nJust body.");
    }

    #[test]
    fn test_split_on_first_colon_only() {
        let fm = parse_front_matter("link: https://example.com/a\n----\n");
        assert_eq!(fm.metadata.get("link"), Some("https://example.com/a"));
        assert_eq!(fm.body, "");
    }

    #[test]
    fn test_empty_keys_and_values_are_discarded() {
        let block = "title: Kept\n: no key\nempty:   \nno colon here\n  spaced  :  value  \n";
        let metadata = parse_metadata(block);

        let keys: Vec<_> = metadata.keys().collect();
        assert_eq!(keys, vec!["title", "spaced"]);
        assert_eq!(metadata.get("spaced"), Some("value"));
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let metadata = parse_metadata("type: page\ntitle: A\ntype: post\n");
        assert_eq!(metadata.get("type"), Some("post"));
        assert_eq!(metadata.keys().collect::<Vec<_>>(), vec!["type", "title"]);
    }

    #[test]
    fn test_delimiter_with_trailing_whitespace() {
        let fm = parse_front_matter("a: 1\r\n----  \r\n\r\nBody\r\n");
        assert_eq!(fm.metadata.get("a"), Some("1"));
        assert_eq!(fm.body, "Body");
    }

    #[test]
    fn test_only_first_delimiter_splits() {
        let fm = parse_front_matter("a: 1\n----\nfirst\n----\nsecond");
        assert_eq!(fm.body, "first\n----\nsecond");
    }

    #[test]
    fn test_longer_dash_lines_are_not_delimiters() {
        assert!(split_front_matter("a: 1\n-----\nbody").is_none());
        assert!(split_front_matter("a: 1\n ----\nbody").is_none());
    }

    #[test]
    fn test_metadata_keys_match_valid_lines() {
        let lines = [
            ("alpha", "1"),
            ("beta", ""),
            ("", "3"),
            ("gamma", "three: parts"),
            ("delta", " "),
        ];
        let block: String = lines
            .iter()
            .map(|(k, v)| format!("{k}: {v}\n"))
            .collect();
        let metadata = parse_metadata(&block);

        let mut keys: Vec<_> = metadata.keys().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["alpha", "gamma"]);
    }
}
