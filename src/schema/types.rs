// Schema-side types for jsonlayout
//
// A description document is parsed at the boundary into typed field
// descriptors; the exception set decides which keys never enter the tree.

use serde::Deserialize;
use serde_json::Value;

use crate::tree::{EditMode, FieldType, LeafLayout};

/// Layout and defaults read from one leaf entry of a description document.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub field_type: FieldType,
    /// Byte offset, read from the hex `addr` field
    pub address: u32,
    /// Byte count, read from the `size` field
    pub byte_size: u32,
    pub edit_mode: EditMode,
    pub description: String,
    /// The `default` entry when present, non-null and non-empty
    pub default: Option<Value>,
}

impl FieldDescriptor {
    /// Layout metadata to attach to the leaf built from this descriptor.
    pub fn layout(&self) -> LeafLayout {
        LeafLayout {
            address: self.address,
            byte_size: self.byte_size,
            field_type: self.field_type,
            edit_mode: self.edit_mode,
            description: self.description.clone(),
        }
    }
}

/// Key substrings that exclude a key, and its whole subtree, from a build.
/// Matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "Vec<String>")]
pub struct ExceptionSet {
    patterns: Vec<String>,
}

impl ExceptionSet {
    /// Creates an exception set; patterns are stored lowercased.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// The lowercased patterns.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// True if the key contains any of the patterns.
    pub fn matches(&self, key: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let key = key.to_lowercase();
        self.patterns.iter().any(|p| key.contains(p.as_str()))
    }
}

impl From<Vec<String>> for ExceptionSet {
    fn from(patterns: Vec<String>) -> Self {
        Self::new(patterns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_matching_is_case_insensitive_substring() {
        let exceptions = ExceptionSet::new(["Secret", "tmp"]);
        assert!(exceptions.matches("secretToken"));
        assert!(exceptions.matches("MY_SECRET"));
        assert!(exceptions.matches("tmpDir"));
        assert!(!exceptions.matches("public"));
        assert!(!ExceptionSet::default().matches("secret"));
    }

    #[test]
    fn test_exception_set_deserializes_from_list() {
        let exceptions: ExceptionSet = serde_json::from_str(r#"["Debug"]"#).unwrap();
        assert!(exceptions.matches("debugFlags"));
    }
}
