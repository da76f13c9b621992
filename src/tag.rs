/// Tag values and the selection set
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::ShareError;

/// A non-empty, case-preserved label.
///
/// Equality and hashing ignore case, so `"Rust"` and `"rust"` are the same tag
/// while each keeps the spelling it was created with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(String);

impl Tag {
    /// Build a tag from user or server text, trimming surrounding whitespace
    pub fn new(name: &str) -> Result<Tag, ShareError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            Err(ShareError::EmptyTag)
        } else {
            Ok(Tag(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased form used for comparisons
    pub fn key(&self) -> String {
        self.0.to_lowercase()
    }

    /// Case-insensitive substring test; `needle` must already be lowercase
    pub fn contains_lowercase(&self, needle: &str) -> bool {
        self.key().contains(needle)
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 || self.key() == other.key()
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Tag {
    type Error = ShareError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Tag::new(&value)
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> String {
        tag.0
    }
}

/// Tags chosen for the current submission, kept in the order they were added
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagSet {
    tags: Vec<Tag>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, tag: &Tag) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Returns false when an equal tag was already present
    pub fn insert(&mut self, tag: Tag) -> bool {
        if self.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    pub fn remove(&mut self, tag: &Tag) -> bool {
        let original_len = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() < original_len
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    /// Display strings, as sent in a submission payload
    pub fn to_names(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.as_str().to_string()).collect()
    }
}
