use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A word's classification along the game's taxonomy dimensions.
///
/// One value per dimension. The BTreeMap keeps dimensions in a canonical
/// order, so two tag sets with the same content always compare and
/// serialize identically regardless of how they were assembled.
pub type TagSet = BTreeMap<String, String>;

/// Tag combinations already assigned to some record, keyed by [`combo_key`].
pub type TagCombinationSet = HashSet<String>;

/// Order-independent identity of a tag combination.
pub fn combo_key(tags: &TagSet) -> String {
    let mut key = String::new();
    for (dimension, value) in tags {
        key.push_str(dimension);
        key.push('=');
        key.push_str(value);
        key.push(';');
    }
    key
}

/// One word's full record: tags, connections and description.
///
/// `word` is the unique key within a graph. `connections` distinguishes
/// "not generated yet" (`None`) from "generated, possibly empty"
/// (`Some(vec![])`); the construction pipeline never moves an entry
/// backwards through that lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<TagSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl WordEntry {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            tags: None,
            connections: None,
            description: None,
        }
    }

    pub fn with_tags(word: impl Into<String>, tags: TagSet) -> Self {
        Self {
            word: word.into(),
            tags: Some(tags),
            connections: None,
            description: None,
        }
    }

    pub fn tag_count(&self) -> usize {
        self.tags.as_ref().map_or(0, |t| t.len())
    }

    /// Connections recorded, possibly empty.
    pub fn has_connections(&self) -> bool {
        self.connections.is_some()
    }

    pub fn has_description(&self) -> bool {
        self.description.is_some()
    }
}
