//! Core record definitions.
//!
//! [`KnowledgeEntry`] mirrors a `knowledge_entries` row and [`Context`] a
//! `contexts` row. [`NewEntry`] and [`EntryPatch`] are the write-side inputs.

use serde::{Deserialize, Serialize};

/// Opaque metadata attached to an entry. Never inspected by the store.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A stored knowledge entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Store-assigned id, never reused.
    pub id: i64,
    pub category: String,
    pub title: String,
    pub content: String,
    /// Tags in the order they were given. Matching ignores order.
    pub tags: Vec<String>,
    pub metadata: Metadata,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// RFC 3339 timestamp of the last successful mutation.
    pub updated_at: String,
}

/// Fields for a new entry. `category`, `title` and `content` must be non-empty.
#[derive(Debug, Clone, Default)]
pub struct NewEntry {
    pub category: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub metadata: Metadata,
}

/// A partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub category: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub metadata: Option<Metadata>,
}

impl EntryPatch {
    /// `true` when no field would change.
    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.title.is_none()
            && self.content.is_none()
            && self.tags.is_none()
            && self.metadata.is_none()
    }
}

/// A named grouping of entry ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub name: String,
    pub description: Option<String>,
    /// Referenced entry ids. Not checked against `knowledge_entries`.
    pub entry_ids: Vec<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_patch_is_detected() {
        assert!(EntryPatch::default().is_empty());

        let patch = EntryPatch {
            tags: Some(vec![]),
            ..Default::default()
        };
        assert!(!patch.is_empty(), "an explicit empty tag list is still a change");
    }
}
