//! MCP `update_knowledge` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::knowledge::types::{EntryPatch, Metadata};

/// Parameters for the `update_knowledge` MCP tool.
///
/// Only the fields present are changed. At least one must be given.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UpdateKnowledgeParams {
    #[schemars(description = "Entry ID", range(min = 1))]
    pub id: i64,

    #[schemars(description = "New category")]
    pub category: Option<String>,

    #[schemars(description = "New title")]
    pub title: Option<String>,

    #[schemars(description = "New content")]
    pub content: Option<String>,

    /// Replaces the whole tag list.
    #[schemars(description = "New tags (replaces the existing list)")]
    pub tags: Option<Vec<String>>,

    /// Replaces the whole metadata object.
    #[schemars(description = "New metadata (replaces the existing object)")]
    pub metadata: Option<Metadata>,
}

impl UpdateKnowledgeParams {
    /// Split into the target id and the patch to apply.
    pub fn into_patch(self) -> (i64, EntryPatch) {
        let patch = EntryPatch {
            category: self.category,
            title: self.title,
            content: self.content,
            tags: self.tags,
            metadata: self.metadata,
        };
        (self.id, patch)
    }
}
