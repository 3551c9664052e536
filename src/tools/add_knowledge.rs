//! MCP `add_knowledge` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::knowledge::types::{Metadata, NewEntry};

/// Parameters for the `add_knowledge` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AddKnowledgeParams {
    #[schemars(description = "Knowledge category (e.g., tech, personal, reference)")]
    pub category: String,

    #[schemars(description = "Entry title")]
    pub title: String,

    #[schemars(description = "Main content")]
    pub content: String,

    #[schemars(description = "Tags for categorization")]
    #[serde(default)]
    pub tags: Vec<String>,

    #[schemars(description = "Additional metadata (JSON object, stored verbatim)")]
    #[serde(default)]
    pub metadata: Metadata,
}

impl From<AddKnowledgeParams> for NewEntry {
    fn from(params: AddKnowledgeParams) -> Self {
        Self {
            category: params.category,
            title: params.title,
            content: params.content,
            tags: params.tags,
            metadata: params.metadata,
        }
    }
}
