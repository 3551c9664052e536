//! MCP `search_knowledge` tool parameter definition. Also the body of the HTTP
//! `POST /search` endpoint.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::knowledge::search::{SearchQuery, DEFAULT_LIMIT};

/// Parameters for the `search_knowledge` MCP tool.
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct SearchKnowledgeParams {
    /// Substring matched case-insensitively against title and content.
    #[schemars(description = "Search query for title and content")]
    pub query: Option<String>,

    #[schemars(description = "Filter by category")]
    pub category: Option<String>,

    /// Matches entries carrying any of these tags.
    #[schemars(description = "Filter by tags (matches any)")]
    pub tags: Option<Vec<String>>,

    /// Maximum number of results (1–100). Defaults to 10.
    #[schemars(description = "Max results (1-100). Defaults to 10.", range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

impl From<SearchKnowledgeParams> for SearchQuery {
    fn from(params: SearchKnowledgeParams) -> Self {
        Self {
            text: params.query,
            category: params.category,
            tags: params.tags.unwrap_or_default(),
            limit: params.limit.unwrap_or(DEFAULT_LIMIT),
        }
    }
}
