//! MCP `create_context` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `create_context` MCP tool.
///
/// Saving under an existing name replaces that context entirely.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreateContextParams {
    #[schemars(description = "Context name")]
    pub name: String,

    #[schemars(description = "Context description")]
    pub description: Option<String>,

    /// Ids of the entries to include. Accepts `entryIds` as well; absent or
    /// `null` means none.
    #[schemars(description = "IDs of entries to include")]
    #[serde(default, alias = "entryIds")]
    pub entry_ids: Option<Vec<i64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_entry_ids_mean_none() {
        let params: CreateContextParams =
            serde_json::from_value(json!({"name": "empty", "entryIds": null})).unwrap();
        assert!(params.entry_ids.unwrap_or_default().is_empty());
    }

    #[test]
    fn camel_case_alias_is_accepted() {
        let params: CreateContextParams =
            serde_json::from_value(json!({"name": "c", "entryIds": [3, 1]})).unwrap();
        assert_eq!(params.entry_ids, Some(vec![3, 1]));
    }
}
