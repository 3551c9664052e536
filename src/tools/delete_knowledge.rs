use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeleteKnowledgeParams {
    #[schemars(description = "Entry ID to delete")]
    pub id: i64,
}
