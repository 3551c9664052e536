use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetKnowledgeParams {
    #[schemars(description = "Entry ID")]
    pub id: i64,
}
