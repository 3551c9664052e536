//! Parameters for tools that take no arguments (`list_categories`,
//! `list_tags`, `get_stats`).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Accepts an empty object. Unknown keys are ignored.
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct NoParams {}
