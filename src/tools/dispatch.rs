//! Tool dispatcher: routes an operation name and raw JSON arguments to the
//! knowledge engine and wraps the outcome in a response envelope.
//!
//! Every domain outcome (success, validation failure, missing entry, storage
//! fault) comes back as an [`Envelope`]. Only an unrecognized operation name
//! escapes as a [`DispatchError`].

use rusqlite::Connection;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::add_knowledge::AddKnowledgeParams;
use super::create_context::CreateContextParams;
use super::delete_knowledge::DeleteKnowledgeParams;
use super::get_knowledge::GetKnowledgeParams;
use super::no_params::NoParams;
use super::search_knowledge::SearchKnowledgeParams;
use super::update_knowledge::UpdateKnowledgeParams;
use crate::knowledge::search::SearchQuery;
use crate::knowledge::{contexts, entries, search, stats, KnowledgeError};

/// Failure that is not a domain outcome and so cannot be expressed as an envelope.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Unknown tool: {0}")]
    UnknownOperation(String),
}

/// The nine tool operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AddKnowledge,
    SearchKnowledge,
    GetKnowledge,
    UpdateKnowledge,
    DeleteKnowledge,
    ListCategories,
    ListTags,
    CreateContext,
    GetStats,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Self::AddKnowledge,
        Self::SearchKnowledge,
        Self::GetKnowledge,
        Self::UpdateKnowledge,
        Self::DeleteKnowledge,
        Self::ListCategories,
        Self::ListTags,
        Self::CreateContext,
        Self::GetStats,
    ];

    /// Wire name of the tool.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddKnowledge => "add_knowledge",
            Self::SearchKnowledge => "search_knowledge",
            Self::GetKnowledge => "get_knowledge",
            Self::UpdateKnowledge => "update_knowledge",
            Self::DeleteKnowledge => "delete_knowledge",
            Self::ListCategories => "list_categories",
            Self::ListTags => "list_tags",
            Self::CreateContext => "create_context",
            Self::GetStats => "get_stats",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::AddKnowledge => "Add a new knowledge entry to the database",
            Self::SearchKnowledge => {
                "Search knowledge base with filters. Text matches title or content \
                 (case-insensitive); tags match any; results newest-updated first."
            }
            Self::GetKnowledge => "Get a specific knowledge entry by ID",
            Self::UpdateKnowledge => {
                "Update an existing knowledge entry. Only the fields given are changed."
            }
            Self::DeleteKnowledge => "Delete a knowledge entry",
            Self::ListCategories => "List all unique categories with entry counts",
            Self::ListTags => "List all unique tags with usage counts",
            Self::CreateContext => {
                "Create a named context with specific entries. Replaces any context with the same name. \
                 Contexts are readable as context://<name> resources."
            }
            Self::GetStats => "Get database statistics",
        }
    }

    /// JSON schema of the operation's arguments, generated from its parameter struct.
    pub fn input_schema(&self) -> Map<String, Value> {
        match self {
            Self::AddKnowledge => schema_of::<AddKnowledgeParams>(),
            Self::SearchKnowledge => schema_of::<SearchKnowledgeParams>(),
            Self::GetKnowledge => schema_of::<GetKnowledgeParams>(),
            Self::UpdateKnowledge => schema_of::<UpdateKnowledgeParams>(),
            Self::DeleteKnowledge => schema_of::<DeleteKnowledgeParams>(),
            Self::CreateContext => schema_of::<CreateContextParams>(),
            Self::ListCategories | Self::ListTags | Self::GetStats => schema_of::<NoParams>(),
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| DispatchError::UnknownOperation(s.to_string()))
    }
}

fn schema_of<T: JsonSchema>() -> Map<String, Value> {
    match serde_json::to_value(schemars::schema_for!(T)) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// The uniform response body: `{success: true, ...payload}` or
/// `{success: false, error, code}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Envelope(Map<String, Value>);

impl Envelope {
    fn success(payload: Value) -> Self {
        let mut body = Map::new();
        body.insert("success".into(), Value::Bool(true));
        if let Value::Object(fields) = payload {
            body.extend(fields);
        }
        Self(body)
    }

    fn failure(err: &KnowledgeError) -> Self {
        let mut body = Map::new();
        body.insert("success".into(), Value::Bool(false));
        body.insert("error".into(), Value::String(err.to_string()));
        body.insert("code".into(), Value::String(err.code().to_string()));
        Self(body)
    }

    pub fn is_success(&self) -> bool {
        self.0.get("success").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn to_pretty_string(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_default()
    }
}

/// Route one tool call.
///
/// The operation name is resolved first; an unknown name is the only error.
/// Everything after that, including argument-shape failures, is an envelope.
pub fn dispatch(
    conn: &mut Connection,
    operation: &str,
    arguments: Value,
) -> Result<Envelope, DispatchError> {
    let op: Operation = operation.parse()?;

    let envelope = match execute(conn, op, arguments) {
        Ok(payload) => Envelope::success(payload),
        Err(err) => {
            if err.is_storage_fault() {
                tracing::error!(operation = %op, error = %err, "storage fault");
            } else {
                tracing::info!(operation = %op, code = err.code(), error = %err, "tool call rejected");
            }
            Envelope::failure(&err)
        }
    };
    Ok(envelope)
}

fn execute(conn: &mut Connection, op: Operation, arguments: Value) -> crate::knowledge::Result<Value> {
    match op {
        Operation::AddKnowledge => {
            let params: AddKnowledgeParams = parse_args(arguments)?;
            let entry = entries::create_entry(conn, &params.into())?;
            Ok(json!({
                "id": entry.id,
                "message": format!("Added knowledge entry: \"{}\" in {}", entry.title, entry.category),
                "entry": entry,
            }))
        }
        Operation::SearchKnowledge => {
            let params: SearchKnowledgeParams = parse_args(arguments)?;
            let query = SearchQuery::from(params);
            let results = search::search_entries(conn, &query)?;
            Ok(json!({ "count": results.len(), "results": results }))
        }
        Operation::GetKnowledge => {
            let params: GetKnowledgeParams = parse_args(arguments)?;
            let entry = entries::get_entry(conn, params.id)?;
            Ok(json!({ "entry": entry }))
        }
        Operation::UpdateKnowledge => {
            let params: UpdateKnowledgeParams = parse_args(arguments)?;
            if params.id < 1 {
                return Err(KnowledgeError::validation("id must be a positive integer"));
            }
            let (id, patch) = params.into_patch();
            let entry = entries::update_entry(conn, id, &patch)?;
            Ok(json!({ "message": format!("Updated entry {id}"), "entry": entry }))
        }
        Operation::DeleteKnowledge => {
            let params: DeleteKnowledgeParams = parse_args(arguments)?;
            let deleted = entries::delete_entry(conn, params.id)?;
            let message = if deleted > 0 {
                format!("Deleted entry {}", params.id)
            } else {
                format!("Entry {} not found", params.id)
            };
            Ok(json!({ "deleted": deleted, "message": message }))
        }
        Operation::ListCategories => {
            let _: NoParams = parse_args(arguments)?;
            let categories = stats::list_categories(conn)?;
            Ok(json!({ "categories": categories }))
        }
        Operation::ListTags => {
            let _: NoParams = parse_args(arguments)?;
            let tags = stats::list_tags(conn)?;
            Ok(json!({ "tags": tags }))
        }
        Operation::CreateContext => {
            let params: CreateContextParams = parse_args(arguments)?;
            let entry_ids = params.entry_ids.unwrap_or_default();
            let summary = contexts::upsert_context(
                conn,
                &params.name,
                params.description.as_deref(),
                &entry_ids,
            )?;
            Ok(json!({
                "message": format!("Created/updated context \"{}\"", summary.name),
                "name": summary.name,
                "entry_count": summary.entry_count,
            }))
        }
        Operation::GetStats => {
            let _: NoParams = parse_args(arguments)?;
            let stats = stats::store_stats(conn)?;
            Ok(serde_json::to_value(stats)?)
        }
    }
}

/// Deserialize tool arguments; missing arguments are treated as `{}`.
fn parse_args<T: DeserializeOwned>(arguments: Value) -> crate::knowledge::Result<T> {
    let arguments = match arguments {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(arguments)
        .map_err(|e| KnowledgeError::validation(format!("invalid arguments: {e}")))
}
