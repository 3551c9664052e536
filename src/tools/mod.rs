//! MCP surface: the nine knowledge tools and the `context://` resources.
//!
//! [`KnowledgeTools`] adapts the protocol to the [`dispatch`] function. Tool
//! calls run on the blocking pool with the shared connection locked for the
//! duration of one call.

pub mod add_knowledge;
pub mod create_context;
pub mod delete_knowledge;
pub mod dispatch;
pub mod get_knowledge;
pub mod no_params;
pub mod search_knowledge;
pub mod update_knowledge;

pub use dispatch::{dispatch, DispatchError, Envelope, Operation};

use rmcp::model::*;
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler};
use rusqlite::Connection;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::{Arc, Mutex};

use crate::knowledge::contexts::{self, ContextListing};
use crate::knowledge::KnowledgeError;

/// The MCP handler. Holds the shared database handle; each MCP session gets a
/// clone.
#[derive(Clone)]
pub struct KnowledgeTools {
    db: Arc<Mutex<Connection>>,
}

impl KnowledgeTools {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }

    /// Run a closure against the locked connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, McpError>
    where
        F: FnOnce(&mut Connection) -> T + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut conn = db
                .lock()
                .map_err(|e| McpError::internal_error(format!("db lock poisoned: {e}"), None))?;
            Ok(f(&mut conn))
        })
        .await
        .map_err(|e| McpError::internal_error(format!("db task failed: {e}"), None))?
    }

    fn to_mcp_tool(op: Operation) -> Tool {
        Tool {
            name: Cow::Borrowed(op.as_str()),
            title: None,
            description: Some(Cow::Borrowed(op.description())),
            input_schema: Arc::new(op.input_schema()),
            output_schema: None,
            annotations: None,
            execution: None,
            icons: None,
            meta: None,
        }
    }

    /// Run one tool call. Failure envelopes are tool results with `isError`
    /// set; only an unknown tool name is a protocol error.
    pub async fn call(&self, name: &str, arguments: Value) -> Result<CallToolResult, McpError> {
        tracing::info!(tool = %name, "tool called");

        let tool = name.to_string();
        let outcome = self
            .with_conn(move |conn| dispatch(conn, &tool, arguments))
            .await?;

        match outcome {
            Ok(envelope) => Ok(tool_result(&envelope)),
            Err(err) => {
                tracing::warn!(tool = %name, "unknown tool requested");
                Err(dispatch_error(err))
            }
        }
    }

    /// Every saved context as a resource.
    pub async fn context_resources(&self) -> Result<Vec<Resource>, McpError> {
        let listed = self
            .with_conn(|conn| contexts::list_contexts(conn))
            .await?
            .map_err(resource_error)?;
        Ok(listed.into_iter().map(context_resource).collect())
    }

    /// Resolve a `context://<name>` URI to the context and its live entries.
    pub async fn read_context(&self, uri: &str) -> Result<ReadResourceResult, McpError> {
        let name = contexts::parse_context_uri(uri)
            .ok_or_else(|| {
                McpError::new(
                    ErrorCode::RESOURCE_NOT_FOUND,
                    format!("unsupported resource URI: {uri}"),
                    None,
                )
            })?
            .to_string();

        tracing::info!(context = %name, "resource read");

        let resolved = self
            .with_conn(move |conn| contexts::resolve_context(conn, &name))
            .await?
            .map_err(resource_error)?;

        let text = serde_json::to_string_pretty(&resolved)
            .map_err(|e| McpError::internal_error(format!("serialization failed: {e}"), None))?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, uri)],
        })
    }
}

fn tool_result(envelope: &Envelope) -> CallToolResult {
    let content = vec![Content::text(envelope.to_pretty_string())];
    if envelope.is_success() {
        CallToolResult::success(content)
    } else {
        CallToolResult::error(content)
    }
}

fn dispatch_error(err: DispatchError) -> McpError {
    match err {
        DispatchError::UnknownOperation(_) => {
            McpError::new(ErrorCode::METHOD_NOT_FOUND, err.to_string(), None)
        }
    }
}

fn resource_error(err: KnowledgeError) -> McpError {
    match err {
        KnowledgeError::NotFound(msg) => McpError::new(ErrorCode::RESOURCE_NOT_FOUND, msg, None),
        other => McpError::internal_error(other.to_string(), None),
    }
}

fn context_resource(ctx: ContextListing) -> Resource {
    let mut raw = RawResource::new(ctx.uri(), ctx.name.clone());
    raw.description = Some(
        ctx.description
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "Saved context".to_string()),
    );
    raw.mime_type = Some("application/json".to_string());
    raw.no_annotation()
}

impl ServerHandler for KnowledgeTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Knowledge base server. Use add_knowledge to store entries, search_knowledge \
                 to find them by text, category or tags, and create_context to group entries \
                 under a name readable as a context://<name> resource."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            ..Default::default()
        }
    }

    // ── Tools ────────────────────────────────────────────────────────────

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools = Operation::ALL.into_iter().map(Self::to_mcp_tool).collect();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        name.parse::<Operation>().ok().map(Self::to_mcp_tool)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = request
            .arguments
            .map(Value::Object)
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        self.call(&request.name, arguments).await
    }

    // ── Resources (contexts) ─────────────────────────────────────────────

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let resources = self.context_resources().await?;
        Ok(ListResourcesResult::with_all_items(resources))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        self.read_context(&request.uri).await
    }
}
