//! HTTP front door.
//!
//! A thin authenticated pass-through to the query and aggregation engines:
//!
//! | Method | Path      | Auth | Description |
//! |--------|-----------|------|-------------|
//! | GET    | `/health` | no   | Liveness check |
//! | GET    | `/stats`  | yes  | Store statistics |
//! | POST   | `/search` | yes  | Search entries (same body as `search_knowledge`) |
//!
//! When an API key is configured, authenticated routes require it in the
//! `x-api-key` header and answer `401` otherwise.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rusqlite::Connection;
use serde::Serialize;
use std::sync::{Arc, Mutex};

use crate::knowledge::search::SearchQuery;
use crate::knowledge::stats::StoreStats;
use crate::knowledge::types::KnowledgeEntry;
use crate::knowledge::{search, stats, KnowledgeError};
use crate::tools::search_knowledge::SearchKnowledgeParams;

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Shared state for the front door handlers.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(db: Arc<Mutex<Connection>>, api_key: Option<&str>) -> Self {
        Self {
            db,
            api_key: api_key.map(Arc::from),
        }
    }
}

/// Build the front door router.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/stats", get(handle_stats))
        .route("/search", post(handle_search))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/health", get(handle_health))
        .merge(protected)
        .with_state(state)
}

/// Bind and serve the front door until Ctrl-C.
pub async fn serve(bind_addr: &str, state: AppState) -> anyhow::Result<()> {
    let auth = if state.api_key.is_some() { "enabled" } else { "disabled" };
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %bind_addr, auth, "HTTP front door listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(crate::server::shutdown_signal())
        .await?;
    Ok(())
}

// ============ Errors ============

/// Error converted into a JSON `{error}` response.
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<KnowledgeError> for AppError {
    fn from(err: KnowledgeError) -> Self {
        let status = match err {
            KnowledgeError::Validation(_) => StatusCode::BAD_REQUEST,
            KnowledgeError::NotFound(_) => StatusCode::NOT_FOUND,
            KnowledgeError::Storage(_) | KnowledgeError::Encoding(_) => {
                tracing::error!(error = %err, "storage fault in HTTP handler");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

/// Run a store operation on the blocking pool with the connection locked.
async fn with_db<T, F>(state: &AppState, f: F) -> Result<T, AppError>
where
    F: FnOnce(&mut Connection) -> crate::knowledge::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db = Arc::clone(&state.db);
    tokio::task::spawn_blocking(move || {
        let mut conn = db
            .lock()
            .map_err(|e| AppError::internal(format!("db lock poisoned: {e}")))?;
        f(&mut conn).map_err(AppError::from)
    })
    .await
    .map_err(|e| AppError::internal(format!("db task failed: {e}")))?
}

// ============ Auth ============

async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(expected) = state.api_key.as_deref() {
        let provided = request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected) {
            tracing::warn!(path = %request.uri().path(), "rejected request without valid API key");
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorBody {
                    error: "Unauthorized".into(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

// ============ GET /health ============

#[derive(Debug, Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        service: env!("CARGO_PKG_NAME").into(),
        version: env!("CARGO_PKG_VERSION").into(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

// ============ GET /stats ============

async fn handle_stats(State(state): State<AppState>) -> Result<Json<StoreStats>, AppError> {
    let stats = with_db(&state, |conn| stats::store_stats(conn)).await?;
    Ok(Json(stats))
}

// ============ POST /search ============

#[derive(Debug, Serialize, serde::Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    pub count: usize,
    pub results: Vec<KnowledgeEntry>,
}

async fn handle_search(
    State(state): State<AppState>,
    body: Result<Json<SearchKnowledgeParams>, JsonRejection>,
) -> Result<Json<SearchResponse>, AppError> {
    let Json(params) = body.map_err(|rejection| AppError {
        status: StatusCode::BAD_REQUEST,
        message: rejection.body_text(),
    })?;
    let query = SearchQuery::from(params);

    let results = with_db(&state, move |conn| search::search_entries(conn, &query)).await?;
    Ok(Json(SearchResponse {
        success: true,
        count: results.len(),
        results,
    }))
}
