//! Server initialization for the stdio and streamable HTTP transports.
//!
//! Provides [`serve_stdio`], [`serve_streamable_http`] and [`serve_front_door`]
//! entry points that open the database and wire it into the MCP handler and
//! the HTTP front door.

use crate::config::KbaseConfig;
use crate::db;
use crate::http::{self, AppState};
use crate::tools::KnowledgeTools;
use anyhow::Result;
use rmcp::ServiceExt;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Open the database once for the whole process.
fn open_shared_db(config: &KbaseConfig) -> Result<Arc<Mutex<Connection>>> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "database ready");
    Ok(Arc::new(Mutex::new(conn)))
}

fn front_door_state(config: &KbaseConfig, db: Arc<Mutex<Connection>>) -> AppState {
    AppState::new(db, config.http.api_key())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM. A handler that fails to install
/// is logged and never fires.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("ctrl-c received, shutting down"),
        _ = terminate => tracing::info!("SIGTERM received, shutting down"),
    }
}

/// Start the MCP server over stdio transport. The HTTP front door runs
/// alongside when `http.enabled` is set.
pub async fn serve_stdio(config: KbaseConfig) -> Result<()> {
    tracing::info!("starting knowledge MCP server on stdio");

    let db = open_shared_db(&config)?;

    if config.http.enabled {
        let bind_addr = format!("{}:{}", config.http.host, config.http.port);
        let state = front_door_state(&config, Arc::clone(&db));
        tokio::spawn(async move {
            if let Err(e) = http::serve(&bind_addr, state).await {
                tracing::error!(error = %e, "HTTP front door stopped");
            }
        });
    }

    let tools = KnowledgeTools::new(db);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    let cancel = server.cancellation_token();
    tokio::spawn(async move {
        shutdown_signal().await;
        cancel.cancel();
    });

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over Streamable HTTP at `/mcp`. The front door routes
/// share the same listener.
pub async fn serve_streamable_http(config: KbaseConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(addr = %bind_addr, "starting knowledge MCP server on streamable HTTP");

    let db = open_shared_db(&config)?;
    let state = front_door_state(&config, Arc::clone(&db));

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(KnowledgeTools::new(Arc::clone(&db))),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = http::router(state).nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Run only the HTTP front door.
pub async fn serve_front_door(config: KbaseConfig) -> Result<()> {
    let db = open_shared_db(&config)?;
    let bind_addr = format!("{}:{}", config.http.host, config.http.port);
    http::serve(&bind_addr, front_door_state(&config, db)).await
}
