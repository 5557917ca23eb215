//! Web chat UI served with axum
//!
//! ```text
//! GET  /             chat page
//! GET  /api/health
//! GET  /api/history  transcript, tier and model
//! POST /api/ask      {question, tier?}
//! POST /api/tier     {tier}
//! POST /api/clear
//! ```
//!
//! All handlers share one [`ChatSession`] behind a `tokio::sync::Mutex`, so
//! questions are answered one at a time.

mod api;
mod page;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{AskCsvError, Result};
use crate::session::ChatSession;

/// State injected into every handler
///
/// Cheap to clone; all fields are reference-counted.
#[derive(Clone)]
pub struct WebState {
    /// The chat session
    pub session: Arc<Mutex<ChatSession>>,
    /// Page title and header
    pub title: Arc<str>,
}

impl WebState {
    /// Wrap a session for sharing between handlers
    pub fn new(session: ChatSession, title: impl Into<Arc<str>>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            title: title.into(),
        }
    }
}

/// Build the application router
pub fn router(state: WebState) -> Router {
    Router::new()
        .route("/api/health", get(api::health))
        .route("/api/history", get(api::history))
        .route("/api/ask", post(api::ask))
        .route("/api/tier", post(api::select_tier))
        .route("/api/clear", post(api::clear))
        .route("/favicon.ico", get(|| async { StatusCode::NO_CONTENT }))
        .route("/", get(page::index))
        .with_state(state)
}

/// Serve the web UI until Ctrl-C
///
/// # Errors
///
/// Returns `AskCsvError::Server` if the address cannot be bound or the
/// server fails
pub async fn serve(config: &ServerConfig, session: ChatSession) -> Result<()> {
    let bind_addr = format!("{}:{}", config.host, config.port);
    let state = WebState::new(session, config.title.as_str());
    let router = router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| AskCsvError::Server(format!("bind failed on {bind_addr}: {e}")))?;

    info!(%bind_addr, "web UI listening");
    println!("askcsv web UI: http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AskCsvError::Server(format!("server error: {e}")))?;

    info!("web UI shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
