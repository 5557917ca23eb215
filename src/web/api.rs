//! Axum handlers for `/api/*` routes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::WebState;
use crate::error::AskCsvError;
use crate::model_tier::ModelTier;

#[derive(Deserialize)]
pub(super) struct AskRequest {
    question: String,
    #[serde(default)]
    tier: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct TierRequest {
    tier: String,
}

fn json_error(status: StatusCode, code: &str, msg: impl std::fmt::Display) -> Response {
    (
        status,
        Json(json!({ "error": code, "message": format!("{msg}") })),
    )
        .into_response()
}

fn parse_tier(raw: &str) -> Result<ModelTier, Response> {
    ModelTier::parse_str(raw).map_err(|e| json_error(StatusCode::BAD_REQUEST, "invalid_tier", e))
}

/// GET /api/health
pub(super) async fn health(State(state): State<WebState>) -> Response {
    let session = state.session.lock().await;
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "tier": session.tier(),
            "model": session.model(),
            "rows": session.frame().row_count(),
            "columns": session.frame().columns(),
        })),
    )
        .into_response()
}

/// GET /api/history
pub(super) async fn history(State(state): State<WebState>) -> Response {
    let session = state.session.lock().await;
    (
        StatusCode::OK,
        Json(json!({
            "title": &*state.title,
            "tier": session.tier(),
            "model": session.model(),
            "messages": session.transcript(),
        })),
    )
        .into_response()
}

/// POST /api/ask
///
/// Switches tier first when the request names one. Blank questions are
/// rejected before any tier change.
pub(super) async fn ask(State(state): State<WebState>, Json(req): Json<AskRequest>) -> Response {
    if req.question.trim().is_empty() {
        return json_error(
            StatusCode::BAD_REQUEST,
            "empty_question",
            AskCsvError::EmptyQuestion,
        );
    }

    let tier = match req.tier.as_deref().map(parse_tier).transpose() {
        Ok(tier) => tier,
        Err(response) => return response,
    };

    let mut session = state.session.lock().await;
    if let Some(tier) = tier {
        if let Err(e) = session.select_tier(tier) {
            warn!("tier switch failed: {e}");
            return json_error(StatusCode::BAD_GATEWAY, "provider_error", e);
        }
    }

    match session.ask(&req.question).await {
        Ok(answer) => (
            StatusCode::OK,
            Json(json!({
                "answer": answer.content,
                "usage": answer.usage,
                "tier": session.tier(),
                "model": session.model(),
            })),
        )
            .into_response(),
        Err(e) => {
            if matches!(
                e.downcast_ref::<AskCsvError>(),
                Some(AskCsvError::EmptyQuestion)
            ) {
                return json_error(StatusCode::BAD_REQUEST, "empty_question", e);
            }
            warn!("question failed: {e}");
            json_error(StatusCode::BAD_GATEWAY, "agent_error", e)
        }
    }
}

/// POST /api/tier
pub(super) async fn select_tier(
    State(state): State<WebState>,
    Json(req): Json<TierRequest>,
) -> Response {
    let tier = match parse_tier(&req.tier) {
        Ok(tier) => tier,
        Err(response) => return response,
    };

    let mut session = state.session.lock().await;
    match session.select_tier(tier) {
        Ok(rebuilt) => (
            StatusCode::OK,
            Json(json!({
                "tier": session.tier(),
                "model": session.model(),
                "rebuilt": rebuilt,
            })),
        )
            .into_response(),
        Err(e) => {
            warn!("tier switch failed: {e}");
            json_error(StatusCode::BAD_GATEWAY, "provider_error", e)
        }
    }
}

/// POST /api/clear
pub(super) async fn clear(State(state): State<WebState>) -> Response {
    state.session.lock().await.clear();
    (StatusCode::OK, Json(json!({ "cleared": true }))).into_response()
}
