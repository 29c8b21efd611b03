//! HTTP API endpoints.
//!
//! Judge devices post votes and pulses, the display polls status and the
//! latest pulse, and the host can reset the round or back up the ledger.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::error::{ErrorKind, LedgerError};
use crate::protocol::*;
use crate::state::export::{ImportError, LedgerExport};
use crate::state::AppState;

impl LedgerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownJudge(_) => StatusCode::NOT_FOUND,
            Self::InvalidPoints(_) => StatusCode::BAD_REQUEST,
            _ => match self.kind() {
                ErrorKind::Input => StatusCode::BAD_REQUEST,
                ErrorKind::StateConflict => StatusCode::CONFLICT,
                ErrorKind::Throttled => StatusCode::TOO_MANY_REQUESTS,
            },
        }
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_body())).into_response()
    }
}

/// Everything a handler can reject a request with
#[derive(Debug)]
pub enum ApiError {
    Ledger(LedgerError),
    BadRequest(String),
    Import(ImportError),
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        Self::Ledger(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::BadRequest(e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Ledger(e) => {
                tracing::warn!("Request rejected: {}", e);
                return e.into_response();
            }
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadRequest, msg),
            Self::Import(e) => (
                StatusCode::BAD_REQUEST,
                ErrorCode::InvalidImport,
                format!("Import failed: {}", e),
            ),
        };
        tracing::warn!("Request rejected: {}", message);

        (status, Json(ErrorBody::new(code, message))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// GET /api/status
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusSnapshot> {
    Json(state.snapshot().await)
}

/// Add points for a judge in the active round.
///
/// POST /api/vote
pub async fn vote(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> ApiResult<VoteResponse> {
    let Json(request) = payload?;
    tracing::debug!(
        judge_id = request.judge_id,
        requested_points = request.requested_points,
        request_id = ?request.request_id,
        session_id = ?request.session_id,
        "Vote received"
    );

    let resulting_points = state.apply_vote(request).await?;

    Ok(Json(VoteResponse {
        ok: true,
        resulting_points,
    }))
}

/// Record a cheer. Throttled per judge when a throttle is configured.
///
/// POST /api/pulse
pub async fn pulse(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PulseRequest>, JsonRejection>,
) -> ApiResult<PulseResponse> {
    let Json(request) = payload?;

    if let Some(throttle) = &state.pulse_throttle {
        if !throttle.allow(request.judge_id).await {
            return Err(LedgerError::RateLimited(request.judge_id).into());
        }
    }

    let pulse_id = state.append_pulse(request.judge_id).await?;
    Ok(Json(PulseResponse { ok: true, pulse_id }))
}

/// Start a new round.
///
/// POST /api/reset
pub async fn reset(State(state): State<Arc<AppState>>) -> Json<ResetResponse> {
    let session = state.reset().await;
    Json(ResetResponse {
        ok: true,
        round_number: session.round_number,
        session_id: session.id,
    })
}

/// GET /api/pulse/latest?after=<id>
pub async fn latest_pulse(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LatestPulseQuery>,
) -> Json<LatestPulseResponse> {
    Json(state.latest_pulse(query.after).await)
}

/// Export the entire ledger as JSON.
///
/// GET /api/state/export
pub async fn export_state(State(state): State<Arc<AppState>>) -> Json<LedgerExport> {
    Json(state.export_ledger().await)
}

/// Replace the ledger with an uploaded export.
///
/// POST /api/state/import
pub async fn import_state(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LedgerExport>, JsonRejection>,
) -> Response {
    let export = match payload {
        Ok(Json(export)) => export,
        Err(e) => return ApiError::from(e).into_response(),
    };

    match state.import_ledger(export).await {
        Ok(()) => Json(serde_json::json!({ "ok": true })).into_response(),
        Err(e) => {
            tracing::error!("State import failed: {}", e);
            ApiError::Import(e).into_response()
        }
    }
}

/// All routes with tracing, permissive CORS and a per-request timeout
pub fn build_router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/api/status", get(status))
        .route("/api/vote", post(vote))
        .route("/api/pulse", post(pulse))
        .route("/api/pulse/latest", get(latest_pulse))
        .route("/api/reset", post(reset))
        .route("/api/state/export", get(export_state))
        .route("/api/state/import", post(import_state))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            LedgerError::NoActiveSession.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            LedgerError::VoteCapExceeded { current_points: 3 }.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            LedgerError::UnknownJudge(7).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            LedgerError::InvalidPoints(4).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            LedgerError::RateLimited(1).status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[tokio::test]
    async fn test_vote_handler_maps_ledger_errors() {
        let state = Arc::new(AppState::new());
        let result = vote(
            State(state),
            Ok(Json(VoteRequest {
                judge_id: 1,
                requested_points: 1,
                request_id: None,
                session_id: None,
            })),
        )
        .await;

        match result {
            Err(ApiError::Ledger(LedgerError::NoActiveSession)) => {}
            other => panic!("unexpected result: {:?}", other.map(|j| j.0)),
        }
    }

    #[tokio::test]
    async fn test_reset_handler_starts_rounds() {
        let state = Arc::new(AppState::new());
        let first = reset(State(state.clone())).await;
        let second = reset(State(state)).await;
        assert_eq!(first.round_number, 1);
        assert_eq!(second.round_number, 2);
        assert_ne!(first.session_id, second.session_id);
    }
}
