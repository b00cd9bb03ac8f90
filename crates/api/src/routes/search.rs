use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use orgdesk_services::search::{DashboardQuery, Frame};
use tracing::debug;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

/// Name of the placeholder frame served while the index warms up.
pub const LOADING_FRAME: &str = "Loading";

pub async fn query(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Bytes,
) -> Result<Response, ApiError> {
    let readiness = state.search.is_ready(auth.org_id).await;
    if !readiness.is_ready {
        state.metrics.search_not_served(&readiness.reason);
        debug!(
            org_id = %auth.org_id,
            reason = %readiness.reason,
            "Search not ready, serving placeholder"
        );
        return frame_response(Frame::named(LOADING_FRAME));
    }

    let query: DashboardQuery = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("error parsing body: {e}")))?;

    let mut frames = state
        .search
        .dashboard_query(&auth, auth.org_id, query)
        .await
        .map_err(|e| ApiError::internal("error handling search request", e))?;

    if frames.len() != 1 {
        return Err(ApiError::internal(
            "invalid search response",
            format!("expected exactly one frame, got {}", frames.len()),
        ));
    }
    let frame = frames.remove(0);

    frame_response(frame)
}

fn frame_response(frame: Frame) -> Result<Response, ApiError> {
    let bytes = serde_json::to_vec(&frame)
        .map_err(|e| ApiError::internal("error marshalling response", e))?;
    Ok(([(header::CONTENT_TYPE, "application/json")], bytes).into_response())
}
