//! Presence lookup handlers.

use axum::Json;
use axum::extract::{Path, Query, State};

use kindred_core::types::UserId;
use kindred_realtime::presence::PresenceStatus;

use crate::dto::request::PresenceQuery;
use crate::dto::response::{ApiResponse, PresenceResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/presence?user_ids=a,b
pub async fn bulk_presence(
    State(state): State<AppState>,
    Query(query): Query<PresenceQuery>,
) -> Result<Json<ApiResponse<PresenceResponse>>, ApiError> {
    let user_ids = query.parse_user_ids()?;
    let users = state.realtime.gateway.bulk_presence(&user_ids);
    Ok(Json(ApiResponse::ok(PresenceResponse { users })))
}

/// GET /api/presence/{user_id}
pub async fn user_presence(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Json<ApiResponse<PresenceStatus>> {
    Json(ApiResponse::ok(state.realtime.gateway.presence_status(user_id)))
}
