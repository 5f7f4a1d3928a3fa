use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::map::{Scene, SceneSnapshot};
use crate::tracker::SessionSnapshot;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: SessionSnapshot,
    pub scene: SceneSnapshot,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectCategoryRequest {
    pub category: u32,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Raw contents of the limit input; unusable values fall back to 5.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeLimitRequest {
    pub limit: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackingResponse {
    pub tracked: usize,
    pub limit: usize,
    pub generation: u64,
}

#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Tracked satellites, overlays and map layers", body = SessionView)
    ),
    tag = "session"
)]
pub async fn get_session(State(state): State<AppState>) -> Json<SessionView> {
    let session = state.session.snapshot();
    let scene = state.session.with_map(Scene::snapshot);
    Json(SessionView { session, scene })
}

#[utoipa::path(
    post,
    path = "/api/session/category",
    request_body = SelectCategoryRequest,
    responses(
        (status = 200, description = "Tracking set replaced", body = TrackingResponse),
        (status = 404, description = "Provider returned no satellites", body = ErrorResponse),
        (status = 502, description = "Provider failure", body = ErrorResponse)
    ),
    tag = "session"
)]
pub async fn select_category(
    State(state): State<AppState>,
    Json(request): Json<SelectCategoryRequest>,
) -> ApiResult<Json<TrackingResponse>> {
    let limit = request.limit.unwrap_or_else(|| state.session.limit());
    if limit == 0 {
        return Err(ApiError::Validation("limit must be at least 1".into()));
    }
    let tracked = state.session.select_category(request.category, limit).await?;
    Ok(Json(tracking_response(&state, tracked)))
}

#[utoipa::path(
    post,
    path = "/api/session/limit",
    request_body = ChangeLimitRequest,
    responses(
        (status = 200, description = "Tracking set replaced with the new cap", body = TrackingResponse),
        (status = 404, description = "Provider returned no satellites", body = ErrorResponse),
        (status = 502, description = "Provider failure", body = ErrorResponse)
    ),
    tag = "session"
)]
pub async fn change_limit(
    State(state): State<AppState>,
    Json(request): Json<ChangeLimitRequest>,
) -> ApiResult<Json<TrackingResponse>> {
    let tracked = state.session.change_limit(&request.limit).await?;
    Ok(Json(tracking_response(&state, tracked)))
}

fn tracking_response(state: &AppState, tracked: usize) -> TrackingResponse {
    TrackingResponse {
        tracked,
        limit: state.session.limit(),
        generation: state.session.generation(),
    }
}
