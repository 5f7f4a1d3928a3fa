use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::provider::{Category, SatelliteId};
use crate::tracker::DetailOutcome;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct DetailResponse {
    pub id: SatelliteId,
    pub outcome: DetailOutcome,
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "Selectable satellite categories", body = Vec<Category>),
        (status = 502, description = "Provider failure", body = ErrorResponse)
    ),
    tag = "satellites"
)]
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    let cached = state.session.categories();
    if !cached.is_empty() {
        return Ok(Json(cached));
    }
    Ok(Json(state.session.load_categories().await?))
}

#[utoipa::path(
    post,
    path = "/api/satellite/{id}/popup/open",
    params(("id" = u32, Path, description = "NORAD id")),
    responses(
        (status = 204, description = "Popup opened"),
        (status = 404, description = "Satellite has no marker", body = ErrorResponse)
    ),
    tag = "satellites"
)]
pub async fn open_popup(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> ApiResult<StatusCode> {
    if state.session.open_popup(SatelliteId(id)) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("marker_not_found"))
    }
}

#[utoipa::path(
    post,
    path = "/api/satellite/{id}/popup/close",
    params(("id" = u32, Path, description = "NORAD id")),
    responses(
        (status = 204, description = "Popup closed"),
        (status = 404, description = "Satellite has no marker", body = ErrorResponse)
    ),
    tag = "satellites"
)]
pub async fn close_popup(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> ApiResult<StatusCode> {
    if state.session.close_popup(SatelliteId(id)) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("marker_not_found"))
    }
}

#[utoipa::path(
    post,
    path = "/api/satellite/{id}/details",
    params(("id" = u32, Path, description = "NORAD id")),
    responses(
        (status = 200, description = "Details merged, or skipped because the popup is closed", body = DetailResponse),
        (status = 502, description = "Provider failure", body = ErrorResponse)
    ),
    tag = "satellites"
)]
pub async fn load_details(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> ApiResult<Json<DetailResponse>> {
    let id = SatelliteId(id);
    let outcome = state.session.load_details(id).await?;
    Ok(Json(DetailResponse { id, outcome }))
}
