use axum::{extract::State, response::IntoResponse};

use crate::web::state::AppState;

use super::templates::DashboardTemplate;

pub async fn dashboard(State(state): State<AppState>) -> impl IntoResponse {
    let config = &state.config;
    let observer = config.observer().unwrap_or_default();
    DashboardTemplate {
        tile_url: config.map.tile_url.clone(),
        observer_lat: observer.latitude_deg,
        observer_lon: observer.longitude_deg,
        zoom: config.map.zoom,
        update_interval_ms: config.refresh.interval.as_millis(),
        default_limit: state.session.limit(),
    }
}
