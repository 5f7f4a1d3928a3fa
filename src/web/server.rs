use axum::{routing::get, routing::post, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::map::Scene;
use crate::tracker::TrackingSession;

use super::api::satellites as satellite_handlers;
use super::api::session as session_handlers;
use super::api_doc::ApiDoc;
use super::state::AppState;
use super::ui::handlers as ui_handlers;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // UI routes
        .route("/", get(ui_handlers::dashboard))
        // Session API endpoints
        .route("/api/session", get(session_handlers::get_session))
        .route(
            "/api/session/category",
            post(session_handlers::select_category),
        )
        .route("/api/session/limit", post(session_handlers::change_limit))
        // Satellite API endpoints
        .route("/api/categories", get(satellite_handlers::list_categories))
        .route(
            "/api/satellite/{id}/popup/open",
            post(satellite_handlers::open_popup),
        )
        .route(
            "/api/satellite/{id}/popup/close",
            post(satellite_handlers::close_popup),
        )
        .route(
            "/api/satellite/{id}/details",
            post(satellite_handlers::load_details),
        )
        // Static files
        .nest_service("/static", ServeDir::new("static"))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config, session: TrackingSession<Scene>) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();
    let state = AppState {
        config: Arc::new(config),
        session,
    };
    let app = build_router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await
}
