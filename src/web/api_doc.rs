use utoipa::OpenApi;

use super::api::error::ErrorResponse;
use super::api::satellites::DetailResponse;
use super::api::session::{
    ChangeLimitRequest, SelectCategoryRequest, SessionView, TrackingResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::session::get_session,
        super::api::session::select_category,
        super::api::session::change_limit,
        super::api::satellites::list_categories,
        super::api::satellites::open_popup,
        super::api::satellites::close_popup,
        super::api::satellites::load_details,
    ),
    components(
        schemas(
            SessionView,
            SelectCategoryRequest,
            ChangeLimitRequest,
            TrackingResponse,
            DetailResponse,
            ErrorResponse,
            crate::provider::Category,
            crate::provider::Position,
            crate::provider::SatelliteId,
            crate::tracker::SessionSnapshot,
            crate::tracker::OverlaySummary,
            crate::tracker::DetailOutcome,
            crate::tracker::TrackedSatellite,
            crate::map::SceneSnapshot,
            crate::map::SceneLayer,
            crate::map::Layer,
        )
    ),
    info(
        title = "Sat-O-Track API",
        description = "API for the live satellite tracking map",
        version = "0.1.0"
    ),
    tags(
        (name = "session", description = "Tracked category, limit and map state"),
        (name = "satellites", description = "Categories, popups and details")
    )
)]
pub struct ApiDoc;
