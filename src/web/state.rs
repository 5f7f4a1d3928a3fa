use std::sync::Arc;

use crate::config::Config;
use crate::map::Scene;
use crate::tracker::TrackingSession;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub session: TrackingSession<Scene>,
}
