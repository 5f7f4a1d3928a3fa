use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinSet;
use utoipa::ToSchema;

use super::banner::ErrorBanner;
use super::overlay::{OverlayRegistry, OverlaySummary};
use super::parsing::{parse_details, parse_limit, DEFAULT_LIMIT};
use super::tracking_set::{TrackedSatellite, TrackingSet};
use crate::map::{LatLng, MapWidget};
use crate::provider::{
    Category, ProviderError, ProviderResult, SatelliteId, SatelliteProvider,
};

pub const DEFAULT_TRAJECTORY_SECONDS: u32 = 300;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub default_limit: usize,
    pub trajectory_seconds: u32,
    /// Fetch and draw the forecast line after each position update.
    pub trajectory: bool,
    /// Allow element-set lookups for open popups.
    pub details: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            trajectory_seconds: DEFAULT_TRAJECTORY_SECONDS,
            trajectory: true,
            details: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DetailOutcome {
    Merged,
    PopupClosed,
    Disabled,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSnapshot {
    pub category: Option<u32>,
    pub limit: usize,
    pub generation: u64,
    pub satellites: Vec<TrackedSatellite>,
    pub overlays: Vec<OverlaySummary>,
    pub error: Option<String>,
    pub errors_shown: u64,
    pub categories: Vec<Category>,
}

struct SessionState<M: MapWidget> {
    tracking: TrackingSet,
    overlays: OverlayRegistry<M>,
    banner: ErrorBanner,
    limit: usize,
    category: Option<u32>,
    categories: Vec<Category>,
}

struct Inner<M: MapWidget> {
    provider: Arc<dyn SatelliteProvider>,
    options: SessionOptions,
    state: Mutex<SessionState<M>>,
}

/// One user's tracking state: tracked satellites, their overlays and the
/// error banner. Cloning yields another handle to the same session.
///
/// All state sits behind one mutex that is never held across a fetch. Every
/// continuation re-checks membership before touching overlays, so responses
/// for satellites that left tracking while in flight are dropped.
pub struct TrackingSession<M: MapWidget> {
    inner: Arc<Inner<M>>,
}

impl<M: MapWidget> Clone for TrackingSession<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<M: MapWidget> TrackingSession<M> {
    pub fn new(provider: Arc<dyn SatelliteProvider>, map: M, options: SessionOptions) -> Self {
        let limit = options.default_limit.max(1);
        Self {
            inner: Arc::new(Inner {
                provider,
                options,
                state: Mutex::new(SessionState {
                    tracking: TrackingSet::new(),
                    overlays: OverlayRegistry::new(map),
                    banner: ErrorBanner::default(),
                    limit,
                    category: None,
                    categories: Vec::new(),
                }),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState<M>> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn center_map(&self, center: LatLng, zoom: u8) {
        self.state().overlays.map_mut().set_view(center, zoom);
    }

    /// Surfaces `message` in the banner, replacing whatever was shown.
    pub fn show_error(&self, message: impl Into<String>) {
        self.state().banner.show(message);
    }

    pub async fn load_categories(&self) -> ProviderResult<Vec<Category>> {
        match self.inner.provider.categories().await {
            Ok(categories) => {
                info!("Loaded {} categories", categories.len());
                self.state().categories = categories.clone();
                Ok(categories)
            }
            Err(e) => {
                error!("Error fetching categories: {}", e);
                self.show_error(format!("Error fetching categories: {}", e));
                Err(e)
            }
        }
    }

    /// Replaces the tracked set with `category`, capped at `limit`, then
    /// refreshes once. On failure nothing tracked or drawn changes.
    pub async fn select_category(&self, category: u32, limit: usize) -> ProviderResult<usize> {
        let limit = if limit == 0 {
            self.inner.options.default_limit
        } else {
            limit
        };
        info!("Fetching satellites for category {} (limit {})", category, limit);

        let fetched = self
            .inner
            .provider
            .satellites_above(category, limit)
            .await
            .and_then(|records| {
                if records.is_empty() {
                    Err(ProviderError::EmptyPayload("satellite"))
                } else {
                    Ok(records)
                }
            });

        let records = match fetched {
            Ok(records) => records,
            Err(e) => {
                error!("Error fetching satellites ({}): {}", e.kind(), e);
                let message = if e.is_empty_payload() {
                    "No satellite data received. Please try again later.".to_string()
                } else {
                    format!("Error fetching satellites: {}", e)
                };
                self.show_error(message);
                return Err(e);
            }
        };

        let tracked = {
            let mut state = self.state();
            // Old overlays go before anything is fetched for the new set.
            state.overlays.clear();
            state.tracking.replace(records.into_iter().take(limit));
            state.limit = limit;
            state.category = Some(category);
            info!(
                "Tracking {} satellites (generation {})",
                state.tracking.len(),
                state.tracking.generation()
            );
            state.tracking.len()
        };

        self.tick().await;
        Ok(tracked)
    }

    /// Applies a raw limit input by re-selecting the current category.
    pub async fn change_limit(&self, raw: &str) -> ProviderResult<usize> {
        let limit = parse_limit(raw);
        let category = self.state().category.unwrap_or(0);
        self.select_category(category, limit).await
    }

    /// One refresh cycle over the first `limit` tracked ids. Each id is an
    /// independent task; failures stay with their id. Resolves once every
    /// task has finished.
    pub async fn tick(&self) {
        let (generation, ids) = {
            let state = self.state();
            (
                state.tracking.generation(),
                state.tracking.refresh_ids(state.limit),
            )
        };
        debug!("Updating {} satellite positions", ids.len());

        let mut tasks = JoinSet::new();
        for id in ids {
            let session = self.clone();
            tasks.spawn(async move { session.refresh_one(id, generation).await });
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!("Refresh task failed: {}", e);
            }
        }
    }

    async fn refresh_one(&self, id: SatelliteId, generation: u64) {
        let fetched = self
            .inner
            .provider
            .positions(id, 1)
            .await
            .and_then(|positions| {
                positions
                    .into_iter()
                    .next()
                    .ok_or(ProviderError::EmptyPayload("position"))
            });

        let position = match fetched {
            Ok(position) => position,
            Err(e) => {
                error!("Error updating satellite position {}: {}", id, e);
                self.surface_if_current(id, generation, || {
                    format!("Error updating satellite position: {}", e)
                });
                return;
            }
        };

        {
            let mut state = self.state();
            let Some(satellite) = state.tracking.get_current(id, generation).cloned() else {
                debug!("Dropping position for {}: no longer tracked", id);
                return;
            };
            state.overlays.upsert_marker(&satellite, &position);
        }

        if self.inner.options.trajectory {
            self.refresh_trajectory(id, generation).await;
        }
    }

    async fn refresh_trajectory(&self, id: SatelliteId, generation: u64) {
        let seconds = self.inner.options.trajectory_seconds;
        match self.inner.provider.positions(id, seconds).await {
            Ok(points) if points.is_empty() => {
                debug!("No trajectory available for {} yet", id);
            }
            Ok(points) => {
                let mut state = self.state();
                if state.tracking.get_current(id, generation).is_none() {
                    debug!("Dropping trajectory for {}: no longer tracked", id);
                    return;
                }
                state.overlays.replace_trajectory(id, &points);
            }
            Err(e) => {
                error!("Error fetching satellite trajectory {}: {}", id, e);
                self.surface_if_current(id, generation, || {
                    format!("Error fetching satellite trajectory: {}", e)
                });
            }
        }
    }

    fn surface_if_current(
        &self,
        id: SatelliteId,
        generation: u64,
        message: impl FnOnce() -> String,
    ) {
        let mut state = self.state();
        if state.tracking.get_current(id, generation).is_some() {
            state.banner.show(message());
        }
    }

    /// Loads the element set for `id` into its popup. A popup that is closed
    /// before or while loading makes this a silent no-op.
    pub async fn load_details(&self, id: SatelliteId) -> ProviderResult<DetailOutcome> {
        if !self.inner.options.details {
            return Ok(DetailOutcome::Disabled);
        }
        let open = self.state().overlays.popup_open(id);
        if !open {
            debug!("Popup for {} is closed; skipping details", id);
            return Ok(DetailOutcome::PopupClosed);
        }

        info!("Loading details for satellite {}", id);
        let fetched = self
            .inner
            .provider
            .tle(id)
            .await
            .and_then(|record| parse_details(&record.tle));

        let mut state = self.state();
        match fetched {
            Ok(details) => {
                if state.overlays.merge_details(id, details) {
                    Ok(DetailOutcome::Merged)
                } else {
                    debug!("Popup for {} closed before details arrived", id);
                    Ok(DetailOutcome::PopupClosed)
                }
            }
            Err(e) if !state.overlays.popup_open(id) => {
                warn!("Details for {} failed after popup closed: {}", id, e);
                Ok(DetailOutcome::PopupClosed)
            }
            Err(e) => {
                error!("Error loading satellite details {}: {}", id, e);
                state
                    .banner
                    .show(format!("Error loading satellite details: {}", e));
                Err(e)
            }
        }
    }

    pub fn open_popup(&self, id: SatelliteId) -> bool {
        self.state().overlays.open_popup(id)
    }

    pub fn close_popup(&self, id: SatelliteId) -> bool {
        self.state().overlays.close_popup(id)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            category: state.category,
            limit: state.limit,
            generation: state.tracking.generation(),
            satellites: state.tracking.iter().cloned().collect(),
            overlays: state.overlays.summaries(),
            error: state.banner.message().map(String::from),
            errors_shown: state.banner.shown(),
            categories: state.categories.clone(),
        }
    }

    /// Runs `f` against the map widget under the session lock.
    pub fn with_map<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        f(self.state().overlays.map())
    }

    pub fn limit(&self) -> usize {
        self.state().limit
    }

    pub fn category(&self) -> Option<u32> {
        self.state().category
    }

    pub fn categories(&self) -> Vec<Category> {
        self.state().categories.clone()
    }

    pub fn generation(&self) -> u64 {
        self.state().tracking.generation()
    }

    pub fn tracked_ids(&self) -> Vec<SatelliteId> {
        self.state().tracking.iter().map(|s| s.id).collect()
    }

    pub fn overlay_ids(&self) -> Vec<SatelliteId> {
        self.state().overlays.ids()
    }

    pub fn trail_len(&self, id: SatelliteId) -> Option<usize> {
        self.state().overlays.trail_len(id)
    }

    pub fn trail_points(&self, id: SatelliteId) -> Option<Vec<LatLng>> {
        self.state().overlays.trail_points(id).map(<[LatLng]>::to_vec)
    }

    pub fn trajectory_len(&self, id: SatelliteId) -> Option<usize> {
        self.state().overlays.trajectory_len(id)
    }

    pub fn error_message(&self) -> Option<String> {
        self.state().banner.message().map(String::from)
    }

    pub fn errors_shown(&self) -> u64 {
        self.state().banner.shown()
    }

    /// Position last drawn for `id`, read back from its trail.
    pub fn last_position(&self, id: SatelliteId) -> Option<LatLng> {
        self.state()
            .overlays
            .trail_points(id)
            .and_then(|points| points.last().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Scene;
    use crate::provider::{MemoryProvider, Position, SatelliteRecord};

    fn record(id: u32) -> SatelliteRecord {
        SatelliteRecord {
            id: SatelliteId(id),
            name: format!("SAT-{id}"),
            designator: String::new(),
            launch_date: String::new(),
        }
    }

    fn session(provider: &Arc<MemoryProvider>) -> TrackingSession<Scene> {
        TrackingSession::new(provider.clone(), Scene::new(), SessionOptions::default())
    }

    #[tokio::test]
    async fn zero_limit_falls_back_to_default() {
        let provider = Arc::new(MemoryProvider::new());
        provider.set_listing(0, (1..=8).map(record).collect());
        let session = session(&provider);

        assert_eq!(session.select_category(0, 0).await.unwrap(), 5);
        assert_eq!(session.limit(), 5);
    }

    #[tokio::test]
    async fn empty_listing_shows_no_data_message() {
        let provider = Arc::new(MemoryProvider::new());
        let session = session(&provider);

        let err = session.select_category(3, 5).await.unwrap_err();
        assert!(err.is_empty_payload());
        assert_eq!(
            session.error_message().as_deref(),
            Some("No satellite data received. Please try again later.")
        );
        assert!(session.category().is_none());
    }

    #[tokio::test]
    async fn trajectory_feature_can_be_disabled() {
        let provider = Arc::new(MemoryProvider::new());
        provider.set_listing(0, vec![record(1)]);
        provider.set_position(SatelliteId(1), Position::new(1.0, 1.0, 400.0));
        provider.set_trajectory(SatelliteId(1), vec![Position::new(1.0, 1.0, 400.0); 10]);
        let options = SessionOptions {
            trajectory: false,
            ..SessionOptions::default()
        };
        let session = TrackingSession::new(provider.clone(), Scene::new(), options);

        session.select_category(0, 5).await.unwrap();
        assert_eq!(session.trail_len(SatelliteId(1)), Some(1));
        assert!(session.trajectory_len(SatelliteId(1)).is_none());
    }

    #[tokio::test]
    async fn categories_are_cached_in_snapshot() {
        let provider = Arc::new(MemoryProvider::new());
        let session = session(&provider);
        let loaded = session.load_categories().await.unwrap();
        assert_eq!(session.snapshot().categories, loaded);

        provider.set_categories(Err(ProviderError::Status(500)));
        assert!(session.load_categories().await.is_err());
        assert_eq!(
            session.error_message().as_deref(),
            Some("Error fetching categories: HTTP error! status: 500")
        );
    }
}
