use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::provider::{
    default_categories, Category, Position, ProviderError, ProviderResult, SatelliteId,
    SatelliteProvider, SatelliteRecord, TleRecord,
};

/// In-memory provider with scripted responses, for tests and offline runs.
///
/// Unscripted ids answer with empty lists, which the tracker treats as
/// "no data" rather than a transport failure.
#[derive(Default)]
pub struct MemoryProvider {
    data: Mutex<MemoryData>,
}

#[derive(Default)]
struct MemoryData {
    categories: Option<ProviderResult<Vec<Category>>>,
    listings: HashMap<u32, ProviderResult<Vec<SatelliteRecord>>>,
    positions: HashMap<SatelliteId, ProviderResult<Position>>,
    trajectories: HashMap<SatelliteId, ProviderResult<Vec<Position>>>,
    tles: HashMap<SatelliteId, ProviderResult<String>>,
    latency: HashMap<SatelliteId, Duration>,
    position_calls: HashMap<SatelliteId, usize>,
    listing_calls: usize,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn data(&self) -> MutexGuard<'_, MemoryData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_categories(&self, result: ProviderResult<Vec<Category>>) {
        self.data().categories = Some(result);
    }

    pub fn set_listing(&self, category: u32, records: Vec<SatelliteRecord>) {
        self.data().listings.insert(category, Ok(records));
    }

    pub fn fail_listing(&self, category: u32, err: ProviderError) {
        self.data().listings.insert(category, Err(err));
    }

    pub fn set_position(&self, id: SatelliteId, position: Position) {
        self.data().positions.insert(id, Ok(position));
    }

    pub fn fail_position(&self, id: SatelliteId, err: ProviderError) {
        self.data().positions.insert(id, Err(err));
    }

    pub fn set_trajectory(&self, id: SatelliteId, points: Vec<Position>) {
        self.data().trajectories.insert(id, Ok(points));
    }

    pub fn fail_trajectory(&self, id: SatelliteId, err: ProviderError) {
        self.data().trajectories.insert(id, Err(err));
    }

    pub fn set_tle(&self, id: SatelliteId, tle: impl Into<String>) {
        self.data().tles.insert(id, Ok(tle.into()));
    }

    pub fn fail_tle(&self, id: SatelliteId, err: ProviderError) {
        self.data().tles.insert(id, Err(err));
    }

    /// Delays every position/trajectory/TLE answer for `id`.
    pub fn set_latency(&self, id: SatelliteId, latency: Duration) {
        self.data().latency.insert(id, latency);
    }

    pub fn position_calls(&self, id: SatelliteId) -> usize {
        self.data().position_calls.get(&id).copied().unwrap_or(0)
    }

    pub fn listing_calls(&self) -> usize {
        self.data().listing_calls
    }

    async fn delay(&self, id: SatelliteId) {
        let latency = self.data().latency.get(&id).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl SatelliteProvider for MemoryProvider {
    async fn categories(&self) -> ProviderResult<Vec<Category>> {
        let scripted = self.data().categories.clone();
        scripted.unwrap_or_else(|| Ok(default_categories()))
    }

    async fn satellites_above(
        &self,
        category: u32,
        limit: usize,
    ) -> ProviderResult<Vec<SatelliteRecord>> {
        let listing = {
            let mut data = self.data();
            data.listing_calls += 1;
            data.listings.get(&category).cloned()
        };
        match listing {
            Some(result) => result.map(|records| records.into_iter().take(limit).collect()),
            None => Ok(Vec::new()),
        }
    }

    async fn positions(&self, id: SatelliteId, seconds: u32) -> ProviderResult<Vec<Position>> {
        self.delay(id).await;
        let mut data = self.data();
        if seconds <= 1 {
            *data.position_calls.entry(id).or_default() += 1;
            return match data.positions.get(&id) {
                Some(Ok(position)) => Ok(vec![*position]),
                Some(Err(e)) => Err(e.clone()),
                None => Ok(Vec::new()),
            };
        }
        data.trajectories
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn tle(&self, id: SatelliteId) -> ProviderResult<TleRecord> {
        self.delay(id).await;
        let scripted = self.data().tles.get(&id).cloned();
        match scripted {
            Some(result) => result.map(|tle| TleRecord { id, name: None, tle }),
            None => Err(ProviderError::EmptyPayload("element set")),
        }
    }
}
