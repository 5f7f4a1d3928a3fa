use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::provider::{SatelliteId, SatelliteRecord};

/// Static metadata of a tracked satellite. Never mutated once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TrackedSatellite {
    pub id: SatelliteId,
    pub name: String,
    pub designator: String,
    pub launch_date: String,
}

impl From<SatelliteRecord> for TrackedSatellite {
    fn from(record: SatelliteRecord) -> Self {
        TrackedSatellite {
            id: record.id,
            name: record.name,
            designator: record.designator,
            launch_date: record.launch_date,
        }
    }
}

/// The satellites currently tracked, keyed by id.
///
/// Only ever replaced as a whole; every replacement bumps `generation` so
/// responses to requests issued against an older set can be recognised.
#[derive(Debug, Default)]
pub struct TrackingSet {
    satellites: BTreeMap<SatelliteId, TrackedSatellite>,
    generation: u64,
}

impl TrackingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = SatelliteRecord>,
    {
        let satellites = records
            .into_iter()
            .map(|r| (r.id, TrackedSatellite::from(r)))
            .collect();
        self.satellites = satellites;
        self.generation += 1;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, id: SatelliteId) -> Option<&TrackedSatellite> {
        self.satellites.get(&id)
    }

    /// Looks `id` up only if the set has not been replaced since `generation`.
    pub fn get_current(&self, id: SatelliteId, generation: u64) -> Option<&TrackedSatellite> {
        if generation != self.generation {
            return None;
        }
        self.get(id)
    }

    pub fn contains(&self, id: SatelliteId) -> bool {
        self.satellites.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.satellites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.satellites.is_empty()
    }

    /// Ids refreshed by one cycle: the first `limit` in iteration order.
    pub fn refresh_ids(&self, limit: usize) -> Vec<SatelliteId> {
        self.satellites.keys().take(limit).copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedSatellite> {
        self.satellites.values()
    }
}
