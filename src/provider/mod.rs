//! Remote satellite data provider boundary.
//!
//! The tracker only ever talks to a [`SatelliteProvider`]; the N2YO REST
//! client and the in-memory provider are the two implementations.

mod catalog;
mod error;
mod memory;
mod n2yo;
mod types;

pub use catalog::default_categories;
pub use error::{FailureKind, ProviderError, ProviderResult};
pub use memory::MemoryProvider;
pub use n2yo::N2yoProvider;
pub use types::{Category, Position, SatelliteId, SatelliteRecord, TleRecord};

use async_trait::async_trait;

/// Lookup, position and element-set queries against a satellite data source.
///
/// Implementations return whatever the source returned; an empty list is not
/// an error at this layer; callers decide what "empty" means for them.
#[async_trait]
pub trait SatelliteProvider: Send + Sync {
    /// Category catalog used to populate the selection control.
    async fn categories(&self) -> ProviderResult<Vec<Category>>;

    /// Satellites currently above the observer in `category`, at most `limit`.
    async fn satellites_above(
        &self,
        category: u32,
        limit: usize,
    ) -> ProviderResult<Vec<SatelliteRecord>>;

    /// Positions for the next `seconds` seconds, one per second, starting now.
    async fn positions(&self, id: SatelliteId, seconds: u32) -> ProviderResult<Vec<Position>>;

    async fn tle(&self, id: SatelliteId) -> ProviderResult<TleRecord>;
}
