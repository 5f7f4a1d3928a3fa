use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::N2yoConfig;
use crate::observer::Observer;
use crate::provider::{
    default_categories, Category, Position, ProviderError, ProviderResult, SatelliteId,
    SatelliteProvider, SatelliteRecord, TleRecord,
};

/// Client for the N2YO REST API (`https://api.n2yo.com/rest/v1`).
pub struct N2yoProvider {
    client: Client,
    base_url: String,
    api_key: String,
    observer: Observer,
    search_radius_deg: u32,
}

#[derive(Debug, Deserialize)]
struct AboveResponse {
    #[serde(default)]
    above: Vec<AboveEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AboveEntry {
    satid: u32,
    satname: String,
    #[serde(default)]
    int_designator: Option<String>,
    #[serde(default)]
    launch_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PositionsResponse {
    #[serde(default)]
    positions: Vec<PositionEntry>,
}

#[derive(Debug, Deserialize)]
struct PositionEntry {
    satlatitude: f64,
    satlongitude: f64,
    sataltitude: f64,
    #[serde(default)]
    timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TleResponse {
    info: TleInfo,
    tle: String,
}

#[derive(Debug, Deserialize)]
struct TleInfo {
    satid: u32,
    #[serde(default)]
    satname: Option<String>,
}

impl From<AboveEntry> for SatelliteRecord {
    fn from(entry: AboveEntry) -> Self {
        SatelliteRecord {
            id: SatelliteId(entry.satid),
            name: entry.satname,
            designator: entry.int_designator.unwrap_or_default(),
            launch_date: entry.launch_date.unwrap_or_default(),
        }
    }
}

impl From<PositionEntry> for Position {
    fn from(entry: PositionEntry) -> Self {
        Position {
            latitude: entry.satlatitude,
            longitude: entry.satlongitude,
            altitude_km: entry.sataltitude,
            timestamp: entry
                .timestamp
                .and_then(|t| DateTime::<Utc>::from_timestamp(t, 0)),
        }
    }
}

impl N2yoProvider {
    pub fn new(
        config: &N2yoConfig,
        api_key: impl Into<String>,
        observer: Observer,
    ) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            observer,
            search_radius_deg: config.search_radius_deg,
        })
    }

    fn observer_path(&self) -> String {
        format!(
            "{}/{}/{}",
            self.observer.latitude_deg, self.observer.longitude_deg, self.observer.altitude_m
        )
    }

    /// Full request URL. N2YO expects the key glued on as `&apiKey=`; the
    /// path decides whether a slash precedes it.
    fn url(&self, path: &str) -> String {
        format!("{}/{}&apiKey={}", self.base_url, path, self.api_key)
    }

    fn above_url(&self, category: u32) -> String {
        self.url(&format!(
            "satellite/above/{}/{}/{}/",
            self.observer_path(),
            self.search_radius_deg,
            category
        ))
    }

    fn positions_url(&self, id: SatelliteId, seconds: u32) -> String {
        self.url(&format!(
            "satellite/positions/{}/{}/{}/",
            id,
            self.observer_path(),
            seconds.max(1)
        ))
    }

    fn tle_url(&self, id: SatelliteId) -> String {
        self.url(&format!("satellite/tle/{}", id))
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> ProviderResult<T> {
        log::debug!("Fetching {}", url.split("&apiKey=").next().unwrap_or(url));

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body: serde_json::Value = response.json().await?;
        decode(body)
    }
}

/// N2YO reports some failures (bad key, quota) as `{"error": ...}` with a 200.
fn decode<T: DeserializeOwned>(body: serde_json::Value) -> ProviderResult<T> {
    if let Some(message) = body.get("error").and_then(|e| e.as_str()) {
        return Err(ProviderError::Rejected(message.to_string()));
    }
    serde_json::from_value(body).map_err(|e| ProviderError::Malformed(e.to_string()))
}

#[async_trait]
impl SatelliteProvider for N2yoProvider {
    async fn categories(&self) -> ProviderResult<Vec<Category>> {
        Ok(default_categories())
    }

    async fn satellites_above(
        &self,
        category: u32,
        limit: usize,
    ) -> ProviderResult<Vec<SatelliteRecord>> {
        let response: AboveResponse = self.get(&self.above_url(category)).await?;
        log::info!(
            "Fetched {} satellites for category {}",
            response.above.len(),
            category
        );
        Ok(response
            .above
            .into_iter()
            .take(limit)
            .map(SatelliteRecord::from)
            .collect())
    }

    async fn positions(&self, id: SatelliteId, seconds: u32) -> ProviderResult<Vec<Position>> {
        let response: PositionsResponse = self.get(&self.positions_url(id, seconds)).await?;
        Ok(response.positions.into_iter().map(Position::from).collect())
    }

    async fn tle(&self, id: SatelliteId) -> ProviderResult<TleRecord> {
        let response: TleResponse = self.get(&self.tle_url(id)).await?;
        Ok(TleRecord {
            id: SatelliteId(response.info.satid),
            name: response.info.satname,
            tle: response.tle,
        })
    }
}
