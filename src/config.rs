use serde::{Deserialize, Deserializer};
use std::time::Duration;
use thiserror::Error;

use crate::observer::Observer;

pub const API_KEY_ENV: &str = "N2YO_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid observer coordinates: {0}")]
    InvalidCoordinates(String),
    #[error("no N2YO API key configured (set n2yo.api_key or {API_KEY_ENV})")]
    MissingApiKey,
    #[error("refresh.default_limit must be at least 1")]
    InvalidLimit,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub observer: ObserverConfig,
    #[serde(default)]
    pub n2yo: N2yoConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObserverConfig {
    #[serde(default = "default_coordinates")]
    pub coordinates: String,
    #[serde(default)]
    pub altitude_m: f64,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            coordinates: default_coordinates(),
            altitude_m: 0.0,
        }
    }
}

fn default_coordinates() -> String {
    "40.7128,-74.0060".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct N2yoConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_search_radius")]
    pub search_radius_deg: u32,
    #[serde(default = "default_timeout", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
}

impl Default for N2yoConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            search_radius_deg: default_search_radius(),
            timeout: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.n2yo.com/rest/v1".to_string()
}

fn default_search_radius() -> u32 {
    90
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_interval", deserialize_with = "deserialize_duration")]
    pub interval: Duration,
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_trajectory_seconds")]
    pub trajectory_seconds: u32,
    #[serde(default)]
    pub initial_category: u32,
    #[serde(default = "default_true")]
    pub trajectory: bool,
    #[serde(default = "default_true")]
    pub details: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            default_limit: default_limit(),
            trajectory_seconds: default_trajectory_seconds(),
            initial_category: 0,
            trajectory: true,
            details: true,
        }
    }
}

fn default_interval() -> Duration {
    Duration::from_millis(5000)
}

fn default_limit() -> usize {
    5
}

fn default_trajectory_seconds() -> u32 {
    300
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    #[serde(default = "default_tile_url")]
    pub tile_url: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            zoom: default_zoom(),
            tile_url: default_tile_url(),
        }
    }
}

fn default_zoom() -> u8 {
    3
}

fn default_tile_url() -> String {
    "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        if config.refresh.default_limit == 0 {
            return Err(ConfigError::InvalidLimit);
        }
        Ok(config)
    }

    /// Loads `path` if given, otherwise the built-in defaults, then applies
    /// the API key from the environment.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.n2yo.api_key = Some(key.trim().to_string());
            }
        }
    }

    pub fn observer(&self) -> Result<Observer, ConfigError> {
        Observer::from_coordinates(&self.observer.coordinates, Some(self.observer.altitude_m))
            .ok_or_else(|| ConfigError::InvalidCoordinates(self.observer.coordinates.clone()))
    }

    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.n2yo
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }
}
