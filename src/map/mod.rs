//! Map widget boundary.
//!
//! The tracker drives a [`MapWidget`] and never renders anything itself.
//! [`Scene`] is the in-memory widget whose state the web dashboard draws.

mod scene;

pub use scene::{Layer, Popup, Scene, SceneLayer, SceneSnapshot, View};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;

use crate::provider::Position;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<&Position> for LatLng {
    fn from(position: &Position) -> Self {
        LatLng {
            lat: position.latitude,
            lng: position.longitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(transparent)]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum LayerKind {
    Marker,
    Polyline,
}

#[derive(Debug, Error, PartialEq)]
pub enum MapError {
    #[error("unknown layer {0}")]
    UnknownLayer(LayerId),
    #[error("layer {0} is not a {1}")]
    WrongKind(LayerId, LayerKind),
}

/// Labeled point icon (dot plus name).
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MarkerIcon {
    pub class_name: String,
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub anchor_x: u32,
    pub anchor_y: u32,
}

impl MarkerIcon {
    pub fn satellite(label: &str) -> Self {
        MarkerIcon {
            class_name: "satellite-icon".to_string(),
            label: label.to_string(),
            width: 100,
            height: 20,
            anchor_x: 50,
            anchor_y: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PolylineStyle {
    pub color: String,
    pub weight: u32,
    pub opacity: f64,
    pub dash_array: Option<String>,
}

impl PolylineStyle {
    /// Ground track already flown.
    pub fn trail(color: String) -> Self {
        PolylineStyle {
            color,
            weight: 2,
            opacity: 0.5,
            dash_array: None,
        }
    }

    /// Forecast track; dashed so it never reads as history.
    pub fn forecast(color: String) -> Self {
        PolylineStyle {
            color,
            weight: 2,
            opacity: 0.8,
            dash_array: Some("5, 5".to_string()),
        }
    }

    pub fn is_dashed(&self) -> bool {
        self.dash_array.is_some()
    }
}

pub trait MapWidget: Send + 'static {
    fn set_view(&mut self, center: LatLng, zoom: u8);

    fn add_marker(&mut self, at: LatLng, icon: MarkerIcon, popup: String) -> LayerId;

    fn move_marker(&mut self, layer: LayerId, at: LatLng) -> Result<(), MapError>;

    fn set_popup_content(&mut self, layer: LayerId, content: String) -> Result<(), MapError>;

    fn open_popup(&mut self, layer: LayerId) -> Result<(), MapError>;

    fn close_popup(&mut self, layer: LayerId) -> Result<(), MapError>;

    fn is_popup_open(&self, layer: LayerId) -> bool;

    fn add_polyline(&mut self, points: Vec<LatLng>, style: PolylineStyle) -> LayerId;

    fn extend_polyline(&mut self, layer: LayerId, point: LatLng) -> Result<(), MapError>;

    fn set_polyline_points(&mut self, layer: LayerId, points: Vec<LatLng>)
        -> Result<(), MapError>;

    fn remove_layer(&mut self, layer: LayerId) -> Result<(), MapError>;
}
