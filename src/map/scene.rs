use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

use super::{LatLng, LayerId, LayerKind, MapError, MapWidget, MarkerIcon, PolylineStyle};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Popup {
    pub content: String,
    pub open: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layer {
    Marker {
        position: LatLng,
        icon: MarkerIcon,
        popup: Popup,
    },
    Polyline {
        points: Vec<LatLng>,
        style: PolylineStyle,
    },
}

impl Layer {
    fn kind(&self) -> LayerKind {
        match self {
            Layer::Marker { .. } => LayerKind::Marker,
            Layer::Polyline { .. } => LayerKind::Polyline,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct View {
    pub center: LatLng,
    pub zoom: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SceneLayer {
    pub id: LayerId,
    pub layer: Layer,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SceneSnapshot {
    pub view: Option<View>,
    pub layers: Vec<SceneLayer>,
}

/// Map widget that keeps its layers in memory.
#[derive(Debug, Default)]
pub struct Scene {
    view: Option<View>,
    layers: BTreeMap<LayerId, Layer>,
    next_id: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(&id)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn markers(&self) -> impl Iterator<Item = (LayerId, &Layer)> {
        self.layers
            .iter()
            .filter(|(_, l)| l.kind() == LayerKind::Marker)
            .map(|(id, l)| (*id, l))
    }

    pub fn polylines(&self) -> impl Iterator<Item = (LayerId, &Layer)> {
        self.layers
            .iter()
            .filter(|(_, l)| l.kind() == LayerKind::Polyline)
            .map(|(id, l)| (*id, l))
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            view: self.view,
            layers: self
                .layers
                .iter()
                .map(|(id, layer)| SceneLayer {
                    id: *id,
                    layer: layer.clone(),
                })
                .collect(),
        }
    }

    fn insert(&mut self, layer: Layer) -> LayerId {
        self.next_id += 1;
        let id = LayerId(self.next_id);
        self.layers.insert(id, layer);
        id
    }

    fn popup_mut(&mut self, id: LayerId) -> Result<&mut Popup, MapError> {
        match self.layers.get_mut(&id) {
            Some(Layer::Marker { popup, .. }) => Ok(popup),
            Some(_) => Err(MapError::WrongKind(id, LayerKind::Marker)),
            None => Err(MapError::UnknownLayer(id)),
        }
    }

    fn points_mut(&mut self, id: LayerId) -> Result<&mut Vec<LatLng>, MapError> {
        match self.layers.get_mut(&id) {
            Some(Layer::Polyline { points, .. }) => Ok(points),
            Some(_) => Err(MapError::WrongKind(id, LayerKind::Polyline)),
            None => Err(MapError::UnknownLayer(id)),
        }
    }
}

impl MapWidget for Scene {
    fn set_view(&mut self, center: LatLng, zoom: u8) {
        self.view = Some(View { center, zoom });
    }

    fn add_marker(&mut self, at: LatLng, icon: MarkerIcon, popup: String) -> LayerId {
        self.insert(Layer::Marker {
            position: at,
            icon,
            popup: Popup {
                content: popup,
                open: false,
            },
        })
    }

    fn move_marker(&mut self, layer: LayerId, at: LatLng) -> Result<(), MapError> {
        match self.layers.get_mut(&layer) {
            Some(Layer::Marker { position, .. }) => {
                *position = at;
                Ok(())
            }
            Some(_) => Err(MapError::WrongKind(layer, LayerKind::Marker)),
            None => Err(MapError::UnknownLayer(layer)),
        }
    }

    fn set_popup_content(&mut self, layer: LayerId, content: String) -> Result<(), MapError> {
        self.popup_mut(layer)?.content = content;
        Ok(())
    }

    fn open_popup(&mut self, layer: LayerId) -> Result<(), MapError> {
        self.popup_mut(layer)?.open = true;
        Ok(())
    }

    fn close_popup(&mut self, layer: LayerId) -> Result<(), MapError> {
        self.popup_mut(layer)?.open = false;
        Ok(())
    }

    fn is_popup_open(&self, layer: LayerId) -> bool {
        matches!(
            self.layers.get(&layer),
            Some(Layer::Marker { popup, .. }) if popup.open
        )
    }

    fn add_polyline(&mut self, points: Vec<LatLng>, style: PolylineStyle) -> LayerId {
        self.insert(Layer::Polyline { points, style })
    }

    fn extend_polyline(&mut self, layer: LayerId, point: LatLng) -> Result<(), MapError> {
        self.points_mut(layer)?.push(point);
        Ok(())
    }

    fn set_polyline_points(
        &mut self,
        layer: LayerId,
        points: Vec<LatLng>,
    ) -> Result<(), MapError> {
        *self.points_mut(layer)? = points;
        Ok(())
    }

    fn remove_layer(&mut self, layer: LayerId) -> Result<(), MapError> {
        self.layers
            .remove(&layer)
            .map(|_| ())
            .ok_or(MapError::UnknownLayer(layer))
    }
}
