use log::{debug, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

use super::color::ColorGenerator;
use super::parsing::TleDetails;
use super::popup::render_popup;
use super::tracking_set::TrackedSatellite;
use crate::map::{LatLng, LayerId, MapWidget, MarkerIcon, PolylineStyle};
use crate::provider::{Position, SatelliteId};

struct Trail {
    layer: LayerId,
    points: Vec<LatLng>,
}

struct Forecast {
    layer: LayerId,
    len: usize,
}

/// Everything drawn for one satellite. Each part may be absent on its own.
#[derive(Default)]
struct OverlayEntry {
    marker: Option<LayerId>,
    trail: Option<Trail>,
    trajectory: Option<Forecast>,
    /// Last rendered popup inputs, so details can be merged without a refresh.
    shown: Option<(TrackedSatellite, Position)>,
    /// Lives only while the popup is open.
    details: Option<TleDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OverlaySummary {
    pub id: SatelliteId,
    pub marker: Option<LayerId>,
    pub trail_points: usize,
    pub trajectory_points: usize,
    pub popup_open: bool,
    pub details_loaded: bool,
}

/// Owns the map layers of every satellite that has been drawn at least once.
pub struct OverlayRegistry<M: MapWidget> {
    map: M,
    entries: BTreeMap<SatelliteId, OverlayEntry>,
    colors: ColorGenerator,
}

impl<M: MapWidget> OverlayRegistry<M> {
    pub fn new(map: M) -> Self {
        Self::with_colors(map, ColorGenerator::new())
    }

    pub fn with_colors(map: M, colors: ColorGenerator) -> Self {
        Self {
            map,
            entries: BTreeMap::new(),
            colors,
        }
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    /// Places or moves the marker for `satellite`. The first observation
    /// seeds a one-point trail, later ones extend it.
    pub fn upsert_marker(&mut self, satellite: &TrackedSatellite, position: &Position) {
        let id = satellite.id;
        let at = LatLng::from(position);
        let entry = self.entries.entry(id).or_default();

        match entry.marker {
            Some(layer) => {
                debug!("Updating existing marker for satellite {}", id);
                let content = render_popup(satellite, position, entry.details.as_ref());
                if let Err(e) = self.map.move_marker(layer, at) {
                    warn!("Failed to move marker for {}: {}", id, e);
                }
                if let Err(e) = self.map.set_popup_content(layer, content) {
                    warn!("Failed to refresh popup for {}: {}", id, e);
                }
                entry.shown = Some((satellite.clone(), *position));
                self.append_trail(id, position);
            }
            None => {
                debug!("Creating new marker for satellite {}", id);
                let content = render_popup(satellite, position, None);
                let layer =
                    self.map
                        .add_marker(at, MarkerIcon::satellite(&satellite.name), content);
                entry.marker = Some(layer);
                entry.shown = Some((satellite.clone(), *position));
                self.init_trail(id, at);
            }
        }
    }

    fn init_trail(&mut self, id: SatelliteId, at: LatLng) {
        let Some(entry) = self.entries.get_mut(&id) else {
            return;
        };
        if let Some(old) = entry.trail.take() {
            // Only reachable if the marker was lost without the entry being removed.
            if let Err(e) = self.map.remove_layer(old.layer) {
                warn!("Failed to remove stale trail of {}: {}", id, e);
            }
        }
        let style = PolylineStyle::trail(self.colors.next_color());
        let layer = self.map.add_polyline(vec![at], style);
        entry.trail = Some(Trail {
            layer,
            points: vec![at],
        });
    }

    /// Extends the trail by one point. Without a trail this is a logged no-op.
    pub fn append_trail(&mut self, id: SatelliteId, position: &Position) {
        let at = LatLng::from(position);
        let Some(trail) = self.entries.get_mut(&id).and_then(|e| e.trail.as_mut()) else {
            warn!("No trail for satellite {}; dropping point", id);
            return;
        };
        match self.map.extend_polyline(trail.layer, at) {
            Ok(()) => trail.points.push(at),
            Err(e) => warn!("Failed to extend trail for {}: {}", id, e),
        }
    }

    /// Replaces the dashed forecast line. Satellites without a marker are
    /// skipped so a forecast never exists on its own.
    pub fn replace_trajectory(&mut self, id: SatelliteId, positions: &[Position]) {
        let Some(entry) = self.entries.get_mut(&id) else {
            warn!("No overlay for satellite {}; dropping trajectory", id);
            return;
        };
        let points: Vec<LatLng> = positions.iter().map(LatLng::from).collect();
        let len = points.len();

        if let Some(forecast) = entry.trajectory.as_mut() {
            match self.map.set_polyline_points(forecast.layer, points) {
                Ok(()) => forecast.len = len,
                Err(e) => warn!("Failed to replace trajectory for {}: {}", id, e),
            }
            return;
        }

        let style = PolylineStyle::forecast(self.colors.next_color());
        let layer = self.map.add_polyline(points, style);
        entry.trajectory = Some(Forecast { layer, len });
    }

    /// Detaches marker, trail and trajectory for `id`. Idempotent.
    pub fn remove_all(&mut self, id: SatelliteId) {
        let Some(entry) = self.entries.remove(&id) else {
            return;
        };
        debug!("Removing overlays for satellite {}", id);
        let layers = entry
            .marker
            .into_iter()
            .chain(entry.trail.map(|t| t.layer))
            .chain(entry.trajectory.map(|t| t.layer));
        for layer in layers {
            if let Err(e) = self.map.remove_layer(layer) {
                warn!("Failed to remove layer {} of {}: {}", layer, id, e);
            }
        }
    }

    pub fn clear(&mut self) {
        let ids: Vec<SatelliteId> = self.entries.keys().copied().collect();
        for id in ids {
            self.remove_all(id);
        }
    }

    pub fn open_popup(&mut self, id: SatelliteId) -> bool {
        let Some(layer) = self.marker(id) else {
            return false;
        };
        self.map.open_popup(layer).is_ok()
    }

    /// Closing a popup discards any details merged into it.
    pub fn close_popup(&mut self, id: SatelliteId) -> bool {
        let Some(entry) = self.entries.get_mut(&id) else {
            return false;
        };
        let Some(layer) = entry.marker else {
            return false;
        };
        if entry.details.take().is_some() {
            if let Some((satellite, position)) = &entry.shown {
                let content = render_popup(satellite, position, None);
                if let Err(e) = self.map.set_popup_content(layer, content) {
                    warn!("Failed to reset popup for {}: {}", id, e);
                }
            }
        }
        self.map.close_popup(layer).is_ok()
    }

    pub fn popup_open(&self, id: SatelliteId) -> bool {
        self.marker(id)
            .map(|layer| self.map.is_popup_open(layer))
            .unwrap_or(false)
    }

    /// Merges `details` into the popup of `id` if it is still open.
    pub fn merge_details(&mut self, id: SatelliteId, details: TleDetails) -> bool {
        if !self.popup_open(id) {
            return false;
        }
        let Some(entry) = self.entries.get_mut(&id) else {
            return false;
        };
        let (Some(layer), Some((satellite, position))) = (entry.marker, &entry.shown) else {
            return false;
        };
        let content = render_popup(satellite, position, Some(&details));
        if let Err(e) = self.map.set_popup_content(layer, content) {
            warn!("Failed to merge details for {}: {}", id, e);
            return false;
        }
        entry.details = Some(details);
        true
    }

    pub fn contains(&self, id: SatelliteId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<SatelliteId> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn marker(&self, id: SatelliteId) -> Option<LayerId> {
        self.entries.get(&id).and_then(|e| e.marker)
    }

    pub fn trail_len(&self, id: SatelliteId) -> Option<usize> {
        self.entries
            .get(&id)
            .and_then(|e| e.trail.as_ref())
            .map(|t| t.points.len())
    }

    pub fn trail_points(&self, id: SatelliteId) -> Option<&[LatLng]> {
        self.entries
            .get(&id)
            .and_then(|e| e.trail.as_ref())
            .map(|t| t.points.as_slice())
    }

    pub fn trajectory_len(&self, id: SatelliteId) -> Option<usize> {
        self.entries
            .get(&id)
            .and_then(|e| e.trajectory.as_ref())
            .map(|t| t.len)
    }

    pub fn summaries(&self) -> Vec<OverlaySummary> {
        self.entries
            .iter()
            .map(|(id, entry)| OverlaySummary {
                id: *id,
                marker: entry.marker,
                trail_points: entry.trail.as_ref().map_or(0, |t| t.points.len()),
                trajectory_points: entry.trajectory.as_ref().map_or(0, |t| t.len),
                popup_open: entry
                    .marker
                    .map(|layer| self.map.is_popup_open(layer))
                    .unwrap_or(false),
                details_loaded: entry.details.is_some(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{Layer, Scene};

    fn satellite(id: u32) -> TrackedSatellite {
        TrackedSatellite {
            id: SatelliteId(id),
            name: format!("SAT-{id}"),
            designator: "2000-001A".into(),
            launch_date: "2000-01-01".into(),
        }
    }

    fn registry() -> OverlayRegistry<Scene> {
        OverlayRegistry::with_colors(Scene::new(), ColorGenerator::seeded(7))
    }

    #[test]
    fn first_upsert_creates_marker_and_one_point_trail() {
        let mut reg = registry();
        reg.upsert_marker(&satellite(1), &Position::new(10.0, 20.0, 400.0));

        assert!(reg.contains(SatelliteId(1)));
        assert_eq!(reg.trail_len(SatelliteId(1)), Some(1));
        assert_eq!(reg.map().markers().count(), 1);
        assert_eq!(reg.map().polylines().count(), 1);
    }

    #[test]
    fn later_upserts_move_marker_and_grow_trail() {
        let mut reg = registry();
        let sat = satellite(1);
        reg.upsert_marker(&sat, &Position::new(10.0, 20.0, 400.0));
        reg.upsert_marker(&sat, &Position::new(11.0, 21.0, 401.0));
        reg.upsert_marker(&sat, &Position::new(12.0, 22.0, 402.0));

        assert_eq!(reg.trail_len(SatelliteId(1)), Some(3));
        assert_eq!(reg.map().markers().count(), 1);
        let marker = reg.marker(SatelliteId(1)).unwrap();
        match reg.map().layer(marker) {
            Some(Layer::Marker { position, popup, .. }) => {
                assert_eq!(*position, LatLng { lat: 12.0, lng: 22.0 });
                assert!(popup.content.contains("Latitude: 12.0000"));
            }
            other => panic!("unexpected layer {other:?}"),
        }
    }

    #[test]
    fn append_without_trail_is_a_noop() {
        let mut reg = registry();
        reg.append_trail(SatelliteId(9), &Position::new(0.0, 0.0, 0.0));
        assert!(!reg.contains(SatelliteId(9)));
        assert_eq!(reg.map().layer_count(), 0);
    }

    #[test]
    fn trajectory_is_replaced_not_accumulated() {
        let mut reg = registry();
        let id = SatelliteId(1);
        reg.upsert_marker(&satellite(1), &Position::new(0.0, 0.0, 0.0));

        reg.replace_trajectory(id, &vec![Position::new(1.0, 1.0, 1.0); 300]);
        reg.replace_trajectory(id, &vec![Position::new(2.0, 2.0, 2.0); 120]);

        assert_eq!(reg.trajectory_len(id), Some(120));
        let dashed: Vec<_> = reg
            .map()
            .polylines()
            .filter(|(_, l)| matches!(l, Layer::Polyline { style, .. } if style.is_dashed()))
            .collect();
        assert_eq!(dashed.len(), 1);
    }

    #[test]
    fn trajectory_without_marker_is_skipped() {
        let mut reg = registry();
        reg.replace_trajectory(SatelliteId(3), &[Position::new(1.0, 1.0, 1.0)]);
        assert!(reg.trajectory_len(SatelliteId(3)).is_none());
        assert_eq!(reg.map().layer_count(), 0);
    }

    #[test]
    fn remove_all_detaches_every_layer_and_is_idempotent() {
        let mut reg = registry();
        let id = SatelliteId(1);
        reg.upsert_marker(&satellite(1), &Position::new(0.0, 0.0, 0.0));
        reg.replace_trajectory(id, &[Position::new(1.0, 1.0, 1.0)]);
        assert_eq!(reg.map().layer_count(), 3);

        reg.remove_all(id);
        reg.remove_all(id);
        assert_eq!(reg.map().layer_count(), 0);
        assert!(reg.is_empty());
    }

    #[test]
    fn recreated_overlay_restarts_trail() {
        let mut reg = registry();
        let sat = satellite(4);
        reg.upsert_marker(&sat, &Position::new(0.0, 0.0, 0.0));
        reg.upsert_marker(&sat, &Position::new(1.0, 0.0, 0.0));
        reg.remove_all(sat.id);
        reg.upsert_marker(&sat, &Position::new(2.0, 0.0, 0.0));
        assert_eq!(reg.trail_len(sat.id), Some(1));
    }

    #[test]
    fn details_only_merge_into_open_popup() {
        let mut reg = registry();
        let sat = satellite(5);
        reg.upsert_marker(&sat, &Position::new(0.0, 0.0, 0.0));
        let details = TleDetails {
            line1: "1 LINE".into(),
            line2: "2 LINE".into(),
            elements: None,
        };

        assert!(!reg.merge_details(sat.id, details.clone()));
        assert!(reg.open_popup(sat.id));
        assert!(reg.merge_details(sat.id, details));

        // survives a position refresh while open
        reg.upsert_marker(&sat, &Position::new(1.0, 1.0, 0.0));
        let marker = reg.marker(sat.id).unwrap();
        match reg.map().layer(marker) {
            Some(Layer::Marker { popup, .. }) => assert!(popup.content.contains("1 LINE")),
            other => panic!("unexpected layer {other:?}"),
        }

        assert!(reg.close_popup(sat.id));
        assert!(!reg.summaries()[0].details_loaded);
    }

    #[test]
    fn close_popup_on_detached_marker_reports_failure() {
        let mut reg = registry();
        let sat = satellite(6);
        reg.upsert_marker(&sat, &Position::new(0.0, 0.0, 0.0));
        assert!(reg.open_popup(sat.id));
        reg.merge_details(
            sat.id,
            TleDetails {
                line1: "1 LINE".into(),
                line2: "2 LINE".into(),
                elements: None,
            },
        );
        let marker = reg.marker(sat.id).unwrap();
        reg.map_mut().remove_layer(marker).unwrap();

        assert!(!reg.close_popup(sat.id));
        assert!(!reg.summaries()[0].details_loaded);
        assert_eq!(reg.trail_len(sat.id), Some(1));
    }
}
