use askama::Template;

use super::parsing::TleDetails;
use super::tracking_set::TrackedSatellite;
use crate::provider::Position;

#[derive(Template)]
#[template(path = "popup.html")]
struct PopupTemplate {
    name: String,
    id: String,
    designator: String,
    launch_date: String,
    latitude: String,
    longitude: String,
    altitude: String,
    has_details: bool,
    line1: String,
    line2: String,
    has_orbit: bool,
    epoch: String,
    inclination: String,
    eccentricity: String,
    mean_motion: String,
}

/// Popup body for a marker: identity, current position and, once loaded,
/// the element set.
pub fn render_popup(
    satellite: &TrackedSatellite,
    position: &Position,
    details: Option<&TleDetails>,
) -> String {
    let orbit = details.and_then(|d| d.elements.as_ref());
    let template = PopupTemplate {
        name: satellite.name.clone(),
        id: satellite.id.to_string(),
        designator: satellite.designator.clone(),
        launch_date: satellite.launch_date.clone(),
        latitude: format!("{:.4}", position.latitude),
        longitude: format!("{:.4}", position.longitude),
        altitude: format!("{:.2}", position.altitude_km),
        has_details: details.is_some(),
        line1: details.map(|d| d.line1.clone()).unwrap_or_default(),
        line2: details.map(|d| d.line2.clone()).unwrap_or_default(),
        has_orbit: orbit.is_some(),
        epoch: orbit
            .map(|o| o.epoch.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_default(),
        inclination: orbit
            .map(|o| format!("{:.4}", o.inclination_deg))
            .unwrap_or_default(),
        eccentricity: orbit
            .map(|o| format!("{:.7}", o.eccentricity))
            .unwrap_or_default(),
        mean_motion: orbit
            .map(|o| format!("{:.8}", o.mean_motion_rev_day))
            .unwrap_or_default(),
    };

    template.render().unwrap_or_else(|e| {
        log::error!("Failed to render popup for {}: {}", satellite.id, e);
        satellite.name.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::SatelliteId;

    fn satellite() -> TrackedSatellite {
        TrackedSatellite {
            id: SatelliteId(25544),
            name: "SPACE STATION <ISS>".into(),
            designator: "1998-067A".into(),
            launch_date: "1998-11-20".into(),
        }
    }

    #[test]
    fn renders_identity_and_rounded_position() {
        let html = render_popup(&satellite(), &Position::new(12.345678, -45.6, 420.126), None);
        assert!(html.contains("NORAD ID: 25544"));
        assert!(html.contains("Latitude: 12.3457"));
        assert!(html.contains("Longitude: -45.6000"));
        assert!(html.contains("Altitude: 420.13 km"));
        assert!(!html.contains("satellite-details"));
    }

    #[test]
    fn escapes_names() {
        let html = render_popup(&satellite(), &Position::new(0.0, 0.0, 0.0), None);
        assert!(!html.contains("<ISS>"));
    }

    #[test]
    fn includes_loaded_element_set() {
        let details = TleDetails {
            line1: "1 25544U LINE".into(),
            line2: "2 25544 LINE".into(),
            elements: None,
        };
        let html = render_popup(&satellite(), &Position::new(0.0, 0.0, 0.0), Some(&details));
        assert!(html.contains("satellite-details"));
        assert!(html.contains("1 25544U LINE"));
        assert!(!html.contains("Inclination"));
    }
}
