use chrono::{DateTime, Utc};
use serde::Serialize;
use sgp4::Elements;
use utoipa::ToSchema;

use crate::provider::ProviderError;

pub const DEFAULT_LIMIT: usize = 5;

/// Element set shown in an open popup.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TleDetails {
    pub line1: String,
    pub line2: String,
    pub elements: Option<OrbitalSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OrbitalSummary {
    pub norad_id: u64,
    pub epoch: DateTime<Utc>,
    pub inclination_deg: f64,
    pub eccentricity: f64,
    pub mean_motion_rev_day: f64,
}

impl From<&Elements> for OrbitalSummary {
    fn from(elements: &Elements) -> Self {
        OrbitalSummary {
            norad_id: elements.norad_id,
            epoch: elements.datetime.and_utc(),
            inclination_deg: elements.inclination,
            eccentricity: elements.eccentricity,
            mean_motion_rev_day: elements.mean_motion,
        }
    }
}

pub fn parse_tle_lines(tle: &str) -> Result<(Option<String>, String, String), ProviderError> {
    let lines: Vec<String> = tle
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();

    match lines.len() {
        2 => Ok((None, lines[0].clone(), lines[1].clone())),
        3 => Ok((Some(lines[0].clone()), lines[1].clone(), lines[2].clone())),
        0 => Err(ProviderError::EmptyPayload("element set")),
        n => Err(ProviderError::Malformed(format!(
            "expected two element lines, got {n}"
        ))),
    }
}

/// Splits an element set into its two display lines and decodes the orbit
/// when the lines are valid TLE. Undecodable lines are still shown.
pub fn parse_details(tle: &str) -> Result<TleDetails, ProviderError> {
    let (name, line1, line2) = parse_tle_lines(tle)?;
    let elements = match Elements::from_tle(name, line1.as_bytes(), line2.as_bytes()) {
        Ok(elements) => Some(OrbitalSummary::from(&elements)),
        Err(e) => {
            log::warn!("Could not decode element set: {}", e);
            None
        }
    };
    Ok(TleDetails {
        line1,
        line2,
        elements,
    })
}

/// Reads the numeric limit control. Anything unusable falls back to 5.
pub fn parse_limit(raw: &str) -> usize {
    match raw.trim().parse::<usize>() {
        Ok(0) | Err(_) => DEFAULT_LIMIT,
        Ok(n) => n,
    }
}
