//! Tracking session: which satellites are tracked and what is drawn for them.

mod banner;
mod color;
mod overlay;
mod parsing;
mod popup;
mod refresh;
mod session;
mod tracking_set;

pub use banner::ErrorBanner;
pub use color::ColorGenerator;
pub use overlay::{OverlayRegistry, OverlaySummary};
pub use parsing::{
    parse_details, parse_limit, parse_tle_lines, OrbitalSummary, TleDetails, DEFAULT_LIMIT,
};
pub use popup::render_popup;
pub use refresh::RefreshLoop;
pub use session::{
    DetailOutcome, SessionOptions, SessionSnapshot, TrackingSession, DEFAULT_TRAJECTORY_SECONDS,
};
pub use tracking_set::{TrackedSatellite, TrackingSet};
