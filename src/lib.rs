//! Live satellite tracking: a provider client, a tracking session that keeps
//! map overlays in step with it, and the web dashboard that draws them.

pub mod config;
pub mod map;
pub mod observer;
pub mod provider;
pub mod tracker;
pub mod web;
