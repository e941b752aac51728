//! # Loop Energy Agent Library
//!
//! Keeps an authenticated session against the Loop energy cloud API, polls
//! live power usage and phantom load on a fixed cadence, and republishes both
//! as sensor entities.
//!
//! Modules:
//! - `config` — YAML service configuration and validation
//! - `session` — identity exchanges and the token manager
//! - `polling` — polling client, readings, subscribers and the periodic driver
//! - `sensors` — sensor entities and per-device lifecycle
//! - `observability` — Prometheus metrics
//! - `server` — HTTP surface for metrics and sensor states

pub mod config;
pub mod errors;
pub mod helpers;
pub mod observability;
pub mod polling;
pub mod sensors;
pub mod server;
pub mod session;
pub mod utils;

#[cfg(test)]
pub mod tests;


pub use crate::config::devices::ServiceConfig;
pub use crate::polling::PollingClient;
pub use crate::session::TokenManager;
