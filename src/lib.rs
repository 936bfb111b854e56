pub mod models;
pub mod services;

use std::time::Instant;

use services::{metrics::Metrics, registry::AccountRegistry};

/// Shared handles threaded through the simulation driver and tests.
#[derive(Clone)]
pub struct AppState {
    pub registry: AccountRegistry,
    pub metrics: Metrics,
    pub start_time: Instant,
}
