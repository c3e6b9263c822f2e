//! Monitoring module for the grader
//!
//! Provides:
//! - Structured logging with tracing
//! - Prometheus metrics collection
//! - Health and metrics endpoints

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod tracing_config;

pub use config::MonitoringConfig;
pub use metrics::export_prometheus;
pub use tracing_config::init_tracing;

use std::time::Instant;

/// Monitoring context shared across the application
#[derive(Debug, Clone)]
pub struct MonitoringContext {
    pub startup_time: Instant,
}

impl MonitoringContext {
    pub fn new() -> Self {
        Self {
            startup_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.startup_time.elapsed().as_secs_f64()
    }
}

impl Default for MonitoringContext {
    fn default() -> Self {
        Self::new()
    }
}
