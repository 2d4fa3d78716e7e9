//! Application state management for gridscale.
//!
//! This module defines the shared state that is passed to all handlers. It is
//! only constructed after the dataset has been fully loaded and indexed, so a
//! handler never observes a partially built service.

use std::sync::Arc;
use std::time::SystemTime;

use crate::config::Config;
use crate::downscaler::Downscaler;
use crate::grid::GridSystem;

/// The main application state shared across all handlers
#[derive(Debug)]
pub struct AppState {
    /// Configuration
    pub config: Config,
    /// Loaded, immutable interpolation service
    pub downscaler: Downscaler,
    /// Path of the dataset that was loaded
    pub data_path: String,
    /// Time the state was published
    pub started_at: SystemTime,
}

impl AppState {
    /// Create a new AppState
    pub fn new(config: Config, downscaler: Downscaler, data_path: impl Into<String>) -> Self {
        Self {
            config,
            downscaler,
            data_path: data_path.into(),
            started_at: SystemTime::now(),
        }
    }

    /// Create a new AppState wrapped in an Arc for shared ownership
    pub fn new_shared(
        config: Config,
        downscaler: Downscaler,
        data_path: impl Into<String>,
    ) -> Arc<Self> {
        Arc::new(Self::new(config, downscaler, data_path))
    }

    /// Grid used to resolve identifiers
    pub fn grid(&self) -> &dyn GridSystem {
        self.downscaler.grid()
    }
}
