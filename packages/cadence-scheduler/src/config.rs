use crate::error::{Result, check_span, SchedulerError};
use serde::{Deserialize, Serialize};

/// Tunables shared by the executor, the sync path and the update scheduler.
/// All spans are in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// How far in the future a freshly dispatched update expires.
    pub update_window: f64,
    /// Updates expiring within this span are scheduled at `Normal` priority.
    pub urgent_threshold: f64,
    /// Wall-clock budget of one executor slice.
    pub slice_budget: f64,
    /// Pause between slices so the host loop gets a turn.
    pub yield_delay: f64,
    /// Timeout applied to tasks scheduled without one.
    pub default_timeout: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            update_window: 50.0,
            urgent_threshold: 100.0,
            slice_budget: 5.0,
            yield_delay: 5.0,
            default_timeout: 5000.0,
        }
    }
}

impl SchedulerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()
    }

    pub fn validate(self) -> Result<Self> {
        check_span(self.update_window, SchedulerError::InvalidDelay)?;
        check_span(self.urgent_threshold, SchedulerError::InvalidDelay)?;
        check_span(self.slice_budget, SchedulerError::InvalidDelay)?;
        check_span(self.yield_delay, SchedulerError::InvalidDelay)?;
        check_span(self.default_timeout, SchedulerError::InvalidTimeout)?;
        Ok(self)
    }
}
