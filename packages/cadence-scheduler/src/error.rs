use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid delay {0}: must be finite and non-negative")]
    InvalidDelay(f64),

    #[error("invalid timeout {0}: must be finite and non-negative")]
    InvalidTimeout(f64),

    #[error("invalid scheduler config: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Rejects NaN, infinities and negative spans.
pub(crate) fn check_span(value: f64, err: fn(f64) -> SchedulerError) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(err(value))
    }
}
