use serde::{Deserialize, Serialize};

/// Scheduling priority. Ordered so that `Immediate` compares greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Normal,
    Immediate,
}

impl Priority {
    /// Numeric level, higher runs first.
    pub const fn level(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Normal => 2,
            Priority::Immediate => 3,
        }
    }

    pub const fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Priority::Low),
            2 => Some(Priority::Normal),
            3 => Some(Priority::Immediate),
            _ => None,
        }
    }
}

/// Derives a priority from how close `expiration` is to `now`.
///
/// Already expired work is `Immediate`, work expiring within
/// `urgent_threshold` is `Normal`, anything further out is `Low`.
pub fn infer_priority(expiration: f64, now: f64, urgent_threshold: f64) -> Priority {
    let time_left = expiration - now;
    if time_left <= 0.0 {
        Priority::Immediate
    } else if time_left <= urgent_threshold {
        Priority::Normal
    } else {
        Priority::Low
    }
}
