use serde::{Deserialize, Serialize};

/// Per-identity fixed-window limits, one policy per route class.
///
/// `tutor` guards the generation endpoint and carries the tightest cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitsConfig {
    #[serde(default = "d_tutor")]
    pub tutor: WindowPolicy,
    #[serde(default = "d_standard")]
    pub standard: WindowPolicy,
    /// Once the bucket table holds more entries than this, expired buckets
    /// are swept on the next request.
    #[serde(default = "d_10000")]
    pub housekeeping_threshold: usize,
}

impl Default for RateLimitsConfig {
    fn default() -> Self {
        Self {
            tutor: d_tutor(),
            standard: d_standard(),
            housekeeping_threshold: 10_000,
        }
    }
}

/// `max_requests` per `window_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPolicy {
    pub window_secs: u64,
    pub max_requests: u32,
}

fn d_tutor() -> WindowPolicy {
    WindowPolicy {
        window_secs: 60,
        max_requests: 10,
    }
}
fn d_standard() -> WindowPolicy {
    WindowPolicy {
        window_secs: 60,
        max_requests: 60,
    }
}
fn d_10000() -> usize {
    10_000
}
