//! Per-identity fixed-window request caps.
//!
//! Each `(route class, caller)` pair owns a bucket holding a count and the
//! instant its window ends. Inside the window the count climbs until the
//! cap; the first request after the window ends starts a fresh one. There
//! are no background timers: expired buckets are swept inline once the
//! table grows past the housekeeping threshold.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tg_domain::config::{RateLimitsConfig, WindowPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    /// Generation-backed tutoring calls.
    Tutor,
    Standard,
}

impl RouteClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteClass::Tutor => "tutor",
            RouteClass::Standard => "standard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Requests left in the current window after this one.
    pub remaining: u32,
    /// Time until the current window ends.
    pub reset_in: Duration,
}

impl RateDecision {
    /// Whole seconds to wait, rounded up, never zero.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.reset_in.as_secs() + u64::from(self.reset_in.subsec_nanos() > 0);
        secs.max(1)
    }
}

struct Bucket {
    count: u32,
    window_ends_at: Instant,
}

pub struct FixedWindowLimiter {
    tutor: WindowPolicy,
    standard: WindowPolicy,
    housekeeping_threshold: usize,
    buckets: Mutex<HashMap<(RouteClass, String), Bucket>>,
}

impl FixedWindowLimiter {
    pub fn new(cfg: &RateLimitsConfig) -> Self {
        Self {
            tutor: cfg.tutor,
            standard: cfg.standard,
            housekeeping_threshold: cfg.housekeeping_threshold,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self, class: RouteClass) -> WindowPolicy {
        match class {
            RouteClass::Tutor => self.tutor,
            RouteClass::Standard => self.standard,
        }
    }

    pub fn check(&self, key: &str, class: RouteClass) -> RateDecision {
        self.check_at(key, class, Instant::now())
    }

    /// [`check`](Self::check) against an explicit clock reading.
    pub fn check_at(&self, key: &str, class: RouteClass, now: Instant) -> RateDecision {
        let policy = self.policy(class);
        let window = Duration::from_secs(policy.window_secs);

        let mut buckets = self.buckets.lock();
        if buckets.len() > self.housekeeping_threshold {
            let before = buckets.len();
            buckets.retain(|_, b| b.window_ends_at > now);
            tracing::debug!(evicted = before - buckets.len(), "rate-limit buckets swept");
        }

        let bucket = buckets
            .entry((class, key.to_owned()))
            .or_insert(Bucket {
                count: 0,
                window_ends_at: now + window,
            });
        if now >= bucket.window_ends_at {
            bucket.count = 0;
            bucket.window_ends_at = now + window;
        }
        let reset_in = bucket.window_ends_at.saturating_duration_since(now);

        if bucket.count >= policy.max_requests {
            return RateDecision {
                allowed: false,
                remaining: 0,
                reset_in,
            };
        }
        bucket.count += 1;
        RateDecision {
            allowed: true,
            remaining: policy.max_requests - bucket.count,
            reset_in,
        }
    }

    /// Number of live buckets (expired ones included until swept).
    pub fn len(&self) -> usize {
        self.buckets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: u32, threshold: usize) -> FixedWindowLimiter {
        FixedWindowLimiter::new(&RateLimitsConfig {
            tutor: WindowPolicy {
                window_secs: 60,
                max_requests: max,
            },
            standard: WindowPolicy {
                window_secs: 60,
                max_requests: 60,
            },
            housekeeping_threshold: threshold,
        })
    }

    #[test]
    fn eleventh_request_in_window_is_denied() {
        let rl = limiter(10, 10_000);
        let t0 = Instant::now();
        for i in 0..10 {
            let d = rl.check_at("alice", RouteClass::Tutor, t0 + Duration::from_secs(i));
            assert!(d.allowed, "request {i} should pass");
            assert_eq!(d.remaining, 9 - i as u32);
        }
        let denied = rl.check_at("alice", RouteClass::Tutor, t0 + Duration::from_secs(30));
        assert!(!denied.allowed);
        assert_eq!(denied.reset_in, Duration::from_secs(30));
        assert_eq!(denied.retry_after_secs(), 30);
    }

    #[test]
    fn window_expiry_resets_the_count() {
        let rl = limiter(2, 10_000);
        let t0 = Instant::now();
        assert!(rl.check_at("bob", RouteClass::Tutor, t0).allowed);
        assert!(rl.check_at("bob", RouteClass::Tutor, t0).allowed);
        assert!(!rl.check_at("bob", RouteClass::Tutor, t0).allowed);

        let later = t0 + Duration::from_secs(60);
        let d = rl.check_at("bob", RouteClass::Tutor, later);
        assert!(d.allowed);
        assert_eq!(d.remaining, 1);
        assert_eq!(d.reset_in, Duration::from_secs(60));
    }

    #[test]
    fn never_more_than_cap_inside_any_window() {
        let rl = limiter(3, 10_000);
        let t0 = Instant::now();
        let allowed = (0..120)
            .filter(|ms| {
                rl.check_at("carol", RouteClass::Tutor, t0 + Duration::from_millis(ms * 100))
                    .allowed
            })
            .count();
        assert_eq!(allowed, 3);
    }

    #[test]
    fn identities_and_classes_are_independent() {
        let rl = limiter(1, 10_000);
        let t0 = Instant::now();
        assert!(rl.check_at("a", RouteClass::Tutor, t0).allowed);
        assert!(!rl.check_at("a", RouteClass::Tutor, t0).allowed);
        assert!(rl.check_at("b", RouteClass::Tutor, t0).allowed);
        assert!(rl.check_at("a", RouteClass::Standard, t0).allowed);
    }

    #[test]
    fn housekeeping_evicts_only_expired_buckets() {
        let rl = limiter(5, 2);
        let t0 = Instant::now();
        rl.check_at("old-1", RouteClass::Tutor, t0);
        rl.check_at("old-2", RouteClass::Tutor, t0);
        rl.check_at("fresh", RouteClass::Tutor, t0 + Duration::from_secs(59));
        assert_eq!(rl.len(), 3);

        // Table is over the threshold: the two expired buckets go, "fresh"
        // stays and the new caller is added.
        rl.check_at("new", RouteClass::Tutor, t0 + Duration::from_secs(61));
        assert_eq!(rl.len(), 2);
    }

    #[test]
    fn retry_after_rounds_up_and_is_at_least_one() {
        let d = RateDecision {
            allowed: false,
            remaining: 0,
            reset_in: Duration::from_millis(1500),
        };
        assert_eq!(d.retry_after_secs(), 2);
        let d = RateDecision {
            reset_in: Duration::ZERO,
            ..d
        };
        assert_eq!(d.retry_after_secs(), 1);
    }
}
