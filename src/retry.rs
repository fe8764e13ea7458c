//! Retry Controller (C4): bounded attempts with fixed-delay backoff,
//! grounded on `retry_request.hpp`'s `RetryPolicy`/`RetryRequest`.

use std::time::Duration;

use crate::request::Request;

/// `maxRetries < 0` means unbounded (spec §4.4).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: i32,
    pub retry_count: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    /// `maxRetries = 3`, `delay = 15s` unless overridden (spec §6).
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            retry_count: 0,
            delay: Duration::from_secs(15),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: i32, delay: Duration) -> Self {
        RetryPolicy {
            max_retries,
            retry_count: 0,
            delay,
        }
    }

    pub fn retry_needed(&self) -> bool {
        self.max_retries < 0 || self.retry_count < self.max_retries as u32
    }

    pub fn increment_retry_count(&mut self) {
        self.retry_count += 1;
    }

    /// Used when a retry attempt could not even start — e.g. the pool was
    /// saturated — so it doesn't consume the budget (spec §4.4, §9 Open
    /// Question 3; preserved as-is from the original source).
    pub fn decrement_retry_count(&mut self) {
        self.retry_count = self.retry_count.saturating_sub(1);
    }
}

/// Per-request retry state: a captured envelope, a policy, and a single
/// in-flight timer. Retries for a given controller fire strictly
/// sequentially (spec §4.4, §5).
pub struct RetryController {
    request: Request,
    policy: RetryPolicy,
}

impl RetryController {
    pub fn new(request: Request, policy: RetryPolicy) -> Self {
        RetryController { request, policy }
    }

    pub fn set_request(&mut self, request: Request) {
        self.request = request;
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn policy_mut(&mut self) -> &mut RetryPolicy {
        &mut self.policy
    }

    pub fn retry_needed(&self) -> bool {
        self.policy.retry_needed()
    }

    /// If a retry is allowed, increments the retry count, waits `delay`,
    /// and returns `true` — the caller re-submits `request()`. Returns
    /// `false` immediately (no wait) when the budget is exhausted.
    pub async fn wait_and_retry(&mut self) -> bool {
        if !self.policy.retry_needed() {
            return false;
        }
        self.policy.increment_retry_count();
        tokio::time::sleep(self.policy.delay).await;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_policy_exhausts() {
        let mut p = RetryPolicy::new(2, Duration::from_millis(1));
        assert!(p.retry_needed());
        p.increment_retry_count();
        assert!(p.retry_needed());
        p.increment_retry_count();
        assert!(!p.retry_needed());
    }

    #[test]
    fn unbounded_policy_never_exhausts() {
        let mut p = RetryPolicy::new(-1, Duration::from_millis(1));
        for _ in 0..1000 {
            p.increment_retry_count();
        }
        assert!(p.retry_needed());
    }

    #[tokio::test]
    async fn total_attempts_bounded_by_n_plus_one() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let mut ctrl = RetryController::new(Request::default(), policy);
        let mut attempts = 1; // the initial attempt, before any retry
        while ctrl.wait_and_retry().await {
            attempts += 1;
        }
        assert_eq!(attempts, 4);
    }
}
