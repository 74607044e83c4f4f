// Transient-error retry policy.
//
// Only the status code decides whether a response is retried; transport
// failures never come through here.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};

/// How many times a transient failure may be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxRetries {
    Limited(u32),
    Unlimited,
}

/// Retry behaviour for transient server errors (502/503/504, optionally 500).
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retry transient statuses unless a request overrides it.
    pub enabled: bool,
    /// Also treat HTTP 500 as transient.
    pub retry_server_errors: bool,
    pub max_retries: MaxRetries,
    /// Delay before the first retry; doubled on every further attempt.
    pub base_delay: Duration,
    /// Ceiling for the computed delay. `Retry-After` is not capped.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            retry_server_errors: false,
            max_retries: MaxRetries::Limited(10),
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Policy with retries switched on and the default bounds.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    pub fn is_transient(&self, status: StatusCode) -> bool {
        match status.as_u16() {
            502..=504 => true,
            500 => self.retry_server_errors,
            _ => false,
        }
    }

    /// Whether another retry is allowed after `attempt` retries already made.
    pub fn allows(&self, attempt: u32) -> bool {
        match self.max_retries {
            MaxRetries::Unlimited => true,
            MaxRetries::Limited(max) => attempt < max,
        }
    }

    /// `base_delay × 2^attempt`, capped at `max_delay`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Delay before retry number `attempt`, preferring the server's
    /// `Retry-After` (integer seconds) over the computed backoff.
    pub fn delay(&self, attempt: u32, headers: &HeaderMap) -> Duration {
        retry_after(headers).unwrap_or_else(|| self.backoff(attempt))
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    #[test]
    fn gateway_statuses_are_transient_500_only_on_request() {
        let policy = RetryPolicy::default();
        for code in [502, 503, 504] {
            assert!(policy.is_transient(StatusCode::from_u16(code).unwrap()));
        }
        assert!(!policy.is_transient(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!policy.is_transient(StatusCode::TOO_MANY_REQUESTS));

        let policy = RetryPolicy {
            retry_server_errors: true,
            ..RetryPolicy::default()
        };
        assert!(policy.is_transient(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn backoff_doubles_and_never_decreases() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(800));

        let mut previous = Duration::ZERO;
        for attempt in 0..64 {
            let delay = policy.backoff(attempt);
            assert!(delay >= previous, "attempt {attempt} went backwards");
            assert!(delay <= policy.max_delay);
            previous = delay;
        }
    }

    #[test]
    fn retry_after_overrides_backoff() {
        let policy = RetryPolicy::default();
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(policy.delay(0, &headers), Duration::from_secs(7));
    }

    #[test]
    fn unparsable_retry_after_falls_back() {
        let policy = RetryPolicy::default();
        let mut headers = HeaderMap::new();
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(policy.delay(2, &headers), Duration::from_millis(400));
    }

    #[test]
    fn attempt_limits() {
        let policy = RetryPolicy {
            max_retries: MaxRetries::Limited(2),
            ..RetryPolicy::default()
        };
        assert!(policy.allows(0));
        assert!(policy.allows(1));
        assert!(!policy.allows(2));

        let forever = RetryPolicy {
            max_retries: MaxRetries::Unlimited,
            ..RetryPolicy::default()
        };
        assert!(forever.allows(u32::MAX));
    }
}
