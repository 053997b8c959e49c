//! Backoff policies: how long to wait between attempts.

use std::time::Duration;

use cellstore_protocol::Status;

/// Computes the delay to insert before the next attempt of an operation.
///
/// Like retry policies, backoff policies are cloned once per logical
/// operation so the growing-delay state never leaks across operations.
pub trait BackoffPolicy: Send + Sync {
    /// Return a fresh instance with the same configuration and reset state.
    fn clone_policy(&self) -> Box<dyn BackoffPolicy>;

    /// Record the completion of a failed attempt and return the delay to
    /// wait before the next one.
    fn on_completion(&mut self, status: &Status) -> Duration;
}

/// Exponential backoff with an upward jitter.
///
/// The base delay for attempt `n` is `initial_delay * multiplier^n`, capped
/// at `max_delay`. Jitter is applied upward only (`base * [1, 1 + jitter]`,
/// still capped), and each delay is additionally floored at the previous
/// one, so consecutive delays are non-decreasing for every accepted
/// configuration and never exceed `max_delay`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoffPolicy {
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: f64,
    attempt: u32,
    previous: Duration,
}

impl ExponentialBackoffPolicy {
    /// Create a new builder for configuring exponential backoff.
    pub fn builder() -> ExponentialBackoffPolicyBuilder {
        ExponentialBackoffPolicyBuilder::default()
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let jittered = if self.jitter > 0.0 {
            base * (1.0 + self.jitter * rand::random::<f64>())
        } else {
            base
        };
        Duration::from_secs_f64(jittered.min(self.max_delay.as_secs_f64()))
    }
}

impl Default for ExponentialBackoffPolicy {
    /// Defaults: 100ms initial delay, 60s maximum, multiplier 2.0, 10% jitter.
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: 0.1,
            attempt: 0,
            previous: Duration::ZERO,
        }
    }
}

impl BackoffPolicy for ExponentialBackoffPolicy {
    fn clone_policy(&self) -> Box<dyn BackoffPolicy> {
        Box::new(Self {
            attempt: 0,
            previous: Duration::ZERO,
            ..self.clone()
        })
    }

    fn on_completion(&mut self, _status: &Status) -> Duration {
        let delay = self.delay_for_attempt(self.attempt).max(self.previous);
        self.attempt = self.attempt.saturating_add(1);
        self.previous = delay;
        delay
    }
}

/// Builder for [`ExponentialBackoffPolicy`].
#[derive(Debug, Default)]
pub struct ExponentialBackoffPolicyBuilder {
    initial_delay: Option<Duration>,
    max_delay: Option<Duration>,
    multiplier: Option<f64>,
    jitter: Option<f64>,
}

impl ExponentialBackoffPolicyBuilder {
    /// Set the delay before the first retry. Default: 100ms.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = Some(delay);
        self
    }

    /// Set the maximum delay between retries. Default: 60s.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Set the exponential multiplier. Values below 1.0 are clamped to 1.0.
    /// Default: 2.0.
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier.max(1.0));
        self
    }

    /// Set the jitter factor, clamped to `[0.0, 1.0]`. Default: 0.1.
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = Some(jitter.clamp(0.0, 1.0));
        self
    }

    /// Build the policy, using defaults for unset parameters.
    pub fn build(self) -> ExponentialBackoffPolicy {
        let defaults = ExponentialBackoffPolicy::default();
        ExponentialBackoffPolicy {
            initial_delay: self.initial_delay.unwrap_or(defaults.initial_delay),
            max_delay: self.max_delay.unwrap_or(defaults.max_delay),
            multiplier: self.multiplier.unwrap_or(defaults.multiplier),
            jitter: self.jitter.unwrap_or(defaults.jitter),
            attempt: 0,
            previous: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellstore_protocol::StatusCode;
    use proptest::prelude::*;

    fn transient() -> Status {
        Status::new(StatusCode::Unavailable, "try again")
    }

    #[test]
    fn delays_double_without_jitter() {
        let mut policy = ExponentialBackoffPolicy::builder()
            .initial_delay(Duration::from_millis(100))
            .max_delay(Duration::from_secs(10))
            .multiplier(2.0)
            .jitter(0.0)
            .build();

        assert_eq!(policy.on_completion(&transient()), Duration::from_millis(100));
        assert_eq!(policy.on_completion(&transient()), Duration::from_millis(200));
        assert_eq!(policy.on_completion(&transient()), Duration::from_millis(400));
    }

    #[test]
    fn delays_cap_at_max() {
        let mut policy = ExponentialBackoffPolicy::builder()
            .initial_delay(Duration::from_secs(1))
            .max_delay(Duration::from_secs(5))
            .multiplier(10.0)
            .jitter(0.0)
            .build();

        for _ in 0..6 {
            assert!(policy.on_completion(&transient()) <= Duration::from_secs(5));
        }
        assert_eq!(policy.on_completion(&transient()), Duration::from_secs(5));
    }

    #[test]
    fn delays_never_decrease_when_jitter_outpaces_the_multiplier() {
        // With multiplier 1.0 the jitter alone would let delays shrink
        // between attempts; the floor keeps them non-decreasing.
        let mut policy = ExponentialBackoffPolicy::builder()
            .initial_delay(Duration::from_millis(100))
            .max_delay(Duration::from_secs(5))
            .multiplier(1.0)
            .jitter(0.5)
            .build();

        let mut previous = Duration::ZERO;
        for _ in 0..20 {
            let delay = policy.on_completion(&transient());
            assert!(delay >= previous, "delay shrank: {previous:?} -> {delay:?}");
            previous = delay;
        }
    }

    #[test]
    fn clone_restarts_the_progression() {
        let mut policy = ExponentialBackoffPolicy::builder().jitter(0.0).build();
        let first = policy.on_completion(&transient());
        policy.on_completion(&transient());

        let mut fresh = policy.clone_policy();
        assert_eq!(fresh.on_completion(&transient()), first);
    }

    proptest! {
        // Consecutive delays are non-decreasing up to the cap and never
        // exceed it, even with jitter enabled.
        #[test]
        fn delays_are_monotonic_and_bounded(
            initial_ms in 1u64..500,
            max_ms in 500u64..10_000,
            multiplier in 1.0f64..4.0,
            jitter in 0.0f64..1.0,
        ) {
            let max_delay = Duration::from_millis(max_ms);
            let mut policy = ExponentialBackoffPolicy::builder()
                .initial_delay(Duration::from_millis(initial_ms))
                .max_delay(max_delay)
                .multiplier(multiplier)
                .jitter(jitter)
                .build();

            let mut previous = Duration::ZERO;
            for _ in 0..12 {
                let delay = policy.on_completion(&transient());
                prop_assert!(delay <= max_delay);
                prop_assert!(delay >= previous);
                previous = delay;
            }
        }
    }
}
