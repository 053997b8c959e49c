//! Client configuration: default policies and call attribution.

use crate::policies::{
    BackoffPolicy, ExponentialBackoffPolicy, IdempotentMutationPolicy, LimitedErrorCountRetryPolicy,
    RetryPolicy, SafeIdempotentMutationPolicy,
};

/// Configuration shared by every table handle a client creates.
///
/// The policies configured here are prototypes: each logical operation
/// clones them, so their mutable state never crosses operation boundaries.
pub struct ClientConfig {
    pub(crate) app_profile_id: String,
    pub(crate) retry: Box<dyn RetryPolicy>,
    pub(crate) backoff: Box<dyn BackoffPolicy>,
    pub(crate) idempotency: Box<dyn IdempotentMutationPolicy>,
}

impl Default for ClientConfig {
    /// Defaults: no app profile, up to 3 transient failures per operation,
    /// exponential backoff, and the safe idempotency classification.
    fn default() -> Self {
        Self {
            app_profile_id: String::new(),
            retry: Box::new(LimitedErrorCountRetryPolicy::new(3)),
            backoff: Box::new(ExponentialBackoffPolicy::default()),
            idempotency: Box::new(SafeIdempotentMutationPolicy),
        }
    }
}

impl ClientConfig {
    /// Start building a configuration.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Default)]
pub struct ClientConfigBuilder {
    app_profile_id: Option<String>,
    retry: Option<Box<dyn RetryPolicy>>,
    backoff: Option<Box<dyn BackoffPolicy>>,
    idempotency: Option<Box<dyn IdempotentMutationPolicy>>,
}

impl ClientConfigBuilder {
    /// Set the application profile calls are accounted against.
    pub fn app_profile_id(mut self, id: impl Into<String>) -> Self {
        self.app_profile_id = Some(id.into());
        self
    }

    /// Set the default retry policy prototype.
    pub fn retry_policy(mut self, policy: impl RetryPolicy + 'static) -> Self {
        self.retry = Some(Box::new(policy));
        self
    }

    /// Set the default backoff policy prototype.
    pub fn backoff_policy(mut self, policy: impl BackoffPolicy + 'static) -> Self {
        self.backoff = Some(Box::new(policy));
        self
    }

    /// Set the default idempotency policy prototype.
    pub fn idempotent_mutation_policy(
        mut self,
        policy: impl IdempotentMutationPolicy + 'static,
    ) -> Self {
        self.idempotency = Some(Box::new(policy));
        self
    }

    /// Build the configuration, using defaults for unset fields.
    pub fn build(self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            app_profile_id: self.app_profile_id.unwrap_or(defaults.app_profile_id),
            retry: self.retry.unwrap_or(defaults.retry),
            backoff: self.backoff.unwrap_or(defaults.backoff),
            idempotency: self.idempotency.unwrap_or(defaults.idempotency),
        }
    }
}
