//! Bounded retry of a title against the external service.
//!
//! Per attempt: admit through the [`Dispatcher`], call the provider under a
//! timeout, then validate the answer. A valid answer ends the loop. The last
//! attempt accepts a corrected answer; an unusable answer or a service error on
//! the last attempt resolves through the keyword fallback table.


use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::constants::DEFAULT_MAX_ATTEMPTS;
use crate::dispatch::{Clock, Dispatcher};
use crate::provider::{CategorizationProvider, PromptTemplate, ProviderError};
use crate::taxonomy::{CategoryPair, Outcome, TaxonomyValidator};

/// Attempt budget and pauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Pause after an answer that was not valid as-is.
    pub invalid_pause: Duration,
    /// Pause after a service error.
    pub error_pause: Duration,
    /// Per-call timeout; expiry counts as a service error.
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            invalid_pause: Duration::from_millis(100),
            error_pause: Duration::from_millis(200),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Zero pauses, for tests.
    pub fn without_pauses(mut self) -> Self {
        self.invalid_pause = Duration::ZERO;
        self.error_pause = Duration::ZERO;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// How a retried title was finally resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBy {
    /// The service answered with a usable pair.
    Service,
    /// Keyword fallback after errors or unusable answers.
    Fallback,
}

/// Final answer for one title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub pair: CategoryPair,
    /// True only when the service named a taxonomy pair without correction.
    pub is_valid: bool,
    pub attempts: u32,
    pub resolved_by: ResolvedBy,
}

/// Drives provider calls for titles that missed every cache tier.
pub struct RetryOrchestrator {
    provider: Arc<dyn CategorizationProvider>,
    validator: Arc<TaxonomyValidator>,
    template: PromptTemplate,
    policy: RetryPolicy,
}

impl std::fmt::Debug for RetryOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryOrchestrator")
            .field("provider", &self.provider.name())
            .field("policy", &self.policy)
            .finish()
    }
}

impl RetryOrchestrator {
    pub fn new(
        provider: Arc<dyn CategorizationProvider>,
        validator: Arc<TaxonomyValidator>,
        policy: RetryPolicy,
    ) -> Self {
        let template = PromptTemplate::new(validator.taxonomy());
        Self {
            provider,
            validator,
            template,
            policy: policy.with_max_attempts(policy.max_attempts),
        }
    }

    #[inline]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    #[inline]
    pub fn validator(&self) -> &Arc<TaxonomyValidator> {
        &self.validator
    }

    /// Resolves one normalized title. Never fails.
    #[instrument(skip(self, dispatcher), fields(provider = self.provider.name()))]
    pub async fn resolve<C: Clock>(&self, title: &str, dispatcher: &Dispatcher<C>) -> Resolution {
        let prompt = self.template.for_title(title);
        let max = self.policy.max_attempts;

        for attempt in 1..=max {
            let last = attempt == max;
            let answer = dispatcher
                .call(tokio::time::timeout(
                    self.policy.request_timeout,
                    self.provider.complete(&prompt),
                ))
                .await;

            let text = match answer {
                Ok(Ok(Ok(text))) => Ok(text),
                Ok(Ok(Err(e))) => Err(e.to_string()),
                Ok(Err(_elapsed)) => Err(ProviderError::Timeout {
                    after: self.policy.request_timeout,
                }
                .to_string()),
                Err(e) => Err(e.to_string()),
            };

            match text {
                Ok(text) => match self.validator.validate(&text, title) {
                    Outcome::Valid(pair) => {
                        return Resolution {
                            pair,
                            is_valid: true,
                            attempts: attempt,
                            resolved_by: ResolvedBy::Service,
                        };
                    }
                    Outcome::Corrected(pair) if last => {
                        return Resolution {
                            pair,
                            is_valid: false,
                            attempts: attempt,
                            resolved_by: ResolvedBy::Service,
                        };
                    }
                    Outcome::Fallback(pair) if last => {
                        return Self::fallback(pair, attempt);
                    }
                    outcome => {
                        debug!(
                            title,
                            attempt,
                            outcome = outcome.as_str(),
                            response = %text,
                            "Answer not valid, retrying"
                        );
                        pause(self.policy.invalid_pause).await;
                    }
                },
                Err(error) => {
                    warn!(title, attempt, error = %error, "Categorization call failed");
                    if last {
                        return Self::fallback(self.validator.fallback(title), attempt);
                    }
                    pause(self.policy.error_pause).await;
                }
            }
        }

        Self::fallback(self.validator.fallback(title), max)
    }

    fn fallback(pair: CategoryPair, attempts: u32) -> Resolution {
        Resolution {
            pair,
            is_valid: false,
            attempts,
            resolved_by: ResolvedBy::Fallback,
        }
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
