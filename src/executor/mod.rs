//! Fire-verify-settle loop for optimistic remote mutations.

pub mod backoff;
pub mod inflight;

use crate::error::{ErrorClass, MutationError, Result};
use crate::types::{MutationOutcome, MutationRequest, Verification};
use backoff::BackoffPolicy;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Classifier override: maps an error to retryable/rejected when the
/// default [`MutationError::class`] split is not what the backend needs.
pub type Classifier = Arc<dyn Fn(&MutationError) -> ErrorClass + Send + Sync>;

#[derive(Clone)]
pub struct ExecutorOptions {
    /// Total commit attempts, including the first one.
    pub max_attempts: u32,
    pub backoff: BackoffPolicy,
    /// Stretch backoff delays by a random 0–25% when true.
    pub jitter: bool,
    /// Wrapping timeout for each commit/verify call so a hung backend
    /// cannot stall the loop. A timeout classifies as retryable.
    pub attempt_timeout: Duration,
    /// Read-your-writes polls after a successful commit, when a verify
    /// step is supplied.
    pub verify_polls: u32,
    pub verify_interval: Duration,
    pub classifier: Option<Classifier>,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        ExecutorOptions {
            max_attempts: 3,
            backoff: BackoffPolicy::default(),
            jitter: false,
            attempt_timeout: Duration::from_secs(10),
            verify_polls: 3,
            verify_interval: Duration::from_secs(1),
            classifier: None,
        }
    }
}

impl ExecutorOptions {
    pub fn from_env() -> Self {
        let defaults = ExecutorOptions::default();
        ExecutorOptions {
            max_attempts: std::env::var("SETTLER_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_attempts),
            backoff: std::env::var("SETTLER_BACKOFF_BASE_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(BackoffPolicy::linear_ms)
                .unwrap_or(defaults.backoff),
            jitter: std::env::var("SETTLER_BACKOFF_JITTER")
                .map(|s| s == "1" || s.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.jitter),
            attempt_timeout: std::env::var("SETTLER_ATTEMPT_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.attempt_timeout),
            verify_polls: std::env::var("SETTLER_VERIFY_POLLS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.verify_polls),
            verify_interval: std::env::var("SETTLER_VERIFY_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.verify_interval),
            classifier: None,
        }
    }
}

/// Applies one [`MutationRequest`] against a remote store: commit with
/// bounded retries and backoff, then a best-effort read-your-writes check.
///
/// The executor is pure orchestration: it holds no per-call state, never
/// panics on a failed attempt, and resolves every path to a
/// [`MutationOutcome`]. Duplicate suppression and local-state rollback stay
/// with the caller (see [`inflight::InFlightRegistry`]).
#[derive(Clone)]
pub struct Executor {
    options: ExecutorOptions,
}

impl Executor {
    pub fn new(options: ExecutorOptions) -> Self {
        Executor { options }
    }

    pub fn with_defaults() -> Self {
        Executor::new(ExecutorOptions::default())
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    /// Run the commit loop without a verify step.
    ///
    /// `commit` receives the request on every attempt and resolves to the
    /// confirmed state (or whatever the backend returns) on success.
    pub async fn execute<C, CFut>(&self, request: MutationRequest, commit: C) -> MutationOutcome
    where
        C: FnMut(MutationRequest) -> CFut,
        CFut: Future<Output = Result<Option<serde_json::Value>>>,
    {
        self.execute_verified(
            request,
            commit,
            None::<fn() -> std::future::Ready<Result<bool>>>,
        )
        .await
    }

    /// Run the commit loop, then poll `verify` until it observes the write
    /// or the poll budget runs out.
    ///
    /// Verification is best effort: a commit that cannot be re-observed
    /// still settles as [`MutationOutcome::Committed`], flagged
    /// [`Verification::Unverified`].
    pub async fn execute_verified<C, CFut, V, VFut>(
        &self,
        request: MutationRequest,
        mut commit: C,
        mut verify: Option<V>,
    ) -> MutationOutcome
    where
        C: FnMut(MutationRequest) -> CFut,
        CFut: Future<Output = Result<Option<serde_json::Value>>>,
        V: FnMut() -> VFut,
        VFut: Future<Output = Result<bool>>,
    {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let result = self.bounded(commit(request.clone())).await;

            let error = match result {
                Ok(state) => {
                    tracing::debug!(
                        "[EXEC {}] committed on attempt {}",
                        request.target,
                        attempt
                    );
                    let verification = match verify.as_mut() {
                        Some(v) => self.poll_verification(&request.target, v).await,
                        None => Verification::NotRequested,
                    };
                    return MutationOutcome::Committed {
                        state,
                        verification,
                    };
                }
                Err(e) => e,
            };

            match self.classify(&error) {
                ErrorClass::Rejected => {
                    tracing::warn!(
                        "[EXEC {}] rejected on attempt {}: {}",
                        request.target,
                        attempt,
                        error
                    );
                    return MutationOutcome::Rejected { reason: error };
                }
                ErrorClass::Retryable => {
                    if attempt >= self.options.max_attempts {
                        tracing::warn!(
                            "[EXEC {}] giving up after {} attempts: {}",
                            request.target,
                            attempt,
                            error
                        );
                        return MutationOutcome::ExhaustedRetries {
                            attempts: attempt,
                            last_error: error,
                        };
                    }
                    let delay = if self.options.jitter {
                        self.options.backoff.jittered(attempt)
                    } else {
                        self.options.backoff.delay(attempt)
                    };
                    tracing::debug!(
                        "[EXEC {}] attempt {} failed ({}), retrying in {}ms",
                        request.target,
                        attempt,
                        error,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn poll_verification<V, VFut>(&self, target: &str, verify: &mut V) -> Verification
    where
        V: FnMut() -> VFut,
        VFut: Future<Output = Result<bool>>,
    {
        for poll in 1..=self.options.verify_polls {
            match self.bounded(verify()).await {
                Ok(true) => {
                    tracing::debug!("[EXEC {}] write visible after {} polls", target, poll);
                    return Verification::Confirmed { polls: poll };
                }
                Ok(false) => {}
                // Verification is observability, not correctness: a failed
                // read here never fails the settled commit.
                Err(e) => {
                    tracing::debug!("[EXEC {}] verify poll {} failed: {}", target, poll, e)
                }
            }
            if poll < self.options.verify_polls {
                tokio::time::sleep(self.options.verify_interval).await;
            }
        }
        tracing::info!(
            "[EXEC {}] write not visible after {} polls, settling unverified",
            target,
            self.options.verify_polls
        );
        Verification::Unverified {
            polls: self.options.verify_polls,
        }
    }

    async fn bounded<T, Fut>(&self, fut: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        match timeout(self.options.attempt_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(MutationError::Timeout {
                waited_ms: self.options.attempt_timeout.as_millis() as u64,
            }),
        }
    }

    fn classify(&self, error: &MutationError) -> ErrorClass {
        match &self.options.classifier {
            Some(classifier) => classifier(error),
            None => error.class(),
        }
    }
}
