//! # Settler
//!
//! An optimistic remote-mutation executor: apply a state change locally,
//! commit it to a remote record store with bounded retries and backoff,
//! optionally confirm the write is visible (read-your-writes), and report
//! a single terminal outcome the caller can keep or revert on.
//!
//! Settler is backend-agnostic: the only boundary is the commit/verify
//! closures the caller supplies, which may wrap any document store. The
//! companion `settler-store` crate provides an HTTP document-store client
//! plus social-app operations built on this executor.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use settler::{Executor, MutationRequest};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let executor = Executor::with_defaults();
//! let request = MutationRequest::new("profiles/alice").set("display_name", json!("Alice"));
//!
//! let outcome = executor
//!     .execute(request, |req| async move {
//!         // write req.patch to your backend here
//!         let _ = req.patch;
//!         Ok(None)
//!     })
//!     .await;
//!
//! if outcome.should_revert() {
//!     // roll local UI state back to the last committed value
//! }
//! # }
//! ```
//!
//! ## Guarantees
//!
//! - `execute` terminates within `max_attempts` commit calls; retryable
//!   errors back off between attempts, terminal errors short-circuit.
//! - Every failure path resolves to a [`MutationOutcome`] variant; the
//!   executor never panics past its boundary.
//! - Verification is best effort: an unconfirmed write still settles as
//!   committed, flagged unverified.
//!
//! Same-target concurrent calls race with last-write-wins semantics; use
//! [`InFlightRegistry`] to suppress duplicate submissions.

pub mod error;
pub mod executor;
pub mod notify;
pub mod types;

pub use error::{ErrorClass, MutationError, Result};
pub use executor::backoff::BackoffPolicy;
pub use executor::inflight::{
    global_inflight, reset_global_inflight_for_test, InFlightGuard, InFlightRegistry,
};
pub use executor::{Classifier, Executor, ExecutorOptions};
pub use notify::{Notification, NotificationKind, Notifier};
pub use types::{MutationOutcome, MutationRequest, Patch, TargetId, Verification};

/// Install a `tracing` subscriber reading `RUST_LOG`.
///
/// Convenience for binaries and tests; a no-op if a subscriber is already
/// set. Call once at startup if desired.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
