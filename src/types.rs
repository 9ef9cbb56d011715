use crate::error::MutationError;
use serde::{Deserialize, Serialize};

/// Remote record identifier, a plain string like `"profiles/alice"`.
pub type TargetId = String;

/// Field-level update to apply to a remote record. Ordered so fields apply
/// in the order the caller set them.
pub type Patch = serde_json::Map<String, serde_json::Value>;

/// A single logical update to one remote record.
///
/// Lives only for the duration of one [`crate::Executor::execute`] call;
/// there is no queue and nothing survives a process restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationRequest {
    pub target: TargetId,
    pub patch: Patch,
    /// Version the caller last observed. When set, the commit path may use
    /// it to detect a conflicting concurrent write; when unset, the last
    /// commit to land wins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_prior_version: Option<u64>,
}

impl MutationRequest {
    pub fn new(target: impl Into<TargetId>) -> Self {
        MutationRequest {
            target: target.into(),
            patch: Patch::new(),
            expected_prior_version: None,
        }
    }

    /// Add one field to the patch.
    pub fn set(mut self, field: impl Into<String>, value: serde_json::Value) -> Self {
        self.patch.insert(field.into(), value);
        self
    }

    pub fn with_expected_version(mut self, version: u64) -> Self {
        self.expected_prior_version = Some(version);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.patch.is_empty()
    }
}

/// Terminal result of one execute call. The executor never throws past its
/// boundary; every failure path resolves to one of these variants.
#[derive(Debug, Clone)]
pub enum MutationOutcome {
    /// The commit landed. `state` carries whatever the commit returned
    /// (e.g. the updated record), if anything.
    Committed {
        state: Option<serde_json::Value>,
        verification: Verification,
    },
    /// Every attempt failed with a retryable error and the budget is spent.
    ExhaustedRetries {
        attempts: u32,
        last_error: MutationError,
    },
    /// A terminal error (permission, validation, conflict) short-circuited
    /// the retry loop.
    Rejected { reason: MutationError },
}

impl MutationOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, MutationOutcome::Committed { .. })
    }

    /// True when the caller should roll its local optimistic state back to
    /// the last known-committed value.
    pub fn should_revert(&self) -> bool {
        !self.is_committed()
    }

    pub fn terminal_error(&self) -> Option<&MutationError> {
        match self {
            MutationOutcome::Committed { .. } => None,
            MutationOutcome::ExhaustedRetries { last_error, .. } => Some(last_error),
            MutationOutcome::Rejected { reason } => Some(reason),
        }
    }
}

/// Result of the best-effort read-your-writes check after a commit.
///
/// Failing to verify never downgrades a committed outcome; it only marks it
/// [`Verification::Unverified`] so callers and tests can observe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// No verify step was supplied.
    NotRequested,
    /// The write was re-read within `polls` polls.
    Confirmed { polls: u32 },
    /// The poll budget ran out before the write became visible.
    Unverified { polls: u32 },
}

impl Verification {
    pub fn confirmed(&self) -> bool {
        matches!(self, Verification::Confirmed { .. })
    }
}
