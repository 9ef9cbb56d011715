use crate::types::TargetId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Instant;

/// Tracks which targets have a mutation in flight so callers can suppress
/// duplicate submissions (double-click, impatient re-tap).
///
/// The executor itself never consults this; suppression is the caller's
/// job, and two calls for the same target that skip the registry will race
/// with last-write-wins semantics.
#[derive(Clone, Default)]
pub struct InFlightRegistry {
    targets: Arc<DashMap<TargetId, Instant>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        InFlightRegistry::default()
    }

    /// Claim `target`. Returns `None` while a previous claim is still alive;
    /// the claim releases when the returned guard drops.
    pub fn begin(&self, target: impl Into<TargetId>) -> Option<InFlightGuard> {
        let target = target.into();
        match self.targets.entry(target.clone()) {
            Entry::Occupied(entry) => {
                tracing::debug!(
                    "[INFLIGHT] suppressed duplicate for {} (in flight {}ms)",
                    target,
                    entry.get().elapsed().as_millis()
                );
                None
            }
            Entry::Vacant(slot) => {
                slot.insert(Instant::now());
                Some(InFlightGuard {
                    target,
                    targets: Arc::clone(&self.targets),
                })
            }
        }
    }

    pub fn in_flight(&self, target: &str) -> bool {
        self.targets.contains_key(target)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    fn clear(&self) {
        self.targets.clear();
    }
}

/// Releases the claim on drop, whether the mutation settled or the caller
/// abandoned the outcome mid-flight.
pub struct InFlightGuard {
    target: TargetId,
    targets: Arc<DashMap<TargetId, Instant>>,
}

impl InFlightGuard {
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.targets.remove(&self.target);
    }
}

static GLOBAL_INFLIGHT: OnceCell<InFlightRegistry> = OnceCell::new();

/// Process-wide registry for callers that do not thread their own through.
pub fn global_inflight() -> InFlightRegistry {
    GLOBAL_INFLIGHT.get_or_init(InFlightRegistry::new).clone()
}

pub fn reset_global_inflight_for_test() {
    if let Some(registry) = GLOBAL_INFLIGHT.get() {
        registry.clear();
    }
}
