use std::time::Duration;

/// Delay schedule between retry attempts.
///
/// `delay(attempt)` takes the number of the attempt that just failed,
/// starting at 1, and returns how long to wait before the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackoffPolicy {
    /// Same delay before every retry. Used for validation-style rechecks.
    Fixed { delay: Duration },
    /// `base * attempt`: grows by `base` after each failure.
    Linear { base: Duration },
    /// Doubles from `initial`, capped at `max`.
    Exponential { initial: Duration, max: Duration },
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy::Linear {
            base: Duration::from_secs(2),
        }
    }
}

impl BackoffPolicy {
    pub fn fixed_secs(secs: u64) -> Self {
        BackoffPolicy::Fixed {
            delay: Duration::from_secs(secs),
        }
    }

    pub fn linear_ms(base_ms: u64) -> Self {
        BackoffPolicy::Linear {
            base: Duration::from_millis(base_ms),
        }
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match self {
            BackoffPolicy::Fixed { delay } => *delay,
            BackoffPolicy::Linear { base } => base.saturating_mul(attempt),
            BackoffPolicy::Exponential { initial, max } => {
                let shift = (attempt - 1).min(16);
                (*initial).saturating_mul(1u32 << shift).min(*max)
            }
        }
    }

    /// `delay(attempt)` stretched by a random 0–25% to avoid synchronized
    /// retry stampedes from many clients.
    pub fn jittered(&self, attempt: u32) -> Duration {
        use rand::Rng;
        let base = self.delay(attempt);
        let spread = base.as_millis() as u64 / 4;
        if spread == 0 {
            return base;
        }
        base + Duration::from_millis(rand::thread_rng().gen_range(0..=spread))
    }
}
