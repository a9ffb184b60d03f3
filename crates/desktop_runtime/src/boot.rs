//! Boot gating: the desktop reports ready once a minimum splash duration has elapsed and, when a
//! user identity is present, preference hydration has finished.

use tracing::info;

use crate::config::BootConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootSequencer {
    started_at_ms: u64,
    min_duration_ms: u64,
    booting: bool,
}

impl BootSequencer {
    pub fn new(config: &BootConfig, now_ms: u64) -> Self {
        Self {
            started_at_ms: now_ms,
            min_duration_ms: config.min_duration_ms,
            booting: true,
        }
    }

    pub fn is_booting(&self) -> bool {
        self.booting
    }

    /// Earliest time the minimum duration is satisfied, while still booting.
    pub fn min_ready_at(&self) -> Option<u64> {
        self.booting
            .then(|| self.started_at_ms.saturating_add(self.min_duration_ms))
    }

    /// Re-evaluates the gate. Returns true exactly once, on the call that completes boot.
    pub fn poll(&mut self, now_ms: u64, identity_present: bool, hydrated: bool) -> bool {
        if !self.booting {
            return false;
        }
        let elapsed = now_ms.saturating_sub(self.started_at_ms);
        if elapsed < self.min_duration_ms || (identity_present && !hydrated) {
            return false;
        }
        self.booting = false;
        info!(elapsed_ms = elapsed, "desktop boot complete");
        true
    }
}
