//! Time helpers and the injectable clock seam used by debounce and boot timers.

use std::{cell::Cell, rc::Rc};
#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};

thread_local! {
    static LAST_SNAPSHOT_TIMESTAMP_MS: Cell<u64> = const { Cell::new(0) };
}

/// Returns the current unix timestamp in milliseconds.
pub fn unix_time_ms_now() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now().max(0.0) as u64
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Returns a monotonic unix millisecond timestamp for snapshot stamping.
///
/// Values are strictly increasing within the current thread even when the system clock does not
/// advance, so two snapshots built back to back still order correctly at the store.
pub fn next_monotonic_timestamp_ms() -> u64 {
    let now = unix_time_ms_now();
    LAST_SNAPSHOT_TIMESTAMP_MS.with(|last| {
        let next = now.max(last.get().saturating_add(1));
        last.set(next);
        next
    })
}

/// Millisecond clock consulted by the runtime for timers and lifecycle stamps.
pub trait Clock {
    /// Returns the current time in milliseconds. Only differences between readings matter.
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
/// Wall clock backed by [`unix_time_ms_now`].
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        unix_time_ms_now()
    }
}

#[derive(Debug, Clone, Default)]
/// Manually advanced clock for headless hosts and deterministic tests.
///
/// Clones share the same reading.
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    /// Creates a clock reading `start_ms`.
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    /// Jumps the clock to `now_ms`.
    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }

    /// Advances the clock by `delta_ms`.
    pub fn advance(&self, delta_ms: u64) {
        self.now.set(self.now.get().saturating_add(delta_ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}
