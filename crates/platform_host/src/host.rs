//! Host service bundle injected into the desktop runtime by the embedding layer.

use std::rc::Rc;

use futures::{executor::LocalSpawner, task::LocalSpawn};

use crate::{Clock, NoopPreferencesBackend, PreferencesBackend, SystemClock};

/// Stable host strategy selected for the current composition path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStrategy {
    /// Browser-backed composition (real preference endpoint, animation-frame ticks).
    Browser,
    /// Headless composition driven by an explicit executor and clock.
    Headless,
}

impl HostStrategy {
    /// Returns a stable string token for diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::Headless => "headless",
        }
    }
}

/// Runtime-selected host service bundle.
///
/// All environment-specific service selection happens before this bundle crosses into
/// `desktop_runtime`, which keeps the window/process core free of browser adapter details.
#[derive(Clone)]
pub struct HostServices {
    /// Identity-keyed preference snapshot backend.
    pub preferences: Rc<dyn PreferencesBackend>,
    /// Clock used for debounce, boot, and title-bar activation timing.
    pub clock: Rc<dyn Clock>,
    /// Local (single-threaded) spawner for fire-and-forget saves.
    pub spawner: Rc<dyn LocalSpawn>,
    /// Stable strategy identifier for diagnostics.
    pub host_strategy: HostStrategy,
}

impl HostServices {
    /// Builds a headless bundle around an executor spawner, with no durable preferences.
    pub fn headless(spawner: LocalSpawner) -> Self {
        Self {
            preferences: Rc::new(NoopPreferencesBackend),
            clock: Rc::new(SystemClock),
            spawner: Rc::new(spawner),
            host_strategy: HostStrategy::Headless,
        }
    }

    /// Replaces the preference backend.
    pub fn with_preferences(mut self, preferences: Rc<dyn PreferencesBackend>) -> Self {
        self.preferences = preferences;
        self
    }

    /// Replaces the clock.
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}
