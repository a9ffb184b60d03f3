//! Preference snapshot projection plus the debounced, race-safe save scheduler.
//!
//! Two collapsing channels feed the backend: the general channel saves a full snapshot, the icon
//! channel saves icon positions only. Snapshots are built from the state at fire time, never at
//! arm time, so a burst of edits produces one save carrying the final values.

use std::{collections::BTreeMap, rc::Rc};

use futures::{
    future::LocalBoxFuture,
    task::{LocalSpawn, LocalSpawnExt},
    FutureExt,
};
use platform_host::{
    next_monotonic_timestamp_ms, PreferenceSnapshot, PreferencesBackend, WindowPlacement,
    WindowPlacementState,
};
use tracing::{debug, info, warn};

use crate::{
    config::PersistenceConfig,
    event_bus::EventPublisher,
    events::DesktopEvent,
    model::{AppId, DesktopState, WindowRect},
    scheduler::CollapsingScheduler,
    window_manager::{RememberedGeometry, WindowManager},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SyncChannel {
    /// Full snapshot.
    General,
    /// Icon positions only.
    Icons,
    /// Grace timer between identity loss and the reset to defaults.
    Reset,
}

/// Builds the full preference projection of `state`.
pub fn snapshot_from_state(state: &DesktopState, stamp_ms: u64) -> PreferenceSnapshot {
    let mut windows: BTreeMap<String, WindowPlacement> = state
        .windows
        .remembered_geometries()
        .iter()
        .map(|(app_id, geometry)| (app_id.to_string(), placement(geometry)))
        .collect();
    for process in state.processes.processes() {
        let primary = process
            .primary_window()
            .and_then(|window_id| state.windows.get(window_id));
        if let Some(window) = primary {
            windows.insert(
                process.id.to_string(),
                placement(&WindowManager::geometry_of(window)),
            );
        }
    }

    let mut snapshot = icon_snapshot(state, stamp_ms);
    snapshot.windows = Some(windows);
    snapshot.theme_id = Some(state.theme_id.clone());
    snapshot.pinned_apps = Some(state.pinned_apps.iter().map(AppId::to_string).collect());
    snapshot
}

/// Builds a partial snapshot carrying only icon positions.
pub fn icon_snapshot(state: &DesktopState, stamp_ms: u64) -> PreferenceSnapshot {
    let mut snapshot = PreferenceSnapshot::empty(stamp_ms);
    snapshot.icon_positions = Some(state.icons.positions());
    snapshot
}

/// Applies every section present in `snapshot`. Invalid ids are skipped.
pub fn apply_snapshot(state: &mut DesktopState, snapshot: &PreferenceSnapshot) {
    if let Some(positions) = &snapshot.icon_positions {
        state.icons.apply_positions(positions, &state.viewport);
    }
    if let Some(windows) = &snapshot.windows {
        for (raw_id, placement) in windows {
            let Ok(app_id) = AppId::new(raw_id.as_str()) else {
                debug!(app_id = %raw_id, "skipping window placement with invalid app id");
                continue;
            };
            state.windows.remember_geometry(
                app_id,
                RememberedGeometry {
                    rect: WindowRect::new(placement.x, placement.y, placement.w, placement.h),
                    maximized: placement.state == WindowPlacementState::Maximized,
                },
            );
        }
    }
    if let Some(theme_id) = &snapshot.theme_id {
        state.theme_id = theme_id.clone();
    }
    if let Some(pinned) = &snapshot.pinned_apps {
        let mut apps: Vec<AppId> = Vec::new();
        for app_id in pinned.iter().filter_map(|raw| AppId::new(raw.as_str()).ok()) {
            if !apps.contains(&app_id) {
                apps.push(app_id);
            }
        }
        state.pinned_apps = apps;
    }
}

fn placement(geometry: &RememberedGeometry) -> WindowPlacement {
    WindowPlacement {
        x: geometry.rect.x,
        y: geometry.rect.y,
        w: geometry.rect.w,
        h: geometry.rect.h,
        state: if geometry.maximized {
            WindowPlacementState::Maximized
        } else {
            WindowPlacementState::Normal
        },
    }
}

/// Result of a backend load, tagged with the hydration request it answers.
#[derive(Debug, Clone, PartialEq)]
pub struct HydrationOutcome {
    pub identity: String,
    generation: u64,
    pub result: Result<Option<PreferenceSnapshot>, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HydrationStatus {
    /// The identity changed while the load was in flight; the result was discarded.
    Stale,
    Restored(PreferenceSnapshot),
    /// Nothing stored for the identity; defaults stay.
    NotFound,
    /// Load failed; defaults stay and saves are re-enabled anyway.
    Failed(String),
}

pub struct PersistenceSync {
    config: PersistenceConfig,
    backend: Rc<dyn PreferencesBackend>,
    spawner: Rc<dyn LocalSpawn>,
    publisher: EventPublisher,
    scheduler: CollapsingScheduler<SyncChannel>,
    identity: Option<String>,
    hydrated: bool,
    generation: u64,
}

impl std::fmt::Debug for PersistenceSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceSync")
            .field("identity", &self.identity)
            .field("hydrated", &self.hydrated)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

impl PersistenceSync {
    pub fn new(
        config: PersistenceConfig,
        backend: Rc<dyn PreferencesBackend>,
        spawner: Rc<dyn LocalSpawn>,
        publisher: EventPublisher,
    ) -> Self {
        Self {
            config,
            backend,
            spawner,
            publisher,
            scheduler: CollapsingScheduler::new(),
            identity: None,
            hydrated: false,
            generation: 0,
        }
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    pub fn is_armed(&self, channel: SyncChannel) -> bool {
        self.scheduler.is_armed(channel)
    }

    pub fn next_due_at(&self) -> Option<u64> {
        self.scheduler.next_due_at()
    }

    /// Arms a save channel. Suppressed while no identity is present or before hydration.
    pub fn request_save(&mut self, channel: SyncChannel, now_ms: u64) -> bool {
        if self.identity.is_none() || !self.hydrated {
            debug!(?channel, "preference save suppressed before hydration");
            return false;
        }
        let delay = match channel {
            SyncChannel::General => self.config.general_debounce_ms,
            SyncChannel::Icons => self.config.icon_debounce_ms,
            SyncChannel::Reset => return false,
        };
        self.scheduler.arm(channel, now_ms, delay);
        true
    }

    pub fn take_due(&mut self, now_ms: u64) -> Vec<SyncChannel> {
        self.scheduler.take_due(now_ms)
    }

    /// Issues the save for a fired channel, reading `state` now.
    pub fn flush(&mut self, channel: SyncChannel, state: &DesktopState) -> bool {
        let stamp = next_monotonic_timestamp_ms();
        let snapshot = match channel {
            SyncChannel::General => snapshot_from_state(state, stamp),
            SyncChannel::Icons => icon_snapshot(state, stamp),
            SyncChannel::Reset => return false,
        };
        self.save_now(snapshot)
    }

    fn save_now(&self, snapshot: PreferenceSnapshot) -> bool {
        let Some(identity) = self.identity.clone() else {
            return false;
        };
        if !self.hydrated {
            return false;
        }
        let backend = Rc::clone(&self.backend);
        let publisher = self.publisher.clone();
        let task = async move {
            match backend.save(&identity, &snapshot).await {
                Ok(()) => {
                    debug!(%identity, stamp = snapshot.updated_at_unix_ms, "preferences saved");
                    publisher.publish(DesktopEvent::PreferencesSaved { identity });
                }
                Err(error) => {
                    warn!(%identity, %error, "preference save failed");
                    publisher.publish(DesktopEvent::PreferencesSaveFailed { identity, error });
                }
            }
        };
        match self.spawner.spawn_local(task) {
            Ok(()) => true,
            Err(err) => {
                warn!("failed to spawn preference save: {err}");
                false
            }
        }
    }

    /// Switches to `identity` and returns the load to await. Pending saves are cancelled.
    pub fn begin_hydration(&mut self, identity: &str) -> LocalBoxFuture<'static, HydrationOutcome> {
        self.scheduler.cancel_all();
        self.generation += 1;
        self.identity = Some(identity.to_string());
        self.hydrated = false;

        let backend = Rc::clone(&self.backend);
        let identity = identity.to_string();
        let generation = self.generation;
        async move {
            let result = backend.load(&identity).await;
            HydrationOutcome {
                identity,
                generation,
                result,
            }
        }
        .boxed_local()
    }

    /// Accepts a load result. Results for an identity that is no longer current are discarded;
    /// every other result marks the sync hydrated, failures included.
    pub fn finish_hydration(&mut self, outcome: HydrationOutcome) -> HydrationStatus {
        let current = self.identity.as_deref() == Some(outcome.identity.as_str())
            && self.generation == outcome.generation;
        if !current {
            debug!(identity = %outcome.identity, "discarding stale hydration result");
            return HydrationStatus::Stale;
        }
        self.hydrated = true;
        match outcome.result {
            Ok(Some(snapshot)) => {
                info!(identity = %outcome.identity, "restored desktop preferences");
                HydrationStatus::Restored(snapshot)
            }
            Ok(None) => {
                info!(identity = %outcome.identity, "no stored preferences; keeping defaults");
                HydrationStatus::NotFound
            }
            Err(error) => {
                warn!(identity = %outcome.identity, %error, "preference load failed; keeping defaults");
                HydrationStatus::Failed(error)
            }
        }
    }

    /// Identity loss: one last full save, pending channels dropped, reset timer armed.
    pub fn sign_out(&mut self, state: &DesktopState, now_ms: u64) -> bool {
        if self.identity.is_none() {
            return false;
        }
        if self.hydrated {
            self.save_now(snapshot_from_state(state, next_monotonic_timestamp_ms()));
        }
        self.scheduler.cancel(SyncChannel::General);
        self.scheduler.cancel(SyncChannel::Icons);
        info!(identity = ?self.identity, "identity lost; resetting desktop after grace delay");
        self.identity = None;
        self.hydrated = false;
        self.generation += 1;
        self.scheduler
            .arm(SyncChannel::Reset, now_ms, self.config.reset_grace_ms);
        true
    }
}
