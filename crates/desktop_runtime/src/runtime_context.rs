//! Composition root for the desktop core.
//!
//! [`DesktopRuntime`] owns the state aggregate, the event bus, the persistence scheduler, and the
//! boot gate. Hosts drive it with input operations, [`DesktopRuntime::tick`] for timers, and the
//! split hydration calls when a user identity appears.

use futures::future::LocalBoxFuture;
use platform_host::{Clock, HostServices, HostStrategy};
use tracing::{debug, info};

use crate::{
    apps::builtin_app_registry,
    boot::BootSequencer,
    config::DesktopConfig,
    deep_link,
    effect_executor::run_effects,
    event_bus::{EventBus, EventFilter, EventPriority, Subscription},
    events::DesktopEvent,
    model::{
        AppDescriptor, AppId, DesktopState, IconId, OpenWindowRequest, Point, ProcessRecord, Size,
        WindowId,
    },
    persistence::{HydrationOutcome, HydrationStatus, PersistenceSync, SyncChannel},
    reducer::{reduce_desktop, DesktopAction},
    viewport::ViewportContext,
};

pub struct DesktopRuntime {
    host: HostServices,
    config: DesktopConfig,
    state: DesktopState,
    bus: EventBus,
    persistence: PersistenceSync,
    boot: BootSequencer,
}

impl DesktopRuntime {
    pub fn new(
        host: HostServices,
        config: DesktopConfig,
        registry: Vec<AppDescriptor>,
        viewport: ViewportContext,
    ) -> Self {
        let bus = EventBus::new();
        let persistence = PersistenceSync::new(
            config.persistence.clone(),
            host.preferences.clone(),
            host.spawner.clone(),
            bus.publisher(),
        );
        let boot = BootSequencer::new(&config.boot, host.clock.now_ms());
        let state = DesktopState::new(registry, viewport, &config);
        info!(
            host = host.host_strategy.as_str(),
            apps = state.registry.len(),
            "desktop runtime created"
        );
        Self {
            host,
            config,
            state,
            bus,
            persistence,
            boot,
        }
    }

    /// Builds a runtime over the application catalog baked into this crate.
    pub fn with_builtin_apps(
        host: HostServices,
        config: DesktopConfig,
        viewport: ViewportContext,
    ) -> Self {
        Self::new(host, config, builtin_app_registry(), viewport)
    }

    pub fn state(&self) -> &DesktopState {
        &self.state
    }

    pub fn config(&self) -> &DesktopConfig {
        &self.config
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn host_strategy(&self) -> HostStrategy {
        self.host.host_strategy
    }

    pub fn identity(&self) -> Option<&str> {
        self.persistence.identity()
    }

    pub fn is_hydrated(&self) -> bool {
        self.persistence.is_hydrated()
    }

    pub fn is_booting(&self) -> bool {
        self.boot.is_booting()
    }

    pub fn subscribe<F>(&self, priority: EventPriority, filter: EventFilter, handler: F) -> Subscription
    where
        F: FnMut(&DesktopEvent) + 'static,
    {
        self.bus.subscribe(priority, filter, handler)
    }

    fn now_ms(&self) -> u64 {
        self.host.clock.now_ms()
    }

    /// Reduces `action` and runs its effects. Returns false when the action referenced something
    /// that does not exist; nothing changes in that case.
    pub fn dispatch(&mut self, action: DesktopAction) -> bool {
        let now_ms = self.now_ms();
        match reduce_desktop(&mut self.state, action, now_ms) {
            Ok(effects) => {
                run_effects(effects, &self.bus, &mut self.persistence, now_ms);
                true
            }
            Err(err) => {
                debug!("desktop action ignored: {err}");
                false
            }
        }
    }

    /// Opens a window and returns its id; the new window is focused.
    pub fn open_window(&mut self, request: OpenWindowRequest) -> Option<WindowId> {
        self.dispatch(DesktopAction::OpenWindow(request))
            .then(|| self.state.windows.focused_window_id())
            .flatten()
    }

    pub fn close_window(&mut self, window_id: WindowId) -> bool {
        self.dispatch(DesktopAction::CloseWindow { window_id })
    }

    pub fn focus_window(&mut self, window_id: WindowId) -> bool {
        self.dispatch(DesktopAction::FocusWindow { window_id })
    }

    pub fn minimize_window(&mut self, window_id: WindowId) -> bool {
        self.dispatch(DesktopAction::MinimizeWindow { window_id })
    }

    pub fn zoom_window(&mut self, window_id: WindowId) -> bool {
        self.dispatch(DesktopAction::ZoomWindow { window_id })
    }

    pub fn move_window(&mut self, window_id: WindowId, x: i32, y: i32, snap: bool) -> bool {
        self.dispatch(DesktopAction::MoveWindow {
            window_id,
            position: Point::new(x, y),
            snap,
        })
    }

    pub fn resize_window(&mut self, window_id: WindowId, w: i32, h: i32) -> bool {
        self.dispatch(DesktopAction::ResizeWindow {
            window_id,
            size: Size::new(w, h),
        })
    }

    pub fn activate_title_bar(&mut self, window_id: WindowId) -> bool {
        self.dispatch(DesktopAction::ActivateTitleBar { window_id })
    }

    pub fn toggle_taskbar_window(&mut self, window_id: WindowId) -> bool {
        self.dispatch(DesktopAction::ToggleTaskbarWindow { window_id })
    }

    /// Launches (or focuses) `descriptor` and returns its primary window.
    pub fn launch_app(&mut self, descriptor: AppDescriptor) -> Option<WindowId> {
        let app_id = descriptor.app_id.clone();
        self.dispatch(DesktopAction::LaunchApp(descriptor));
        self.primary_window(&app_id)
    }

    /// Launches (or focuses) a registered application by id.
    pub fn launch_app_by_id(&mut self, app_id: &AppId) -> Option<WindowId> {
        self.dispatch(DesktopAction::LaunchAppById {
            app_id: app_id.clone(),
        });
        self.primary_window(app_id)
    }

    pub fn terminate_app(&mut self, app_id: &AppId) -> bool {
        self.dispatch(DesktopAction::TerminateApp {
            app_id: app_id.clone(),
        })
    }

    pub fn suspend_app(&mut self, app_id: &AppId) -> bool {
        self.dispatch(DesktopAction::SuspendApp {
            app_id: app_id.clone(),
        })
    }

    pub fn resume_app(&mut self, app_id: &AppId) -> bool {
        self.dispatch(DesktopAction::ResumeApp {
            app_id: app_id.clone(),
        })
    }

    pub fn move_icon(&mut self, icon_id: &IconId, x: i32, y: i32) -> bool {
        self.dispatch(DesktopAction::MoveIcon {
            icon_id: icon_id.clone(),
            position: Point::new(x, y),
        })
    }

    pub fn set_viewport(&mut self, viewport: ViewportContext) -> bool {
        self.dispatch(DesktopAction::SetViewport { viewport })
    }

    fn primary_window(&self, app_id: &AppId) -> Option<WindowId> {
        self.state
            .processes
            .get(app_id)
            .and_then(ProcessRecord::primary_window)
    }

    /// Launches every registered application named by a `?open=` query, in link order.
    pub fn open_deep_link(&mut self, query: &str) -> Vec<WindowId> {
        deep_link::parse_query(query)
            .open
            .iter()
            .filter_map(|app_id| self.launch_app_by_id(app_id))
            .collect()
    }

    /// Starts hydration for `identity`. The returned future touches only the backend; hand its
    /// output to [`Self::finish_hydration`].
    pub fn begin_hydration(&mut self, identity: &str) -> LocalBoxFuture<'static, HydrationOutcome> {
        if self.persistence.is_armed(SyncChannel::Reset) {
            // A new identity arrived inside the reset grace period; finish the reset first.
            self.dispatch(DesktopAction::ResetToDefaults);
        }
        self.persistence.begin_hydration(identity)
    }

    pub fn finish_hydration(&mut self, outcome: HydrationOutcome) -> HydrationStatus {
        let identity = outcome.identity.clone();
        let status = self.persistence.finish_hydration(outcome);
        let restored = match &status {
            HydrationStatus::Stale => return status,
            HydrationStatus::Restored(snapshot) => {
                self.dispatch(DesktopAction::HydrateSnapshot {
                    snapshot: snapshot.clone(),
                });
                true
            }
            HydrationStatus::NotFound | HydrationStatus::Failed(_) => false,
        };
        self.bus
            .publish(DesktopEvent::PreferencesHydrated { identity, restored });
        self.poll_boot(self.now_ms());
        status
    }

    /// Convenience form of the split hydration calls for hosts that own the runtime exclusively.
    pub async fn load_preferences(&mut self, identity: &str) -> HydrationStatus {
        let load = self.begin_hydration(identity);
        let outcome = load.await;
        self.finish_hydration(outcome)
    }

    /// Identity loss: final save, pending saves dropped, reset after the grace delay.
    pub fn sign_out(&mut self) -> bool {
        let now_ms = self.now_ms();
        self.persistence.sign_out(&self.state, now_ms)
    }

    /// Fires due timers and re-evaluates the boot gate.
    pub fn tick(&mut self) {
        let now_ms = self.now_ms();
        for channel in self.persistence.take_due(now_ms) {
            match channel {
                SyncChannel::Reset => {
                    info!("resetting desktop to defaults");
                    self.dispatch(DesktopAction::ResetToDefaults);
                }
                SyncChannel::General | SyncChannel::Icons => {
                    self.persistence.flush(channel, &self.state);
                }
            }
        }
        self.poll_boot(now_ms);
    }

    /// Earliest time a [`Self::tick`] would have work to do.
    pub fn next_timer_due_at(&self) -> Option<u64> {
        match (self.persistence.next_due_at(), self.boot.min_ready_at()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn poll_boot(&mut self, now_ms: u64) {
        let identity_present = self.persistence.identity().is_some();
        let hydrated = self.persistence.is_hydrated();
        if self.boot.poll(now_ms, identity_present, hydrated) {
            self.bus.publish(DesktopEvent::BootCompleted);
        }
    }
}
