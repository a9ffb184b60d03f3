//! Reducer actions, side-effect intents, and transition logic for the desktop runtime.

use platform_host::PreferenceSnapshot;
use thiserror::Error;

use crate::{
    events::DesktopEvent,
    icons::IconDragEnd,
    model::{
        AppDescriptor, AppId, DesktopState, IconId, OpenWindowRequest, Point, Size, WindowId,
        WindowState,
    },
    persistence,
    process_manager::{LaunchOutcome, OpenedWindow},
    viewport::ViewportContext,
    window_manager::{ClosedWindow, FocusChange},
};

#[derive(Debug, Clone, PartialEq)]
/// Actions accepted by [`reduce_desktop`] to mutate [`DesktopState`].
pub enum DesktopAction {
    /// Open a window, starting its process if needed.
    OpenWindow(OpenWindowRequest),
    CloseWindow {
        window_id: WindowId,
    },
    FocusWindow {
        window_id: WindowId,
    },
    MinimizeWindow {
        window_id: WindowId,
    },
    /// Toggle maximized and normal.
    ZoomWindow {
        window_id: WindowId,
    },
    MoveWindow {
        window_id: WindowId,
        position: Point,
        snap: bool,
    },
    ResizeWindow {
        window_id: WindowId,
        size: Size,
    },
    /// Title-bar press; a second press inside the shade window toggles shading.
    ActivateTitleBar {
        window_id: WindowId,
    },
    ToggleShade {
        window_id: WindowId,
    },
    /// Taskbar button: restore if minimized, minimize if focused, focus otherwise.
    ToggleTaskbarWindow {
        window_id: WindowId,
    },
    LaunchApp(AppDescriptor),
    /// Launch an application from the registry held in state.
    LaunchAppById {
        app_id: AppId,
    },
    TerminateApp {
        app_id: AppId,
    },
    SuspendApp {
        app_id: AppId,
    },
    ResumeApp {
        app_id: AppId,
    },
    MoveIcon {
        icon_id: IconId,
        position: Point,
    },
    BeginIconDrag {
        icon_id: IconId,
        pointer: Point,
    },
    UpdateIconDrag {
        pointer: Point,
    },
    EndIconDrag {
        pointer: Point,
    },
    SetTheme {
        theme_id: String,
    },
    PinApp {
        app_id: AppId,
    },
    UnpinApp {
        app_id: AppId,
    },
    /// Replace the viewport and pull every window and icon back inside it.
    SetViewport {
        viewport: ViewportContext,
    },
    HydrateSnapshot {
        snapshot: PreferenceSnapshot,
    },
    ResetToDefaults,
}

#[derive(Debug, Clone, PartialEq)]
/// Side-effect intents emitted by [`reduce_desktop`] for the runtime to execute.
pub enum RuntimeEffect {
    /// Publish an event on the bus.
    Emit(DesktopEvent),
    /// Arm the general (full snapshot) save channel.
    PersistPreferences,
    /// Arm the icon-only save channel.
    PersistIconLayout,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Lookup failures. The runtime treats every variant as a silent no-op.
pub enum ReducerError {
    #[error("window {0} not found")]
    WindowNotFound(WindowId),
    #[error("process `{0}` is not running")]
    ProcessNotFound(AppId),
    #[error("icon `{0}` not found")]
    IconNotFound(IconId),
    #[error("application `{0}` is not registered")]
    UnknownApp(AppId),
    #[error("no icon drag in progress")]
    NoIconDrag,
}

/// Applies a [`DesktopAction`] to the desktop state and collects resulting side effects.
///
/// `now_ms` stamps process launches and times title-bar and icon gestures.
///
/// # Errors
///
/// Returns a [`ReducerError`] when the action references a window, process, icon, or
/// application that does not exist. State is left untouched in that case.
pub fn reduce_desktop(
    state: &mut DesktopState,
    action: DesktopAction,
    now_ms: u64,
) -> Result<Vec<RuntimeEffect>, ReducerError> {
    let mut effects = Vec::new();
    match action {
        DesktopAction::OpenWindow(request) => {
            let opened =
                state
                    .processes
                    .open_window(request, &mut state.windows, &state.viewport, now_ms);
            push_opened(state, opened, &mut effects);
            effects.push(RuntimeEffect::PersistPreferences);
        }
        DesktopAction::CloseWindow { window_id } => {
            let closed = state
                .windows
                .close(window_id)
                .ok_or(ReducerError::WindowNotFound(window_id))?;
            let process_id = closed.record.process_id.clone();
            push_closed(state, &closed, &mut effects);
            if state.processes.detach_window(&process_id, window_id) {
                emit(&mut effects, DesktopEvent::ProcessTerminated { process_id });
            }
            effects.push(RuntimeEffect::PersistPreferences);
        }
        DesktopAction::FocusWindow { window_id } => {
            let change = state
                .windows
                .focus(window_id)
                .ok_or(ReducerError::WindowNotFound(window_id))?;
            push_focus(state, window_id, change, &mut effects);
        }
        DesktopAction::MinimizeWindow { window_id } => {
            require_window(state, window_id)?;
            if state.windows.minimize(window_id) {
                emit(&mut effects, DesktopEvent::WindowMinimized { window_id });
            }
        }
        DesktopAction::ZoomWindow { window_id } => {
            require_window(state, window_id)?;
            if let Some(next) = state.windows.zoom(window_id, &state.viewport) {
                emit(
                    &mut effects,
                    DesktopEvent::WindowZoomed {
                        window_id,
                        state: next,
                    },
                );
                effects.push(RuntimeEffect::PersistPreferences);
            }
        }
        DesktopAction::MoveWindow {
            window_id,
            position,
            snap,
        } => {
            require_window(state, window_id)?;
            if let Some(position) = state
                .windows
                .move_to(window_id, position, snap, &state.viewport)
            {
                emit(&mut effects, DesktopEvent::WindowMoved { window_id, position });
                effects.push(RuntimeEffect::PersistPreferences);
            }
        }
        DesktopAction::ResizeWindow { window_id, size } => {
            require_window(state, window_id)?;
            if let Some(size) = state.windows.resize(window_id, size, &state.viewport) {
                emit(&mut effects, DesktopEvent::WindowResized { window_id, size });
                effects.push(RuntimeEffect::PersistPreferences);
            }
        }
        DesktopAction::ActivateTitleBar { window_id } => {
            let activation = state
                .windows
                .activate_title_bar(window_id, now_ms)
                .ok_or(ReducerError::WindowNotFound(window_id))?;
            push_focus(state, window_id, activation.focus, &mut effects);
            if let Some(next) = activation.shade_toggled {
                emit(
                    &mut effects,
                    DesktopEvent::WindowShaded {
                        window_id,
                        state: next,
                    },
                );
            }
        }
        DesktopAction::ToggleShade { window_id } => {
            require_window(state, window_id)?;
            if let Some(next) = state.windows.toggle_shade(window_id) {
                emit(
                    &mut effects,
                    DesktopEvent::WindowShaded {
                        window_id,
                        state: next,
                    },
                );
            }
        }
        DesktopAction::ToggleTaskbarWindow { window_id } => {
            let window = state
                .windows
                .get(window_id)
                .ok_or(ReducerError::WindowNotFound(window_id))?;
            let next = if window.state != WindowState::Minimized && window.is_focused {
                DesktopAction::MinimizeWindow { window_id }
            } else {
                DesktopAction::FocusWindow { window_id }
            };
            effects.extend(reduce_desktop(state, next, now_ms)?);
        }
        DesktopAction::LaunchApp(descriptor) => {
            launch(state, &descriptor, now_ms, &mut effects);
        }
        DesktopAction::LaunchAppById { app_id } => {
            let descriptor = state
                .descriptor(&app_id)
                .cloned()
                .ok_or(ReducerError::UnknownApp(app_id))?;
            launch(state, &descriptor, now_ms, &mut effects);
        }
        DesktopAction::TerminateApp { app_id } => {
            let closed = state
                .processes
                .terminate(&app_id, &mut state.windows)
                .ok_or_else(|| ReducerError::ProcessNotFound(app_id.clone()))?;
            for window in &closed {
                push_closed(state, window, &mut effects);
            }
            emit(
                &mut effects,
                DesktopEvent::ProcessTerminated { process_id: app_id },
            );
            effects.push(RuntimeEffect::PersistPreferences);
        }
        DesktopAction::SuspendApp { app_id } => {
            require_process(state, &app_id)?;
            if state.processes.suspend(&app_id) {
                emit(
                    &mut effects,
                    DesktopEvent::ProcessSuspended { process_id: app_id },
                );
            }
        }
        DesktopAction::ResumeApp { app_id } => {
            require_process(state, &app_id)?;
            if state.processes.resume(&app_id) {
                emit(
                    &mut effects,
                    DesktopEvent::ProcessResumed { process_id: app_id },
                );
            }
        }
        DesktopAction::MoveIcon { icon_id, position } => {
            let position = state
                .icons
                .move_icon(&icon_id, position, &state.viewport)
                .ok_or_else(|| ReducerError::IconNotFound(icon_id.clone()))?;
            emit(&mut effects, DesktopEvent::IconMoved { icon_id, position });
            effects.push(RuntimeEffect::PersistIconLayout);
        }
        DesktopAction::BeginIconDrag { icon_id, pointer } => {
            if !state.icons.begin_drag(&icon_id, pointer, now_ms) {
                return Err(ReducerError::IconNotFound(icon_id));
            }
        }
        DesktopAction::UpdateIconDrag { pointer } => {
            state
                .icons
                .update_drag(pointer, &state.viewport)
                .ok_or(ReducerError::NoIconDrag)?;
        }
        DesktopAction::EndIconDrag { pointer } => {
            let end = state
                .icons
                .end_drag(pointer, now_ms, &state.viewport)
                .ok_or(ReducerError::NoIconDrag)?;
            match end {
                IconDragEnd::Click {
                    icon_id,
                    process_id,
                } => {
                    emit(
                        &mut effects,
                        DesktopEvent::IconActivated {
                            icon_id,
                            process_id: process_id.clone(),
                        },
                    );
                    if let Some(descriptor) =
                        process_id.and_then(|id| state.descriptor(&id).cloned())
                    {
                        launch(state, &descriptor, now_ms, &mut effects);
                    }
                }
                IconDragEnd::Moved { icon_id, position } => {
                    emit(&mut effects, DesktopEvent::IconMoved { icon_id, position });
                    effects.push(RuntimeEffect::PersistIconLayout);
                }
            }
        }
        DesktopAction::SetTheme { theme_id } => {
            if state.theme_id != theme_id {
                state.theme_id = theme_id.clone();
                emit(&mut effects, DesktopEvent::ThemeChanged { theme_id });
                effects.push(RuntimeEffect::PersistPreferences);
            }
        }
        DesktopAction::PinApp { app_id } => {
            if !state.pinned_apps.contains(&app_id) {
                state.pinned_apps.push(app_id);
                push_pinned(state, &mut effects);
            }
        }
        DesktopAction::UnpinApp { app_id } => {
            let before = state.pinned_apps.len();
            state.pinned_apps.retain(|pinned| pinned != &app_id);
            if state.pinned_apps.len() != before {
                push_pinned(state, &mut effects);
            }
        }
        DesktopAction::SetViewport { viewport } => {
            state.viewport = viewport;
            state.windows.reclamp_all(&state.viewport);
            state.icons.reclamp_all(&state.viewport);
        }
        DesktopAction::HydrateSnapshot { snapshot } => {
            persistence::apply_snapshot(state, &snapshot);
        }
        DesktopAction::ResetToDefaults => {
            state.reset_to_defaults();
            emit(&mut effects, DesktopEvent::SessionReset);
        }
    }

    Ok(effects)
}

fn emit(effects: &mut Vec<RuntimeEffect>, event: DesktopEvent) {
    effects.push(RuntimeEffect::Emit(event));
}

fn require_window(state: &DesktopState, window_id: WindowId) -> Result<(), ReducerError> {
    state
        .windows
        .get(window_id)
        .map(|_| ())
        .ok_or(ReducerError::WindowNotFound(window_id))
}

fn require_process(state: &DesktopState, app_id: &AppId) -> Result<(), ReducerError> {
    if state.processes.is_running(app_id) {
        Ok(())
    } else {
        Err(ReducerError::ProcessNotFound(app_id.clone()))
    }
}

fn launch(
    state: &mut DesktopState,
    descriptor: &AppDescriptor,
    now_ms: u64,
    effects: &mut Vec<RuntimeEffect>,
) {
    let outcome = state
        .processes
        .launch(descriptor, &mut state.windows, &state.viewport, now_ms);
    match outcome {
        LaunchOutcome::Focused { window_id, change } => {
            push_focus(state, window_id, change, effects);
        }
        LaunchOutcome::Launched { window_id } => {
            push_opened(
                state,
                OpenedWindow {
                    window_id,
                    process_created: true,
                },
                effects,
            );
            effects.push(RuntimeEffect::PersistPreferences);
        }
    }
}

fn push_opened(state: &DesktopState, opened: OpenedWindow, effects: &mut Vec<RuntimeEffect>) {
    let Some(window) = state.windows.get(opened.window_id) else {
        return;
    };
    if opened.process_created {
        let display_name = state
            .processes
            .get(&window.process_id)
            .map(|process| process.display_name.clone())
            .unwrap_or_else(|| window.title.clone());
        emit(
            effects,
            DesktopEvent::ProcessLaunched {
                process_id: window.process_id.clone(),
                display_name,
            },
        );
    }
    emit(
        effects,
        DesktopEvent::WindowOpened {
            window_id: window.id,
            process_id: window.process_id.clone(),
            title: window.title.clone(),
        },
    );
    emit(
        effects,
        DesktopEvent::WindowFocused {
            window_id: window.id,
            process_id: window.process_id.clone(),
        },
    );
    if window.state == WindowState::Maximized {
        emit(
            effects,
            DesktopEvent::WindowZoomed {
                window_id: window.id,
                state: WindowState::Maximized,
            },
        );
    }
}

fn push_closed(state: &DesktopState, closed: &ClosedWindow, effects: &mut Vec<RuntimeEffect>) {
    emit(
        effects,
        DesktopEvent::WindowClosed {
            window_id: closed.record.id,
            process_id: closed.record.process_id.clone(),
        },
    );
    if let Some(refocused) = closed.refocused {
        push_focus(state, refocused, FocusChange::Raised, effects);
    }
}

fn push_focus(
    state: &DesktopState,
    window_id: WindowId,
    change: FocusChange,
    effects: &mut Vec<RuntimeEffect>,
) {
    if change == FocusChange::Unchanged {
        return;
    }
    if let Some(window) = state.windows.get(window_id) {
        emit(
            effects,
            DesktopEvent::WindowFocused {
                window_id,
                process_id: window.process_id.clone(),
            },
        );
    }
}

fn push_pinned(state: &DesktopState, effects: &mut Vec<RuntimeEffect>) {
    emit(
        effects,
        DesktopEvent::PinnedAppsChanged {
            pinned_apps: state.pinned_apps.clone(),
        },
    );
    effects.push(RuntimeEffect::PersistPreferences);
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{apps::builtin_app_registry, config::DesktopConfig, events::DesktopEventKind};

    fn state() -> DesktopState {
        DesktopState::new(
            builtin_app_registry(),
            ViewportContext::new(1920, 1080, 20, 80),
            &DesktopConfig::default(),
        )
    }

    fn kinds(effects: &[RuntimeEffect]) -> Vec<DesktopEventKind> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                RuntimeEffect::Emit(event) => Some(event.kind()),
                _ => None,
            })
            .collect()
    }

    fn launch_by_id(state: &mut DesktopState, app: &str) -> WindowId {
        reduce_desktop(
            state,
            DesktopAction::LaunchAppById {
                app_id: AppId::trusted(app),
            },
            0,
        )
        .expect("launch");
        state
            .processes
            .get(&AppId::trusted(app))
            .and_then(|process| process.primary_window())
            .expect("primary window")
    }

    #[test]
    fn open_window_starts_process_and_emits_in_order() {
        let mut state = state();
        let effects = reduce_desktop(
            &mut state,
            DesktopAction::OpenWindow(OpenWindowRequest::new(
                AppId::trusted("scratch"),
                "Scratch",
                Size::new(600, 400),
            )),
            42,
        )
        .expect("open");

        assert_eq!(
            kinds(&effects),
            vec![
                DesktopEventKind::ProcessLaunch,
                DesktopEventKind::WindowOpen,
                DesktopEventKind::WindowFocus,
            ]
        );
        assert!(effects.contains(&RuntimeEffect::PersistPreferences));
        let window = &state.windows.windows()[0];
        assert_eq!(window.position(), Point::new(660, 290));
    }

    #[test]
    fn closing_only_window_terminates_process() {
        let mut state = state();
        let window_id = launch_by_id(&mut state, "calculator");
        let effects = reduce_desktop(&mut state, DesktopAction::CloseWindow { window_id }, 10)
            .expect("close");

        assert_eq!(
            kinds(&effects),
            vec![DesktopEventKind::WindowClose, DesktopEventKind::ProcessTerminate]
        );
        assert!(!state.processes.is_running(&AppId::trusted("calculator")));
    }

    #[test]
    fn focusing_focused_window_emits_nothing() {
        let mut state = state();
        let window_id = launch_by_id(&mut state, "calculator");
        let effects = reduce_desktop(&mut state, DesktopAction::FocusWindow { window_id }, 0)
            .expect("focus");
        assert!(effects.is_empty());
    }

    #[test]
    fn taskbar_toggle_minimizes_if_focused_and_restores_if_minimized() {
        let mut state = state();
        let window_id = launch_by_id(&mut state, "text-editor");

        let effects = reduce_desktop(&mut state, DesktopAction::ToggleTaskbarWindow { window_id }, 0)
            .expect("minimize");
        assert_eq!(kinds(&effects), vec![DesktopEventKind::WindowMinimize]);
        assert_eq!(state.windows.focused_window_id(), None);

        let effects = reduce_desktop(&mut state, DesktopAction::ToggleTaskbarWindow { window_id }, 0)
            .expect("restore");
        assert_eq!(kinds(&effects), vec![DesktopEventKind::WindowFocus]);
        assert_eq!(state.windows.focused_window_id(), Some(window_id));
    }

    #[test]
    fn unknown_ids_fail_without_touching_state() {
        let mut state = state();
        launch_by_id(&mut state, "calculator");
        let before = state.clone();

        for action in [
            DesktopAction::CloseWindow {
                window_id: WindowId(77),
            },
            DesktopAction::ZoomWindow {
                window_id: WindowId(77),
            },
            DesktopAction::TerminateApp {
                app_id: AppId::trusted("ghost"),
            },
            DesktopAction::LaunchAppById {
                app_id: AppId::trusted("ghost"),
            },
            DesktopAction::MoveIcon {
                icon_id: IconId("ghost".to_string()),
                position: Point::new(1, 1),
            },
            DesktopAction::EndIconDrag {
                pointer: Point::new(0, 0),
            },
        ] {
            assert!(reduce_desktop(&mut state, action, 0).is_err());
        }
        assert_eq!(state, before);
    }

    #[test]
    fn icon_move_arms_only_the_icon_channel() {
        let mut state = state();
        let effects = reduce_desktop(
            &mut state,
            DesktopAction::MoveIcon {
                icon_id: IconId("calculator".to_string()),
                position: Point::new(400, 400),
            },
            0,
        )
        .expect("move icon");
        assert_eq!(kinds(&effects), vec![DesktopEventKind::IconMove]);
        assert!(effects.contains(&RuntimeEffect::PersistIconLayout));
        assert!(!effects.contains(&RuntimeEffect::PersistPreferences));
    }

    #[test]
    fn icon_click_launches_its_app() {
        let mut state = state();
        let icon_id = IconId("file-browser".to_string());
        reduce_desktop(
            &mut state,
            DesktopAction::BeginIconDrag {
                icon_id,
                pointer: Point::new(30, 60),
            },
            1_000,
        )
        .expect("begin");
        let effects = reduce_desktop(
            &mut state,
            DesktopAction::EndIconDrag {
                pointer: Point::new(31, 60),
            },
            1_050,
        )
        .expect("end");

        assert_eq!(
            kinds(&effects),
            vec![
                DesktopEventKind::IconActivate,
                DesktopEventKind::ProcessLaunch,
                DesktopEventKind::WindowOpen,
                DesktopEventKind::WindowFocus,
            ]
        );
        assert!(state.processes.is_running(&AppId::trusted("file-browser")));
    }

    #[test]
    fn theme_and_pins_persist_only_on_change() {
        let mut state = state();
        let current = state.theme_id.clone();
        let effects = reduce_desktop(&mut state, DesktopAction::SetTheme { theme_id: current }, 0)
            .expect("same theme");
        assert!(effects.is_empty());

        let pin = DesktopAction::PinApp {
            app_id: AppId::trusted("calculator"),
        };
        let first = reduce_desktop(&mut state, pin.clone(), 0).expect("pin");
        let second = reduce_desktop(&mut state, pin, 0).expect("pin again");
        assert_eq!(kinds(&first), vec![DesktopEventKind::PinnedAppsChange]);
        assert!(second.is_empty());
        assert_eq!(state.pinned_apps, vec![AppId::trusted("calculator")]);
    }

    #[test]
    fn reset_restores_defaults_and_announces_it() {
        let mut state = state();
        launch_by_id(&mut state, "calculator");
        reduce_desktop(
            &mut state,
            DesktopAction::SetTheme {
                theme_id: "graphite".to_string(),
            },
            0,
        )
        .expect("theme");

        let effects =
            reduce_desktop(&mut state, DesktopAction::ResetToDefaults, 0).expect("reset");
        assert_eq!(kinds(&effects), vec![DesktopEventKind::SessionReset]);
        assert!(state.windows.is_empty());
        assert!(state.processes.processes().is_empty());
        let fresh = self::state();
        assert_eq!(state.icons, fresh.icons);
        assert_eq!(state.theme_id, fresh.theme_id);
        assert!(state.windows.remembered_geometries().is_empty());

        let reopened = launch_by_id(&mut state, "calculator");
        assert!(reopened.0 > 1, "window ids are not reused after a reset");
    }
}
