//! Typed desktop events published on the [`crate::event_bus::EventBus`].

use serde::{Deserialize, Serialize};

use crate::model::{AppId, IconId, Point, Size, WindowId, WindowState};

/// Event discriminant used for subscription filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DesktopEventKind {
    WindowOpen,
    WindowClose,
    WindowFocus,
    WindowMinimize,
    WindowZoom,
    WindowShade,
    WindowMove,
    WindowResize,
    ProcessLaunch,
    ProcessTerminate,
    ProcessSuspend,
    ProcessResume,
    IconMove,
    IconActivate,
    ThemeChange,
    PinnedAppsChange,
    PreferencesHydrated,
    PreferencesSaved,
    PreferencesSaveFailed,
    BootComplete,
    SessionReset,
}

impl DesktopEventKind {
    /// Stable wire token.
    pub const fn token(self) -> &'static str {
        match self {
            Self::WindowOpen => "WINDOW_OPEN",
            Self::WindowClose => "WINDOW_CLOSE",
            Self::WindowFocus => "WINDOW_FOCUS",
            Self::WindowMinimize => "WINDOW_MINIMIZE",
            Self::WindowZoom => "WINDOW_ZOOM",
            Self::WindowShade => "WINDOW_SHADE",
            Self::WindowMove => "WINDOW_MOVE",
            Self::WindowResize => "WINDOW_RESIZE",
            Self::ProcessLaunch => "PROCESS_LAUNCH",
            Self::ProcessTerminate => "PROCESS_TERMINATE",
            Self::ProcessSuspend => "PROCESS_SUSPEND",
            Self::ProcessResume => "PROCESS_RESUME",
            Self::IconMove => "ICON_MOVE",
            Self::IconActivate => "ICON_ACTIVATE",
            Self::ThemeChange => "THEME_CHANGE",
            Self::PinnedAppsChange => "PINNED_APPS_CHANGE",
            Self::PreferencesHydrated => "PREFERENCES_HYDRATED",
            Self::PreferencesSaved => "PREFERENCES_SAVED",
            Self::PreferencesSaveFailed => "PREFERENCES_SAVE_FAILED",
            Self::BootComplete => "BOOT_COMPLETE",
            Self::SessionReset => "SESSION_RESET",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DesktopEvent {
    WindowOpened {
        window_id: WindowId,
        process_id: AppId,
        title: String,
    },
    WindowClosed {
        window_id: WindowId,
        process_id: AppId,
    },
    WindowFocused {
        window_id: WindowId,
        process_id: AppId,
    },
    WindowMinimized {
        window_id: WindowId,
    },
    WindowZoomed {
        window_id: WindowId,
        state: WindowState,
    },
    WindowShaded {
        window_id: WindowId,
        state: WindowState,
    },
    WindowMoved {
        window_id: WindowId,
        position: Point,
    },
    WindowResized {
        window_id: WindowId,
        size: Size,
    },
    ProcessLaunched {
        process_id: AppId,
        display_name: String,
    },
    ProcessTerminated {
        process_id: AppId,
    },
    ProcessSuspended {
        process_id: AppId,
    },
    ProcessResumed {
        process_id: AppId,
    },
    IconMoved {
        icon_id: IconId,
        position: Point,
    },
    IconActivated {
        icon_id: IconId,
        process_id: Option<AppId>,
    },
    ThemeChanged {
        theme_id: String,
    },
    PinnedAppsChanged {
        pinned_apps: Vec<AppId>,
    },
    /// Hydration finished; `restored` is false when defaults were kept.
    PreferencesHydrated {
        identity: String,
        restored: bool,
    },
    PreferencesSaved {
        identity: String,
    },
    PreferencesSaveFailed {
        identity: String,
        error: String,
    },
    BootCompleted,
    SessionReset,
}

impl DesktopEvent {
    pub fn kind(&self) -> DesktopEventKind {
        match self {
            Self::WindowOpened { .. } => DesktopEventKind::WindowOpen,
            Self::WindowClosed { .. } => DesktopEventKind::WindowClose,
            Self::WindowFocused { .. } => DesktopEventKind::WindowFocus,
            Self::WindowMinimized { .. } => DesktopEventKind::WindowMinimize,
            Self::WindowZoomed { .. } => DesktopEventKind::WindowZoom,
            Self::WindowShaded { .. } => DesktopEventKind::WindowShade,
            Self::WindowMoved { .. } => DesktopEventKind::WindowMove,
            Self::WindowResized { .. } => DesktopEventKind::WindowResize,
            Self::ProcessLaunched { .. } => DesktopEventKind::ProcessLaunch,
            Self::ProcessTerminated { .. } => DesktopEventKind::ProcessTerminate,
            Self::ProcessSuspended { .. } => DesktopEventKind::ProcessSuspend,
            Self::ProcessResumed { .. } => DesktopEventKind::ProcessResume,
            Self::IconMoved { .. } => DesktopEventKind::IconMove,
            Self::IconActivated { .. } => DesktopEventKind::IconActivate,
            Self::ThemeChanged { .. } => DesktopEventKind::ThemeChange,
            Self::PinnedAppsChanged { .. } => DesktopEventKind::PinnedAppsChange,
            Self::PreferencesHydrated { .. } => DesktopEventKind::PreferencesHydrated,
            Self::PreferencesSaved { .. } => DesktopEventKind::PreferencesSaved,
            Self::PreferencesSaveFailed { .. } => DesktopEventKind::PreferencesSaveFailed,
            Self::BootCompleted => DesktopEventKind::BootComplete,
            Self::SessionReset => DesktopEventKind::SessionReset,
        }
    }

    pub fn token(&self) -> &'static str {
        self.kind().token()
    }
}
