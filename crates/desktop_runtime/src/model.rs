use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    config::DesktopConfig, icons::DesktopIconLayout, process_manager::ProcessManager,
    viewport::ViewportContext, window_manager::WindowManager,
};

pub const DEFAULT_THEME_ID: &str = "classic-teal";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable application identifier; doubles as the id of the application's process.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AppId(String);

impl AppId {
    /// Returns an app id when `raw` is a lowercase kebab-case token.
    pub fn new(raw: impl Into<String>) -> Result<Self, String> {
        let raw = raw.into();
        if is_valid_app_id(&raw) {
            Ok(Self(raw))
        } else {
            Err(format!(
                "invalid application id `{raw}`; expected lowercase kebab-case"
            ))
        }
    }

    /// Creates an id without validation for trusted constants and generated catalogs.
    pub fn trusted(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn is_valid_app_id(raw: &str) -> bool {
    let Some(first) = raw.bytes().next() else {
        return false;
    };
    raw.len() <= 64
        && first.is_ascii_lowercase()
        && raw
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !raw.ends_with('-')
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IconId(pub String);

impl fmt::Display for IconId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub w: i32,
    pub h: i32,
}

impl Size {
    pub const fn new(w: i32, h: i32) -> Self {
        Self { w, h }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl WindowRect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_parts(origin: Point, size: Size) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            w: size.w,
            h: size.h,
        }
    }

    pub fn origin(self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(self) -> Size {
        Size::new(self.w, self.h)
    }

    pub fn right(self) -> i32 {
        self.x.saturating_add(self.w)
    }

    pub fn bottom(self) -> i32 {
        self.y.saturating_add(self.h)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
    #[default]
    Normal,
    Minimized,
    Maximized,
    /// Collapsed to the title strip; geometry is kept as-is.
    Shaded,
}

impl WindowState {
    pub const fn token(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Minimized => "minimized",
            Self::Maximized => "maximized",
            Self::Shaded => "shaded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRecord {
    pub id: WindowId,
    pub process_id: AppId,
    pub title: String,
    pub rect: WindowRect,
    pub state: WindowState,
    pub z_index: u32,
    pub is_focused: bool,
    pub resizable: bool,
    pub min_size: Option<Size>,
    pub max_size: Option<Size>,
    /// Pre-maximize bounds, restored by the next zoom.
    pub saved_geometry: Option<WindowRect>,
}

impl WindowRecord {
    pub fn position(&self) -> Point {
        self.rect.origin()
    }

    pub fn size(&self) -> Size {
        self.rect.size()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    #[default]
    Running,
    Suspended,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub id: AppId,
    pub display_name: String,
    /// Owned windows in open order; the first entry is the primary window.
    pub window_ids: Vec<WindowId>,
    pub lifecycle: LifecycleState,
    pub launched_at_ms: u64,
}

impl ProcessRecord {
    pub fn primary_window(&self) -> Option<WindowId> {
        self.window_ids.first().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopIcon {
    pub id: IconId,
    pub process_id: Option<AppId>,
    pub label: String,
    pub position: Point,
}

/// Static application registry entry consumed at initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppDescriptor {
    pub app_id: AppId,
    pub display_name: String,
    pub desktop_icon_label: Option<String>,
    pub default_size: Size,
    pub min_size: Option<Size>,
    pub max_size: Option<Size>,
    pub resizable: bool,
    pub show_on_desktop: bool,
}

impl AppDescriptor {
    pub fn new(app_id: AppId, display_name: impl Into<String>, default_size: Size) -> Self {
        Self {
            app_id,
            display_name: display_name.into(),
            desktop_icon_label: None,
            default_size,
            min_size: None,
            max_size: None,
            resizable: true,
            show_on_desktop: false,
        }
    }

    pub fn icon_label(&self) -> &str {
        self.desktop_icon_label
            .as_deref()
            .unwrap_or(&self.display_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenWindowRequest {
    pub process_id: AppId,
    pub title: String,
    pub size: Size,
    pub min_size: Option<Size>,
    pub max_size: Option<Size>,
    pub resizable: bool,
}

impl OpenWindowRequest {
    pub fn new(process_id: AppId, title: impl Into<String>, size: Size) -> Self {
        Self {
            process_id,
            title: title.into(),
            size,
            min_size: None,
            max_size: None,
            resizable: true,
        }
    }

    pub fn from_descriptor(descriptor: &AppDescriptor) -> Self {
        Self {
            process_id: descriptor.app_id.clone(),
            title: descriptor.display_name.clone(),
            size: descriptor.default_size,
            min_size: descriptor.min_size,
            max_size: descriptor.max_size,
            resizable: descriptor.resizable,
        }
    }
}

/// Owned state aggregate mutated by [`crate::reducer::reduce_desktop`].
#[derive(Debug, Clone, PartialEq)]
pub struct DesktopState {
    pub viewport: ViewportContext,
    pub windows: WindowManager,
    pub processes: ProcessManager,
    pub icons: DesktopIconLayout,
    pub registry: Vec<AppDescriptor>,
    pub theme_id: String,
    pub pinned_apps: Vec<AppId>,
}

impl DesktopState {
    pub fn new(
        registry: Vec<AppDescriptor>,
        viewport: ViewportContext,
        config: &DesktopConfig,
    ) -> Self {
        let mut icons = DesktopIconLayout::new(config.icons.clone());
        icons.initialize(&registry, &viewport);
        Self {
            viewport,
            windows: WindowManager::new(config.windows.clone()),
            processes: ProcessManager::default(),
            icons,
            registry,
            theme_id: DEFAULT_THEME_ID.to_string(),
            pinned_apps: Vec::new(),
        }
    }

    pub fn descriptor(&self, app_id: &AppId) -> Option<&AppDescriptor> {
        self.registry.iter().find(|entry| &entry.app_id == app_id)
    }

    /// Drops every window, process, and preference and re-lays out the default icon column.
    pub fn reset_to_defaults(&mut self) {
        self.windows.clear();
        self.processes = ProcessManager::default();
        self.icons = DesktopIconLayout::new(self.icons.config().clone());
        self.icons.initialize(&self.registry, &self.viewport);
        self.theme_id = DEFAULT_THEME_ID.to_string();
        self.pinned_apps.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_id_validation_accepts_kebab_case_only() {
        assert!(AppId::new("text-editor").is_ok());
        assert!(AppId::new("calc2").is_ok());
        assert!(AppId::new("").is_err());
        assert!(AppId::new("Text").is_err());
        assert!(AppId::new("2fa").is_err());
        assert!(AppId::new("trailing-").is_err());
        assert!(AppId::new("with space").is_err());
    }

    #[test]
    fn rect_edges_saturate_instead_of_overflowing() {
        let rect = WindowRect::new(i32::MAX - 5, 0, 100, 100);
        assert_eq!(rect.right(), i32::MAX);
    }
}
