//! Tunable runtime constants loaded from TOML.
//!
//! Every section is optional; missing keys fall back to the defaults below.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse desktop config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid desktop config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopConfig {
    pub windows: WindowConfig,
    pub icons: IconConfig,
    pub persistence: PersistenceConfig,
    pub boot: BootConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Per-window diagonal offset applied when cascading new windows.
    pub cascade_offset: i32,
    /// Requested heights above this share of the usable height open centred, without cascade.
    pub tall_window_percent: i32,
    /// z-index allocations after which every window is renumbered 1..N.
    pub z_normalize_threshold: u32,
    pub snap_threshold: i32,
    pub shade_activation_window_ms: u64,
    pub min_width: i32,
    pub min_height: i32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            cascade_offset: 24,
            tall_window_percent: 60,
            z_normalize_threshold: 1000,
            snap_threshold: 24,
            shade_activation_window_ms: 300,
            min_width: 220,
            min_height: 140,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconConfig {
    pub column_x: i32,
    /// Gap between the menu bar and the first icon.
    pub column_top_margin: i32,
    pub spacing: i32,
    pub icon_size: i32,
    pub grid_snap: bool,
    pub grid_cell: i32,
    pub click_distance_px: i32,
    pub click_duration_ms: u64,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            column_x: 16,
            column_top_margin: 16,
            spacing: 96,
            icon_size: 72,
            grid_snap: false,
            grid_cell: 16,
            click_distance_px: 5,
            click_duration_ms: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub general_debounce_ms: u64,
    pub icon_debounce_ms: u64,
    /// Delay between identity loss and the reset to defaults.
    pub reset_grace_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            general_debounce_ms: 1000,
            icon_debounce_ms: 300,
            reset_grace_ms: 250,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootConfig {
    pub min_duration_ms: u64,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            min_duration_ms: 1200,
        }
    }
}

impl DesktopConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and [`ConfigError::Invalid`] for
    /// out-of-range values.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive_i32("windows.cascade_offset", self.windows.cascade_offset, true)?;
        if !(1..=100).contains(&self.windows.tall_window_percent) {
            return Err(invalid(
                "windows.tall_window_percent",
                "must be within 1..=100",
            ));
        }
        if self.windows.z_normalize_threshold == 0 {
            return Err(invalid("windows.z_normalize_threshold", "must be positive"));
        }
        positive_i32("windows.snap_threshold", self.windows.snap_threshold, true)?;
        positive_u64(
            "windows.shade_activation_window_ms",
            self.windows.shade_activation_window_ms,
        )?;
        positive_i32("windows.min_width", self.windows.min_width, false)?;
        positive_i32("windows.min_height", self.windows.min_height, false)?;

        positive_i32("icons.spacing", self.icons.spacing, false)?;
        positive_i32("icons.icon_size", self.icons.icon_size, false)?;
        positive_i32("icons.grid_cell", self.icons.grid_cell, false)?;
        positive_i32("icons.click_distance_px", self.icons.click_distance_px, false)?;
        positive_u64("icons.click_duration_ms", self.icons.click_duration_ms)?;

        positive_u64(
            "persistence.general_debounce_ms",
            self.persistence.general_debounce_ms,
        )?;
        positive_u64(
            "persistence.icon_debounce_ms",
            self.persistence.icon_debounce_ms,
        )?;
        positive_u64("persistence.reset_grace_ms", self.persistence.reset_grace_ms)?;
        positive_u64("boot.min_duration_ms", self.boot.min_duration_ms)?;
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

fn positive_i32(field: &'static str, value: i32, allow_zero: bool) -> Result<(), ConfigError> {
    if value > 0 || (allow_zero && value == 0) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a positive value, found {value}"),
        })
    }
}

fn positive_u64(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value > 0 {
        Ok(())
    } else {
        Err(invalid(field, "must be positive"))
    }
}
