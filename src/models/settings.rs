//! Настройки контроллера (settings.json).
//!
//! У каждого поля есть значение по умолчанию, поэтому частичный файл
//! переопределяет только то, что в нём указано.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

const SETTINGS_DIR_NAME: &str = "GesturePointer";
const SETTINGS_FILE_NAME: &str = "settings.json";
const MAX_TIMING_SEC: f64 = 3_600.0;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse settings file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Pinch thresholds and debounce timings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GestureSettings {
    /// Pinch counts as closed below this fraction of hand size.
    pub pinch_close_factor: f64,
    /// Pinch counts as open above this fraction of hand size.
    pub pinch_open_factor: f64,
    pub double_tap_window_sec: f64,
    /// Minimum gap between two right clicks.
    pub click_cooldown_sec: f64,
    /// A drag whose hand stays undetected this long is released.
    pub drag_release_timeout_sec: f64,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            pinch_close_factor: 0.18,
            pinch_open_factor: 0.35,
            double_tap_window_sec: 0.35,
            click_cooldown_sec: 0.4,
            drag_release_timeout_sec: 1.0,
        }
    }
}

impl GestureSettings {
    pub fn double_tap_window(&self) -> Duration {
        Duration::from_secs_f64(self.double_tap_window_sec)
    }

    pub fn click_cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.click_cooldown_sec)
    }

    pub fn drag_release_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.drag_release_timeout_sec)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CursorSettings {
    /// Доля оставшегося расстояния, проходимая за кадр, в (0, 1).
    pub smoothing: f64,
    /// Flip x so the cursor follows a selfie-view camera.
    pub mirror_x: bool,
}

impl Default for CursorSettings {
    fn default() -> Self {
        Self {
            smoothing: 0.25,
            mirror_x: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ActuationSettings {
    pub tick_interval_ms: u64,
}

impl Default for ActuationSettings {
    fn default() -> Self {
        Self { tick_interval_ms: 5 }
    }
}

impl ActuationSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Root object of settings.json.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerSettings {
    pub gesture: GestureSettings,
    pub cursor: CursorSettings,
    pub actuation: ActuationSettings,
}

impl ControllerSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let gesture = &self.gesture;
        if !gesture.pinch_close_factor.is_finite() || gesture.pinch_close_factor <= 0.0 {
            return Err(invalid("gesture.pinchCloseFactor", "must be positive"));
        }
        if !gesture.pinch_open_factor.is_finite()
            || gesture.pinch_open_factor <= gesture.pinch_close_factor
        {
            return Err(invalid(
                "gesture.pinchOpenFactor",
                "must be greater than pinchCloseFactor",
            ));
        }
        for (field, value) in [
            ("gesture.doubleTapWindowSec", gesture.double_tap_window_sec),
            ("gesture.clickCooldownSec", gesture.click_cooldown_sec),
            ("gesture.dragReleaseTimeoutSec", gesture.drag_release_timeout_sec),
        ] {
            if !value.is_finite() || !(0.0..=MAX_TIMING_SEC).contains(&value) {
                return Err(invalid(field, "must be between 0 and 3600 seconds"));
            }
        }

        let smoothing = self.cursor.smoothing;
        if !smoothing.is_finite() || smoothing <= 0.0 || smoothing >= 1.0 {
            return Err(invalid("cursor.smoothing", "must be in (0, 1)"));
        }

        if self.actuation.tick_interval_ms == 0 {
            return Err(invalid("actuation.tickIntervalMs", "must be at least 1"));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> SettingsError {
    SettingsError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

/// `{config dir}/GesturePointer/settings.json`, if the platform has a config dir.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME))
}

pub fn load_settings(path: &Path) -> Result<ControllerSettings, SettingsError> {
    let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let settings: ControllerSettings =
        serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    settings.validate()?;
    Ok(settings)
}

/// Loads an explicitly requested file, or the default location when present.
///
/// A missing default file is not an error; a missing explicit one is.
pub fn resolve_settings(explicit: Option<&Path>) -> Result<ControllerSettings, SettingsError> {
    if let Some(path) = explicit {
        log::info!("settings: loading {}", path.display());
        return load_settings(path);
    }

    match default_settings_path() {
        Some(path) if path.is_file() => {
            log::info!("settings: loading {}", path.display());
            load_settings(&path)
        }
        _ => {
            log::info!("settings: using built-in defaults");
            Ok(ControllerSettings::default())
        }
    }
}
