//! Session configuration.
//!
//! [`RigConfig`] is read once at session start and treated as immutable for the
//! lifetime of a [`RigManager`](crate::manager::RigManager). Every field has a
//! default, so an empty file is a valid config.
//!
//! # Example
//! ```
//! use wheelup::RigConfig;
//!
//! let cfg = RigConfig::from_toml_str(r#"
//!     [wheel]
//!     device_index = 1
//!     log_updates = true
//!
//!     [serial]
//!     enabled = true
//!     port = "/dev/ttyACM0"
//!     baud_rate = 115200
//! "#).unwrap();
//! assert_eq!(cfg.wheel.device_index, 1);
//! assert!(cfg.serial.enabled);
//! ```

use crate::error::{InputError, InputResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    pub wheel: WheelConfig,
    pub serial: SerialConfig,
    pub keyboard: KeyboardConfig,
    pub mouse: MouseConfig,
    pub force_feedback: ForceFeedbackConfig,
}

/// Force-feedback wheel/pedal settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelConfig {
    pub enabled: bool,
    /// Index among the wheel-class devices the backend enumerates.
    pub device_index: usize,
    /// Log per-field raw frame changes (diagnostic).
    pub log_updates: bool,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            device_index: 0,
            log_updates: false,
        }
    }
}

/// Microcontroller board on a serial line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub enabled: bool,
    pub port: String,
    pub baud_rate: u32,
    /// RTS/CTS handshaking. Off for boards that do not drive CTS.
    pub hardware_flow_control: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_port().to_string(),
            baud_rate: 9600,
            hardware_flow_control: false,
        }
    }
}

#[cfg(windows)]
fn default_port() -> &'static str {
    "COM3"
}

#[cfg(not(windows))]
fn default_port() -> &'static str {
    "/dev/ttyACM0"
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    /// When `false`, keyboard axes only drive the vehicle while no hardware source is connected.
    pub can_override_wheel: bool,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            can_override_wheel: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MouseConfig {
    pub invert_y: bool,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl Default for MouseConfig {
    fn default() -> Self {
        Self {
            invert_y: false,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

/// Centering spring parameters, in percent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceFeedbackConfig {
    pub offset_percent: i32,
    pub saturation_percent: i32,
    pub coefficient_percent: i32,
}

impl Default for ForceFeedbackConfig {
    fn default() -> Self {
        Self {
            offset_percent: 0,
            saturation_percent: 30,
            coefficient_percent: 100,
        }
    }
}

impl RigConfig {
    pub fn from_toml_str(s: &str) -> InputResult<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> InputResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a `.toml` or `.json` file, chosen by extension.
    pub fn load(path: impl AsRef<Path>) -> InputResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            Some("toml") | None => Self::from_toml_str(&text),
            Some(other) => Err(InputError::Config(format!(
                "unsupported config extension `.{other}` ({})",
                path.display()
            ))),
        }
    }

    pub fn to_toml_string(&self) -> InputResult<String> {
        toml::to_string_pretty(self).map_err(|e| InputError::Config(e.to_string()))
    }
}
