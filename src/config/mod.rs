//! Device configuration
//!
//! A [`DeviceConfig`] is the serde/TOML view of one peripheral: channel table,
//! combos, transition gestures, LED setup and the ordered mode list. It refers
//! to channels and modes by name. [`DeviceConfig::build`] validates it once at
//! startup and resolves every name, producing a [`DeviceSetup`]; any
//! inconsistency is fatal there and never becomes a per-tick fault.
//!
//! Lookup order for the config to run:
//!
//! ```text
//! --config <path> ─► --profile <name> ─► $OPENPAD_PROFILE ─► <config_dir>/openpad/device.toml ─► "macropad"
//! ```

pub mod profiles;
pub mod setup;

pub use setup::DeviceSetup;

use crate::controller::{AnalogAxis, AnalogRange, AnalogTrigger};
use crate::feedback::{ColorSlot, LedSettings};
use crate::mapping::{
    Action, AutoClickSettings, PointerSettings, RotaryRole, ToggleFire, Trigger,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const PROFILE_ENV: &str = "OPENPAD_PROFILE";
pub const DEFAULT_PROFILE: &str = "macropad";
const CONFIG_DIR: &str = "openpad";
const CONFIG_FILE: &str = "device.toml";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("No modes configured")]
    NoModes,

    #[error("Duplicate channel name: {0}")]
    DuplicateChannel(String),

    #[error("Duplicate mode id: {0}")]
    DuplicateMode(String),

    #[error("Invalid channel {0}: {1}")]
    InvalidChannel(String, String),

    #[error("Unknown channel {channel} referenced by {context}")]
    UnknownChannel { context: String, channel: String },

    #[error("Invalid binding in mode {mode}: {reason}")]
    InvalidBinding { mode: String, reason: String },

    #[error("Unknown mode: {0}")]
    UnknownMode(String),

    #[error("Invalid shake settings: {0}")]
    InvalidShake(String),

    #[error("Invalid timing: {0}")]
    InvalidTiming(String),

    #[error("Invalid range {0}: {1}")]
    InvalidRange(String, String),

    #[error("Invalid LED settings: {0}")]
    InvalidLeds(String),

    #[error("Unknown built-in profile: {0}")]
    UnknownProfile(String),

    #[error("Failed to read config file: {0}")]
    Read(String),

    #[error("Failed to parse config file: {0}")]
    Parse(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub tick_ms: u64,
    pub long_press_ms: u64,
    pub debounce_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_ms: 10,
            long_press_ms: 1000,
            debounce_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    Digital,
    Capacitive,
    Analog,
    Rotary,
}

/// One physical input. Which optional fields are required depends on `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    pub kind: ChannelType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis: Option<AnalogAxis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<AnalogTrigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_press_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,
}

impl ChannelConfig {
    pub fn digital(name: &str, index: usize) -> Self {
        Self::indexed(name, ChannelType::Digital, index)
    }

    pub fn capacitive(name: &str, index: usize) -> Self {
        Self::indexed(name, ChannelType::Capacitive, index)
    }

    pub fn analog(name: &str, axis: AnalogAxis, trigger: AnalogTrigger) -> Self {
        Self {
            axis: Some(axis),
            trigger: Some(trigger),
            ..Self::indexed(name, ChannelType::Analog, 0)
        }
        .without_index()
    }

    pub fn rotary(name: &str) -> Self {
        Self::indexed(name, ChannelType::Rotary, 0).without_index()
    }

    fn indexed(name: &str, kind: ChannelType, index: usize) -> Self {
        Self {
            name: name.to_string(),
            kind,
            index: Some(index),
            axis: None,
            trigger: None,
            long_press_ms: None,
            debounce_ms: None,
        }
    }

    fn without_index(mut self) -> Self {
        self.index = None;
        self
    }
}

/// Simultaneous hold of two channels, exposed as its own logical channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboConfig {
    pub name: String,
    pub a: String,
    pub b: String,
    pub hold_ms: u64,
}

/// Combo gesture that switches modes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleConfig {
    pub channel: String,
    #[serde(default)]
    pub fire: ToggleFire,
    #[serde(default)]
    pub min_hold_ms: u64,
    /// Two mode ids to flip between; cycles through all modes when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub between: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShakeConfig {
    pub threshold: f32,
    pub window: usize,
    pub debounce_ms: u64,
    pub mode: String,
    pub fallback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuConfig {
    pub channel: String,
    #[serde(default = "default_menu_timeout")]
    pub idle_timeout_ms: u64,
}

fn default_menu_timeout() -> u64 {
    60_000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingConfig {
    pub channel: String,
    pub on: Trigger,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeConfig {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub rotary: RotaryRole,
    #[serde(default)]
    pub rotation: u16,
    #[serde(default)]
    pub flash_on_enter: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combo_hold_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub palette: Vec<ColorSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer: Option<PointerSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_click: Option<AutoClickSettings>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shortcuts: Vec<Action>,
    #[serde(default)]
    pub bindings: Vec<BindingConfig>,
}

impl ModeConfig {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: None,
            rotary: RotaryRole::default(),
            rotation: 0,
            flash_on_enter: false,
            combo_hold_ms: None,
            palette: Vec::new(),
            pointer: None,
            auto_click: None,
            shortcuts: Vec::new(),
            bindings: Vec::new(),
        }
    }

    pub fn bind(mut self, channel: &str, on: Trigger, action: Action) -> Self {
        self.bindings.push(BindingConfig {
            channel: channel.to_string(),
            on,
            action,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub analog_range: AnalogRange,
    #[serde(default = "default_accel_range")]
    pub accel_range: AnalogRange,
    /// BCM pin per digital index, used by the GPIO sampler
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gpio_pins: Vec<u8>,
    #[serde(default)]
    pub leds: LedSettings,
    pub channels: Vec<ChannelConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub combos: Vec<ComboConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toggle: Option<ToggleConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shake: Option<ShakeConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu: Option<MenuConfig>,
    pub modes: Vec<ModeConfig>,
}

fn default_accel_range() -> AnalogRange {
    AnalogRange { min: 0, max: 1023 }
}

impl DeviceConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading device config from {}", path.display());
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }
}

/// `<config_dir>/openpad/device.toml`, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        path
    })
}

/// What the command line asked for
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSelection {
    Path(PathBuf),
    Profile(String),
    #[default]
    Auto,
}

/// Picks the config to run. Environment and default path are passed in so
/// the lookup order can be exercised without touching the real system.
pub fn select_config(
    selection: &ConfigSelection,
    env_profile: Option<&str>,
    default_path: Option<&Path>,
) -> Result<DeviceConfig, ConfigError> {
    match selection {
        ConfigSelection::Path(path) => DeviceConfig::load(path),
        ConfigSelection::Profile(name) => builtin_or_err(name),
        ConfigSelection::Auto => {
            if let Some(name) = env_profile.filter(|name| !name.trim().is_empty()) {
                info!("Using profile {} from ${}", name, PROFILE_ENV);
                return builtin_or_err(name.trim());
            }
            if let Some(path) = default_path {
                if path.exists() {
                    return DeviceConfig::load(path);
                }
                debug!("No config at {}", path.display());
            }
            warn!("No device config found, using built-in {}", DEFAULT_PROFILE);
            builtin_or_err(DEFAULT_PROFILE)
        }
    }
}

fn builtin_or_err(name: &str) -> Result<DeviceConfig, ConfigError> {
    profiles::builtin(name).ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_profiles_survive_a_dump() {
        for name in profiles::BUILTIN_PROFILES {
            let config = profiles::builtin(name).expect("known profile");
            let dumped = config.to_toml().expect("serializable");
            let reparsed = DeviceConfig::from_toml_str(&dumped).expect("dump parses back");
            assert_eq!(reparsed, config, "profile {}", name);
        }
    }

    #[test]
    fn lookup_order() {
        let missing = PathBuf::from("/nonexistent/openpad/device.toml");

        let explicit = select_config(
            &ConfigSelection::Profile("nunchuck".to_string()),
            Some("macropad"),
            None,
        )
        .expect("profile");
        assert_eq!(explicit.name, "nunchuck");

        let from_env = select_config(&ConfigSelection::Auto, Some("touch_clicker"), Some(&missing))
            .expect("env profile");
        assert_eq!(from_env.name, "touch_clicker");

        let fallback =
            select_config(&ConfigSelection::Auto, None, Some(&missing)).expect("fallback");
        assert_eq!(fallback.name, DEFAULT_PROFILE);

        assert_eq!(
            select_config(&ConfigSelection::Profile("toaster".to_string()), None, None),
            Err(ConfigError::UnknownProfile("toaster".to_string()))
        );
        assert!(matches!(
            select_config(&ConfigSelection::Path(missing), None, None),
            Err(ConfigError::Read(_))
        ));
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = DeviceConfig::from_toml_str(
            r#"
name = "tiny"

[[channels]]
name = "button"
kind = "digital"
index = 0

[[modes]]
id = "only"

[[modes.bindings]]
channel = "button"
on = "short"
action = { type = "key", code = "SPACE" }
"#,
        )
        .expect("parses");

        assert_eq!(config.timing, TimingConfig::default());
        assert_eq!(config.accel_range, default_accel_range());
        assert_eq!(config.modes[0].rotary, RotaryRole::Volume);
        assert!(config.build().is_ok());
    }
}
