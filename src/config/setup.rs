//! Validation of a [`DeviceConfig`] into the resolved runtime setup.

use super::{ChannelConfig, ChannelType, ConfigError, DeviceConfig, ModeConfig};
use crate::controller::{AnalogRange, Channel, ChannelId, ChannelKind, ShakeSettings};
use crate::feedback::LedSettings;
use crate::mapping::{
    Action, Binding, ComboToggle, MenuSettings, Mode, ShakeToggle, ToggleTarget,
    TransitionRules, Trigger,
};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{error, info};

/// Everything the device needs, with names resolved to ids and indices
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSetup {
    pub name: String,
    pub tick: Duration,
    pub channels: Vec<Channel>,
    pub analog_range: AnalogRange,
    pub accel_range: AnalogRange,
    pub shake: Option<ShakeSettings>,
    pub rules: TransitionRules,
    pub modes: Vec<Mode>,
    pub leds: LedSettings,
    pub gpio_pins: Vec<u8>,
}

impl DeviceSetup {
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|channel| channel.name == name)
    }

    pub fn has_rotary(&self) -> bool {
        self.channels
            .iter()
            .any(|channel| channel.kind == ChannelKind::Rotary)
    }
}

impl DeviceConfig {
    /// Validates the configuration and resolves every name
    pub fn build(&self) -> Result<DeviceSetup, ConfigError> {
        let result = Builder::new(self).and_then(|builder| builder.finish());
        match &result {
            Ok(setup) => info!(
                "Device {} ready: {} channels, {} modes",
                setup.name,
                setup.channels.len(),
                setup.modes.len()
            ),
            Err(e) => error!("Invalid device config {}: {}", self.name, e),
        }
        result
    }
}

struct Builder<'a> {
    config: &'a DeviceConfig,
    channels: Vec<Channel>,
    by_name: HashMap<String, ChannelId>,
}

impl<'a> Builder<'a> {
    fn new(config: &'a DeviceConfig) -> Result<Self, ConfigError> {
        if config.timing.tick_ms == 0 {
            return Err(ConfigError::InvalidTiming("tick_ms must be > 0".to_string()));
        }
        if config.modes.is_empty() {
            return Err(ConfigError::NoModes);
        }
        check_range("analog_range", &config.analog_range)?;
        check_range("accel_range", &config.accel_range)?;
        check_leds(&config.leds)?;

        let mut builder = Self {
            config,
            channels: Vec::new(),
            by_name: HashMap::new(),
        };
        for channel in &config.channels {
            let kind = channel_kind(channel)?;
            builder.push(&channel.name, kind, channel.long_press_ms, channel.debounce_ms)?;
        }
        for combo in &config.combos {
            let a = builder.pressable(&combo.a, &combo.name)?;
            let b = builder.pressable(&combo.b, &combo.name)?;
            if a == b {
                return Err(ConfigError::InvalidChannel(
                    combo.name.clone(),
                    "combo needs two different channels".to_string(),
                ));
            }
            let hold = Duration::from_millis(combo.hold_ms);
            builder.push(&combo.name, ChannelKind::Combo { a, b, hold }, None, None)?;
        }
        Ok(builder)
    }

    fn push(
        &mut self,
        name: &str,
        kind: ChannelKind,
        long_press_ms: Option<u64>,
        debounce_ms: Option<u64>,
    ) -> Result<(), ConfigError> {
        if self.by_name.contains_key(name) {
            return Err(ConfigError::DuplicateChannel(name.to_string()));
        }
        let timing = &self.config.timing;
        let long_press = long_press_ms.unwrap_or(timing.long_press_ms);
        if long_press == 0 {
            return Err(ConfigError::InvalidChannel(
                name.to_string(),
                "long press threshold must be > 0".to_string(),
            ));
        }
        let id = ChannelId(self.channels.len());
        self.channels.push(Channel {
            id,
            name: name.to_string(),
            kind,
            long_press: Duration::from_millis(long_press),
            debounce: Duration::from_millis(debounce_ms.unwrap_or(timing.debounce_ms)),
        });
        self.by_name.insert(name.to_string(), id);
        Ok(())
    }

    fn lookup(&self, name: &str, context: &str) -> Result<&Channel, ConfigError> {
        self.by_name
            .get(name)
            .and_then(|id| self.channels.get(id.0))
            .ok_or_else(|| ConfigError::UnknownChannel {
                context: context.to_string(),
                channel: name.to_string(),
            })
    }

    fn pressable(&self, name: &str, context: &str) -> Result<ChannelId, ConfigError> {
        let channel = self.lookup(name, context)?;
        if !channel.kind.is_pressable() {
            return Err(ConfigError::InvalidChannel(
                name.to_string(),
                format!("{} needs a pressable channel", context),
            ));
        }
        Ok(channel.id)
    }

    fn mode_index(&self, id: &str) -> Result<usize, ConfigError> {
        self.config
            .modes
            .iter()
            .position(|mode| mode.id == id)
            .ok_or_else(|| ConfigError::UnknownMode(id.to_string()))
    }

    fn finish(self) -> Result<DeviceSetup, ConfigError> {
        let mut modes = Vec::with_capacity(self.config.modes.len());
        for mode in &self.config.modes {
            if modes.iter().any(|m: &Mode| m.id == mode.id) {
                return Err(ConfigError::DuplicateMode(mode.id.clone()));
            }
            modes.push(self.mode(mode)?);
        }

        let rules = self.rules()?;
        let shake = self.shake()?;

        Ok(DeviceSetup {
            name: self.config.name.clone(),
            tick: Duration::from_millis(self.config.timing.tick_ms),
            channels: self.channels,
            analog_range: self.config.analog_range,
            accel_range: self.config.accel_range,
            shake,
            rules,
            modes,
            leds: self.config.leds.clone(),
            gpio_pins: self.config.gpio_pins.clone(),
        })
    }

    fn mode(&self, config: &ModeConfig) -> Result<Mode, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidBinding {
            mode: config.id.clone(),
            reason,
        };
        let context = format!("mode {}", config.id);

        let mut bindings = Vec::with_capacity(config.bindings.len());
        for binding in &config.bindings {
            let channel = self.lookup(&binding.channel, &context)?;
            if channel.kind == ChannelKind::Rotary {
                return Err(invalid(format!(
                    "rotary channel {} cannot carry bindings",
                    channel.name
                )));
            }
            if binding.on == Trigger::Hold && !binding.action.is_holdable() {
                return Err(invalid(format!(
                    "hold on {} needs a key or mouse_click action",
                    channel.name
                )));
            }
            check_action(&binding.action).map_err(invalid)?;
            bindings.push(Binding {
                channel: channel.id,
                on: binding.on,
                action: binding.action.clone(),
            });
        }
        for shortcut in &config.shortcuts {
            check_action(shortcut).map_err(invalid)?;
        }

        Ok(Mode {
            id: config.id.clone(),
            display_name: config
                .display_name
                .clone()
                .unwrap_or_else(|| config.id.clone()),
            bindings,
            rotary: config.rotary,
            shortcuts: config.shortcuts.clone(),
            rotation: config.rotation,
            palette: config.palette.clone(),
            flash_on_enter: config.flash_on_enter,
            combo_hold: config.combo_hold_ms.map(Duration::from_millis),
            pointer: config.pointer.clone(),
            auto_click: config.auto_click.clone(),
        })
    }

    fn rules(&self) -> Result<TransitionRules, ConfigError> {
        let combo_toggle = match &self.config.toggle {
            Some(toggle) => {
                let channel = self.lookup(&toggle.channel, "toggle")?.id;
                let target = match toggle.between.as_slice() {
                    [] => ToggleTarget::Next,
                    [a, b] => ToggleTarget::Between(self.mode_index(a)?, self.mode_index(b)?),
                    other => {
                        return Err(ConfigError::InvalidChannel(
                            toggle.channel.clone(),
                            format!("toggle needs two modes, got {}", other.len()),
                        ))
                    }
                };
                Some(ComboToggle {
                    channel,
                    fire: toggle.fire,
                    min_hold: Duration::from_millis(toggle.min_hold_ms),
                    target,
                })
            }
            None => None,
        };

        let shake_toggle = match &self.config.shake {
            Some(shake) => Some(ShakeToggle {
                mode: self.mode_index(&shake.mode)?,
                fallback: self.mode_index(&shake.fallback)?,
            }),
            None => None,
        };

        let menu = match &self.config.menu {
            Some(menu) => Some(MenuSettings {
                channel: self.pressable(&menu.channel, "menu")?,
                idle_timeout: Duration::from_millis(menu.idle_timeout_ms),
            }),
            None => None,
        };

        Ok(TransitionRules {
            combo_toggle,
            shake_toggle,
            menu,
        })
    }

    fn shake(&self) -> Result<Option<ShakeSettings>, ConfigError> {
        let Some(shake) = &self.config.shake else {
            return Ok(None);
        };
        if shake.window == 0 {
            return Err(ConfigError::InvalidShake("window must be > 0".to_string()));
        }
        if !shake.threshold.is_finite() || shake.threshold < 0.0 {
            return Err(ConfigError::InvalidShake(format!(
                "threshold {} out of range",
                shake.threshold
            )));
        }
        Ok(Some(ShakeSettings {
            threshold: shake.threshold,
            window: shake.window,
            debounce: Duration::from_millis(shake.debounce_ms),
        }))
    }
}

fn check_range(name: &str, range: &AnalogRange) -> Result<(), ConfigError> {
    if range.min > range.max {
        return Err(ConfigError::InvalidRange(
            name.to_string(),
            format!("min {} is above max {}", range.min, range.max),
        ));
    }
    Ok(())
}

fn check_leds(leds: &LedSettings) -> Result<(), ConfigError> {
    for (name, value) in [
        ("brightness", leds.brightness),
        ("min_brightness", leds.min_brightness),
    ] {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::InvalidLeds(format!(
                "{} must be within 0..=1, got {}",
                name, value
            )));
        }
    }
    Ok(())
}

fn channel_kind(channel: &ChannelConfig) -> Result<ChannelKind, ConfigError> {
    let missing = |field: &str| {
        ConfigError::InvalidChannel(channel.name.clone(), format!("missing {}", field))
    };
    let kind = match channel.kind {
        ChannelType::Digital => ChannelKind::Digital {
            index: channel.index.ok_or_else(|| missing("index"))?,
        },
        ChannelType::Capacitive => ChannelKind::Capacitive {
            index: channel.index.ok_or_else(|| missing("index"))?,
        },
        ChannelType::Analog => ChannelKind::Analog {
            axis: channel.axis.ok_or_else(|| missing("axis"))?,
            trigger: channel.trigger.ok_or_else(|| missing("trigger"))?,
        },
        ChannelType::Rotary => ChannelKind::Rotary,
    };
    Ok(kind)
}

// Sequences may only hold key and text steps; batches are checked recursively
fn check_action(action: &Action) -> Result<(), String> {
    match action {
        Action::Sequence { steps } => match steps.iter().find(|step| !step.is_sequence_step()) {
            Some(step) => Err(format!("sequence step {:?} is not a key or text", step)),
            None => Ok(()),
        },
        Action::Batch { actions } => actions.iter().try_for_each(check_action),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::super::{ComboConfig, MenuConfig, ShakeConfig, ToggleConfig};
    use super::*;
    use crate::hid::KeyCode;
    use crate::mapping::ToggleFire;

    fn base() -> DeviceConfig {
        DeviceConfig {
            name: "test".to_string(),
            timing: Default::default(),
            analog_range: Default::default(),
            accel_range: AnalogRange { min: 0, max: 1023 },
            gpio_pins: Vec::new(),
            leds: Default::default(),
            channels: vec![
                ChannelConfig::digital("a", 0),
                ChannelConfig::digital("b", 1),
                ChannelConfig::rotary("encoder"),
            ],
            combos: vec![ComboConfig {
                name: "ab".to_string(),
                a: "a".to_string(),
                b: "b".to_string(),
                hold_ms: 2000,
            }],
            toggle: None,
            shake: None,
            menu: None,
            modes: vec![
                ModeConfig::new("one").bind("a", Trigger::Hold, Action::Key { code: KeyCode::A }),
                ModeConfig::new("two"),
            ],
        }
    }

    #[test]
    fn resolves_names_and_defaults() {
        let mut config = base();
        config.channels[1].long_press_ms = Some(300);
        config.toggle = Some(ToggleConfig {
            channel: "ab".to_string(),
            fire: ToggleFire::End,
            min_hold_ms: 1000,
            between: vec!["two".to_string(), "one".to_string()],
        });
        let setup = config.build().expect("valid");

        assert_eq!(setup.channels.len(), 4);
        assert_eq!(setup.channel("b").map(|c| c.long_press), Some(Duration::from_millis(300)));
        assert_eq!(
            setup.channel("ab").map(|c| c.kind.clone()),
            Some(ChannelKind::Combo {
                a: ChannelId(0),
                b: ChannelId(1),
                hold: Duration::from_millis(2000)
            })
        );
        assert_eq!(
            setup.rules.combo_toggle.as_ref().map(|t| t.target),
            Some(ToggleTarget::Between(1, 0))
        );
        assert_eq!(setup.modes[1].display_name, "two");
        assert!(setup.has_rotary());
    }

    #[test]
    fn unknown_channel_in_binding_fails() {
        let mut config = base();
        config.modes[1] = ModeConfig::new("two").bind(
            "ghost",
            Trigger::Short,
            Action::Key { code: KeyCode::B },
        );
        assert_eq!(
            config.build(),
            Err(ConfigError::UnknownChannel {
                context: "mode two".to_string(),
                channel: "ghost".to_string()
            })
        );
    }

    #[test]
    fn non_holdable_hold_binding_fails() {
        let mut config = base();
        config.modes[1] = ModeConfig::new("two").bind("b", Trigger::Hold, Action::ToggleLedPower);
        assert!(matches!(
            config.build(),
            Err(ConfigError::InvalidBinding { .. })
        ));
    }

    #[test]
    fn zero_shake_window_fails() {
        let mut config = base();
        config.shake = Some(ShakeConfig {
            threshold: 60.0,
            window: 0,
            debounce_ms: 1500,
            mode: "one".to_string(),
            fallback: "two".to_string(),
        });
        assert!(matches!(config.build(), Err(ConfigError::InvalidShake(_))));
    }

    #[test]
    fn bad_toggle_target_fails() {
        let mut config = base();
        config.toggle = Some(ToggleConfig {
            channel: "ab".to_string(),
            fire: ToggleFire::Start,
            min_hold_ms: 0,
            between: vec!["one".to_string(), "three".to_string()],
        });
        assert_eq!(
            config.build(),
            Err(ConfigError::UnknownMode("three".to_string()))
        );
    }

    #[test]
    fn structural_errors() {
        let mut duplicate = base();
        duplicate.channels.push(ChannelConfig::digital("a", 5));
        assert_eq!(
            duplicate.build(),
            Err(ConfigError::DuplicateChannel("a".to_string()))
        );

        let mut empty = base();
        empty.modes.clear();
        assert_eq!(empty.build(), Err(ConfigError::NoModes));

        let mut rotary_menu = base();
        rotary_menu.menu = Some(MenuConfig {
            channel: "encoder".to_string(),
            idle_timeout_ms: 60_000,
        });
        assert!(matches!(
            rotary_menu.build(),
            Err(ConfigError::InvalidChannel(..))
        ));

        let mut bad_sequence = base();
        bad_sequence.modes[1].shortcuts = vec![Action::Sequence {
            steps: vec![Action::ToggleLedPower],
        }];
        assert!(matches!(
            bad_sequence.build(),
            Err(ConfigError::InvalidBinding { .. })
        ));

        let mut self_combo = base();
        self_combo.combos[0].b = "a".to_string();
        assert!(matches!(
            self_combo.build(),
            Err(ConfigError::InvalidChannel(..))
        ));
    }

    #[test]
    fn inverted_ranges_and_bad_brightness_fail() {
        let mut joystick = base();
        joystick.analog_range = AnalogRange { min: 255, max: 0 };
        assert!(matches!(
            joystick.build(),
            Err(ConfigError::InvalidRange(name, _)) if name == "analog_range"
        ));

        let mut accel = base();
        accel.accel_range = AnalogRange { min: 10, max: -10 };
        assert!(matches!(
            accel.build(),
            Err(ConfigError::InvalidRange(name, _)) if name == "accel_range"
        ));

        let mut flat = base();
        flat.analog_range = AnalogRange { min: 7, max: 7 };
        assert!(flat.build().is_ok());

        for (brightness, min_brightness) in [(1.5, 0.01), (0.3, 2.0), (f32::NAN, 0.01), (0.3, -0.1)] {
            let mut leds = base();
            leds.leds.brightness = brightness;
            leds.leds.min_brightness = min_brightness;
            assert!(
                matches!(leds.build(), Err(ConfigError::InvalidLeds(_))),
                "{} / {}",
                brightness,
                min_brightness
            );
        }
    }
}
