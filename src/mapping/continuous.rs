//! Kontinuierliche Ausgaben pro Tick
//!
//! Neben den Event-Bindings kann ein Modus Ausgaben erzeugen, die jeden Tick
//! neu berechnet werden:
//!
//! - Zeiger: Joystick → relative Mausbewegung (Air-Mouse)
//! - Auto-Klick: periodischer Klick, Intervall über die LED-Helligkeit
//!
//! Beides ruht, solange das Menü aktiv ist.

use super::action::Action;
use super::mode::Mode;
use crate::controller::RawInputFrame;
use crate::hid::MouseButton;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerSettings {
    pub center: i32,
    pub deadzone: i32,
    pub sensitivity: f32,
    pub invert_y: bool,
}

impl Default for PointerSettings {
    fn default() -> Self {
        Self {
            center: 128,
            deadzone: 10,
            sensitivity: 0.15,
            invert_y: true,
        }
    }
}

impl PointerSettings {
    /// Relative Bewegung für eine Joystick-Position, `None` in der Totzone
    pub fn motion(&self, x: i32, y: i32) -> Option<(i32, i32)> {
        let axis = |offset: i32| -> i32 {
            if offset.abs() < self.deadzone {
                0
            } else {
                // Abschneiden Richtung Null
                (offset as f32 * self.sensitivity) as i32
            }
        };
        let dx = axis(x - self.center);
        let dy_raw = y - self.center;
        let dy = axis(if self.invert_y { -dy_raw } else { dy_raw });
        (dx != 0 || dy != 0).then_some((dx, dy))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoClickSettings {
    pub button: MouseButton,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for AutoClickSettings {
    fn default() -> Self {
        Self {
            button: MouseButton::Left,
            min_delay_ms: 50,
            max_delay_ms: 2000,
        }
    }
}

impl AutoClickSettings {
    /// Höhere Helligkeit → kürzeres Intervall
    pub fn delay(&self, brightness: f32) -> Duration {
        let min = self.min_delay_ms.min(self.max_delay_ms) as f64;
        let max = self.max_delay_ms.max(self.min_delay_ms) as f64;
        let delay_ms = (max - brightness as f64 * (max - min)).clamp(min, max);
        Duration::from_millis(delay_ms.round() as u64)
    }
}

/// Zustand der kontinuierlichen Ausgaben, wird bei jedem Moduswechsel
/// zurückgesetzt
#[derive(Debug, Default)]
pub struct ContinuousOutputs {
    last_click: Option<Instant>,
}

impl ContinuousOutputs {
    pub fn reset(&mut self) {
        self.last_click = None;
    }

    pub fn tick(
        &mut self,
        mode: &Mode,
        frame: &RawInputFrame,
        brightness: f32,
        now: Instant,
    ) -> Vec<Action> {
        let mut actions = Vec::new();

        if let (Some(pointer), Some((x, y))) = (&mode.pointer, frame.joystick) {
            if let Some((dx, dy)) = pointer.motion(x, y) {
                actions.push(Action::MouseMove { dx, dy });
            }
        }

        if let Some(auto_click) = &mode.auto_click {
            let last = *self.last_click.get_or_insert(now);
            let delay = auto_click.delay(brightness);
            if now.saturating_duration_since(last) >= delay {
                debug!("Auto click after {:?}", delay);
                actions.push(Action::MouseClick {
                    button: auto_click.button,
                });
                self.last_click = Some(now);
            }
        }

        actions
    }
}
