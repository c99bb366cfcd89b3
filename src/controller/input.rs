//! Channel table and raw per-tick input frames.
//!
//! A [`Channel`] names one logical input source. The table is built once from
//! the device configuration and indexed by [`ChannelId`]; nothing is added or
//! removed afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Index into the device's channel table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(pub usize);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Analog sources a threshold channel can watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalogAxis {
    JoystickX,
    JoystickY,
    AccelX,
    AccelY,
    AccelZ,
}

/// Which side of the threshold counts as "pressed"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalogTrigger {
    Below(i32),
    Above(i32),
}

impl AnalogTrigger {
    pub fn is_pressed(self, value: i32) -> bool {
        match self {
            AnalogTrigger::Below(limit) => value < limit,
            AnalogTrigger::Above(limit) => value > limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelKind {
    Digital { index: usize },
    Capacitive { index: usize },
    Analog { axis: AnalogAxis, trigger: AnalogTrigger },
    /// Absolute encoder position, never press-classified
    Rotary,
    /// Logical channel for a simultaneous hold of two other channels
    Combo { a: ChannelId, b: ChannelId, hold: Duration },
}

impl ChannelKind {
    /// True for kinds that go through edge/long-press classification
    pub fn is_pressable(&self) -> bool {
        matches!(
            self,
            ChannelKind::Digital { .. } | ChannelKind::Capacitive { .. } | ChannelKind::Analog { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub kind: ChannelKind,
    pub long_press: Duration,
    pub debounce: Duration,
}

/// Inclusive clamp bounds for analog samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalogRange {
    pub min: i32,
    pub max: i32,
}

impl AnalogRange {
    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min, self.max)
    }
}

impl Default for AnalogRange {
    fn default() -> Self {
        Self { min: 0, max: 255 }
    }
}

/// One snapshot of every raw input, taken once per tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawInputFrame {
    pub digital: Vec<bool>,
    pub capacitive: Vec<bool>,
    pub joystick: Option<(i32, i32)>,
    pub accel: Option<(i32, i32, i32)>,
    pub rotary: Option<i32>,
}

impl RawInputFrame {
    /// Clamps out-of-range analog samples instead of rejecting them
    pub fn clamped(mut self, joystick_range: &AnalogRange, accel_range: &AnalogRange) -> Self {
        if let Some((x, y)) = self.joystick {
            self.joystick = Some((joystick_range.clamp(x), joystick_range.clamp(y)));
        }
        if let Some((x, y, z)) = self.accel {
            self.accel = Some((
                accel_range.clamp(x),
                accel_range.clamp(y),
                accel_range.clamp(z),
            ));
        }
        self
    }

    pub fn axis(&self, axis: AnalogAxis) -> Option<i32> {
        match axis {
            AnalogAxis::JoystickX => self.joystick.map(|(x, _)| x),
            AnalogAxis::JoystickY => self.joystick.map(|(_, y)| y),
            AnalogAxis::AccelX => self.accel.map(|(x, _, _)| x),
            AnalogAxis::AccelY => self.accel.map(|(_, y, _)| y),
            AnalogAxis::AccelZ => self.accel.map(|(_, _, z)| z),
        }
    }

    /// Boolean state of a pressable channel. Indices past the end of the
    /// sampled vectors and missing analog data read as released.
    pub fn is_pressed(&self, kind: &ChannelKind) -> Option<bool> {
        match kind {
            ChannelKind::Digital { index } => Some(self.digital.get(*index).copied().unwrap_or(false)),
            ChannelKind::Capacitive { index } => {
                Some(self.capacitive.get(*index).copied().unwrap_or(false))
            }
            ChannelKind::Analog { axis, trigger } => {
                Some(self.axis(*axis).is_some_and(|value| trigger.is_pressed(value)))
            }
            ChannelKind::Rotary | ChannelKind::Combo { .. } => None,
        }
    }

    /// Scalar fed to the shake detector: magnitude of the acceleration vector
    pub fn accel_magnitude(&self) -> Option<f32> {
        self.accel.map(|(x, y, z)| {
            let (x, y, z) = (x as f32, y as f32, z as f32);
            (x * x + y * y + z * z).sqrt()
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SamplerError {
    #[error("Input source unavailable")]
    Unavailable,

    #[error("Failed to read inputs: {0}")]
    Read(String),
}

/// Per-tick raw input source
pub trait Sampler {
    fn poll(&mut self) -> Result<RawInputFrame, SamplerError>;

    fn name(&self) -> &str;
}

/// Sampler with nothing attached. Every poll is an empty frame.
#[derive(Debug, Default)]
pub struct IdleSampler;

impl Sampler for IdleSampler {
    fn poll(&mut self) -> Result<RawInputFrame, SamplerError> {
        Ok(RawInputFrame::default())
    }

    fn name(&self) -> &str {
        "idle"
    }
}
