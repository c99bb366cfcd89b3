//! Gamepad-backed sampler for running the device logic on a desktop.
//!
//! gilrs keeps per-gamepad state up to date while its event queue is pumped,
//! so each poll drains the queue and then reads a full snapshot. The layout
//! mimics the physical peripherals closely enough to exercise every profile:
//!
//! ```text
//! South East West North LB RB Select Start Up Down Left Right LS RS
//!   0     1    2    3    4  5    6     7    8   9   10   11   12 13
//!
//! left stick  ──► joystick (0..=255, up = high)
//! right stick ──► accel x/y (0..=1023, z at rest)
//! LT / RT     ──► encoder step -1 / +1
//! ```

use super::input::{RawInputFrame, Sampler, SamplerError};
use chrono::Local;
use gilrs::{Axis, Button, Event, EventType, GamepadId, Gilrs};
use tracing::{debug, error, info, warn};

const DIGITAL_LAYOUT: [Button; 14] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::Select,
    Button::Start,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
    Button::LeftThumb,
    Button::RightThumb,
];

const JOYSTICK_MAX: f32 = 255.0;
const ACCEL_MAX: f32 = 1023.0;
const ACCEL_REST: i32 = 512;

#[derive(Clone, Debug)]
pub struct GamepadSettings {
    pub joystick_deadzone: f32,
}

impl Default for GamepadSettings {
    fn default() -> Self {
        Self {
            joystick_deadzone: 0.05,
        }
    }
}

pub struct GamepadSampler {
    gilrs: Gilrs,
    active_gamepad: Option<GamepadId>,
    settings: GamepadSettings,
    encoder_position: i32,
}

impl GamepadSampler {
    pub fn create(settings: GamepadSettings) -> Result<Self, SamplerError> {
        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(SamplerError::Read(e.to_string()));
            }
        };

        let mut sampler = Self {
            gilrs,
            active_gamepad: None,
            settings,
            encoder_position: 0,
        };
        sampler.select_gamepad();
        Ok(sampler)
    }

    fn select_gamepad(&mut self) {
        let first = self
            .gilrs
            .gamepads()
            .find(|(_, gamepad)| gamepad.is_connected())
            .map(|(id, gamepad)| (id, gamepad.name().to_string()));

        match first {
            Some((id, name)) => {
                info!("Selected gamepad: {} ({})", name, id);
                self.active_gamepad = Some(id);
            }
            None => {
                warn!("No gamepad connected, continuing with empty frames");
                self.active_gamepad = None;
            }
        }
    }

    fn drain_events(&mut self) {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::Connected => {
                    info!(
                        "Gamepad {} connected at {}",
                        id,
                        Local::now().format("%H:%M:%S")
                    );
                    if self.active_gamepad.is_none() {
                        self.select_gamepad();
                    }
                }
                EventType::Disconnected => {
                    warn!(
                        "Gamepad {} disconnected at {}",
                        id,
                        Local::now().format("%H:%M:%S")
                    );
                    if self.active_gamepad == Some(id) {
                        self.select_gamepad();
                    }
                }
                EventType::ButtonPressed(Button::LeftTrigger2, _)
                    if self.active_gamepad == Some(id) =>
                {
                    self.encoder_position -= 1;
                    debug!("Encoder position {}", self.encoder_position);
                }
                EventType::ButtonPressed(Button::RightTrigger2, _)
                    if self.active_gamepad == Some(id) =>
                {
                    self.encoder_position += 1;
                    debug!("Encoder position {}", self.encoder_position);
                }
                _ => {}
            }
        }
    }
}

impl Sampler for GamepadSampler {
    fn poll(&mut self) -> Result<RawInputFrame, SamplerError> {
        self.drain_events();

        let Some(id) = self.active_gamepad else {
            return Ok(RawInputFrame::default());
        };
        let gamepad = self.gilrs.gamepad(id);
        if !gamepad.is_connected() {
            return Err(SamplerError::Unavailable);
        }

        let deadzone = self.settings.joystick_deadzone;
        let axis = |axis: Axis| apply_deadzone(gamepad.value(axis), deadzone);

        let digital = DIGITAL_LAYOUT
            .iter()
            .map(|button| gamepad.is_pressed(*button))
            .collect();
        let joystick = (
            scale(axis(Axis::LeftStickX), JOYSTICK_MAX),
            scale(axis(Axis::LeftStickY), JOYSTICK_MAX),
        );
        let accel = (
            scale(axis(Axis::RightStickX), ACCEL_MAX),
            scale(axis(Axis::RightStickY), ACCEL_MAX),
            ACCEL_REST,
        );

        Ok(RawInputFrame {
            digital,
            capacitive: Vec::new(),
            joystick: Some(joystick),
            accel: Some(accel),
            rotary: Some(self.encoder_position),
        })
    }

    fn name(&self) -> &str {
        "gamepad"
    }
}

// Maps -1.0..=1.0 onto 0..=max
fn scale(value: f32, max: f32) -> i32 {
    (((value.clamp(-1.0, 1.0) + 1.0) / 2.0) * max).round() as i32
}

fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        // Rescale the value to the range outside the deadzone
        let sign = if value < 0.0 { -1.0 } else { 1.0 };
        sign * (value.abs() - deadzone) / (1.0 - deadzone)
    }
}
