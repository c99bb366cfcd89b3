//! HID transport boundary
//!
//! The core never talks to USB itself. Every output it produces goes through
//! [`HidTransport`], which a host adapter implements:
//!
//! ```text
//! ActionDispatcher ──► HidTransport ──► (USB gadget / log / test recorder)
//!                          │
//!                     TransportError (logged, never fatal)
//! ```

pub mod keycodes;
pub mod layout;

pub use keycodes::{ConsumerCode, KeyCode};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("HID transport not ready")]
    Unavailable,

    #[error("HID transport rejected report: {0}")]
    Rejected(String),
}

/// Mouse buttons as reported in the boot-protocol button byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        };
        write!(f, "{}", name)
    }
}

/// Fire-and-forget HID output. Implementations report failure, the caller
/// decides what to do with it.
pub trait HidTransport {
    fn send_key(&mut self, code: KeyCode) -> Result<(), TransportError>;
    fn release_key(&mut self, code: KeyCode) -> Result<(), TransportError>;
    fn release_all(&mut self) -> Result<(), TransportError>;
    fn send_consumer(&mut self, code: ConsumerCode) -> Result<(), TransportError>;
    fn move_mouse(&mut self, dx: i32, dy: i32) -> Result<(), TransportError>;
    fn set_mouse_button(&mut self, button: MouseButton, down: bool)
        -> Result<(), TransportError>;
}

/// Transport that only logs. Used for headless runs on a host without a USB
/// gadget.
#[derive(Debug, Default)]
pub struct TracingTransport {
    reports: u64,
}

impl TracingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reports "sent" so far
    pub fn reports(&self) -> u64 {
        self.reports
    }
}

impl HidTransport for TracingTransport {
    fn send_key(&mut self, code: KeyCode) -> Result<(), TransportError> {
        self.reports += 1;
        info!("HID key down: {}", code);
        Ok(())
    }

    fn release_key(&mut self, code: KeyCode) -> Result<(), TransportError> {
        self.reports += 1;
        info!("HID key up: {}", code);
        Ok(())
    }

    fn release_all(&mut self) -> Result<(), TransportError> {
        self.reports += 1;
        info!("HID release all");
        Ok(())
    }

    fn send_consumer(&mut self, code: ConsumerCode) -> Result<(), TransportError> {
        self.reports += 1;
        info!("HID consumer control: {}", code);
        Ok(())
    }

    fn move_mouse(&mut self, dx: i32, dy: i32) -> Result<(), TransportError> {
        self.reports += 1;
        debug!("HID mouse move: dx={}, dy={}", dx, dy);
        Ok(())
    }

    fn set_mouse_button(
        &mut self,
        button: MouseButton,
        down: bool,
    ) -> Result<(), TransportError> {
        self.reports += 1;
        info!(
            "HID mouse button {}: {}",
            button,
            if down { "down" } else { "up" }
        );
        Ok(())
    }
}
