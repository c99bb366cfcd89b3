//! Device runtime
//!
//! Glues the input side, the mode state machine and the LED model into one
//! [`Device`] and drives it on a fixed tick:
//!
//! ```text
//!            ┌──────────── Device<Running>::tick ─────────────┐
//! Sampler ──►│ clamp ─► PressClassifier ─► ModeController ────┼──► HidTransport
//!            │      └─► GestureDetector ──┘      │            │
//!            │                          ContinuousOutputs     │
//!            │                          LedState ─────────────┼──► Feedback
//!            └────────────────────────────────────────────────┘
//! ```
//!
//! The lifecycle is a typestate: `Device<Initializing>` only becomes
//! `Device<Running>` through [`Device::start`], which releases the host's
//! keys and loads the first mode.

pub mod device;
pub mod tick_loop;

pub use device::{Device, DeviceState, Initializing, Running, RuntimeStats, TickReport};

use crate::config::ConfigError;
use crate::controller::SamplerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sampler error: {0}")]
    Sampler(#[from] SamplerError),
}
