//! Input side of the device: sampling and classification
//!
//! Implements the per-tick input pipeline:
//!
//! 1. [`input`] - Channel table, raw frames and the [`Sampler`] boundary
//! 2. [`press_classifier`] - Debounced press / long press / combo events
//! 3. [`gesture_detector`] - Windowed shake detection on the accelerometer
//!
//! # Architecture
//!
//! ```text
//! Sampler ──► RawInputFrame ──┬──► PressClassifier ──► PressEvent
//!  (gamepad / gpio / idle)    └──► GestureDetector ──► ShakeEvent
//! ```
//!
//! Both classifiers are pure state machines fed with an injected `Instant`,
//! so they never block and are independent of the tick rate.

pub mod gamepad;
pub mod gesture_detector;
pub mod gpio;
pub mod input;
pub mod press_classifier;

pub use gesture_detector::{GestureDetector, ShakeEvent, ShakeSettings};
pub use input::{
    AnalogAxis, AnalogRange, AnalogTrigger, Channel, ChannelId, ChannelKind, IdleSampler,
    RawInputFrame, Sampler, SamplerError,
};
pub use press_classifier::{PressClassifier, PressEvent, PressKind};
