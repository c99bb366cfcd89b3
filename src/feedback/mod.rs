//! Visual (and audible) feedback boundary.
//!
//! The core only ever issues "set state" calls; a [`Feedback`] implementation
//! decides how a pixel buffer or a line of text reaches real hardware. Calls
//! are idempotent and last-write-wins.

pub mod led;

pub use led::{colorwheel, ColorSlot, LedSettings, LedState, Rgbw};

use std::collections::HashMap;
use tracing::{debug, info};

pub trait Feedback {
    fn set_pixel(&mut self, index: usize, color: Rgbw);

    fn show_display_text(&mut self, title: &str, body: &str);

    fn set_display_rotation(&mut self, _degrees: u16) {}

    fn start_tone(&mut self, _hz: u32) {}

    fn stop_tone(&mut self) {}

    /// Blocking attention flash. Allowed to delay the next tick.
    fn flash(&mut self, _color: Rgbw, _times: u8) {}
}

/// Feedback sink that logs state changes and drops repeated identical writes
#[derive(Debug, Default)]
pub struct TracingFeedback {
    pixels: HashMap<usize, Rgbw>,
    text: Option<(String, String)>,
    rotation: u16,
}

impl TracingFeedback {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Feedback for TracingFeedback {
    fn set_pixel(&mut self, index: usize, color: Rgbw) {
        if self.pixels.insert(index, color) != Some(color) {
            debug!("Pixel {} -> {}", index, color);
        }
    }

    fn show_display_text(&mut self, title: &str, body: &str) {
        let next = (title.to_string(), body.to_string());
        if self.text.as_ref() != Some(&next) {
            info!("Display: [{}] {}", title, body);
            self.text = Some(next);
        }
    }

    fn set_display_rotation(&mut self, degrees: u16) {
        if self.rotation != degrees {
            info!("Display rotation {}°", degrees);
            self.rotation = degrees;
        }
    }

    fn start_tone(&mut self, hz: u32) {
        debug!("Tone {} Hz", hz);
    }

    fn stop_tone(&mut self) {
        debug!("Tone off");
    }

    fn flash(&mut self, color: Rgbw, times: u8) {
        info!("Flash {} x{}", color, times);
    }
}
