//! LED state model: what the pixel strip should show, independent of how it
//! gets there.
//!
//! Colours are kept unscaled; brightness and the power flag are applied at
//! render time so toggling or dimming never loses the chosen colour.

use super::Feedback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgbw(pub u8, pub u8, pub u8, pub u8);

impl Rgbw {
    pub const BLACK: Rgbw = Rgbw(0, 0, 0, 0);
    pub const WHITE: Rgbw = Rgbw(255, 255, 255, 0);

    pub fn scaled(self, factor: f32) -> Rgbw {
        let factor = factor.clamp(0.0, 1.0);
        let scale = |c: u8| (c as f32 * factor).round() as u8;
        Rgbw(scale(self.0), scale(self.1), scale(self.2), scale(self.3))
    }
}

impl fmt::Display for Rgbw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.0, self.1, self.2, self.3)
    }
}

/// One entry of a mode's colour palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSlot {
    Solid(Rgbw),
    Rainbow,
}

/// Classic 0..=255 colour wheel: red → green → blue → red
pub fn colorwheel(position: u8) -> Rgbw {
    let pos = position as u16;
    let (r, g, b) = if pos < 85 {
        (255 - pos * 3, pos * 3, 0)
    } else if pos < 170 {
        let pos = pos - 85;
        (0, 255 - pos * 3, pos * 3)
    } else {
        let pos = pos - 170;
        (pos * 3, 0, 255 - pos * 3)
    };
    Rgbw(r as u8, g as u8, b as u8, 0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedSettings {
    pub pixel_count: usize,
    pub brightness: f32,
    pub min_brightness: f32,
    /// Colour wheel steps per second
    pub rainbow_speed: f32,
    pub rainbow_interval_ms: u64,
    pub flash_times: u8,
}

impl Default for LedSettings {
    fn default() -> Self {
        Self {
            pixel_count: 4,
            brightness: 0.3,
            min_brightness: 0.01,
            rainbow_speed: 0.2,
            rainbow_interval_ms: 50,
            flash_times: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LedState {
    settings: LedSettings,
    enabled: bool,
    brightness: f32,
    pixels: Vec<Rgbw>,
    palette: Vec<ColorSlot>,
    palette_index: usize,
    rainbow_active: bool,
    rainbow_epoch: Option<Instant>,
    last_rainbow_frame: Option<Instant>,
    dirty: bool,
}

impl LedState {
    pub fn new(settings: LedSettings) -> Self {
        let brightness = settings
            .brightness
            .clamp(settings.min_brightness.clamp(0.0, 1.0), 1.0);
        Self {
            pixels: vec![Rgbw::BLACK; settings.pixel_count],
            settings,
            enabled: true,
            brightness,
            palette: Vec::new(),
            palette_index: 0,
            rainbow_active: false,
            rainbow_epoch: None,
            last_rainbow_frame: None,
            dirty: true,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    /// Unscaled colour buffer
    pub fn pixels(&self) -> &[Rgbw] {
        &self.pixels
    }

    pub fn palette_index(&self) -> usize {
        self.palette_index
    }

    pub fn is_rainbow(&self) -> bool {
        self.rainbow_active
    }

    /// Switches to a mode's palette and shows its first slot. An empty
    /// palette keeps whatever is on the strip.
    pub fn load_palette(&mut self, palette: &[ColorSlot]) {
        self.palette = palette.to_vec();
        self.palette_index = 0;
        if let Some(slot) = self.palette.first().copied() {
            self.apply_slot(slot);
        }
    }

    /// Sets one pixel, or fills the strip when `index` is `None`
    pub fn set_color(&mut self, index: Option<usize>, color: Rgbw) {
        self.rainbow_active = false;
        match index {
            Some(i) => {
                if let Some(pixel) = self.pixels.get_mut(i) {
                    *pixel = color;
                } else {
                    debug!("Ignoring colour for pixel {} (strip has {})", i, self.pixels.len());
                    return;
                }
            }
            None => self.pixels.fill(color),
        }
        self.dirty = true;
    }

    pub fn toggle_power(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.dirty = true;
        info!("LEDs {}", if self.enabled { "on" } else { "off" });
        self.enabled
    }

    /// Adds `delta` to the brightness, clamped to `[min_brightness, 1.0]`
    pub fn adjust_brightness(&mut self, delta: f32) -> f32 {
        let min = self.settings.min_brightness.clamp(0.0, 1.0);
        let next = (self.brightness + delta).clamp(min, 1.0);
        if next != self.brightness {
            self.brightness = next;
            self.dirty = true;
            debug!("Brightness {:.2}", self.brightness);
        }
        self.brightness
    }

    /// Moves through the palette, wrapping in both directions
    pub fn cycle_color(&mut self, step: i32) {
        if self.palette.is_empty() {
            return;
        }
        let len = self.palette.len() as i64;
        let next = (self.palette_index as i64 + step as i64).rem_euclid(len) as usize;
        self.palette_index = next;
        let slot = self.palette[next];
        debug!("Palette slot {} -> {:?}", next, slot);
        self.apply_slot(slot);
    }

    /// Advances the rainbow animation. Returns true when the buffer changed.
    pub fn animate(&mut self, now: Instant) -> bool {
        if !self.rainbow_active {
            return false;
        }
        let interval = Duration::from_millis(self.settings.rainbow_interval_ms);
        if let Some(last) = self.last_rainbow_frame {
            if now.saturating_duration_since(last) < interval {
                return false;
            }
        }
        let epoch = *self.rainbow_epoch.get_or_insert(now);
        let elapsed = now.saturating_duration_since(epoch).as_secs_f32();
        let base = (elapsed * self.settings.rainbow_speed) as u32 % 256;
        for (i, pixel) in self.pixels.iter_mut().enumerate() {
            *pixel = colorwheel(((base + i as u32 * 64) % 256) as u8);
        }
        self.last_rainbow_frame = Some(now);
        self.dirty = true;
        true
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Writes every pixel, scaled by brightness (black while powered off)
    pub fn render(&mut self, feedback: &mut dyn Feedback) {
        for (i, color) in self.pixels.iter().enumerate() {
            let shown = if self.enabled {
                color.scaled(self.brightness)
            } else {
                Rgbw::BLACK
            };
            feedback.set_pixel(i, shown);
        }
        self.dirty = false;
    }

    pub fn flash(&mut self, feedback: &mut dyn Feedback) {
        feedback.flash(Rgbw::WHITE, self.settings.flash_times);
        // The strip has to be redrawn after the flash sequence
        self.dirty = true;
    }

    fn apply_slot(&mut self, slot: ColorSlot) {
        match slot {
            ColorSlot::Solid(color) => {
                self.rainbow_active = false;
                self.pixels.fill(color);
            }
            ColorSlot::Rainbow => {
                self.rainbow_active = true;
                self.last_rainbow_frame = None;
            }
        }
        self.dirty = true;
    }
}
