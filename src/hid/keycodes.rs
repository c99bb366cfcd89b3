//! HID usage codes for the keyboard and consumer-control pages.
//!
//! Codes are stored as raw usage IDs and (de)serialized by name so device
//! configurations stay readable (`code = "LEFT_ARROW"`). Unknown names are
//! rejected at config load; raw hex (`"0x2C"`) is accepted as an escape hatch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Keyboard page (0x07) usage ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyCode(pub u8);

/// Consumer page (0x0C) usage ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConsumerCode(pub u16);

macro_rules! named_codes {
    ($ty:ident, $table:ident, $inner:ty, { $($name:ident = $value:expr),* $(,)? }) => {
        impl $ty {
            $(pub const $name: $ty = $ty($value);)*
        }

        const $table: &[(&str, $inner)] = &[$((stringify!($name), $value)),*];
    };
}

named_codes!(KeyCode, KEY_NAMES, u8, {
    A = 0x04, B = 0x05, C = 0x06, D = 0x07, E = 0x08, F = 0x09, G = 0x0A,
    H = 0x0B, I = 0x0C, J = 0x0D, K = 0x0E, L = 0x0F, M = 0x10, N = 0x11,
    O = 0x12, P = 0x13, Q = 0x14, R = 0x15, S = 0x16, T = 0x17, U = 0x18,
    V = 0x19, W = 0x1A, X = 0x1B, Y = 0x1C, Z = 0x1D,
    ONE = 0x1E, TWO = 0x1F, THREE = 0x20, FOUR = 0x21, FIVE = 0x22,
    SIX = 0x23, SEVEN = 0x24, EIGHT = 0x25, NINE = 0x26, ZERO = 0x27,
    ENTER = 0x28, ESCAPE = 0x29, BACKSPACE = 0x2A, TAB = 0x2B, SPACE = 0x2C,
    MINUS = 0x2D, EQUALS = 0x2E, LEFT_BRACKET = 0x2F, RIGHT_BRACKET = 0x30,
    BACKSLASH = 0x31, SEMICOLON = 0x33, QUOTE = 0x34, GRAVE_ACCENT = 0x35,
    COMMA = 0x36, PERIOD = 0x37, FORWARD_SLASH = 0x38, CAPS_LOCK = 0x39,
    F1 = 0x3A, F2 = 0x3B, F3 = 0x3C, F4 = 0x3D, F5 = 0x3E, F6 = 0x3F,
    F7 = 0x40, F8 = 0x41, F9 = 0x42, F10 = 0x43, F11 = 0x44, F12 = 0x45,
    PRINT_SCREEN = 0x46, INSERT = 0x49, HOME = 0x4A, PAGE_UP = 0x4B,
    DELETE = 0x4C, END = 0x4D, PAGE_DOWN = 0x4E,
    RIGHT_ARROW = 0x4F, LEFT_ARROW = 0x50, DOWN_ARROW = 0x51, UP_ARROW = 0x52,
    LEFT_CONTROL = 0xE0, LEFT_SHIFT = 0xE1, LEFT_ALT = 0xE2, LEFT_GUI = 0xE3,
    RIGHT_CONTROL = 0xE4, RIGHT_SHIFT = 0xE5, RIGHT_ALT = 0xE6, RIGHT_GUI = 0xE7,
});

// Accepted on input only; the canonical name wins on output.
const KEY_ALIASES: &[(&str, u8)] = &[
    ("RETURN", 0x28),
    ("SPACEBAR", 0x2C),
    ("CONTROL", 0xE0),
    ("SHIFT", 0xE1),
    ("ALT", 0xE2),
    ("OPTION", 0xE2),
    ("GUI", 0xE3),
    ("COMMAND", 0xE3),
    ("WINDOWS", 0xE3),
];

named_codes!(ConsumerCode, CONSUMER_NAMES, u16, {
    BRIGHTNESS_INCREMENT = 0x6F,
    BRIGHTNESS_DECREMENT = 0x70,
    RECORD = 0xB2,
    FAST_FORWARD = 0xB3,
    REWIND = 0xB4,
    SCAN_NEXT_TRACK = 0xB5,
    SCAN_PREVIOUS_TRACK = 0xB6,
    STOP = 0xB7,
    EJECT = 0xB8,
    PLAY_PAUSE = 0xCD,
    MUTE = 0xE2,
    VOLUME_INCREMENT = 0xE9,
    VOLUME_DECREMENT = 0xEA,
});

impl KeyCode {
    /// Modifier keys occupy the 0xE0..=0xE7 block
    pub fn is_modifier(self) -> bool {
        (0xE0..=0xE7).contains(&self.0)
    }

    pub fn name(self) -> Option<&'static str> {
        KEY_NAMES
            .iter()
            .find(|(_, value)| *value == self.0)
            .map(|(name, _)| *name)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        KEY_NAMES
            .iter()
            .chain(KEY_ALIASES.iter())
            .find(|(candidate, _)| *candidate == upper)
            .map(|(_, value)| KeyCode(*value))
    }
}

impl ConsumerCode {
    pub fn name(self) -> Option<&'static str> {
        CONSUMER_NAMES
            .iter()
            .find(|(_, value)| *value == self.0)
            .map(|(name, _)| *name)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        CONSUMER_NAMES
            .iter()
            .find(|(candidate, _)| *candidate == upper)
            .map(|(_, value)| ConsumerCode(*value))
    }
}

fn parse_hex(raw: &str) -> Option<u32> {
    let digits = raw
        .trim()
        .strip_prefix("0x")
        .or_else(|| raw.trim().strip_prefix("0X"))?;
    u32::from_str_radix(digits, 16).ok()
}

impl TryFrom<String> for KeyCode {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        if let Some(code) = KeyCode::from_name(&raw) {
            return Ok(code);
        }
        parse_hex(&raw)
            .and_then(|value| u8::try_from(value).ok())
            .map(KeyCode)
            .ok_or_else(|| format!("unknown key code: {}", raw))
    }
}

impl From<KeyCode> for String {
    fn from(code: KeyCode) -> Self {
        code.to_string()
    }
}

impl TryFrom<String> for ConsumerCode {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        if let Some(code) = ConsumerCode::from_name(&raw) {
            return Ok(code);
        }
        parse_hex(&raw)
            .and_then(|value| u16::try_from(value).ok())
            .map(ConsumerCode)
            .ok_or_else(|| format!("unknown consumer code: {}", raw))
    }
}

impl From<ConsumerCode> for String {
    fn from(code: ConsumerCode) -> Self {
        code.to_string()
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "0x{:02X}", self.0),
        }
    }
}

impl fmt::Display for ConsumerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "0x{:03X}", self.0),
        }
    }
}
