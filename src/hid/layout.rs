//! US keyboard layout used to type `Action::Text`.

use super::keycodes::KeyCode;

/// One keystroke needed to produce a character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keystroke {
    pub key: KeyCode,
    pub shift: bool,
}

impl Keystroke {
    const fn plain(code: u8) -> Self {
        Self {
            key: KeyCode(code),
            shift: false,
        }
    }

    const fn shifted(code: u8) -> Self {
        Self {
            key: KeyCode(code),
            shift: true,
        }
    }
}

/// Maps a character to its keystroke, `None` for anything outside printable ASCII
pub fn keystroke_for(ch: char) -> Option<Keystroke> {
    let stroke = match ch {
        'a'..='z' => Keystroke::plain(KeyCode::A.0 + (ch as u8 - b'a')),
        'A'..='Z' => Keystroke::shifted(KeyCode::A.0 + (ch as u8 - b'A')),
        '1'..='9' => Keystroke::plain(KeyCode::ONE.0 + (ch as u8 - b'1')),
        '0' => Keystroke::plain(KeyCode::ZERO.0),
        '\n' => Keystroke::plain(KeyCode::ENTER.0),
        '\t' => Keystroke::plain(KeyCode::TAB.0),
        ' ' => Keystroke::plain(KeyCode::SPACE.0),
        '-' => Keystroke::plain(KeyCode::MINUS.0),
        '=' => Keystroke::plain(KeyCode::EQUALS.0),
        '[' => Keystroke::plain(KeyCode::LEFT_BRACKET.0),
        ']' => Keystroke::plain(KeyCode::RIGHT_BRACKET.0),
        '\\' => Keystroke::plain(KeyCode::BACKSLASH.0),
        ';' => Keystroke::plain(KeyCode::SEMICOLON.0),
        '\'' => Keystroke::plain(KeyCode::QUOTE.0),
        '`' => Keystroke::plain(KeyCode::GRAVE_ACCENT.0),
        ',' => Keystroke::plain(KeyCode::COMMA.0),
        '.' => Keystroke::plain(KeyCode::PERIOD.0),
        '/' => Keystroke::plain(KeyCode::FORWARD_SLASH.0),
        '!' => Keystroke::shifted(KeyCode::ONE.0),
        '@' => Keystroke::shifted(KeyCode::TWO.0),
        '#' => Keystroke::shifted(KeyCode::THREE.0),
        '$' => Keystroke::shifted(KeyCode::FOUR.0),
        '%' => Keystroke::shifted(KeyCode::FIVE.0),
        '^' => Keystroke::shifted(KeyCode::SIX.0),
        '&' => Keystroke::shifted(KeyCode::SEVEN.0),
        '*' => Keystroke::shifted(KeyCode::EIGHT.0),
        '(' => Keystroke::shifted(KeyCode::NINE.0),
        ')' => Keystroke::shifted(KeyCode::ZERO.0),
        '_' => Keystroke::shifted(KeyCode::MINUS.0),
        '+' => Keystroke::shifted(KeyCode::EQUALS.0),
        '{' => Keystroke::shifted(KeyCode::LEFT_BRACKET.0),
        '}' => Keystroke::shifted(KeyCode::RIGHT_BRACKET.0),
        '|' => Keystroke::shifted(KeyCode::BACKSLASH.0),
        ':' => Keystroke::shifted(KeyCode::SEMICOLON.0),
        '"' => Keystroke::shifted(KeyCode::QUOTE.0),
        '~' => Keystroke::shifted(KeyCode::GRAVE_ACCENT.0),
        '<' => Keystroke::shifted(KeyCode::COMMA.0),
        '>' => Keystroke::shifted(KeyCode::PERIOD.0),
        '?' => Keystroke::shifted(KeyCode::FORWARD_SLASH.0),
        _ => return None,
    };
    Some(stroke)
}
