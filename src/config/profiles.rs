//! Built-in device profiles.
//!
//! Each profile is a complete [`DeviceConfig`] for one of the supported
//! peripherals. `openpad --dump-config <name>` writes one out as TOML, which
//! is the easiest starting point for a custom config.

use super::{ChannelConfig, ComboConfig, DeviceConfig, MenuConfig, ModeConfig, ShakeConfig, TimingConfig, ToggleConfig};
use crate::controller::{AnalogAxis, AnalogRange, AnalogTrigger};
use crate::feedback::{colorwheel, ColorSlot, LedSettings, Rgbw};
use crate::hid::{ConsumerCode, KeyCode, MouseButton};
use crate::mapping::{
    Action, AutoClickSettings, PointerSettings, RotaryRole, ToggleFire, Trigger,
};

pub const BUILTIN_PROFILES: &[&str] = &["media_keypad", "touch_clicker", "nunchuck", "macropad"];

pub fn builtin(name: &str) -> Option<DeviceConfig> {
    match name {
        "media_keypad" => Some(media_keypad()),
        "touch_clicker" => Some(touch_clicker()),
        "nunchuck" => Some(nunchuck()),
        "macropad" => Some(macropad()),
        _ => None,
    }
}

const RED: Rgbw = Rgbw(255, 0, 0, 0);
const ORANGE: Rgbw = Rgbw(255, 127, 0, 0);
const YELLOW: Rgbw = Rgbw(255, 255, 0, 0);
const GREEN: Rgbw = Rgbw(0, 255, 0, 0);
const CYAN: Rgbw = Rgbw(0, 255, 255, 0);
const BLUE: Rgbw = Rgbw(0, 0, 255, 0);
const MAGENTA: Rgbw = Rgbw(255, 0, 255, 0);
const PURPLE: Rgbw = Rgbw(127, 0, 255, 0);
const PINK: Rgbw = Rgbw(255, 192, 203, 0);

fn base(name: &str) -> DeviceConfig {
    DeviceConfig {
        name: name.to_string(),
        timing: TimingConfig::default(),
        analog_range: AnalogRange::default(),
        accel_range: AnalogRange { min: 0, max: 1023 },
        gpio_pins: Vec::new(),
        leds: LedSettings::default(),
        channels: Vec::new(),
        combos: Vec::new(),
        toggle: None,
        shake: None,
        menu: None,
        modes: Vec::new(),
    }
}

fn fill(color: Rgbw) -> Action {
    Action::SetLedColor { index: None, color }
}

fn key(code: KeyCode) -> Action {
    Action::Key { code }
}

fn text(text: &str) -> Action {
    Action::Text {
        text: text.to_string(),
    }
}

fn sequence(steps: Vec<Action>) -> Action {
    Action::Sequence { steps }
}

/// Six-button media keypad; a held volume pair flips into brightness mode
fn media_keypad() -> DeviceConfig {
    let buttons = [
        ("rewind", ConsumerCode::REWIND, RED),
        ("mute", ConsumerCode::MUTE, ORANGE),
        ("vol_down", ConsumerCode::VOLUME_DECREMENT, YELLOW),
        ("fast_forward", ConsumerCode::FAST_FORWARD, GREEN),
        ("vol_up", ConsumerCode::VOLUME_INCREMENT, CYAN),
        ("play_pause", ConsumerCode::PLAY_PAUSE, BLUE),
    ];

    let mut config = base("media_keypad");
    config.gpio_pins = vec![5, 6, 13, 19, 26, 21];
    config.leds = LedSettings {
        pixel_count: 7,
        ..LedSettings::default()
    };
    config.channels = buttons
        .iter()
        .enumerate()
        .map(|(index, (name, _, _))| ChannelConfig::digital(name, index))
        .collect();
    config.combos = vec![ComboConfig {
        name: "combo".to_string(),
        a: "vol_down".to_string(),
        b: "vol_up".to_string(),
        hold_ms: 5000,
    }];
    config.toggle = Some(ToggleConfig {
        channel: "combo".to_string(),
        fire: ToggleFire::Start,
        min_hold_ms: 0,
        between: vec!["media".to_string(), "brightness".to_string()],
    });

    let mut media = ModeConfig::new("media");
    media.display_name = Some("Media".to_string());
    media.flash_on_enter = true;
    for (name, code, color) in buttons {
        media = media
            .bind(name, Trigger::Short, Action::Consumer { code })
            .bind(name, Trigger::Short, fill(color));
    }
    media = media
        .bind("rewind", Trigger::Long, Action::ToggleLedPower)
        .bind("fast_forward", Trigger::Long, Action::ToggleLedPower);

    let mut brightness = ModeConfig::new("brightness");
    brightness.display_name = Some("Brightness".to_string());
    brightness.flash_on_enter = true;
    brightness.combo_hold_ms = Some(2000);
    brightness.palette = [RED, ORANGE, YELLOW, GREEN, CYAN, BLUE, MAGENTA, PURPLE, PINK, Rgbw::WHITE]
        .into_iter()
        .map(ColorSlot::Solid)
        .collect();
    brightness = brightness
        .bind("vol_up", Trigger::Short, Action::AdjustBrightness { delta: 0.25 })
        .bind("vol_down", Trigger::Short, Action::AdjustBrightness { delta: -0.25 })
        .bind("fast_forward", Trigger::Short, Action::CycleColor { step: 1 })
        .bind("rewind", Trigger::Short, Action::CycleColor { step: -1 });

    config.modes = vec![media, brightness];
    config
}

/// Two touch pads driving an auto-clicker; brightness sets the click rate
fn touch_clicker() -> DeviceConfig {
    let mut config = base("touch_clicker");
    config.leds = LedSettings {
        pixel_count: 4,
        brightness: 0.1,
        min_brightness: 0.0,
        ..LedSettings::default()
    };
    config.channels = ["touch1", "touch2"]
        .iter()
        .enumerate()
        .map(|(index, name)| ChannelConfig {
            long_press_ms: Some(1000),
            debounce_ms: Some(20),
            ..ChannelConfig::capacitive(name, index)
        })
        .collect();

    let mut clicker = ModeConfig::new("clicker");
    clicker.display_name = Some("Auto Clicker".to_string());
    clicker.auto_click = Some(AutoClickSettings {
        button: MouseButton::Left,
        ..AutoClickSettings::default()
    });
    clicker.palette = [RED, GREEN, BLUE, YELLOW, CYAN, MAGENTA, Rgbw::WHITE]
        .into_iter()
        .map(ColorSlot::Solid)
        .chain(std::iter::once(ColorSlot::Rainbow))
        .collect();
    clicker = clicker
        .bind("touch1", Trigger::Short, Action::CycleColor { step: 1 })
        .bind("touch1", Trigger::Repeat, Action::AdjustBrightness { delta: 0.01 })
        .bind("touch2", Trigger::Short, Action::CycleColor { step: -1 })
        .bind("touch2", Trigger::Repeat, Action::AdjustBrightness { delta: -0.01 });

    config.modes = vec![clicker];
    config
}

/// Nunchuck: arrow keys by default, shake or hold C+Z for the air mouse
fn nunchuck() -> DeviceConfig {
    let mut config = base("nunchuck");
    config.channels = vec![
        ChannelConfig::digital("c", 0),
        ChannelConfig::digital("z", 1),
        ChannelConfig::analog("left", AnalogAxis::JoystickX, AnalogTrigger::Below(88)),
        ChannelConfig::analog("right", AnalogAxis::JoystickX, AnalogTrigger::Above(168)),
        ChannelConfig::analog("down", AnalogAxis::JoystickY, AnalogTrigger::Below(88)),
        ChannelConfig::analog("up", AnalogAxis::JoystickY, AnalogTrigger::Above(168)),
    ];
    config.combos = vec![ComboConfig {
        name: "cz".to_string(),
        a: "c".to_string(),
        b: "z".to_string(),
        hold_ms: 1000,
    }];
    config.toggle = Some(ToggleConfig {
        channel: "cz".to_string(),
        fire: ToggleFire::End,
        min_hold_ms: 1000,
        between: vec!["keyboard".to_string(), "air_mouse".to_string()],
    });
    config.shake = Some(ShakeConfig {
        threshold: 60.0,
        window: 3,
        debounce_ms: 1500,
        mode: "air_mouse".to_string(),
        fallback: "keyboard".to_string(),
    });

    let mut keyboard = ModeConfig::new("keyboard");
    keyboard.display_name = Some("Keyboard".to_string());
    keyboard = keyboard
        .bind("left", Trigger::Hold, key(KeyCode::LEFT_ARROW))
        .bind("right", Trigger::Hold, key(KeyCode::RIGHT_ARROW))
        .bind("down", Trigger::Hold, key(KeyCode::DOWN_ARROW))
        .bind("up", Trigger::Hold, key(KeyCode::UP_ARROW))
        .bind("c", Trigger::Hold, key(KeyCode::B))
        .bind("z", Trigger::Hold, key(KeyCode::A));

    let mut air_mouse = ModeConfig::new("air_mouse");
    air_mouse.display_name = Some("Air Mouse".to_string());
    air_mouse.pointer = Some(PointerSettings::default());
    air_mouse = air_mouse
        .bind("c", Trigger::Hold, Action::MouseClick { button: MouseButton::Left })
        .bind("z", Trigger::Hold, Action::MouseClick { button: MouseButton::Right });

    config.modes = vec![keyboard, air_mouse];
    config
}

/// 12-key macropad with rotary encoder and a profile menu on the encoder switch
fn macropad() -> DeviceConfig {
    const KEYS: [KeyCode; 12] = [
        KeyCode::ONE,
        KeyCode::TWO,
        KeyCode::THREE,
        KeyCode::FOUR,
        KeyCode::FIVE,
        KeyCode::SIX,
        KeyCode::SEVEN,
        KeyCode::EIGHT,
        KeyCode::NINE,
        KeyCode::ZERO,
        KeyCode::MINUS,
        KeyCode::EQUALS,
    ];
    const TONES: [u32; 12] = [196, 220, 246, 262, 294, 330, 349, 392, 440, 494, 523, 587];

    let mut config = base("macropad");
    config.leds = LedSettings {
        pixel_count: 12,
        ..LedSettings::default()
    };
    config.channels = (0..12)
        .map(|index| ChannelConfig::digital(&format!("key{}", index), index))
        .collect();
    config
        .channels
        .push(ChannelConfig::digital("encoder_switch", 12));
    config.channels.push(ChannelConfig::rotary("encoder"));
    config.menu = Some(MenuConfig {
        channel: "encoder_switch".to_string(),
        idle_timeout_ms: 60_000,
    });

    let mut numpad = ModeConfig::new("numpad");
    numpad.display_name = Some("NumPad".to_string());
    for (index, code) in KEYS.into_iter().enumerate() {
        let channel = format!("key{}", index);
        numpad = key_feedback(
            numpad.bind(&channel, Trigger::Hold, key(code)),
            index,
            TONES[index],
        );
    }

    let mut wasd = ModeConfig::new("wasd");
    wasd.display_name = Some("Gaming\nWASD".to_string());
    wasd.rotation = 90;
    for (index, code) in [
        (8, KeyCode::W),
        (4, KeyCode::A),
        (7, KeyCode::S),
        (10, KeyCode::D),
        (1, KeyCode::LEFT_SHIFT),
        (3, KeyCode::SPACE),
        (6, KeyCode::SPACE),
        (9, KeyCode::SPACE),
        (5, KeyCode::Q),
        (11, KeyCode::E),
    ] {
        wasd = key_feedback(
            wasd.bind(&format!("key{}", index), Trigger::Hold, key(code)),
            index,
            TONES[index],
        );
    }

    let mac = shortcut_mode(
        "mac",
        "Mac Shortcuts",
        vec![
            sequence(vec![key(KeyCode::LEFT_GUI), key(KeyCode::SPACE), text("safari"), key(KeyCode::ENTER)]),
            sequence(vec![key(KeyCode::LEFT_GUI), key(KeyCode::SPACE), text("steam"), key(KeyCode::ENTER)]),
            sequence(vec![key(KeyCode::LEFT_GUI), key(KeyCode::LEFT_SHIFT), key(KeyCode::THREE)]),
            sequence(Vec::new()),
        ],
    );
    let windows = shortcut_mode(
        "windows",
        "Windows Shortcuts",
        vec![
            sequence(vec![key(KeyCode::LEFT_GUI), text("r"), key(KeyCode::ENTER), text("https://youtube.com"), key(KeyCode::ENTER)]),
            sequence(vec![key(KeyCode::LEFT_GUI), text("r"), key(KeyCode::ENTER), text("steam"), key(KeyCode::ENTER)]),
            sequence(vec![key(KeyCode::LEFT_GUI), key(KeyCode::E)]),
            sequence(Vec::new()),
        ],
    );
    let linux = shortcut_mode(
        "linux",
        "Linux Shortcuts",
        vec![
            sequence(vec![key(KeyCode::LEFT_CONTROL), key(KeyCode::LEFT_ALT), text("t")]),
            sequence(vec![text("steam")]),
            sequence(vec![text("echo 'Hello Linux'")]),
            sequence(Vec::new()),
        ],
    );

    config.modes = vec![numpad, wasd, mac, windows, linux];
    config
}

/// Lights the key's pixel and plays its tone while it is held
fn key_feedback(mode: ModeConfig, index: usize, hz: u32) -> ModeConfig {
    let channel = format!("key{}", index);
    mode.bind(
        &channel,
        Trigger::Press,
        Action::SetLedColor {
            index: Some(index),
            color: colorwheel((index * 21) as u8),
        },
    )
    .bind(&channel, Trigger::Press, Action::StartTone { hz })
    .bind(&channel, Trigger::Release, fill(Rgbw::BLACK))
    .bind(&channel, Trigger::Release, Action::StopTone)
}

fn shortcut_mode(id: &str, display_name: &str, shortcuts: Vec<Action>) -> ModeConfig {
    let mut mode = ModeConfig::new(id);
    mode.display_name = Some(display_name.to_string());
    mode.rotary = RotaryRole::Selection;
    mode.shortcuts = shortcuts;
    mode
}
