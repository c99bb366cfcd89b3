//! Aktionen und Bindings
//!
//! Eine [`Action`] ist der aufgelöste Effekt eines klassifizierten Events.
//! Sie ist unveränderlich und wird aus der Binding-Tabelle des aktiven Modus
//! nachgeschlagen. In der Gerätekonfiguration erscheint sie als Inline-Tabelle
//! mit `type`-Feld:
//!
//! ```toml
//! action = { type = "consumer", code = "MUTE" }
//! action = { type = "sequence", steps = [{ type = "key", code = "LEFT_GUI" }, { type = "text", text = "r" }] }
//! ```

use crate::controller::{ChannelId, PressKind};
use crate::feedback::Rgbw;
use crate::hid::{ConsumerCode, KeyCode, MouseButton};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    NoOp,
    /// Taste drücken und sofort wieder loslassen
    Key { code: KeyCode },
    KeyHold { code: KeyCode, down: bool },
    Consumer { code: ConsumerCode },
    MouseMove { dx: i32, dy: i32 },
    MouseButton { button: MouseButton, down: bool },
    MouseClick { button: MouseButton },
    /// Text über das US-Layout tippen
    Text { text: String },
    /// Akkord-Makro: Tasten werden der Reihe nach gehalten, Text getippt,
    /// danach werden nur die eigenen Tasten losgelassen
    Sequence { steps: Vec<Action> },
    SetLedColor {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        color: Rgbw,
    },
    ToggleLedPower,
    AdjustBrightness { delta: f32 },
    CycleColor { step: i32 },
    StartTone { hz: u32 },
    StopTone,
    ShowText { title: String, body: String },
    Batch { actions: Vec<Action> },
}

impl Action {
    /// Nur Tasten und Mausklicks können über `hold` gehalten werden
    pub fn is_holdable(&self) -> bool {
        matches!(self, Action::Key { .. } | Action::MouseClick { .. })
    }

    /// Gehaltene Variante einer Aktion (`down = true` beim Drücken)
    pub fn held(&self, down: bool) -> Option<Action> {
        match self {
            Action::Key { code } => Some(Action::KeyHold { code: *code, down }),
            Action::MouseClick { button } => Some(Action::MouseButton {
                button: *button,
                down,
            }),
            _ => None,
        }
    }

    /// Erlaubte Schritte innerhalb einer Sequenz
    pub fn is_sequence_step(&self) -> bool {
        matches!(self, Action::Key { .. } | Action::Text { .. })
    }

    pub fn is_noop(&self) -> bool {
        match self {
            Action::NoOp => true,
            Action::Batch { actions } => actions.iter().all(Action::is_noop),
            _ => false,
        }
    }

    /// Fasst mehrere Treffer zusammen: keiner → `NoOp`, einer → direkt,
    /// mehrere → `Batch` in Deklarationsreihenfolge
    pub fn combine(mut actions: Vec<Action>) -> Action {
        match actions.len() {
            0 => Action::NoOp,
            1 => actions.remove(0),
            _ => Action::Batch { actions },
        }
    }
}

/// Wann ein Binding auslöst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Press,
    Release,
    Short,
    Long,
    Hold,
    Repeat,
}

impl Trigger {
    /// Prüft, ob ein Event-Typ diesen Trigger auslöst. `Hold` liefert die
    /// Richtung (gedrückt / losgelassen), `Repeat` wird nie über Events
    /// ausgelöst.
    pub fn matches(self, kind: PressKind) -> Option<bool> {
        let hit = match self {
            Trigger::Press => kind == PressKind::Pressed,
            Trigger::Short => kind == PressKind::ShortPress,
            Trigger::Long => matches!(kind, PressKind::LongPressStart | PressKind::ComboHoldStart),
            Trigger::Release => kind.is_release(),
            Trigger::Hold => {
                return match kind {
                    PressKind::Pressed | PressKind::ComboHoldStart => Some(true),
                    k if k.is_release() => Some(false),
                    _ => None,
                }
            }
            Trigger::Repeat => false,
        };
        hit.then_some(true)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub channel: ChannelId,
    pub on: Trigger,
    pub action: Action,
}
