//! Betriebsmodi (Profile)
//!
//! Ein [`Mode`] ist ein unveränderlicher Konfigurationswert: Name, Binding-
//! Tabelle und Flags. Die Liste der Modi steht nach dem Start fest; der
//! ModeController hält nur einen Index darauf.

use super::action::{Action, Binding, Trigger};
use super::continuous::{AutoClickSettings, PointerSettings};
use crate::controller::ChannelId;
use crate::feedback::ColorSlot;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wofür der Drehgeber im Modus benutzt wird
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotaryRole {
    #[default]
    Volume,
    Selection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mode {
    pub id: String,
    pub display_name: String,
    pub bindings: Vec<Binding>,
    pub rotary: RotaryRole,
    /// Optionen für auswahlgesteuerte Modi, ausgeführt per Kurzdruck
    pub shortcuts: Vec<Action>,
    pub rotation: u16,
    pub palette: Vec<ColorSlot>,
    pub flash_on_enter: bool,
    /// Überschreibt die Combo-Haltezeit, solange der Modus aktiv ist
    pub combo_hold: Option<Duration>,
    pub pointer: Option<PointerSettings>,
    pub auto_click: Option<AutoClickSettings>,
}

impl Mode {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            id,
            bindings: Vec::new(),
            rotary: RotaryRole::default(),
            shortcuts: Vec::new(),
            rotation: 0,
            palette: Vec::new(),
            flash_on_enter: false,
            combo_hold: None,
            pointer: None,
            auto_click: None,
        }
    }

    pub fn is_selection_driven(&self) -> bool {
        self.rotary == RotaryRole::Selection
    }

    /// Hat der Modus irgendein Binding für diesen Kanal?
    pub fn binds(&self, channel: ChannelId) -> bool {
        self.bindings.iter().any(|binding| binding.channel == channel)
    }

    pub fn bindings_for(
        &self,
        channel: ChannelId,
    ) -> impl Iterator<Item = &Binding> + '_ {
        self.bindings
            .iter()
            .filter(move |binding| binding.channel == channel)
    }

    pub fn has_repeat(&self, channel: ChannelId) -> bool {
        self.bindings_for(channel)
            .any(|binding| binding.on == Trigger::Repeat)
    }
}
