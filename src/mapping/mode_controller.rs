//! ModeController: Zustandsautomat über die Betriebsmodi
//!
//! Zustände sind Indizes in die feste Modusliste, dazu ein orthogonales
//! Menü-Flag (das Menü ist ein Overlay, kein eigener Modus).
//!
//! ```text
//!                 Combo / Shake / Menü-Drehung
//!   Mode[i] ─────────────────────────────────────► Mode[j]
//!      │          (vorher immer release_all)          │
//!      │ Long-Press Menütaste            Long-Press / │
//!      ▼                                 Idle-Timeout ▼
//!   [Menü aktiv] ── Drehgeber ändert Modusindex ──► [Menü aus]
//! ```
//!
//! Jeder Moduswechsel lässt zuerst alle gehaltenen HID-Ausgaben los und
//! aktiviert erst danach die Bindings des neuen Modus.

use super::action::Action;
use super::dispatcher::{ActionDispatcher, DispatchStats, Outputs};
use super::mode::Mode;
use crate::config::ConfigError;
use crate::controller::{ChannelId, PressEvent, PressKind, ShakeEvent};
use crate::hid::{ConsumerCode, HidTransport};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Bei welchem Combo-Event umgeschaltet wird
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleFire {
    /// Sobald die Haltezeit erreicht ist
    #[default]
    Start,
    /// Beim Loslassen, wenn lange genug gehalten
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleTarget {
    /// Zyklisch zum nächsten Modus
    Next,
    /// Binär zwischen zwei Modi
    Between(usize, usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComboToggle {
    pub channel: ChannelId,
    pub fire: ToggleFire,
    pub min_hold: Duration,
    pub target: ToggleTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShakeToggle {
    pub mode: usize,
    pub fallback: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuSettings {
    pub channel: ChannelId,
    pub idle_timeout: Duration,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionRules {
    pub combo_toggle: Option<ComboToggle>,
    pub shake_toggle: Option<ShakeToggle>,
    pub menu: Option<MenuSettings>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChangeCause {
    Combo,
    Shake,
    Menu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChange {
    pub from: usize,
    pub to: usize,
    pub cause: ModeChangeCause,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerState {
    pub active_mode: usize,
    pub menu_active: bool,
    pub selection_index: usize,
    pub last_transition: Option<Instant>,
    pub last_menu_action: Option<Instant>,
    pub encoder_last: Option<i32>,
}

pub struct ModeController {
    modes: Vec<Mode>,
    rules: TransitionRules,
    state: ControllerState,
    dispatcher: ActionDispatcher,
    // Mode that was active when the menu opened
    menu_origin: Option<usize>,
}

impl ModeController {
    pub fn new(modes: Vec<Mode>, rules: TransitionRules) -> Result<Self, ConfigError> {
        if modes.is_empty() {
            return Err(ConfigError::NoModes);
        }
        Ok(Self {
            modes,
            rules,
            state: ControllerState::default(),
            dispatcher: ActionDispatcher::new(),
            menu_origin: None,
        })
    }

    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    pub fn active_mode(&self) -> &Mode {
        // Index wird nur modulo der Moduszahl gesetzt
        &self.modes[self.state.active_mode]
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    pub fn stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    /// Startzustand: Modus 0, nichts gehalten, Anzeige geladen
    pub fn start(&mut self, now: Instant, out: &mut Outputs<'_>) {
        self.dispatcher.release_all(out.hid);
        self.state.last_transition = Some(now);
        self.load_mode(out);
    }

    pub fn release_all(&mut self, hid: &mut dyn HidTransport) -> bool {
        self.dispatcher.release_all(hid)
    }

    pub fn dispatch(&mut self, action: &Action, out: &mut Outputs<'_>) -> usize {
        self.dispatcher.dispatch(action, out)
    }

    /// Verarbeitet ein klassifiziertes Event. Umschalt-Gesten werden dabei
    /// verschluckt und nicht weiter dispatcht.
    pub fn handle_event(
        &mut self,
        event: &PressEvent,
        now: Instant,
        out: &mut Outputs<'_>,
    ) -> Option<ModeChange> {
        if let Some(menu) = self.rules.menu {
            if event.channel == menu.channel && event.kind == PressKind::LongPressStart {
                self.toggle_menu(now, out);
                return None;
            }
        }

        if self.state.menu_active {
            debug!("Menu active, ignoring {:?} on {}", event.kind, event.channel);
            return None;
        }

        if let Some(toggle) = self.rules.combo_toggle.clone() {
            if event.channel == toggle.channel && self.toggle_fires(&toggle, event) {
                let to = match toggle.target {
                    ToggleTarget::Next => (self.state.active_mode + 1) % self.modes.len(),
                    ToggleTarget::Between(a, b) => {
                        if self.state.active_mode == a {
                            b
                        } else {
                            a
                        }
                    }
                };
                return Some(self.switch_mode(to, ModeChangeCause::Combo, now, out));
            }
        }

        if event.kind == PressKind::ShortPress
            && self.active_mode().is_selection_driven()
            && !self.modes.iter().any(|mode| mode.binds(event.channel))
        {
            self.run_selected_shortcut(out);
            return None;
        }

        let action = self
            .dispatcher
            .resolve(self.active_mode(), event.channel, event);
        self.dispatcher.dispatch(&action, out);
        None
    }

    pub fn handle_shake(
        &mut self,
        shake: &ShakeEvent,
        out: &mut Outputs<'_>,
    ) -> Option<ModeChange> {
        let toggle = self.rules.shake_toggle?;
        if self.state.menu_active {
            return None;
        }
        let to = if self.state.active_mode == toggle.mode {
            toggle.fallback
        } else {
            toggle.mode
        };
        info!("Shake (strength {:.1}) toggles mode", shake.strength);
        Some(self.switch_mode(to, ModeChangeCause::Shake, shake.timestamp, out))
    }

    /// Drehgeber: nur das Vorzeichen der Änderung zählt
    pub fn handle_encoder(
        &mut self,
        position: i32,
        now: Instant,
        out: &mut Outputs<'_>,
    ) -> Option<ModeChange> {
        let last = self.state.encoder_last.replace(position)?;
        let step: i32 = match position.cmp(&last) {
            std::cmp::Ordering::Greater => 1,
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => return None,
        };

        if self.state.menu_active {
            let count = self.modes.len() as i64;
            let to = (self.state.active_mode as i64 + step as i64).rem_euclid(count) as usize;
            let from = self.state.active_mode;
            self.dispatcher.release_all(out.hid);
            self.state.active_mode = to;
            self.state.selection_index = 0;
            self.state.last_transition = Some(now);
            self.state.last_menu_action = Some(now);
            let name = self.active_mode().display_name.clone();
            out.feedback.show_display_text("Profile Menu", &name);
            info!("Menu selects mode {} ({})", to, self.active_mode().id);
            return Some(ModeChange {
                from,
                to,
                cause: ModeChangeCause::Menu,
            });
        }

        let mode = self.active_mode();
        if mode.is_selection_driven() {
            let options = mode.shortcuts.len();
            if options == 0 {
                return None;
            }
            let index = (self.state.selection_index as i64 + step as i64)
                .rem_euclid(options as i64) as usize;
            let name = mode.display_name.clone();
            self.state.selection_index = index;
            out.feedback
                .show_display_text(&name, &format!("Option {}", index + 1));
            debug!("Selection index {}", index);
        } else {
            let code = if step > 0 {
                ConsumerCode::VOLUME_INCREMENT
            } else {
                ConsumerCode::VOLUME_DECREMENT
            };
            self.dispatcher.dispatch(&Action::Consumer { code }, out);
        }
        None
    }

    /// Feuert `repeat`-Bindings eines lang gehaltenen Kanals
    pub fn handle_repeat(&mut self, channel: ChannelId, out: &mut Outputs<'_>) {
        if self.state.menu_active {
            return;
        }
        let action = self.dispatcher.resolve_repeat(self.active_mode(), channel);
        self.dispatcher.dispatch(&action, out);
    }

    /// Verlässt das Menü nach zu langer Inaktivität
    pub fn check_idle(&mut self, now: Instant, out: &mut Outputs<'_>) {
        let (Some(menu), true) = (self.rules.menu, self.state.menu_active) else {
            return;
        };
        let last = self.state.last_menu_action.unwrap_or(now);
        if now.saturating_duration_since(last) >= menu.idle_timeout {
            info!("Menu idle for {:?}, leaving", menu.idle_timeout);
            self.state.menu_active = false;
            self.state.selection_index = 0;
            self.state.last_menu_action = Some(now);
            self.leave_menu(out);
        }
    }

    fn toggle_fires(&self, toggle: &ComboToggle, event: &PressEvent) -> bool {
        match toggle.fire {
            ToggleFire::Start => event.kind == PressKind::ComboHoldStart,
            ToggleFire::End => {
                event.kind == PressKind::ComboHoldEnd && event.held >= toggle.min_hold
            }
        }
    }

    fn toggle_menu(&mut self, now: Instant, out: &mut Outputs<'_>) {
        self.state.menu_active = !self.state.menu_active;
        self.state.selection_index = 0;
        self.state.last_menu_action = Some(now);
        if self.state.menu_active {
            info!("Entering profile menu");
            self.menu_origin = Some(self.state.active_mode);
            self.dispatcher.release_all(out.hid);
            out.feedback.set_display_rotation(0);
            out.feedback
                .show_display_text("Profile Menu", "Rotate to select");
        } else {
            info!("Leaving profile menu");
            self.leave_menu(out);
        }
    }

    /// Back from the menu: a newly picked mode is entered in full, the
    /// unchanged one only gets its display back.
    fn leave_menu(&mut self, out: &mut Outputs<'_>) {
        if self.menu_origin.take() == Some(self.state.active_mode) {
            self.show_mode(out);
        } else {
            self.load_mode(out);
        }
    }

    fn switch_mode(
        &mut self,
        to: usize,
        cause: ModeChangeCause,
        now: Instant,
        out: &mut Outputs<'_>,
    ) -> ModeChange {
        let from = self.state.active_mode;
        // Zuerst loslassen, dann umschalten
        self.dispatcher.release_all(out.hid);
        self.state.active_mode = to % self.modes.len();
        self.state.selection_index = 0;
        self.state.last_transition = Some(now);
        info!(
            "Mode {} -> {} ({:?})",
            self.modes[from].id,
            self.active_mode().id,
            cause
        );
        self.load_mode(out);
        ModeChange {
            from,
            to: self.state.active_mode,
            cause,
        }
    }

    fn show_mode(&self, out: &mut Outputs<'_>) {
        let mode = self.active_mode();
        out.feedback.set_display_rotation(mode.rotation);
        out.feedback
            .show_display_text("Profile", &mode.display_name);
    }

    fn load_mode(&mut self, out: &mut Outputs<'_>) {
        self.show_mode(out);
        let mode = &self.modes[self.state.active_mode];
        if !mode.palette.is_empty() {
            out.led.load_palette(&mode.palette);
        }
        if mode.flash_on_enter {
            out.led.flash(out.feedback);
        }
    }

    fn run_selected_shortcut(&mut self, out: &mut Outputs<'_>) {
        let index = self.state.selection_index;
        let Some(shortcut) = self.active_mode().shortcuts.get(index).cloned() else {
            return;
        };
        info!("Running shortcut {} of {}", index + 1, self.active_mode().id);
        self.dispatcher.dispatch(&shortcut, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ShakeEvent;
    use crate::feedback::{LedSettings, LedState};
    use crate::hid::KeyCode;
    use crate::mapping::action::{Binding, Trigger};
    use crate::mock::{HidCall, Journal, RecordingFeedback, RecordingTransport};

    const KEY: ChannelId = ChannelId(0);
    const MENU: ChannelId = ChannelId(1);
    const OTHER: ChannelId = ChannelId(2);
    const COMBO: ChannelId = ChannelId(3);

    struct Rig {
        hid: RecordingTransport,
        feedback: RecordingFeedback,
        led: LedState,
        base: Instant,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                hid: RecordingTransport::default(),
                feedback: RecordingFeedback::default(),
                led: LedState::new(LedSettings::default()),
                base: Instant::now(),
            }
        }

        fn with_journal(journal: &Journal) -> Self {
            Self {
                hid: RecordingTransport::with_journal(journal),
                feedback: RecordingFeedback::with_journal(journal),
                ..Self::new()
            }
        }

        fn at(&self, ms: u64) -> Instant {
            self.base + Duration::from_millis(ms)
        }

        fn outputs(&mut self) -> Outputs<'_> {
            Outputs {
                hid: &mut self.hid,
                feedback: &mut self.feedback,
                led: &mut self.led,
            }
        }
    }

    fn event(channel: ChannelId, kind: PressKind, held_ms: u64) -> PressEvent {
        PressEvent {
            channel,
            kind,
            timestamp: Instant::now(),
            held: Duration::from_millis(held_ms),
        }
    }

    fn keypad_mode(id: &str, code: KeyCode) -> Mode {
        let mut mode = Mode::new(id);
        mode.bindings.push(Binding {
            channel: KEY,
            on: Trigger::Hold,
            action: Action::Key { code },
        });
        mode
    }

    fn shortcut_mode() -> Mode {
        let mut mode = Mode::new("shortcuts");
        mode.display_name = "Shortcuts".to_string();
        mode.rotary = super::super::mode::RotaryRole::Selection;
        mode.shortcuts = vec![
            Action::Key { code: KeyCode::F1 },
            Action::Key { code: KeyCode::F2 },
        ];
        mode
    }

    fn controller(rules: TransitionRules) -> ModeController {
        let modes = vec![
            keypad_mode("numpad", KeyCode::ONE),
            keypad_mode("gaming", KeyCode::W),
            shortcut_mode(),
        ];
        ModeController::new(modes, rules).expect("modes")
    }

    fn combo_rules(fire: ToggleFire, target: ToggleTarget) -> TransitionRules {
        TransitionRules {
            combo_toggle: Some(ComboToggle {
                channel: COMBO,
                fire,
                min_hold: Duration::from_millis(1000),
                target,
            }),
            ..Default::default()
        }
    }

    fn menu_rules() -> TransitionRules {
        TransitionRules {
            menu: Some(MenuSettings {
                channel: MENU,
                idle_timeout: Duration::from_secs(60),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn empty_mode_list_is_rejected() {
        assert!(ModeController::new(Vec::new(), TransitionRules::default()).is_err());
    }

    #[test]
    fn combo_toggle_releases_before_loading_new_mode() {
        let journal = Journal::default();
        let mut rig = Rig::with_journal(&journal);
        let mut controller = controller(combo_rules(ToggleFire::Start, ToggleTarget::Between(0, 1)));
        let now = rig.at(0);
        controller.start(now, &mut rig.outputs());
        journal.borrow_mut().clear();

        controller.handle_event(&event(KEY, PressKind::Pressed, 0), now, &mut rig.outputs());
        let change = controller.handle_event(
            &event(COMBO, PressKind::ComboHoldStart, 5000),
            rig.at(5000),
            &mut rig.outputs(),
        );

        assert_eq!(
            change,
            Some(ModeChange {
                from: 0,
                to: 1,
                cause: ModeChangeCause::Combo
            })
        );
        assert_eq!(
            journal.borrow().as_slice(),
            &[
                "hid:KeyDown(KeyCode(30))".to_string(),
                "hid:ReleaseAll".to_string(),
                "display:Profile/gaming".to_string(),
            ]
        );
        assert!(controller.dispatcher().held_keys().is_empty());

        // Release of the old key after the switch sends nothing
        rig.hid.take();
        controller.handle_event(&event(KEY, PressKind::Release, 5100), rig.at(5100), &mut rig.outputs());
        assert!(rig.hid.calls.is_empty());
    }

    #[test]
    fn combo_end_toggle_requires_min_hold_and_cycles() {
        let mut rig = Rig::new();
        let mut controller = controller(combo_rules(ToggleFire::End, ToggleTarget::Next));

        let start = controller.handle_event(
            &event(COMBO, PressKind::ComboHoldStart, 1000),
            rig.at(1000),
            &mut rig.outputs(),
        );
        assert_eq!(start, None);

        let short = controller.handle_event(
            &event(COMBO, PressKind::ComboHoldEnd, 900),
            rig.at(1000),
            &mut rig.outputs(),
        );
        assert_eq!(short, None);

        for expected in [1, 2, 0] {
            let change = controller.handle_event(
                &event(COMBO, PressKind::ComboHoldEnd, 1200),
                rig.at(2000),
                &mut rig.outputs(),
            );
            assert_eq!(change.map(|c| c.to), Some(expected));
        }
        assert_eq!(rig.hid.count(&HidCall::ReleaseAll), 3);
    }

    #[test]
    fn menu_freezes_dispatch_and_rotates_modes() {
        let mut rig = Rig::new();
        let mut controller = controller(menu_rules());

        controller.handle_encoder(0, rig.at(0), &mut rig.outputs());
        controller.handle_event(&event(MENU, PressKind::LongPressStart, 1000), rig.at(1000), &mut rig.outputs());
        assert!(controller.state().menu_active);
        assert_eq!(rig.feedback.last_text(), Some(("Profile Menu", "Rotate to select")));
        assert_eq!(rig.feedback.rotations.last(), Some(&0));

        rig.hid.take();
        controller.handle_event(&event(KEY, PressKind::Pressed, 0), rig.at(1100), &mut rig.outputs());
        assert!(rig.hid.calls.is_empty());

        // Magnitude ignored, one step back wraps to the last mode
        let change = controller.handle_encoder(-7, rig.at(1200), &mut rig.outputs());
        assert_eq!(change.map(|c| c.to), Some(2));
        assert_eq!(rig.feedback.last_text(), Some(("Profile Menu", "Shortcuts")));
        assert_eq!(rig.hid.calls, vec![HidCall::ReleaseAll]);

        controller.handle_event(&event(MENU, PressKind::LongPressStart, 1000), rig.at(3000), &mut rig.outputs());
        assert!(!controller.state().menu_active);
        assert_eq!(rig.feedback.last_text(), Some(("Profile", "Shortcuts")));
    }

    #[test]
    fn menu_idle_timeout_reloads_mode() {
        let mut rig = Rig::new();
        let mut controller = controller(menu_rules());
        controller.handle_event(&event(MENU, PressKind::LongPressStart, 1000), rig.at(0), &mut rig.outputs());

        controller.check_idle(rig.at(59_999), &mut rig.outputs());
        assert!(controller.state().menu_active);

        controller.check_idle(rig.at(60_000), &mut rig.outputs());
        assert!(!controller.state().menu_active);
        assert_eq!(rig.feedback.last_text(), Some(("Profile", "numpad")));
    }

    #[test]
    fn encoder_drives_volume_or_selection() {
        let mut rig = Rig::new();
        let mut controller = controller(TransitionRules::default());

        assert_eq!(controller.handle_encoder(10, rig.at(0), &mut rig.outputs()), None);
        assert!(rig.hid.calls.is_empty());
        controller.handle_encoder(12, rig.at(10), &mut rig.outputs());
        controller.handle_encoder(11, rig.at(20), &mut rig.outputs());
        controller.handle_encoder(11, rig.at(30), &mut rig.outputs());
        assert_eq!(
            rig.hid.take(),
            vec![
                HidCall::Consumer(ConsumerCode::VOLUME_INCREMENT),
                HidCall::Consumer(ConsumerCode::VOLUME_DECREMENT)
            ]
        );

        controller.switch_mode(2, ModeChangeCause::Menu, rig.at(40), &mut rig.outputs());
        rig.hid.take();
        controller.handle_encoder(10, rig.at(50), &mut rig.outputs());
        assert_eq!(controller.state().selection_index, 1);
        assert_eq!(rig.feedback.last_text(), Some(("Shortcuts", "Option 2")));
        controller.handle_encoder(11, rig.at(60), &mut rig.outputs());
        assert_eq!(controller.state().selection_index, 0);
        assert!(rig.hid.calls.is_empty());
    }

    #[test]
    fn short_press_on_unbound_channel_runs_selected_shortcut() {
        let mut rig = Rig::new();
        let mut controller = controller(TransitionRules::default());
        controller.switch_mode(2, ModeChangeCause::Menu, rig.at(0), &mut rig.outputs());
        controller.handle_encoder(0, rig.at(0), &mut rig.outputs());
        controller.handle_encoder(1, rig.at(10), &mut rig.outputs());
        rig.hid.take();

        controller.handle_event(&event(OTHER, PressKind::ShortPress, 100), rig.at(20), &mut rig.outputs());
        assert_eq!(
            rig.hid.take(),
            vec![HidCall::KeyDown(KeyCode::F2), HidCall::KeyUp(KeyCode::F2)]
        );

        // KEY is bound in other modes, so it never triggers a shortcut
        controller.handle_event(&event(KEY, PressKind::ShortPress, 100), rig.at(30), &mut rig.outputs());
        assert!(rig.hid.calls.is_empty());
    }

    #[test]
    fn shake_toggles_between_mode_and_fallback() {
        let mut rig = Rig::new();
        let rules = TransitionRules {
            shake_toggle: Some(ShakeToggle {
                mode: 1,
                fallback: 0,
            }),
            ..Default::default()
        };
        let mut controller = controller(rules);
        let shake = ShakeEvent {
            timestamp: rig.at(0),
            strength: 80.0,
        };

        assert_eq!(controller.handle_shake(&shake, &mut rig.outputs()).map(|c| c.to), Some(1));
        assert_eq!(controller.handle_shake(&shake, &mut rig.outputs()).map(|c| c.to), Some(0));
        assert_eq!(rig.hid.count(&HidCall::ReleaseAll), 2);
    }

    #[test]
    fn flash_and_palette_on_enter() {
        let mut rig = Rig::new();
        let mut modes = vec![Mode::new("a"), Mode::new("b")];
        modes[1].flash_on_enter = true;
        modes[1].palette = vec![crate::feedback::ColorSlot::Solid(crate::feedback::Rgbw(1, 2, 3, 0))];
        let mut controller = ModeController::new(
            modes,
            combo_rules(ToggleFire::Start, ToggleTarget::Next),
        )
        .expect("modes");

        controller.handle_event(&event(COMBO, PressKind::ComboHoldStart, 5000), rig.at(0), &mut rig.outputs());
        assert_eq!(rig.feedback.flashes, 1);
        assert_eq!(rig.led.pixels()[0], crate::feedback::Rgbw(1, 2, 3, 0));
    }

    #[test]
    fn leaving_menu_on_same_mode_keeps_colours() {
        let mut rig = Rig::new();
        let mut modes = vec![Mode::new("a"), Mode::new("b")];
        for mode in &mut modes {
            mode.flash_on_enter = true;
            mode.palette = vec![crate::feedback::ColorSlot::Solid(crate::feedback::Rgbw(1, 2, 3, 0))];
        }
        let mut controller = ModeController::new(modes, menu_rules()).expect("modes");
        controller.start(rig.at(0), &mut rig.outputs());
        assert_eq!(rig.feedback.flashes, 1);
        rig.led.set_color(None, crate::feedback::Rgbw(9, 9, 9, 0));

        // Open and close by button
        controller.handle_event(&event(MENU, PressKind::LongPressStart, 1000), rig.at(1000), &mut rig.outputs());
        controller.handle_event(&event(MENU, PressKind::LongPressStart, 1000), rig.at(3000), &mut rig.outputs());
        // Open and leave by idle timeout
        controller.handle_event(&event(MENU, PressKind::LongPressStart, 1000), rig.at(5000), &mut rig.outputs());
        controller.check_idle(rig.at(65_000), &mut rig.outputs());

        assert!(!controller.state().menu_active);
        assert_eq!(rig.feedback.flashes, 1);
        assert_eq!(rig.led.pixels()[0], crate::feedback::Rgbw(9, 9, 9, 0));
        assert_eq!(rig.feedback.last_text(), Some(("Profile", "a")));

        // Picking another mode in the menu enters it in full
        controller.handle_event(&event(MENU, PressKind::LongPressStart, 1000), rig.at(70_000), &mut rig.outputs());
        controller.handle_encoder(0, rig.at(70_100), &mut rig.outputs());
        controller.handle_encoder(1, rig.at(70_200), &mut rig.outputs());
        controller.handle_event(&event(MENU, PressKind::LongPressStart, 1000), rig.at(71_000), &mut rig.outputs());
        assert_eq!(controller.state().active_mode, 1);
        assert_eq!(rig.feedback.flashes, 2);
        assert_eq!(rig.led.pixels()[0], crate::feedback::Rgbw(1, 2, 3, 0));
        assert_eq!(rig.feedback.last_text(), Some(("Profile", "b")));
    }
}
