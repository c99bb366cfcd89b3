//! ActionDispatcher: Auflösung und Ausführung von Aktionen
//!
//! ```text
//! (Mode, Kanal, PressEvent) ──► resolve() ──► Action ──► dispatch()
//!                                (rein)                     │
//!                                          HidTransport ◄───┤
//!                                          Feedback / LED ◄─┘
//! ```
//!
//! `resolve` ist ein reiner Lookup. `dispatch` führt eine Aktion genau einmal
//! aus und merkt sich gehaltene Tasten und Maustasten, damit kein Loslassen
//! doppelt gesendet wird. Transportfehler werden geloggt und gezählt, aber
//! nie wiederholt.

use super::action::{Action, Trigger};
use super::mode::Mode;
use crate::controller::{ChannelId, PressEvent};
use crate::feedback::{Feedback, LedState};
use crate::hid::{layout, HidTransport, KeyCode, MouseButton, TransportError};
use tracing::{debug, warn};

/// Alle Ausgabe-Kollaborateure eines Ticks
pub struct Outputs<'a> {
    pub hid: &'a mut dyn HidTransport,
    pub feedback: &'a mut dyn Feedback,
    pub led: &'a mut LedState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub dispatched: u64,
    pub transport_failures: u64,
}

#[derive(Debug, Default)]
pub struct ActionDispatcher {
    held_keys: Vec<KeyCode>,
    held_buttons: Vec<MouseButton>,
    stats: DispatchStats,
}

impl ActionDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn held_keys(&self) -> &[KeyCode] {
        &self.held_keys
    }

    pub fn held_buttons(&self) -> &[MouseButton] {
        &self.held_buttons
    }

    /// Sucht alle passenden Bindings des Modus für das Event. Ungebundene
    /// Kombinationen ergeben `NoOp`.
    pub fn resolve(&self, mode: &Mode, channel: ChannelId, event: &PressEvent) -> Action {
        let actions = mode
            .bindings_for(channel)
            .filter_map(|binding| match binding.on.matches(event.kind)? {
                down if binding.on == Trigger::Hold => binding.action.held(down).or_else(|| {
                    // Nicht haltbare Aktion: nur beim Drücken ausführen
                    down.then(|| binding.action.clone())
                }),
                _ => Some(binding.action.clone()),
            })
            .collect();
        Action::combine(actions)
    }

    /// Aktion für `repeat`-Bindings eines lang gehaltenen Kanals
    pub fn resolve_repeat(&self, mode: &Mode, channel: ChannelId) -> Action {
        let actions = mode
            .bindings_for(channel)
            .filter(|binding| binding.on == Trigger::Repeat)
            .map(|binding| binding.action.clone())
            .collect();
        Action::combine(actions)
    }

    /// Führt eine Aktion aus. Liefert die Anzahl der Transportfehler.
    pub fn dispatch(&mut self, action: &Action, out: &mut Outputs<'_>) -> usize {
        if action.is_noop() {
            return 0;
        }
        self.stats.dispatched += 1;
        debug!("Dispatching {:?}", action);
        let before = self.stats.transport_failures;
        self.execute(action, out);
        (self.stats.transport_failures - before) as usize
    }

    /// Lässt alles los, was der Host gerade gedrückt sieht. Die eigene
    /// Buchführung wird auch bei einem Fehler geleert.
    pub fn release_all(&mut self, hid: &mut dyn HidTransport) -> bool {
        if !self.held_keys.is_empty() || !self.held_buttons.is_empty() {
            debug!(
                "Releasing {} keys and {} buttons",
                self.held_keys.len(),
                self.held_buttons.len()
            );
        }
        self.held_keys.clear();
        self.held_buttons.clear();
        let result = hid.release_all();
        self.check("release all", result)
    }

    fn execute(&mut self, action: &Action, out: &mut Outputs<'_>) {
        match action {
            Action::NoOp => {}
            Action::Key { code } => {
                if self.check("key down", out.hid.send_key(*code)) {
                    let result = out.hid.release_key(*code);
                    self.check("key up", result);
                }
            }
            Action::KeyHold { code, down: true } => {
                if self.held_keys.contains(code) {
                    debug!("Key {} already held", code);
                } else if self.check("key down", out.hid.send_key(*code)) {
                    self.held_keys.push(*code);
                }
            }
            Action::KeyHold { code, down: false } => {
                if let Some(pos) = self.held_keys.iter().position(|k| k == code) {
                    self.held_keys.remove(pos);
                    let result = out.hid.release_key(*code);
                    self.check("key up", result);
                } else {
                    debug!("Key {} not held, nothing to release", code);
                }
            }
            Action::Consumer { code } => {
                let result = out.hid.send_consumer(*code);
                self.check("consumer", result);
            }
            Action::MouseMove { dx, dy } => {
                if *dx != 0 || *dy != 0 {
                    let result = out.hid.move_mouse(*dx, *dy);
                    self.check("mouse move", result);
                }
            }
            Action::MouseButton { button, down: true } => {
                if !self.held_buttons.contains(button)
                    && self.check("mouse down", out.hid.set_mouse_button(*button, true))
                {
                    self.held_buttons.push(*button);
                }
            }
            Action::MouseButton { button, down: false } => {
                if let Some(pos) = self.held_buttons.iter().position(|b| b == button) {
                    self.held_buttons.remove(pos);
                    let result = out.hid.set_mouse_button(*button, false);
                    self.check("mouse up", result);
                }
            }
            Action::MouseClick { button } => {
                if self.check("mouse down", out.hid.set_mouse_button(*button, true)) {
                    let result = out.hid.set_mouse_button(*button, false);
                    self.check("mouse up", result);
                }
            }
            Action::Text { text } => self.type_text(text, out.hid),
            Action::Sequence { steps } => self.run_sequence(steps, out),
            Action::SetLedColor { index, color } => out.led.set_color(*index, *color),
            Action::ToggleLedPower => {
                out.led.toggle_power();
            }
            Action::AdjustBrightness { delta } => {
                out.led.adjust_brightness(*delta);
            }
            Action::CycleColor { step } => out.led.cycle_color(*step),
            Action::StartTone { hz } => out.feedback.start_tone(*hz),
            Action::StopTone => out.feedback.stop_tone(),
            Action::ShowText { title, body } => out.feedback.show_display_text(title, body),
            Action::Batch { actions } => {
                for action in actions {
                    self.execute(action, out);
                }
            }
        }
    }

    fn run_sequence(&mut self, steps: &[Action], out: &mut Outputs<'_>) {
        let mut chord: Vec<KeyCode> = Vec::new();
        for step in steps {
            match step {
                Action::Key { code } => {
                    if self.check("key down", out.hid.send_key(*code)) {
                        chord.push(*code);
                    }
                }
                Action::Text { text } => self.type_text(text, out.hid),
                other => self.execute(other, out),
            }
        }
        for code in chord.into_iter().rev() {
            // Vom Hold-Binding gehaltene Tasten bleiben gedrückt
            if self.held_keys.contains(&code) {
                continue;
            }
            let result = out.hid.release_key(code);
            self.check("key up", result);
        }
    }

    fn type_text(&mut self, text: &str, hid: &mut dyn HidTransport) {
        for ch in text.chars() {
            let Some(stroke) = layout::keystroke_for(ch) else {
                warn!("No key for character {:?}, skipped", ch);
                continue;
            };
            if stroke.shift && !self.check("key down", hid.send_key(KeyCode::LEFT_SHIFT)) {
                continue;
            }
            if self.check("key down", hid.send_key(stroke.key)) {
                let result = hid.release_key(stroke.key);
                self.check("key up", result);
            }
            if stroke.shift {
                let result = hid.release_key(KeyCode::LEFT_SHIFT);
                self.check("key up", result);
            }
        }
    }

    fn check(&mut self, what: &str, result: Result<(), TransportError>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                self.stats.transport_failures += 1;
                warn!("HID {} failed: {}", what, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::PressKind;
    use crate::feedback::{LedSettings, Rgbw};
    use crate::hid::ConsumerCode;
    use crate::mapping::action::Binding;
    use crate::mock::{HidCall, RecordingFeedback, RecordingTransport};
    use std::time::{Duration, Instant};

    fn event(channel: usize, kind: PressKind) -> PressEvent {
        PressEvent {
            channel: ChannelId(channel),
            kind,
            timestamp: Instant::now(),
            held: Duration::ZERO,
        }
    }

    fn bind(channel: usize, on: Trigger, action: Action) -> Binding {
        Binding {
            channel: ChannelId(channel),
            on,
            action,
        }
    }

    struct Rig {
        hid: RecordingTransport,
        feedback: RecordingFeedback,
        led: LedState,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                hid: RecordingTransport::default(),
                feedback: RecordingFeedback::default(),
                led: LedState::new(LedSettings::default()),
            }
        }

        fn outputs(&mut self) -> Outputs<'_> {
            Outputs {
                hid: &mut self.hid,
                feedback: &mut self.feedback,
                led: &mut self.led,
            }
        }
    }

    #[test]
    fn unmapped_combinations_resolve_to_noop() {
        let mut mode = Mode::new("test");
        mode.bindings.push(bind(0, Trigger::Short, Action::Key { code: KeyCode::A }));
        let dispatcher = ActionDispatcher::new();

        assert_eq!(
            dispatcher.resolve(&mode, ChannelId(0), &event(0, PressKind::LongPressStart)),
            Action::NoOp
        );
        assert_eq!(
            dispatcher.resolve(&mode, ChannelId(1), &event(1, PressKind::ShortPress)),
            Action::NoOp
        );
    }

    #[test]
    fn multiple_matches_become_batch_in_order() {
        let mut mode = Mode::new("test");
        let consumer = Action::Consumer {
            code: ConsumerCode::MUTE,
        };
        let color = Action::SetLedColor {
            index: None,
            color: Rgbw(255, 0, 0, 0),
        };
        mode.bindings.push(bind(0, Trigger::Short, consumer.clone()));
        mode.bindings.push(bind(0, Trigger::Release, color.clone()));
        let dispatcher = ActionDispatcher::new();

        assert_eq!(
            dispatcher.resolve(&mode, ChannelId(0), &event(0, PressKind::ShortPress)),
            Action::Batch {
                actions: vec![consumer, color.clone()]
            }
        );
        assert_eq!(
            dispatcher.resolve(&mode, ChannelId(0), &event(0, PressKind::Release)),
            color
        );
    }

    #[test]
    fn hold_binding_asserts_and_deasserts_once() {
        let mut mode = Mode::new("test");
        mode.bindings.push(bind(0, Trigger::Hold, Action::Key { code: KeyCode::B }));
        let mut dispatcher = ActionDispatcher::new();
        let mut rig = Rig::new();

        let down = dispatcher.resolve(&mode, ChannelId(0), &event(0, PressKind::Pressed));
        let up = dispatcher.resolve(&mode, ChannelId(0), &event(0, PressKind::ShortPress));
        dispatcher.dispatch(&down, &mut rig.outputs());
        dispatcher.dispatch(&down, &mut rig.outputs());
        dispatcher.dispatch(&up, &mut rig.outputs());
        dispatcher.dispatch(&up, &mut rig.outputs());

        assert_eq!(
            rig.hid.calls,
            vec![HidCall::KeyDown(KeyCode::B), HidCall::KeyUp(KeyCode::B)]
        );
        assert!(dispatcher.held_keys().is_empty());
    }

    #[test]
    fn release_all_clears_tracking_so_later_release_is_silent() {
        let mut dispatcher = ActionDispatcher::new();
        let mut rig = Rig::new();
        let left = MouseButton::Left;
        dispatcher.dispatch(
            &Action::MouseButton {
                button: left,
                down: true,
            },
            &mut rig.outputs(),
        );
        assert!(dispatcher.release_all(&mut rig.hid));
        dispatcher.dispatch(
            &Action::MouseButton {
                button: left,
                down: false,
            },
            &mut rig.outputs(),
        );
        assert_eq!(
            rig.hid.calls,
            vec![HidCall::MouseButton(left, true), HidCall::ReleaseAll]
        );
    }

    #[test]
    fn sequence_is_a_chord_that_releases_its_own_keys() {
        let mut dispatcher = ActionDispatcher::new();
        let mut rig = Rig::new();
        let sequence = Action::Sequence {
            steps: vec![
                Action::Key {
                    code: KeyCode::LEFT_CONTROL,
                },
                Action::Key {
                    code: KeyCode::LEFT_ALT,
                },
                Action::Text {
                    text: "T".to_string(),
                },
            ],
        };
        dispatcher.dispatch(&sequence, &mut rig.outputs());

        assert_eq!(
            rig.hid.calls,
            vec![
                HidCall::KeyDown(KeyCode::LEFT_CONTROL),
                HidCall::KeyDown(KeyCode::LEFT_ALT),
                HidCall::KeyDown(KeyCode::LEFT_SHIFT),
                HidCall::KeyDown(KeyCode::T),
                HidCall::KeyUp(KeyCode::T),
                HidCall::KeyUp(KeyCode::LEFT_SHIFT),
                HidCall::KeyUp(KeyCode::LEFT_ALT),
                HidCall::KeyUp(KeyCode::LEFT_CONTROL),
            ]
        );
    }

    #[test]
    fn transport_failure_is_counted_and_not_tracked() {
        let mut dispatcher = ActionDispatcher::new();
        let mut rig = Rig::new();
        rig.hid.fail_next = 1;

        let failures = dispatcher.dispatch(
            &Action::KeyHold {
                code: KeyCode::A,
                down: true,
            },
            &mut rig.outputs(),
        );
        assert_eq!(failures, 1);
        assert!(dispatcher.held_keys().is_empty());

        // Next event goes through normally
        let failures = dispatcher.dispatch(
            &Action::Consumer {
                code: ConsumerCode::PLAY_PAUSE,
            },
            &mut rig.outputs(),
        );
        assert_eq!(failures, 0);
        assert_eq!(rig.hid.calls, vec![HidCall::Consumer(ConsumerCode::PLAY_PAUSE)]);
        assert_eq!(dispatcher.stats().transport_failures, 1);
    }

    #[test]
    fn noop_emits_nothing() {
        let mut dispatcher = ActionDispatcher::new();
        let mut rig = Rig::new();
        assert_eq!(dispatcher.dispatch(&Action::NoOp, &mut rig.outputs()), 0);
        assert!(rig.hid.calls.is_empty());
        assert_eq!(dispatcher.stats().dispatched, 0);
    }

    #[test]
    fn led_actions_update_state() {
        let mut dispatcher = ActionDispatcher::new();
        let mut rig = Rig::new();
        dispatcher.dispatch(&Action::ToggleLedPower, &mut rig.outputs());
        dispatcher.dispatch(&Action::AdjustBrightness { delta: 0.25 }, &mut rig.outputs());
        assert!(!rig.led.enabled());
        assert!((rig.led.brightness() - 0.55).abs() < 1e-6);

        dispatcher.dispatch(&Action::StartTone { hz: 440 }, &mut rig.outputs());
        dispatcher.dispatch(&Action::StopTone, &mut rig.outputs());
        assert_eq!(rig.feedback.tones, vec![Some(440), None]);
    }
}
