//! Debounced press/hold/release classification
//!
//! Each pressable channel runs its own small state machine, re-evaluated once
//! per tick against monotonic time. Nothing blocks and nothing waits for a
//! release: a long press is reported on the first tick its hold time crosses
//! the threshold.
//!
//! ```text
//!            raw ──► [debounce] ──► edge / hold check ──► PressEvent
//!                                        ▲
//!   pair of channels ──► [ComboDetector] ┘ (suppress / defer)
//! ```
//!
//! Per press cycle a channel produces `Pressed`, then at most one of
//! `LongPressStart` (while held) or `ShortPress` (at release). A cycle that
//! long-fired, or was claimed by a combo, ends with `Release` instead.

use super::input::{Channel, ChannelId, ChannelKind, RawInputFrame};
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PressKind {
    Pressed,
    ShortPress,
    LongPressStart,
    Release,
    ComboHoldStart,
    ComboHoldEnd,
}

impl PressKind {
    /// Kinds that close a press cycle
    pub fn is_release(self) -> bool {
        matches!(
            self,
            PressKind::ShortPress | PressKind::Release | PressKind::ComboHoldEnd
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressEvent {
    pub channel: ChannelId,
    pub kind: PressKind,
    pub timestamp: Instant,
    pub held: Duration,
}

#[derive(Debug, Clone, Default)]
struct ChannelState {
    // Last raw sample and when it changed, for debouncing
    raw: bool,
    raw_since: Option<Instant>,
    // Debounced value, used for edge detection
    last_value: bool,
    press_start: Option<Instant>,
    long_fired: bool,
    // Press cycle was claimed by a combo
    suppressed: bool,
    long_press: Duration,
    debounce: Duration,
    pressable: bool,
}

impl ChannelState {
    fn new(channel: &Channel) -> Self {
        Self {
            long_press: channel.long_press,
            debounce: channel.debounce,
            pressable: channel.kind.is_pressable(),
            ..Default::default()
        }
    }

    /// Feeds a raw sample and returns the debounced value plus the instant
    /// the accepted value first appeared.
    fn debounced(&mut self, raw: bool, now: Instant) -> (bool, Instant) {
        if raw != self.raw || self.raw_since.is_none() {
            self.raw = raw;
            self.raw_since = Some(now);
        }
        let since = self.raw_since.unwrap_or(now);
        let stable = now.saturating_duration_since(since) >= self.debounce;
        if stable {
            (self.raw, since)
        } else {
            (self.last_value, since)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComboPhase {
    Idle,
    Pending { since: Instant },
    Active { since: Instant },
    // Fired and ended; waits for both constituents to be released
    Spent,
}

#[derive(Debug, Clone)]
struct ComboDetector {
    channel: ChannelId,
    a: ChannelId,
    b: ChannelId,
    hold: Duration,
    default_hold: Duration,
    phase: ComboPhase,
}

impl ComboDetector {
    fn involves(&self, channel: ChannelId) -> bool {
        self.a == channel || self.b == channel
    }

    fn event(&self, kind: PressKind, now: Instant, since: Instant) -> PressEvent {
        PressEvent {
            channel: self.channel,
            kind,
            timestamp: now,
            held: now.saturating_duration_since(since),
        }
    }

    /// Advances the combo with the debounced state of both constituents.
    /// Returns the event and whether the constituents must now be suppressed.
    fn update(&mut self, a_down: bool, b_down: bool, now: Instant) -> (Option<PressEvent>, bool) {
        let both = a_down && b_down;
        match self.phase {
            ComboPhase::Idle => {
                if both {
                    debug!("Combo {} pending", self.channel);
                    self.phase = ComboPhase::Pending { since: now };
                }
                (None, false)
            }
            ComboPhase::Pending { since } => {
                if !both {
                    debug!("Combo {} aborted before threshold", self.channel);
                    self.phase = ComboPhase::Idle;
                    (None, false)
                } else if now.saturating_duration_since(since) >= self.hold {
                    info!(
                        "Combo {} held for {:?}",
                        self.channel,
                        now.saturating_duration_since(since)
                    );
                    self.phase = ComboPhase::Active { since };
                    (Some(self.event(PressKind::ComboHoldStart, now, since)), true)
                } else {
                    (None, false)
                }
            }
            ComboPhase::Active { since } => {
                if both {
                    return (None, false);
                }
                self.phase = if !a_down && !b_down {
                    ComboPhase::Idle
                } else {
                    ComboPhase::Spent
                };
                (Some(self.event(PressKind::ComboHoldEnd, now, since)), false)
            }
            ComboPhase::Spent => {
                if !a_down && !b_down {
                    self.phase = ComboPhase::Idle;
                }
                (None, false)
            }
        }
    }
}

/// Turns raw channel samples into [`PressEvent`]s
#[derive(Debug, Clone)]
pub struct PressClassifier {
    states: Vec<ChannelState>,
    combos: Vec<ComboDetector>,
}

impl PressClassifier {
    pub fn new(channels: &[Channel]) -> Self {
        let states = channels.iter().map(ChannelState::new).collect();
        let combos = channels
            .iter()
            .filter_map(|channel| match channel.kind {
                ChannelKind::Combo { a, b, hold } => Some(ComboDetector {
                    channel: channel.id,
                    a,
                    b,
                    hold,
                    default_hold: hold,
                    phase: ComboPhase::Idle,
                }),
                _ => None,
            })
            .collect();

        Self { states, combos }
    }

    /// Overrides the hold threshold of every combo, `None` restores the
    /// configured values.
    pub fn set_combo_hold(&mut self, hold: Option<Duration>) {
        for combo in &mut self.combos {
            combo.hold = hold.unwrap_or(combo.default_hold);
        }
    }

    /// Classifies a single channel sample.
    ///
    /// Combo detection needs both constituents of a pair and only runs in
    /// [`classify_frame`](Self::classify_frame); a suppression or deferral it
    /// set up is still honoured here.
    pub fn classify(&mut self, channel: ChannelId, raw: bool, now: Instant) -> Option<PressEvent> {
        let state = self.states.get_mut(channel.0)?;
        if !state.pressable {
            return None;
        }
        let (value, since) = state.debounced(raw, now);
        let deferred = self.is_pending(channel);
        self.advance(channel, value, since, now, deferred)
    }

    /// Classifies every channel in the frame. Combo events come first.
    pub fn classify_frame(
        &mut self,
        channels: &[Channel],
        frame: &RawInputFrame,
        now: Instant,
    ) -> Vec<PressEvent> {
        // Debounce everything first so combos see this tick's values
        let mut values = Vec::with_capacity(channels.len());
        for channel in channels {
            let sample = match (frame.is_pressed(&channel.kind), self.states.get_mut(channel.id.0)) {
                (Some(raw), Some(state)) => Some(state.debounced(raw, now)),
                _ => None,
            };
            values.push(sample);
        }

        let down = |id: ChannelId| -> bool {
            values
                .get(id.0)
                .copied()
                .flatten()
                .is_some_and(|(value, _)| value)
        };

        let mut events = Vec::new();
        let mut claimed = Vec::new();
        let mut aborted = Vec::new();
        for combo in &mut self.combos {
            let was_pending = matches!(combo.phase, ComboPhase::Pending { .. });
            let (event, suppress) = combo.update(down(combo.a), down(combo.b), now);
            if suppress {
                claimed.push(combo.a);
                claimed.push(combo.b);
            }
            if was_pending && combo.phase == ComboPhase::Idle {
                aborted.push(combo.a);
                aborted.push(combo.b);
            }
            events.extend(event);
        }
        for id in claimed {
            if let Some(state) = self.states.get_mut(id.0) {
                state.suppressed = true;
            }
        }
        for id in aborted {
            if !self.is_pending(id) {
                events.extend(self.release_deferred_long(id, now));
            }
        }

        for channel in channels {
            let Some((value, since)) = values.get(channel.id.0).copied().flatten() else {
                continue;
            };
            let deferred = self.is_pending(channel.id);
            events.extend(self.advance(channel.id, value, since, now, deferred));
        }

        for event in &events {
            debug!("Press event {:?} on {} after {:?}", event.kind, event.channel, event.held);
        }
        events
    }

    /// True while a channel is past its long-press threshold and still held
    /// outside of a combo. Drives `repeat` bindings.
    pub fn is_long_held(&self, channel: ChannelId) -> bool {
        self.states.get(channel.0).is_some_and(|state| {
            state.press_start.is_some() && state.long_fired && !state.suppressed
        })
    }

    /// Debounced pressed state of a channel
    pub fn is_down(&self, channel: ChannelId) -> bool {
        self.states
            .get(channel.0)
            .is_some_and(|state| state.last_value)
    }

    fn is_pending(&self, channel: ChannelId) -> bool {
        self.combos.iter().any(|combo| {
            combo.involves(channel) && matches!(combo.phase, ComboPhase::Pending { .. })
        })
    }

    /// Fires the long press a pending combo held back, once that combo is
    /// aborted. Covers constituents released in the very tick of the abort.
    fn release_deferred_long(&mut self, channel: ChannelId, now: Instant) -> Option<PressEvent> {
        let state = self.states.get_mut(channel.0)?;
        let start = state.press_start?;
        let held = now.saturating_duration_since(start);
        if state.long_fired || state.suppressed || held < state.long_press {
            return None;
        }
        state.long_fired = true;
        Some(PressEvent {
            channel,
            kind: PressKind::LongPressStart,
            timestamp: now,
            held,
        })
    }

    fn advance(
        &mut self,
        channel: ChannelId,
        value: bool,
        since: Instant,
        now: Instant,
        deferred: bool,
    ) -> Option<PressEvent> {
        let state = self.states.get_mut(channel.0)?;
        let event = |kind, held| PressEvent {
            channel,
            kind,
            timestamp: now,
            held,
        };

        match (state.last_value, value) {
            (false, true) => {
                state.last_value = true;
                state.press_start = Some(since);
                state.long_fired = false;
                state.suppressed = false;
                Some(event(PressKind::Pressed, Duration::ZERO))
            }
            (true, false) => {
                state.last_value = false;
                let held = state
                    .press_start
                    .take()
                    .map(|start| now.saturating_duration_since(start))
                    .unwrap_or_default();
                let kind = if state.long_fired || state.suppressed {
                    PressKind::Release
                } else {
                    PressKind::ShortPress
                };
                state.long_fired = false;
                state.suppressed = false;
                Some(event(kind, held))
            }
            (true, true) => {
                let start = state.press_start?;
                let held = now.saturating_duration_since(start);
                if state.long_fired || state.suppressed || deferred || held < state.long_press {
                    return None;
                }
                state.long_fired = true;
                Some(event(PressKind::LongPressStart, held))
            }
            (false, false) => None,
        }
    }
}
