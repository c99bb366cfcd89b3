use crate::config::{ConfigError, DeviceSetup};
use crate::controller::{
    GestureDetector, PressClassifier, PressEvent, RawInputFrame, SamplerError, ShakeEvent,
};
use crate::feedback::{Feedback, LedState};
use crate::hid::HidTransport;
use crate::mapping::{ContinuousOutputs, ModeChange, ModeController, Outputs};
use statum::{machine, state};
use std::time::Instant;
use tracing::{debug, info, warn};

// Lebenszyklus des Geräts
#[state]
#[derive(Debug, Clone)]
pub enum DeviceState {
    Initializing, // Komponenten gebaut, noch keine Ausgabe
    Running,      // Modus geladen, tick() erlaubt
}

/// Counters accumulated over the device's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub cycles: u64,
    pub events: u64,
    pub mode_changes: u64,
    pub dispatched: u64,
    pub transport_failures: u64,
    pub sampler_errors: u64,
}

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub events: Vec<PressEvent>,
    pub shake: Option<ShakeEvent>,
    pub mode_changes: Vec<ModeChange>,
    pub dispatched: u64,
    pub transport_failures: u64,
    pub sampler_error: Option<SamplerError>,
}

/// The whole peripheral: classifiers, mode state machine and LED model.
///
/// Owns every piece of mutable state and is driven by one context, one
/// [`tick`](Device::tick) at a time. Collaborators are lent per call.
#[machine]
pub struct Device<S: DeviceState> {
    setup: DeviceSetup,
    classifier: PressClassifier,
    detector: Option<GestureDetector>,
    controller: ModeController,
    continuous: ContinuousOutputs,
    led: LedState,
    stats: RuntimeStats,
    sampler_failing: bool,
}

impl<S: DeviceState> Device<S> {
    pub fn name(&self) -> &str {
        &self.setup.name
    }

    pub fn setup(&self) -> &DeviceSetup {
        &self.setup
    }

    pub fn controller(&self) -> &ModeController {
        &self.controller
    }

    pub fn led(&self) -> &LedState {
        &self.led
    }

    pub fn stats(&self) -> RuntimeStats {
        self.stats
    }
}

impl Device<Initializing> {
    pub fn create(setup: DeviceSetup) -> Result<Self, ConfigError> {
        info!("Creating device {}", setup.name);

        let classifier = PressClassifier::new(&setup.channels);
        let detector = setup.shake.map(GestureDetector::new);
        let controller = ModeController::new(setup.modes.clone(), setup.rules.clone())?;
        let led = LedState::new(setup.leds.clone());
        debug!(
            "Device has {} channels, shake detection {}",
            setup.channels.len(),
            if detector.is_some() { "on" } else { "off" }
        );

        Ok(Self::new(
            setup,
            classifier,
            detector,
            controller,
            ContinuousOutputs::default(),
            led,
            RuntimeStats::default(),
            false,
        ))
    }

    /// Releases everything on the host, loads mode 0 and draws the LEDs
    pub fn start(
        mut self,
        hid: &mut dyn HidTransport,
        feedback: &mut dyn Feedback,
        now: Instant,
    ) -> Device<Running> {
        info!("Starting device {}", self.setup.name);
        let mut out = Outputs {
            hid,
            feedback,
            led: &mut self.led,
        };
        self.controller.start(now, &mut out);
        out.led.render(&mut *out.feedback);
        self.classifier
            .set_combo_hold(self.controller.active_mode().combo_hold);
        self.transition()
    }
}

impl Device<Running> {
    /// Releases every key and button the host may still see pressed
    pub fn release_all(&mut self, hid: &mut dyn HidTransport) -> bool {
        self.controller.release_all(hid)
    }

    /// One sample → classify → dispatch pass.
    ///
    /// A failed poll skips classification; the classifiers keep their state
    /// and pick up again with the next good frame.
    pub fn tick(
        &mut self,
        input: Result<RawInputFrame, SamplerError>,
        now: Instant,
        hid: &mut dyn HidTransport,
        feedback: &mut dyn Feedback,
    ) -> TickReport {
        let before = self.controller.stats();
        let mut report = TickReport::default();
        let mut out = Outputs {
            hid,
            feedback,
            led: &mut self.led,
        };

        match input {
            Ok(frame) => {
                if self.sampler_failing {
                    info!("Input source recovered");
                    self.sampler_failing = false;
                }
                let frame = frame.clamped(&self.setup.analog_range, &self.setup.accel_range);

                report.events = self
                    .classifier
                    .classify_frame(&self.setup.channels, &frame, now);
                report.shake = match (&mut self.detector, frame.accel_magnitude()) {
                    (Some(detector), Some(magnitude)) => detector.observe(magnitude, now),
                    _ => None,
                };

                self.controller.check_idle(now, &mut out);

                for event in &report.events {
                    info!("{:?} on {} ({:?})", event.kind, event.channel, event.held);
                    report
                        .mode_changes
                        .extend(self.controller.handle_event(event, now, &mut out));
                }
                if let Some(shake) = &report.shake {
                    report
                        .mode_changes
                        .extend(self.controller.handle_shake(shake, &mut out));
                }
                if let (Some(position), true) = (frame.rotary, self.setup.has_rotary()) {
                    report
                        .mode_changes
                        .extend(self.controller.handle_encoder(position, now, &mut out));
                }

                if !report.mode_changes.is_empty() {
                    self.classifier
                        .set_combo_hold(self.controller.active_mode().combo_hold);
                    self.continuous.reset();
                }

                if !self.controller.state().menu_active {
                    for channel in &self.setup.channels {
                        if channel.kind.is_pressable()
                            && self.classifier.is_long_held(channel.id)
                            && self.controller.active_mode().has_repeat(channel.id)
                        {
                            self.controller.handle_repeat(channel.id, &mut out);
                        }
                    }

                    let brightness = out.led.brightness();
                    let actions = self.continuous.tick(
                        self.controller.active_mode(),
                        &frame,
                        brightness,
                        now,
                    );
                    for action in &actions {
                        self.controller.dispatch(action, &mut out);
                    }
                }
            }
            Err(e) => {
                if !self.sampler_failing {
                    warn!("Input poll failed, skipping classification: {}", e);
                    self.sampler_failing = true;
                }
                self.stats.sampler_errors += 1;
                self.controller.check_idle(now, &mut out);
                report.sampler_error = Some(e);
            }
        }

        out.led.animate(now);
        if out.led.is_dirty() {
            out.led.render(&mut *out.feedback);
        }

        let after = self.controller.stats();
        report.dispatched = after.dispatched - before.dispatched;
        report.transport_failures = after.transport_failures - before.transport_failures;

        self.stats.cycles += 1;
        self.stats.events += report.events.len() as u64;
        self.stats.mode_changes += report.mode_changes.len() as u64;
        self.stats.dispatched += report.dispatched;
        self.stats.transport_failures += report.transport_failures;
        report
    }
}
