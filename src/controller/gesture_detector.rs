//! Shake detection over a scalar sample stream.
//!
//! Every sample is turned into a delta against its predecessor and pushed into
//! a fixed-size window. A shake fires when the whole window is "strong" and the
//! debounce since the previous shake has run out. The window is never cleared,
//! it just keeps sliding.

use ringbuffer::{AllocRingBuffer, RingBuffer};
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShakeSettings {
    pub threshold: f32,
    pub window: usize,
    pub debounce: Duration,
}

impl Default for ShakeSettings {
    fn default() -> Self {
        Self {
            threshold: 60.0,
            window: 3,
            debounce: Duration::from_millis(1500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShakeEvent {
    pub timestamp: Instant,
    /// Smallest delta in the window that triggered the shake
    pub strength: f32,
}

#[derive(Debug)]
pub struct GestureDetector {
    settings: ShakeSettings,
    previous: Option<f32>,
    deltas: AllocRingBuffer<f32>,
    last_fired: Option<Instant>,
}

impl GestureDetector {
    /// The window must hold at least one sample; the device setup rejects a
    /// zero window before this is called.
    pub fn new(settings: ShakeSettings) -> Self {
        let window = settings.window.max(1);
        Self {
            settings,
            previous: None,
            deltas: AllocRingBuffer::new(window),
            last_fired: None,
        }
    }

    pub fn settings(&self) -> &ShakeSettings {
        &self.settings
    }

    pub fn observe(&mut self, sample: f32, now: Instant) -> Option<ShakeEvent> {
        let Some(previous) = self.previous.replace(sample) else {
            // First sample only seeds the delta
            return None;
        };

        let delta = (sample - previous).abs();
        self.deltas.push(delta);

        if !self.deltas.is_full() {
            return None;
        }

        let strong = self
            .deltas
            .iter()
            .filter(|delta| **delta > self.settings.threshold)
            .count();
        if strong < self.deltas.capacity() {
            return None;
        }

        if let Some(last) = self.last_fired {
            let since = now.saturating_duration_since(last);
            if since < self.settings.debounce {
                debug!("Shake suppressed, {:?} since last", since);
                return None;
            }
        }

        let strength = self.deltas.iter().copied().fold(f32::INFINITY, f32::min);
        self.last_fired = Some(now);
        info!("Shake detected (min delta {:.1})", strength);
        Some(ShakeEvent {
            timestamp: now,
            strength,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(detector: &mut GestureDetector, samples: &[(u64, f32)], base: Instant) -> Vec<u64> {
        samples
            .iter()
            .filter_map(|(t, sample)| {
                detector
                    .observe(*sample, base + Duration::from_millis(*t))
                    .map(|_| *t)
            })
            .collect()
    }

    #[test]
    fn sustained_shake_fires_once_within_debounce() {
        let mut detector = GestureDetector::new(ShakeSettings::default());
        let base = Instant::now();
        // Deltas 80, 90, 70, then 10
        let fired = feed(
            &mut detector,
            &[(0, 0.0), (10, 80.0), (20, 170.0), (30, 100.0), (40, 110.0)],
            base,
        );
        assert_eq!(fired, vec![30]);
    }

    #[test]
    fn isolated_spike_never_fires() {
        let mut detector = GestureDetector::new(ShakeSettings::default());
        let base = Instant::now();
        let fired = feed(
            &mut detector,
            &[
                (0, 100.0),
                (10, 105.0),
                (20, 300.0),
                (30, 298.0),
                (40, 301.0),
                (50, 299.0),
            ],
            base,
        );
        assert!(fired.is_empty());
    }

    #[test]
    fn debounce_blocks_then_releases() {
        let mut detector = GestureDetector::new(ShakeSettings::default());
        let base = Instant::now();
        let mut samples = Vec::new();
        let mut value = 0.0;
        // Constant violent shaking for two seconds at 100 ms
        for step in 0..=20u64 {
            samples.push((step * 100, value));
            value = if value == 0.0 { 100.0 } else { 0.0 };
        }
        let fired = feed(&mut detector, &samples, base);
        assert_eq!(fired, vec![300, 1800]);
    }

    #[test]
    fn window_keeps_sliding_after_fire() {
        let settings = ShakeSettings {
            threshold: 10.0,
            window: 2,
            debounce: Duration::ZERO,
        };
        let mut detector = GestureDetector::new(settings);
        let base = Instant::now();
        let fired = feed(
            &mut detector,
            &[(0, 0.0), (1, 20.0), (2, 0.0), (3, 20.0)],
            base,
        );
        // Buffer is not cleared, so the third strong delta fires again
        assert_eq!(fired, vec![2, 3]);
    }
}
