use super::device::{Device, Running, RuntimeStats};
use crate::controller::Sampler;
use crate::feedback::Feedback;
use crate::hid::HidTransport;
use chrono::{DateTime, Local};
use std::time::{Duration, Instant};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const STATS_INTERVAL: Duration = Duration::from_secs(30);

impl Device<Running> {
    /// Drives the device at its tick rate until `cancel` fires.
    ///
    /// A tick that overruns (e.g. a blocking flash) delays the schedule
    /// instead of producing a burst of catch-up ticks.
    pub async fn run_until_cancelled(
        &mut self,
        sampler: &mut dyn Sampler,
        hid: &mut dyn HidTransport,
        feedback: &mut dyn Feedback,
        cancel: CancellationToken,
    ) -> RuntimeStats {
        let period = self.setup().tick;
        info!(
            "Starting tick loop for {} with {} every {:?}",
            self.name(),
            sampler.name(),
            period
        );

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_stats: DateTime<Local> = Local::now();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Shutdown requested for {}", self.name());
                    break;
                }

                _ = ticker.tick() => {
                    let input = sampler.poll();
                    let report = self.tick(input, Instant::now(), hid, feedback);
                    if !report.mode_changes.is_empty() {
                        debug!("Tick produced {} mode changes", report.mode_changes.len());
                    }

                    let now = Local::now();
                    if (now - last_stats).to_std().is_ok_and(|elapsed| elapsed >= STATS_INTERVAL) {
                        log_stats(self.stats(), now);
                        last_stats = now;
                    }
                }
            }
        }

        // Nichts gedrückt lassen, wenn wir aufhören
        self.release_all(hid);
        let stats = self.stats();
        log_stats(stats, Local::now());
        stats
    }
}

fn log_stats(stats: RuntimeStats, at: DateTime<Local>) {
    info!(
        "[{}] cycles: {}, events: {}, mode changes: {}, dispatched: {}, transport failures: {}, sampler errors: {}",
        at.format("%H:%M:%S"),
        stats.cycles,
        stats.events,
        stats.mode_changes,
        stats.dispatched,
        stats.transport_failures,
        stats.sampler_errors
    );
}
