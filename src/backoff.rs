use crate::WorkerSettings;
use std::time::Duration;

/// Exponential pause between fetches that came back empty, capped at the
/// configured maximum and reset as soon as a message arrives.
#[derive(Debug, Clone)]
pub(crate) struct Backoff {
    initial: Duration,
    max: Duration,
    multiplier: f64,
    attempt: u32,
}

impl Backoff {
    pub(crate) fn new(settings: &WorkerSettings) -> Self {
        let multiplier = if settings.backoff_multiplier.is_finite() {
            settings.backoff_multiplier.max(1.0)
        } else {
            1.0
        };
        Self {
            initial: settings.initial_backoff,
            max: settings.max_backoff.max(settings.initial_backoff),
            multiplier,
            attempt: 0,
        }
    }

    pub(crate) fn next_delay(&mut self) -> Duration {
        // past 30 doublings any sane cap has been hit
        let exponent = self.attempt.min(30) as i32;
        self.attempt = self.attempt.saturating_add(1);

        let factor = self.multiplier.powi(exponent);
        let secs = self.initial.as_secs_f64() * factor;
        if !secs.is_finite() || secs >= self.max.as_secs_f64() {
            return self.max;
        }
        Duration::from_secs_f64(secs)
    }

    pub(crate) fn reset(&mut self) {
        self.attempt = 0;
    }
}
