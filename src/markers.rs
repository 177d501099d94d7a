use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use crate::{clock::SharedClock, error::MarkerError, output::SharedOutput};

/// Named start times, at most one per label. Reports go to `out`.
pub struct TimingMarkers {
    clock: SharedClock,
    out: SharedOutput,
    started: Mutex<HashMap<String, Instant>>,
}

impl TimingMarkers {
    pub fn new(clock: SharedClock, out: SharedOutput) -> Self {
        Self {
            clock,
            out,
            started: Mutex::new(HashMap::new()),
        }
    }

    /// Records the start time for `label`. An active label keeps its
    /// original start.
    pub fn mark_start(&self, label: &str) -> Result<(), MarkerError> {
        let mut started = self.started.lock().unwrap();
        if started.contains_key(label) {
            return Err(MarkerError::AlreadyStarted(label.to_owned()));
        }
        started.insert(label.to_owned(), self.clock.now());
        tracing::debug!(label, "timing marker started");
        Ok(())
    }

    /// Emits the time elapsed so far without clearing the marker.
    pub fn log_elapsed(&self, label: &str) -> Result<Duration, MarkerError> {
        let start = self
            .started
            .lock()
            .unwrap()
            .get(label)
            .copied()
            .ok_or_else(|| MarkerError::NotStarted(label.to_owned()))?;
        let elapsed = self.clock.now().saturating_duration_since(start);
        self.emit(label, elapsed);
        Ok(elapsed)
    }

    /// Emits the elapsed time for `label` and clears the marker.
    pub fn report_elapsed(&self, label: &str) -> Result<Duration, MarkerError> {
        let start = self
            .started
            .lock()
            .unwrap()
            .remove(label)
            .ok_or_else(|| MarkerError::NotStarted(label.to_owned()))?;
        let elapsed = self.clock.now().saturating_duration_since(start);
        self.emit(label, elapsed);
        tracing::debug!(label, ?elapsed, "timing marker cleared");
        Ok(elapsed)
    }

    pub fn is_active(&self, label: &str) -> bool {
        self.started.lock().unwrap().contains_key(label)
    }

    fn emit(&self, label: &str, elapsed: Duration) {
        self.out.emit(&format!("{label}: {}", format_elapsed(elapsed)));
    }
}

pub fn format_elapsed(elapsed: Duration) -> String {
    let ms = elapsed.as_secs_f64() * 1000.0;
    if ms < 1000.0 {
        format!("{ms:.3}ms")
    } else if ms < 60_000.0 {
        format!("{:.3}s", ms / 1000.0)
    } else if ms < 3_600_000.0 {
        let minutes = (ms / 60_000.0).floor();
        let seconds = (ms - minutes * 60_000.0) / 1000.0;
        format!("{minutes}:{seconds:06.3} (m:ss.mmm)")
    } else {
        let hours = (ms / 3_600_000.0).floor();
        let minutes = ((ms - hours * 3_600_000.0) / 60_000.0).floor();
        let seconds = (ms - hours * 3_600_000.0 - minutes * 60_000.0) / 1000.0;
        format!("{hours}:{minutes:02}:{seconds:06.3} (h:mm:ss.mmm)")
    }
}
