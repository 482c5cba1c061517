use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

use crate::lifecycle::{Phase, State};

/// Times a manager phase and logs its outcome
pub struct PhaseTimer {
    phase: Phase,
    start: Instant,
}

impl PhaseTimer {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish(self, state: State, failed_services: &[&str]) {
        let duration = self.elapsed();
        info!(
            phase = %self.phase,
            state = %state,
            failed_services = ?failed_services,
            duration_ms = duration.as_millis(),
            "Service manager phase completed"
        );
    }
}
