//! Per-slot call pacing.
//!
//! Each worker owns one pacer. After a call finishes the slot may not start
//! another until `spacing` has elapsed, so a pool of `n` slots issues at most
//! roughly `n / spacing` calls per second. There is no shared state between
//! slots.

use std::time::Duration;
use tokio::time::Instant;

/// Leaky-bucket pacer with a bucket size of one call.
#[derive(Debug)]
pub struct Pacer {
    spacing: Duration,
    next_allowed: Option<Instant>,
}

impl Pacer {
    pub fn new(spacing: Duration) -> Self {
        Self {
            spacing,
            next_allowed: None,
        }
    }

    pub fn spacing(&self) -> Duration {
        self.spacing
    }

    /// Wait until this slot may issue its next call.
    pub async fn ready(&self) {
        if let Some(at) = self.next_allowed {
            if at > Instant::now() {
                tracing::trace!(wait = ?(at - Instant::now()), "Pacing slot");
                tokio::time::sleep_until(at).await;
            }
        }
    }

    /// Record that a call just finished, successful or not.
    pub fn record_call(&mut self) {
        self.next_allowed = Some(Instant::now() + self.spacing);
    }
}
