//! Per-flow run summary.

use serde::Serialize;
use tracing::{info, warn};

/// Counts collected over one enrichment run.
///
/// For weather, `universe`, `cached` and `already_stored` count (area, date)
/// keys, while `dispatched` counts work items (date runs).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentReport {
    pub flow: &'static str,
    pub universe: usize,
    pub cached: usize,
    pub already_stored: usize,
    pub dispatched: usize,
    pub stored: usize,
    pub empty: usize,
    pub failed: usize,
    pub store_errors: usize,
    /// Set when the universe could not be derived
    pub aborted: Option<String>,
}

impl EnrichmentReport {
    pub fn new(flow: &'static str) -> Self {
        Self {
            flow,
            ..Default::default()
        }
    }

    pub fn aborted(flow: &'static str, reason: impl Into<String>) -> Self {
        Self {
            flow,
            aborted: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    /// Keys that needed no lookup this run.
    pub fn skipped(&self) -> usize {
        self.cached + self.already_stored
    }

    pub fn log(&self) {
        if let Some(reason) = &self.aborted {
            warn!(flow = self.flow, reason = %reason, "Enrichment aborted");
            return;
        }

        info!(
            flow = self.flow,
            universe = self.universe,
            cached = self.cached,
            already_stored = self.already_stored,
            dispatched = self.dispatched,
            stored = self.stored,
            empty = self.empty,
            failed = self.failed,
            store_errors = self.store_errors,
            "Enrichment complete"
        );
    }
}
