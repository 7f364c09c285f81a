//! Runs the enrichment flows in order.
//!
//! Weather reads the coordinates geocoding produces, so geocode always runs
//! first. A flow that fails at setup is logged and the next flow still runs.

use tracing::{error, info};

use crate::geocode::GeocodeEnrichment;
use crate::report::EnrichmentReport;
use crate::weather::WeatherEnrichment;

/// A flow that could not start.
#[derive(Debug, Clone)]
pub struct SetupFailure {
    pub flow: &'static str,
    pub error: String,
}

/// Result of one pipeline run.
#[derive(Debug, Default)]
pub struct PipelineOutcome {
    pub reports: Vec<EnrichmentReport>,
    pub setup_failures: Vec<SetupFailure>,
}

impl PipelineOutcome {
    /// True when every flow got past setup. Per-key failures don't count.
    pub fn is_success(&self) -> bool {
        self.setup_failures.is_empty()
    }

    pub fn report(&self, flow: &str) -> Option<&EnrichmentReport> {
        self.reports.iter().find(|r| r.flow == flow)
    }
}

/// Geocode-then-weather runner.
pub struct EnrichmentPipeline {
    geocode: GeocodeEnrichment,
    weather: WeatherEnrichment,
}

impl EnrichmentPipeline {
    pub fn new(geocode: GeocodeEnrichment, weather: WeatherEnrichment) -> Self {
        Self { geocode, weather }
    }

    pub async fn run(&self) -> PipelineOutcome {
        let mut outcome = PipelineOutcome::default();

        info!("Starting geocode enrichment");
        match self.geocode.run().await {
            Ok(report) => outcome.reports.push(report),
            Err(e) => {
                error!(flow = "geocode", error = %e, "Enrichment setup failed");
                outcome.setup_failures.push(SetupFailure {
                    flow: "geocode",
                    error: e.to_string(),
                });
            }
        }

        info!("Starting weather enrichment");
        match self.weather.run().await {
            Ok(report) => outcome.reports.push(report),
            Err(e) => {
                error!(flow = "weather", error = %e, "Enrichment setup failed");
                outcome.setup_failures.push(SetupFailure {
                    flow: "weather",
                    error: e.to_string(),
                });
            }
        }

        info!(
            flows = outcome.reports.len(),
            setup_failures = outcome.setup_failures.len(),
            "Enrichment pipeline finished"
        );
        outcome
    }
}
