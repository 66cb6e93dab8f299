//! Availability probing and run selection.

use gfs_common::{ForecastStep, ModelRun};
use tracing::{debug, info, warn};

use crate::config::ProductConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::source::GribSource;
use crate::url::FilterService;

/// The run chosen for this invocation and the steps it has published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSelection {
    pub run: ModelRun,
    pub steps: Vec<ForecastStep>,
}

/// A step is available when every field of the product probes true.
///
/// Probe errors count as unavailable. Probing stops at the first missing
/// field.
pub async fn probe_step(
    source: &dyn GribSource,
    filter: &FilterService,
    product: &ProductConfig,
    run: &ModelRun,
    step: ForecastStep,
) -> bool {
    for field in &product.fields {
        let url = filter.url(run, step, field);
        match source.exists(&url).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(run = %run, step = %step, field = %field.variable, "Not available");
                return false;
            }
            Err(e) => {
                warn!(run = %run, step = %step, field = %field.variable, error = %e, "Probe failed");
                return false;
            }
        }
    }
    true
}

/// Pick the first candidate run with at least one available step.
///
/// Every step of a run is probed before moving on, so the selection lists
/// all steps that were available at probe time.
pub async fn select_run(
    source: &dyn GribSource,
    filter: &FilterService,
    product: &ProductConfig,
    candidates: &[ModelRun],
) -> PipelineResult<RunSelection> {
    let steps = product.steps();

    for run in candidates {
        info!(product = %product.id(), run = %run, steps = steps.len(), "Checking run");

        let mut available = Vec::new();
        for &step in &steps {
            if probe_step(source, filter, product, run, step).await {
                available.push(step);
            }
        }

        if !available.is_empty() {
            info!(
                product = %product.id(),
                run = %run,
                available = available.len(),
                "Selected run"
            );
            return Ok(RunSelection {
                run: *run,
                steps: available,
            });
        }

        warn!(product = %product.id(), run = %run, "No forecast steps available");
    }

    Err(PipelineError::NoRunAvailable)
}
