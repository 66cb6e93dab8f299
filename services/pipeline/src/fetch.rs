//! Downloading the selected run's step files.

use gfs_common::ForecastStep;
use tokio::fs;
use tracing::{info, warn};

use crate::config::ProductConfig;
use crate::folders::ProductPaths;
use crate::select::RunSelection;
use crate::source::GribSource;
use crate::url::FilterService;

/// Download every field of every selected step.
///
/// A step counts only if all of its fields arrive; otherwise the files
/// already written for it are removed and the step is skipped. Returns the
/// downloaded steps in order.
pub async fn fetch_steps(
    source: &dyn GribSource,
    filter: &FilterService,
    product: &ProductConfig,
    paths: &ProductPaths,
    selection: &RunSelection,
) -> Vec<ForecastStep> {
    let run = &selection.run;
    let mut downloaded = Vec::with_capacity(selection.steps.len());

    'steps: for &step in &selection.steps {
        let mut written = Vec::with_capacity(product.fields.len());

        for field in &product.fields {
            let url = filter.url(run, step, field);
            let dest = paths.grib_file(field, run, step);

            match source.fetch(&url, &dest).await {
                Ok(bytes) => {
                    info!(run = %run, step = %step, field = %field.variable, bytes, "Downloaded");
                    written.push(dest);
                }
                Err(e) => {
                    warn!(
                        run = %run,
                        step = %step,
                        field = %field.variable,
                        error = %e,
                        "Download failed, skipping step"
                    );
                    for path in written {
                        if let Err(e) = fs::remove_file(&path).await {
                            warn!(path = %path.display(), error = %e, "Failed to remove partial step");
                        }
                    }
                    continue 'steps;
                }
            }
        }

        downloaded.push(step);
    }

    downloaded
}
