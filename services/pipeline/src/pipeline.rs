//! One end-to-end run of a product: prepare, select, fetch, render, sequence.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use gfs_common::{ForecastStep, ModelRun};
use renderer::StyleConfig;
use serde::Serialize;
use tracing::{info, instrument};

use crate::config::ProductConfig;
use crate::error::PipelineResult;
use crate::fetch::fetch_steps;
use crate::folders::{prepare_folders, ProductPaths};
use crate::render::{render_steps, StepRenderer};
use crate::select::select_run;
use crate::sequence::build_animation;
use crate::source::GribSource;
use crate::url::FilterService;

/// Outcome of a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub product: String,
    pub run: ModelRun,
    /// Steps the service reported as available for `run`
    pub available: Vec<ForecastStep>,
    pub downloaded: Vec<ForecastStep>,
    pub images: Vec<PathBuf>,
    pub animation: Option<PathBuf>,
}

pub struct Pipeline {
    product: ProductConfig,
    source: Arc<dyn GribSource>,
    filter: FilterService,
    paths: ProductPaths,
    renderer: StepRenderer,
}

impl Pipeline {
    /// Resolve the product's styles up front so a bad style fails before
    /// anything is deleted or downloaded.
    pub fn new(
        product: ProductConfig,
        source: Arc<dyn GribSource>,
        filter: FilterService,
        public_root: &Path,
        styles: &StyleConfig,
    ) -> PipelineResult<Self> {
        let renderer = StepRenderer::new(&product, styles)?;
        let paths = ProductPaths::new(public_root, &product);

        Ok(Self {
            product,
            source,
            filter,
            paths,
            renderer,
        })
    }

    /// Run once for the wall-clock time `now`.
    ///
    /// Fails only when the folders cannot be prepared or when neither the
    /// latest nor the previous run has any step available.
    #[instrument(skip(self), fields(product = %self.product.id()))]
    pub async fn run(&self, now: DateTime<Utc>) -> PipelineResult<PipelineReport> {
        prepare_folders(&self.paths).await?;

        let candidates = ModelRun::candidates(now);
        let selection =
            select_run(self.source.as_ref(), &self.filter, &self.product, &candidates).await?;

        let downloaded = fetch_steps(
            self.source.as_ref(),
            &self.filter,
            &self.product,
            &self.paths,
            &selection,
        )
        .await;

        let images = render_steps(&self.renderer, &self.paths, &selection.run, &downloaded);

        let animation = build_animation(
            &images,
            self.product.output.frame_delay_ms,
            &self.paths.animation_file(),
        );

        info!(
            run = %selection.run,
            available = selection.steps.len(),
            downloaded = downloaded.len(),
            images = images.len(),
            "Pipeline run complete"
        );

        Ok(PipelineReport {
            product: self.product.id().to_string(),
            run: selection.run,
            available: selection.steps,
            downloaded,
            images,
            animation,
        })
    }
}
