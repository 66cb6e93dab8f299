//! In-memory stand-in for the NOMADS filter service.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use gfs_common::{ForecastStep, ModelRun};
use gfs_pipeline::{FilterService, GribSource, PipelineError, PipelineResult, ProductConfig};

pub const BASE_URL: &str = "http://mirror.test/filter_gfs_0p25.pl";

pub fn filter() -> FilterService {
    FilterService::new(BASE_URL)
}

/// Serves published bodies by URL and records every request.
#[derive(Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
    /// Probe succeeds but the download fails
    broken_downloads: HashSet<String>,
    /// Probe itself errors
    broken_probes: HashSet<String>,
    probes: Mutex<Vec<String>>,
    fetches: Mutex<Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(product: &ProductConfig, run: &ModelRun, step: u32, variable: &str) -> String {
        let field = product.field(variable).expect("field in product");
        filter().url(run, ForecastStep(step), field)
    }

    /// Publish a body for one field of one step.
    pub fn publish(
        &mut self,
        product: &ProductConfig,
        run: &ModelRun,
        step: u32,
        variable: &str,
        body: Vec<u8>,
    ) {
        self.files
            .insert(Self::url(product, run, step, variable), body);
    }

    /// Publish the same body for every field of a step.
    pub fn publish_step(&mut self, product: &ProductConfig, run: &ModelRun, step: u32, body: &[u8]) {
        for field in &product.fields {
            self.publish(product, run, step, &field.variable, body.to_vec());
        }
    }

    pub fn break_download(&mut self, product: &ProductConfig, run: &ModelRun, step: u32, variable: &str) {
        self.broken_downloads
            .insert(Self::url(product, run, step, variable));
    }

    pub fn break_probe(&mut self, product: &ProductConfig, run: &ModelRun, step: u32, variable: &str) {
        self.broken_probes
            .insert(Self::url(product, run, step, variable));
    }

    pub fn probes(&self) -> Vec<String> {
        self.probes.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl GribSource for MemorySource {
    async fn exists(&self, url: &str) -> PipelineResult<bool> {
        self.probes.lock().unwrap().push(url.to_string());
        if self.broken_probes.contains(url) {
            return Err(PipelineError::HttpStatus {
                url: url.to_string(),
                status: 502,
            });
        }
        Ok(self.files.contains_key(url) || self.broken_downloads.contains(url))
    }

    async fn fetch(&self, url: &str, dest: &Path) -> PipelineResult<u64> {
        self.fetches.lock().unwrap().push(url.to_string());
        if self.broken_downloads.contains(url) {
            return Err(PipelineError::HttpStatus {
                url: url.to_string(),
                status: 500,
            });
        }
        let body = self.files.get(url).ok_or_else(|| PipelineError::HttpStatus {
            url: url.to_string(),
            status: 404,
        })?;
        tokio::fs::write(dest, body).await?;
        Ok(body.len() as u64)
    }
}
