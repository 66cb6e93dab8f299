//! Where GRIB files come from.
//!
//! The pipeline only needs two operations from the data service: a cheap
//! existence check (HEAD) and a download to disk. `HttpGribSource` does both
//! against NOMADS with reqwest; tests substitute an in-memory source.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

use crate::error::{PipelineError, PipelineResult};

#[async_trait]
pub trait GribSource: Send + Sync {
    /// True only when the file can be fetched right now.
    async fn exists(&self, url: &str) -> PipelineResult<bool>;

    /// Download `url` into `dest`, returning the number of bytes written.
    /// A failed download leaves no file behind.
    async fn fetch(&self, url: &str, dest: &Path) -> PipelineResult<u64>;
}

/// HTTP timeouts for talking to the data service.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// GRIB source backed by the NOMADS HTTP filter service.
pub struct HttpGribSource {
    client: Client,
}

impl HttpGribSource {
    pub fn new(options: &SourceOptions) -> PipelineResult<Self> {
        let client = Client::builder()
            .timeout(options.request_timeout)
            .connect_timeout(options.connect_timeout)
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()?;

        Ok(Self { client })
    }

    async fn stream_to_file(response: reqwest::Response, dest: &Path) -> PipelineResult<u64> {
        let mut file = File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        Ok(written)
    }
}

#[async_trait]
impl GribSource for HttpGribSource {
    #[instrument(skip(self))]
    async fn exists(&self, url: &str) -> PipelineResult<bool> {
        let response = self.client.head(url).send().await?;
        debug!(status = %response.status(), "Probed");
        Ok(response.status() == StatusCode::OK)
    }

    #[instrument(skip(self), fields(dest = %dest.display()))]
    async fn fetch(&self, url: &str, dest: &Path) -> PipelineResult<u64> {
        let response = self.client.get(url).send().await?;

        if response.status() != StatusCode::OK {
            return Err(PipelineError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        match Self::stream_to_file(response, dest).await {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                if let Err(rm) = fs::remove_file(dest).await {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        warn!(error = %rm, "Failed to remove partial download");
                    }
                }
                Err(e)
            }
        }
    }
}
