//! Pipeline error type.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid product config: {0}")]
    Config(String),

    #[error("Failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("No valid GFS data was found for the specified runs.")]
    NoRunAvailable,

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GRIB2 error: {0}")]
    Grib(#[from] grib2_parser::Grib2Error),

    #[error("Render error: {0}")]
    Render(#[from] renderer::RenderError),

    #[error(transparent)]
    Common(#[from] gfs_common::GfsError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
