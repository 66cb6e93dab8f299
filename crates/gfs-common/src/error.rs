//! Error types shared across the workspace.

use thiserror::Error;

/// Result type alias using GfsError.
pub type GfsResult<T> = Result<T, GfsError>;

/// Primary error type for shared GFS types.
#[derive(Debug, Error)]
pub enum GfsError {
    #[error("Invalid forecast step label: {0}")]
    InvalidStep(String),

    #[error("Invalid step range {start}..={end} by {step}")]
    InvalidStepRange { start: u32, end: u32, step: u32 },

    #[error("Invalid run hour {0}: runs are issued every 6 hours")]
    InvalidRunHour(u32),

    #[error("Invalid bounding box: {0}")]
    InvalidBbox(String),

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),
}
