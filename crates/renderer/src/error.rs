//! Error types for rendering.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Style error: {0}")]
    Style(String),

    #[error("Style not found: {0}")]
    StyleNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Grid error: {0}")]
    Grid(#[from] gfs_common::GfsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;
