//! Shared application state.

use std::path::PathBuf;

use gfs_common::Category;

/// Where the server reads from.
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub public_dir: PathBuf,
    pub templates_dir: PathBuf,
    /// Folders under `public_dir` listed by `/images`
    pub categories: Vec<Category>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            public_dir: PathBuf::from("public"),
            templates_dir: PathBuf::from("templates"),
            categories: Category::defaults(),
        }
    }
}

pub struct AppState {
    pub config: WebConfig,
}

impl AppState {
    pub fn new(config: WebConfig) -> Self {
        Self { config }
    }
}
