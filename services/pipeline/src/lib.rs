//! GFS map pipeline.
//!
//! For each configured product: clear its folders, find the newest GFS run
//! with published data on NOMADS, download the requested fields, render one
//! PNG per forecast step and join the PNGs into a looping GIF.

pub mod config;
pub mod error;
pub mod fetch;
pub mod folders;
pub mod pipeline;
pub mod render;
pub mod select;
pub mod sequence;
pub mod source;
pub mod url;

pub use config::{load_product_configs, FieldConfig, ProductConfig, RenderMode};
pub use error::{PipelineError, PipelineResult};
pub use folders::{prepare_folders, ProductPaths};
pub use pipeline::{Pipeline, PipelineReport};
pub use select::{probe_step, select_run, RunSelection};
pub use source::{GribSource, HttpGribSource, SourceOptions};
pub use url::{FilterService, DEFAULT_BASE_URL};
