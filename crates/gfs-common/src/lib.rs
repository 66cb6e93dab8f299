//! Common types and utilities shared by the GFS map pipeline and web backend.

pub mod bbox;
pub mod category;
pub mod error;
pub mod grid;
pub mod run;

pub use bbox::BoundingBox;
pub use category::{is_image_file, Category, DEFAULT_CATEGORIES, IMAGE_EXTENSIONS};
pub use error::{GfsError, GfsResult};
pub use grid::{GridSpec, ScanMode};
pub use run::{ForecastStep, ModelRun, StepRange};
