//! Map rendering for gridded weather fields.
//!
//! - [`style`]: discrete color scales loaded from JSON
//! - [`resample`]: bilinear sampling of lat/lon grids onto a map box
//! - [`composite`]: rain/snow compositing of reflectivity by temperature
//! - [`png`]: indexed and RGBA PNG encoding
//! - [`animation`]: looping GIFs from PNG frames

pub mod animation;
pub mod composite;
pub mod error;
pub mod png;
pub mod resample;
pub mod style;

pub use error::{RenderError, RenderResult};
pub use style::{DiscreteScale, StyleConfig, StyleDefinition};
