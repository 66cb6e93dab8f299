//! Turning downloaded step files into map frames.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use gfs_common::{BoundingBox, ForecastStep, ModelRun};
use grib2_parser::{find_field, DecodedField};
use renderer::composite::precip_type_rgba;
use renderer::png::{create_png_auto, create_png_for_scale};
use renderer::resample::resample_to_bbox;
use renderer::{DiscreteScale, StyleConfig};
use tracing::{debug, info, warn};

use crate::config::{FieldConfig, ProductConfig, RenderMode};
use crate::error::{PipelineError, PipelineResult};
use crate::folders::ProductPaths;

/// A product's render settings with its color scales resolved.
#[derive(Debug, Clone)]
pub struct StepRenderer {
    kind: RenderKind,
    bbox: BoundingBox,
    width: usize,
    height: usize,
}

#[derive(Debug, Clone)]
enum RenderKind {
    Discrete {
        field: FieldConfig,
        scale: DiscreteScale,
    },
    PrecipType {
        temperature: FieldConfig,
        reflectivity: FieldConfig,
        rain: DiscreteScale,
        snow: DiscreteScale,
    },
}

impl StepRenderer {
    pub fn new(product: &ProductConfig, styles: &StyleConfig) -> PipelineResult<Self> {
        let field = |name: &str| {
            product.field(name).cloned().ok_or_else(|| {
                PipelineError::Config(format!("{}: unknown field {}", product.id(), name))
            })
        };

        let kind = match &product.render.mode {
            RenderMode::Discrete { field: name, style } => RenderKind::Discrete {
                field: field(name)?,
                scale: styles.discrete(style)?,
            },
            RenderMode::PrecipType {
                temperature,
                reflectivity,
                rain_style,
                snow_style,
            } => RenderKind::PrecipType {
                temperature: field(temperature)?,
                reflectivity: field(reflectivity)?,
                rain: styles.discrete(rain_style)?,
                snow: styles.discrete(snow_style)?,
            },
        };

        Ok(Self {
            kind,
            bbox: product.render.bbox,
            width: product.render.width as usize,
            height: product.render.height() as usize,
        })
    }

    /// Render one step of `run` to PNG bytes.
    pub fn render(
        &self,
        paths: &ProductPaths,
        run: &ModelRun,
        step: ForecastStep,
    ) -> PipelineResult<Vec<u8>> {
        match &self.kind {
            RenderKind::Discrete { field, scale } => {
                let values = self.load_resampled(&paths.grib_file(field, run, step), field)?;
                let indices = scale.apply(&values);
                Ok(create_png_for_scale(&indices, self.width, self.height, scale)?)
            }
            RenderKind::PrecipType {
                temperature,
                reflectivity,
                rain,
                snow,
            } => {
                let temp_k =
                    self.load_resampled(&paths.grib_file(temperature, run, step), temperature)?;
                let refc =
                    self.load_resampled(&paths.grib_file(reflectivity, run, step), reflectivity)?;
                let pixels = precip_type_rgba(&refc, &temp_k, rain, snow);
                Ok(create_png_auto(&pixels, self.width, self.height)?)
            }
        }
    }

    fn load_resampled(&self, path: &Path, field: &FieldConfig) -> PipelineResult<Vec<f32>> {
        let decoded = load_field(path, field)?;
        Ok(resample_to_bbox(
            &decoded.values,
            &decoded.grid,
            &self.bbox,
            self.width,
            self.height,
        )?)
    }
}

/// Read a step file and decode the configured field from it.
pub fn load_field(path: &Path, field: &FieldConfig) -> PipelineResult<DecodedField> {
    let data = Bytes::from(std::fs::read(path)?);
    let decoded = find_field(data, &field.variable, field.level_type)?;
    debug!(
        path = %path.display(),
        parameter = %decoded.parameter,
        level = %decoded.level,
        nx = decoded.grid.nx,
        ny = decoded.grid.ny,
        "Decoded field"
    );
    Ok(decoded)
}

/// Render every step in order, writing `<output>/<prefix>_..._fNNN.png`.
///
/// A step that fails to render is logged and skipped. Returns the images
/// written, in step order.
pub fn render_steps(
    renderer: &StepRenderer,
    paths: &ProductPaths,
    run: &ModelRun,
    steps: &[ForecastStep],
) -> Vec<PathBuf> {
    let mut images = Vec::with_capacity(steps.len());

    for &step in steps {
        let output = paths.image_file(run, step);
        let result = renderer
            .render(paths, run, step)
            .and_then(|png| std::fs::write(&output, png).map_err(PipelineError::from));

        match result {
            Ok(()) => {
                info!(run = %run, step = %step, path = %output.display(), "Plot saved");
                images.push(output);
            }
            Err(e) => {
                warn!(run = %run, step = %step, error = %e, "Failed to render step");
            }
        }
    }

    images
}
