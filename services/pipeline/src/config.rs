//! Product configuration loading.
//!
//! Loads product definitions from YAML files in `config/products/`. A
//! product names the NOMADS fields to fetch, the forecast steps to try,
//! how to render a frame and where the output goes.

use std::path::Path;

use gfs_common::{BoundingBox, ForecastStep, StepRange};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, PipelineResult};

/// Root configuration loaded from a product YAML file.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductConfig {
    pub product: ProductInfo,
    pub fields: Vec<FieldConfig>,
    /// Forecast hour ranges; the default GFS list when omitted.
    #[serde(default)]
    pub steps: Vec<StepRange>,
    pub render: RenderConfig,
    pub output: OutputConfig,
}

/// Basic product identification.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// One field requested from the NOMADS filter service.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
    /// Filter variable name, e.g. `GUST` (also the GRIB2 short name)
    pub variable: String,
    /// Filter level name, e.g. `2_m_above_ground`
    pub level: String,
    /// GRIB2 fixed surface type used to locate the field in the file
    pub level_type: u8,
    /// Folder under `<public>/grib/` the field is stored in
    pub grib_dir: String,
}

/// How a forecast step becomes an image.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    #[serde(flatten)]
    pub mode: RenderMode,
    pub bbox: BoundingBox,
    pub width: u32,
    /// Defaults to the height that keeps degrees square.
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RenderMode {
    /// One field through one discrete color scale.
    Discrete { field: String, style: String },
    /// Reflectivity colored by the rain or snow scale, chosen per pixel
    /// from the 2 m temperature.
    PrecipType {
        temperature: String,
        reflectivity: String,
        rain_style: String,
        snow_style: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Folder under the public root, also the web backend's category
    pub dir: String,
    pub image_prefix: String,
    pub animation: String,
    pub frame_delay_ms: u32,
}

impl RenderConfig {
    pub fn height(&self) -> u32 {
        self.height
            .unwrap_or_else(|| self.bbox.proportional_height(self.width))
    }
}

impl ProductConfig {
    /// Load a product configuration from a YAML file.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ProductConfig =
            serde_yaml::from_str(&content).map_err(|source| PipelineError::Yaml {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;

        debug!(product = %config.product.id, path = %path.display(), "Loaded product config");
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> PipelineResult<Self> {
        let config: ProductConfig =
            serde_yaml::from_str(yaml).map_err(|source| PipelineError::Yaml {
                path: "<inline>".into(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn id(&self) -> &str {
        &self.product.id
    }

    /// Forecast steps to probe, sorted and without duplicates.
    pub fn steps(&self) -> Vec<ForecastStep> {
        if self.steps.is_empty() {
            ForecastStep::default_steps()
        } else {
            ForecastStep::from_ranges(&self.steps)
        }
    }

    pub fn field(&self, variable: &str) -> Option<&FieldConfig> {
        self.fields.iter().find(|f| f.variable == variable)
    }

    /// Reject configs the pipeline could not run.
    pub fn validate(&self) -> PipelineResult<()> {
        let id = &self.product.id;
        let invalid = |msg: String| Err(PipelineError::Config(format!("{}: {}", id, msg)));

        if self.fields.is_empty() {
            return invalid("at least one field is required".to_string());
        }
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.variable == field.variable) {
                return invalid(format!("field {} listed twice", field.variable));
            }
            if field.grib_dir.is_empty() || field.grib_dir.contains(['/', '\\']) {
                return invalid(format!("bad grib_dir '{}'", field.grib_dir));
            }
        }

        for range in &self.steps {
            range.validate()?;
        }

        let referenced: Vec<&str> = match &self.render.mode {
            RenderMode::Discrete { field, .. } => vec![field.as_str()],
            RenderMode::PrecipType {
                temperature,
                reflectivity,
                ..
            } => vec![temperature.as_str(), reflectivity.as_str()],
        };
        for name in referenced {
            if self.field(name).is_none() {
                return invalid(format!("render refers to unknown field {}", name));
            }
        }

        self.render.bbox.validate()?;
        if self.render.width == 0 || self.render.height() == 0 {
            return invalid("render size must be non-zero".to_string());
        }
        if self.output.dir.is_empty() || self.output.dir.contains(['/', '\\']) {
            return invalid(format!("bad output dir '{}'", self.output.dir));
        }
        Ok(())
    }
}

/// Load all enabled product configurations from `<config_dir>/products`.
pub fn load_product_configs(config_dir: &Path) -> PipelineResult<Vec<ProductConfig>> {
    let products_dir = config_dir.join("products");

    if !products_dir.exists() {
        warn!(path = %products_dir.display(), "Products config directory not found");
        return Ok(Vec::new());
    }

    let mut paths: Vec<_> = std::fs::read_dir(&products_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .map_or(false, |ext| ext == "yaml" || ext == "yml")
        })
        .collect();
    paths.sort();

    let mut configs = Vec::new();
    for path in paths {
        let config = ProductConfig::load(&path)?;
        if config.product.enabled {
            info!(
                product = %config.product.id,
                name = %config.product.name,
                "Loaded product configuration"
            );
            configs.push(config);
        } else {
            debug!(product = %config.product.id, "Skipping disabled product");
        }
    }

    Ok(configs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUST: &str = r#"
product:
  id: gust
  name: Gust
fields:
  - { variable: GUST, level: surface, level_type: 1, grib_dir: Gust }
render:
  mode: discrete
  field: GUST
  style: gust
  bbox: { min_lon: -125.0, min_lat: 24.0, max_lon: -66.5, max_lat: 50.0 }
  width: 1200
output:
  dir: GUST
  image_prefix: gust
  animation: gfs_gust_animation.gif
  frame_delay_ms: 500
"#;

    #[test]
    fn test_parse_discrete_product() {
        let config = ProductConfig::from_yaml(GUST).unwrap();
        assert_eq!(config.id(), "gust");
        assert!(config.product.enabled);
        assert!(matches!(
            config.render.mode,
            RenderMode::Discrete { ref style, .. } if style == "gust"
        ));
        // 58.5° x 26° at 1200 px wide
        assert_eq!(config.render.height(), 533);
    }

    #[test]
    fn test_default_steps_when_omitted() {
        let config = ProductConfig::from_yaml(GUST).unwrap();
        let labels: Vec<String> = config.steps().iter().map(|s| s.label()).collect();
        assert_eq!(labels.len(), 27);
        assert_eq!(labels[0], "f000");
        assert_eq!(labels[12], "f012");
        assert_eq!(labels[13], "f018");
        assert_eq!(labels[26], "f096");
    }

    #[test]
    fn test_custom_steps() {
        let yaml = GUST.replace(
            "render:",
            "steps:\n  - { start: 0, end: 6, step: 3 }\nrender:",
        );
        let config = ProductConfig::from_yaml(&yaml).unwrap();
        let hours: Vec<u32> = config.steps().iter().map(|s| s.hours()).collect();
        assert_eq!(hours, vec![0, 3, 6]);
    }

    #[test]
    fn test_rejects_unknown_render_field() {
        let yaml = GUST.replace("field: GUST", "field: TMP");
        assert!(matches!(
            ProductConfig::from_yaml(&yaml),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_nested_output_dir() {
        let yaml = GUST.replace("dir: GUST", "dir: ../GUST");
        assert!(ProductConfig::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_rejects_unknown_mode() {
        let yaml = GUST.replace("mode: discrete", "mode: contour");
        assert!(matches!(
            ProductConfig::from_yaml(&yaml),
            Err(PipelineError::Yaml { .. })
        ));
    }

    #[test]
    fn test_load_product_configs_skips_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let products = dir.path().join("products");
        std::fs::create_dir_all(&products).unwrap();
        std::fs::write(products.join("a.yaml"), GUST).unwrap();
        std::fs::write(
            products.join("b.yml"),
            GUST.replace("id: gust", "id: off")
                .replace("name: Gust", "name: Off\n  enabled: false"),
        )
        .unwrap();
        std::fs::write(products.join("notes.txt"), "ignored").unwrap();

        let configs = load_product_configs(dir.path()).unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].id(), "gust");
    }

    #[test]
    fn test_missing_products_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_product_configs(dir.path()).unwrap().is_empty());
    }
}
