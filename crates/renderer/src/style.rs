//! Style configuration and discrete color scales.
//!
//! Styles are JSON documents of the form
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "styles": {
//!     "gust": {
//!       "name": "Wind Gust",
//!       "type": "discrete",
//!       "units": "m/s",
//!       "stops": [{ "value": 0, "color": "#ADD8E6" }, { "value": 5, "color": "#0000FF" }],
//!       "out_of_range": "clamp"
//!     }
//!   }
//! }
//! ```
//!
//! A discrete style paints every value in `[stop[i].value, stop[i+1].value)`
//! with `stop[i].color`. The last band ends at `max_value`, or extends to
//! infinity when no `max_value` is given.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RenderError, RenderResult};

/// Style configuration loaded from JSON
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StyleConfig {
    pub version: String,
    pub styles: HashMap<String, StyleDefinition>,
}

/// A single style definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StyleDefinition {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub style_type: String,
    pub units: Option<String>,
    pub stops: Vec<ColorStop>,
    /// Upper bound (exclusive) of the last band
    pub max_value: Option<f32>,
    #[serde(default)]
    pub out_of_range: OutOfRange,
}

/// Color stop: lower bound of a band and its color
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColorStop {
    pub value: f32,
    pub color: String,
    pub label: Option<String>,
}

/// What to paint for values outside the style's bands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutOfRange {
    /// Below the first stop uses the first color, above the last band uses the last color
    #[default]
    Clamp,
    Transparent,
}

impl StyleConfig {
    /// Load style configuration from JSON string
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Load style configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> RenderResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    /// Load and merge every `*.json` file in a directory.
    ///
    /// Files are read in name order, so a later file overrides a style of
    /// the same key from an earlier one.
    pub fn load_dir(dir: impl AsRef<Path>) -> RenderResult<Self> {
        let dir = dir.as_ref();
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        paths.sort();

        let mut merged = StyleConfig::default();
        for path in paths {
            let config = Self::from_file(&path)?;
            debug!(path = %path.display(), styles = config.styles.len(), "Loaded style file");
            merged.version = config.version;
            merged.styles.extend(config.styles);
        }
        Ok(merged)
    }

    /// Get a specific style definition
    pub fn get_style(&self, name: &str) -> Option<&StyleDefinition> {
        self.styles.get(name)
    }

    /// Build the discrete scale for a named style.
    pub fn discrete(&self, name: &str) -> RenderResult<DiscreteScale> {
        let style = self
            .get_style(name)
            .ok_or_else(|| RenderError::StyleNotFound(name.to_string()))?;
        DiscreteScale::from_style(style)
    }
}

/// Parse hex color string to RGB
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

/// Palette index reserved for transparent pixels.
pub const TRANSPARENT_INDEX: u8 = 0;

/// A validated discrete color scale.
///
/// Palette index 0 is transparent; band `i` uses index `i + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteScale {
    bounds: Vec<f32>,
    colors: Vec<(u8, u8, u8)>,
    max_value: Option<f32>,
    out_of_range: OutOfRange,
}

impl DiscreteScale {
    pub fn from_style(style: &StyleDefinition) -> RenderResult<Self> {
        if style.style_type != "discrete" {
            return Err(RenderError::Style(format!(
                "style '{}' has type '{}', expected 'discrete'",
                style.name, style.style_type
            )));
        }
        if style.stops.is_empty() || style.stops.len() > 255 {
            return Err(RenderError::Style(format!(
                "style '{}' needs between 1 and 255 stops",
                style.name
            )));
        }

        let mut bounds = Vec::with_capacity(style.stops.len());
        let mut colors = Vec::with_capacity(style.stops.len());
        for stop in &style.stops {
            if let Some(prev) = bounds.last() {
                if stop.value <= *prev {
                    return Err(RenderError::Style(format!(
                        "style '{}' stops must increase ({} after {})",
                        style.name, stop.value, prev
                    )));
                }
            }
            let rgb = hex_to_rgb(&stop.color).ok_or_else(|| {
                RenderError::Style(format!("invalid color '{}' in '{}'", stop.color, style.name))
            })?;
            bounds.push(stop.value);
            colors.push(rgb);
        }

        if let (Some(max), Some(last)) = (style.max_value, bounds.last()) {
            if max <= *last {
                return Err(RenderError::Style(format!(
                    "style '{}' max_value {} must exceed the last stop {}",
                    style.name, max, last
                )));
            }
        }

        Ok(Self {
            bounds,
            colors,
            max_value: style.max_value,
            out_of_range: style.out_of_range,
        })
    }

    /// Number of color bands.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Band index for a value, or None when the pixel stays transparent.
    pub fn band(&self, value: f32) -> Option<usize> {
        if value.is_nan() {
            return None;
        }

        let last = self.colors.len() - 1;
        let clamp = self.out_of_range == OutOfRange::Clamp;

        if value < self.bounds[0] {
            return clamp.then_some(0);
        }
        if let Some(max) = self.max_value {
            if value >= max {
                return clamp.then_some(last);
            }
        }

        // Number of lower bounds at or below the value
        let above = self.bounds.partition_point(|b| *b <= value);
        Some(above - 1)
    }

    /// Palette index for a value: 0 for transparent, otherwise band + 1.
    pub fn color_index(&self, value: f32) -> u8 {
        match self.band(value) {
            Some(band) => (band + 1) as u8,
            None => TRANSPARENT_INDEX,
        }
    }

    /// Opaque color for a value, or None when it stays transparent.
    pub fn color(&self, value: f32) -> Option<(u8, u8, u8, u8)> {
        self.band(value).map(|band| {
            let (r, g, b) = self.colors[band];
            (r, g, b, 255)
        })
    }

    /// Palette matching `color_index`: transparent first, then each band.
    pub fn palette(&self) -> Vec<(u8, u8, u8, u8)> {
        std::iter::once((0, 0, 0, 0))
            .chain(self.colors.iter().map(|&(r, g, b)| (r, g, b, 255)))
            .collect()
    }

    /// Map a grid of values to palette indices.
    pub fn apply(&self, data: &[f32]) -> Vec<u8> {
        data.iter().map(|&v| self.color_index(v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(stops: &[(f32, &str)], max_value: Option<f32>, out: OutOfRange) -> StyleDefinition {
        StyleDefinition {
            name: "test".to_string(),
            description: None,
            style_type: "discrete".to_string(),
            units: None,
            stops: stops
                .iter()
                .map(|(v, c)| ColorStop {
                    value: *v,
                    color: c.to_string(),
                    label: None,
                })
                .collect(),
            max_value,
            out_of_range: out,
        }
    }

    #[test]
    fn test_hex_to_rgb() {
        assert_eq!(hex_to_rgb("#FF0000"), Some((255, 0, 0)));
        assert_eq!(hex_to_rgb("00ff00"), Some((0, 255, 0)));
        assert_eq!(hex_to_rgb("#GGGGGG"), None);
        assert_eq!(hex_to_rgb("#FFF"), None);
    }

    #[test]
    fn test_bands_are_half_open() {
        let scale = DiscreteScale::from_style(&style(
            &[(0.0, "#000001"), (10.0, "#000002")],
            Some(20.0),
            OutOfRange::Transparent,
        ))
        .unwrap();

        assert_eq!(scale.band(0.0), Some(0));
        assert_eq!(scale.band(9.99), Some(0));
        assert_eq!(scale.band(10.0), Some(1));
        assert_eq!(scale.band(19.99), Some(1));
        assert_eq!(scale.band(20.0), None);
        assert_eq!(scale.band(-0.01), None);
        assert_eq!(scale.band(f32::NAN), None);
    }

    #[test]
    fn test_open_last_band_and_clamp() {
        let scale = DiscreteScale::from_style(&style(
            &[(0.0, "#000001"), (10.0, "#000002")],
            None,
            OutOfRange::Clamp,
        ))
        .unwrap();

        assert_eq!(scale.band(-5.0), Some(0));
        assert_eq!(scale.band(1e6), Some(1));
        assert_eq!(scale.color_index(1e6), 2);
        assert_eq!(scale.color_index(f32::NAN), TRANSPARENT_INDEX);
    }

    #[test]
    fn test_palette_layout() {
        let scale = DiscreteScale::from_style(&style(
            &[(0.0, "#102030"), (1.0, "#405060")],
            None,
            OutOfRange::Clamp,
        ))
        .unwrap();

        assert_eq!(
            scale.palette(),
            vec![(0, 0, 0, 0), (16, 32, 48, 255), (64, 80, 96, 255)]
        );
        assert_eq!(scale.apply(&[0.5, 2.0, f32::NAN]), vec![1, 2, 0]);
    }

    #[test]
    fn test_rejects_bad_styles() {
        assert!(DiscreteScale::from_style(&style(&[], None, OutOfRange::Clamp)).is_err());
        assert!(DiscreteScale::from_style(&style(
            &[(5.0, "#000000"), (5.0, "#000000")],
            None,
            OutOfRange::Clamp
        ))
        .is_err());
        assert!(DiscreteScale::from_style(&style(
            &[(0.0, "not-a-color")],
            None,
            OutOfRange::Clamp
        ))
        .is_err());
        assert!(DiscreteScale::from_style(&style(
            &[(0.0, "#000000"), (10.0, "#000000")],
            Some(10.0),
            OutOfRange::Clamp
        ))
        .is_err());

        let mut gradient = style(&[(0.0, "#000000")], None, OutOfRange::Clamp);
        gradient.style_type = "gradient".to_string();
        assert!(DiscreteScale::from_style(&gradient).is_err());
    }

    #[test]
    fn test_out_of_range_defaults_to_clamp() {
        let json = r##"{
            "version": "1.0",
            "styles": {
                "s": { "name": "S", "type": "discrete", "stops": [{ "value": 1, "color": "#010203" }] }
            }
        }"##;
        let config = StyleConfig::from_json(json).unwrap();
        let s = config.get_style("s").unwrap();
        assert_eq!(s.out_of_range, OutOfRange::Clamp);
        assert!(s.max_value.is_none());
        assert!(config.discrete("s").is_ok());
        assert!(matches!(
            config.discrete("missing"),
            Err(RenderError::StyleNotFound(_))
        ));
    }
}
