//! Geographic bounding boxes used to frame rendered maps.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::GfsError;

/// A geographic bounding box in degrees.
///
/// Longitudes may be given in either the -180..180 or the 0..360 convention;
/// resampling normalizes them against the source grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// The lower 48 states.
    pub fn conus() -> Self {
        Self::new(-125.0, 24.0, -66.5, 50.0)
    }

    /// The whole globe, centered on the prime meridian.
    pub fn global() -> Self {
        Self::new(-180.0, -90.0, 180.0, 90.0)
    }

    /// Width of the bounding box in degrees.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height of the bounding box in degrees.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Check that the corners are ordered and latitudes are on the globe.
    pub fn validate(&self) -> Result<(), GfsError> {
        if !(self.min_lon < self.max_lon && self.min_lat < self.max_lat) {
            return Err(GfsError::InvalidBbox(format!(
                "min must be below max: {:?}",
                self
            )));
        }
        if self.min_lat < -90.0 || self.max_lat > 90.0 {
            return Err(GfsError::InvalidBbox(format!(
                "latitude out of range: {:?}",
                self
            )));
        }
        Ok(())
    }

    /// Output height in pixels that keeps degrees square for a given width.
    pub fn proportional_height(&self, width: u32) -> u32 {
        ((width as f64) * self.height() / self.width()).round().max(1.0) as u32
    }
}

impl FromStr for BoundingBox {
    type Err = GfsError;

    /// Parse "min_lon,min_lat,max_lon,max_lat".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(GfsError::InvalidBbox(s.to_string()));
        }

        let mut values = [0.0f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| GfsError::InvalidBbox(format!("not a number: {}", part)))?;
        }

        let bbox = Self::new(values[0], values[1], values[2], values[3]);
        bbox.validate()?;
        Ok(bbox)
    }
}
