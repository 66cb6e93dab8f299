//! Grid specifications for regular latitude/longitude model grids.

use serde::{Deserialize, Serialize};

use crate::{BoundingBox, GfsError};

/// Specification of a regular lat/lon grid.
///
/// Values are stored in the order described by `scan_mode`. `dx` is always
/// positive (eastward). `dy` is negative when the first row is the northernmost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of points in X (longitude) direction
    pub nx: usize,
    /// Number of points in Y (latitude) direction
    pub ny: usize,
    /// Longitude increment between columns, degrees
    pub dx: f64,
    /// Latitude increment between rows, degrees (signed)
    pub dy: f64,
    /// Longitude of the first column
    pub first_lon: f64,
    /// Latitude of the first row
    pub first_lat: f64,
    /// Scan mode flags (determines how data is ordered)
    pub scan_mode: ScanMode,
}

impl GridSpec {
    /// Create a new grid specification.
    pub fn new(
        nx: usize,
        ny: usize,
        dx: f64,
        dy: f64,
        first_lon: f64,
        first_lat: f64,
        scan_mode: ScanMode,
    ) -> Self {
        Self {
            nx,
            ny,
            dx,
            dy,
            first_lon,
            first_lat,
            scan_mode,
        }
    }

    /// GFS 0.25° global grid: starts at 0°E, 90°N, rows run north to south.
    pub fn gfs_0p25() -> Self {
        Self::new(1440, 721, 0.25, -0.25, 0.0, 90.0, ScanMode::standard())
    }

    /// Reject grids the resampler cannot walk.
    pub fn validate(&self, values: usize) -> Result<(), GfsError> {
        if self.nx == 0 || self.ny == 0 {
            return Err(GfsError::InvalidGrid(format!(
                "empty grid {}x{}",
                self.nx, self.ny
            )));
        }
        if self.dx == 0.0 || self.dy == 0.0 {
            return Err(GfsError::InvalidGrid("zero grid increment".to_string()));
        }
        if self.scan_mode.j_consecutive {
            return Err(GfsError::InvalidGrid(
                "column-major grids are not supported".to_string(),
            ));
        }
        if values != self.len() {
            return Err(GfsError::InvalidGrid(format!(
                "expected {} values for {}x{} grid, got {}",
                self.len(),
                self.nx,
                self.ny,
                values
            )));
        }
        Ok(())
    }

    /// Longitude of the last column.
    pub fn last_lon(&self) -> f64 {
        self.first_lon + (self.nx - 1) as f64 * self.dx
    }

    /// Latitude of the last row.
    pub fn last_lat(&self) -> f64 {
        self.first_lat + (self.ny - 1) as f64 * self.dy
    }

    /// True when the columns wrap all the way around the globe.
    pub fn is_global(&self) -> bool {
        (self.nx as f64 * self.dx.abs() - 360.0).abs() < self.dx.abs() * 0.5
    }

    /// True when longitudes are expressed as 0..360.
    pub fn uses_360(&self) -> bool {
        self.first_lon >= 0.0 && self.last_lon() > 180.0
    }

    /// Calculate the bounding box of this grid.
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox {
            min_lon: self.first_lon.min(self.last_lon()),
            min_lat: self.first_lat.min(self.last_lat()),
            max_lon: self.first_lon.max(self.last_lon()),
            max_lat: self.first_lat.max(self.last_lat()),
        }
    }

    /// Fractional column for a longitude, or None outside a regional grid.
    ///
    /// Global grids accept any longitude and wrap it into range.
    pub fn lon_index(&self, lon: f64) -> Option<f64> {
        let mut lon = lon;
        if self.uses_360() && lon < 0.0 {
            lon += 360.0;
        } else if !self.uses_360() && lon > 180.0 {
            lon -= 360.0;
        }

        let mut i = (lon - self.first_lon) / self.dx;
        if self.is_global() {
            i = i.rem_euclid(self.nx as f64);
            return Some(i);
        }
        if i < -0.5 || i > (self.nx - 1) as f64 + 0.5 {
            return None;
        }
        Some(i.clamp(0.0, (self.nx - 1) as f64))
    }

    /// Fractional row for a latitude, or None off the grid.
    pub fn lat_index(&self, lat: f64) -> Option<f64> {
        let j = (lat - self.first_lat) / self.dy;
        if j < -0.5 || j > (self.ny - 1) as f64 + 0.5 {
            return None;
        }
        Some(j.clamp(0.0, (self.ny - 1) as f64))
    }

    /// Get the 1D array index for a 2D grid position.
    pub fn flat_index(&self, i: usize, j: usize) -> usize {
        self.scan_mode.flat_index(i, j, self.nx, self.ny)
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.nx == 0 || self.ny == 0
    }
}

/// Scan mode flags for grid data ordering.
///
/// Based on GRIB2 scanning mode (Flag Table 3.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanMode {
    /// +i direction: false = +x (east), true = -x (west)
    pub i_negative: bool,
    /// +j direction: false = -y (south), true = +y (north)
    pub j_positive: bool,
    /// Adjacent points: false = i direction, true = j direction
    pub j_consecutive: bool,
    /// Row scan direction alternates
    pub alternating_rows: bool,
}

impl ScanMode {
    /// Most common mode: data starts at top-left, rows go west to east,
    /// columns go north to south.
    pub fn standard() -> Self {
        Self {
            i_negative: false,
            j_positive: false,
            j_consecutive: false,
            alternating_rows: false,
        }
    }

    /// Create from GRIB2 flag byte.
    pub fn from_grib2_flag(flag: u8) -> Self {
        Self {
            i_negative: (flag & 0x80) != 0,
            j_positive: (flag & 0x40) != 0,
            j_consecutive: (flag & 0x20) != 0,
            alternating_rows: (flag & 0x10) != 0,
        }
    }

    /// Calculate flat array index from 2D indices.
    pub fn flat_index(&self, i: usize, j: usize, nx: usize, ny: usize) -> usize {
        if self.j_consecutive {
            // Column-major order
            i * ny + j
        } else {
            // Row-major order (most common)
            j * nx + i
        }
    }
}

impl Default for ScanMode {
    fn default() -> Self {
        Self::standard()
    }
}
