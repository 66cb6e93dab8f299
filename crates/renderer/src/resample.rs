//! Resampling of regular lat/lon grids onto a geographic output box.

use gfs_common::{BoundingBox, GridSpec};
use rayon::prelude::*;

use crate::error::{RenderError, RenderResult};

/// Bilinear interpolation at a fractional grid position.
///
/// With `wrap_longitude` the column after the last one is column 0, which
/// closes the seam of global grids. NaN neighbours propagate.
pub fn bilinear_interpolate(
    grid_data: &[f32],
    grid_width: usize,
    grid_height: usize,
    grid_x: f64,
    grid_y: f64,
    wrap_longitude: bool,
) -> f32 {
    let x1 = (grid_x.floor() as usize).min(grid_width - 1);
    let y1 = (grid_y.floor() as usize).min(grid_height - 1);
    let x2 = if wrap_longitude {
        (x1 + 1) % grid_width
    } else {
        (x1 + 1).min(grid_width - 1)
    };
    let y2 = (y1 + 1).min(grid_height - 1);

    let dx = (grid_x - x1 as f64) as f32;
    let dy = (grid_y - y1 as f64) as f32;

    let v11 = grid_data.get(y1 * grid_width + x1).copied().unwrap_or(f32::NAN);
    let v21 = grid_data.get(y1 * grid_width + x2).copied().unwrap_or(f32::NAN);
    let v12 = grid_data.get(y2 * grid_width + x1).copied().unwrap_or(f32::NAN);
    let v22 = grid_data.get(y2 * grid_width + x2).copied().unwrap_or(f32::NAN);

    let v1 = v11 * (1.0 - dx) + v21 * dx;
    let v2 = v12 * (1.0 - dx) + v22 * dx;
    v1 * (1.0 - dy) + v2 * dy
}

/// Sample `data` (laid out per `spec`) onto a `width` x `height` raster
/// covering `bbox`, north-up. Output pixels off the grid are NaN.
///
/// Longitudes in the box may use either convention; they are matched
/// against the grid's own (0..360 for GFS).
pub fn resample_to_bbox(
    data: &[f32],
    spec: &GridSpec,
    bbox: &BoundingBox,
    width: usize,
    height: usize,
) -> RenderResult<Vec<f32>> {
    spec.validate(data.len())?;
    bbox.validate()?;
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidInput(format!(
            "output size {}x{} is empty",
            width, height
        )));
    }

    // Walk the source row-major with i increasing east and j increasing south.
    let grid = normalize_scan(data, spec);
    let wrap = grid.spec.is_global();

    let lon_step = bbox.width() / width as f64;
    let lat_step = bbox.height() / height as f64;

    let mut output = vec![f32::NAN; width * height];
    output
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let lat = bbox.max_lat - (y as f64 + 0.5) * lat_step;
            let Some(grid_y) = grid.spec.lat_index(lat) else {
                return;
            };
            for (x, pixel) in row.iter_mut().enumerate() {
                let lon = bbox.min_lon + (x as f64 + 0.5) * lon_step;
                if let Some(grid_x) = grid.spec.lon_index(lon) {
                    *pixel = bilinear_interpolate(
                        &grid.values,
                        grid.spec.nx,
                        grid.spec.ny,
                        grid_x,
                        grid_y,
                        wrap,
                    );
                }
            }
        });

    Ok(output)
}

struct NormalizedGrid {
    spec: GridSpec,
    values: Vec<f32>,
}

/// Reorder values so rows run north to south and columns west to east.
fn normalize_scan(data: &[f32], spec: &GridSpec) -> NormalizedGrid {
    let flip_rows = spec.dy > 0.0;
    let flip_cols = spec.dx < 0.0;

    if !flip_rows && !flip_cols {
        return NormalizedGrid {
            spec: spec.clone(),
            values: data.to_vec(),
        };
    }

    let (nx, ny) = (spec.nx, spec.ny);
    let mut values = Vec::with_capacity(data.len());
    for j in 0..ny {
        let src_j = if flip_rows { ny - 1 - j } else { j };
        for i in 0..nx {
            let src_i = if flip_cols { nx - 1 - i } else { i };
            values.push(data[src_j * nx + src_i]);
        }
    }

    let mut normalized = spec.clone();
    if flip_rows {
        normalized.first_lat = spec.last_lat();
        normalized.dy = -spec.dy;
    }
    if flip_cols {
        normalized.first_lon = spec.last_lon();
        normalized.dx = -spec.dx;
    }
    normalized.scan_mode.j_positive = false;
    normalized.scan_mode.i_negative = false;

    NormalizedGrid {
        spec: normalized,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gfs_common::ScanMode;

    #[test]
    fn test_bilinear_midpoint() {
        let data = vec![0.0, 10.0, 20.0, 30.0];
        let v = bilinear_interpolate(&data, 2, 2, 0.5, 0.5, false);
        assert!((v - 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_bilinear_wraps_last_column() {
        let data = vec![0.0, 10.0, 20.0, 30.0];
        // Halfway between column 3 and column 0
        let v = bilinear_interpolate(&data, 4, 1, 3.5, 0.0, true);
        assert!((v - 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_resample_identity_extent() {
        // 4x2 grid of 1° cells centred at lon 0.5..3.5, lat 1.5..0.5
        let spec = GridSpec::new(4, 2, 1.0, -1.0, 0.5, 1.5, ScanMode::standard());
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let bbox = BoundingBox::new(0.0, 0.0, 4.0, 2.0);

        let out = resample_to_bbox(&data, &spec, &bbox, 4, 2).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_resample_negative_longitudes_on_360_grid() {
        // Global grid at 90° spacing: columns at 0, 90, 180, 270 E
        let spec = GridSpec::new(4, 3, 90.0, -90.0, 0.0, 90.0, ScanMode::standard());
        let data = vec![
            0.0, 1.0, 2.0, 3.0, //
            10.0, 11.0, 12.0, 13.0, //
            20.0, 21.0, 22.0, 23.0,
        ];

        // A one-pixel box centred on 90°W, 0°N lands on column 3, row 1
        let bbox = BoundingBox::new(-91.0, -1.0, -89.0, 1.0);
        let out = resample_to_bbox(&data, &spec, &bbox, 1, 1).unwrap();
        assert!((out[0] - 13.0).abs() < 1e-4, "got {}", out[0]);
    }

    #[test]
    fn test_resample_outside_regional_grid_is_nan() {
        let spec = GridSpec::new(3, 3, 1.0, -1.0, 10.0, 12.0, ScanMode::standard());
        let data = vec![5.0; 9];
        let bbox = BoundingBox::new(0.0, 0.0, 20.0, 20.0);

        let out = resample_to_bbox(&data, &spec, &bbox, 20, 20).unwrap();
        // Top-left pixel (0.5E, 19.5N) is far outside the grid
        assert!(out[0].is_nan());
        // Pixel centred on 11.5E, 10.5N is inside
        assert_eq!(out[9 * 20 + 11], 5.0);
    }

    #[test]
    fn test_south_to_north_grid_is_flipped() {
        // Rows stored south first
        let spec = GridSpec::new(
            1,
            2,
            1.0,
            1.0,
            0.5,
            0.5,
            ScanMode::from_grib2_flag(0b0100_0000),
        );
        let data = vec![1.0, 2.0]; // south, north
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 2.0);

        let out = resample_to_bbox(&data, &spec, &bbox, 1, 2).unwrap();
        assert_eq!(out, vec![2.0, 1.0]);
    }

    #[test]
    fn test_rejects_mismatched_data() {
        let spec = GridSpec::new(2, 2, 1.0, -1.0, 0.0, 1.0, ScanMode::standard());
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        assert!(resample_to_bbox(&[1.0; 3], &spec, &bbox, 2, 2).is_err());
        assert!(resample_to_bbox(&[1.0; 4], &spec, &bbox, 0, 2).is_err());
    }
}
