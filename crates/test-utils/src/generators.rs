//! Synthetic fields shaped like the GFS inputs. Row-major, north row first.

fn fill(width: usize, height: usize, f: impl Fn(usize, usize) -> f32) -> Vec<f32> {
    (0..height)
        .flat_map(|row| (0..width).map(move |col| (col, row)))
        .map(|(col, row)| f(col, row))
        .collect()
}

fn fraction(i: usize, n: usize) -> f32 {
    i as f32 / n.saturating_sub(1).max(1) as f32
}

/// 2 m temperature in K: 250 on the first row rising to 310 on the last,
/// so both sides of freezing are present.
pub fn create_temperature_grid(width: usize, height: usize) -> Vec<f32> {
    fill(width, height, |_, row| 250.0 + 60.0 * fraction(row, height))
}

/// Surface gust in m/s: calm at the center, 50 at the corners.
pub fn create_gust_grid(width: usize, height: usize) -> Vec<f32> {
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let corner = cx.hypot(cy);
    fill(width, height, |col, row| {
        50.0 * (col as f32 - cx).hypot(row as f32 - cy) / corner
    })
}

/// Composite reflectivity in dBZ: 0 on the west edge rising to 70 on the east.
pub fn create_reflectivity_grid(width: usize, height: usize) -> Vec<f32> {
    fill(width, height, |col, _| 70.0 * fraction(col, width))
}

/// Zeros with NaN (missing) at each `(col, row)` that falls inside the grid.
pub fn create_grid_with_nans(width: usize, height: usize, missing: &[(usize, usize)]) -> Vec<f32> {
    let mut data = vec![0.0; width * height];
    for &(col, row) in missing.iter().filter(|(c, r)| *c < width && *r < height) {
        data[row * width + col] = f32::NAN;
    }
    data
}
