//! Test helpers shared across the gfs-maps workspace.
//!
//! - [`Grib2Builder`] writes small, valid GRIB2 messages (simple packing)
//! - `generators` produces synthetic grids and RGBA buffers
//! - [`PublicTree`] is a throwaway `public/` directory
//! - [`require_test_file!`] skips tests whose sample data is not on disk

pub mod fixtures;
pub mod generators;
pub mod grib2;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use grib2::*;
pub use paths::*;

/// Resolve a sample file via [`find_test_file`], or print a notice and
/// return from the calling test when it is missing.
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!("skipping: sample '{}' not found (set TEST_DATA_DIR)", $name);
                return;
            }
        }
    }};
}

/// Assert that two numbers differ by at most `epsilon`.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        if (left - right).abs() > epsilon {
            panic!(
                "assertion failed: {} is not within {} of {}",
                left, epsilon, right
            );
        }
    }};
}
