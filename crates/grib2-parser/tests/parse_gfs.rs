//! Integration test against a real GFS 0.25° file, skipped when absent.
//!
//! Fetch one with the pipeline or place `gfs_gust_sample.grib2` in
//! `crates/grib2-parser/testdata/`.

use bytes::Bytes;
use grib2_parser::{find_field, Grib2Reader};
use std::fs;
use test_utils::require_test_file;

#[test]
fn test_parse_gfs_gust_file() {
    let path = require_test_file!("gfs_gust_sample.grib2");
    let data = Bytes::from(fs::read(&path).expect("Failed to read test file"));

    let messages = Grib2Reader::new(data.clone())
        .messages()
        .expect("Should parse every message");
    assert!(!messages.is_empty());

    let msg = &messages[0];
    assert_eq!(msg.identification.center, 7); // NCEP
    assert_eq!(msg.parameter(), "GUST");
    assert_eq!(msg.level(), "surface");
    assert_eq!(msg.grid_dims(), (721, 1440));

    let field = find_field(data, "GUST", 1).expect("GUST field should decode");
    assert_eq!(field.values.len(), 1440 * 721);
    assert!(field.grid.is_global());

    let max = field.values.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    assert!(max > 0.0 && max < 120.0, "gust max {} out of range", max);
}
