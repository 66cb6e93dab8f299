//! Unit tests for GRIB2 section helpers.
//!
//! These tests don't require test data files.

use grib2_parser::sections::{decode_grib2_signed, decode_grib2_signed16, parse_bitmap};
use grib2_parser::Grib2Error;

#[test]
fn test_decode_grib2_signed_positive() {
    assert_eq!(decode_grib2_signed(&[0x00, 0x00, 0x00, 0x00]), 0);
    assert_eq!(decode_grib2_signed(&[0x00, 0x00, 0x03, 0xE8]), 1000);
    assert_eq!(decode_grib2_signed(&90_000_000_u32.to_be_bytes()), 90_000_000);
    assert_eq!(decode_grib2_signed(&[0x7F, 0xFF, 0xFF, 0xFF]), 2147483647);
}

#[test]
fn test_decode_grib2_signed_negative() {
    // Sign-magnitude: MSB=1 means negative
    assert_eq!(decode_grib2_signed(&[0x80, 0x00, 0x00, 0x01]), -1);
    assert_eq!(decode_grib2_signed(&[0x80, 0x00, 0x03, 0xE8]), -1000);

    // South Pole in microdegrees
    let bytes = (90_000_000_u32 | 0x8000_0000).to_be_bytes();
    assert_eq!(decode_grib2_signed(&bytes), -90_000_000);
}

#[test]
fn test_decode_grib2_signed_is_not_twos_complement() {
    // Two's complement -1 reads as the largest negative magnitude
    assert_eq!(decode_grib2_signed(&[0xFF, 0xFF, 0xFF, 0xFF]), -2147483647);
    // Negative zero
    assert_eq!(decode_grib2_signed(&[0x80, 0x00, 0x00, 0x00]), 0);
}

#[test]
fn test_decode_grib2_signed_wrong_length() {
    assert_eq!(decode_grib2_signed(&[0x00, 0x00, 0x01]), 0);
    assert_eq!(decode_grib2_signed(&[]), 0);
    assert_eq!(decode_grib2_signed(&[0x00, 0x00, 0x00, 0x01, 0x00]), 0);
    assert_eq!(decode_grib2_signed16(&[0x80]), 0);
}

#[test]
fn test_gfs_global_corners() {
    // GFS 0.25° grid runs 90N..90S, 0E..359.75E
    assert_eq!(decode_grib2_signed(&90_000_000_u32.to_be_bytes()), 90_000_000);
    assert_eq!(
        decode_grib2_signed(&(90_000_000_u32 | 0x8000_0000).to_be_bytes()),
        -90_000_000
    );
    assert_eq!(
        decode_grib2_signed(&359_750_000_u32.to_be_bytes()),
        359_750_000
    );
}

#[test]
fn test_decode_scale_factors() {
    // Binary scale factors are negative for fine-grained fields
    assert_eq!(decode_grib2_signed16(&[0x80, 0x0A]), -10);
    assert_eq!(decode_grib2_signed16(&[0x00, 0x02]), 2);
    assert_eq!(decode_grib2_signed16(&[0xFF, 0xFF]), -32767);
}

/// Section 0 followed by the given sections and "7777".
fn message_with_sections(sections: &[&[u8]]) -> Vec<u8> {
    let mut data = b"GRIB\0\0\0\x02".to_vec();
    data.extend_from_slice(&[0u8; 8]);
    for section in sections {
        data.extend_from_slice(section);
    }
    data.extend_from_slice(b"7777");
    data
}

#[test]
fn test_parse_bitmap_rejects_short_section() {
    let data = message_with_sections(&[&[0, 0, 0, 5, 6], &[0, 0, 0, 5, 7]]);
    assert!(matches!(
        parse_bitmap(&data),
        Err(Grib2Error::InvalidSection { section: 6, .. })
    ));
}

#[test]
fn test_parse_bitmap_indicator() {
    let absent = message_with_sections(&[&[0, 0, 0, 6, 6, 255], &[0, 0, 0, 5, 7]]);
    assert!(parse_bitmap(&absent).unwrap().is_none());

    let present = message_with_sections(&[
        &[0, 0, 0, 8, 6, 0, 0b1010_0000, 0xFF],
        &[0, 0, 0, 5, 7],
    ]);
    let bitmap = parse_bitmap(&present).unwrap().unwrap();
    assert_eq!(&bitmap.data[..], &[0b1010_0000u8, 0xFF][..]);
}
