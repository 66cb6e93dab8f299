//! Precipitation-type compositing of reflectivity by surface temperature.
//!
//! Reflectivity is drawn with the snow scale where the 2 m temperature is
//! below 32.5 °F and with the rain scale where it is at or above 31.5 °F.
//! The two masks overlap in the 31.5..32.5 band; rain is painted last and
//! wins there.

use crate::style::DiscreteScale;

/// Snow is drawn where T < this (°F).
pub const SNOW_BELOW_F: f32 = 32.5;

/// Rain is drawn where T >= this (°F).
pub const RAIN_AT_OR_ABOVE_F: f32 = 31.5;

pub fn kelvin_to_fahrenheit(kelvin: f32) -> f32 {
    (kelvin - 273.15) * 9.0 / 5.0 + 32.0
}

/// Which scale a pixel ends up painted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecipType {
    Rain,
    Snow,
}

/// Composite reflectivity and temperature (Kelvin) into RGBA pixels.
///
/// Both grids must already be resampled to the same `width` x `height`
/// raster. Pixels with no color from either scale stay transparent.
pub fn precip_type_rgba(
    reflectivity: &[f32],
    temperature_k: &[f32],
    rain: &DiscreteScale,
    snow: &DiscreteScale,
) -> Vec<u8> {
    let mut pixels = vec![0u8; reflectivity.len() * 4];

    for (i, (&refc, &temp_k)) in reflectivity.iter().zip(temperature_k).enumerate() {
        if let Some((r, g, b, a)) = composite_pixel(refc, temp_k, rain, snow) {
            pixels[i * 4..i * 4 + 4].copy_from_slice(&[r, g, b, a]);
        }
    }

    pixels
}

/// Color for one pixel, or None when it stays transparent.
pub fn composite_pixel(
    refc: f32,
    temp_k: f32,
    rain: &DiscreteScale,
    snow: &DiscreteScale,
) -> Option<(u8, u8, u8, u8)> {
    if temp_k.is_nan() {
        return None;
    }
    let temp_f = kelvin_to_fahrenheit(temp_k);

    let snow_color = (temp_f < SNOW_BELOW_F).then(|| snow.color(refc)).flatten();
    let rain_color = (temp_f >= RAIN_AT_OR_ABOVE_F).then(|| rain.color(refc)).flatten();
    rain_color.or(snow_color)
}

/// The scale that would color this pixel, ignoring reflectivity.
pub fn precip_type(temp_k: f32) -> Option<PrecipType> {
    let temp_f = kelvin_to_fahrenheit(temp_k);
    if temp_f >= RAIN_AT_OR_ABOVE_F {
        Some(PrecipType::Rain)
    } else if temp_f < SNOW_BELOW_F {
        Some(PrecipType::Snow)
    } else {
        None
    }
}
