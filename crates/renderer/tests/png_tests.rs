//! PNG encoding checks, decoded back through the `image` crate.

use renderer::png::{create_png, create_png_auto, create_png_for_scale};
use renderer::StyleConfig;

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

fn decode(png: &[u8]) -> image::RgbaImage {
    image::load_from_memory(png).expect("valid png").to_rgba8()
}

fn gust_config() -> StyleConfig {
    StyleConfig::from_json(
        r##"{
            "version": "1.0",
            "styles": {
                "g": {
                    "name": "G",
                    "type": "discrete",
                    "stops": [
                        { "value": 0, "color": "#ADD8E6" },
                        { "value": 5, "color": "#0000FF" },
                        { "value": 10, "color": "#008000" }
                    ],
                    "max_value": 20,
                    "out_of_range": "transparent"
                }
            }
        }"##,
    )
    .unwrap()
}

#[test]
fn test_scale_png_decodes_to_band_colors() {
    let scale = gust_config().discrete("g").unwrap();
    let values = [1.0, 6.0, 15.0, 25.0, f32::NAN, -1.0];
    let indices = scale.apply(&values);

    let png = create_png_for_scale(&indices, 3, 2, &scale).unwrap();
    assert_eq!(&png[0..8], &PNG_SIGNATURE);

    let img = decode(&png);
    assert_eq!(img.dimensions(), (3, 2));
    assert_eq!(img.get_pixel(0, 0).0, [0xAD, 0xD8, 0xE6, 255]);
    assert_eq!(img.get_pixel(1, 0).0, [0, 0, 255, 255]);
    assert_eq!(img.get_pixel(2, 0).0, [0, 0x80, 0, 255]);
    // Above max, NaN and below the first stop are all transparent
    assert_eq!(img.get_pixel(0, 1).0[3], 0);
    assert_eq!(img.get_pixel(1, 1).0[3], 0);
    assert_eq!(img.get_pixel(2, 1).0[3], 0);
}

#[test]
fn test_rgba_png_roundtrip_pixels() {
    let pixels = [
        255, 0, 0, 255, //
        0, 255, 0, 255, //
        0, 0, 255, 128, //
        0, 0, 0, 0,
    ];

    for png in [
        create_png(&pixels, 2, 2).unwrap(),
        create_png_auto(&pixels, 2, 2).unwrap(),
    ] {
        let img = decode(&png);
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(1, 0).0, [0, 255, 0, 255]);
        assert_eq!(img.get_pixel(0, 1).0, [0, 0, 255, 128]);
        assert_eq!(img.get_pixel(1, 1).0[3], 0);
    }
}

#[test]
fn test_auto_falls_back_to_rgba_past_256_colors() {
    let mut pixels = Vec::with_capacity(257 * 4);
    for i in 0..256 {
        let v = i as u8;
        pixels.extend_from_slice(&[v, v, v, 255]);
    }
    pixels.extend_from_slice(&[128, 0, 0, 255]);

    let png = create_png_auto(&pixels, 257, 1).unwrap();
    // IHDR color type byte
    assert_eq!(png[25], 6);
    assert_eq!(decode(&png).get_pixel(256, 0).0, [128, 0, 0, 255]);
}

#[test]
fn test_large_limited_palette_uses_indexed() {
    // 128x128 takes the parallel extraction path
    let mut pixels = Vec::with_capacity(128 * 128 * 4);
    for y in 0..128u32 {
        for x in 0..128u32 {
            let band = ((x / 16 + y / 16) % 7) as u8;
            pixels.extend_from_slice(&[band * 30, 100, 255 - band * 30, 255]);
        }
    }

    let png = create_png_auto(&pixels, 128, 128).unwrap();
    assert_eq!(png[25], 3);
    let img = decode(&png);
    assert_eq!(img.get_pixel(127, 127).0, [30, 100, 225, 255]);
}

#[test]
fn test_single_color_image_is_small() {
    let pixels: Vec<u8> = [128, 64, 32, 255]
        .iter()
        .copied()
        .cycle()
        .take(100 * 100 * 4)
        .collect();

    let png = create_png_auto(&pixels, 100, 100).unwrap();
    assert!(png.len() < 1000, "got {} bytes", png.len());
}
