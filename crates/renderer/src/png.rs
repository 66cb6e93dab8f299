//! PNG encoding for rendered map frames.
//!
//! Discrete scales already carry their palette, so their frames go straight
//! to an indexed PNG (color type 3) with a `tRNS` chunk for the transparent
//! entry. Free-form RGBA frames such as the precipitation-type composite go
//! through `create_png_auto`, which packs them into a palette when at most
//! 256 distinct colors occur and writes truecolor with alpha otherwise.

use std::collections::HashMap;
use std::io::Write;

use flate2::{write::ZlibEncoder, Compression};
use rayon::prelude::*;

use crate::error::{RenderError, RenderResult};
use crate::style::DiscreteScale;

type Rgba = (u8, u8, u8, u8);

const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

const COLOR_TYPE_INDEXED: u8 = 3;
const COLOR_TYPE_RGBA: u8 = 6;

/// Largest palette an 8-bit indexed PNG can hold.
const MAX_PALETTE_SIZE: usize = 256;

/// Frames at least this large map pixels to palette indices on the rayon pool.
const PARALLEL_PIXELS: usize = 64 * 64;

/// Encode RGBA pixels, choosing indexed output whenever the colors fit.
pub fn create_png_auto(pixels: &[u8], width: usize, height: usize) -> RenderResult<Vec<u8>> {
    expect_len("RGBA", pixels.len(), width * height * 4)?;

    match build_palette(pixels) {
        Some((palette, indices)) => create_png_indexed(width, height, &palette, &indices),
        None => create_png(pixels, width, height),
    }
}

/// Encode palette indices produced by `DiscreteScale::apply`.
pub fn create_png_for_scale(
    indices: &[u8],
    width: usize,
    height: usize,
    scale: &DiscreteScale,
) -> RenderResult<Vec<u8>> {
    create_png_indexed(width, height, &scale.palette(), indices)
}

/// Encode one palette index per pixel as an indexed PNG.
pub fn create_png_indexed(
    width: usize,
    height: usize,
    palette: &[Rgba],
    indices: &[u8],
) -> RenderResult<Vec<u8>> {
    expect_len("index", indices.len(), width * height)?;
    if palette.is_empty() || palette.len() > MAX_PALETTE_SIZE {
        return Err(RenderError::InvalidInput(format!(
            "palette must have 1..={} entries, got {}",
            MAX_PALETTE_SIZE,
            palette.len()
        )));
    }
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= palette.len()) {
        return Err(RenderError::InvalidInput(format!(
            "palette index {} out of range for {} entries",
            bad,
            palette.len()
        )));
    }

    let mut out = PngWriter::new(width, height, COLOR_TYPE_INDEXED);

    let plte: Vec<u8> = palette.iter().flat_map(|&(r, g, b, _)| [r, g, b]).collect();
    out.chunk(b"PLTE", &plte);

    // Alpha entries after the last non-opaque one may be omitted
    if let Some(last) = palette.iter().rposition(|&(_, _, _, a)| a < 255) {
        let trns: Vec<u8> = palette[..=last].iter().map(|&(_, _, _, a)| a).collect();
        out.chunk(b"tRNS", &trns);
    }

    out.finish(indices, width)
}

/// Encode RGBA pixels as truecolor with alpha.
pub fn create_png(pixels: &[u8], width: usize, height: usize) -> RenderResult<Vec<u8>> {
    expect_len("RGBA", pixels.len(), width * height * 4)?;
    PngWriter::new(width, height, COLOR_TYPE_RGBA).finish(pixels, width * 4)
}

fn expect_len(what: &str, actual: usize, expected: usize) -> RenderResult<()> {
    if actual != expected {
        return Err(RenderError::InvalidInput(format!(
            "expected {} bytes of {} data, got {}",
            expected, what, actual
        )));
    }
    Ok(())
}

/// Chunk-level writer; IHDR goes out on construction.
struct PngWriter {
    buf: Vec<u8>,
}

impl PngWriter {
    fn new(width: usize, height: usize, color_type: u8) -> Self {
        let mut writer = Self {
            buf: SIGNATURE.to_vec(),
        };

        let mut ihdr = [0u8; 13];
        ihdr[0..4].copy_from_slice(&(width as u32).to_be_bytes());
        ihdr[4..8].copy_from_slice(&(height as u32).to_be_bytes());
        ihdr[8] = 8; // bit depth
        ihdr[9] = color_type;
        // compression, filter and interlace methods stay 0
        writer.chunk(b"IHDR", &ihdr);
        writer
    }

    fn chunk(&mut self, kind: &[u8; 4], data: &[u8]) {
        self.buf.extend_from_slice(&(data.len() as u32).to_be_bytes());
        self.buf.extend_from_slice(kind);
        self.buf.extend_from_slice(data);

        let mut crc = crc32fast::Hasher::new();
        crc.update(kind);
        crc.update(data);
        self.buf.extend_from_slice(&crc.finalize().to_be_bytes());
    }

    /// Deflate the scanlines into IDAT and close the stream.
    fn finish(mut self, data: &[u8], row_bytes: usize) -> RenderResult<Vec<u8>> {
        let idat = deflate_scanlines(data, row_bytes)
            .map_err(|e| RenderError::Encode(format!("IDAT compression failed: {}", e)))?;
        self.chunk(b"IDAT", &idat);
        self.chunk(b"IEND", &[]);
        Ok(self.buf)
    }
}

/// Prefix every row with filter type 0 and zlib-compress the result.
fn deflate_scanlines(data: &[u8], row_bytes: usize) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
    if row_bytes > 0 {
        for row in data.chunks_exact(row_bytes) {
            encoder.write_all(&[0])?;
            encoder.write_all(row)?;
        }
    }
    encoder.finish()
}

#[inline]
fn pack(px: &[u8]) -> u32 {
    u32::from_le_bytes([px[0], px[1], px[2], px[3]])
}

/// Palette in first-seen order plus one index per pixel, or None when
/// the frame holds more than 256 colors.
fn build_palette(pixels: &[u8]) -> Option<(Vec<Rgba>, Vec<u8>)> {
    let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette = Vec::new();

    for px in pixels.chunks_exact(4) {
        let key = pack(px);
        if lookup.contains_key(&key) {
            continue;
        }
        if palette.len() == MAX_PALETTE_SIZE {
            return None;
        }
        lookup.insert(key, palette.len() as u8);
        palette.push((px[0], px[1], px[2], px[3]));
    }

    let index_of = |px: &[u8]| lookup.get(&pack(px)).copied().unwrap_or(0);
    let indices = if pixels.len() / 4 >= PARALLEL_PIXELS {
        pixels.par_chunks_exact(4).map(index_of).collect()
    } else {
        pixels.chunks_exact(4).map(index_of).collect()
    };

    Some((palette, indices))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_first_seen_order() {
        let pixels = [
            255, 0, 0, 255, //
            0, 255, 0, 255, //
            0, 0, 0, 0, //
            255, 0, 0, 255, //
        ];
        let (palette, indices) = build_palette(&pixels).unwrap();

        assert_eq!(
            palette,
            vec![(255, 0, 0, 255), (0, 255, 0, 255), (0, 0, 0, 0)]
        );
        assert_eq!(indices, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_palette_overflow() {
        let pixels: Vec<u8> = (0..257u32)
            .flat_map(|i| [(i % 256) as u8, (i / 256) as u8, 0, 255])
            .collect();
        assert!(build_palette(&pixels).is_none());
        assert!(build_palette(&pixels[..256 * 4]).is_some());
    }

    #[test]
    fn test_palette_parallel_matches_sequential() {
        let pixels: Vec<u8> = (0..128 * 128)
            .flat_map(|i: usize| {
                let band = ((i % 128) / 8 + (i / 128) / 8) % 40;
                [(band * 6) as u8, 90, (200 - band) as u8, 255]
            })
            .collect();
        let (palette, indices) = build_palette(&pixels).unwrap();

        assert_eq!(palette.len(), 40);
        for (px, &idx) in pixels.chunks_exact(4).zip(&indices) {
            let (r, g, b, a) = palette[idx as usize];
            assert_eq!(px, [r, g, b, a]);
        }
    }

    #[test]
    fn test_header_fields() {
        let png = create_png_indexed(3, 2, &[(1, 2, 3, 255)], &[0; 6]).unwrap();

        assert_eq!(&png[..8], &SIGNATURE);
        assert_eq!(&png[12..16], b"IHDR");
        assert_eq!(u32::from_be_bytes([png[16], png[17], png[18], png[19]]), 3);
        assert_eq!(u32::from_be_bytes([png[20], png[21], png[22], png[23]]), 2);
        assert_eq!(png[24], 8);
        assert_eq!(png[25], COLOR_TYPE_INDEXED);
        assert_eq!(&png[png.len() - 8..png.len() - 4], b"IEND");
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(create_png(&[0u8; 12], 2, 2).is_err());
        assert!(create_png_indexed(2, 2, &[(0, 0, 0, 0)], &[0u8; 3]).is_err());
        assert!(create_png_indexed(1, 1, &[], &[0u8]).is_err());
        assert!(create_png_indexed(1, 1, &[(0, 0, 0, 0)], &[1u8]).is_err());
    }

    #[test]
    fn test_trns_only_when_needed() {
        let png = create_png_indexed(2, 1, &[(0, 0, 0, 0), (255, 0, 0, 255)], &[0, 1]).unwrap();
        assert!(png.windows(4).any(|w| w == b"tRNS"));

        let opaque = create_png_indexed(1, 1, &[(255, 0, 0, 255)], &[0]).unwrap();
        assert!(!opaque.windows(4).any(|w| w == b"tRNS"));
    }
}
