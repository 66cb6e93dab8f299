//! Animated GIF assembly from rendered PNG frames.

use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};
use tracing::{debug, info};

use crate::error::{RenderError, RenderResult};

/// Encode in-memory PNG frames (in order) as an infinitely looping GIF.
pub fn encode_gif<W: Write>(pngs: &[Vec<u8>], delay_ms: u32, writer: W) -> RenderResult<()> {
    encode_gif_frames(pngs.iter().map(Ok), delay_ms, writer).map(|_| ())
}

/// Encode PNG frames as they arrive from `frames`.
///
/// Each frame is decoded only when the encoder reaches it, so at most one
/// decoded image is held at a time. Every frame is shown for `delay_ms` and
/// all frames must share the size of the first. Returns the frame count.
pub fn encode_gif_frames<W, I, B>(frames: I, delay_ms: u32, writer: W) -> RenderResult<usize>
where
    W: Write,
    I: IntoIterator<Item = RenderResult<B>>,
    B: AsRef<[u8]>,
{
    let delay = Delay::from_numer_denom_ms(delay_ms, 1);
    let mut encoder = GifEncoder::new_with_speed(writer, 10);
    encoder.set_repeat(Repeat::Infinite)?;

    let mut size = None;
    let mut count = 0;
    for png in frames {
        let image = image::load_from_memory(png?.as_ref())?.to_rgba8();
        let (width, height) = *size.get_or_insert(image.dimensions());
        if image.dimensions() != (width, height) {
            return Err(RenderError::InvalidInput(format!(
                "frame {} is {:?}, expected {}x{}",
                count,
                image.dimensions(),
                width,
                height
            )));
        }

        encoder.encode_frame(Frame::from_parts(image, 0, 0, delay))?;
        count += 1;
    }

    let Some((width, height)) = size else {
        return Err(RenderError::InvalidInput("no frames to encode".to_string()));
    };

    debug!(frames = count, width, height, delay_ms, "Encoded GIF");
    Ok(count)
}

/// Read PNG files in the given order and write the GIF to `output`.
///
/// The GIF is encoded into a temporary file next to `output` and renamed
/// over it only once complete, so a failure never leaves a partial GIF and
/// an existing file at `output` stays intact. Returns the number of frames.
pub fn write_gif_from_files<P: AsRef<Path>>(
    frames: &[P],
    delay_ms: u32,
    output: &Path,
) -> RenderResult<usize> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let staging = tempfile::Builder::new()
        .prefix(".gif-")
        .suffix(".tmp")
        .tempfile_in(dir)?;

    let count = {
        let mut writer = BufWriter::new(staging.as_file());
        let pngs = frames
            .iter()
            .map(|path| std::fs::read(path.as_ref()).map_err(RenderError::from));
        let count = encode_gif_frames(pngs, delay_ms, &mut writer)?;
        writer.flush()?;
        count
    };

    staging.persist(output).map_err(|e| e.error)?;

    info!(path = %output.display(), frames = count, "GIF created");
    Ok(count)
}
