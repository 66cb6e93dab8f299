//! Assembling rendered frames into the product animation.

use std::path::{Path, PathBuf};

use renderer::animation::write_gif_from_files;
use tracing::{info, warn};

/// Write `frames` (in order) as a looping GIF at `output`.
///
/// Returns `None` without touching the filesystem when there are no frames.
/// A failed encode is logged and also yields `None`; the rendered frames
/// remain usable and any previous GIF at `output` is left in place.
pub fn build_animation(frames: &[PathBuf], delay_ms: u32, output: &Path) -> Option<PathBuf> {
    if frames.is_empty() {
        info!("No images found to create a GIF.");
        return None;
    }

    match write_gif_from_files(frames, delay_ms, output) {
        Ok(_) => Some(output.to_path_buf()),
        Err(e) => {
            warn!(path = %output.display(), error = %e, "Failed to create GIF");
            None
        }
    }
}
