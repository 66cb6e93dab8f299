//! Product folder layout and the per-run cleanup.

use std::path::{Path, PathBuf};

use gfs_common::{ForecastStep, ModelRun};
use tokio::fs;
use tracing::{debug, warn};

use crate::config::{FieldConfig, ProductConfig};
use crate::error::PipelineResult;
use crate::url::local_file_name;

/// Where a product keeps its grids and images under the public root.
///
/// ```text
/// <public>/grib/<field grib_dir>/gfs.tHHz.pgrb2.0p25.fNNN.grib2
/// <public>/<output dir>/<prefix>_<YYYYMMDD>_<HH>_fNNN.png
/// <public>/<output dir>/<animation>
/// ```
#[derive(Debug, Clone)]
pub struct ProductPaths {
    pub grib_root: PathBuf,
    pub output_dir: PathBuf,
    field_dirs: Vec<(String, PathBuf)>,
    image_prefix: String,
    animation: String,
}

impl ProductPaths {
    pub fn new(public_root: &Path, product: &ProductConfig) -> Self {
        let grib_root = public_root.join("grib");
        let field_dirs = product
            .fields
            .iter()
            .map(|f| (f.variable.clone(), grib_root.join(&f.grib_dir)))
            .collect();

        Self {
            output_dir: public_root.join(&product.output.dir),
            grib_root,
            field_dirs,
            image_prefix: product.output.image_prefix.clone(),
            animation: product.output.animation.clone(),
        }
    }

    /// Grib folders of every field, in config order.
    pub fn field_dirs(&self) -> impl Iterator<Item = &Path> {
        self.field_dirs.iter().map(|(_, dir)| dir.as_path())
    }

    fn field_dir(&self, field: &FieldConfig) -> PathBuf {
        self.field_dirs
            .iter()
            .find(|(variable, _)| *variable == field.variable)
            .map(|(_, dir)| dir.clone())
            .unwrap_or_else(|| self.grib_root.join(&field.grib_dir))
    }

    pub fn grib_file(&self, field: &FieldConfig, run: &ModelRun, step: ForecastStep) -> PathBuf {
        self.field_dir(field).join(local_file_name(run, step))
    }

    pub fn image_file(&self, run: &ModelRun, step: ForecastStep) -> PathBuf {
        self.output_dir.join(format!(
            "{}_{}_{}_{}.png",
            self.image_prefix,
            run.date_str(),
            run.hour_str(),
            step.label()
        ))
    }

    pub fn animation_file(&self) -> PathBuf {
        self.output_dir.join(&self.animation)
    }
}

/// Empty the product's field and output folders, then make sure every
/// folder exists.
///
/// The shared `grib/` root is created but never emptied. Entries that
/// cannot be removed are logged and left behind.
pub async fn prepare_folders(paths: &ProductPaths) -> PipelineResult<()> {
    for dir in paths.field_dirs().chain(std::iter::once(paths.output_dir.as_path())) {
        clear_folder(dir).await;
    }

    fs::create_dir_all(&paths.grib_root).await?;
    for dir in paths.field_dirs() {
        fs::create_dir_all(dir).await?;
    }
    fs::create_dir_all(&paths.output_dir).await?;

    debug!(output = %paths.output_dir.display(), "Prepared product folders");
    Ok(())
}

/// Remove every file, symlink and subdirectory inside `dir`.
async fn clear_folder(dir: &Path) {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "Failed to list folder");
            return;
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "Failed to read folder entry");
                break;
            }
        };

        let path = entry.path();
        // file_type() does not follow symlinks, so a link to a directory is
        // unlinked rather than emptied
        let result = match entry.file_type().await {
            Ok(kind) if kind.is_dir() => fs::remove_dir_all(&path).await,
            Ok(_) => fs::remove_file(&path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "Failed to delete");
        }
    }
}
