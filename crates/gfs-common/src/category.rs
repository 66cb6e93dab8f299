//! Image categories: the output folders the web backend lists.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Folders under the public root that hold rendered images.
pub const DEFAULT_CATEGORIES: [&str; 5] = ["HL", "RS", "mslet", "temp", "GUST"];

/// File extensions treated as images (compared lowercase).
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// A named image folder relative to the public root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn defaults() -> Vec<Category> {
        DEFAULT_CATEGORIES.iter().map(|c| Category::new(*c)).collect()
    }
}

/// True if the path ends in one of the image extensions, any case.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("gust_12_f000.png")));
        assert!(is_image_file(Path::new("anim.GIF")));
        assert!(is_image_file(Path::new("photo.JpEg")));
        assert!(!is_image_file(Path::new("gfs.t12z.pgrb2.0p25.f000.grib2")));
        assert!(!is_image_file(Path::new("png")));
    }

    #[test]
    fn test_default_categories() {
        let names: Vec<String> = Category::defaults()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["HL", "RS", "mslet", "temp", "GUST"]);
    }
}
