//! Image folder listing and safe path resolution under the public root.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use gfs_common::{is_image_file, Category};
use tokio::fs;
use tracing::debug;

/// Category name to sorted image file names.
pub type ImageListing = BTreeMap<String, Vec<String>>;

/// List the image files of each category folder under `public_dir`.
///
/// Folders that are missing, unreadable or hold no images are left out.
pub async fn list_images(public_dir: &Path, categories: &[Category]) -> ImageListing {
    let mut listing = ImageListing::new();

    for category in categories {
        let folder = public_dir.join(category.name());
        let mut entries = match fs::read_dir(&folder).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!(folder = %folder.display(), error = %e, "Skipping category");
                continue;
            }
        };

        let mut images = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if !is_image_file(&path) {
                continue;
            }
            let is_file = fs::metadata(&path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
            if is_file {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    images.push(name.to_string());
                }
            }
        }

        if !images.is_empty() {
            images.sort();
            listing.insert(category.name().to_string(), images);
        }
    }

    listing
}

/// Resolve a request path to a regular file inside `root`.
///
/// Returns `None` for anything but plain relative segments, for files
/// that do not exist, and for symlinks that lead outside `root`.
pub async fn resolve_public_path(root: &Path, requested: &str) -> Option<PathBuf> {
    let relative = Path::new(requested);
    let mut components = relative.components().peekable();
    components.peek()?;
    if !components.all(|c| matches!(c, Component::Normal(_))) {
        return None;
    }

    let root = fs::canonicalize(root).await.ok()?;
    let target = fs::canonicalize(root.join(relative)).await.ok()?;
    if !target.starts_with(&root) {
        return None;
    }

    let metadata = fs::metadata(&target).await.ok()?;
    metadata.is_file().then_some(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::PublicTree;

    #[tokio::test]
    async fn test_list_images_filters_and_sorts() {
        let tree = PublicTree::new();
        tree.write("GUST/gust_20240305_12_f003.png", b"x");
        tree.write("GUST/gust_20240305_12_f000.png", b"x");
        tree.write("GUST/gfs_gust_animation.GIF", b"x");
        tree.write("GUST/notes.txt", b"x");
        tree.write("RS/readme.md", b"x");
        tree.category("HL");
        std::fs::create_dir_all(tree.root().join("temp/looks_like.png")).unwrap();

        let listing = list_images(tree.root(), &Category::defaults()).await;

        assert_eq!(listing.len(), 1);
        assert_eq!(
            listing["GUST"],
            vec![
                "gfs_gust_animation.GIF",
                "gust_20240305_12_f000.png",
                "gust_20240305_12_f003.png"
            ]
        );
    }

    #[tokio::test]
    async fn test_list_images_empty_tree() {
        let tree = PublicTree::new();
        assert!(list_images(tree.root(), &Category::defaults())
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_resolve_rejects_non_normal_segments() {
        let tree = PublicTree::new();
        tree.write("RS/a.png", b"x");

        assert!(resolve_public_path(tree.root(), "RS/a.png").await.is_some());
        assert!(resolve_public_path(tree.root(), "RS/../RS/a.png").await.is_none());
        assert!(resolve_public_path(tree.root(), "./RS/a.png").await.is_none());
        assert!(resolve_public_path(tree.root(), "/etc/passwd").await.is_none());
        assert!(resolve_public_path(tree.root(), "").await.is_none());
        assert!(resolve_public_path(tree.root(), "RS").await.is_none());
        assert!(resolve_public_path(tree.root(), "RS/missing.png").await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_rejects_symlink_escape() {
        let tree = PublicTree::new();
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret.png"), b"x").unwrap();
        tree.category("RS");
        std::os::unix::fs::symlink(
            outside.path().join("secret.png"),
            tree.root().join("RS/secret.png"),
        )
        .unwrap();

        assert!(resolve_public_path(tree.root(), "RS/secret.png").await.is_none());
    }
}
