//! Work item discovery.
//!
//! Enumerates input images and computes each item's output location. This is
//! pure path work: deterministic, no side effects, and all of it happens
//! before any processing starts so that bad inputs fail the run up front.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BatchError, BatchResult};

/// Image file extensions accepted as pipeline input (lowercase, no dot).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp"];

/// One unit of work: a source image and its computed output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Item name (the image file stem).
    pub name: String,

    /// Resolved path to the source image.
    pub image_path: PathBuf,

    /// Directory all artifacts for this item are written under.
    pub output_dir: PathBuf,
}

/// Compute the output directory for an image, preserving directory structure.
///
/// The image's path relative to `input_root` is mirrored under
/// `output_root`, substituting the file stem for the filename:
///
/// - input_root `assets/`, image `assets/monsters/bat.png`
///   → `<output_root>/monsters/bat`
/// - input_root == image parent (single-file input), image `hero.png`
///   → `<output_root>/hero`
///
/// This is a pure function of its arguments; collisions are impossible as
/// long as source filenames are unique within their directory.
pub fn output_dir_for(image_path: &Path, input_root: &Path, output_root: &Path) -> PathBuf {
    let rel = image_path.strip_prefix(input_root).unwrap_or(image_path);
    let stem = rel.file_stem().unwrap_or_default();
    match rel.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            output_root.join(parent).join(stem)
        }
        _ => output_root.join(stem),
    }
}

/// Discover all work items under `input_path`.
///
/// A single file yields exactly one item. A directory is enumerated
/// recursively for files with an extension in [`IMAGE_EXTENSIONS`], sorted
/// lexicographically by full path so batches are deterministic.
///
/// # Errors
///
/// Returns [`BatchError::InputNotFound`] if the path does not exist and
/// [`BatchError::NoImagesFound`] if a directory contains no matching files.
pub fn discover(input_path: &Path, output_root: &Path) -> BatchResult<Vec<WorkItem>> {
    if !input_path.exists() {
        return Err(BatchError::InputNotFound {
            path: input_path.to_path_buf(),
        });
    }

    if input_path.is_file() {
        // Single-file input: the parent directory acts as the input root.
        let input_root = input_path.parent().unwrap_or(Path::new(""));
        return Ok(vec![work_item(input_path, input_root, output_root)]);
    }

    let mut images = Vec::new();
    collect_images(input_path, &mut images).map_err(|e| BatchError::ReadFailed {
        path: input_path.to_path_buf(),
        source: e,
    })?;
    images.sort();

    if images.is_empty() {
        return Err(BatchError::NoImagesFound {
            path: input_path.to_path_buf(),
        });
    }

    Ok(images
        .iter()
        .map(|img| work_item(img, input_path, output_root))
        .collect())
}

fn work_item(image_path: &Path, input_root: &Path, output_root: &Path) -> WorkItem {
    let name = image_path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    WorkItem {
        name,
        image_path: image_path.to_path_buf(),
        output_dir: output_dir_for(image_path, input_root, output_root),
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn collect_images(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_images(&path, out)?;
        } else if path.is_file() && is_image(&path) {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_dir_single_file() {
        let out = output_dir_for(
            Path::new("/images/hero.png"),
            Path::new("/images"),
            Path::new("/out"),
        );
        assert_eq!(out, PathBuf::from("/out/hero"));
    }

    #[test]
    fn test_output_dir_mirrors_structure() {
        let out = output_dir_for(
            Path::new("/assets/monsters/bat.png"),
            Path::new("/assets"),
            Path::new("/out"),
        );
        assert_eq!(out, PathBuf::from("/out/monsters/bat"));
    }

    #[test]
    fn test_output_dir_nested() {
        let out = output_dir_for(
            Path::new("/assets/a/b/c.png"),
            Path::new("/assets"),
            Path::new("/out"),
        );
        assert_eq!(out, PathBuf::from("/out/a/b/c"));
    }

    #[test]
    fn test_discover_missing_input() {
        let result = discover(Path::new("/does/not/exist"), Path::new("/out"));
        assert!(matches!(result, Err(BatchError::InputNotFound { .. })));
    }

    #[test]
    fn test_discover_single_file() {
        let temp = TempDir::new().unwrap();
        let image = temp.path().join("hero.png");
        fs::write(&image, b"png").unwrap();

        let items = discover(&image, Path::new("/out")).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "hero");
        assert_eq!(items[0].image_path, image);
        assert_eq!(items[0].output_dir, PathBuf::from("/out/hero"));
    }

    #[test]
    fn test_discover_directory_sorted() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("monsters")).unwrap();
        fs::write(temp.path().join("monsters/zombie.png"), b"z").unwrap();
        fs::write(temp.path().join("monsters/bat.png"), b"b").unwrap();
        fs::write(temp.path().join("axe.jpg"), b"a").unwrap();
        // Non-image files are ignored
        fs::write(temp.path().join("notes.txt"), b"n").unwrap();

        let items = discover(temp.path(), Path::new("/out")).unwrap();
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["axe", "bat", "zombie"]);
        assert_eq!(items[1].output_dir, PathBuf::from("/out/monsters/bat"));
    }

    #[test]
    fn test_discover_uppercase_extension() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("HERO.PNG"), b"p").unwrap();

        let items = discover(temp.path(), Path::new("/out")).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_discover_empty_directory() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("readme.md"), b"m").unwrap();

        let result = discover(temp.path(), Path::new("/out"));
        assert!(matches!(result, Err(BatchError::NoImagesFound { .. })));
    }

    proptest! {
        /// The output directory is always `<output_root>/<rel_parent>/<stem>`,
        /// for any output root.
        #[test]
        fn prop_output_dir_deterministic(
            dirs in proptest::collection::vec("[a-z]{1,8}", 0..4),
            stem in "[a-z]{1,8}",
            out_root in "[a-z]{1,8}",
        ) {
            let input_root = PathBuf::from("/input");
            let mut rel = PathBuf::new();
            for d in &dirs {
                rel.push(d);
            }
            let image = input_root.join(&rel).join(format!("{}.png", stem));
            let output_root = PathBuf::from("/").join(&out_root);

            let got = output_dir_for(&image, &input_root, &output_root);
            prop_assert_eq!(got, output_root.join(&rel).join(&stem));
        }
    }
}
