//! Source image discovery.
//!
//! Turns the command-line inputs into the ordered list of source images a
//! batch renders. Each argument is either a file or a directory:
//!
//! ```text
//! render boat.png items/ sword.png
//!        │        │      └─ taken as given
//!        │        └─ every supported image directly inside, sorted
//!        └─ taken as given
//! ```
//!
//! Explicit files are never filtered by extension: if the user names a
//! file, the decoder gets to decide whether it is an image. Directory
//! entries are filtered to [`supported_input_extensions`] and hidden files
//! are skipped. Directories are not walked recursively, so a previous
//! run's frame-sequence directories inside an input folder are ignored.

use crate::imaging::supported_input_extensions;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Input not found: {0}")]
    NotFound(PathBuf),
    #[error("No source images found")]
    Empty,
}

/// Resolve input arguments into source image paths, preserving argument order.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>, ScanError> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            inputs.extend(images_in_dir(path)?);
        } else if path.is_file() {
            inputs.push(path.clone());
        } else {
            return Err(ScanError::NotFound(path.clone()));
        }
    }

    if inputs.is_empty() {
        return Err(ScanError::Empty);
    }
    Ok(inputs)
}

fn images_in_dir(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| is_visible(p) && is_image(p))
        .collect();

    entries.sort();
    Ok(entries)
}

fn is_visible(path: &Path) -> bool {
    path.file_name()
        .map(|n| !n.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

fn is_image(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    supported_input_extensions().contains(&ext.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn explicit_files_taken_as_given() {
        let tmp = TempDir::new().unwrap();
        let notes = touch(tmp.path(), "notes.txt");
        let boat = touch(tmp.path(), "boat.png");

        let inputs = collect_inputs(&[notes.clone(), boat.clone()]).unwrap();
        assert_eq!(inputs, vec![notes, boat]);
    }

    #[test]
    fn directory_contributes_sorted_images() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "sword.png");
        touch(tmp.path(), "apple.JPG");
        touch(tmp.path(), "boat.webp");

        let inputs = collect_inputs(&[tmp.path().to_path_buf()]).unwrap();
        let names: Vec<String> = inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["apple.JPG", "boat.webp", "sword.png"]);
    }

    #[test]
    fn directory_skips_hidden_and_non_images() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), ".hidden.png");
        touch(tmp.path(), "readme.md");
        touch(tmp.path(), "glint.toml");
        let boat = touch(tmp.path(), "boat.png");

        assert_eq!(collect_inputs(&[tmp.path().to_path_buf()]).unwrap(), vec![boat]);
    }

    #[test]
    fn directory_is_not_walked_recursively() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("boat");
        fs::create_dir(&nested).unwrap();
        touch(&nested, "boat_0.png");
        let sword = touch(tmp.path(), "sword.png");

        assert_eq!(collect_inputs(&[tmp.path().to_path_buf()]).unwrap(), vec![sword]);
    }

    #[test]
    fn argument_order_is_preserved() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("items");
        fs::create_dir(&dir).unwrap();
        let apple = touch(&dir, "apple.png");
        let zebra = touch(tmp.path(), "zebra.png");

        let inputs = collect_inputs(&[zebra.clone(), dir]).unwrap();
        assert_eq!(inputs, vec![zebra, apple]);
    }

    #[test]
    fn missing_path_is_error() {
        let result = collect_inputs(&[PathBuf::from("/nonexistent/boat.png")]);
        assert!(matches!(result, Err(ScanError::NotFound(_))));
    }

    #[test]
    fn no_images_is_error() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "readme.md");

        assert!(matches!(
            collect_inputs(&[tmp.path().to_path_buf()]),
            Err(ScanError::Empty)
        ));
        assert!(matches!(collect_inputs(&[]), Err(ScanError::Empty)));
    }
}
