//! Output naming conventions.
//!
//! Every output is named after its source's *stem*: the file name up to
//! its first dot, so `acacia_boat.png` and `acacia_boat.old.png` both
//! become `acacia_boat`.
//!
//! ```text
//! out/acacia_boat.webp                   # container kinds
//! out/acacia_boat/acacia_boat_0.png      # frame sequences
//! out/acacia_boat (1)/acacia_boat_0.png  # second run, first dir taken
//! ```
//!
//! Frame files are `<stem>_<index>.<ext>` with a 0-based index and no
//! padding. [`parse_frame_name`] reads that pattern back.

use std::io;
use std::path::{Path, PathBuf};

/// Stem used for every output derived from `source`.
///
/// Hidden files (`.glint.png`) and names without a usable prefix fall back
/// to the whole file name.
pub fn source_stem(source: &Path) -> String {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.split('.').next() {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => name,
    }
}

/// `<stem>_<index>.<ext>`
pub fn frame_file_name(stem: &str, index: u32, extension: &str) -> String {
    format!("{}_{}.{}", stem, index, extension)
}

/// Directory name for the `n`th collision: `stem`, `stem (1)`, `stem (2)`, …
pub fn sequence_dir_name(stem: &str, attempt: u32) -> String {
    if attempt == 0 {
        stem.to_string()
    } else {
        format!("{} ({})", stem, attempt)
    }
}

/// Create a fresh directory for a frame sequence.
///
/// Probes `stem`, `stem (1)`, `stem (2)`, … and creates the first name that
/// is free. An existing directory is never reused, so earlier runs are
/// never overwritten.
pub fn create_sequence_dir(output_dir: &Path, stem: &str) -> io::Result<PathBuf> {
    let mut attempt = 0;
    loop {
        let candidate = output_dir.join(sequence_dir_name(stem, attempt));
        if !candidate.exists() {
            match std::fs::create_dir(&candidate) {
                Ok(()) => return Ok(candidate),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e),
            }
        }
        attempt += 1;
    }
}

/// Result of parsing a frame file name like `acacia_boat_12.png`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFrameName {
    /// Everything before the last underscore.
    pub stem: String,
    pub index: u32,
    pub extension: String,
}

/// Parse a `<stem>_<index>.<ext>` file name.
///
/// - `"boat_0.png"` → stem="boat", index=0, extension="png"
/// - `"my_boat_12.jpg"` → stem="my_boat", index=12, extension="jpg"
/// - `"boat.png"` → None (no index)
/// - `"boat_x.png"` → None (index not numeric)
pub fn parse_frame_name(name: &str) -> Option<ParsedFrameName> {
    let (base, extension) = name.rsplit_once('.')?;
    let (stem, index) = base.rsplit_once('_')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }
    let index = index.parse::<u32>().ok()?;
    Some(ParsedFrameName {
        stem: stem.to_string(),
        index,
        extension: extension.to_string(),
    })
}
