//! Reading back rendered outputs.
//!
//! Recognizes what [`encode`](crate::encode) wrote into an output directory
//! and counts its frames:
//!
//! - `*.gif`, `*.webp` and animated `*.png` files are containers; their
//!   frames are counted by decoding them with `image`'s animation decoders.
//! - A directory holding `<stem>_0.<ext>`, `<stem>_1.<ext>`, … is a frame
//!   sequence; its frame count is the length of the contiguous run starting
//!   at index 0.
//!
//! Plain (non-animated) PNGs are not outputs and are ignored, so a directory
//! that mixes sources and results lists only the results.

use crate::encode::OutputKind;
use crate::naming::parse_frame_name;
use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::AnimationDecoder;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InspectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// One recognized output in a directory listing.
#[derive(Debug)]
pub struct OutputEntry {
    pub path: PathBuf,
    pub kind: OutputKind,
    pub frames: Result<usize, InspectError>,
}

/// Work out which output kind `path` is, if any.
pub fn detect_kind(path: &Path) -> Option<OutputKind> {
    if path.is_dir() {
        let first = frame_sequence(path).into_iter().next()?;
        let ext = first.extension()?.to_string_lossy().to_lowercase();
        return match ext.as_str() {
            "png" => Some(OutputKind::PngFrames),
            "jpg" | "jpeg" => Some(OutputKind::JpgFrames),
            _ => None,
        };
    }

    let ext = path.extension()?.to_string_lossy().to_lowercase();
    match ext.as_str() {
        "gif" => Some(OutputKind::Gif),
        "webp" => Some(OutputKind::Webp),
        "png" if is_apng(path).unwrap_or(false) => Some(OutputKind::Apng),
        _ => None,
    }
}

fn is_apng(path: &Path) -> Result<bool, InspectError> {
    let decoder = PngDecoder::new(open(path)?).map_err(|e| decode_error(path, e))?;
    decoder.is_apng().map_err(|e| decode_error(path, e))
}

/// Frame files of the sequence in `dir`, in index order.
///
/// The sequence is the stem owning `_0`; it ends at the first missing index.
pub fn frame_sequence(dir: &Path) -> Vec<PathBuf> {
    let Ok(read) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut parsed: Vec<_> = read
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            parse_frame_name(&name).map(|p| (p, e.path()))
        })
        .collect();
    parsed.sort_by(|a, b| a.1.cmp(&b.1));

    let Some((head, _)) = parsed.iter().find(|(p, _)| p.index == 0) else {
        return Vec::new();
    };
    let (stem, extension) = (head.stem.clone(), head.extension.clone());

    let mut run = Vec::new();
    loop {
        let next = parsed.iter().find(|(p, _)| {
            p.index == run.len() as u32 && p.stem == stem && p.extension == extension
        });
        match next {
            Some((_, path)) => run.push(path.clone()),
            None => return run,
        }
    }
}

/// Number of frames in the output at `path`.
pub fn count_frames(path: &Path, kind: OutputKind) -> Result<usize, InspectError> {
    let decoded = match kind {
        OutputKind::PngFrames | OutputKind::JpgFrames => return Ok(frame_sequence(path).len()),
        OutputKind::Gif => {
            GifDecoder::new(open(path)?).and_then(|d| d.into_frames().collect_frames())
        }
        OutputKind::Webp => {
            WebPDecoder::new(open(path)?).and_then(|d| d.into_frames().collect_frames())
        }
        OutputKind::Apng => {
            if !is_apng(path)? {
                return Ok(1);
            }
            PngDecoder::new(open(path)?)
                .and_then(|d| d.apng())
                .and_then(|d| d.into_frames().collect_frames())
        }
    };
    decoded
        .map(|frames| frames.len())
        .map_err(|e| decode_error(path, e))
}

/// Every recognized output directly inside `dir`, sorted by path.
pub fn list_outputs(dir: &Path) -> Result<Vec<OutputEntry>, InspectError> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    paths.sort();

    Ok(paths
        .into_iter()
        .filter_map(|path| {
            let kind = detect_kind(&path)?;
            let frames = count_frames(&path, kind);
            Some(OutputEntry { path, kind, frames })
        })
        .collect())
}

fn open(path: &Path) -> Result<BufReader<File>, InspectError> {
    Ok(BufReader::new(File::open(path)?))
}

fn decode_error(path: &Path, source: image::ImageError) -> InspectError {
    InspectError::Decode {
        path: path.to_path_buf(),
        source,
    }
}
