//! Frame sequence encoding.
//!
//! ## Output kinds
//!
//! | Kind | Result | Encoder |
//! |---|---|---|
//! | `gif` | `<stem>.gif` | `gif` crate, NeuQuant palette per frame |
//! | `apng` | `<stem>.png` | `png` crate, animated header |
//! | `webp` | `<stem>.webp` | lossless VP8L frames from `image`, muxed here |
//! | `png-frames` | `<stem>/<stem>_<i>.png` | `image` PNG |
//! | `jpg-frames` | `<stem>/<stem>_<i>.jpg` | `image` JPEG, alpha dropped |
//!
//! Containers play at [`FRAME_RATE`] fps and loop forever. An existing
//! container with the same name is overwritten. Frame sequences always go
//! into a fresh directory (see [`naming::create_sequence_dir`]).
//!
//! ## Streaming
//!
//! Every kind is a [`FrameSink`]: frames are pushed one at a time and the
//! sink is finished once. Container metadata (size, frame count, delay,
//! loop) is fixed when the sink is opened, so a sink can be fed directly
//! from the compositor without holding the whole sequence. The WebP sink
//! keeps the compressed frames until [`FrameSink::finish`] because the RIFF
//! header needs the total size.

use crate::imaging::{Quality, Size};
use crate::naming;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Playback rate of container outputs.
pub const FRAME_RATE: u32 = 20;

/// Per-frame display time of container outputs.
pub const FRAME_DELAY_MS: u32 = 1000 / FRAME_RATE;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("APNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),
    #[error("GIF encoding failed: {0}")]
    Gif(#[from] gif::EncodingError),
    #[error("Frame is {0:?}, GIF is limited to 65535x65535")]
    GifTooLarge(Size),
    #[error("Nothing to encode: frame sequence is empty")]
    EmptySequence,
    #[error("Frame is {found:?}, expected {expected:?}")]
    FrameSize { expected: Size, found: Size },
    #[error("Malformed WebP frame: {0}")]
    WebpMux(String),
}

/// Requested output kind that does not exist.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported output kind: {0} (expected one of gif, apng, webp, png-frames, jpg-frames)")]
pub struct UnsupportedOutput(pub String);

/// How a frame sequence is written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputKind {
    Gif,
    Apng,
    Webp,
    PngFrames,
    JpgFrames,
}

impl OutputKind {
    pub const ALL: [OutputKind; 5] = [
        OutputKind::Gif,
        OutputKind::Apng,
        OutputKind::Webp,
        OutputKind::PngFrames,
        OutputKind::JpgFrames,
    ];

    /// File extension of the container, or of each frame for sequences.
    pub fn extension(self) -> &'static str {
        match self {
            OutputKind::Gif => "gif",
            OutputKind::Apng => "png",
            OutputKind::Webp => "webp",
            OutputKind::PngFrames => "png",
            OutputKind::JpgFrames => "jpg",
        }
    }

    /// Whether all frames go into a single animated file.
    pub fn is_container(self) -> bool {
        matches!(self, OutputKind::Gif | OutputKind::Apng | OutputKind::Webp)
    }

    pub fn name(self) -> &'static str {
        match self {
            OutputKind::Gif => "gif",
            OutputKind::Apng => "apng",
            OutputKind::Webp => "webp",
            OutputKind::PngFrames => "png-frames",
            OutputKind::JpgFrames => "jpg-frames",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputKind {
    type Err = UnsupportedOutput;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnsupportedOutput(s.to_string()))
    }
}

/// Numeric selection, in the order the kinds are listed in [`OutputKind::ALL`].
impl TryFrom<u8> for OutputKind {
    type Error = UnsupportedOutput;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        OutputKind::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| UnsupportedOutput(value.to_string()))
    }
}

/// Encoder settings that are not part of the output kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeOptions {
    pub jpeg_quality: Quality,
}

/// Shape of the sequence a sink is opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceInfo {
    pub size: Size,
    pub frame_count: u32,
}

/// Destination for a stream of equally sized frames.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &RgbaImage) -> Result<(), EncodeError>;

    /// Flush everything and return the written file or directory.
    fn finish(self: Box<Self>) -> Result<PathBuf, EncodeError>;
}

/// Open the sink for `kind`, creating its file or directory.
pub fn open_sink(
    kind: OutputKind,
    stem: &str,
    output_dir: &Path,
    info: SequenceInfo,
    options: &EncodeOptions,
) -> Result<Box<dyn FrameSink>, EncodeError> {
    if info.frame_count == 0 {
        return Err(EncodeError::EmptySequence);
    }
    let container = output_dir.join(format!("{}.{}", stem, kind.extension()));
    Ok(match kind {
        OutputKind::Gif => Box::new(GifSink::create(container, info)?),
        OutputKind::Apng => Box::new(ApngSink::create(container, info)?),
        OutputKind::Webp => Box::new(WebpSink::new(container, info)),
        OutputKind::PngFrames | OutputKind::JpgFrames => Box::new(SequenceSink {
            dir: naming::create_sequence_dir(output_dir, stem)?,
            stem: stem.to_string(),
            kind,
            info,
            quality: options.jpeg_quality,
            next_index: 0,
        }),
    })
}

/// Write a complete frame sequence.
///
/// `progress` is called with the 1-based frame number before each frame
/// is written.
pub fn write_frames(
    stem: &str,
    output_dir: &Path,
    frames: &[RgbaImage],
    kind: OutputKind,
    options: &EncodeOptions,
    mut progress: impl FnMut(u32),
) -> Result<PathBuf, EncodeError> {
    let first = frames.first().ok_or(EncodeError::EmptySequence)?;
    let info = SequenceInfo {
        size: Size::of(first),
        frame_count: frames.len() as u32,
    };
    let mut sink = open_sink(kind, stem, output_dir, info, options)?;
    for (i, frame) in frames.iter().enumerate() {
        progress(i as u32 + 1);
        sink.write_frame(frame)?;
    }
    sink.finish()
}

fn check_size(info: &SequenceInfo, frame: &RgbaImage) -> Result<(), EncodeError> {
    let found = Size::of(frame);
    if found != info.size {
        return Err(EncodeError::FrameSize {
            expected: info.size,
            found,
        });
    }
    Ok(())
}

// =============================================================================
// GIF
// =============================================================================

struct GifSink {
    path: PathBuf,
    info: SequenceInfo,
    encoder: gif::Encoder<BufWriter<File>>,
}

impl GifSink {
    fn create(path: PathBuf, info: SequenceInfo) -> Result<Self, EncodeError> {
        let (width, height) = gif_dimensions(info.size)?;
        let writer = BufWriter::new(File::create(&path)?);
        let mut encoder = gif::Encoder::new(writer, width, height, &[])?;
        encoder.set_repeat(gif::Repeat::Infinite)?;
        Ok(Self {
            path,
            info,
            encoder,
        })
    }
}

/// GIF stores dimensions as 16-bit values.
fn gif_dimensions(size: Size) -> Result<(u16, u16), EncodeError> {
    match (u16::try_from(size.width), u16::try_from(size.height)) {
        (Ok(width), Ok(height)) => Ok((width, height)),
        _ => Err(EncodeError::GifTooLarge(size)),
    }
}

impl FrameSink for GifSink {
    fn write_frame(&mut self, frame: &RgbaImage) -> Result<(), EncodeError> {
        check_size(&self.info, frame)?;
        let (width, height) = gif_dimensions(self.info.size)?;
        let mut pixels = frame.as_raw().clone();
        let mut gif_frame = gif::Frame::from_rgba_speed(width, height, &mut pixels, 10);
        // centiseconds
        gif_frame.delay = (FRAME_DELAY_MS / 10) as u16;
        self.encoder.write_frame(&gif_frame)?;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<PathBuf, EncodeError> {
        let GifSink { path, encoder, .. } = *self;
        let mut writer = encoder.into_inner()?;
        writer.flush()?;
        Ok(path)
    }
}

// =============================================================================
// APNG
// =============================================================================

struct ApngSink {
    path: PathBuf,
    info: SequenceInfo,
    writer: png::Writer<BufWriter<File>>,
}

impl ApngSink {
    fn create(path: PathBuf, info: SequenceInfo) -> Result<Self, EncodeError> {
        let file = BufWriter::new(File::create(&path)?);
        let mut encoder = png::Encoder::new(file, info.size.width, info.size.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        // 0 plays = loop forever
        encoder.set_animated(info.frame_count, 0)?;
        encoder.set_frame_delay(1, FRAME_RATE as u16)?;
        let writer = encoder.write_header()?;
        Ok(Self { path, info, writer })
    }
}

impl FrameSink for ApngSink {
    fn write_frame(&mut self, frame: &RgbaImage) -> Result<(), EncodeError> {
        check_size(&self.info, frame)?;
        self.writer.write_image_data(frame.as_raw())?;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<PathBuf, EncodeError> {
        let ApngSink { path, writer, .. } = *self;
        writer.finish()?;
        Ok(path)
    }
}

// =============================================================================
// Animated WebP
// =============================================================================

const VP8X_FLAG_ALPHA: u8 = 0x10;
const VP8X_FLAG_ANIMATION: u8 = 0x02;
const ANMF_NO_BLEND: u8 = 0x02;

struct WebpSink {
    path: PathBuf,
    info: SequenceInfo,
    /// Image chunks (ALPH / VP8 / VP8L) of each frame, headers included.
    frames: Vec<Vec<u8>>,
}

impl WebpSink {
    fn new(path: PathBuf, info: SequenceInfo) -> Self {
        Self {
            path,
            info,
            frames: Vec::with_capacity(info.frame_count as usize),
        }
    }
}

impl FrameSink for WebpSink {
    fn write_frame(&mut self, frame: &RgbaImage) -> Result<(), EncodeError> {
        check_size(&self.info, frame)?;
        let mut still = Vec::new();
        WebPEncoder::new_lossless(&mut still).encode(
            frame.as_raw(),
            frame.width(),
            frame.height(),
            ExtendedColorType::Rgba8,
        )?;
        self.frames.push(image_chunks(&still)?);
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<PathBuf, EncodeError> {
        let bytes = mux_animation(self.info.size, &self.frames, FRAME_DELAY_MS, 0);
        let mut file = BufWriter::new(File::create(&self.path)?);
        file.write_all(&bytes)?;
        file.flush()?;
        Ok(self.path)
    }
}

/// Pull the bitstream chunks out of a still WebP file.
fn image_chunks(still: &[u8]) -> Result<Vec<u8>, EncodeError> {
    if still.len() < 12 || &still[0..4] != b"RIFF" || &still[8..12] != b"WEBP" {
        return Err(EncodeError::WebpMux("missing RIFF/WEBP header".into()));
    }
    let mut out = Vec::new();
    let mut pos = 12;
    while pos + 8 <= still.len() {
        let fourcc = &still[pos..pos + 4];
        let len = u32::from_le_bytes([
            still[pos + 4],
            still[pos + 5],
            still[pos + 6],
            still[pos + 7],
        ]) as usize;
        let end = pos + 8 + len + (len & 1);
        if pos + 8 + len > still.len() {
            return Err(EncodeError::WebpMux("chunk runs past end of file".into()));
        }
        if matches!(fourcc, b"ALPH" | b"VP8 " | b"VP8L") {
            out.extend_from_slice(&still[pos..(pos + 8 + len)]);
            if len & 1 == 1 {
                out.push(0);
            }
        }
        pos = end;
    }
    if out.is_empty() {
        return Err(EncodeError::WebpMux("no image data chunk".into()));
    }
    Ok(out)
}

fn push_u24(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes()[..3]);
}

fn push_chunk(buf: &mut Vec<u8>, fourcc: &[u8; 4], payload: &[u8]) {
    buf.extend_from_slice(fourcc);
    buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    buf.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        buf.push(0);
    }
}

/// Assemble an extended-format animated WebP from per-frame image chunks.
fn mux_animation(size: Size, frames: &[Vec<u8>], duration_ms: u32, loop_count: u16) -> Vec<u8> {
    let mut body = b"WEBP".to_vec();

    let mut vp8x = vec![VP8X_FLAG_ALPHA | VP8X_FLAG_ANIMATION, 0, 0, 0];
    push_u24(&mut vp8x, size.width - 1);
    push_u24(&mut vp8x, size.height - 1);
    push_chunk(&mut body, b"VP8X", &vp8x);

    // transparent background
    let mut anim = vec![0, 0, 0, 0];
    anim.extend_from_slice(&loop_count.to_le_bytes());
    push_chunk(&mut body, b"ANIM", &anim);

    for frame in frames {
        let mut anmf = Vec::with_capacity(16 + frame.len());
        push_u24(&mut anmf, 0);
        push_u24(&mut anmf, 0);
        push_u24(&mut anmf, size.width - 1);
        push_u24(&mut anmf, size.height - 1);
        push_u24(&mut anmf, duration_ms);
        anmf.push(ANMF_NO_BLEND);
        anmf.extend_from_slice(frame);
        push_chunk(&mut body, b"ANMF", &anmf);
    }

    let mut out = Vec::with_capacity(body.len() + 8);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(&body);
    out
}

// =============================================================================
// Frame sequences
// =============================================================================

struct SequenceSink {
    dir: PathBuf,
    stem: String,
    kind: OutputKind,
    info: SequenceInfo,
    quality: Quality,
    next_index: u32,
}

impl FrameSink for SequenceSink {
    fn write_frame(&mut self, frame: &RgbaImage) -> Result<(), EncodeError> {
        check_size(&self.info, frame)?;
        let name = naming::frame_file_name(&self.stem, self.next_index, self.kind.extension());
        let path = self.dir.join(name);
        match self.kind {
            OutputKind::JpgFrames => {
                let rgb = DynamicImage::ImageRgba8(frame.clone()).into_rgb8();
                let mut writer = BufWriter::new(File::create(&path)?);
                JpegEncoder::new_with_quality(&mut writer, self.quality.value() as u8)
                    .write_image(
                        rgb.as_raw(),
                        rgb.width(),
                        rgb.height(),
                        ExtendedColorType::Rgb8,
                    )?;
                writer.flush()?;
            }
            _ => {
                let mut writer = BufWriter::new(File::create(&path)?);
                PngEncoder::new(&mut writer).write_image(
                    frame.as_raw(),
                    frame.width(),
                    frame.height(),
                    ExtendedColorType::Rgba8,
                )?;
                writer.flush()?;
            }
        }
        self.next_index += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<PathBuf, EncodeError> {
        Ok(self.dir)
    }
}
