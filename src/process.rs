//! Batch rendering pipeline.
//!
//! Renders a glint animation for every source image of a run:
//!
//! ```text
//! glint texture ──▶ prepare_glint ──▶ GlintLayer (once per run, shared read-only)
//!                                          │
//! source 1 ──▶ load ──▶ Frames ──▶ FrameSink ──▶ out/<stem>.<ext>
//! source 2 ──▶ load ──▶ Frames ──▶ FrameSink ──▶ out/<stem>/<stem>_<i>.<ext>
//! ...
//! ```
//!
//! ## Ordering and memory
//!
//! Sources are rendered one at a time in the order given. Each frame is
//! composited and handed to the encoder before the next one is built, so
//! only a single frame is resident per source (the WebP sink additionally
//! keeps compressed frame payloads until the container is assembled).
//! Pixel work inside each frame is parallelized with rayon by the backend.
//!
//! ## Progress
//!
//! Progress is reported as [`ProcessEvent`]s on an optional channel. The
//! pipeline sends an event for every frame generated and every frame
//! written; throttling is the receiver's job (see
//! [`output::ProgressThrottle`](crate::output::ProgressThrottle)).
//!
//! ## Failures
//!
//! Configuration problems (invalid values, missing output directory) and a
//! glint texture that cannot be loaded stop the run before any source is
//! touched. A source that fails to load or encode aborts the batch unless
//! `processing.continue_on_error` is set, in which case it is reported with
//! [`ProcessEvent::ImageFailed`] and the batch moves on.

use crate::compose::Frames;
use crate::config::{ConfigError, GlintConfig};
use crate::encode::{EncodeError, OutputKind, SequenceInfo, open_sink};
use crate::glint::{GlintError, GlintLayer, prepare_glint};
use crate::imaging::{BackendError, ImageBackend, RustBackend, Size, scaled_size};
use crate::naming;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Output directory does not exist: {0}")]
    OutputDirMissing(PathBuf),
    #[error("Glint error: {0}")]
    Glint(#[from] GlintError),
    #[error("Cannot load source image {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("Encoding {path} failed: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: EncodeError,
    },
}

/// Progress notifications sent while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    /// The glint layer is ready.
    GlintPrepared { texture: PathBuf, size: Size },
    /// A source was loaded and its frames are about to be rendered.
    ImageStarted {
        /// 0-based position in the batch.
        index: usize,
        total: usize,
        source: PathBuf,
        canvas: Size,
        frames: u32,
    },
    /// Frame `frame` (1-based) of the current source is being composited.
    FrameGenerated { index: usize, frame: u32, frames: u32 },
    /// Frame `frame` (1-based) of the current source was handed to the encoder.
    FrameWritten { index: usize, frame: u32, frames: u32 },
    /// All frames of a source were written.
    ImageFinished {
        index: usize,
        source: PathBuf,
        output: PathBuf,
        kind: OutputKind,
        frames: u32,
    },
    /// A source failed; `error` is the human-readable reason.
    ImageFailed {
        index: usize,
        source: PathBuf,
        error: String,
    },
    /// The batch is done.
    BatchFinished { rendered: usize, failed: usize },
}

/// One successfully rendered source.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImage {
    pub source: PathBuf,
    /// Container file, or directory holding the frame sequence.
    pub output: PathBuf,
    pub frames: u32,
}

/// A source skipped under `continue_on_error`.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedImage {
    pub source: PathBuf,
    pub error: String,
}

/// Outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub rendered: Vec<RenderedImage>,
    pub failed: Vec<FailedImage>,
}

/// What a run would produce, without writing anything.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    pub glint: Size,
    pub kind: OutputKind,
    pub frames: u32,
    /// Each source with the canvas size its frames would have.
    pub sources: Vec<(PathBuf, Size)>,
}

/// Render every source with the pure-Rust backend.
pub fn process(
    inputs: &[PathBuf],
    config: &GlintConfig,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<BatchSummary, ProcessError> {
    process_with_backend(&RustBackend::new(), inputs, config, progress)
}

/// Render every source using a specific backend (allows testing with mock).
pub fn process_with_backend(
    backend: &impl ImageBackend,
    inputs: &[PathBuf],
    config: &GlintConfig,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<BatchSummary, ProcessError> {
    check_output_dir(config)?;

    let glint = prepare_glint(
        backend,
        &config.glint.texture,
        &config.glint_params(),
        &config.alpha_mapping(),
    )?;
    emit(
        &progress,
        ProcessEvent::GlintPrepared {
            texture: config.glint.texture.clone(),
            size: glint.size(),
        },
    );

    let mut summary = BatchSummary::default();
    for (index, source) in inputs.iter().enumerate() {
        match render_source(backend, &glint, source, index, inputs.len(), config, &progress) {
            Ok(rendered) => {
                emit(
                    &progress,
                    ProcessEvent::ImageFinished {
                        index,
                        source: rendered.source.clone(),
                        output: rendered.output.clone(),
                        kind: config.output.format,
                        frames: rendered.frames,
                    },
                );
                summary.rendered.push(rendered);
            }
            Err(e) => {
                emit(
                    &progress,
                    ProcessEvent::ImageFailed {
                        index,
                        source: source.clone(),
                        error: e.to_string(),
                    },
                );
                if !config.processing.continue_on_error {
                    return Err(e);
                }
                summary.failed.push(FailedImage {
                    source: source.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    emit(
        &progress,
        ProcessEvent::BatchFinished {
            rendered: summary.rendered.len(),
            failed: summary.failed.len(),
        },
    );
    Ok(summary)
}

/// Validate a run without writing anything: config, output directory,
/// glint texture and every source must be usable.
pub fn check_with_backend(
    backend: &impl ImageBackend,
    inputs: &[PathBuf],
    config: &GlintConfig,
) -> Result<CheckReport, ProcessError> {
    check_output_dir(config)?;

    let glint = prepare_glint(
        backend,
        &config.glint.texture,
        &config.glint_params(),
        &config.alpha_mapping(),
    )?;

    let sources = inputs
        .iter()
        .map(|path| {
            let size = backend.identify(path).map_err(|source| ProcessError::Source {
                path: path.clone(),
                source,
            })?;
            Ok((path.clone(), scaled_size(size, config.animation.input_scale)))
        })
        .collect::<Result<Vec<_>, ProcessError>>()?;

    Ok(CheckReport {
        glint: glint.size(),
        kind: config.output.format,
        frames: config.animation.frames,
        sources,
    })
}

pub fn check(inputs: &[PathBuf], config: &GlintConfig) -> Result<CheckReport, ProcessError> {
    check_with_backend(&RustBackend::new(), inputs, config)
}

fn check_output_dir(config: &GlintConfig) -> Result<(), ProcessError> {
    config.validate()?;
    if !config.output.directory.is_dir() {
        return Err(ProcessError::OutputDirMissing(
            config.output.directory.clone(),
        ));
    }
    Ok(())
}

/// Load one source, composite its frames and stream them into the encoder.
fn render_source(
    backend: &impl ImageBackend,
    glint: &GlintLayer,
    source: &Path,
    index: usize,
    total: usize,
    config: &GlintConfig,
    progress: &Option<Sender<ProcessEvent>>,
) -> Result<RenderedImage, ProcessError> {
    let image = backend.load(source).map_err(|e| ProcessError::Source {
        path: source.to_path_buf(),
        source: e,
    })?;

    let frame_count = config.animation.frames;
    let frames = Frames::new(
        backend,
        &image,
        glint,
        frame_count,
        config.animation.input_scale,
    );
    emit(
        progress,
        ProcessEvent::ImageStarted {
            index,
            total,
            source: source.to_path_buf(),
            canvas: frames.canvas_size(),
            frames: frame_count,
        },
    );

    let encode_err = |e: EncodeError| ProcessError::Encode {
        path: source.to_path_buf(),
        source: e,
    };
    let stem = naming::source_stem(source);
    let info = SequenceInfo {
        size: frames.canvas_size(),
        frame_count,
    };
    let mut sink = open_sink(
        config.output.format,
        &stem,
        &config.output.directory,
        info,
        &config.encode_options(),
    )
    .map_err(encode_err)?;

    for i in 0..frame_count {
        let frame = i + 1;
        emit(
            progress,
            ProcessEvent::FrameGenerated {
                index,
                frame,
                frames: frame_count,
            },
        );
        let canvas = frames.render(i);
        sink.write_frame(&canvas).map_err(encode_err)?;
        emit(
            progress,
            ProcessEvent::FrameWritten {
                index,
                frame,
                frames: frame_count,
            },
        );
    }
    let output = sink.finish().map_err(encode_err)?;

    Ok(RenderedImage {
        source: source.to_path_buf(),
        output,
        frames: frame_count,
    })
}

fn emit(progress: &Option<Sender<ProcessEvent>>, event: ProcessEvent) {
    if let Some(tx) = progress {
        // A dropped receiver only means nobody is listening.
        tx.send(event).ok();
    }
}
