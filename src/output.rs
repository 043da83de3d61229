//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Every source image is shown by its positional index and stem first, with
//! filesystem paths as secondary context on indented lines. Output reads as
//! an inventory of what was rendered, while still letting users trace each
//! line back to a file.
//!
//! # Output Format
//!
//! ## Render
//!
//! ```text
//! Glint enchanted_glint_item.png → 256x256 layer
//! 001 apple (160x160, 1650 frames)
//!     Source: items/apple.png
//!     frame 412/1650
//!     frame 1650/1650
//!     → out/apple.webp (webp)
//! 002 boat (160x160, 1650 frames)
//!     Source: items/boat.png
//!     FAILED: Cannot load source image items/boat.png: ...
//! Rendered 1 image, 1 failed
//! ```
//!
//! ## Check
//!
//! ```text
//! Glint layer 256x256
//! Output webp, 1650 frames
//! 001 apple → 160x160
//! ```
//!
//! ## Inspect
//!
//! ```text
//! out/
//!     apple.webp: webp, 1650 frames
//!     boat/: png-frames, 1650 frames
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects. Frame-level progress is
//! sampled by [`ProgressThrottle`] before it reaches the formatter.

use crate::inspect::OutputEntry;
use crate::naming::source_stem;
use crate::process::{BatchSummary, CheckReport, ProcessEvent};
use std::path::Path;
use std::time::{Duration, Instant};

/// Minimum time between two printed frame lines.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Render progress
// ============================================================================

/// Format a single pipeline event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::GlintPrepared { texture, size } => vec![format!(
            "Glint {} → {}x{} layer",
            texture.display(),
            size.width,
            size.height
        )],
        ProcessEvent::ImageStarted {
            index,
            source,
            canvas,
            frames,
            ..
        } => vec![
            format!(
                "{} {} ({}x{}, {})",
                format_index(index + 1),
                source_stem(source),
                canvas.width,
                canvas.height,
                plural(*frames as usize, "frame")
            ),
            format!("{}Source: {}", indent(1), source.display()),
        ],
        ProcessEvent::FrameGenerated { .. } => Vec::new(),
        ProcessEvent::FrameWritten { frame, frames, .. } => {
            vec![format!("{}frame {}/{}", indent(1), frame, frames)]
        }
        ProcessEvent::ImageFinished { output, kind, .. } => {
            vec![format!("{}→ {} ({})", indent(1), output.display(), kind)]
        }
        ProcessEvent::ImageFailed { error, .. } => {
            vec![format!("{}FAILED: {}", indent(1), error)]
        }
        ProcessEvent::BatchFinished { rendered, failed } => {
            let mut line = format!("Rendered {}", plural(*rendered, "image"));
            if *failed > 0 {
                line.push_str(&format!(", {} failed", failed));
            }
            vec![line]
        }
    }
}

/// Samples frame-level events so a long render prints a few lines per
/// second instead of one per frame.
///
/// Non-frame events always pass. A frame event passes when it is the last
/// frame of its image, or when at least `interval` has elapsed since the
/// previous frame line.
#[derive(Debug)]
pub struct ProgressThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl ProgressThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn should_print(&mut self, event: &ProcessEvent) -> bool {
        self.should_print_at(event, Instant::now())
    }

    /// [`should_print`](Self::should_print) with an explicit clock.
    pub fn should_print_at(&mut self, event: &ProcessEvent, now: Instant) -> bool {
        let (frame, frames) = match event {
            ProcessEvent::FrameWritten { frame, frames, .. } => (*frame, *frames),
            ProcessEvent::FrameGenerated { .. } => return false,
            ProcessEvent::ImageStarted { .. } => {
                self.last = None;
                return true;
            }
            _ => return true,
        };

        let due = match self.last {
            Some(last) => now.duration_since(last) >= self.interval,
            None => true,
        };
        if due || frame == frames {
            self.last = Some(now);
            true
        } else {
            false
        }
    }
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new(PROGRESS_INTERVAL)
    }
}

// ============================================================================
// Batch summary
// ============================================================================

/// Format the end-of-run summary: every output, then every failure.
pub fn format_batch_summary(summary: &BatchSummary) -> Vec<String> {
    let mut lines = Vec::new();
    if !summary.rendered.is_empty() {
        lines.push("Outputs".to_string());
        for (i, image) in summary.rendered.iter().enumerate() {
            lines.push(format!(
                "{} {} → {}",
                format_index(i + 1),
                source_stem(&image.source),
                image.output.display()
            ));
        }
    }
    if !summary.failed.is_empty() {
        lines.push("Failed".to_string());
        for (i, failed) in summary.failed.iter().enumerate() {
            lines.push(format!(
                "{} {}",
                format_index(i + 1),
                source_stem(&failed.source)
            ));
            lines.push(format!("{}Source: {}", indent(1), failed.source.display()));
            lines.push(format!("{}Error: {}", indent(1), failed.error));
        }
    }
    lines
}

pub fn print_batch_summary(summary: &BatchSummary) {
    for line in format_batch_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format a dry-run report: glint layer, output settings, planned canvases.
pub fn format_check_report(report: &CheckReport) -> Vec<String> {
    let mut lines = vec![
        format!("Glint layer {}x{}", report.glint.width, report.glint.height),
        format!(
            "Output {}, {}",
            report.kind,
            plural(report.frames as usize, "frame")
        ),
    ];
    for (i, (source, canvas)) in report.sources.iter().enumerate() {
        lines.push(format!(
            "{} {} → {}x{}",
            format_index(i + 1),
            source_stem(source),
            canvas.width,
            canvas.height
        ));
    }
    lines
}

pub fn print_check_report(report: &CheckReport) {
    for line in format_check_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Inspect
// ============================================================================

/// Format the outputs found in a directory with their kind and frame count.
pub fn format_inspect_output(dir: &Path, entries: &[OutputEntry]) -> Vec<String> {
    let mut lines = vec![format!("{}/", dir.display())];
    if entries.is_empty() {
        lines.push(format!("{}(no outputs)", indent(1)));
        return lines;
    }
    for entry in entries {
        let name = if entry.kind.is_container() {
            file_name(&entry.path)
        } else {
            format!("{}/", file_name(&entry.path))
        };
        let frames = match &entry.frames {
            Ok(n) => plural(*n, "frame"),
            Err(e) => format!("unreadable ({})", e),
        };
        lines.push(format!("{}{}: {}, {}", indent(1), name, entry.kind, frames));
    }
    lines
}

pub fn print_inspect_output(dir: &Path, entries: &[OutputEntry]) {
    for line in format_inspect_output(dir, entries) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::OutputKind;
    use crate::imaging::Size;
    use crate::inspect::InspectError;
    use crate::process::{FailedImage, RenderedImage};
    use std::path::PathBuf;

    fn frame(frame: u32, frames: u32) -> ProcessEvent {
        ProcessEvent::FrameWritten {
            index: 0,
            frame,
            frames,
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads_to_three_digits() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "frame"), "1 frame");
        assert_eq!(plural(0, "frame"), "0 frames");
        assert_eq!(plural(1650, "frame"), "1650 frames");
    }

    // =========================================================================
    // Process event formatting tests
    // =========================================================================

    #[test]
    fn format_glint_prepared() {
        let event = ProcessEvent::GlintPrepared {
            texture: PathBuf::from("enchanted_glint_item.png"),
            size: Size::new(256, 256),
        };
        assert_eq!(
            format_process_event(&event),
            vec!["Glint enchanted_glint_item.png → 256x256 layer"]
        );
    }

    #[test]
    fn format_image_started() {
        let event = ProcessEvent::ImageStarted {
            index: 0,
            total: 3,
            source: PathBuf::from("items/acacia_boat.png"),
            canvas: Size::new(160, 160),
            frames: 1650,
        };
        let lines = format_process_event(&event);
        assert_eq!(lines[0], "001 acacia_boat (160x160, 1650 frames)");
        assert_eq!(lines[1], "    Source: items/acacia_boat.png");
    }

    #[test]
    fn format_frame_lines() {
        assert_eq!(format_process_event(&frame(12, 40)), vec!["    frame 12/40"]);
        let generated = ProcessEvent::FrameGenerated {
            index: 0,
            frame: 12,
            frames: 40,
        };
        assert!(format_process_event(&generated).is_empty());
    }

    #[test]
    fn format_image_finished_and_failed() {
        let finished = ProcessEvent::ImageFinished {
            index: 0,
            source: PathBuf::from("boat.png"),
            output: PathBuf::from("out/boat"),
            kind: OutputKind::PngFrames,
            frames: 4,
        };
        assert_eq!(
            format_process_event(&finished),
            vec!["    → out/boat (png-frames)"]
        );

        let failed = ProcessEvent::ImageFailed {
            index: 1,
            source: PathBuf::from("sword.png"),
            error: "boom".to_string(),
        };
        assert_eq!(format_process_event(&failed), vec!["    FAILED: boom"]);
    }

    #[test]
    fn format_batch_finished() {
        let ok = ProcessEvent::BatchFinished {
            rendered: 1,
            failed: 0,
        };
        assert_eq!(format_process_event(&ok), vec!["Rendered 1 image"]);

        let mixed = ProcessEvent::BatchFinished {
            rendered: 3,
            failed: 2,
        };
        assert_eq!(format_process_event(&mixed), vec!["Rendered 3 images, 2 failed"]);
    }

    // =========================================================================
    // Throttle tests
    // =========================================================================

    #[test]
    fn throttle_passes_first_frame_and_drops_burst() {
        let mut throttle = ProgressThrottle::default();
        let t0 = Instant::now();

        assert!(throttle.should_print_at(&frame(1, 100), t0));
        assert!(!throttle.should_print_at(&frame(2, 100), t0 + Duration::from_millis(10)));
        assert!(!throttle.should_print_at(&frame(3, 100), t0 + Duration::from_millis(99)));
        assert!(throttle.should_print_at(&frame(4, 100), t0 + Duration::from_millis(100)));
    }

    #[test]
    fn throttle_always_passes_last_frame() {
        let mut throttle = ProgressThrottle::default();
        let t0 = Instant::now();

        assert!(throttle.should_print_at(&frame(1, 3), t0));
        assert!(throttle.should_print_at(&frame(3, 3), t0 + Duration::from_millis(1)));
    }

    #[test]
    fn throttle_never_drops_lifecycle_events() {
        let mut throttle = ProgressThrottle::default();
        let t0 = Instant::now();
        throttle.should_print_at(&frame(1, 10), t0);

        let done = ProcessEvent::BatchFinished {
            rendered: 1,
            failed: 0,
        };
        assert!(throttle.should_print_at(&done, t0));
    }

    #[test]
    fn throttle_resets_for_each_image() {
        let mut throttle = ProgressThrottle::default();
        let t0 = Instant::now();
        throttle.should_print_at(&frame(1, 10), t0);

        let started = ProcessEvent::ImageStarted {
            index: 1,
            total: 2,
            source: PathBuf::from("b.png"),
            canvas: Size::new(1, 1),
            frames: 10,
        };
        assert!(throttle.should_print_at(&started, t0));
        assert!(throttle.should_print_at(&frame(1, 10), t0 + Duration::from_millis(1)));
    }

    // =========================================================================
    // Summary, check and inspect tests
    // =========================================================================

    #[test]
    fn format_summary_lists_outputs_then_failures() {
        let summary = BatchSummary {
            rendered: vec![RenderedImage {
                source: PathBuf::from("items/apple.png"),
                output: PathBuf::from("out/apple.gif"),
                frames: 20,
            }],
            failed: vec![FailedImage {
                source: PathBuf::from("items/boat.png"),
                error: "bad data".to_string(),
            }],
        };
        assert_eq!(
            format_batch_summary(&summary),
            vec![
                "Outputs",
                "001 apple → out/apple.gif",
                "Failed",
                "001 boat",
                "    Source: items/boat.png",
                "    Error: bad data",
            ]
        );
    }

    #[test]
    fn format_empty_summary() {
        assert!(format_batch_summary(&BatchSummary::default()).is_empty());
    }

    #[test]
    fn format_check() {
        let report = CheckReport {
            glint: Size::new(256, 256),
            kind: OutputKind::Gif,
            frames: 1,
            sources: vec![(PathBuf::from("apple.png"), Size::new(160, 160))],
        };
        assert_eq!(
            format_check_report(&report),
            vec!["Glint layer 256x256", "Output gif, 1 frame", "001 apple → 160x160"]
        );
    }

    #[test]
    fn format_inspect_entries() {
        let entries = vec![
            OutputEntry {
                path: PathBuf::from("out/apple.webp"),
                kind: OutputKind::Webp,
                frames: Ok(1650),
            },
            OutputEntry {
                path: PathBuf::from("out/boat"),
                kind: OutputKind::PngFrames,
                frames: Ok(3),
            },
            OutputEntry {
                path: PathBuf::from("out/sword.gif"),
                kind: OutputKind::Gif,
                frames: Err(InspectError::Io(std::io::Error::other("truncated"))),
            },
        ];
        let lines = format_inspect_output(Path::new("out"), &entries);
        assert_eq!(lines[0], "out/");
        assert_eq!(lines[1], "    apple.webp: webp, 1650 frames");
        assert_eq!(lines[2], "    boat/: png-frames, 3 frames");
        assert!(lines[3].starts_with("    sword.gif: gif, unreadable ("));
    }

    #[test]
    fn format_inspect_empty_dir() {
        assert_eq!(
            format_inspect_output(Path::new("out"), &[]),
            vec!["out/", "    (no outputs)"]
        );
    }
}
