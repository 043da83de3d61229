//! Render configuration.
//!
//! Handles loading, validating, and merging `glint.toml`. Stock defaults are
//! the base layer; a user file overrides only the keys it names, and
//! command-line flags override both.
//!
//! ## Config File Location
//!
//! `glint.toml` in the working directory is picked up automatically.
//! `--config <PATH>` names a file explicitly (which must then exist).
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [glint]
//! texture = "enchanted_glint_item.png"  # Glint source texture
//! scale = 4                 # Upscale factor of the glint layer (2-8)
//! blur_sigma = 3.0          # Gaussian blur of the upscaled layer
//! brightness = 1.2          # RGB multiplier after blurring
//!
//! [glint.alpha]
//! reference = [112, 68, 159]  # Color that maps to full opacity
//! span = [138, 76, 207]       # Per-channel distance normalizer
//! weight = 85.0               # Alpha lost per unit of distance
//!
//! [animation]
//! frames = 1650             # Frames per source image (1-114514)
//! input_scale = 10          # Nearest-neighbour upscale of each source (1-20)
//!
//! [output]
//! format = "webp"           # gif | apng | webp | png-frames | jpg-frames
//! directory = "."           # Must already exist
//! jpeg_quality = 90         # jpg-frames only (1-100)
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! continue_on_error = false # Skip sources that fail instead of aborting
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [output]
//! format = "gif"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::encode::{EncodeOptions, OutputKind};
use crate::glint::{ColorDistanceAlpha, GlintParams};
use crate::imaging::Quality;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE: &str = "glint.toml";

/// Accepted `glint.scale` values.
pub const GLINT_SCALE_RANGE: std::ops::RangeInclusive<u32> = 2..=8;

/// Accepted `animation.input_scale` values.
pub const INPUT_SCALE_RANGE: std::ops::RangeInclusive<u32> = 1..=20;

/// Accepted `animation.frames` values.
pub const FRAMES_RANGE: std::ops::RangeInclusive<u32> = 1..=114_514;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Render configuration loaded from `glint.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlintConfig {
    /// Glint texture and layer preparation.
    pub glint: GlintSection,
    /// Frame count and source upscale.
    pub animation: AnimationConfig,
    /// Output kind and destination.
    pub output: OutputConfig,
    /// Parallelism and failure policy.
    pub processing: ProcessingConfig,
}

impl GlintConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Validation(msg.into()));

        if !GLINT_SCALE_RANGE.contains(&self.glint.scale) {
            return invalid("glint.scale must be 2-8");
        }
        if !self.glint.blur_sigma.is_finite() || self.glint.blur_sigma < 0.0 {
            return invalid("glint.blur_sigma must be a non-negative number");
        }
        if !self.glint.brightness.is_finite() || self.glint.brightness < 0.0 {
            return invalid("glint.brightness must be a non-negative number");
        }
        if self.glint.alpha.span.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return invalid("glint.alpha.span values must be non-zero");
        }
        if !self.glint.alpha.weight.is_finite()
            || self.glint.alpha.reference.iter().any(|r| !r.is_finite())
        {
            return invalid("glint.alpha values must be finite numbers");
        }
        if !FRAMES_RANGE.contains(&self.animation.frames) {
            return invalid("animation.frames must be 1-114514");
        }
        if !INPUT_SCALE_RANGE.contains(&self.animation.input_scale) {
            return invalid("animation.input_scale must be 1-20");
        }
        if !(1..=100).contains(&self.output.jpeg_quality) {
            return invalid("output.jpeg_quality must be 1-100");
        }
        if self.processing.max_processes == Some(0) {
            return invalid("processing.max_processes must be at least 1");
        }
        Ok(())
    }

    /// Layer preparation parameters.
    pub fn glint_params(&self) -> GlintParams {
        GlintParams {
            scale: self.glint.scale,
            blur_sigma: self.glint.blur_sigma,
            brightness: self.glint.brightness,
        }
    }

    /// Color-to-alpha calibration.
    pub fn alpha_mapping(&self) -> ColorDistanceAlpha {
        ColorDistanceAlpha {
            reference: self.glint.alpha.reference,
            span: self.glint.alpha.span,
            weight: self.glint.alpha.weight,
        }
    }

    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            jpeg_quality: Quality::new(self.output.jpeg_quality),
        }
    }
}

/// Glint texture and layer preparation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlintSection {
    /// Path of the glint source texture, relative to the working directory.
    pub texture: PathBuf,
    /// Integer upscale factor; the layer's size is the texture's times this.
    pub scale: u32,
    /// Gaussian blur standard deviation in layer pixels.
    pub blur_sigma: f32,
    /// RGB multiplier applied after blurring.
    pub brightness: f32,
    /// Color-to-alpha calibration constants.
    pub alpha: AlphaConfig,
}

impl Default for GlintSection {
    fn default() -> Self {
        let params = GlintParams::default();
        Self {
            texture: PathBuf::from("enchanted_glint_item.png"),
            scale: params.scale,
            blur_sigma: params.blur_sigma,
            brightness: params.brightness,
            alpha: AlphaConfig::default(),
        }
    }
}

/// Constants of the color-distance alpha model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlphaConfig {
    pub reference: [f32; 3],
    pub span: [f32; 3],
    pub weight: f32,
}

impl Default for AlphaConfig {
    fn default() -> Self {
        let stock = ColorDistanceAlpha::enchantment();
        Self {
            reference: stock.reference,
            span: stock.span,
            weight: stock.weight,
        }
    }
}

/// Animation length and source scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnimationConfig {
    /// Frames rendered per source image.
    pub frames: u32,
    /// Nearest-neighbour upscale factor applied to each source before compositing.
    pub input_scale: u32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            frames: 1650,
            input_scale: 10,
        }
    }
}

/// Output kind and destination directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub format: OutputKind,
    /// Destination directory. Must exist before rendering starts.
    pub directory: PathBuf,
    /// JPEG quality for `jpg-frames`.
    pub jpeg_quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputKind::Webp,
            directory: PathBuf::from("."),
            jpeg_quality: Quality::default().value(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
    /// Report a failing source and carry on with the rest of the batch.
    pub continue_on_error: bool,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Values given on the command line. `None` leaves the config value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub texture: Option<PathBuf>,
    pub glint_scale: Option<u32>,
    pub frames: Option<u32>,
    pub input_scale: Option<u32>,
    pub format: Option<OutputKind>,
    pub output_dir: Option<PathBuf>,
    pub continue_on_error: bool,
}

impl ConfigOverrides {
    /// Apply overrides on top of `config` and re-validate the result.
    pub fn apply(self, mut config: GlintConfig) -> Result<GlintConfig, ConfigError> {
        if let Some(texture) = self.texture {
            config.glint.texture = texture;
        }
        if let Some(scale) = self.glint_scale {
            config.glint.scale = scale;
        }
        if let Some(frames) = self.frames {
            config.animation.frames = frames;
        }
        if let Some(input_scale) = self.input_scale {
            config.animation.input_scale = input_scale;
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(dir) = self.output_dir {
            config.output.directory = dir;
        }
        config.processing.continue_on_error |= self.continue_on_error;
        config.validate()?;
        Ok(config)
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(GlintConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<GlintConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: GlintConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `glint.toml` from the given directory, or stock defaults if absent.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<GlintConfig, ConfigError> {
    let overlay = load_raw_config(&dir.join(CONFIG_FILE))?;
    resolve_config(stock_defaults_value()?, overlay)
}

/// Load an explicitly named config file. A missing file is an error.
pub fn load_config_file(path: &Path) -> Result<GlintConfig, ConfigError> {
    let overlay =
        load_raw_config(path)?.ok_or_else(|| ConfigError::NotFound(path.to_path_buf()))?;
    resolve_config(stock_defaults_value()?, Some(overlay))
}

/// Returns a fully-commented stock `glint.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Enchant Glint Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Save as glint.toml in the working directory, or pass --config <PATH>.
# Command-line flags override values from this file.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Glint layer
# ---------------------------------------------------------------------------
[glint]
# Glint source texture. Relative paths resolve against the working directory.
texture = "enchanted_glint_item.png"

# Integer upscale of the texture. The layer repeats every texture size
# times this many pixels. 2-8.
scale = 4

# Gaussian blur applied to the upscaled layer, in pixels.
blur_sigma = 3.0

# RGB multiplier after blurring. Alpha is halved regardless.
brightness = 1.2

# Color-to-alpha calibration. A pixel's alpha is
#   255 - weight * sum((reference - color) / span)
# clamped to 0-255. The defaults fit the vanilla glint texture.
[glint.alpha]
reference = [112, 68, 159]
span = [138, 76, 207]
weight = 85.0

# ---------------------------------------------------------------------------
# Animation
# ---------------------------------------------------------------------------
[animation]
# Frames rendered per source image (1-114514). Containers play at 20 fps.
frames = 1650

# Nearest-neighbour upscale applied to every source before compositing (1-20).
input_scale = 10

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# One of: gif, apng, webp, png-frames, jpg-frames
format = "webp"

# Destination directory. Must already exist.
directory = "."

# JPEG quality for jpg-frames (1-100).
jpeg_quality = 90

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers. Omit to use all CPU cores.
# max_processes = 4

# Report a source that fails to load or encode and continue with the rest.
continue_on_error = false
"##
}
