//! # Enchant Glint
//!
//! Renders the shimmering "enchanted item" effect onto static sprites. A
//! translucent glint layer is derived once from a source texture, then
//! scrolled diagonally across each sprite frame by frame and masked by the
//! sprite's own alpha, producing a seamlessly looping animation.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! ```text
//! 1. Prepare   glint texture  →  GlintLayer        (once per run)
//! 2. Compose   source + layer →  frames            (once per source)
//! 3. Encode    frames         →  gif/apng/webp or a frame directory
//! ```
//!
//! Each stage is usable on its own: [`glint::prepare_glint`],
//! [`compose::generate_frames`] / [`compose::Frames`], and
//! [`encode::write_frames`] / [`encode::open_sink`]. [`process`] chains
//! them for a batch of sources, streaming every frame from the compositor
//! straight into the encoder.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`glint`] | Stage 1: color-to-alpha, upscale, blur, brighten, fade |
//! | [`compose`] | Stage 2: scroll offsets, wraparound blits, masked composite per frame |
//! | [`encode`] | Stage 3: animated GIF/APNG/WebP containers and PNG/JPG frame sequences |
//! | [`process`] | Batch driver: glint once, then every source in order, with progress events |
//! | [`config`] | `glint.toml` loading, validation, merging over stock defaults |
//! | [`scan`] | Expands file and directory arguments into source images |
//! | [`inspect`] | Reads rendered outputs back: kind detection and frame counts |
//! | [`naming`] | Output stems, frame file names, collision-free sequence directories |
//! | [`imaging`] | Pure-Rust pixel operations behind the [`imaging::ImageBackend`] trait |
//! | [`output`] | CLI output formatting and progress throttling |
//!
//! # Design Decisions
//!
//! ## Alpha-Masked Compositing
//!
//! The glint is pasted with a per-pixel mask of `min(glint alpha, sprite
//! alpha)`. Transparent sprite pixels therefore never pick up glint, and the
//! effect hugs the sprite's silhouette without a separate mask image.
//!
//! ## Wraparound Tiling
//!
//! The sampling window moves by (−2, +2) per frame and is reduced modulo the
//! layer size, so any frame count works and the animation never runs off the
//! layer. When the window crosses the right or bottom edge it is split into
//! up to four blits (see [`imaging::plan_blits`]), planned as pure data and
//! unit tested without pixels.
//!
//! ## Streaming Encoders
//!
//! All five output kinds implement [`encode::FrameSink`]. Container metadata
//! (frame count, 50 ms delay, infinite loop) is fixed when the sink opens, so
//! a 1650-frame render keeps one frame in memory rather than the whole
//! sequence.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resampling and blurring use the `image` crate; APNG headers come
//! from the `png` crate; animated WebP is muxed from `image`'s lossless
//! frames. No system libraries, no external binaries.

pub mod compose;
pub mod config;
pub mod encode;
pub mod glint;
pub mod imaging;
pub mod inspect;
pub mod naming;
pub mod output;
pub mod process;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
