//! Flipbook turns an ordered set of still images into a single animated GIF.
//!
//! The whole codec is owned end-to-end: no wrapped GIF library. Each stage is
//! an independently testable pure-data transform, composed by the pipeline.
//!
//! # Pipeline overview
//!
//! 1. **Composite**: `SourceFrame + OutputSpec -> CompositedFrame` (stretch to
//!    the target canvas over the background treatment)
//! 2. **Quantize**: `CompositedFrame -> (Palette, indexed pixels)` (median-cut,
//!    ≤256 colors, optional reserved transparent slot)
//! 3. **Encode**: indexed pixels `-> EncodedFrameBlock` (GIF-variant LZW,
//!    sub-block framing, per-frame delay/disposal)
//! 4. **Assemble**: blocks `-> GifArtifact` (GIF89a container byte layout)
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic**: identical inputs produce byte-identical artifacts,
//!   regardless of worker-pool parallelism.
//! - **No partial output**: a failed or cancelled run surfaces one terminal
//!   error and no artifact.
//! - **Clean slate per run**: no palette, buffer, or worker state survives
//!   between runs.
//!
//! # Getting started
//!
//! ```no_run
//! use flipbook::{EncodeOptions, OutputSpec, SourceFrame, render_gif};
//!
//! # fn main() -> flipbook::FlipbookResult<()> {
//! let image = image::RgbaImage::from_pixel(64, 64, image::Rgba([200, 40, 40, 255]));
//! let frames = vec![SourceFrame::new(image, 0.5)?];
//! let spec = OutputSpec::auto_from_frame(&frames[0]);
//! let gif = render_gif(&frames, &spec, &EncodeOptions::default(), &|p| {
//!     eprintln!("progress {p:.2}");
//! })?;
//! std::fs::write("out.gif", gif.bytes()).map_err(anyhow::Error::from)?;
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod composite;
mod container;
mod encode;
mod foundation;
mod model;
mod pipeline;
mod quantize;

pub use composite::{CompositedFrame, composite};
pub use container::{GifArtifact, assemble};
pub use encode::{DisposalMethod, EncodedFrameBlock, encode_frame, lzw};
pub use foundation::color::{CHROMA_KEY, Rgb8};
pub use foundation::error::{FlipbookError, FlipbookResult};
pub use model::{BackgroundMode, OutputSpec, PaletteMode, QualityTier, SourceFrame};
pub use pipeline::{CancelToken, EncodeOptions, EncodeThreading, render_gif};
pub use quantize::{MAX_PALETTE, Palette, build_palette, map_indices, quantize};
