use image::RgbaImage;

use crate::foundation::{
    color::Rgb8,
    error::{FlipbookError, FlipbookResult},
};

/// One decoded still image plus its display duration.
///
/// Ordering among source frames is significant and caller-controlled: the
/// pipeline never reorders them. The pixel buffer is read-only for the
/// duration of a run.
#[derive(Clone, Debug)]
pub struct SourceFrame {
    /// Decoded straight-alpha RGBA pixels at the image's natural size.
    pub pixels: RgbaImage,
    /// Display duration in seconds. Always > 0.
    pub duration_secs: f64,
}

impl SourceFrame {
    /// Wrap a decoded image with its display duration.
    ///
    /// Rejects non-positive or non-finite durations and empty pixel buffers.
    pub fn new(pixels: RgbaImage, duration_secs: f64) -> FlipbookResult<Self> {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(FlipbookError::decode(format!(
                "frame duration must be a positive number of seconds, got {duration_secs}"
            )));
        }
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(FlipbookError::decode("source frame has no pixels"));
        }
        Ok(Self {
            pixels,
            duration_secs,
        })
    }

    /// Display duration in GIF centiseconds, rounded to nearest.
    ///
    /// A positive duration never collapses to zero: anything below 5ms is
    /// clamped up to 1cs so the frame remains visible to conforming players.
    pub fn delay_centis(&self) -> u16 {
        let cs = (self.duration_secs * 100.0).round();
        let cs = cs.clamp(1.0, f64::from(u16::MAX));
        cs as u16
    }
}

/// Background treatment applied behind every composited frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundMode {
    /// Fill with the chroma-key sentinel and mark it transparent in the
    /// output (see [`crate::CHROMA_KEY`]).
    Transparent,
    /// Fill with an exact solid color.
    Solid(Rgb8),
}

/// Palette-build thoroughness, `1..=10`.
///
/// Tier 1 samples every pixel when building the palette (best fidelity,
/// slowest); higher tiers sample progressively fewer pixels. Every pixel is
/// always mapped through the finished palette, so the tier affects fidelity
/// and speed but never the palette size bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct QualityTier(u8);

impl QualityTier {
    /// Best fidelity, slowest.
    pub const BEST: Self = Self(1);

    /// Construct a tier, clamping into the valid `1..=10` range.
    pub fn new(tier: u8) -> Self {
        Self(tier.clamp(1, 10))
    }

    /// Histogram sampling step: tier `t` inspects every `t`-th pixel.
    /// Never zero, even for a tier deserialized from out-of-range data.
    pub fn sample_step(self) -> usize {
        usize::from(self.0).max(1)
    }
}

impl Default for QualityTier {
    fn default() -> Self {
        Self::BEST
    }
}

/// Palette strategy, fixed for a whole run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteMode {
    /// One local color table per frame. Best per-frame fidelity, larger
    /// files; the behavior of the original pipeline.
    #[default]
    PerFrame,
    /// One global color table built from a merged sample of all frames.
    /// Smaller files, no palette flicker, some fidelity loss.
    Global,
}

/// Target output configuration for one encoding run.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OutputSpec {
    /// Target canvas width in pixels. Must be > 0.
    pub width: u32,
    /// Target canvas height in pixels. Must be > 0.
    pub height: u32,
    /// Loop count: 0 = loop forever, N = play N+1 times total.
    pub repeat: u16,
    /// Background treatment behind every frame.
    pub background: BackgroundMode,
    /// Palette-build thoroughness.
    #[serde(default)]
    pub quality: QualityTier,
    /// Palette strategy for the run.
    #[serde(default)]
    pub palette: PaletteMode,
}

impl OutputSpec {
    /// Spec with explicit dimensions and defaults elsewhere
    /// (infinite loop, transparent background, best quality, per-frame
    /// palettes).
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            repeat: 0,
            background: BackgroundMode::Transparent,
            quality: QualityTier::default(),
            palette: PaletteMode::default(),
        }
    }

    /// Spec sized from the first source frame's natural dimensions,
    /// matching the original "auto size" behavior.
    pub fn auto_from_frame(frame: &SourceFrame) -> Self {
        Self::new(frame.pixels.width(), frame.pixels.height())
    }

    /// Reject unusable dimensions before any frame work starts.
    pub fn validate(&self) -> FlipbookResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FlipbookError::invalid_dimension(format!(
                "target dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.width > u32::from(u16::MAX) || self.height > u32::from(u16::MAX) {
            return Err(FlipbookError::invalid_dimension(format!(
                "target dimensions must fit the GIF maximum of 65535, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Whether the run reserves a transparent palette slot.
    pub fn transparent(&self) -> bool {
        matches!(self.background, BackgroundMode::Transparent)
    }
}

#[cfg(test)]
#[path = "../tests/unit/model.rs"]
mod tests;
