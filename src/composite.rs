use image::imageops::{self, FilterType};

use crate::{
    foundation::{
        color::{CHROMA_KEY, Rgb8},
        error::{FlipbookError, FlipbookResult},
    },
    model::{BackgroundMode, OutputSpec, SourceFrame},
};

/// One source frame rendered onto the target canvas, true-color RGB8.
///
/// Ephemeral: produced and consumed inside a single pipeline run, never
/// persisted. Alpha has already been flattened against the background
/// treatment by this point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositedFrame {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Packed RGB8 rows, `width * height * 3` bytes.
    pub rgb: Vec<u8>,
}

impl CompositedFrame {
    /// Color of the pixel at `(x, y)`. Panics on out-of-bounds (test/debug
    /// convenience; the pipeline itself iterates the raw buffer).
    pub fn pixel(&self, x: u32, y: u32) -> Rgb8 {
        let i = 3 * (y as usize * self.width as usize + x as usize);
        Rgb8::new(self.rgb[i], self.rgb[i + 1], self.rgb[i + 2])
    }
}

/// Render one source frame against the background treatment at the target
/// size.
///
/// The canvas is filled first (chroma-key sentinel in transparent mode, the
/// exact color in solid mode), then the source is stretched non-uniformly to
/// cover the full canvas with Catmull-Rom resampling and blended over the
/// fill with straight-alpha "over". Pure per-frame transform; safe to run
/// concurrently across frames.
pub fn composite(source: &SourceFrame, spec: &OutputSpec) -> FlipbookResult<CompositedFrame> {
    spec.validate()?;

    let expected = source.pixels.width() as usize * source.pixels.height() as usize * 4;
    if source.pixels.as_raw().len() != expected {
        return Err(FlipbookError::decode(format!(
            "source pixel buffer is {} bytes, expected {expected}",
            source.pixels.as_raw().len()
        )));
    }

    let fill = match spec.background {
        BackgroundMode::Transparent => CHROMA_KEY,
        BackgroundMode::Solid(color) => color,
    };

    // Stretch to fit, not letterbox: independent X/Y scale factors.
    let scaled = imageops::resize(&source.pixels, spec.width, spec.height, FilterType::CatmullRom);

    let len = spec.width as usize * spec.height as usize * 3;
    let mut rgb = Vec::new();
    rgb.try_reserve_exact(len).map_err(|e| {
        FlipbookError::resource_exhausted(format!(
            "cannot allocate {}x{} canvas: {e}",
            spec.width, spec.height
        ))
    })?;

    for px in scaled.pixels() {
        let [r, g, b, a] = px.0;
        rgb.push(over(r, fill.r, a));
        rgb.push(over(g, fill.g, a));
        rgb.push(over(b, fill.b, a));
    }

    Ok(CompositedFrame {
        width: spec.width,
        height: spec.height,
        rgb,
    })
}

/// Straight-alpha "over" for one channel, rounded.
fn over(src: u8, dst: u8, a: u8) -> u8 {
    let a = u32::from(a);
    let src = u32::from(src);
    let dst = u32::from(dst);
    ((src * a + dst * (255 - a) + 127) / 255) as u8
}

#[cfg(test)]
#[path = "../tests/unit/composite.rs"]
mod tests;
