//! Per-frame GIF encoding: LZW compression plus the frame's control
//! metadata, bundled into an immutable [`EncodedFrameBlock`] for the
//! container assembler.

/// GIF-variant LZW compression.
pub mod lzw;

use crate::{
    foundation::error::{FlipbookError, FlipbookResult},
    quantize::{MAX_PALETTE, Palette},
};

/// How a conforming player treats the canvas after a frame's delay elapses.
///
/// Fixed per run: restore-to-background when transparency is enabled (so the
/// next frame's transparent areas show through cleanly), keep otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisposalMethod {
    /// Leave the frame in place ("do not dispose").
    Keep,
    /// Clear the frame's region to the background before the next frame.
    RestoreToBackground,
}

impl DisposalMethod {
    /// Three-bit disposal field value for the graphic control extension.
    pub fn code(self) -> u8 {
        match self {
            DisposalMethod::Keep => 1,
            DisposalMethod::RestoreToBackground => 2,
        }
    }
}

/// One frame, compressed and ready for container assembly.
///
/// Immutable once produced; the assembler only reads it.
#[derive(Clone, Debug)]
pub struct EncodedFrameBlock {
    /// Local color table, present in per-frame palette mode.
    pub local_palette: Option<Palette>,
    /// LZW minimum code size byte that precedes the data sub-blocks.
    pub min_code_size: u8,
    /// Compressed pixel data, already chunked into length-prefixed
    /// sub-blocks and terminated by a zero-length block.
    pub data_sub_blocks: Vec<u8>,
    /// Display delay in centiseconds.
    pub delay_centis: u16,
    /// Disposal method for the graphic control extension.
    pub disposal: DisposalMethod,
    /// Transparent color index, when the run reserves one.
    pub transparent_index: Option<u8>,
}

/// LZW-compress one quantized frame and bundle its control metadata.
///
/// `include_local_table` is set in per-frame palette mode; in global mode
/// the palette travels once in the logical screen instead. [`Palette`]
/// already enforces the 256-entry ceiling, so [`FlipbookError::PaletteTooLarge`]
/// signals a caller contract violation, not a user-facing condition.
pub fn encode_frame(
    indexed: &[u8],
    palette: &Palette,
    delay_centis: u16,
    transparent_index: Option<u8>,
    disposal: DisposalMethod,
    include_local_table: bool,
) -> FlipbookResult<EncodedFrameBlock> {
    if palette.len() > MAX_PALETTE {
        return Err(FlipbookError::PaletteTooLarge(palette.len()));
    }
    if let Some(&bad) = indexed.iter().find(|&&i| usize::from(i) >= palette.len()) {
        return Err(FlipbookError::quantization_overflow(format!(
            "pixel index {bad} out of range for a {}-entry palette",
            palette.len()
        )));
    }

    let min_code_size = lzw::min_code_size(palette.len());
    let compressed = lzw::compress(min_code_size, indexed);

    Ok(EncodedFrameBlock {
        local_palette: include_local_table.then(|| palette.clone()),
        min_code_size,
        data_sub_blocks: into_sub_blocks(&compressed),
        delay_centis,
        disposal,
        transparent_index,
    })
}

/// Chunk a byte stream into ≤255-byte sub-blocks, each prefixed with its
/// length, terminated by a zero-length block.
fn into_sub_blocks(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 255 + 2);
    for chunk in data.chunks(255) {
        out.push(chunk.len() as u8);
        out.extend_from_slice(chunk);
    }
    out.push(0);
    out
}

#[cfg(test)]
#[path = "../../tests/unit/encode/frame.rs"]
mod tests;
