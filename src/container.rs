use crate::{
    encode::EncodedFrameBlock,
    foundation::error::{FlipbookError, FlipbookResult},
    model::OutputSpec,
    quantize::Palette,
};

/// The assembled GIF89a byte stream.
///
/// Append-only while the assembler builds it, immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GifArtifact {
    bytes: Vec<u8>,
}

impl GifArtifact {
    /// Assembled bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the artifact, yielding the byte buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Artifact size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the artifact is empty (never true for an assembled GIF).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Sequence encoded frame blocks into a complete GIF89a byte stream.
///
/// Emission order is fixed: signature/version, logical screen descriptor,
/// global color table (if any), Netscape looping extension (only when the
/// animation has more than one frame), then per frame a graphic control
/// extension immediately followed by the image descriptor, optional local
/// color table and compressed data, and finally the trailer. Frame count and
/// order in the artifact equal the input exactly.
pub fn assemble(
    spec: &OutputSpec,
    global_palette: Option<&Palette>,
    blocks: &[EncodedFrameBlock],
) -> FlipbookResult<GifArtifact> {
    spec.validate()?;
    if blocks.is_empty() {
        return Err(FlipbookError::EmptyInput);
    }
    let width = dim_u16(spec.width)?;
    let height = dim_u16(spec.height)?;

    let mut out = Vec::new();
    out.extend_from_slice(b"GIF89a");

    // Logical screen descriptor: canvas size, global table flag/size,
    // background index 0 (the transparent slot sits at 0 by construction),
    // pixel aspect ratio 0.
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    let mut packed = 0x70u8; // color resolution 8 bits per primary
    if let Some(palette) = global_palette {
        packed |= 0x80 | table_size_field(palette.len());
    }
    out.push(packed);
    out.push(0); // background color index
    out.push(0); // pixel aspect ratio

    if let Some(palette) = global_palette {
        write_color_table(&mut out, palette);
    }

    if blocks.len() > 1 {
        // Netscape looping extension; loop count 0 = forever.
        out.extend_from_slice(&[0x21, 0xFF, 0x0B]);
        out.extend_from_slice(b"NETSCAPE2.0");
        out.extend_from_slice(&[0x03, 0x01]);
        out.extend_from_slice(&spec.repeat.to_le_bytes());
        out.push(0);
    }

    for block in blocks {
        if block.local_palette.is_none() && global_palette.is_none() {
            return Err(FlipbookError::quantization_overflow(
                "frame has neither a local nor a global color table",
            ));
        }

        // Graphic control extension.
        out.extend_from_slice(&[0x21, 0xF9, 0x04]);
        let mut gce = block.disposal.code() << 2;
        if block.transparent_index.is_some() {
            gce |= 0x01;
        }
        out.push(gce);
        out.extend_from_slice(&block.delay_centis.to_le_bytes());
        out.push(block.transparent_index.unwrap_or(0));
        out.push(0);

        // Image descriptor: every frame covers the full canvas at (0, 0),
        // interlace off.
        out.push(0x2C);
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        match &block.local_palette {
            Some(palette) => {
                out.push(0x80 | table_size_field(palette.len()));
                write_color_table(&mut out, palette);
            }
            None => out.push(0),
        }

        out.push(block.min_code_size);
        out.extend_from_slice(&block.data_sub_blocks);
    }

    out.push(0x3B);
    Ok(GifArtifact { bytes: out })
}

fn dim_u16(v: u32) -> FlipbookResult<u16> {
    u16::try_from(v).map_err(|_| {
        FlipbookError::invalid_dimension(format!("dimension {v} exceeds the GIF maximum of 65535"))
    })
}

/// Three-bit size field: table holds `2^(field + 1)` entries.
fn table_size_field(len: usize) -> u8 {
    let mut field = 0u8;
    while (2usize << field) < len {
        field += 1;
    }
    field
}

/// Write palette entries padded with black to the declared power-of-two size.
fn write_color_table(out: &mut Vec<u8>, palette: &Palette) {
    let declared = 2usize << table_size_field(palette.len());
    for color in palette.colors() {
        out.extend_from_slice(&[color.r, color.g, color.b]);
    }
    for _ in palette.len()..declared {
        out.extend_from_slice(&[0, 0, 0]);
    }
}

#[cfg(test)]
#[path = "../tests/unit/container.rs"]
mod tests;
