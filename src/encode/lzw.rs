use std::collections::HashMap;

/// Hard ceiling on GIF LZW code width.
const MAX_WIDTH: u32 = 12;

/// First code that can never be assigned (4096 entries at 12 bits).
const MAX_CODES: u16 = 1 << MAX_WIDTH;

/// Minimum LZW code size for a palette of `palette_len` entries.
///
/// `ceil(log2(len))`, floored at 2 as the GIF89a format requires.
pub fn min_code_size(palette_len: usize) -> u8 {
    let mut bits = 2u8;
    while (1usize << bits) < palette_len {
        bits += 1;
    }
    bits
}

/// Compress palette indices into a GIF-variant LZW code stream.
///
/// Returns the packed bytes only (no sub-block framing): codes are emitted
/// LSB-first, starting at `min_code_size + 1` bits and growing up to 12; the
/// clear code (`1 << min_code_size`) opens the stream and resets the string
/// table whenever it fills, and the end-of-information code closes it.
pub fn compress(min_code_size: u8, indices: &[u8]) -> Vec<u8> {
    let clear: u16 = 1 << min_code_size;
    let eoi: u16 = clear + 1;
    let init_width = u32::from(min_code_size) + 1;

    let mut out = BitWriter::default();
    let mut width = init_width;
    let mut table: HashMap<(u16, u8), u16> = HashMap::new();
    let mut next: u16 = eoi + 1;

    out.write(clear, width);

    let Some((&first, rest)) = indices.split_first() else {
        out.write(eoi, width);
        return out.finish();
    };
    let mut prefix = u16::from(first);

    for &k in rest {
        if let Some(&code) = table.get(&(prefix, k)) {
            prefix = code;
            continue;
        }

        out.write(prefix, width);
        // The width check mirrors the decoder: it runs after every emitted
        // code, against the next free slot before this iteration's insert.
        if u32::from(next) > (1 << width) - 1 && width < MAX_WIDTH {
            width += 1;
        }

        if next < MAX_CODES {
            table.insert((prefix, k), next);
            next += 1;
        } else {
            // Table full: reset, at the old width, then start over.
            out.write(clear, width);
            table.clear();
            next = eoi + 1;
            width = init_width;
        }
        prefix = u16::from(k);
    }

    out.write(prefix, width);
    if u32::from(next) > (1 << width) - 1 && width < MAX_WIDTH {
        width += 1;
    }
    out.write(eoi, width);
    out.finish()
}

/// LSB-first bit packer.
#[derive(Default)]
struct BitWriter {
    acc: u32,
    nbits: u32,
    out: Vec<u8>,
}

impl BitWriter {
    fn write(&mut self, code: u16, width: u32) {
        self.acc |= u32::from(code) << self.nbits;
        self.nbits += width;
        while self.nbits >= 8 {
            self.out.push(self.acc as u8);
            self.acc >>= 8;
            self.nbits -= 8;
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.nbits > 0 {
            self.out.push(self.acc as u8);
        }
        self.out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/lzw.rs"]
mod tests;
