use std::collections::HashMap;

use crate::{
    composite::CompositedFrame,
    foundation::{
        color::{CHROMA_KEY, Rgb8},
        error::{FlipbookError, FlipbookResult},
    },
    model::QualityTier,
};

/// Maximum number of entries a GIF color table can hold.
pub const MAX_PALETTE: usize = 256;

/// Ordered set of at most 256 colors, optionally with one reserved
/// transparent slot.
///
/// Invariants: no duplicate entries; when a transparent slot is reserved it
/// holds the chroma-key sentinel verbatim and sits at index 0, so the
/// logical screen descriptor's background index points at it for free.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb8>,
    transparent_index: Option<u8>,
}

impl Palette {
    /// Build a palette from an explicit color list.
    ///
    /// When `transparent_index` is set, that slot must hold the sentinel.
    /// Rejects oversized lists and duplicate entries.
    pub fn new(colors: Vec<Rgb8>, transparent_index: Option<u8>) -> FlipbookResult<Self> {
        if colors.is_empty() {
            return Err(FlipbookError::quantization_overflow("empty palette"));
        }
        if colors.len() > MAX_PALETTE {
            return Err(FlipbookError::quantization_overflow(format!(
                "{} colors exceed the {MAX_PALETTE}-entry ceiling",
                colors.len()
            )));
        }
        let mut seen = HashMap::with_capacity(colors.len());
        for (i, &c) in colors.iter().enumerate() {
            if seen.insert(c, i).is_some() {
                return Err(FlipbookError::quantization_overflow(format!(
                    "duplicate palette entry {} at index {i}",
                    c.to_hex()
                )));
            }
        }
        if let Some(t) = transparent_index {
            match colors.get(usize::from(t)) {
                Some(&c) if c == CHROMA_KEY => {}
                _ => {
                    return Err(FlipbookError::quantization_overflow(
                        "transparent slot does not hold the chroma-key sentinel",
                    ));
                }
            }
        }
        Ok(Self {
            colors,
            transparent_index,
        })
    }

    /// Palette entries in index order.
    pub fn colors(&self) -> &[Rgb8] {
        &self.colors
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether the palette has no entries (never true for a built palette).
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Reserved transparent index, if any.
    pub fn transparent_index(&self) -> Option<u8> {
        self.transparent_index
    }

    /// Index of the entry nearest to `color`, skipping the transparent slot.
    ///
    /// Ties break toward the lower index, which keeps mapping deterministic
    /// regardless of how the palette was built.
    pub fn nearest(&self, color: Rgb8) -> u8 {
        let mut best = 0u8;
        let mut best_d = u32::MAX;
        for (i, &c) in self.colors.iter().enumerate() {
            if self.transparent_index == Some(i as u8) {
                continue;
            }
            let d = color.distance_sq(c);
            if d < best_d {
                best_d = d;
                best = i as u8;
            }
        }
        best
    }
}

/// Reduce one composited frame to a palette and indexed pixels.
///
/// Equivalent to [`build_palette`] over the single frame followed by
/// [`map_indices`].
pub fn quantize(
    frame: &CompositedFrame,
    quality: QualityTier,
    reserve_transparent: bool,
) -> FlipbookResult<(Palette, Vec<u8>)> {
    let palette = build_palette(std::iter::once(frame), quality, reserve_transparent)?;
    let indexed = map_indices(frame, &palette)?;
    Ok((palette, indexed))
}

/// Build one palette from a merged, tier-sampled histogram of the given
/// frames.
///
/// Deterministic median-cut: the box with the widest single-channel range is
/// split at its weighted median until the entry budget is reached or every
/// box is a single color. Sentinel pixels never enter the histogram when a
/// transparent slot is reserved; the slot holds the sentinel verbatim at
/// index 0.
#[tracing::instrument(skip(frames), level = "debug")]
pub fn build_palette<'a>(
    frames: impl IntoIterator<Item = &'a CompositedFrame>,
    quality: QualityTier,
    reserve_transparent: bool,
) -> FlipbookResult<Palette> {
    let step = quality.sample_step();
    let mut histogram: HashMap<Rgb8, u64> = HashMap::new();
    for frame in frames {
        let pixels = frame.rgb.chunks_exact(3);
        for chunk in pixels.step_by(step) {
            let c = Rgb8::new(chunk[0], chunk[1], chunk[2]);
            if reserve_transparent && c == CHROMA_KEY {
                continue;
            }
            *histogram.entry(c).or_insert(0) += 1;
        }
    }

    let budget = if reserve_transparent {
        MAX_PALETTE - 1
    } else {
        MAX_PALETTE
    };

    // Sorted unique colors so box building never depends on hash order.
    let mut colors: Vec<(Rgb8, u64)> = histogram.into_iter().collect();
    colors.sort_unstable_by_key(|&(c, _)| c);

    let mut opaque = median_cut(colors, budget);

    // Averaging two boxes can coincide on one color, and in transparent mode
    // an average may land on the sentinel itself. Both would break the
    // no-duplicates invariant, so drop collisions here.
    if reserve_transparent {
        opaque.retain(|&c| c != CHROMA_KEY);
    }
    opaque.dedup();

    if reserve_transparent {
        let mut colors = Vec::with_capacity(opaque.len() + 1);
        colors.push(CHROMA_KEY);
        if opaque.is_empty() {
            // Coarse sampling can miss every opaque pixel. Keep one opaque
            // entry so nearest-color mapping never lands on the transparent
            // slot.
            colors.push(Rgb8::new(0, 0, 0));
        }
        colors.extend(opaque);
        Palette::new(colors, Some(0))
    } else if opaque.is_empty() {
        // All pixels were sentinel-colored in a non-transparent run; keep a
        // one-entry palette rather than failing.
        Palette::new(vec![CHROMA_KEY], None)
    } else {
        Palette::new(opaque, None)
    }
}

/// Map every pixel of `frame` through `palette`.
///
/// Sentinel pixels go verbatim to the reserved transparent index when one
/// exists; everything else goes through nearest-color search with a memo so
/// repeated colors are resolved once.
pub fn map_indices(frame: &CompositedFrame, palette: &Palette) -> FlipbookResult<Vec<u8>> {
    let n = frame.width as usize * frame.height as usize;
    if frame.rgb.len() != n * 3 {
        return Err(FlipbookError::quantization_overflow(format!(
            "composited buffer is {} bytes, expected {}",
            frame.rgb.len(),
            n * 3
        )));
    }

    let mut indexed = Vec::new();
    indexed.try_reserve_exact(n).map_err(|e| {
        FlipbookError::resource_exhausted(format!("cannot allocate index buffer: {e}"))
    })?;

    let mut memo: HashMap<Rgb8, u8> = HashMap::new();
    for chunk in frame.rgb.chunks_exact(3) {
        let c = Rgb8::new(chunk[0], chunk[1], chunk[2]);
        let idx = if palette.transparent_index().is_some() && c == CHROMA_KEY {
            // Never through nearest-color search: a legitimate pixel that
            // merely resembles the sentinel must not become transparent,
            // and the sentinel itself must not leak into an opaque slot.
            palette.transparent_index().unwrap_or(0)
        } else {
            *memo.entry(c).or_insert_with(|| palette.nearest(c))
        };
        indexed.push(idx);
    }
    Ok(indexed)
}

/// One median-cut box: a contiguous run of the sorted color list.
struct CutBox {
    colors: Vec<(Rgb8, u64)>,
}

impl CutBox {
    /// Channel with the widest range and that range's width.
    fn widest_channel(&self) -> (Channel, u8) {
        let (mut rmin, mut rmax) = (u8::MAX, u8::MIN);
        let (mut gmin, mut gmax) = (u8::MAX, u8::MIN);
        let (mut bmin, mut bmax) = (u8::MAX, u8::MIN);
        for &(c, _) in &self.colors {
            rmin = rmin.min(c.r);
            rmax = rmax.max(c.r);
            gmin = gmin.min(c.g);
            gmax = gmax.max(c.g);
            bmin = bmin.min(c.b);
            bmax = bmax.max(c.b);
        }
        let (r, g, b) = (rmax - rmin, gmax - gmin, bmax - bmin);
        if r >= g && r >= b {
            (Channel::R, r)
        } else if g >= b {
            (Channel::G, g)
        } else {
            (Channel::B, b)
        }
    }

    /// Split at the weighted median along `channel`. Both halves are
    /// non-empty for any box spanning more than one color.
    fn split(mut self, channel: Channel) -> (CutBox, CutBox) {
        self.colors.sort_unstable_by_key(|&(c, _)| (channel.of(c), c));
        let total: u64 = self.colors.iter().map(|&(_, n)| n).sum();
        let mut acc = 0u64;
        let mut cut = self.colors.len() - 1;
        for (i, &(_, n)) in self.colors.iter().enumerate() {
            acc += n;
            if acc * 2 >= total {
                cut = i + 1;
                break;
            }
        }
        let cut = cut.clamp(1, self.colors.len() - 1);
        let right = self.colors.split_off(cut);
        (CutBox { colors: self.colors }, CutBox { colors: right })
    }

    /// Population-weighted average color, rounded.
    fn average(&self) -> Rgb8 {
        let mut r = 0u64;
        let mut g = 0u64;
        let mut b = 0u64;
        let mut total = 0u64;
        for &(c, n) in &self.colors {
            r += u64::from(c.r) * n;
            g += u64::from(c.g) * n;
            b += u64::from(c.b) * n;
            total += n;
        }
        if total == 0 {
            return Rgb8::new(0, 0, 0);
        }
        let round = |v: u64| ((v + total / 2) / total) as u8;
        Rgb8::new(round(r), round(g), round(b))
    }
}

/// Color channel selector for median-cut splits.
#[derive(Clone, Copy)]
enum Channel {
    R,
    G,
    B,
}

impl Channel {
    fn of(self, c: Rgb8) -> u8 {
        match self {
            Channel::R => c.r,
            Channel::G => c.g,
            Channel::B => c.b,
        }
    }
}

/// Split the sorted color list into at most `budget` boxes and average each.
///
/// Returns the box averages sorted and deduplicated, so the palette layout
/// depends only on the input ordering.
fn median_cut(colors: Vec<(Rgb8, u64)>, budget: usize) -> Vec<Rgb8> {
    if colors.is_empty() {
        return Vec::new();
    }
    let mut boxes = vec![CutBox { colors }];
    while boxes.len() < budget {
        // Widest box next; on ties the first candidate wins, keeping the
        // cut order deterministic.
        let mut pick: Option<(usize, u8)> = None;
        for (i, b) in boxes.iter().enumerate() {
            let (_, range) = b.widest_channel();
            if range == 0 {
                continue;
            }
            if pick.map(|(_, best)| range > best).unwrap_or(true) {
                pick = Some((i, range));
            }
        }
        let Some((i, _)) = pick else { break };
        let bx = boxes.swap_remove(i);
        let (channel, _) = bx.widest_channel();
        let (left, right) = bx.split(channel);
        boxes.push(left);
        boxes.push(right);
    }

    let mut out: Vec<Rgb8> = boxes.iter().map(CutBox::average).collect();
    out.sort_unstable();
    out.dedup();
    out
}

#[cfg(test)]
#[path = "../tests/unit/quantize.rs"]
mod tests;
