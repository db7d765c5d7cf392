use super::*;
use crate::model::QualityTier;

fn frame_of(colors: &[Rgb8], width: u32) -> CompositedFrame {
    assert_eq!(colors.len() as u32 % width, 0);
    let mut rgb = Vec::with_capacity(colors.len() * 3);
    for c in colors {
        rgb.extend_from_slice(&[c.r, c.g, c.b]);
    }
    CompositedFrame {
        width,
        height: colors.len() as u32 / width,
        rgb,
    }
}

#[test]
fn palette_rejects_duplicates_and_overflow() {
    let dup = vec![Rgb8::new(1, 2, 3), Rgb8::new(1, 2, 3)];
    assert!(matches!(
        Palette::new(dup, None),
        Err(FlipbookError::QuantizationOverflow(_))
    ));

    let many: Vec<Rgb8> = (0..=256u16)
        .map(|i| Rgb8::new((i % 256) as u8, (i / 256) as u8, 0))
        .collect();
    assert!(Palette::new(many, None).is_err());
}

#[test]
fn palette_transparent_slot_must_hold_the_sentinel() {
    let colors = vec![Rgb8::new(0, 0, 0), Rgb8::new(9, 9, 9)];
    assert!(Palette::new(colors.clone(), Some(0)).is_err());

    let colors = vec![CHROMA_KEY, Rgb8::new(9, 9, 9)];
    let p = Palette::new(colors, Some(0)).unwrap();
    assert_eq!(p.transparent_index(), Some(0));
}

#[test]
fn few_colors_survive_quantization_exactly() {
    let a = Rgb8::new(250, 10, 10);
    let b = Rgb8::new(10, 250, 10);
    let c = Rgb8::new(10, 10, 250);
    let frame = frame_of(&[a, b, c, a, b, c], 3);

    let (palette, indexed) = quantize(&frame, QualityTier::BEST, false).unwrap();
    assert!(palette.len() <= 4);
    for (i, expected) in [a, b, c, a, b, c].iter().enumerate() {
        let got = palette.colors()[usize::from(indexed[i])];
        assert_eq!(got, *expected, "pixel {i}");
    }
}

#[test]
fn palette_respects_the_256_bound_on_noisy_input() {
    // 32x32 gradient: 1024 distinct colors.
    let colors: Vec<Rgb8> = (0..1024u32)
        .map(|i| Rgb8::new((i % 256) as u8, (i / 4) as u8, ((i * 7) % 256) as u8))
        .collect();
    let frame = frame_of(&colors, 32);

    let (palette, indexed) = quantize(&frame, QualityTier::BEST, false).unwrap();
    assert!(palette.len() <= MAX_PALETTE);
    assert_eq!(indexed.len(), 1024);

    let mut seen = std::collections::HashSet::new();
    for &c in palette.colors() {
        assert!(seen.insert(c), "duplicate palette entry {}", c.to_hex());
    }
}

#[test]
fn transparent_reservation_caps_opaque_colors_at_255() {
    let colors: Vec<Rgb8> = (0..2048u32)
        .map(|i| Rgb8::new((i % 256) as u8, ((i / 8) % 256) as u8, 77))
        .collect();
    let frame = frame_of(&colors, 64);

    let (palette, _) = quantize(&frame, QualityTier::BEST, true).unwrap();
    assert!(palette.len() <= MAX_PALETTE);
    assert_eq!(palette.transparent_index(), Some(0));
    assert_eq!(palette.colors()[0], CHROMA_KEY);
    // Sentinel appears only in the reserved slot.
    assert!(!palette.colors()[1..].contains(&CHROMA_KEY));
}

#[test]
fn sentinel_pixels_map_to_the_reserved_index_verbatim() {
    let near_key = Rgb8::new(254, 1, 254);
    let frame = frame_of(&[CHROMA_KEY, near_key, CHROMA_KEY, near_key], 2);

    let (palette, indexed) = quantize(&frame, QualityTier::BEST, true).unwrap();
    let t = palette.transparent_index().unwrap();
    assert_eq!(indexed[0], t);
    assert_eq!(indexed[2], t);
    // A legitimate color that merely resembles the sentinel stays opaque.
    assert_ne!(indexed[1], t);
    assert_ne!(indexed[3], t);
}

#[test]
fn quantization_is_deterministic() {
    let colors: Vec<Rgb8> = (0..512u32)
        .map(|i| Rgb8::new((i * 3 % 256) as u8, (i * 5 % 256) as u8, (i * 11 % 256) as u8))
        .collect();
    let frame = frame_of(&colors, 16);

    let (p1, i1) = quantize(&frame, QualityTier::new(3), true).unwrap();
    let (p2, i2) = quantize(&frame, QualityTier::new(3), true).unwrap();
    assert_eq!(p1, p2);
    assert_eq!(i1, i2);
}

#[test]
fn global_palette_merges_all_frames() {
    let red = frame_of(&[Rgb8::new(250, 0, 0); 4], 2);
    let blue = frame_of(&[Rgb8::new(0, 0, 250); 4], 2);

    let palette = build_palette([&red, &blue], QualityTier::BEST, false).unwrap();
    let red_idx = palette.nearest(Rgb8::new(250, 0, 0));
    let blue_idx = palette.nearest(Rgb8::new(0, 0, 250));
    assert_ne!(red_idx, blue_idx);
    assert_eq!(palette.colors()[usize::from(red_idx)], Rgb8::new(250, 0, 0));
    assert_eq!(palette.colors()[usize::from(blue_idx)], Rgb8::new(0, 0, 250));
}

#[test]
fn all_sentinel_frame_still_builds_a_palette() {
    let frame = frame_of(&[CHROMA_KEY; 4], 2);

    let (palette, indexed) = quantize(&frame, QualityTier::BEST, true).unwrap();
    assert_eq!(palette.transparent_index(), Some(0));
    assert!(indexed.iter().all(|&i| i == 0));

    // Non-transparent run over the same pixels keeps them as ordinary color.
    let (palette, indexed) = quantize(&frame, QualityTier::BEST, false).unwrap();
    assert_eq!(palette.transparent_index(), None);
    assert_eq!(palette.colors()[usize::from(indexed[0])], CHROMA_KEY);
}

#[test]
fn unsampled_opaque_pixels_never_become_transparent() {
    // Tier 10 on a 10-pixel row samples only pixel 0 (sentinel); the lone
    // red pixel must still map to an opaque slot.
    let mut colors = [CHROMA_KEY; 10];
    colors[5] = Rgb8::new(200, 0, 0);
    let frame = frame_of(&colors, 10);

    let (palette, indexed) = quantize(&frame, QualityTier::new(10), true).unwrap();
    let t = palette.transparent_index().unwrap();
    assert_ne!(indexed[5], t);
    for (i, &idx) in indexed.iter().enumerate() {
        if i != 5 {
            assert_eq!(idx, t, "sentinel pixel {i}");
        }
    }
}

#[test]
fn map_indices_rejects_inconsistent_buffers() {
    let frame = CompositedFrame {
        width: 2,
        height: 2,
        rgb: vec![0; 5],
    };
    let palette = Palette::new(vec![Rgb8::new(0, 0, 0)], None).unwrap();
    assert!(map_indices(&frame, &palette).is_err());
}
