use super::*;
use crate::foundation::color::{CHROMA_KEY, Rgb8};

fn palette(n: usize) -> Palette {
    let colors: Vec<Rgb8> = (0..n).map(|i| Rgb8::new(i as u8, 0, 0)).collect();
    Palette::new(colors, None).unwrap()
}

#[test]
fn disposal_codes_match_gif89a() {
    assert_eq!(DisposalMethod::Keep.code(), 1);
    assert_eq!(DisposalMethod::RestoreToBackground.code(), 2);
}

#[test]
fn block_carries_frame_metadata() {
    let p = palette(4);
    let block = encode_frame(&[0, 1, 2, 3], &p, 50, None, DisposalMethod::Keep, true).unwrap();
    assert_eq!(block.delay_centis, 50);
    assert_eq!(block.disposal, DisposalMethod::Keep);
    assert_eq!(block.transparent_index, None);
    assert_eq!(block.min_code_size, 2);
    assert_eq!(block.local_palette.as_ref().map(Palette::len), Some(4));
}

#[test]
fn global_mode_omits_the_local_table() {
    let p = palette(4);
    let block = encode_frame(&[0, 1], &p, 10, None, DisposalMethod::Keep, false).unwrap();
    assert!(block.local_palette.is_none());
}

#[test]
fn transparent_runs_carry_the_reserved_index() {
    let p = Palette::new(vec![CHROMA_KEY, Rgb8::new(5, 5, 5)], Some(0)).unwrap();
    let block = encode_frame(
        &[0, 1, 0, 1],
        &p,
        20,
        p.transparent_index(),
        DisposalMethod::RestoreToBackground,
        true,
    )
    .unwrap();
    assert_eq!(block.transparent_index, Some(0));
    assert_eq!(block.disposal, DisposalMethod::RestoreToBackground);
}

#[test]
fn sub_blocks_are_length_prefixed_and_terminated() {
    let p = palette(2);
    let indexed = vec![0u8; 5000];
    let block = encode_frame(&indexed, &p, 1, None, DisposalMethod::Keep, true).unwrap();

    // Walk the sub-block chain; it must cover the buffer exactly.
    let data = &block.data_sub_blocks;
    let mut i = 0;
    let mut payload = 0usize;
    loop {
        let len = usize::from(data[i]);
        i += 1;
        if len == 0 {
            break;
        }
        payload += len;
        i += len;
    }
    assert_eq!(i, data.len());
    assert!(payload > 0);
    // Every block except the last is full.
    assert!(data[0] == 255 || payload < 255);
}

#[test]
fn out_of_range_index_is_rejected() {
    let p = palette(4);
    let err = encode_frame(&[0, 7], &p, 1, None, DisposalMethod::Keep, true).unwrap_err();
    assert!(matches!(err, FlipbookError::QuantizationOverflow(_)));
}
