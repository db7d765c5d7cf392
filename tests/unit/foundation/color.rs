use super::*;

#[test]
fn hex_parse_roundtrip() {
    let c = Rgb8::from_hex("#3fa0c8").unwrap();
    assert_eq!(c, Rgb8::new(0x3F, 0xA0, 0xC8));
    assert_eq!(c.to_hex(), "#3fa0c8");

    // Leading '#' is optional.
    assert_eq!(Rgb8::from_hex("ffffff").unwrap(), Rgb8::new(255, 255, 255));
}

#[test]
fn hex_parse_rejects_malformed() {
    for bad in ["", "#fff", "#gggggg", "#ffffffff", "magenta"] {
        assert!(Rgb8::from_hex(bad).is_err(), "accepted {bad:?}");
    }
}

#[test]
fn chroma_key_is_magenta() {
    assert_eq!(CHROMA_KEY, Rgb8::new(0xFF, 0x00, 0xFF));
}

#[test]
fn distance_is_symmetric_and_zero_on_self() {
    let a = Rgb8::new(10, 20, 30);
    let b = Rgb8::new(13, 16, 30);
    assert_eq!(a.distance_sq(a), 0);
    assert_eq!(a.distance_sq(b), b.distance_sq(a));
    assert_eq!(a.distance_sq(b), 9 + 16);
}

#[test]
fn serde_uses_hex_string_form() {
    let json = serde_json::to_string(&Rgb8::new(255, 0, 128)).unwrap();
    assert_eq!(json, "\"#ff0080\"");
    let back: Rgb8 = serde_json::from_str(&json).unwrap();
    assert_eq!(back, Rgb8::new(255, 0, 128));
}
