use crate::foundation::error::{FlipbookError, FlipbookResult};

/// Opaque RGB8 color.
///
/// The GIF color model has no per-entry alpha; transparency is expressed
/// through a reserved palette index instead (see [`crate::Palette`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rgb8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

/// Chroma-key sentinel used to mark background pixels in transparent mode.
///
/// Magenta `#FF00FF`, the key color the original pipeline fills the canvas
/// with before drawing. A source pixel that legitimately equals this color
/// becomes transparent too; that approximation is kept, not fixed.
pub const CHROMA_KEY: Rgb8 = Rgb8 {
    r: 0xFF,
    g: 0x00,
    b: 0xFF,
};

impl Rgb8 {
    /// Construct from channel values.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` (or `rrggbb`) hex string.
    pub fn from_hex(s: &str) -> FlipbookResult<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(FlipbookError::decode(format!(
                "expected '#rrggbb' hex color, got '{s}'"
            )));
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        Ok(Self {
            r: channel(0).map_err(|e| FlipbookError::decode(e.to_string()))?,
            g: channel(2).map_err(|e| FlipbookError::decode(e.to_string()))?,
            b: channel(4).map_err(|e| FlipbookError::decode(e.to_string()))?,
        })
    }

    /// Format as a `#rrggbb` hex string.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Squared Euclidean distance in RGB space.
    pub fn distance_sq(self, other: Self) -> u32 {
        let d = |a: u8, b: u8| {
            let d = i32::from(a) - i32::from(b);
            (d * d) as u32
        };
        d(self.r, other.r) + d(self.g, other.g) + d(self.b, other.b)
    }
}

impl serde::Serialize for Rgb8 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Rgb8 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        Rgb8::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/color.rs"]
mod tests;
