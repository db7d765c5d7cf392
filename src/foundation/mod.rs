//! Shared building blocks: the error taxonomy and the RGB color type.

/// RGB color type, hex parsing, and the chroma-key sentinel.
pub mod color;
/// Error taxonomy and result alias.
pub mod error;
