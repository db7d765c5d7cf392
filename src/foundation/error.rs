/// Convenience result type used across flipbook.
pub type FlipbookResult<T> = Result<T, FlipbookError>;

/// Top-level error taxonomy used by pipeline APIs.
///
/// Every failed run surfaces exactly one of these; no partial artifact is
/// ever returned alongside an error.
#[derive(thiserror::Error, Debug)]
pub enum FlipbookError {
    /// No source frames were supplied; the pipeline never starts.
    #[error("no input frames: add at least one image before encoding")]
    EmptyInput,

    /// Non-positive or otherwise unusable target dimensions.
    #[error("invalid dimension: {0}")]
    InvalidDimension(String),

    /// A source image's pixel data is absent, truncated, or inconsistent.
    #[error("decode error: {0}")]
    Decode(String),

    /// Internal quantizer invariant violation (not user-triggerable).
    #[error("quantization overflow: {0}")]
    QuantizationOverflow(String),

    /// A palette with more than 256 entries reached the encoder,
    /// a contract violation by the caller.
    #[error("palette too large: {0} colors (max 256)")]
    PaletteTooLarge(usize),

    /// Allocation failure while buffering frames.
    #[error("out of resources: {0}; reduce the frame count or target dimensions")]
    ResourceExhausted(String),

    /// Caller-initiated abort via [`CancelToken`](crate::CancelToken).
    #[error("encoding cancelled")]
    Cancelled,

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FlipbookError {
    /// Build a [`FlipbookError::InvalidDimension`] value.
    pub fn invalid_dimension(msg: impl Into<String>) -> Self {
        Self::InvalidDimension(msg.into())
    }

    /// Build a [`FlipbookError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`FlipbookError::QuantizationOverflow`] value.
    pub fn quantization_overflow(msg: impl Into<String>) -> Self {
        Self::QuantizationOverflow(msg.into())
    }

    /// Build a [`FlipbookError::ResourceExhausted`] value.
    pub fn resource_exhausted(msg: impl Into<String>) -> Self {
        Self::ResourceExhausted(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
