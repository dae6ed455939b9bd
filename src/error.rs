//! Error type shared by every pipeline stage.

use thiserror::Error;

/// Failure of a spectrum-extraction stage.
///
/// Every stage reports errors synchronously to its caller. The pipeline never
/// feeds the output of a failed stage into the next one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpectrumError {
    /// The supplied buffer violates the rectangular / fixed-channel invariant.
    #[error("malformed buffer: {0}")]
    MalformedBuffer(String),

    /// Border cropping removed every remaining row or column.
    #[error("buffer exhausted while cropping: no pixel exceeds the deletion threshold {threshold}")]
    ExhaustedBuffer { threshold: u32 },

    /// Too few bright pixels to fit a trace line.
    #[error("insufficient trace points: found {found}, need at least 2")]
    InsufficientPoints { found: usize },

    /// Enough points were found but the least-squares system has no unique solution.
    #[error("degenerate trace fit: {0}")]
    DegenerateFit(String),
}

/// Result alias for the core pipeline.
pub type Result<T> = std::result::Result<T, SpectrumError>;
