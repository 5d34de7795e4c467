//! Error types for the tracking core.
//!
//! Per-frame failures (no pixels, degenerate fit, gate rejection) are not
//! errors: the trackers report them through [`crate::UpdateOutcome`]. This
//! enum covers misuse of the API and the fitter's own failure modes.

use thiserror::Error;

/// Errors raised by the fitter, mask constructors and configuration checks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    /// The pixel set handed to the fitter was empty.
    #[error("cannot fit a polynomial to an empty pixel set")]
    EmptyPixelSet,

    /// Fewer than three distinct rows, the quadratic is under-determined.
    #[error("degenerate fit: {distinct_rows} distinct rows, need at least 3")]
    DegenerateFit { distinct_rows: usize },

    /// x and y coordinate slices have different lengths.
    #[error("coordinate length mismatch: {xs} x values, {ys} y values")]
    LengthMismatch { xs: usize, ys: usize },

    /// The least-squares solve did not produce finite coefficients.
    #[error("least-squares solve failed: {0}")]
    SolveFailed(String),

    /// A tunable is out of its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Mask dimensions are unusable (zero-sized, or mismatched with a frame).
    #[error("invalid mask shape: {width}x{height}")]
    InvalidMask { width: usize, height: usize },
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, TrackError>;
