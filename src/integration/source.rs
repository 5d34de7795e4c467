//! Trait for the camera-side collaborator that produces top-down masks.

use ndarray::Array2;

use crate::tracker::BinaryMask;

/// Produces the rectified, top-down binary lane mask for a raw frame.
///
/// Implementations own camera undistortion, the perspective warp and the
/// gradient/colour thresholding; the tracker only sees the resulting mask.
///
/// # Example
///
/// ```ignore
/// use lanetrack_rs::{BinaryMask, MaskSource};
///
/// struct Warper {
///     // calibration, warp matrices, thresholds
/// }
///
/// impl MaskSource for Warper {
///     type Error = std::io::Error;
///
///     fn top_down_mask(&mut self, frame: &[u8], width: u32, height: u32) -> Result<BinaryMask, Self::Error> {
///         // undistort, warp, threshold
///         Ok(BinaryMask::new(width as usize, height as usize))
///     }
/// }
/// ```
pub trait MaskSource {
    /// Error type for preprocessing failures.
    type Error;

    /// Turn raw frame bytes into a top-down binary mask.
    ///
    /// # Arguments
    /// * `frame` - Raw image bytes (format depends on implementation)
    /// * `width` - Frame width in pixels
    /// * `height` - Frame height in pixels
    fn top_down_mask(
        &mut self,
        frame: &[u8],
        width: u32,
        height: u32,
    ) -> Result<BinaryMask, Self::Error>;
}

/// Conversion of thresholding outputs into a [`BinaryMask`].
pub trait IntoMask {
    fn into_mask(self) -> crate::Result<BinaryMask>;
}

impl IntoMask for BinaryMask {
    fn into_mask(self) -> crate::Result<BinaryMask> {
        Ok(self)
    }
}

impl IntoMask for Array2<bool> {
    fn into_mask(self) -> crate::Result<BinaryMask> {
        BinaryMask::from_array(self)
    }
}

impl IntoMask for Array2<u8> {
    fn into_mask(self) -> crate::Result<BinaryMask> {
        BinaryMask::from_u8(&self)
    }
}
