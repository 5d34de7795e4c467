//! Pixel locator strategies: blind sliding-window scan and margin search.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TrackError};
use crate::tracker::mask::{BinaryMask, PixelSet, SearchWindow};
use crate::tracker::polyfit::LaneFit;

/// Half-width of the band searched around a known curve, in pixels.
pub const DEFAULT_SEARCH_MARGIN: f64 = 100.0;

/// Tunables for the blind sliding-window search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlidingWindowParams {
    /// Number of horizontal bands the mask is split into.
    pub nwindows: usize,
    /// Half-width of each window in pixels.
    pub margin: usize,
    /// A window recenters the next one only with more hits than this.
    pub minpix: usize,
}

impl Default for SlidingWindowParams {
    fn default() -> Self {
        Self {
            nwindows: 9,
            margin: 100,
            minpix: 50,
        }
    }
}

impl SlidingWindowParams {
    pub fn new(nwindows: usize, margin: usize, minpix: usize) -> Self {
        Self {
            nwindows,
            margin,
            minpix,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.nwindows == 0 {
            return Err(TrackError::InvalidConfig(
                "nwindows must be at least 1".to_string(),
            ));
        }
        if self.margin == 0 {
            return Err(TrackError::InvalidConfig(
                "window margin must be at least 1 pixel".to_string(),
            ));
        }
        Ok(())
    }
}

/// Regions a search inspected, for debug overlays.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchTrace {
    /// Sliding windows, bottom band first.
    Windows(Vec<SearchWindow>),
    /// Band of `±margin` columns around `fit`.
    Band { fit: LaneFit, margin: f64 },
}

/// Pixels and search regions of one frame, kept when debug output is enabled.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchDebug {
    pub trace: SearchTrace,
    pub pixels: PixelSet,
}

/// Result of a blind search.
#[derive(Debug, Clone, Default)]
pub struct BlindSearch {
    pub pixels: PixelSet,
    pub windows: Vec<SearchWindow>,
}

/// Scan the mask bottom-up in `nwindows` bands, following the pixel density.
///
/// The first window is seeded at the column with the most on pixels in the
/// bottom half of the mask. Bands that collect nothing leave the position
/// unchanged and contribute nothing.
pub fn blind_search(mask: &BinaryMask, params: &SlidingWindowParams) -> BlindSearch {
    let width = mask.width();
    let height = mask.height();
    let nwindows = params.nwindows.max(1);
    let margin = params.margin as isize;
    let window_height = height / nwindows;

    let histogram = mask.column_histogram(height / 2);
    let mut x_current = argmax(&histogram) as isize;
    debug!(seed = x_current, window_height, "blind search seeded");

    let mut result = BlindSearch {
        pixels: PixelSet::new(),
        windows: Vec::with_capacity(nwindows),
    };

    for window in 0..nwindows {
        let y_low = height - (window + 1) * window_height;
        let y_high = height - window * window_height;
        let x_low = x_current - margin;
        let x_high = x_current + margin;

        let col_start = x_low.max(0) as usize;
        let col_end = (x_high.max(0) as usize).min(width);

        let mut hits = PixelSet::new();
        for y in y_low..y_high {
            for x in col_start..col_end {
                if mask.get(x, y) {
                    hits.push(x, y);
                }
            }
        }

        result.windows.push(SearchWindow {
            x_low,
            x_high,
            y_low,
            y_high,
            hits: hits.len(),
        });

        if hits.len() > params.minpix {
            let sum: usize = hits.xs.iter().sum();
            x_current = (sum as f64 / hits.len() as f64) as isize;
        }
        result.pixels.extend(hits);
    }

    debug!(
        pixels = result.pixels.len(),
        windows = result.windows.len(),
        "blind search finished"
    );
    result
}

/// Every on pixel strictly within `±margin` columns of `fit`.
pub fn margin_search(mask: &BinaryMask, fit: &LaneFit, margin: f64) -> PixelSet {
    let mut pixels = PixelSet::new();
    for (x, y) in mask.on_pixels() {
        let center = fit.eval(y as f64);
        let xf = x as f64;
        if xf > center - margin && xf < center + margin {
            pixels.push(x, y);
        }
    }
    pixels
}

/// Index of the first maximum, 0 for an empty or all-zero histogram.
fn argmax(values: &[usize]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}
