//! Builder for synthetic binary masks.

use crate::tracker::{BinaryMask, LaneFit};

/// Builder for drawing lane-like shapes into a [`BinaryMask`].
///
/// Useful for exercising the tracker without a camera pipeline.
#[derive(Debug, Clone)]
pub struct MaskBuilder {
    mask: BinaryMask,
}

impl MaskBuilder {
    /// Start from an all-off mask.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            mask: BinaryMask::new(width, height),
        }
    }

    /// Set a single pixel.
    pub fn point(mut self, x: usize, y: usize) -> Self {
        self.mask.set(x, y, true);
        self
    }

    /// Full-height vertical line at column `x`.
    pub fn vertical_line(mut self, x: usize) -> Self {
        for y in 0..self.mask.height() {
            self.mask.set(x, y, true);
        }
        self
    }

    /// Curve `x = fit(y)` drawn `thickness` pixels wide, centred on the curve.
    ///
    /// Rows where the curve leaves the mask are skipped.
    pub fn curve(mut self, fit: &LaneFit, thickness: usize) -> Self {
        let half = (thickness.max(1) as f64 - 1.0) / 2.0;
        for y in 0..self.mask.height() {
            let center = fit.eval(y as f64);
            if !center.is_finite() {
                continue;
            }
            let start = (center - half).round();
            let end = (center + half).round().min(self.mask.width() as f64 - 1.0);
            if end < 0.0 {
                continue;
            }
            let mut x = start.max(0.0) as usize;
            while (x as f64) <= end {
                self.mask.set(x, y, true);
                x += 1;
            }
        }
        self
    }

    /// Filled rectangle over `x0..x1` × `y0..y1`.
    pub fn rect(mut self, x0: usize, y0: usize, x1: usize, y1: usize) -> Self {
        for y in y0..y1 {
            for x in x0..x1 {
                self.mask.set(x, y, true);
            }
        }
        self
    }

    /// Break everything drawn so far into dashes: `on_rows` kept, `off_rows`
    /// cleared, repeating from the top row.
    pub fn dashed(mut self, on_rows: usize, off_rows: usize) -> Self {
        let period = on_rows + off_rows;
        if period == 0 || off_rows == 0 {
            return self;
        }
        for y in 0..self.mask.height() {
            if y % period >= on_rows {
                for x in 0..self.mask.width() {
                    self.mask.set(x, y, false);
                }
            }
        }
        self
    }

    /// Build the final mask.
    pub fn build(self) -> BinaryMask {
        self.mask
    }
}
