//! Binary lane mask, pixel sets and search-window rectangles.

use ndarray::{Array2, Axis, s};

use crate::error::{Result, TrackError};

/// Which half of the top-down view a boundary lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneSide {
    Left,
    Right,
}

/// Single-channel top-down mask of candidate lane pixels.
///
/// Stored row-major as `[row, col]`, so `y` indexes the first axis and `x`
/// the second. Row 0 is the top of the image (far from the vehicle).
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask {
    data: Array2<bool>,
}

impl BinaryMask {
    /// Create an all-off mask.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: Array2::from_elem((height, width), false),
        }
    }

    /// Wrap a boolean array laid out as `[row, col]`.
    pub fn from_array(data: Array2<bool>) -> Result<Self> {
        let (height, width) = data.dim();
        if width == 0 || height == 0 {
            return Err(TrackError::InvalidMask { width, height });
        }
        Ok(Self { data })
    }

    /// Threshold a byte image: any non-zero value is "on".
    pub fn from_u8(data: &Array2<u8>) -> Result<Self> {
        Self::from_array(data.mapv(|v| v != 0))
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// Pixel value at column `x`, row `y`. Out-of-bounds reads are off.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data.get((y, x)).copied().unwrap_or(false)
    }

    /// Set a pixel. Out-of-bounds writes are ignored.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, on: bool) {
        if let Some(px) = self.data.get_mut((y, x)) {
            *px = on;
        }
    }

    pub fn count_on(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    pub fn as_array(&self) -> &Array2<bool> {
        &self.data
    }

    /// Number of on pixels per column over rows `from_row..height`.
    pub fn column_histogram(&self, from_row: usize) -> Vec<usize> {
        let from_row = from_row.min(self.height());
        self.data
            .slice(s![from_row.., ..])
            .map_axis(Axis(0), |col| col.iter().filter(|&&v| v).count())
            .to_vec()
    }

    /// Copy of the mask with every column outside `side`'s half cleared.
    ///
    /// Coordinates are left untouched so left and right fits share the
    /// full-frame pixel space.
    pub fn side(&self, side: LaneSide) -> BinaryMask {
        let midpoint = self.width() / 2;
        let mut data = self.data.clone();
        match side {
            LaneSide::Left => data.slice_mut(s![.., midpoint..]).fill(false),
            LaneSide::Right => data.slice_mut(s![.., ..midpoint]).fill(false),
        }
        BinaryMask { data }
    }

    /// Iterate over on pixels as `(x, y)` in row-major order.
    pub fn on_pixels(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.data
            .indexed_iter()
            .filter(|&(_, &v)| v)
            .map(|((y, x), _)| (x, y))
    }
}

/// Pixel coordinates collected for one boundary in one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PixelSet {
    pub xs: Vec<usize>,
    pub ys: Vec<usize>,
}

impl PixelSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, x: usize, y: usize) {
        self.xs.push(x);
        self.ys.push(y);
    }

    pub fn extend(&mut self, other: PixelSet) {
        self.xs.extend(other.xs);
        self.ys.extend(other.ys);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Number of distinct rows present; a quadratic needs at least three.
    pub fn distinct_rows(&self) -> usize {
        let mut rows = self.ys.clone();
        rows.sort_unstable();
        rows.dedup();
        rows.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }
}

/// One band of the sliding-window search, kept for debug overlays.
///
/// Bounds are half-open: `x_low <= x < x_high`, `y_low <= y < y_high`.
/// `x_low` may be negative when the window hangs over the left edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub x_low: isize,
    pub x_high: isize,
    pub y_low: usize,
    pub y_high: usize,
    /// Pixels collected inside this window.
    pub hits: usize,
}

impl SearchWindow {
    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        let xi = x as isize;
        y >= self.y_low && y < self.y_high && xi >= self.x_low && xi < self.x_high
    }

    /// Horizontal centre the window was placed at.
    #[inline]
    pub fn center_x(&self) -> isize {
        (self.x_low + self.x_high) / 2
    }
}
