//! Quadratic lane-boundary model and its least-squares fitter.
//!
//! Boundaries are near-vertical in the top-down view, so the curve is
//! expressed as `x(y)` with the row as the independent variable.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};
use crate::tracker::mask::PixelSet;

/// Singular values below this are treated as zero by the solver.
const SVD_EPS: f64 = 1e-12;

/// Second-order polynomial `x = a·y² + b·y + c` in pixel units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LaneFit {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl LaneFit {
    #[inline]
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    /// Column of the curve at row `y`.
    #[inline]
    pub fn eval(&self, y: f64) -> f64 {
        self.a * y * y + self.b * y + self.c
    }

    /// Column of the curve for every row `0..height`.
    pub fn sample_rows(&self, height: usize) -> Vec<f64> {
        (0..height).map(|y| self.eval(y as f64)).collect()
    }

    /// Coefficient-wise mean. `None` for an empty slice.
    pub fn mean_of<'a, I>(fits: I) -> Option<LaneFit>
    where
        I: IntoIterator<Item = &'a LaneFit>,
    {
        let mut sum = [0.0; 3];
        let mut n = 0usize;
        for fit in fits {
            sum[0] += fit.a;
            sum[1] += fit.b;
            sum[2] += fit.c;
            n += 1;
        }
        if n == 0 {
            return None;
        }
        let n = n as f64;
        Some(LaneFit::new(sum[0] / n, sum[1] / n, sum[2] / n))
    }
}

/// Least-squares quadratic through `(xs[i], ys[i])`, fitting x as a function of y.
///
/// The row coordinate is normalised by its largest magnitude before the
/// solve so the design matrix stays well conditioned for tall masks.
pub fn fit_quadratic(xs: &[f64], ys: &[f64]) -> Result<LaneFit> {
    if xs.len() != ys.len() {
        return Err(TrackError::LengthMismatch {
            xs: xs.len(),
            ys: ys.len(),
        });
    }
    if xs.is_empty() {
        return Err(TrackError::EmptyPixelSet);
    }

    let distinct_rows = count_distinct(ys);
    if distinct_rows < 3 {
        return Err(TrackError::DegenerateFit { distinct_rows });
    }

    let scale = ys.iter().fold(0.0_f64, |m, y| m.max(y.abs()));
    let scale = if scale > 0.0 { scale } else { 1.0 };

    let design = DMatrix::from_fn(ys.len(), 3, |i, j| {
        let t = ys[i] / scale;
        match j {
            0 => t * t,
            1 => t,
            _ => 1.0,
        }
    });
    let rhs = DVector::from_column_slice(xs);

    let svd = design.svd(true, true);
    let coeffs = svd
        .solve(&rhs, SVD_EPS)
        .map_err(|e| TrackError::SolveFailed(e.to_string()))?;

    let fit = LaneFit::new(
        coeffs[0] / (scale * scale),
        coeffs[1] / scale,
        coeffs[2],
    );
    if !(fit.a.is_finite() && fit.b.is_finite() && fit.c.is_finite()) {
        return Err(TrackError::SolveFailed("non-finite coefficients".to_string()));
    }
    Ok(fit)
}

/// Fit a pixel set collected by one of the locator strategies.
pub fn fit_pixels(pixels: &PixelSet) -> Result<LaneFit> {
    let xs: Vec<f64> = pixels.xs.iter().map(|&x| x as f64).collect();
    let ys: Vec<f64> = pixels.ys.iter().map(|&y| y as f64).collect();
    fit_quadratic(&xs, &ys)
}

fn count_distinct(values: &[f64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted.len()
}
