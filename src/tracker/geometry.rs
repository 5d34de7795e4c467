//! Metric geometry derived from a lane fit: curvature radius and lateral offsets.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};
use crate::tracker::polyfit::LaneFit;

/// Below this `|2A|` (metric units) the boundary is considered straight.
const STRAIGHT_EPSILON: f64 = 1e-9;

/// Pixel-to-meter conversion of the top-down view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelScale {
    /// Meters per pixel along x (across the lane).
    pub xm_per_pix: f64,
    /// Meters per pixel along y (along the road).
    pub ym_per_pix: f64,
}

impl Default for PixelScale {
    fn default() -> Self {
        // 3.7 m lane width over ~700 px, ~30 m of road over 720 rows
        Self {
            xm_per_pix: 3.7 / 700.0,
            ym_per_pix: 30.0 / 720.0,
        }
    }
}

impl PixelScale {
    pub fn new(xm_per_pix: f64, ym_per_pix: f64) -> Self {
        Self {
            xm_per_pix,
            ym_per_pix,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if !ok(self.xm_per_pix) || !ok(self.ym_per_pix) {
            return Err(TrackError::InvalidConfig(format!(
                "pixel scale must be finite and positive, got x={} y={}",
                self.xm_per_pix, self.ym_per_pix
            )));
        }
        Ok(())
    }
}

/// Radius of curvature, with an explicit variant for a straight boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Curvature {
    /// Finite radius in meters.
    Radius(f64),
    /// Leading coefficient is (numerically) zero: infinite radius.
    Straight,
}

impl Curvature {
    /// Radius in meters, `None` when straight.
    pub fn meters(&self) -> Option<f64> {
        match self {
            Self::Radius(r) => Some(*r),
            Self::Straight => None,
        }
    }

    pub fn is_straight(&self) -> bool {
        matches!(self, Self::Straight)
    }

    /// Absolute difference between two radii.
    ///
    /// Two straight boundaries agree exactly; a straight boundary against a
    /// curved one is infinitely far apart.
    pub fn delta(&self, other: &Curvature) -> f64 {
        match (self, other) {
            (Self::Radius(a), Self::Radius(b)) => (a - b).abs(),
            (Self::Straight, Self::Straight) => 0.0,
            _ => f64::INFINITY,
        }
    }
}

impl fmt::Display for Curvature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Radius(r) => write!(f, "{} m", r.trunc() as i64),
            Self::Straight => write!(f, "straight"),
        }
    }
}

/// Curvature radius at the bottom row of `fit`, in meters.
///
/// Coefficients are rescaled to metric units first:
/// `A = a·xm/ym²`, `B = b·xm/ym`, evaluated at `y = y_max·ym`.
pub fn curvature_radius(fit: &LaneFit, y_max: f64, scale: &PixelScale) -> Curvature {
    let xm = scale.xm_per_pix;
    let ym = scale.ym_per_pix;
    let a = fit.a * xm / (ym * ym);
    let b = fit.b * xm / ym;
    let y_eval = y_max * ym;

    let denom = (2.0 * a).abs();
    if denom < STRAIGHT_EPSILON {
        return Curvature::Straight;
    }
    let radius = (1.0 + (2.0 * a * y_eval + b).powi(2)).powf(1.5) / denom;
    if radius.is_finite() {
        Curvature::Radius(radius)
    } else {
        Curvature::Straight
    }
}

/// Which of the two reference rows an offset was measured at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OffsetRow {
    /// Last row of the image, closest to the vehicle.
    Bottom,
    /// First row of the image.
    Top,
}

impl OffsetRow {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::Bottom => 0,
            Self::Top => 1,
        }
    }
}

/// Curvature and lateral positions of one boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineGeometry {
    pub curverad: Curvature,
    /// Lateral position in meters at `[bottom row, top row]`.
    pub dist: [f64; 2],
}

impl LineGeometry {
    pub fn from_fit(fit: &LaneFit, image_height: usize, scale: &PixelScale) -> Self {
        let y_max = image_height.saturating_sub(1) as f64;
        Self {
            curverad: curvature_radius(fit, y_max, scale),
            dist: [
                fit.eval(y_max) * scale.xm_per_pix,
                fit.eval(0.0) * scale.xm_per_pix,
            ],
        }
    }

    #[inline]
    pub fn offset(&self, row: OffsetRow) -> f64 {
        self.dist[row.index()]
    }
}
