//! Sanity gate comparing a candidate fit's geometry against the tracked one.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};
use crate::tracker::geometry::{LineGeometry, OffsetRow};

/// Why a frame's candidate was not taken into the history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    /// The locator found no qualifying pixels.
    LocatorEmpty,
    /// The pixels span fewer than three rows.
    FitDegenerate { distinct_rows: usize },
    /// The least-squares solve produced no usable coefficients.
    FitFailed,
    /// Curvature radius moved more than the tolerance (meters).
    CurvatureJump { delta: f64 },
    /// Lateral offset at `row` moved more than the tolerance (meters).
    OffsetJump { row: OffsetRow, delta: f64 },
}

impl RejectReason {
    /// Whether the rejection came from the gate rather than from the locator/fitter.
    pub fn is_gate(&self) -> bool {
        matches!(self, Self::CurvatureJump { .. } | Self::OffsetJump { .. })
    }
}

/// Frame-to-frame continuity tolerances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SanityGate {
    /// Maximum curvature radius change in meters.
    pub max_curvature_delta: f64,
    /// Maximum lateral offset change in meters, per reference row.
    pub max_offset_delta: f64,
}

impl Default for SanityGate {
    fn default() -> Self {
        Self {
            max_curvature_delta: 150.0,
            max_offset_delta: 0.2,
        }
    }
}

impl SanityGate {
    pub fn validate(&self) -> Result<()> {
        if !(self.max_curvature_delta >= 0.0 && self.max_offset_delta >= 0.0) {
            return Err(TrackError::InvalidConfig(format!(
                "gate tolerances must be non-negative, got curvature={} offset={}",
                self.max_curvature_delta, self.max_offset_delta
            )));
        }
        Ok(())
    }

    /// Accept `candidate` unless it departs too far from `reference`.
    ///
    /// Curvature is checked first, then the bottom offset, then the top one.
    pub fn check(
        &self,
        reference: &LineGeometry,
        candidate: &LineGeometry,
    ) -> std::result::Result<(), RejectReason> {
        let delta = candidate.curverad.delta(&reference.curverad);
        if delta > self.max_curvature_delta {
            return Err(RejectReason::CurvatureJump { delta });
        }

        for row in [OffsetRow::Bottom, OffsetRow::Top] {
            let delta = (candidate.offset(row) - reference.offset(row)).abs();
            if delta > self.max_offset_delta {
                return Err(RejectReason::OffsetJump { row, delta });
            }
        }
        Ok(())
    }
}
