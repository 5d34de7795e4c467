//! Two-boundary lane tracker driven by full-width masks.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::tracker::gate::SanityGate;
use crate::tracker::geometry::{LineGeometry, PixelScale};
use crate::tracker::line_tracker::{LineConfig, LineReport, LineTracker};
use crate::tracker::locator::SlidingWindowParams;
use crate::tracker::mask::{BinaryMask, LaneSide};

/// Configuration for the [`LaneTracker`], shared by both boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub nwindows: usize,
    pub margin: usize,
    pub minpix: usize,
    pub search_margin: f64,
    pub xm_per_pix: f64,
    pub ym_per_pix: f64,
    pub history_len: usize,
    pub max_rejections: u32,
    pub max_curvature_delta: f64,
    pub max_offset_delta: f64,
    pub debug: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::from_line_config(&LineConfig::default())
    }
}

impl TrackerConfig {
    pub fn from_line_config(line: &LineConfig) -> Self {
        Self {
            nwindows: line.window.nwindows,
            margin: line.window.margin,
            minpix: line.window.minpix,
            search_margin: line.search_margin,
            xm_per_pix: line.scale.xm_per_pix,
            ym_per_pix: line.scale.ym_per_pix,
            history_len: line.history_len,
            max_rejections: line.max_rejections,
            max_curvature_delta: line.gate.max_curvature_delta,
            max_offset_delta: line.gate.max_offset_delta,
            debug: line.debug,
        }
    }

    pub fn line_config(&self) -> LineConfig {
        LineConfig {
            window: SlidingWindowParams::new(self.nwindows, self.margin, self.minpix),
            search_margin: self.search_margin,
            scale: PixelScale::new(self.xm_per_pix, self.ym_per_pix),
            gate: SanityGate {
                max_curvature_delta: self.max_curvature_delta,
                max_offset_delta: self.max_offset_delta,
            },
            history_len: self.history_len,
            max_rejections: self.max_rejections,
            debug: self.debug,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.line_config().validate()
    }
}

/// Output of one [`LaneTracker::update`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneEstimate {
    pub frame_id: u64,
    pub left: LineReport,
    pub right: LineReport,
    /// Car position metric in meters: the sum of both boundaries' bottom-row
    /// distances from the image centre. Positive reads as right of centre.
    pub center_offset: Option<f64>,
}

impl LaneEstimate {
    /// Both boundaries produced an accepted fit this frame.
    pub fn both_found(&self) -> bool {
        self.left.found && self.right.found
    }

    pub fn annotation(&self) -> LaneAnnotation {
        LaneAnnotation {
            left: self.left.geometry,
            right: self.right.geometry,
            center_offset: self.center_offset,
        }
    }
}

/// Text burned into the output frame by the overlay renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneAnnotation {
    pub left: Option<LineGeometry>,
    pub right: Option<LineGeometry>,
    pub center_offset: Option<f64>,
}

impl LaneAnnotation {
    /// One string per overlay line.
    pub fn lines(&self) -> [String; 3] {
        let radius = |g: Option<LineGeometry>| match g {
            Some(g) => g.curverad.to_string(),
            None => "n/a".to_string(),
        };
        let position = match self.center_offset {
            Some(offset) => {
                let side = if offset > 0.0 { "right" } else { "left" };
                format!(
                    "Car is {:.2} m to the {} of the center of the lane",
                    offset.abs(),
                    side
                )
            }
            None => "Car position unknown".to_string(),
        };
        [
            format!("Left radius of curvature: {}", radius(self.left)),
            format!("Right radius of curvature: {}", radius(self.right)),
            position,
        ]
    }
}

impl fmt::Display for LaneAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [left, right, position] = self.lines();
        write!(f, "{left}\n{right}\n{position}")
    }
}

/// Tracks the left and right boundaries of the ego lane.
#[derive(Debug, Clone)]
pub struct LaneTracker {
    left: LineTracker,
    right: LineTracker,
    frame_id: u64,
    config: TrackerConfig,
}

impl Default for LaneTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl LaneTracker {
    pub fn new(config: TrackerConfig) -> Self {
        let line = config.line_config();
        Self {
            left: LineTracker::new(line.clone()),
            right: LineTracker::new(line),
            frame_id: 0,
            config,
        }
    }

    pub fn try_new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    pub fn left(&self) -> &LineTracker {
        &self.left
    }

    pub fn right(&self) -> &LineTracker {
        &self.right
    }

    pub fn line(&self, side: LaneSide) -> &LineTracker {
        match side {
            LaneSide::Left => &self.left,
            LaneSide::Right => &self.right,
        }
    }

    fn line_mut(&mut self, side: LaneSide) -> &mut LineTracker {
        match side {
            LaneSide::Left => &mut self.left,
            LaneSide::Right => &mut self.right,
        }
    }

    /// Split a full-width mask at its midpoint and update both boundaries.
    pub fn update(&mut self, mask: &BinaryMask) -> LaneEstimate {
        let left_mask = mask.side(LaneSide::Left);
        let right_mask = mask.side(LaneSide::Right);
        self.update_sides(&left_mask, &right_mask)
    }

    /// Update both boundaries from masks the caller already isolated per side.
    ///
    /// Both masks must share the same full-frame dimensions.
    pub fn update_sides(&mut self, left_mask: &BinaryMask, right_mask: &BinaryMask) -> LaneEstimate {
        self.frame_id += 1;

        let left = self.left.update(left_mask);
        let right = self.right.update(right_mask);
        let center_offset = center_offset(&left, &right, left_mask, self.config.xm_per_pix);

        debug!(
            frame = self.frame_id,
            left = ?left.outcome,
            right = ?right.outcome,
            ?center_offset,
            "lane frame processed"
        );

        LaneEstimate {
            frame_id: self.frame_id,
            left,
            right,
            center_offset,
        }
    }

    /// Forward a "line lost" notification to one boundary.
    pub fn mark_lost(&mut self, side: LaneSide, mask: &BinaryMask) -> LineReport {
        let isolated = mask.side(side);
        self.line_mut(side).mark_lost(&isolated)
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
        self.frame_id = 0;
    }
}

/// `((left_x − w/2) + (right_x − w/2))·xm` at the bottom row of both smoothed fits.
fn center_offset(
    left: &LineReport,
    right: &LineReport,
    mask: &BinaryMask,
    xm_per_pix: f64,
) -> Option<f64> {
    let (left_fit, right_fit) = (left.smoothed_fit?, right.smoothed_fit?);
    let y = mask.height().saturating_sub(1) as f64;
    let image_center = (mask.width() / 2) as f64;
    let left_dist = left_fit.eval(y) - image_center;
    let right_dist = right_fit.eval(y) - image_center;
    Some((left_dist + right_dist) * xm_per_pix)
}
