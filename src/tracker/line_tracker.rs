//! Per-boundary tracking state machine.
//!
//! A [`LineTracker`] follows one lane boundary across frames. Uninitialized
//! trackers run a blind sliding-window search; tracking ones search around
//! their last accepted fit, gate the candidate against the smoothed geometry
//! and fall back to the recovery policy after repeated rejections.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, TrackError};
use crate::tracker::gate::{RejectReason, SanityGate};
use crate::tracker::geometry::{LineGeometry, PixelScale};
use crate::tracker::history::{DEFAULT_HISTORY_LEN, FitHistory};
use crate::tracker::locator::{
    DEFAULT_SEARCH_MARGIN, SearchDebug, SearchTrace, SlidingWindowParams, blind_search,
    margin_search,
};
use crate::tracker::mask::{BinaryMask, PixelSet};
use crate::tracker::polyfit::{LaneFit, fit_pixels};
use crate::tracker::track_state::LineState;

/// Tunables of a single boundary tracker, fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    pub window: SlidingWindowParams,
    /// Half-width of the band searched around the current fit, in pixels.
    pub search_margin: f64,
    pub scale: PixelScale,
    pub gate: SanityGate,
    /// Number of accepted fits averaged into the smoothed curve.
    pub history_len: usize,
    /// Consecutive rejections tolerated before recovery kicks in.
    pub max_rejections: u32,
    /// Keep the searched regions and collected pixels in each report.
    pub debug: bool,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            window: SlidingWindowParams::default(),
            search_margin: DEFAULT_SEARCH_MARGIN,
            scale: PixelScale::default(),
            gate: SanityGate::default(),
            history_len: DEFAULT_HISTORY_LEN,
            max_rejections: 4,
            debug: false,
        }
    }
}

impl LineConfig {
    pub fn validate(&self) -> Result<()> {
        self.window.validate()?;
        self.scale.validate()?;
        self.gate.validate()?;
        if !(self.search_margin.is_finite() && self.search_margin > 0.0) {
            return Err(TrackError::InvalidConfig(format!(
                "search margin must be positive, got {}",
                self.search_margin
            )));
        }
        if self.history_len == 0 {
            return Err(TrackError::InvalidConfig(
                "history length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// How the tracker escaped a run of rejected frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryMode {
    /// Newest history entry replaced by the one before it.
    Rollback,
    /// History cleared and a blind search run on the current frame.
    Reinitialized { found: bool },
}

/// What happened to the tracker on one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateOutcome {
    /// First fit taken after a blind search.
    Initialized,
    /// Candidate passed the gate and joined the history.
    Accepted,
    /// Candidate dropped; the tracker coasts on its previous geometry.
    Rejected { reason: RejectReason },
    /// Rejections exceeded the limit and the recovery policy ran.
    Recovered { mode: RecoveryMode },
    /// Blind search found nothing usable; still uninitialized.
    NotFound { reason: RejectReason },
}

/// Per-frame output of a [`LineTracker`].
#[derive(Debug, Clone, PartialEq)]
pub struct LineReport {
    /// This frame produced a fit that entered the history.
    pub found: bool,
    pub outcome: UpdateOutcome,
    /// Mean of the history, `None` while uninitialized.
    pub smoothed_fit: Option<LaneFit>,
    /// Geometry of the smoothed fit, stale when the frame was rejected.
    pub geometry: Option<LineGeometry>,
    /// Present when [`LineConfig::debug`] is set.
    pub debug: Option<SearchDebug>,
}

/// Tracker for a single lane boundary.
#[derive(Debug, Clone)]
pub struct LineTracker {
    config: LineConfig,
    state: LineState,
    current_fit: Option<LaneFit>,
    history: FitHistory,
    smoothed_fit: Option<LaneFit>,
    geometry: Option<LineGeometry>,
    consecutive_rejections: u32,
    /// A rollback already happened in the current rejection streak.
    rolled_back: bool,
}

impl Default for LineTracker {
    fn default() -> Self {
        Self::new(LineConfig::default())
    }
}

impl LineTracker {
    pub fn new(config: LineConfig) -> Self {
        let history = FitHistory::new(config.history_len);
        Self {
            config,
            state: LineState::Uninitialized,
            current_fit: None,
            history,
            smoothed_fit: None,
            geometry: None,
            consecutive_rejections: 0,
            rolled_back: false,
        }
    }

    /// Like [`LineTracker::new`] but rejects out-of-range tunables.
    pub fn try_new(config: LineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &LineConfig {
        &self.config
    }

    pub fn state(&self) -> LineState {
        self.state
    }

    /// Most recently accepted fit; `Some` exactly when tracking.
    pub fn current_fit(&self) -> Option<&LaneFit> {
        self.current_fit.as_ref()
    }

    pub fn smoothed_fit(&self) -> Option<&LaneFit> {
        self.smoothed_fit.as_ref()
    }

    pub fn geometry(&self) -> Option<&LineGeometry> {
        self.geometry.as_ref()
    }

    pub fn history(&self) -> &FitHistory {
        &self.history
    }

    pub fn consecutive_rejections(&self) -> u32 {
        self.consecutive_rejections
    }

    /// Process one frame's side-isolated mask.
    pub fn update(&mut self, mask: &BinaryMask) -> LineReport {
        match self.current_fit {
            Some(current) if self.state.is_tracking() => self.track(mask, current),
            _ => self.initialize(mask),
        }
    }

    /// External notification that this frame's line is unreliable.
    ///
    /// With fewer than two history entries, or when the rejection limit is
    /// already exceeded, the tracker re-initializes from `mask`. Otherwise the
    /// newest fit is rolled back.
    pub fn mark_lost(&mut self, mask: &BinaryMask) -> LineReport {
        if self.history.len() < 2 || self.consecutive_rejections > self.config.max_rejections {
            return self.reinitialize(mask);
        }
        self.consecutive_rejections += 1;
        self.rollback(mask, None)
    }

    /// Drop all state; the next frame starts with a blind search.
    pub fn reset(&mut self) {
        self.state = LineState::Uninitialized;
        self.current_fit = None;
        self.history.clear();
        self.smoothed_fit = None;
        self.geometry = None;
        self.consecutive_rejections = 0;
        self.rolled_back = false;
    }

    fn initialize(&mut self, mask: &BinaryMask) -> LineReport {
        let search = blind_search(mask, &self.config.window);
        let candidate = fit_candidate(&search.pixels);
        let debug = self.debug_payload(SearchTrace::Windows(search.windows), search.pixels);

        match candidate {
            Ok(fit) => {
                self.accept(fit, mask.height());
                self.state = LineState::Tracking;
                info!(a = fit.a, b = fit.b, c = fit.c, "line initialized");
                self.report(true, UpdateOutcome::Initialized, debug)
            }
            Err(reason) => {
                debug!(?reason, "blind search found no line");
                self.report(false, UpdateOutcome::NotFound { reason }, debug)
            }
        }
    }

    fn track(&mut self, mask: &BinaryMask, current: LaneFit) -> LineReport {
        let margin = self.config.search_margin;
        let pixels = margin_search(mask, &current, margin);
        let candidate = fit_candidate(&pixels);
        let debug = self.debug_payload(
            SearchTrace::Band {
                fit: current,
                margin,
            },
            pixels,
        );

        let fit = match candidate {
            Ok(fit) => fit,
            Err(reason) => return self.reject(mask, reason, debug),
        };

        let candidate_geometry = LineGeometry::from_fit(&fit, mask.height(), &self.config.scale);
        let verdict = match &self.geometry {
            Some(reference) => self.config.gate.check(reference, &candidate_geometry),
            None => Ok(()),
        };

        match verdict {
            Ok(()) => {
                self.accept(fit, mask.height());
                debug!(history = self.history.len(), "line update accepted");
                self.report(true, UpdateOutcome::Accepted, debug)
            }
            Err(reason) => self.reject(mask, reason, debug),
        }
    }

    /// Count a rejected frame and run recovery once the streak exceeds
    /// `max_rejections`.
    ///
    /// The first recovery of a streak rolls back the newest history entry
    /// when at least two are held. Any later rejection in the same streak,
    /// or a history shorter than two, forces a full re-initialization.
    fn reject(
        &mut self,
        mask: &BinaryMask,
        reason: RejectReason,
        debug: Option<SearchDebug>,
    ) -> LineReport {
        self.consecutive_rejections += 1;
        debug!(
            ?reason,
            rejections = self.consecutive_rejections,
            "line update rejected"
        );

        if self.consecutive_rejections > self.config.max_rejections {
            if self.history.len() >= 2 && !self.rolled_back {
                // the rollback itself counts against the streak
                self.consecutive_rejections += 1;
                return self.rollback(mask, debug);
            }
            return self.reinitialize(mask);
        }
        self.report(false, UpdateOutcome::Rejected { reason }, debug)
    }

    /// Soft recovery: undo the newest history entry.
    fn rollback(&mut self, mask: &BinaryMask, debug: Option<SearchDebug>) -> LineReport {
        if let Some(restored) = self.history.rollback_latest() {
            self.current_fit = Some(restored);
        }
        self.rolled_back = true;
        self.refresh_smoothed(mask.height());
        info!(
            rejections = self.consecutive_rejections,
            "line rolled back to previous fit"
        );
        self.report(
            false,
            UpdateOutcome::Recovered {
                mode: RecoveryMode::Rollback,
            },
            debug,
        )
    }

    /// Full recovery: forget everything and search blind on this frame.
    fn reinitialize(&mut self, mask: &BinaryMask) -> LineReport {
        warn!(
            rejections = self.consecutive_rejections,
            history = self.history.len(),
            "line lost, re-initializing with blind search"
        );
        self.reset();
        let mut report = self.initialize(mask);
        report.outcome = UpdateOutcome::Recovered {
            mode: RecoveryMode::Reinitialized {
                found: report.found,
            },
        };
        report
    }

    fn accept(&mut self, fit: LaneFit, image_height: usize) {
        self.current_fit = Some(fit);
        self.history.push(fit);
        self.consecutive_rejections = 0;
        self.rolled_back = false;
        self.refresh_smoothed(image_height);
    }

    fn refresh_smoothed(&mut self, image_height: usize) {
        self.smoothed_fit = self.history.mean();
        self.geometry = self
            .smoothed_fit
            .map(|fit| LineGeometry::from_fit(&fit, image_height, &self.config.scale));
    }

    fn debug_payload(&self, trace: SearchTrace, pixels: PixelSet) -> Option<SearchDebug> {
        self.config.debug.then(|| SearchDebug { trace, pixels })
    }

    fn report(
        &self,
        found: bool,
        outcome: UpdateOutcome,
        debug: Option<SearchDebug>,
    ) -> LineReport {
        LineReport {
            found,
            outcome,
            smoothed_fit: self.smoothed_fit,
            geometry: self.geometry,
            debug,
        }
    }
}

fn fit_candidate(pixels: &PixelSet) -> std::result::Result<LaneFit, RejectReason> {
    if pixels.is_empty() {
        return Err(RejectReason::LocatorEmpty);
    }
    fit_pixels(pixels).map_err(reject_reason)
}

fn reject_reason(err: TrackError) -> RejectReason {
    match err {
        TrackError::DegenerateFit { distinct_rows } => RejectReason::FitDegenerate { distinct_rows },
        TrackError::EmptyPixelSet => RejectReason::LocatorEmpty,
        _ => RejectReason::FitFailed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::geometry::Curvature;
    use approx::assert_abs_diff_eq;

    fn line_mask(width: usize, height: usize, x: usize) -> BinaryMask {
        let mut mask = BinaryMask::new(width, height);
        for y in 0..height {
            mask.set(x, y, true);
        }
        mask
    }

    fn config() -> LineConfig {
        LineConfig {
            window: SlidingWindowParams::new(9, 50, 10),
            ..LineConfig::default()
        }
    }

    #[test]
    fn test_initializes_on_vertical_line() {
        let mut tracker = LineTracker::new(config());
        let report = tracker.update(&line_mask(200, 400, 50));

        assert!(report.found);
        assert_eq!(report.outcome, UpdateOutcome::Initialized);
        assert_eq!(tracker.state(), LineState::Tracking);
        assert_eq!(tracker.history().len(), 1);

        let geometry = report.geometry.unwrap();
        assert_eq!(geometry.curverad, Curvature::Straight);
        let xm = tracker.config().scale.xm_per_pix;
        assert_abs_diff_eq!(geometry.dist[0], 50.0 * xm, epsilon = 1e-9);
        assert_abs_diff_eq!(geometry.dist[1], 50.0 * xm, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_mask_stays_uninitialized() {
        let mut tracker = LineTracker::new(config());
        let report = tracker.update(&BinaryMask::new(200, 400));

        assert!(!report.found);
        assert_eq!(
            report.outcome,
            UpdateOutcome::NotFound {
                reason: RejectReason::LocatorEmpty
            }
        );
        assert_eq!(tracker.state(), LineState::Uninitialized);
        assert!(tracker.current_fit().is_none());
        assert!(report.smoothed_fit.is_none());
    }

    #[test]
    fn test_two_row_blob_is_degenerate() {
        let mut mask = BinaryMask::new(100, 100);
        for x in 20..40 {
            mask.set(x, 98, true);
            mask.set(x, 99, true);
        }
        let mut tracker = LineTracker::new(config());
        let report = tracker.update(&mask);
        assert_eq!(
            report.outcome,
            UpdateOutcome::NotFound {
                reason: RejectReason::FitDegenerate { distinct_rows: 2 }
            }
        );
        assert_eq!(tracker.state(), LineState::Uninitialized);
    }

    #[test]
    fn test_same_frame_is_accepted() {
        let mask = line_mask(200, 400, 50);
        let mut tracker = LineTracker::new(config());
        tracker.update(&mask);

        let report = tracker.update(&mask);
        assert!(report.found);
        assert_eq!(report.outcome, UpdateOutcome::Accepted);
        assert_eq!(tracker.history().len(), 2);
        assert_eq!(tracker.consecutive_rejections(), 0);
    }

    #[test]
    fn test_jump_is_rejected_and_state_kept() {
        let mut tracker = LineTracker::new(config());
        tracker.update(&line_mask(200, 400, 50));
        let before = *tracker.smoothed_fit().unwrap();
        let current_before = *tracker.current_fit().unwrap();

        // 60 px ~ 0.32 m: inside the search band, outside the gate
        let report = tracker.update(&line_mask(200, 400, 110));
        assert!(!report.found);
        assert!(matches!(
            report.outcome,
            UpdateOutcome::Rejected {
                reason: RejectReason::OffsetJump { .. }
            }
        ));
        assert_eq!(tracker.consecutive_rejections(), 1);
        assert_eq!(tracker.smoothed_fit(), Some(&before));
        assert_eq!(tracker.current_fit(), Some(&current_before));
        assert_eq!(report.smoothed_fit, Some(before));
    }

    #[test]
    fn test_empty_margin_search_counts_as_rejection() {
        let mut tracker = LineTracker::new(config());
        tracker.update(&line_mask(200, 400, 50));

        let report = tracker.update(&BinaryMask::new(200, 400));
        assert_eq!(
            report.outcome,
            UpdateOutcome::Rejected {
                reason: RejectReason::LocatorEmpty
            }
        );
        assert_eq!(tracker.state(), LineState::Tracking);
        assert!(report.geometry.is_some());
    }

    #[test]
    fn test_two_row_margin_search_counts_as_rejection() {
        let mut tracker = LineTracker::new(config());
        tracker.update(&line_mask(200, 400, 50));
        let geometry_before = *tracker.geometry().unwrap();
        let smoothed_before = *tracker.smoothed_fit().unwrap();

        let mut mask = BinaryMask::new(200, 400);
        for x in 45..56 {
            mask.set(x, 120, true);
            mask.set(x, 300, true);
        }
        let report = tracker.update(&mask);

        assert!(!report.found);
        assert_eq!(
            report.outcome,
            UpdateOutcome::Rejected {
                reason: RejectReason::FitDegenerate { distinct_rows: 2 }
            }
        );
        assert_eq!(tracker.consecutive_rejections(), 1);
        assert_eq!(tracker.state(), LineState::Tracking);
        assert_eq!(tracker.history().len(), 1);
        assert_eq!(report.geometry, Some(geometry_before));
        assert_eq!(tracker.smoothed_fit(), Some(&smoothed_before));
    }

    #[test]
    fn test_fit_errors_map_to_reasons() {
        assert_eq!(
            reject_reason(TrackError::DegenerateFit { distinct_rows: 1 }),
            RejectReason::FitDegenerate { distinct_rows: 1 }
        );
        assert_eq!(
            reject_reason(TrackError::EmptyPixelSet),
            RejectReason::LocatorEmpty
        );
        let failed = reject_reason(TrackError::SolveFailed("non-finite coefficients".into()));
        assert_eq!(failed, RejectReason::FitFailed);
        assert!(!failed.is_gate());
    }

    #[test]
    fn test_acceptance_resets_rejections() {
        let good = line_mask(200, 400, 50);
        let mut tracker = LineTracker::new(config());
        tracker.update(&good);
        tracker.update(&line_mask(200, 400, 110));
        tracker.update(&line_mask(200, 400, 110));
        assert_eq!(tracker.consecutive_rejections(), 2);

        tracker.update(&good);
        assert_eq!(tracker.consecutive_rejections(), 0);
    }

    #[test]
    fn test_rollback_after_five_rejections_with_history() {
        let good = line_mask(200, 400, 50);
        let bad = line_mask(200, 400, 110);
        let mut tracker = LineTracker::new(config());
        tracker.update(&good);
        tracker.update(&good);
        assert_eq!(tracker.history().len(), 2);

        for _ in 0..4 {
            let report = tracker.update(&bad);
            assert!(matches!(report.outcome, UpdateOutcome::Rejected { .. }));
        }
        let report = tracker.update(&bad);
        assert_eq!(
            report.outcome,
            UpdateOutcome::Recovered {
                mode: RecoveryMode::Rollback
            }
        );
        assert_eq!(tracker.state(), LineState::Tracking);
        assert_eq!(tracker.history().len(), 2);
        assert_eq!(tracker.consecutive_rejections(), 6);

        // A further rejection in the same streak escalates to a blind restart
        let report = tracker.update(&bad);
        assert_eq!(
            report.outcome,
            UpdateOutcome::Recovered {
                mode: RecoveryMode::Reinitialized { found: true }
            }
        );
        assert_eq!(tracker.history().len(), 1);
        assert_eq!(tracker.consecutive_rejections(), 0);
        assert_abs_diff_eq!(tracker.current_fit().unwrap().c, 110.0, epsilon = 1e-9);
    }

    #[test]
    fn test_reinitialize_after_five_rejections_without_history() {
        let bad = line_mask(200, 400, 110);
        let mut tracker = LineTracker::new(config());
        tracker.update(&line_mask(200, 400, 50));
        assert_eq!(tracker.history().len(), 1);

        for _ in 0..4 {
            tracker.update(&bad);
        }
        let report = tracker.update(&bad);
        assert_eq!(
            report.outcome,
            UpdateOutcome::Recovered {
                mode: RecoveryMode::Reinitialized { found: true }
            }
        );
        assert!(report.found);
        assert_eq!(tracker.history().len(), 1);
        assert_eq!(tracker.state(), LineState::Tracking);
    }

    #[test]
    fn test_reinitialize_on_empty_frame_leaves_uninitialized() {
        let empty = BinaryMask::new(200, 400);
        let mut tracker = LineTracker::new(config());
        tracker.update(&line_mask(200, 400, 50));
        for _ in 0..4 {
            tracker.update(&empty);
        }
        let report = tracker.update(&empty);
        assert_eq!(
            report.outcome,
            UpdateOutcome::Recovered {
                mode: RecoveryMode::Reinitialized { found: false }
            }
        );
        assert_eq!(tracker.state(), LineState::Uninitialized);
        assert!(tracker.current_fit().is_none());
        assert!(tracker.history().is_empty());
    }

    #[test]
    fn test_mark_lost_rolls_back_with_history() {
        let mut tracker = LineTracker::new(config());
        tracker.update(&line_mask(200, 400, 50));
        // 30 px ~ 0.16 m, accepted by the gate
        tracker.update(&line_mask(200, 400, 80));
        assert_eq!(tracker.history().len(), 2);

        let report = tracker.mark_lost(&line_mask(200, 400, 80));
        assert_eq!(
            report.outcome,
            UpdateOutcome::Recovered {
                mode: RecoveryMode::Rollback
            }
        );
        assert_eq!(tracker.consecutive_rejections(), 1);
        assert_abs_diff_eq!(tracker.smoothed_fit().unwrap().c, 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(tracker.current_fit().unwrap().c, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mark_lost_reinitializes_with_short_history() {
        let mut tracker = LineTracker::new(config());
        tracker.update(&line_mask(200, 400, 50));

        let report = tracker.mark_lost(&line_mask(200, 400, 120));
        assert_eq!(
            report.outcome,
            UpdateOutcome::Recovered {
                mode: RecoveryMode::Reinitialized { found: true }
            }
        );
        assert_abs_diff_eq!(tracker.current_fit().unwrap().c, 120.0, epsilon = 1e-9);
    }

    #[test]
    fn test_debug_payload() {
        let mut tracker = LineTracker::new(LineConfig {
            debug: true,
            ..config()
        });
        let report = tracker.update(&line_mask(200, 400, 50));
        let debug = report.debug.unwrap();
        assert!(matches!(debug.trace, SearchTrace::Windows(ref w) if w.len() == 9));
        assert_eq!(debug.pixels.len(), 9 * 44);

        let report = tracker.update(&line_mask(200, 400, 50));
        assert!(matches!(
            report.debug.unwrap().trace,
            SearchTrace::Band { margin, .. } if margin == 100.0
        ));

        let mut quiet = LineTracker::new(config());
        assert!(quiet.update(&line_mask(200, 400, 50)).debug.is_none());
    }

    #[test]
    fn test_invalid_config() {
        let config = LineConfig {
            history_len: 0,
            ..LineConfig::default()
        };
        assert!(matches!(
            LineTracker::try_new(config),
            Err(TrackError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: LineConfig = serde_json::from_str(r#"{"max_rejections": 2}"#).unwrap();
        assert_eq!(config.max_rejections, 2);
        assert_eq!(config.history_len, 5);
        assert_eq!(config.window, SlidingWindowParams::default());
    }
}
