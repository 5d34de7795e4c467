//! LanePipeline for combining mask production with lane tracking.

use crate::tracker::{LaneEstimate, LaneTracker, TrackerConfig};

use super::MaskSource;
use super::overlay::{LaneRenderer, estimate_polygon};

/// A combined tracker that bundles the mask collaborator with a [`LaneTracker`].
///
/// One pipeline owns the tracker pair of exactly one video stream; frames
/// must be fed in order.
pub struct LanePipeline<S: MaskSource> {
    source: S,
    tracker: LaneTracker,
    mask_height: usize,
}

impl<S: MaskSource> LanePipeline<S> {
    /// Create a new pipeline with the given mask source and tracker config.
    pub fn new(source: S, config: TrackerConfig) -> Self {
        Self {
            source,
            tracker: LaneTracker::new(config),
            mask_height: 0,
        }
    }

    /// Create a new pipeline with default tracker configuration.
    pub fn with_default_config(source: S) -> Self {
        Self::new(source, TrackerConfig::default())
    }

    /// Process a single frame and return the lane estimate.
    ///
    /// # Arguments
    /// * `frame` - Raw image bytes
    /// * `width` - Frame width in pixels
    /// * `height` - Frame height in pixels
    pub fn process_frame(
        &mut self,
        frame: &[u8],
        width: u32,
        height: u32,
    ) -> Result<LaneEstimate, S::Error> {
        let mask = self.source.top_down_mask(frame, width, height)?;
        self.mask_height = mask.height();
        Ok(self.tracker.update(&mask))
    }

    /// Hand the lane polygon and annotation of `estimate` to `renderer`.
    ///
    /// Returns `Ok(false)` without calling the renderer when either boundary
    /// has never been found.
    pub fn render<R: LaneRenderer>(
        &self,
        renderer: &mut R,
        frame: &mut [u8],
        width: u32,
        height: u32,
        estimate: &LaneEstimate,
    ) -> Result<bool, R::Error> {
        let Some(polygon) = estimate_polygon(estimate, self.mask_height) else {
            return Ok(false);
        };
        renderer.render(frame, width, height, &polygon, &estimate.annotation())?;
        Ok(true)
    }

    /// Get a reference to the underlying mask source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Get a mutable reference to the underlying mask source.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Get a reference to the underlying tracker.
    pub fn tracker(&self) -> &LaneTracker {
        &self.tracker
    }

    /// Get a mutable reference to the underlying tracker.
    pub fn tracker_mut(&mut self) -> &mut LaneTracker {
        &mut self.tracker
    }
}
