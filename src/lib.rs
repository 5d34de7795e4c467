//! Lane boundary tracking over a stream of top-down binary lane masks.
//!
//! Each lane boundary is followed by its own [`LineTracker`]: a blind
//! sliding-window search on the first frame, a margin search around the last
//! accepted curve afterwards, a quadratic least-squares fit, a sanity gate
//! against the smoothed geometry and a bounded recovery policy. The
//! [`LaneTracker`] drives the left/right pair from one full-width mask.

pub mod error;
pub mod integration;
pub mod tracker;

pub use error::{Result, TrackError};
pub use integration::{IntoMask, LanePipeline, LaneRenderer, MaskBuilder, MaskSource};
pub use tracker::{
    BinaryMask, Curvature, FitHistory, LaneAnnotation, LaneEstimate, LaneFit, LaneSide,
    LaneTracker, LineConfig, LineGeometry, LineReport, LineState, LineTracker, PixelScale,
    PixelSet, RecoveryMode, RejectReason, SanityGate, SearchDebug, SearchTrace, SearchWindow,
    SlidingWindowParams, TrackerConfig, UpdateOutcome,
};
