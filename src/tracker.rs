mod gate;
mod geometry;
mod history;
mod lane_tracker;
mod line_tracker;
mod locator;
mod mask;
mod polyfit;
mod track_state;

pub use gate::{RejectReason, SanityGate};
pub use geometry::{Curvature, LineGeometry, OffsetRow, PixelScale, curvature_radius};
pub use history::{DEFAULT_HISTORY_LEN, FitHistory};
pub use lane_tracker::{LaneAnnotation, LaneEstimate, LaneTracker, TrackerConfig};
pub use line_tracker::{LineConfig, LineReport, LineTracker, RecoveryMode, UpdateOutcome};
pub use locator::{
    BlindSearch, DEFAULT_SEARCH_MARGIN, SearchDebug, SearchTrace, SlidingWindowParams,
    blind_search, margin_search,
};
pub use mask::{BinaryMask, LaneSide, PixelSet, SearchWindow};
pub use polyfit::{LaneFit, fit_pixels, fit_quadratic};
pub use track_state::LineState;
