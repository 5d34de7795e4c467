//! Integration module for connecting the lane tracker to its collaborators.
//!
//! This module provides the traits on either side of the tracker (mask
//! production upstream, overlay rendering downstream) plus helpers for
//! synthetic masks and debug views.

mod builder;
pub mod overlay;
mod pipeline;
mod source;

pub use builder::MaskBuilder;
pub use overlay::{LaneRenderer, debug_image, estimate_polygon, lane_polygon};
pub use pipeline::LanePipeline;
pub use source::{IntoMask, MaskSource};
