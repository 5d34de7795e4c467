/// Lifecycle phase of a single lane boundary tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineState {
    /// No accepted fit yet; the next frame runs a blind search
    #[default]
    Uninitialized,
    /// A fit is held; the next frame searches around it
    Tracking,
}

impl LineState {
    pub fn is_tracking(&self) -> bool {
        matches!(self, Self::Tracking)
    }
}
