/// Track state enumeration for the tracking lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Matched within the last few frames
    #[default]
    Active,
    /// Unmatched for a while, kept for re-identification
    Lost,
    /// Dropped from tracking for good
    Expired,
}
