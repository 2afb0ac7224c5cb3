mod appearance;
mod config;
mod counter;
mod lifecycle;
mod matching;
mod rect;
mod reid;
mod session;
mod track;
mod track_state;

pub use appearance::{AppearanceModel, DESCRIPTOR_LEN, Descriptor, HsvHistogram};
pub use config::{AssignmentStrategy, TrackerConfig};
pub use counter::{Direction, Tally, Zone, ZoneCrossingCounter};
pub use lifecycle::TrackLifecycle;
pub use matching::{AssignmentResult, Detection, greedy_assignment, optimal_assignment};
pub use rect::{Rect, iou_batch};
pub use reid::ReIdentifier;
pub use session::{FrameUpdate, TrackingSession};
pub use track::{Centroid, Track};
pub use track_state::TrackState;
