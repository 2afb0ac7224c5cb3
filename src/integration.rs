//! Collaborator seams around the tracker.
//!
//! Detectors, frame sources and the downstream seat-count payload are kept
//! behind small traits and value types so the tracking core never depends on
//! a particular model runtime or video backend.

mod builder;
mod detector;
mod frames;
mod pipeline;
mod report;

pub use builder::DetectionBuilder;
pub use detector::{
    DetectionSource, IntoDetections, PERSON_CLASS_ID, PrecomputedDetections, RawDetection,
};
pub use frames::{FrameSource, ImageFrames, ImageSequence};
pub use pipeline::{CountingPipeline, RunSummary, count_passengers};
pub use report::{Occupancy, SeatReport};
