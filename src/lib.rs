//! Passenger flow counting on top of a streaming multi-object person tracker.
//!
//! Per-frame person detections are turned into stable identities (IoU
//! assignment plus colour-histogram re-identification), and tracks crossing a
//! counting zone with sustained vertical motion are tallied as boarding or
//! alighting passengers.

pub mod error;
pub mod integration;
pub mod tracker;

pub use error::CountError;
pub use integration::{
    CountingPipeline, DetectionSource, FrameSource, ImageSequence, Occupancy,
    PrecomputedDetections, RawDetection, RunSummary, SeatReport, count_passengers,
};
pub use tracker::{
    AppearanceModel, AssignmentStrategy, Descriptor, Detection, Direction, FrameUpdate,
    HsvHistogram, Rect, Tally, Track, TrackState, TrackerConfig, TrackingSession, Zone,
};
