//! Single tracked person.

use crate::tracker::appearance::Descriptor;
use crate::tracker::rect::Rect;
use crate::tracker::track_state::TrackState;

/// Box center recorded on a frame where the track was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Centroid {
    pub x: i32,
    pub y: i32,
    pub frame_id: u64,
}

/// One person followed across frames.
///
/// Fields are only mutated by the tracking session; the centroid history is
/// append-only and never empty.
#[derive(Debug, Clone)]
pub struct Track {
    pub(crate) track_id: u64,
    pub(crate) state: TrackState,
    pub(crate) bbox: Rect,
    pub(crate) descriptor: Descriptor,
    pub(crate) centroids: Vec<Centroid>,
    pub(crate) last_frame: u64,
    pub(crate) age: u32,
    pub(crate) counted: bool,
}

impl Track {
    pub(crate) fn new(track_id: u64, bbox: Rect, descriptor: Descriptor, frame_id: u64) -> Self {
        let (x, y) = bbox.center_px();
        Self {
            track_id,
            state: TrackState::Active,
            bbox,
            descriptor,
            centroids: vec![Centroid { x, y, frame_id }],
            last_frame: frame_id,
            age: 1,
            counted: false,
        }
    }

    pub fn track_id(&self) -> u64 {
        self.track_id
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    pub fn bbox(&self) -> Rect {
        self.bbox
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn centroids(&self) -> &[Centroid] {
        &self.centroids
    }

    pub fn first_centroid(&self) -> Centroid {
        self.centroids[0]
    }

    pub fn last_centroid(&self) -> Centroid {
        self.centroids[self.centroids.len() - 1]
    }

    pub fn last_frame(&self) -> u64 {
        self.last_frame
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn counted(&self) -> bool {
        self.counted
    }

    /// Frames elapsed since the last match.
    pub fn frames_since_match(&self, frame_id: u64) -> u64 {
        frame_id.saturating_sub(self.last_frame)
    }

    /// Absorb a matched detection.
    pub(crate) fn update(&mut self, bbox: Rect, descriptor: Descriptor, frame_id: u64) {
        self.observe(bbox, descriptor, frame_id);
        self.age += 1;
    }

    /// Bring a lost track back under the same id. Age is left as it was.
    pub(crate) fn re_activate(&mut self, bbox: Rect, descriptor: Descriptor, frame_id: u64) {
        self.state = TrackState::Active;
        self.observe(bbox, descriptor, frame_id);
    }

    fn observe(&mut self, bbox: Rect, descriptor: Descriptor, frame_id: u64) {
        // One centroid per frame, strictly increasing.
        debug_assert!(frame_id > self.last_frame, "track {} observed twice", self.track_id);
        let (x, y) = bbox.center_px();
        self.bbox = bbox;
        self.descriptor = descriptor;
        self.centroids.push(Centroid { x, y, frame_id });
        self.last_frame = frame_id;
    }

    /// Returns `false` if the track was already counted.
    pub(crate) fn mark_counted(&mut self) -> bool {
        if self.counted {
            return false;
        }
        self.counted = true;
        true
    }

    pub(crate) fn mark_lost(&mut self) {
        self.state = TrackState::Lost;
    }

    pub(crate) fn mark_expired(&mut self) {
        self.state = TrackState::Expired;
    }
}
