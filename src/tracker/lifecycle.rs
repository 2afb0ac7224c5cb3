use std::collections::BTreeMap;

use tracing::debug;

use crate::tracker::track::Track;

/// Ages tracks between the active and lost registries.
#[derive(Debug, Clone, Copy)]
pub struct TrackLifecycle {
    pub max_unmatched_frames: u64,
    pub max_lost_frames: u64,
}

impl TrackLifecycle {
    pub fn new(max_unmatched_frames: u64, max_lost_frames: u64) -> Self {
        Self {
            max_unmatched_frames,
            max_lost_frames,
        }
    }

    /// Move active tracks unmatched for more than `max_unmatched_frames` to `lost`.
    pub fn demote_stale(
        &self,
        active: &mut BTreeMap<u64, Track>,
        lost: &mut BTreeMap<u64, Track>,
        frame_id: u64,
    ) -> Vec<u64> {
        let stale: Vec<u64> = active
            .values()
            .filter(|t| t.frames_since_match(frame_id) > self.max_unmatched_frames)
            .map(|t| t.track_id)
            .collect();

        for id in &stale {
            if let Some(mut track) = active.remove(id) {
                debug!(frame = frame_id, track = id, "track lost temporarily");
                track.mark_lost();
                lost.insert(*id, track);
            }
        }
        stale
    }

    /// Drop lost tracks not re-identified within `max_lost_frames`.
    pub fn expire_stale(&self, lost: &mut BTreeMap<u64, Track>, frame_id: u64) -> Vec<u64> {
        let mut expired = Vec::new();
        lost.retain(|&id, track| {
            if track.frames_since_match(frame_id) > self.max_lost_frames {
                track.mark_expired();
                debug!(frame = frame_id, track = id, "lost track expired");
                expired.push(id);
                false
            } else {
                true
            }
        });
        expired
    }
}
