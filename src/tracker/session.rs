//! Per-frame tracking session: assignment, re-identification, lifecycle and counting.

use std::collections::BTreeMap;

use image::RgbImage;
use tracing::debug;

use crate::tracker::appearance::{AppearanceModel, HsvHistogram};
use crate::tracker::config::{AssignmentStrategy, TrackerConfig};
use crate::tracker::counter::{Direction, Tally, Zone, ZoneCrossingCounter};
use crate::tracker::lifecycle::TrackLifecycle;
use crate::tracker::matching::{self, AssignmentResult, Detection};
use crate::tracker::rect::{Rect, iou_batch};
use crate::tracker::reid::ReIdentifier;
use crate::tracker::track::Track;

/// What a single [`TrackingSession::update`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameUpdate {
    pub frame_id: u64,
    /// `(track id, detection index)` pairs continued by IoU
    pub matched: Vec<(u64, usize)>,
    /// `(track id, detection index)` pairs recovered from the lost registry
    pub reidentified: Vec<(u64, usize)>,
    /// `(track id, detection index)` pairs that started a new track
    pub created: Vec<(u64, usize)>,
    pub demoted: Vec<u64>,
    pub expired: Vec<u64>,
    pub counted: Vec<u64>,
}

impl FrameUpdate {
    /// Track id bound to detection `index`, if any.
    pub fn track_for_detection(&self, index: usize) -> Option<u64> {
        self.matched
            .iter()
            .chain(&self.reidentified)
            .chain(&self.created)
            .find(|&&(_, det)| det == index)
            .map(|&(id, _)| id)
    }
}

/// Track registry plus running tally for one counting run.
///
/// Active and lost tracks live in two id-ordered maps, so every scan (IoU
/// assignment, re-identification, counting) visits tracks in ascending id
/// order. Not meant to be shared across threads without external locking.
pub struct TrackingSession<A: AppearanceModel = HsvHistogram> {
    active: BTreeMap<u64, Track>,
    lost: BTreeMap<u64, Track>,
    next_id: u64,
    frame_id: u64,
    config: TrackerConfig,
    appearance: A,
    reid: ReIdentifier,
    lifecycle: TrackLifecycle,
    counter: ZoneCrossingCounter,
}

impl TrackingSession<HsvHistogram> {
    pub fn new(config: TrackerConfig, zone: Zone, direction: Direction) -> Self {
        Self::with_appearance(config, zone, direction, HsvHistogram)
    }
}

impl<A: AppearanceModel> TrackingSession<A> {
    pub fn with_appearance(
        config: TrackerConfig,
        zone: Zone,
        direction: Direction,
        appearance: A,
    ) -> Self {
        Self {
            active: BTreeMap::new(),
            lost: BTreeMap::new(),
            next_id: 1,
            frame_id: 0,
            reid: ReIdentifier::new(config.reid_threshold),
            lifecycle: TrackLifecycle::new(config.max_unmatched_frames, config.max_lost_frames),
            counter: ZoneCrossingCounter::new(
                zone,
                direction,
                config.min_track_age,
                config.min_displacement,
            ),
            config,
            appearance,
        }
    }

    /// Process one frame of person detections.
    pub fn update(&mut self, image: &RgbImage, detections: &[Detection]) -> FrameUpdate {
        let frame_id = self.frame_id;
        let mut report = FrameUpdate {
            frame_id,
            ..FrameUpdate::default()
        };

        // Step 1: IoU assignment against active tracks
        let track_ids: Vec<u64> = self.active.keys().copied().collect();
        let track_rects: Vec<Rect> = self.active.values().map(|t| t.bbox).collect();
        let det_rects: Vec<Rect> = detections.iter().map(|d| d.bbox).collect();
        let ious = iou_batch(&track_rects, &det_rects);

        let AssignmentResult {
            matches,
            unmatched_detections,
            ..
        } = match self.config.assignment {
            AssignmentStrategy::Greedy => {
                matching::greedy_assignment(&ious, self.config.iou_threshold)
            }
            AssignmentStrategy::Optimal => {
                matching::optimal_assignment(&ious, self.config.iou_threshold)
            }
        };

        for (row, idet) in matches {
            let id = track_ids[row];
            let bbox = detections[idet].bbox;
            let descriptor = self.appearance.descriptor(image, &bbox);
            if let Some(track) = self.active.get_mut(&id) {
                track.update(bbox, descriptor, frame_id);
                debug!(frame = frame_id, track = id, iou = ious[[row, idet]], "matched");
                report.matched.push((id, idet));
            }
        }

        // Step 2: re-identify leftovers against lost tracks, or start new ones
        if !unmatched_detections.is_empty() {
            report
                .expired
                .extend(self.lifecycle.expire_stale(&mut self.lost, frame_id));
        }
        for idet in unmatched_detections {
            let bbox = detections[idet].bbox;
            let descriptor = self.appearance.descriptor(image, &bbox);

            let recovered = self
                .reid
                .best_match(&self.appearance, &descriptor, &self.lost)
                .and_then(|(id, sim)| self.lost.remove(&id).map(|track| (track, sim)));

            match recovered {
                Some((mut track, sim)) => {
                    let id = track.track_id;
                    track.re_activate(bbox, descriptor, frame_id);
                    self.active.insert(id, track);
                    debug!(frame = frame_id, track = id, similarity = sim, "re-identified");
                    report.reidentified.push((id, idet));
                }
                None => {
                    let id = self.next_track_id();
                    self.active.insert(id, Track::new(id, bbox, descriptor, frame_id));
                    debug!(frame = frame_id, track = id, "new track");
                    report.created.push((id, idet));
                }
            }
        }

        // Step 3: demote stale active tracks, drop expired lost ones
        report.demoted = self
            .lifecycle
            .demote_stale(&mut self.active, &mut self.lost, frame_id);
        report
            .expired
            .extend(self.lifecycle.expire_stale(&mut self.lost, frame_id));

        // Step 4: zone counting
        report.counted = self.counter.evaluate(&mut self.active, frame_id);

        self.frame_id += 1;
        report
    }

    fn next_track_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Index the next call to [`update`](Self::update) will process.
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// Distinct identities allocated so far.
    pub fn tracks_created(&self) -> u64 {
        self.next_id - 1
    }

    pub fn tally(&self) -> Tally {
        self.counter.tally()
    }

    /// Count for the direction this session was created with.
    pub fn count(&self) -> u32 {
        self.counter.tally().get(self.counter.direction())
    }

    pub fn zone(&self) -> Zone {
        self.counter.zone()
    }

    pub fn direction(&self) -> Direction {
        self.counter.direction()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Active tracks in ascending id order.
    pub fn active_tracks(&self) -> impl Iterator<Item = &Track> {
        self.active.values()
    }

    /// Lost tracks in ascending id order.
    pub fn lost_tracks(&self) -> impl Iterator<Item = &Track> {
        self.lost.values()
    }

    /// Look a track up in either registry.
    pub fn track(&self, id: u64) -> Option<&Track> {
        self.active.get(&id).or_else(|| self.lost.get(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::track_state::TrackState;
    use image::Rgb;

    fn frame() -> RgbImage {
        RgbImage::from_pixel(400, 300, Rgb([90, 140, 200]))
    }

    fn session() -> TrackingSession {
        TrackingSession::new(
            TrackerConfig::default(),
            Zone::new(0, 0, 400, 300).unwrap(),
            Direction::Board,
        )
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut session = session();
        let image = frame();
        let first = session.update(
            &image,
            &[Detection::new(10.0, 10.0, 50.0, 90.0), Detection::new(200.0, 10.0, 240.0, 90.0)],
        );
        assert_eq!(first.created, vec![(1, 0), (2, 1)]);

        let second = session.update(&image, &[Detection::new(300.0, 150.0, 340.0, 230.0)]);
        // Appearance is identical everywhere, but nothing is lost yet.
        assert_eq!(second.created, vec![(3, 0)]);
        assert_eq!(session.frame_id(), 2);
    }

    #[test]
    fn test_match_updates_track() {
        let mut session = session();
        let image = frame();
        session.update(&image, &[Detection::new(10.0, 10.0, 50.0, 90.0)]);
        let update = session.update(&image, &[Detection::new(12.0, 14.0, 52.0, 94.0)]);

        assert_eq!(update.matched, vec![(1, 0)]);
        let track = session.track(1).unwrap();
        assert_eq!(track.age(), 2);
        assert_eq!(track.last_frame(), 1);
        assert_eq!(track.last_centroid().y, 54);
    }

    #[test]
    fn test_demotion_and_expiry() {
        let mut session = session();
        let image = frame();
        session.update(&image, &[Detection::new(10.0, 10.0, 50.0, 90.0)]);

        for _ in 1..=5 {
            let update = session.update(&image, &[]);
            assert!(update.demoted.is_empty());
        }
        let update = session.update(&image, &[]);
        assert_eq!(update.demoted, vec![1]);
        assert_eq!(session.track(1).unwrap().state(), TrackState::Lost);

        // Kept while at most 50 frames have passed since the last match.
        while session.frame_id() <= 50 {
            assert!(session.update(&image, &[]).expired.is_empty());
        }
        let update = session.update(&image, &[]);
        assert_eq!(update.expired, vec![1]);
        assert!(session.track(1).is_none());
    }

    #[test]
    fn test_detection_lookup() {
        let mut session = session();
        let update = session.update(&frame(), &[Detection::new(10.0, 10.0, 50.0, 90.0)]);
        assert_eq!(update.track_for_detection(0), Some(1));
        assert_eq!(update.track_for_detection(1), None);
    }
}
