//! CountingPipeline for combining detection with tracking and counting.

use std::sync::atomic::{AtomicBool, Ordering};

use image::RgbImage;
use tracing::{info, warn};

use crate::error::CountError;
use crate::integration::detector::{DetectionSource, IntoDetections};
use crate::integration::frames::FrameSource;
use crate::tracker::{
    AppearanceModel, Direction, FrameUpdate, HsvHistogram, Tally, TrackerConfig, TrackingSession,
    Zone,
};

/// Outcome of a counting run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub direction: Direction,
    pub frames_processed: u64,
    pub tally: Tally,
    pub tracks_created: u64,
    pub active_tracks: usize,
    pub lost_tracks: usize,
    /// True when the run ended on the stop signal rather than end of stream.
    pub stopped: bool,
}

impl RunSummary {
    /// Count for the run's direction.
    pub fn count(&self) -> u32 {
        self.tally.get(self.direction)
    }
}

/// Bundles a detector with the tracking session for end-to-end counting.
pub struct CountingPipeline<D: DetectionSource, A: AppearanceModel + Clone = HsvHistogram> {
    detector: D,
    appearance: A,
    config: TrackerConfig,
}

impl<D: DetectionSource> CountingPipeline<D, HsvHistogram> {
    /// Create a new counting pipeline with the given detector and tracker config.
    pub fn new(detector: D, config: TrackerConfig) -> Self {
        Self::with_appearance(detector, HsvHistogram, config)
    }

    /// Create a new counting pipeline with default tracker configuration.
    pub fn with_default_config(detector: D) -> Self {
        Self::new(detector, TrackerConfig::default())
    }
}

impl<D: DetectionSource, A: AppearanceModel + Clone> CountingPipeline<D, A> {
    pub fn with_appearance(detector: D, appearance: A, config: TrackerConfig) -> Self {
        Self {
            detector,
            appearance,
            config,
        }
    }

    /// Fresh session sharing this pipeline's configuration and appearance model.
    pub fn session(&self, zone: Zone, direction: Direction) -> TrackingSession<A> {
        TrackingSession::with_appearance(
            self.config.clone(),
            zone,
            direction,
            self.appearance.clone(),
        )
    }

    /// Detect people in `frame` and advance `session` by one frame.
    ///
    /// A detector error is logged and the frame is processed with no detections.
    pub fn process_frame(
        &mut self,
        session: &mut TrackingSession<A>,
        frame: &RgbImage,
    ) -> FrameUpdate {
        let detections = match self.detector.detect(frame) {
            Ok(raw) => raw.into_detections(),
            Err(e) => {
                warn!(frame = session.frame_id(), error = %e, "detector failed, treating frame as empty");
                Vec::new()
            }
        };
        session.update(frame, &detections)
    }

    /// Count crossings over the whole stream.
    ///
    /// Returns 0 when the source cannot be opened or has no frames.
    pub fn run<S: FrameSource>(&mut self, source: S, zone: Zone, direction: Direction) -> u32 {
        let stop = AtomicBool::new(false);
        match self.run_until(source, zone, direction, &stop) {
            Ok(summary) => summary.count(),
            Err(e) => {
                warn!(error = %e, "frame source unavailable, count is 0");
                0
            }
        }
    }

    /// Like [`run`](Self::run) but checks `stop` before every frame.
    ///
    /// On stop the tally covers every frame fully processed so far.
    pub fn run_until<S: FrameSource>(
        &mut self,
        source: S,
        zone: Zone,
        direction: Direction,
        stop: &AtomicBool,
    ) -> Result<RunSummary, CountError> {
        let name = source.describe();
        let frames = source.open()?;
        info!(source = %name, ?zone, %direction, "processing");

        let mut session = self.session(zone, direction);
        let mut stopped = false;
        for frame in frames {
            if stop.load(Ordering::Relaxed) {
                stopped = true;
                break;
            }
            self.process_frame(&mut session, &frame);
        }

        if session.frame_id() == 0 && !stopped {
            warn!(source = %name, "no frames found");
        }

        let summary = RunSummary {
            direction,
            frames_processed: session.frame_id(),
            tally: session.tally(),
            tracks_created: session.tracks_created(),
            active_tracks: session.active_tracks().count(),
            lost_tracks: session.lost_tracks().count(),
            stopped,
        };
        info!(
            source = %name,
            %direction,
            count = summary.count(),
            frames = summary.frames_processed,
            active = summary.active_tracks,
            lost = summary.lost_tracks,
            "final count"
        );
        Ok(summary)
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}

/// Count boarding or alighting passengers in `source` with the default tracker settings.
pub fn count_passengers<S: FrameSource, D: DetectionSource>(
    source: S,
    detector: D,
    zone: Zone,
    direction: Direction,
) -> u32 {
    CountingPipeline::with_default_config(detector).run(source, zone, direction)
}
