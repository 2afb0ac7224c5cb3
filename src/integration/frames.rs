//! Frame source collaborator contract.

use std::path::{Path, PathBuf};

use image::RgbImage;
use tracing::{debug, warn};

use crate::error::CountError;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// An ordered stream of frames that has to be opened before use.
pub trait FrameSource {
    type Frames: Iterator<Item = RgbImage>;

    /// Human-readable name for logs.
    fn describe(&self) -> String;

    /// Open the stream. Failing here means no frame was ever produced.
    fn open(self) -> Result<Self::Frames, CountError>;
}

impl FrameSource for Vec<RgbImage> {
    type Frames = std::vec::IntoIter<RgbImage>;

    fn describe(&self) -> String {
        format!("{} in-memory frames", self.len())
    }

    fn open(self) -> Result<Self::Frames, CountError> {
        Ok(self.into_iter())
    }
}

/// Directory of still images played back in file-name order.
#[derive(Debug, Clone)]
pub struct ImageSequence {
    dir: PathBuf,
}

impl ImageSequence {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn frame_paths(&self) -> Result<Vec<PathBuf>, CountError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| CountError::SourceUnavailable {
            path: self.dir.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if is_image && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

impl FrameSource for ImageSequence {
    type Frames = ImageFrames;

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn open(self) -> Result<Self::Frames, CountError> {
        let paths = self.frame_paths()?;
        if paths.is_empty() {
            return Err(CountError::EmptySource(self.describe()));
        }
        debug!(dir = %self.dir.display(), frames = paths.len(), "opened image sequence");
        Ok(ImageFrames {
            paths: paths.into_iter(),
            finished: false,
        })
    }
}

/// Lazily decoded frames of an [`ImageSequence`].
///
/// The stream ends at the first file that fails to decode, like a video that
/// can no longer be read.
#[derive(Debug)]
pub struct ImageFrames {
    paths: std::vec::IntoIter<PathBuf>,
    finished: bool,
}

impl Iterator for ImageFrames {
    type Item = RgbImage;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let path = self.paths.next()?;
        match image::open(&path) {
            Ok(frame) => Some(frame.to_rgb8()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to decode frame, ending stream");
                self.finished = true;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("passenger-count-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_directory_is_unavailable() {
        let source = ImageSequence::new("/definitely/not/a/frame/dir");
        assert!(matches!(source.open(), Err(CountError::SourceUnavailable { .. })));
    }

    #[test]
    fn test_empty_directory_has_no_frames() {
        let dir = scratch_dir("empty");
        std::fs::write(dir.join("notes.txt"), "not a frame").unwrap();
        assert!(matches!(ImageSequence::new(&dir).open(), Err(CountError::EmptySource(_))));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_frames_play_in_name_order_and_stop_at_corrupt_file() {
        let dir = scratch_dir("ordered");
        RgbImage::from_pixel(4, 4, Rgb([255, 0, 0])).save(dir.join("frame_001.png")).unwrap();
        RgbImage::from_pixel(4, 4, Rgb([0, 0, 255])).save(dir.join("frame_000.png")).unwrap();
        std::fs::write(dir.join("frame_002.png"), b"garbage").unwrap();
        RgbImage::from_pixel(4, 4, Rgb([0, 255, 0])).save(dir.join("frame_003.png")).unwrap();

        let frames: Vec<RgbImage> = ImageSequence::new(&dir).open().unwrap().collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].get_pixel(0, 0), &Rgb([0, 0, 255]));
        assert_eq!(frames[1].get_pixel(0, 0), &Rgb([255, 0, 0]));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
