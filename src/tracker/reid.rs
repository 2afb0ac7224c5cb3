use std::collections::BTreeMap;

use crate::tracker::appearance::{AppearanceModel, Descriptor};
use crate::tracker::track::Track;

/// Appearance-based recovery of lost tracks.
#[derive(Debug, Clone, Copy)]
pub struct ReIdentifier {
    pub threshold: f32,
}

impl ReIdentifier {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Most similar lost track, if its similarity clears the threshold.
    ///
    /// Lost tracks are scanned in ascending id order and the first one wins a
    /// tie. Returns the track id and the similarity score.
    pub fn best_match<A: AppearanceModel>(
        &self,
        model: &A,
        descriptor: &Descriptor,
        lost: &BTreeMap<u64, Track>,
    ) -> Option<(u64, f32)> {
        let mut best: Option<(u64, f32)> = None;
        for (&id, track) in lost {
            let sim = model.similarity(descriptor, &track.descriptor);
            if best.is_none_or(|(_, best_sim)| sim > best_sim) {
                best = Some((id, sim));
            }
        }
        best.filter(|&(_, sim)| sim > self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::appearance::{DESCRIPTOR_LEN, HsvHistogram};
    use crate::tracker::rect::Rect;

    fn one_hot(bin: usize) -> Descriptor {
        let mut values = vec![0.0; DESCRIPTOR_LEN];
        values[bin] = 1.0;
        Descriptor::from_vec(values)
    }

    fn lost_with(entries: &[(u64, Descriptor)]) -> BTreeMap<u64, Track> {
        entries
            .iter()
            .map(|(id, d)| (*id, Track::new(*id, Rect::new(0.0, 0.0, 5.0, 5.0), d.clone(), 0)))
            .collect()
    }

    #[test]
    fn test_picks_most_similar() {
        let lost = lost_with(&[(1, one_hot(3)), (2, one_hot(9))]);
        let reid = ReIdentifier::new(0.45);
        let (id, sim) = reid.best_match(&HsvHistogram, &one_hot(9), &lost).unwrap();
        assert_eq!(id, 2);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_tie_goes_to_lowest_id() {
        let lost = lost_with(&[(5, one_hot(4)), (8, one_hot(4))]);
        let reid = ReIdentifier::new(0.45);
        assert_eq!(reid.best_match(&HsvHistogram, &one_hot(4), &lost).map(|m| m.0), Some(5));
    }

    #[test]
    fn test_below_threshold_is_rejected() {
        let lost = lost_with(&[(1, one_hot(3))]);
        let reid = ReIdentifier::new(0.45);
        assert!(reid.best_match(&HsvHistogram, &one_hot(100), &lost).is_none());
    }

    #[test]
    fn test_sentinel_never_reidentifies() {
        let lost = lost_with(&[(1, Descriptor::zeros(DESCRIPTOR_LEN))]);
        let reid = ReIdentifier::new(0.45);
        assert!(
            reid.best_match(&HsvHistogram, &Descriptor::zeros(DESCRIPTOR_LEN), &lost)
                .is_none()
        );
    }
}
