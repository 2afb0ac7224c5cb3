//! Directional zone-crossing tally.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CountError;
use crate::tracker::track::Track;

/// Axis-aligned counting region in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Zone {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Result<Self, CountError> {
        if x1 >= x2 || y1 >= y2 {
            return Err(CountError::InvalidZone { x1, y1, x2, y2 });
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Strict containment: points on the border are outside.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.x1 < x && x < self.x2 && self.y1 < y && y < self.y2
    }
}

impl FromStr for Zone {
    type Err = CountError;

    /// Parses `x1,y1,x2,y2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let coords = s
            .split(',')
            .map(|part| part.trim().parse::<i32>())
            .collect::<Result<Vec<_>, _>>();
        match coords.as_deref() {
            Ok(&[x1, y1, x2, y2]) => Zone::new(x1, y1, x2, y2),
            _ => Err(CountError::ZoneSyntax(s.to_string())),
        }
    }
}

/// Which crossing is being counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Net downward motion through the zone
    #[default]
    Board,
    /// Net upward motion through the zone
    Alight,
}

impl FromStr for Direction {
    type Err = CountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "board" => Ok(Direction::Board),
            "alight" => Ok(Direction::Alight),
            other => Err(CountError::UnknownDirection(other.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Board => f.write_str("board"),
            Direction::Alight => f.write_str("alight"),
        }
    }
}

/// Running boarding/alighting totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub boarded: u32,
    pub alighted: u32,
}

impl Tally {
    pub fn get(&self, direction: Direction) -> u32 {
        match direction {
            Direction::Board => self.boarded,
            Direction::Alight => self.alighted,
        }
    }

    fn increment(&mut self, direction: Direction) {
        match direction {
            Direction::Board => self.boarded += 1,
            Direction::Alight => self.alighted += 1,
        }
    }
}

/// Counts each sufficiently old active track at most once when it sits in
/// the zone with enough net vertical displacement in the counted direction.
#[derive(Debug, Clone)]
pub struct ZoneCrossingCounter {
    zone: Zone,
    direction: Direction,
    min_age: u32,
    min_displacement: i32,
    tally: Tally,
}

impl ZoneCrossingCounter {
    pub fn new(zone: Zone, direction: Direction, min_age: u32, min_displacement: i32) -> Self {
        Self {
            zone,
            direction,
            min_age,
            min_displacement,
            tally: Tally::default(),
        }
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    /// Evaluate every active track, returning the ids counted on this call.
    pub fn evaluate(&mut self, active: &mut BTreeMap<u64, Track>, frame_id: u64) -> Vec<u64> {
        let mut counted = Vec::new();
        for (&id, track) in active.iter_mut() {
            if track.counted || track.age < self.min_age {
                continue;
            }
            let last = track.last_centroid();
            if !self.zone.contains(last.x, last.y) {
                continue;
            }

            let movement = last.y - track.first_centroid().y;
            let crossed = match self.direction {
                Direction::Board => movement > self.min_displacement,
                Direction::Alight => movement < -self.min_displacement,
            };
            if crossed && track.mark_counted() {
                self.tally.increment(self.direction);
                debug!(frame = frame_id, track = id, direction = %self.direction, movement, "counted");
                counted.push(id);
            }
        }
        counted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::appearance::{DESCRIPTOR_LEN, Descriptor};
    use crate::tracker::rect::Rect;

    fn box_at(cx: f32, cy: f32) -> Rect {
        Rect::from_tlbr(cx - 40.0, cy - 100.0, cx + 40.0, cy + 100.0)
    }

    /// Track whose centroids walk through `ys` at x = `cx`.
    fn walked(id: u64, cx: f32, ys: &[f32]) -> Track {
        let mut track = Track::new(id, box_at(cx, ys[0]), Descriptor::zeros(DESCRIPTOR_LEN), 0);
        for (frame, &y) in ys.iter().enumerate().skip(1) {
            track.update(box_at(cx, y), Descriptor::zeros(DESCRIPTOR_LEN), frame as u64);
        }
        track
    }

    fn zone() -> Zone {
        Zone::new(0, 450, 2000, 1000).unwrap()
    }

    #[test]
    fn test_zone_boundary_is_outside() {
        let zone = zone();
        assert!(zone.contains(1, 451));
        assert!(!zone.contains(0, 500));
        assert!(!zone.contains(2000, 500));
        assert!(!zone.contains(100, 450));
        assert!(!zone.contains(100, 1000));
    }

    #[test]
    fn test_zone_parsing() {
        assert_eq!("0, 450, 2000, 1000".parse::<Zone>().unwrap(), zone());
        assert!("10,10,5,20".parse::<Zone>().is_err());
        assert!("1,2,3".parse::<Zone>().is_err());
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("Board".parse::<Direction>().unwrap(), Direction::Board);
        assert_eq!("alight".parse::<Direction>().unwrap(), Direction::Alight);
        assert!(matches!(
            "sideways".parse::<Direction>(),
            Err(CountError::UnknownDirection(_))
        ));
    }

    #[test]
    fn test_board_counted_once() {
        let mut counter = ZoneCrossingCounter::new(zone(), Direction::Board, 6, 10);
        let mut active = BTreeMap::new();
        active.insert(1, walked(1, 100.0, &[500.0, 520.0, 540.0, 560.0, 580.0, 600.0]));

        assert_eq!(counter.evaluate(&mut active, 5), vec![1]);
        assert!(counter.evaluate(&mut active, 6).is_empty());
        assert_eq!(counter.tally(), Tally { boarded: 1, alighted: 0 });
        assert!(active[&1].counted());
    }

    #[test]
    fn test_not_counted_before_min_age() {
        let mut counter = ZoneCrossingCounter::new(zone(), Direction::Board, 6, 10);
        let mut active = BTreeMap::new();
        active.insert(1, walked(1, 100.0, &[500.0, 600.0, 700.0, 800.0, 900.0]));

        assert!(counter.evaluate(&mut active, 4).is_empty());
        assert_eq!(counter.tally().boarded, 0);
    }

    #[test]
    fn test_alight_requires_upward_motion() {
        let ys = [900.0, 880.0, 860.0, 840.0, 820.0, 800.0];
        let mut active = BTreeMap::new();
        active.insert(1, walked(1, 100.0, &ys));

        let mut board = ZoneCrossingCounter::new(zone(), Direction::Board, 6, 10);
        assert!(board.evaluate(&mut active, 5).is_empty());

        let mut alight = ZoneCrossingCounter::new(zone(), Direction::Alight, 6, 10);
        assert_eq!(alight.evaluate(&mut active, 5), vec![1]);
        assert_eq!(alight.tally(), Tally { boarded: 0, alighted: 1 });
    }

    #[test]
    fn test_small_displacement_not_counted() {
        let mut counter = ZoneCrossingCounter::new(zone(), Direction::Board, 6, 10);
        let mut active = BTreeMap::new();
        active.insert(1, walked(1, 100.0, &[500.0, 501.0, 502.0, 503.0, 504.0, 505.0]));

        assert!(counter.evaluate(&mut active, 5).is_empty());
        assert!(!active[&1].counted());
    }

    #[test]
    fn test_outside_zone_not_counted() {
        let mut counter = ZoneCrossingCounter::new(zone(), Direction::Board, 6, 10);
        let mut active = BTreeMap::new();
        active.insert(1, walked(1, 100.0, &[100.0, 150.0, 200.0, 250.0, 300.0, 350.0]));

        assert!(counter.evaluate(&mut active, 5).is_empty());
    }
}
