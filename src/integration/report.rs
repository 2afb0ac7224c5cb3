use serde::{Deserialize, Serialize};

use crate::error::CountError;
use crate::integration::pipeline::RunSummary;
use crate::tracker::Tally;

/// Payload posted to the seat-count service after a counting run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatReport {
    pub bus_id: String,
    pub boarded: u32,
    pub alighted: u32,
}

impl SeatReport {
    pub fn new(bus_id: impl Into<String>, boarded: u32, alighted: u32) -> Self {
        Self {
            bus_id: bus_id.into(),
            boarded,
            alighted,
        }
    }

    pub fn from_tally(bus_id: impl Into<String>, tally: Tally) -> Self {
        Self::new(bus_id, tally.boarded, tally.alighted)
    }

    /// Combine a boarding run and an alighting run over separate streams.
    pub fn from_runs(
        bus_id: impl Into<String>,
        boarding: &RunSummary,
        alighting: &RunSummary,
    ) -> Self {
        Self::new(bus_id, boarding.tally.boarded, alighting.tally.alighted)
    }

    /// Passengers on board and free seats after applying this report.
    ///
    /// Not clamped: an over-full bus shows negative free seats.
    pub fn occupancy(&self, on_board: u32, total_seats: u32) -> Occupancy {
        let on_board = i64::from(on_board) + i64::from(self.boarded) - i64::from(self.alighted);
        Occupancy {
            on_board,
            available_seats: i64::from(total_seats) - on_board,
            total_seats,
        }
    }

    pub fn to_json(&self) -> Result<String, CountError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occupancy {
    pub on_board: i64,
    pub available_seats: i64,
    pub total_seats: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_json_shape() {
        let report = SeatReport::from_tally("BusA", Tally { boarded: 3, alighted: 1 });
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"bus_id": "BusA", "boarded": 3, "alighted": 1})
        );
    }

    #[test]
    fn test_occupancy_after_report() {
        let report = SeatReport::new("BusA", 4, 1);
        assert_eq!(
            report.occupancy(10, 42),
            Occupancy { on_board: 13, available_seats: 29, total_seats: 42 }
        );
        assert_eq!(SeatReport::new("BusA", 0, 5).occupancy(2, 42).on_board, -3);
    }
}
