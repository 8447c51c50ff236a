// Inputs computed outside the engine: league totals and opponent schedule
// strength. The weighting behind the schedule numbers is the source's
// business; the engine only checks whether they are present.

use serde::{Deserialize, Serialize};

/// League totals as reported by the totals source. Either side may be
/// missing when the league has no recorded games yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LeagueTotals {
    pub total_games: Option<u32>,
    pub total_points: Option<u32>,
}

impl LeagueTotals {
    /// Both totals, if both are known.
    pub fn complete(&self) -> Option<(u32, u32)> {
        Some((self.total_games?, self.total_points?))
    }
}

/// Raw totals of a team's opponents.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScheduleTotals {
    /// Games played by the team's opponents; `None` before any opponent data.
    pub schedule_games: Option<u32>,
    pub points_for: Option<f64>,
    pub points_against: Option<f64>,
}

/// Record-weighted averages of points scored and allowed by a team's
/// opponents.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScheduleAverages {
    pub points_for: Option<f64>,
    pub points_against: Option<f64>,
}

impl ScheduleAverages {
    pub fn complete(&self) -> Option<(f64, f64)> {
        Some((self.points_for?, self.points_against?))
    }
}
