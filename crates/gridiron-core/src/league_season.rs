// League-wide season totals and the season's completed-week count.

use serde::{Deserialize, Serialize};

use crate::numeric::divide;

/// Scoring totals for one league in one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueSeason {
    pub league: String,
    pub season_year: i32,
    pub total_games: u32,
    pub total_points: u32,
    /// Points per team-game across the league; the common reference for the
    /// schedule-adjusted indices.
    pub average_points: Option<f64>,
}

impl LeagueSeason {
    pub fn new(league: impl Into<String>, season_year: i32) -> Self {
        LeagueSeason {
            league: league.into(),
            season_year,
            total_games: 0,
            total_points: 0,
            average_points: None,
        }
    }

    /// Replace the totals and recompute the average.
    pub fn update_totals(&mut self, total_games: u32, total_points: u32) {
        self.total_games = total_games;
        self.total_points = total_points;
        self.average_points = divide(f64::from(total_points), f64::from(total_games));
    }
}

/// Season-level bookkeeping shared by every league playing that year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub year: i32,
    pub num_of_weeks_completed: u32,
}

impl Season {
    pub fn new(year: i32) -> Self {
        Season {
            year,
            num_of_weeks_completed: 0,
        }
    }
}
