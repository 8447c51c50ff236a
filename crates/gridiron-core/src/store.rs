// Collaborator seams: persistence and the externally computed inputs.
//
// Methods take `&self`; implementations that mutate guard their state
// internally (the SQLite adapter holds its connection behind a mutex).

use anyhow::Result;

use crate::game::{Game, GameId};
use crate::league_season::{LeagueSeason, Season};
use crate::schedule::{LeagueTotals, ScheduleAverages, ScheduleTotals};
use crate::team_season::TeamSeason;

pub trait GameStore {
    fn get(&self, id: GameId) -> Result<Option<Game>>;
    fn get_all_for_season(&self, season_year: i32) -> Result<Vec<Game>>;
    /// Insert a new game and return the id the store assigned to it.
    fn add(&self, game: &Game) -> Result<GameId>;
    /// Overwrite the stored game with the same id.
    fn replace(&self, game: &Game) -> Result<()>;
    fn delete(&self, id: GameId) -> Result<()>;
}

pub trait TeamSeasonStore {
    fn get_by_team_and_season(&self, team: &str, season_year: i32) -> Result<Option<TeamSeason>>;
    fn get_all_for_season(&self, season_year: i32) -> Result<Vec<TeamSeason>>;
    /// Insert or update the record keyed by (team, season_year).
    fn save(&self, team_season: &TeamSeason) -> Result<()>;
}

pub trait LeagueSeasonStore {
    fn get(&self, league: &str, season_year: i32) -> Result<Option<LeagueSeason>>;
    fn save(&self, league_season: &LeagueSeason) -> Result<()>;
}

pub trait SeasonStore {
    fn get(&self, year: i32) -> Result<Option<Season>>;
    fn save(&self, season: &Season) -> Result<()>;
}

/// League-wide scoring totals for a season.
pub trait LeagueTotalsSource {
    fn get_totals(&self, league: &str, season_year: i32) -> Result<LeagueTotals>;
}

/// Opponent schedule strength for a team season.
pub trait ScheduleSource {
    fn get_schedule_totals(&self, team: &str, season_year: i32) -> Result<Option<ScheduleTotals>>;
    fn get_schedule_averages(
        &self,
        team: &str,
        season_year: i32,
    ) -> Result<Option<ScheduleAverages>>;
}
