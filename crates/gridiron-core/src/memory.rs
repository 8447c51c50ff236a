// In-memory implementation of every collaborator trait.
//
// Used by the test suites and by callers that keep league data in memory.
// League totals are summed from the stored team seasons; schedule rows are
// supplied by the caller.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{bail, Result};

use crate::game::{Game, GameId};
use crate::league_season::{LeagueSeason, Season};
use crate::schedule::{LeagueTotals, ScheduleAverages, ScheduleTotals};
use crate::store::{
    GameStore, LeagueSeasonStore, LeagueTotalsSource, ScheduleSource, SeasonStore,
    TeamSeasonStore,
};
use crate::team_season::TeamSeason;

#[derive(Debug, Default)]
struct Tables {
    next_game_id: i64,
    games: BTreeMap<GameId, Game>,
    team_seasons: BTreeMap<(String, i32), TeamSeason>,
    league_seasons: BTreeMap<(String, i32), LeagueSeason>,
    seasons: BTreeMap<i32, Season>,
    schedule_totals: BTreeMap<(String, i32), ScheduleTotals>,
    schedule_averages: BTreeMap<(String, i32), ScheduleAverages>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store mutex poisoned")
    }

    /// Record the opponent schedule strength for a team season.
    pub fn set_schedule(
        &self,
        team: &str,
        season_year: i32,
        totals: ScheduleTotals,
        averages: ScheduleAverages,
    ) {
        let key = (team.to_string(), season_year);
        let mut tables = self.tables();
        tables.schedule_totals.insert(key.clone(), totals);
        tables.schedule_averages.insert(key, averages);
    }
}

impl GameStore for MemoryStore {
    fn get(&self, id: GameId) -> Result<Option<Game>> {
        Ok(self.tables().games.get(&id).cloned())
    }

    fn get_all_for_season(&self, season_year: i32) -> Result<Vec<Game>> {
        Ok(self
            .tables()
            .games
            .values()
            .filter(|g| g.season_year == season_year)
            .cloned()
            .collect())
    }

    fn add(&self, game: &Game) -> Result<GameId> {
        let mut tables = self.tables();
        tables.next_game_id += 1;
        let id = GameId(tables.next_game_id);
        let mut stored = game.clone();
        stored.id = Some(id);
        tables.games.insert(id, stored);
        Ok(id)
    }

    fn replace(&self, game: &Game) -> Result<()> {
        let Some(id) = game.id else {
            bail!("cannot replace a game without an id");
        };
        let mut tables = self.tables();
        match tables.games.get_mut(&id) {
            Some(slot) => {
                *slot = game.clone();
                Ok(())
            }
            None => bail!("game {id} does not exist"),
        }
    }

    fn delete(&self, id: GameId) -> Result<()> {
        self.tables().games.remove(&id);
        Ok(())
    }
}

impl TeamSeasonStore for MemoryStore {
    fn get_by_team_and_season(&self, team: &str, season_year: i32) -> Result<Option<TeamSeason>> {
        Ok(self
            .tables()
            .team_seasons
            .get(&(team.to_string(), season_year))
            .cloned())
    }

    fn get_all_for_season(&self, season_year: i32) -> Result<Vec<TeamSeason>> {
        Ok(self
            .tables()
            .team_seasons
            .values()
            .filter(|ts| ts.season_year == season_year)
            .cloned()
            .collect())
    }

    fn save(&self, team_season: &TeamSeason) -> Result<()> {
        self.tables().team_seasons.insert(
            (team_season.team.clone(), team_season.season_year),
            team_season.clone(),
        );
        Ok(())
    }
}

impl LeagueSeasonStore for MemoryStore {
    fn get(&self, league: &str, season_year: i32) -> Result<Option<LeagueSeason>> {
        Ok(self
            .tables()
            .league_seasons
            .get(&(league.to_string(), season_year))
            .cloned())
    }

    fn save(&self, league_season: &LeagueSeason) -> Result<()> {
        self.tables().league_seasons.insert(
            (league_season.league.clone(), league_season.season_year),
            league_season.clone(),
        );
        Ok(())
    }
}

impl SeasonStore for MemoryStore {
    fn get(&self, year: i32) -> Result<Option<Season>> {
        Ok(self.tables().seasons.get(&year).cloned())
    }

    fn save(&self, season: &Season) -> Result<()> {
        self.tables().seasons.insert(season.year, season.clone());
        Ok(())
    }
}

impl LeagueTotalsSource for MemoryStore {
    fn get_totals(&self, league: &str, season_year: i32) -> Result<LeagueTotals> {
        let tables = self.tables();
        let members: Vec<&TeamSeason> = tables
            .team_seasons
            .values()
            .filter(|ts| ts.league == league && ts.season_year == season_year)
            .collect();
        if members.is_empty() {
            return Ok(LeagueTotals::default());
        }
        Ok(LeagueTotals {
            total_games: Some(members.iter().map(|ts| ts.games).sum()),
            total_points: Some(members.iter().map(|ts| ts.points_for).sum()),
        })
    }
}

impl ScheduleSource for MemoryStore {
    fn get_schedule_totals(&self, team: &str, season_year: i32) -> Result<Option<ScheduleTotals>> {
        Ok(self
            .tables()
            .schedule_totals
            .get(&(team.to_string(), season_year))
            .copied())
    }

    fn get_schedule_averages(
        &self,
        team: &str,
        season_year: i32,
    ) -> Result<Option<ScheduleAverages>> {
        Ok(self
            .tables()
            .schedule_averages
            .get(&(team.to_string(), season_year))
            .copied())
    }
}
