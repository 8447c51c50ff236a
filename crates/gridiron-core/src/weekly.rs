// Weekly recompute: league totals, completed weeks, then (once enough weeks
// have been played) every team's schedule-adjusted ratings.
//
// Stages run strictly in order. A stage whose inputs are missing is skipped,
// never fatal. Teams in the rating stage are independent of each other: one
// team being skipped or failing does not stop the rest.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::LeagueError;
use crate::league_season::{LeagueSeason, Season};
use crate::store::{
    GameStore, LeagueSeasonStore, LeagueTotalsSource, ScheduleSource, SeasonStore,
    TeamSeasonStore,
};
use crate::team_season::TeamSeason;

/// Completed weeks required before ratings are recomputed.
pub const DEFAULT_MIN_WEEKS: u32 = 3;

/// Why a team's ratings were not recomputed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum SkipReason {
    NoScheduleTotals,
    NoScheduleGames,
    NoScheduleAverages,
    IncompleteScheduleAverages,
    NoLeagueSeason,
    NoLeagueAverage,
    Failed(String),
}

/// Outcome of one weekly run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyReport {
    pub league: String,
    pub season_year: i32,
    /// League totals after stage 1, or `None` if the stage was skipped.
    pub league_season: Option<LeagueSeason>,
    pub week_count: u32,
    /// Whether the rating stage ran at all.
    pub rankings_recomputed: bool,
    pub teams_ranked: Vec<String>,
    pub teams_skipped: Vec<(String, SkipReason)>,
}

/// Every collaborator the weekly run reads from or writes to.
pub trait WeeklyStores:
    GameStore + TeamSeasonStore + LeagueSeasonStore + SeasonStore + LeagueTotalsSource + ScheduleSource
{
}

impl<S> WeeklyStores for S where
    S: GameStore
        + TeamSeasonStore
        + LeagueSeasonStore
        + SeasonStore
        + LeagueTotalsSource
        + ScheduleSource
{
}

pub struct WeeklyUpdate<'a, S> {
    stores: &'a S,
    min_weeks: u32,
}

impl<'a, S: WeeklyStores> WeeklyUpdate<'a, S> {
    pub fn new(stores: &'a S) -> Self {
        Self {
            stores,
            min_weeks: DEFAULT_MIN_WEEKS,
        }
    }

    pub fn with_min_weeks(mut self, min_weeks: u32) -> Self {
        self.min_weeks = min_weeks;
        self
    }

    /// Run all three stages for `league` in `season_year`.
    ///
    /// Collaborator errors in stages 1 and 2 abort the run; in stage 3 they
    /// are recorded against the team and the loop moves on.
    pub fn run(&self, league: &str, season_year: i32) -> Result<WeeklyReport, LeagueError> {
        info!(league, season_year, "weekly update started");

        let league_season = self.refresh_league_totals(league, season_year)?;
        let week_count = self.refresh_week_count(season_year)?;

        let mut report = WeeklyReport {
            league: league.to_string(),
            season_year,
            league_season,
            week_count,
            rankings_recomputed: false,
            teams_ranked: Vec::new(),
            teams_skipped: Vec::new(),
        };

        if week_count < self.min_weeks {
            info!(
                week_count,
                min_weeks = self.min_weeks,
                "not enough weeks played, rankings left unchanged"
            );
            return Ok(report);
        }

        report.rankings_recomputed = true;
        for mut team_season in TeamSeasonStore::get_all_for_season(self.stores, season_year)? {
            match self.rank_team(&mut team_season) {
                Ok(None) => report.teams_ranked.push(team_season.team),
                Ok(Some(reason)) => {
                    debug!(team = %team_season.team, ?reason, "team skipped");
                    report.teams_skipped.push((team_season.team, reason));
                }
                Err(e) => {
                    warn!(team = %team_season.team, "ranking failed: {e}");
                    report
                        .teams_skipped
                        .push((team_season.team, SkipReason::Failed(e.to_string())));
                }
            }
        }

        info!(
            ranked = report.teams_ranked.len(),
            skipped = report.teams_skipped.len(),
            "weekly update finished"
        );
        Ok(report)
    }

    /// Stage 1. Returns the refreshed league season, or `None` when the totals
    /// source has nothing yet.
    fn refresh_league_totals(
        &self,
        league: &str,
        season_year: i32,
    ) -> Result<Option<LeagueSeason>, LeagueError> {
        let Some((total_games, total_points)) =
            self.stores.get_totals(league, season_year)?.complete()
        else {
            info!(league, season_year, "league totals unavailable, skipped");
            return Ok(None);
        };

        let mut league_season = LeagueSeasonStore::get(self.stores, league, season_year)?
            .unwrap_or_else(|| LeagueSeason::new(league, season_year));
        league_season.update_totals(total_games, total_points);
        LeagueSeasonStore::save(self.stores, &league_season)?;
        debug!(
            total_games,
            total_points,
            average = ?league_season.average_points,
            "league totals refreshed"
        );
        Ok(Some(league_season))
    }

    /// Stage 2. The latest week with a recorded game, written even when zero.
    fn refresh_week_count(&self, season_year: i32) -> Result<u32, LeagueError> {
        let week_count = GameStore::get_all_for_season(self.stores, season_year)?
            .iter()
            .map(|g| g.week)
            .max()
            .unwrap_or(0);

        let mut season = SeasonStore::get(self.stores, season_year)?
            .unwrap_or_else(|| Season::new(season_year));
        season.num_of_weeks_completed = week_count;
        SeasonStore::save(self.stores, &season)?;
        Ok(week_count)
    }

    /// Stage 3 for one team. `Ok(Some(reason))` means a precondition was not
    /// met and nothing was written.
    fn rank_team(&self, team_season: &mut TeamSeason) -> Result<Option<SkipReason>, LeagueError> {
        let team = team_season.team.clone();
        let year = team_season.season_year;

        let Some(totals) = self.stores.get_schedule_totals(&team, year)? else {
            return Ok(Some(SkipReason::NoScheduleTotals));
        };
        if totals.schedule_games.is_none() {
            return Ok(Some(SkipReason::NoScheduleGames));
        }

        let Some(averages) = self.stores.get_schedule_averages(&team, year)? else {
            return Ok(Some(SkipReason::NoScheduleAverages));
        };
        let Some((schedule_points_for, schedule_points_against)) = averages.complete() else {
            return Ok(Some(SkipReason::IncompleteScheduleAverages));
        };

        let Some(league_season) = LeagueSeasonStore::get(self.stores, &team_season.league, year)?
        else {
            return Ok(Some(SkipReason::NoLeagueSeason));
        };
        let Some(league_average) = league_season.average_points else {
            return Ok(Some(SkipReason::NoLeagueAverage));
        };

        team_season.update_rankings(schedule_points_for, schedule_points_against, league_average);
        TeamSeasonStore::save(self.stores, team_season)?;
        Ok(None)
    }
}
