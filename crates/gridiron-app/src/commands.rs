// Operations behind each CLI subcommand, run against the SQLite database.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use gridiron_core::coordinator::GameCoordinator;
use gridiron_core::predictor::{self, PredictedScore};
use gridiron_core::standings::rank_teams;
use gridiron_core::store::{GameStore, TeamSeasonStore};
use gridiron_core::weekly::{WeeklyReport, WeeklyUpdate};
use gridiron_core::{Game, GameId, LeagueError, TeamSeason};
use gridiron_db::Database;

use crate::import;

/// Register a team for a season. Existing records are never overwritten,
/// since that would discard their accumulated counters.
pub fn add_team(
    db: &Database,
    team: &str,
    season_year: i32,
    league: &str,
    conference: Option<&str>,
    division: Option<&str>,
) -> Result<TeamSeason> {
    if team.trim().is_empty() {
        bail!("team name is required");
    }
    if db.get_by_team_and_season(team, season_year)?.is_some() {
        bail!("{team} already has a record for {season_year}");
    }

    let mut team_season = TeamSeason::new(team, season_year, league);
    team_season.conference = conference.map(str::to_string);
    team_season.division = division.map(str::to_string);
    TeamSeasonStore::save(db, &team_season)?;
    info!(team, season_year, league, "added team season");
    Ok(team_season)
}

pub fn add_game(db: &Database, game: Game) -> Result<Game> {
    let game = GameCoordinator::new(db, db).add_game(game)?;
    Ok(game)
}

/// Field changes for an existing game; `None` keeps the stored value.
#[derive(Debug, Default, Clone)]
pub struct GameEdit {
    pub week: Option<u32>,
    pub guest: Option<String>,
    pub guest_score: Option<u32>,
    pub host: Option<String>,
    pub host_score: Option<u32>,
    pub is_playoff: Option<bool>,
    pub notes: Option<String>,
}

impl GameEdit {
    fn apply_to(self, game: &mut Game) {
        if let Some(week) = self.week {
            game.week = week;
        }
        if let Some(guest) = self.guest {
            game.guest = guest;
        }
        if let Some(score) = self.guest_score {
            game.guest_score = score;
        }
        if let Some(host) = self.host {
            game.host = host;
        }
        if let Some(score) = self.host_score {
            game.host_score = score;
        }
        if let Some(is_playoff) = self.is_playoff {
            game.is_playoff = is_playoff;
        }
        if let Some(notes) = self.notes {
            game.notes = Some(notes).filter(|n| !n.is_empty());
        }
    }
}

pub fn edit_game(db: &Database, id: GameId, edit: GameEdit) -> Result<Game> {
    let old = GameStore::get(db, id)?.ok_or_else(|| LeagueError::EntityNotFound {
        entity: "game",
        key: id.to_string(),
    })?;
    let mut new = old.clone();
    edit.apply_to(&mut new);

    let game = GameCoordinator::new(db, db).update_game(Some(new), Some(old))?;
    Ok(game)
}

pub fn delete_game(db: &Database, id: GameId) -> Result<Game> {
    let game = GameCoordinator::new(db, db).delete_game(id)?;
    Ok(game)
}

/// Counts from one games import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ImportSummary {
    pub added: usize,
    pub rejected: usize,
}

/// Add every game in the CSV at `path`. Games the engine refuses (no team
/// in the league, invalid participants) are counted and skipped; store
/// failures abort the import.
pub fn import_games(db: &Database, path: &Path) -> Result<ImportSummary> {
    let games = import::load_games(path)?;
    let coordinator = GameCoordinator::new(db, db);

    let mut summary = ImportSummary::default();
    for game in games {
        let label = game.to_string();
        match coordinator.add_game(game) {
            Ok(_) => summary.added += 1,
            Err(LeagueError::Store(e)) => {
                return Err(e.context(format!("failed to import game {label}")));
            }
            Err(e) => {
                warn!("game '{}' rejected: {}", label, e);
                summary.rejected += 1;
            }
        }
    }
    info!(
        added = summary.added,
        rejected = summary.rejected,
        path = %path.display(),
        "games imported"
    );
    Ok(summary)
}

pub fn import_schedule(db: &Database, path: &Path) -> Result<usize> {
    let rows = import::load_schedule(path)?;
    let count = db
        .import_schedule(&rows)
        .with_context(|| format!("failed to store schedule from {}", path.display()))?;
    info!(count, path = %path.display(), "schedule imported");
    Ok(count)
}

pub fn weekly_update(
    db: &Database,
    league: &str,
    season_year: i32,
    min_weeks: u32,
) -> Result<WeeklyReport> {
    let report = WeeklyUpdate::new(db)
        .with_min_weeks(min_weeks)
        .run(league, season_year)?;
    Ok(report)
}

pub fn predict(db: &Database, guest: &str, host: &str, season_year: i32) -> Result<PredictedScore> {
    let score = predictor::predict(db, guest, host, season_year)?;
    Ok(score)
}

/// Every team season for the year, best rated first.
pub fn standings(db: &Database, season_year: i32) -> Result<Vec<TeamSeason>> {
    let team_seasons = TeamSeasonStore::get_all_for_season(db, season_year)?;
    Ok(rank_teams(&team_seasons).into_iter().cloned().collect())
}
