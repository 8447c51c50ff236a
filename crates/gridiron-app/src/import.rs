// CSV loading for game results and schedule-strength rows.
//
// Rows that fail to deserialize or describe an impossible game are skipped
// with a warning; only unreadable files and broken CSV framing are errors.

use std::io::Read;
use std::path::Path;

use gridiron_core::schedule::{ScheduleAverages, ScheduleTotals};
use gridiron_core::Game;
use gridiron_db::ScheduleRow;
use serde::Deserialize;
use tracing::warn;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

// ---------------------------------------------------------------------------
// Raw CSV rows
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawGame {
    season_year: i32,
    week: u32,
    guest: String,
    guest_score: u32,
    host: String,
    host_score: u32,
    #[serde(default)]
    is_playoff: Option<bool>,
    #[serde(default)]
    notes: Option<String>,
}

/// Empty cells are null: the schedule source may not know every number yet.
#[derive(Debug, Deserialize)]
struct RawSchedule {
    team: String,
    season_year: i32,
    schedule_games: Option<u32>,
    points_for: Option<f64>,
    points_against: Option<f64>,
    avg_points_for: Option<f64>,
    avg_points_against: Option<f64>,
}

fn finite(value: Option<f64>) -> bool {
    value.map_or(true, f64::is_finite)
}

// ---------------------------------------------------------------------------
// Reader-based loaders
// ---------------------------------------------------------------------------

pub fn load_games_from_reader<R: Read>(rdr: R) -> Result<Vec<Game>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut games = Vec::new();
    for result in reader.deserialize::<RawGame>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed game row: {}", e);
                continue;
            }
        };
        let mut game = Game::new(
            raw.season_year,
            raw.week,
            raw.guest,
            raw.guest_score,
            raw.host,
            raw.host_score,
        )
        .playoff(raw.is_playoff.unwrap_or(false));
        game.notes = raw.notes.filter(|n| !n.is_empty());

        if let Err(e) = game.validate() {
            warn!("skipping game row '{}': {}", game, e);
            continue;
        }
        games.push(game);
    }
    Ok(games)
}

pub fn load_schedule_from_reader<R: Read>(rdr: R) -> Result<Vec<ScheduleRow>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut rows = Vec::new();
    for result in reader.deserialize::<RawSchedule>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed schedule row: {}", e);
                continue;
            }
        };
        if raw.team.is_empty() {
            warn!("skipping schedule row with no team");
            continue;
        }
        let reals = [
            raw.points_for,
            raw.points_against,
            raw.avg_points_for,
            raw.avg_points_against,
        ];
        if !reals.into_iter().all(finite) {
            warn!("skipping schedule row '{}': non-finite value", raw.team);
            continue;
        }
        rows.push(ScheduleRow {
            team: raw.team,
            season_year: raw.season_year,
            totals: ScheduleTotals {
                schedule_games: raw.schedule_games,
                points_for: raw.points_for,
                points_against: raw.points_against,
            },
            averages: ScheduleAverages {
                points_for: raw.avg_points_for,
                points_against: raw.avg_points_against,
            },
        });
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Path-based wrappers
// ---------------------------------------------------------------------------

pub fn load_games(path: &Path) -> Result<Vec<Game>, ImportError> {
    let file = std::fs::File::open(path).map_err(|e| ImportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_games_from_reader(file).map_err(|e| ImportError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

pub fn load_schedule(path: &Path) -> Result<Vec<ScheduleRow>, ImportError> {
    let file = std::fs::File::open(path).map_err(|e| ImportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_schedule_from_reader(file).map_err(|e| ImportError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
