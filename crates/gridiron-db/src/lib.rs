// SQLite persistence for games, team seasons, league seasons, seasons, and
// the imported schedule-strength rows.

use std::sync::{Mutex, MutexGuard};

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use gridiron_core::schedule::{LeagueTotals, ScheduleAverages, ScheduleTotals};
use gridiron_core::store::{
    GameStore, LeagueSeasonStore, LeagueTotalsSource, ScheduleSource, SeasonStore,
    TeamSeasonStore,
};
use gridiron_core::{Game, GameId, LeagueSeason, Season, TeamSeason};

/// One imported schedule-strength row for a team season.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRow {
    pub team: String,
    pub season_year: i32,
    pub totals: ScheduleTotals,
    pub averages: ScheduleAverages,
}

/// SQLite-backed implementation of every collaborator trait the engine uses.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS games (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                season_year INTEGER NOT NULL,
                week        INTEGER NOT NULL,
                guest       TEXT NOT NULL,
                guest_score INTEGER NOT NULL,
                host        TEXT NOT NULL,
                host_score  INTEGER NOT NULL,
                is_playoff  INTEGER NOT NULL DEFAULT 0,
                notes       TEXT,
                updated_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS team_seasons (
                team            TEXT NOT NULL,
                season_year     INTEGER NOT NULL,
                league          TEXT NOT NULL,
                conference      TEXT,
                division        TEXT,
                games           INTEGER NOT NULL DEFAULT 0,
                wins            INTEGER NOT NULL DEFAULT 0,
                losses          INTEGER NOT NULL DEFAULT 0,
                ties            INTEGER NOT NULL DEFAULT 0,
                points_for      INTEGER NOT NULL DEFAULT 0,
                points_against  INTEGER NOT NULL DEFAULT 0,
                winning_percentage REAL,
                expected_wins      REAL,
                expected_losses    REAL,
                offensive_average  REAL,
                offensive_factor   REAL,
                offensive_index    REAL,
                defensive_average  REAL,
                defensive_factor   REAL,
                defensive_index    REAL,
                final_expected_winning_percentage REAL,
                updated_at      TEXT NOT NULL,
                PRIMARY KEY (team, season_year)
            );

            CREATE TABLE IF NOT EXISTS league_seasons (
                league         TEXT NOT NULL,
                season_year    INTEGER NOT NULL,
                total_games    INTEGER NOT NULL DEFAULT 0,
                total_points   INTEGER NOT NULL DEFAULT 0,
                average_points REAL,
                updated_at     TEXT NOT NULL,
                PRIMARY KEY (league, season_year)
            );

            CREATE TABLE IF NOT EXISTS seasons (
                year                   INTEGER PRIMARY KEY,
                num_of_weeks_completed INTEGER NOT NULL DEFAULT 0,
                updated_at             TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS schedule_strength (
                team               TEXT NOT NULL,
                season_year        INTEGER NOT NULL,
                schedule_games     INTEGER,
                points_for         REAL,
                points_against     REAL,
                avg_points_for     REAL,
                avg_points_against REAL,
                PRIMARY KEY (team, season_year)
            );
            ",
        )
        .context("failed to create database schema")?;

        conn.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_games_season ON games(season_year);
             CREATE INDEX IF NOT EXISTS idx_team_seasons_league ON team_seasons(league, season_year);",
        )
        .context("failed to create indexes")?;

        debug!(path, "database schema ready");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock).
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Replace the schedule-strength rows in a single transaction. Rows for
    /// team seasons not in `rows` are left alone.
    pub fn import_schedule(&self, rows: &[ScheduleRow]) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .context("failed to begin schedule import transaction")?;
        for row in rows {
            tx.execute(
                "INSERT OR REPLACE INTO schedule_strength
                    (team, season_year, schedule_games, points_for, points_against,
                     avg_points_for, avg_points_against)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    row.team,
                    row.season_year,
                    row.totals.schedule_games,
                    row.totals.points_for,
                    row.totals.points_against,
                    row.averages.points_for,
                    row.averages.points_against,
                ],
            )
            .with_context(|| format!("failed to import schedule for {}", row.team))?;
        }
        tx.commit().context("failed to commit schedule import")?;
        debug!(rows = rows.len(), "schedule strength rows stored");
        Ok(rows.len())
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

const GAME_COLUMNS: &str =
    "id, season_year, week, guest, guest_score, host, host_score, is_playoff, notes";

/// Map a `GAME_COLUMNS` row. The outcome is derived again, never stored.
fn game_from_row(row: &Row<'_>) -> rusqlite::Result<Game> {
    let mut game = Game {
        id: Some(GameId(row.get(0)?)),
        season_year: row.get(1)?,
        week: row.get(2)?,
        guest: row.get(3)?,
        guest_score: row.get(4)?,
        host: row.get(5)?,
        host_score: row.get(6)?,
        is_playoff: row.get(7)?,
        notes: row.get(8)?,
        winner: None,
        winner_score: None,
        loser: None,
        loser_score: None,
    };
    game.decide_winner_and_loser();
    Ok(game)
}

const TEAM_SEASON_COLUMNS: &str = "team, season_year, league, conference, division,
    games, wins, losses, ties, points_for, points_against,
    winning_percentage, expected_wins, expected_losses,
    offensive_average, offensive_factor, offensive_index,
    defensive_average, defensive_factor, defensive_index,
    final_expected_winning_percentage";

fn team_season_from_row(row: &Row<'_>) -> rusqlite::Result<TeamSeason> {
    Ok(TeamSeason {
        team: row.get(0)?,
        season_year: row.get(1)?,
        league: row.get(2)?,
        conference: row.get(3)?,
        division: row.get(4)?,
        games: row.get(5)?,
        wins: row.get(6)?,
        losses: row.get(7)?,
        ties: row.get(8)?,
        points_for: row.get(9)?,
        points_against: row.get(10)?,
        winning_percentage: row.get(11)?,
        expected_wins: row.get(12)?,
        expected_losses: row.get(13)?,
        offensive_average: row.get(14)?,
        offensive_factor: row.get(15)?,
        offensive_index: row.get(16)?,
        defensive_average: row.get(17)?,
        defensive_factor: row.get(18)?,
        defensive_index: row.get(19)?,
        final_expected_winning_percentage: row.get(20)?,
    })
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

impl GameStore for Database {
    fn get(&self, id: GameId) -> Result<Option<Game>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {GAME_COLUMNS} FROM games WHERE id = ?1"),
            params![id.0],
            game_from_row,
        )
        .optional()
        .with_context(|| format!("failed to load game {id}"))
    }

    fn get_all_for_season(&self, season_year: i32) -> Result<Vec<Game>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {GAME_COLUMNS} FROM games WHERE season_year = ?1 ORDER BY week, id"
            ))
            .context("failed to prepare games query")?;
        let games = stmt
            .query_map(params![season_year], game_from_row)
            .context("failed to query games")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map game rows")?;
        Ok(games)
    }

    fn add(&self, game: &Game) -> Result<GameId> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO games
                (season_year, week, guest, guest_score, host, host_score, is_playoff, notes, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                game.season_year,
                game.week,
                game.guest,
                game.guest_score,
                game.host,
                game.host_score,
                game.is_playoff,
                game.notes,
                now(),
            ],
        )
        .context("failed to insert game")?;
        Ok(GameId(conn.last_insert_rowid()))
    }

    fn replace(&self, game: &Game) -> Result<()> {
        let Some(id) = game.id else {
            bail!("cannot replace a game without an id");
        };
        let conn = self.conn();
        let changed = conn
            .execute(
                "UPDATE games SET
                    season_year = ?2, week = ?3, guest = ?4, guest_score = ?5,
                    host = ?6, host_score = ?7, is_playoff = ?8, notes = ?9, updated_at = ?10
                 WHERE id = ?1",
                params![
                    id.0,
                    game.season_year,
                    game.week,
                    game.guest,
                    game.guest_score,
                    game.host,
                    game.host_score,
                    game.is_playoff,
                    game.notes,
                    now(),
                ],
            )
            .with_context(|| format!("failed to replace game {id}"))?;
        if changed == 0 {
            bail!("game {id} does not exist");
        }
        Ok(())
    }

    fn delete(&self, id: GameId) -> Result<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM games WHERE id = ?1", params![id.0])
            .with_context(|| format!("failed to delete game {id}"))?;
        Ok(())
    }
}

impl TeamSeasonStore for Database {
    fn get_by_team_and_season(&self, team: &str, season_year: i32) -> Result<Option<TeamSeason>> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT {TEAM_SEASON_COLUMNS} FROM team_seasons WHERE team = ?1 AND season_year = ?2"
            ),
            params![team, season_year],
            team_season_from_row,
        )
        .optional()
        .with_context(|| format!("failed to load team season {team} {season_year}"))
    }

    fn get_all_for_season(&self, season_year: i32) -> Result<Vec<TeamSeason>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {TEAM_SEASON_COLUMNS} FROM team_seasons WHERE season_year = ?1 ORDER BY team"
            ))
            .context("failed to prepare team seasons query")?;
        let team_seasons = stmt
            .query_map(params![season_year], team_season_from_row)
            .context("failed to query team seasons")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map team season rows")?;
        Ok(team_seasons)
    }

    fn save(&self, ts: &TeamSeason) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO team_seasons ({TEAM_SEASON_COLUMNS}, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                         ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)"
            ),
            params![
                ts.team,
                ts.season_year,
                ts.league,
                ts.conference,
                ts.division,
                ts.games,
                ts.wins,
                ts.losses,
                ts.ties,
                ts.points_for,
                ts.points_against,
                ts.winning_percentage,
                ts.expected_wins,
                ts.expected_losses,
                ts.offensive_average,
                ts.offensive_factor,
                ts.offensive_index,
                ts.defensive_average,
                ts.defensive_factor,
                ts.defensive_index,
                ts.final_expected_winning_percentage,
                now(),
            ],
        )
        .with_context(|| format!("failed to save team season {} {}", ts.team, ts.season_year))?;
        Ok(())
    }
}

impl LeagueSeasonStore for Database {
    fn get(&self, league: &str, season_year: i32) -> Result<Option<LeagueSeason>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT league, season_year, total_games, total_points, average_points
             FROM league_seasons WHERE league = ?1 AND season_year = ?2",
            params![league, season_year],
            |row| {
                Ok(LeagueSeason {
                    league: row.get(0)?,
                    season_year: row.get(1)?,
                    total_games: row.get(2)?,
                    total_points: row.get(3)?,
                    average_points: row.get(4)?,
                })
            },
        )
        .optional()
        .with_context(|| format!("failed to load league season {league} {season_year}"))
    }

    fn save(&self, ls: &LeagueSeason) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO league_seasons
                (league, season_year, total_games, total_points, average_points, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                ls.league,
                ls.season_year,
                ls.total_games,
                ls.total_points,
                ls.average_points,
                now(),
            ],
        )
        .context("failed to save league season")?;
        Ok(())
    }
}

impl SeasonStore for Database {
    fn get(&self, year: i32) -> Result<Option<Season>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT year, num_of_weeks_completed FROM seasons WHERE year = ?1",
            params![year],
            |row| {
                Ok(Season {
                    year: row.get(0)?,
                    num_of_weeks_completed: row.get(1)?,
                })
            },
        )
        .optional()
        .with_context(|| format!("failed to load season {year}"))
    }

    fn save(&self, season: &Season) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO seasons (year, num_of_weeks_completed, updated_at)
             VALUES (?1, ?2, ?3)",
            params![season.year, season.num_of_weeks_completed, now()],
        )
        .context("failed to save season")?;
        Ok(())
    }
}

impl LeagueTotalsSource for Database {
    /// Games and points summed over the league's team seasons. Both are NULL
    /// (and so `None`) when the league has no team seasons that year.
    fn get_totals(&self, league: &str, season_year: i32) -> Result<LeagueTotals> {
        let conn = self.conn();
        let (games, points): (Option<i64>, Option<i64>) = conn
            .query_row(
                "SELECT SUM(games), SUM(points_for) FROM team_seasons
                 WHERE league = ?1 AND season_year = ?2",
                params![league, season_year],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .context("failed to sum league totals")?;
        Ok(LeagueTotals {
            total_games: games.map(u32::try_from).transpose()?,
            total_points: points.map(u32::try_from).transpose()?,
        })
    }
}

impl ScheduleSource for Database {
    fn get_schedule_totals(&self, team: &str, season_year: i32) -> Result<Option<ScheduleTotals>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT schedule_games, points_for, points_against FROM schedule_strength
             WHERE team = ?1 AND season_year = ?2",
            params![team, season_year],
            |row| {
                Ok(ScheduleTotals {
                    schedule_games: row.get(0)?,
                    points_for: row.get(1)?,
                    points_against: row.get(2)?,
                })
            },
        )
        .optional()
        .context("failed to load schedule totals")
    }

    fn get_schedule_averages(
        &self,
        team: &str,
        season_year: i32,
    ) -> Result<Option<ScheduleAverages>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT avg_points_for, avg_points_against FROM schedule_strength
             WHERE team = ?1 AND season_year = ?2",
            params![team, season_year],
            |row| {
                Ok(ScheduleAverages {
                    points_for: row.get(0)?,
                    points_against: row.get(1)?,
                })
            },
        )
        .optional()
        .context("failed to load schedule averages")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
