// Gridiron command-line entry point.
//
// Startup sequence:
// 1. Parse arguments
// 2. Load config (copying defaults on first run)
// 3. Initialize tracing (log to file; stdout carries command output)
// 4. Open database
// 5. Run the subcommand and print its result

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use gridiron_app::commands::{self, GameEdit};
use gridiron_app::config;
use gridiron_core::weekly::WeeklyReport;
use gridiron_core::{Game, GameId, TeamSeason};
use gridiron_db::Database;

/// Team-season ratings and score predictions for a football league.
#[derive(Parser)]
#[command(version)]
struct Options {
    /// Directory holding config/ and defaults/.
    #[arg(long, env = "GRIDIRON_HOME", default_value = ".")]
    config_dir: PathBuf,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a team for a season.
    AddTeam {
        team: String,
        #[arg(short, long)]
        year: i32,
        /// Defaults to the configured league.
        #[arg(short, long)]
        league: Option<String>,
        #[arg(long)]
        conference: Option<String>,
        #[arg(long)]
        division: Option<String>,
    },
    /// Record a game result.
    AddGame {
        #[arg(short, long)]
        year: i32,
        #[arg(short, long)]
        week: u32,
        guest: String,
        guest_score: u32,
        host: String,
        host_score: u32,
        #[arg(long)]
        playoff: bool,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Change a recorded game. Omitted fields keep their values.
    EditGame {
        id: i64,
        #[arg(long)]
        week: Option<u32>,
        #[arg(long)]
        guest: Option<String>,
        #[arg(long)]
        guest_score: Option<u32>,
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        host_score: Option<u32>,
        #[arg(long)]
        playoff: Option<bool>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Remove a recorded game.
    DeleteGame { id: i64 },
    /// Add every game in a CSV file.
    ImportGames { path: PathBuf },
    /// Load opponent schedule strength from a CSV file.
    ImportSchedule { path: PathBuf },
    /// Refresh league totals, completed weeks, and team ratings.
    WeeklyUpdate {
        #[arg(short, long)]
        year: i32,
        /// Defaults to the configured league.
        #[arg(short, long)]
        league: Option<String>,
    },
    /// Predict the score of a game between two rated teams.
    Predict {
        guest: String,
        host: String,
        #[arg(short, long)]
        year: i32,
    },
    /// List a season's teams, best rated first.
    Standings {
        #[arg(short, long)]
        year: i32,
    },
}

fn main() -> anyhow::Result<()> {
    let opt = Options::parse();

    let config = config::load_config(&opt.config_dir).context("failed to load configuration")?;
    init_tracing(&opt.config_dir.join(&config.logging.directory))?;
    info!(
        "Config loaded: league={}, min weeks={}",
        config.league.default_league, config.ratings.min_weeks_completed
    );

    let db_path = opt.config_dir.join(&config.database.path);
    let db_path = db_path.to_str().context("database path is not valid UTF-8")?;
    let db = Database::open(db_path).context("failed to open database")?;
    info!("Database opened at {}", db_path);

    let json = opt.json;
    match opt.command {
        Command::AddTeam {
            team,
            year,
            league,
            conference,
            division,
        } => {
            let league = league.unwrap_or_else(|| config.league.default_league.clone());
            let ts = commands::add_team(
                &db,
                &team,
                year,
                &league,
                conference.as_deref(),
                division.as_deref(),
            )?;
            emit(json, &ts, || println!("added {} ({}) for {}", ts.team, ts.league, year))?;
        }
        Command::AddGame {
            year,
            week,
            guest,
            guest_score,
            host,
            host_score,
            playoff,
            notes,
        } => {
            let mut game =
                Game::new(year, week, guest, guest_score, host, host_score).playoff(playoff);
            game.notes = notes;
            let game = commands::add_game(&db, game)?;
            emit(json, &game, || print_game("added", &game))?;
        }
        Command::EditGame {
            id,
            week,
            guest,
            guest_score,
            host,
            host_score,
            playoff,
            notes,
        } => {
            let edit = GameEdit {
                week,
                guest,
                guest_score,
                host,
                host_score,
                is_playoff: playoff,
                notes,
            };
            let game = commands::edit_game(&db, GameId(id), edit)?;
            emit(json, &game, || print_game("updated", &game))?;
        }
        Command::DeleteGame { id } => {
            let game = commands::delete_game(&db, GameId(id))?;
            emit(json, &game, || print_game("deleted", &game))?;
        }
        Command::ImportGames { path } => {
            let summary = commands::import_games(&db, &path)?;
            emit(json, &summary, || {
                println!(
                    "imported {} games, {} rejected (see log)",
                    summary.added, summary.rejected
                )
            })?;
        }
        Command::ImportSchedule { path } => {
            let count = commands::import_schedule(&db, &path)?;
            emit(json, &count, || println!("imported {count} schedule rows"))?;
        }
        Command::WeeklyUpdate { year, league } => {
            let league = league.unwrap_or_else(|| config.league.default_league.clone());
            let report =
                commands::weekly_update(&db, &league, year, config.ratings.min_weeks_completed)?;
            emit(json, &report, || print_report(&report))?;
        }
        Command::Predict { guest, host, year } => {
            let score = commands::predict(&db, &guest, &host, year)?;
            emit(json, &score, || match (score.guest, score.host) {
                (Some(g), Some(h)) => println!("{guest} {g:.1} at {host} {h:.1}"),
                _ => println!("no prediction: {guest} or {host} has no {year} record"),
            })?;
        }
        Command::Standings { year } => {
            let table = commands::standings(&db, year)?;
            emit(json, &table, || print_standings(&table))?;
        }
    }

    Ok(())
}

/// Print `value` as JSON when requested, otherwise run the text printer.
fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce()) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("failed to serialize output")?
        );
    } else {
        text();
    }
    Ok(())
}

fn print_game(verb: &str, game: &Game) {
    let id = game.id.map(|id| id.to_string()).unwrap_or_default();
    println!("{verb} game {id}: {game}");
}

fn print_report(report: &WeeklyReport) {
    match &report.league_season {
        Some(ls) => println!(
            "{} {}: {} games, {} points, average {}",
            ls.league,
            ls.season_year,
            ls.total_games,
            ls.total_points,
            fmt_opt(ls.average_points, 2)
        ),
        None => println!("{} {}: no league totals yet", report.league, report.season_year),
    }
    println!("weeks completed: {}", report.week_count);
    if !report.rankings_recomputed {
        println!("ratings unchanged (not enough weeks played)");
        return;
    }
    println!("rated: {}", report.teams_ranked.len());
    for (team, reason) in &report.teams_skipped {
        println!("skipped {team}: {reason:?}");
    }
}

fn print_standings(table: &[TeamSeason]) {
    println!(
        "{:<4} {:<24} {:>3} {:>3} {:>3} {:>6} {:>6}",
        "#", "Team", "W", "L", "T", "Pct", "Rating"
    );
    for (rank, ts) in table.iter().enumerate() {
        println!(
            "{:<4} {:<24} {:>3} {:>3} {:>3} {:>6} {:>6}",
            rank + 1,
            ts.team,
            ts.wins,
            ts.losses,
            ts.ties,
            fmt_opt(ts.winning_percentage, 3),
            fmt_opt(ts.final_expected_winning_percentage, 3)
        );
    }
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{v:.precision$}"))
        .unwrap_or_else(|| "-".into())
}

const DEFAULT_FILTER: &str = "gridiron=info,gridiron_app=info,gridiron_core=info,gridiron_db=info,warn";

/// Initialize tracing to log to a file (stdout is reserved for command output).
fn init_tracing(log_dir: &Path) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("gridiron.log"))
        .context("failed to open log file")?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
