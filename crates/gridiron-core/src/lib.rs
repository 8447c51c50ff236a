// Rating and aggregate-maintenance engine: team-season bookkeeping, the
// Pythagorean rating model, the weekly recompute pipeline, and score
// prediction. No I/O happens here; collaborators are reached through the
// traits in `store`.

pub mod aggregation;
pub mod coordinator;
pub mod error;
pub mod game;
pub mod league_season;
pub mod memory;
pub mod numeric;
pub mod predictor;
pub mod schedule;
pub mod standings;
pub mod store;
pub mod team_season;
pub mod weekly;

pub use error::LeagueError;
pub use game::{Game, GameId};
pub use league_season::{LeagueSeason, Season};
pub use team_season::TeamSeason;
