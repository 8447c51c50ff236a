// Error taxonomy for the engine.
//
// Missing statistical data is not an error: it is carried as `None` through
// the formulas. These variants cover caller mistakes, absent entities, and
// collaborator failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LeagueError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{entity} not found: {key}")]
    EntityNotFound { entity: &'static str, key: String },

    #[error("team {team} did not play in game {guest} at {host}")]
    NotParticipant {
        team: String,
        guest: String,
        host: String,
    },

    #[error("game {guest} at {host} has unequal scores but no decided winner")]
    UndecidedOutcome { guest: String, host: String },

    #[error("removing a game would drive {field} below zero for {team} ({season_year})")]
    CounterUnderflow {
        team: String,
        season_year: i32,
        field: &'static str,
    },

    #[error("prediction unavailable: {team} has no {field}")]
    PredictionUnavailable { team: String, field: &'static str },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl LeagueError {
    pub(crate) fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        LeagueError::EntityNotFound {
            entity,
            key: key.into(),
        }
    }
}
