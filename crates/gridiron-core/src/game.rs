// Game value object and outcome resolution.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LeagueError;

/// Identifier assigned to a game by the game store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub i64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for GameId {
    fn from(id: i64) -> Self {
        GameId(id)
    }
}

/// One contest between a guest and a host team.
///
/// The winner/loser fields are derived from the scores by
/// [`Game::decide_winner_and_loser`] and are never meaningful on their own;
/// they are skipped when serializing and recomputed after loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// Assigned by the store on insert; `None` for a game not yet saved.
    pub id: Option<GameId>,
    pub season_year: i32,
    pub week: u32,
    pub guest: String,
    pub guest_score: u32,
    pub host: String,
    pub host_score: u32,
    pub is_playoff: bool,
    pub notes: Option<String>,
    #[serde(skip)]
    pub winner: Option<String>,
    #[serde(skip)]
    pub winner_score: Option<u32>,
    #[serde(skip)]
    pub loser: Option<String>,
    #[serde(skip)]
    pub loser_score: Option<u32>,
}

impl Game {
    /// Build an unsaved game with an undecided outcome.
    pub fn new(
        season_year: i32,
        week: u32,
        guest: impl Into<String>,
        guest_score: u32,
        host: impl Into<String>,
        host_score: u32,
    ) -> Self {
        Game {
            id: None,
            season_year,
            week,
            guest: guest.into(),
            guest_score,
            host: host.into(),
            host_score,
            is_playoff: false,
            notes: None,
            winner: None,
            winner_score: None,
            loser: None,
            loser_score: None,
        }
    }

    pub fn with_id(mut self, id: GameId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn playoff(mut self, is_playoff: bool) -> Self {
        self.is_playoff = is_playoff;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Fill in winner/loser from the scores. Equal scores clear all four
    /// derived fields. Calling this repeatedly yields the same result.
    pub fn decide_winner_and_loser(&mut self) {
        let (winner, winner_score, loser, loser_score) = if self.guest_score > self.host_score {
            (
                Some(self.guest.clone()),
                Some(self.guest_score),
                Some(self.host.clone()),
                Some(self.host_score),
            )
        } else if self.host_score > self.guest_score {
            (
                Some(self.host.clone()),
                Some(self.host_score),
                Some(self.guest.clone()),
                Some(self.guest_score),
            )
        } else {
            (None, None, None, None)
        };
        self.winner = winner;
        self.winner_score = winner_score;
        self.loser = loser;
        self.loser_score = loser_score;
    }

    pub fn is_tie(&self) -> bool {
        self.guest_score == self.host_score
    }

    /// Whether `team` is the guest or the host of this game.
    pub fn involves(&self, team: &str) -> bool {
        self.guest == team || self.host == team
    }

    /// Reject games the aggregation cannot attribute to two distinct teams.
    pub fn validate(&self) -> Result<(), LeagueError> {
        if self.guest.trim().is_empty() {
            return Err(LeagueError::Validation("guest team is required".into()));
        }
        if self.host.trim().is_empty() {
            return Err(LeagueError::Validation("host team is required".into()));
        }
        if self.guest == self.host {
            return Err(LeagueError::Validation(format!(
                "team {} cannot play itself",
                self.guest
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} week {}: {} {} at {} {}",
            self.season_year, self.week, self.guest, self.guest_score, self.host, self.host_score
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_win() {
        let mut game = Game::new(2023, 1, "Bears", 24, "Packers", 17);
        game.decide_winner_and_loser();
        assert_eq!(game.winner.as_deref(), Some("Bears"));
        assert_eq!(game.winner_score, Some(24));
        assert_eq!(game.loser.as_deref(), Some("Packers"));
        assert_eq!(game.loser_score, Some(17));
        assert!(!game.is_tie());
    }

    #[test]
    fn host_win() {
        let mut game = Game::new(2023, 1, "Bears", 3, "Packers", 38);
        game.decide_winner_and_loser();
        assert_eq!(game.winner.as_deref(), Some("Packers"));
        assert_eq!(game.winner_score, Some(38));
        assert_eq!(game.loser.as_deref(), Some("Bears"));
        assert_eq!(game.loser_score, Some(3));
    }

    #[test]
    fn tie_clears_derived_fields() {
        let mut game = Game::new(2023, 4, "Bears", 20, "Packers", 20);
        game.winner = Some("stale".into());
        game.winner_score = Some(1);
        game.decide_winner_and_loser();
        assert!(game.is_tie());
        assert_eq!(game.winner, None);
        assert_eq!(game.winner_score, None);
        assert_eq!(game.loser, None);
        assert_eq!(game.loser_score, None);
    }

    #[test]
    fn scoreless_tie_is_a_tie() {
        let mut game = Game::new(2023, 4, "Bears", 0, "Packers", 0);
        game.decide_winner_and_loser();
        assert!(game.is_tie());
        assert!(game.winner.is_none());
    }

    #[test]
    fn tie_iff_no_winner() {
        for guest_score in 0..6 {
            for host_score in 0..6 {
                let mut game = Game::new(2023, 1, "A", guest_score, "B", host_score);
                game.decide_winner_and_loser();
                assert_eq!(game.is_tie(), game.winner.is_none());
            }
        }
    }

    #[test]
    fn deciding_twice_is_idempotent() {
        let mut game = Game::new(2023, 2, "Lions", 31, "Vikings", 28);
        game.decide_winner_and_loser();
        let first = game.clone();
        game.decide_winner_and_loser();
        assert_eq!(game, first);
    }

    #[test]
    fn validate_rejects_blank_and_self_games() {
        assert!(Game::new(2023, 1, "", 0, "B", 0).validate().is_err());
        assert!(Game::new(2023, 1, "A", 0, "  ", 0).validate().is_err());
        assert!(Game::new(2023, 1, "A", 7, "A", 3).validate().is_err());
        assert!(Game::new(2023, 1, "A", 7, "B", 3).validate().is_ok());
    }

    #[test]
    fn derived_fields_are_not_serialized() {
        let mut game = Game::new(2023, 1, "A", 7, "B", 3).with_id(GameId(9));
        game.decide_winner_and_loser();
        let json = serde_json::to_value(&game).unwrap();
        assert_eq!(json["id"], 9);
        assert!(json.get("winner").is_none());
        assert!(json.get("loser_score").is_none());

        let mut back: Game = serde_json::from_value(json).unwrap();
        assert!(back.winner.is_none());
        back.decide_winner_and_loser();
        assert_eq!(back, game);
    }
}
