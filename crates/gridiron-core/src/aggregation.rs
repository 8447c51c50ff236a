// Applying and reversing one game's effect on a team season.
//
// Both strategies share a single counter-delta routine parameterized by the
// direction's sign, so a subtract is the exact mirror of an add.

use tracing::debug;

use crate::error::LeagueError;
use crate::game::Game;
use crate::team_season::{CounterDelta, TeamSeason};

/// Sign convention for counter updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn sign(self) -> i64 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }
}

/// What to do with a game's contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAggregation {
    /// A newly recorded game (or the new version of an edited one).
    Add,
    /// Undo a game before deleting it or before re-applying an edit.
    Subtract,
}

impl GameAggregation {
    pub fn direction(self) -> Direction {
        match self {
            GameAggregation::Add => Direction::Up,
            GameAggregation::Subtract => Direction::Down,
        }
    }

    /// Apply this strategy to one participant's team season, then refresh its
    /// winning percentage and Pythagorean expectation.
    ///
    /// The game's outcome must already be decided; wins and losses are
    /// attributed by team name, not by guest/host role.
    pub fn apply(self, team_season: &mut TeamSeason, game: &Game) -> Result<(), LeagueError> {
        let delta = counter_delta(team_season, game, self.direction())?;
        team_season.apply_delta(&delta)?;
        team_season.calculate_winning_percentage();
        team_season.calculate_expected_wins_and_losses();
        debug!(
            team = %team_season.team,
            season = team_season.season_year,
            strategy = ?self,
            %game,
            "aggregated game"
        );
        Ok(())
    }
}

/// The change `game` makes to `team_season` in `direction`.
pub fn counter_delta(
    team_season: &TeamSeason,
    game: &Game,
    direction: Direction,
) -> Result<CounterDelta, LeagueError> {
    let team = team_season.team.as_str();
    if !game.involves(team) || team_season.season_year != game.season_year {
        return Err(LeagueError::NotParticipant {
            team: team.to_string(),
            guest: game.guest.clone(),
            host: game.host.clone(),
        });
    }

    let sign = direction.sign();
    let mut delta = CounterDelta {
        games: sign,
        ..Default::default()
    };

    if game.is_tie() {
        delta.ties = sign;
    } else {
        match (game.winner.as_deref(), game.loser.as_deref()) {
            (Some(winner), _) if winner == team => delta.wins = sign,
            (_, Some(loser)) if loser == team => delta.losses = sign,
            _ => {
                return Err(LeagueError::UndecidedOutcome {
                    guest: game.guest.clone(),
                    host: game.host.clone(),
                })
            }
        }
    }

    let (scored, allowed) = if game.guest == team {
        (game.guest_score, game.host_score)
    } else {
        (game.host_score, game.guest_score)
    };
    delta.points_for = sign * i64::from(scored);
    delta.points_against = sign * i64::from(allowed);

    Ok(delta)
}
