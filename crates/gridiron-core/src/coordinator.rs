// Add, edit, and delete games while keeping team-season aggregates in step.

use tracing::{debug, info};

use crate::aggregation::GameAggregation;
use crate::error::LeagueError;
use crate::game::{Game, GameId};
use crate::store::{GameStore, TeamSeasonStore};
use crate::team_season::TeamSeason;

/// Orchestrates the game lifecycle over a game store and a team-season store.
///
/// A participant without a team season for the game's year is outside the
/// league: the game is still recorded, but only in-league participants have
/// their aggregates touched.
pub struct GameCoordinator<'a, G, T> {
    games: &'a G,
    team_seasons: &'a T,
}

impl<'a, G, T> GameCoordinator<'a, G, T>
where
    G: GameStore,
    T: TeamSeasonStore,
{
    pub fn new(games: &'a G, team_seasons: &'a T) -> Self {
        Self {
            games,
            team_seasons,
        }
    }

    /// Record a new game and add it to its participants' aggregates.
    ///
    /// Fails with `EntityNotFound` when neither team has a record for the
    /// season. Returns the game as stored, with its id and decided outcome.
    pub fn add_game(&self, mut game: Game) -> Result<Game, LeagueError> {
        game.validate()?;
        self.require_in_league(&game)?;

        game.decide_winner_and_loser();
        let updated = self.stage(&[(GameAggregation::Add, &game)])?;
        let id = self.games.add(&game)?;
        game.id = Some(id);

        self.save_all(&updated)?;
        info!(%id, %game, "added game");
        Ok(game)
    }

    /// Replace `old_game` with `new_game`: the old contribution is subtracted
    /// from its participants before the new one is added.
    ///
    /// The edited game keeps `old_game`'s id when `new_game` has none, and
    /// like a new game it needs at least one in-league participant.
    pub fn update_game(
        &self,
        new_game: Option<Game>,
        old_game: Option<Game>,
    ) -> Result<Game, LeagueError> {
        let mut new_game =
            new_game.ok_or_else(|| LeagueError::Validation("new game is required".into()))?;
        let mut old_game =
            old_game.ok_or_else(|| LeagueError::Validation("old game is required".into()))?;
        new_game.validate()?;
        match (new_game.id, old_game.id) {
            (None, old_id) => new_game.id = old_id,
            (Some(new_id), Some(old_id)) if new_id != old_id => {
                return Err(LeagueError::Validation(format!(
                    "edited game {new_id} does not match original game {old_id}"
                )));
            }
            _ => {}
        }
        if new_game.id.is_none() {
            return Err(LeagueError::Validation(
                "edited game has no id to replace".into(),
            ));
        }
        self.require_in_league(&new_game)?;

        new_game.decide_winner_and_loser();
        old_game.decide_winner_and_loser();
        let updated = self.stage(&[
            (GameAggregation::Subtract, &old_game),
            (GameAggregation::Add, &new_game),
        ])?;
        self.games.replace(&new_game)?;

        self.save_all(&updated)?;
        info!(old = %old_game, new = %new_game, "updated game");
        Ok(new_game)
    }

    /// Remove a game after reversing its contribution.
    pub fn delete_game(&self, id: GameId) -> Result<Game, LeagueError> {
        let mut game = self
            .games
            .get(id)?
            .ok_or_else(|| LeagueError::not_found("game", id.to_string()))?;
        game.decide_winner_and_loser();

        let updated = self.stage(&[(GameAggregation::Subtract, &game)])?;
        self.games.delete(id)?;

        self.save_all(&updated)?;
        info!(%id, %game, "deleted game");
        Ok(game)
    }

    fn require_in_league(&self, game: &Game) -> Result<(), LeagueError> {
        for team in [&game.guest, &game.host] {
            if self
                .team_seasons
                .get_by_team_and_season(team, game.season_year)?
                .is_some()
            {
                return Ok(());
            }
        }
        Err(LeagueError::not_found(
            "team season",
            format!("{} or {} in {}", game.guest, game.host, game.season_year),
        ))
    }

    /// Apply every step to working copies of the in-league participants and
    /// return the records to save. Nothing is written, so a failing step
    /// leaves every store untouched. Later steps see earlier steps' changes.
    fn stage(&self, steps: &[(GameAggregation, &Game)]) -> Result<Vec<TeamSeason>, LeagueError> {
        let mut staged: Vec<TeamSeason> = Vec::new();
        for &(strategy, game) in steps {
            for team in [&game.guest, &game.host] {
                let existing = staged
                    .iter()
                    .position(|ts| &ts.team == team && ts.season_year == game.season_year);
                let index = match existing {
                    Some(index) => index,
                    None => {
                        let Some(team_season) = self
                            .team_seasons
                            .get_by_team_and_season(team, game.season_year)?
                        else {
                            debug!(team = %team, season = game.season_year, "team outside league, skipped");
                            continue;
                        };
                        staged.push(team_season);
                        staged.len() - 1
                    }
                };
                strategy.apply(&mut staged[index], game)?;
            }
        }
        Ok(staged)
    }

    fn save_all(&self, team_seasons: &[TeamSeason]) -> Result<(), LeagueError> {
        for team_season in team_seasons {
            self.team_seasons.save(team_season)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn league() -> MemoryStore {
        let store = MemoryStore::new();
        for team in ["Bears", "Packers", "Lions"] {
            TeamSeasonStore::save(&store, &TeamSeason::new(team, 2023, "NFL")).unwrap();
        }
        store
    }

    fn record(store: &MemoryStore, team: &str) -> TeamSeason {
        store.get_by_team_and_season(team, 2023).unwrap().unwrap()
    }

    #[test]
    fn add_game_updates_both_participants() {
        let store = league();
        let coordinator = GameCoordinator::new(&store, &store);

        let game = coordinator
            .add_game(Game::new(2023, 1, "Bears", 24, "Packers", 10))
            .unwrap();
        assert!(game.id.is_some());
        assert_eq!(game.winner.as_deref(), Some("Bears"));

        let bears = record(&store, "Bears");
        assert_eq!((bears.games, bears.wins, bears.points_for), (1, 1, 24));
        let packers = record(&store, "Packers");
        assert_eq!((packers.games, packers.losses, packers.points_against), (1, 1, 24));
    }

    #[test]
    fn add_game_with_one_outside_team_is_recorded() {
        let store = league();
        let coordinator = GameCoordinator::new(&store, &store);

        let game = coordinator
            .add_game(Game::new(2023, 2, "Bears", 35, "Barnstormers", 0))
            .unwrap();
        assert!(GameStore::get(&store, game.id.unwrap()).unwrap().is_some());
        assert_eq!(record(&store, "Bears").wins, 1);
        assert!(store
            .get_by_team_and_season("Barnstormers", 2023)
            .unwrap()
            .is_none());
    }

    #[test]
    fn add_game_with_no_league_teams_fails() {
        let store = league();
        let coordinator = GameCoordinator::new(&store, &store);
        let err = coordinator
            .add_game(Game::new(2023, 2, "Oilers", 3, "Barnstormers", 0))
            .unwrap_err();
        assert!(matches!(err, LeagueError::EntityNotFound { .. }));
        assert!(GameStore::get_all_for_season(&store, 2023).unwrap().is_empty());
    }

    #[test]
    fn add_game_for_other_season_fails() {
        let store = league();
        let coordinator = GameCoordinator::new(&store, &store);
        let err = coordinator
            .add_game(Game::new(2022, 2, "Bears", 3, "Packers", 0))
            .unwrap_err();
        assert!(matches!(err, LeagueError::EntityNotFound { .. }));
    }

    #[test]
    fn update_game_requires_both_versions() {
        let store = league();
        let coordinator = GameCoordinator::new(&store, &store);
        let game = Game::new(2023, 1, "Bears", 1, "Packers", 0);
        assert!(matches!(
            coordinator.update_game(None, Some(game.clone())),
            Err(LeagueError::Validation(_))
        ));
        assert!(matches!(
            coordinator.update_game(Some(game), None),
            Err(LeagueError::Validation(_))
        ));
    }

    #[test]
    fn update_game_flips_result() {
        let store = league();
        let coordinator = GameCoordinator::new(&store, &store);
        let old = coordinator
            .add_game(Game::new(2023, 1, "Bears", 24, "Packers", 10))
            .unwrap();

        let mut edited = old.clone();
        edited.guest_score = 7;
        edited.host_score = 21;
        let stored = coordinator.update_game(Some(edited), Some(old)).unwrap();
        assert_eq!(stored.winner.as_deref(), Some("Packers"));

        let bears = record(&store, "Bears");
        assert_eq!(
            (bears.games, bears.wins, bears.losses, bears.points_for, bears.points_against),
            (1, 0, 1, 7, 21)
        );
        let packers = record(&store, "Packers");
        assert_eq!((packers.wins, packers.losses), (1, 0));
        assert_eq!(
            GameStore::get(&store, stored.id.unwrap()).unwrap().unwrap().host_score,
            21
        );
    }

    #[test]
    fn update_game_can_change_opponent() {
        let store = league();
        let coordinator = GameCoordinator::new(&store, &store);
        let old = coordinator
            .add_game(Game::new(2023, 1, "Bears", 24, "Packers", 10))
            .unwrap();

        let mut edited = old.clone();
        edited.host = "Lions".into();
        coordinator.update_game(Some(edited), Some(old)).unwrap();

        assert_eq!(record(&store, "Packers").games, 0);
        assert_eq!(record(&store, "Lions").games, 1);
        assert_eq!(record(&store, "Bears").games, 1);
    }

    #[test]
    fn delete_game_reverses_and_removes() {
        let store = league();
        let coordinator = GameCoordinator::new(&store, &store);
        let before = record(&store, "Bears");
        let game = coordinator
            .add_game(Game::new(2023, 1, "Bears", 17, "Packers", 17))
            .unwrap();

        coordinator.delete_game(game.id.unwrap()).unwrap();
        let after = record(&store, "Bears");
        assert_eq!(after.games, before.games);
        assert_eq!(after.ties, 0);
        assert!(GameStore::get(&store, game.id.unwrap()).unwrap().is_none());
    }

    #[test]
    fn delete_missing_game_fails() {
        let store = league();
        let coordinator = GameCoordinator::new(&store, &store);
        let err = coordinator.delete_game(GameId(42)).unwrap_err();
        assert!(matches!(err, LeagueError::EntityNotFound { entity: "game", .. }));
    }

    #[test]
    fn failed_delete_leaves_records_and_game_alone() {
        let store = league();
        let coordinator = GameCoordinator::new(&store, &store);
        coordinator
            .add_game(Game::new(2023, 1, "Bears", 10, "Packers", 3))
            .unwrap();
        // Recorded while the Rams were outside the league.
        let game = coordinator
            .add_game(Game::new(2023, 2, "Bears", 21, "Rams", 3))
            .unwrap();
        TeamSeasonStore::save(&store, &TeamSeason::new("Rams", 2023, "NFL")).unwrap();
        let bears = record(&store, "Bears");
        let rams = record(&store, "Rams");

        let err = coordinator.delete_game(game.id.unwrap()).unwrap_err();
        assert!(matches!(err, LeagueError::CounterUnderflow { .. }), "got: {err}");
        assert_eq!(record(&store, "Bears"), bears);
        assert_eq!(record(&store, "Rams"), rams);
        assert!(GameStore::get(&store, game.id.unwrap()).unwrap().is_some());

        // A retry fails the same way instead of draining the Bears further.
        assert!(coordinator.delete_game(game.id.unwrap()).is_err());
        assert_eq!(record(&store, "Bears"), bears);
    }

    #[test]
    fn failed_update_leaves_stored_game_alone() {
        let store = league();
        let coordinator = GameCoordinator::new(&store, &store);
        let old = coordinator
            .add_game(Game::new(2023, 1, "Bears", 21, "Rams", 3))
            .unwrap();
        TeamSeasonStore::save(&store, &TeamSeason::new("Rams", 2023, "NFL")).unwrap();
        let bears = record(&store, "Bears");

        let mut edited = old.clone();
        edited.guest_score = 28;
        assert!(coordinator.update_game(Some(edited), Some(old.clone())).is_err());
        assert_eq!(record(&store, "Bears"), bears);
        let stored = GameStore::get(&store, old.id.unwrap()).unwrap().unwrap();
        assert_eq!(stored.guest_score, 21);
    }

    #[test]
    fn update_game_needs_a_league_team() {
        let store = league();
        let coordinator = GameCoordinator::new(&store, &store);
        let old = coordinator
            .add_game(Game::new(2023, 1, "Bears", 24, "Packers", 10))
            .unwrap();

        let mut moved = old.clone();
        moved.season_year = 2019;
        let err = coordinator.update_game(Some(moved), Some(old.clone())).unwrap_err();
        assert!(matches!(err, LeagueError::EntityNotFound { .. }), "got: {err}");
        assert_eq!(record(&store, "Bears").wins, 1);
        let stored = GameStore::get(&store, old.id.unwrap()).unwrap().unwrap();
        assert_eq!(stored.season_year, 2023);
    }

    #[test]
    fn update_game_rejects_mismatched_ids() {
        let store = league();
        let coordinator = GameCoordinator::new(&store, &store);
        let old = coordinator
            .add_game(Game::new(2023, 1, "Bears", 24, "Packers", 10))
            .unwrap();
        let other = old.clone().with_id(GameId(99));
        let err = coordinator.update_game(Some(other), Some(old)).unwrap_err();
        assert!(matches!(err, LeagueError::Validation(_)), "got: {err}");
        assert_eq!(record(&store, "Bears").games, 1);
    }
}
