// Per-team-season aggregate and its rating formulas.

use serde::{Deserialize, Serialize};

use crate::error::LeagueError;
use crate::numeric::{divide, power};

/// Pythagorean exponent for football scoring.
pub const EXPONENT: f64 = 2.37;

/// One team's record within one season.
///
/// The counters are maintained incrementally by the aggregation strategies.
/// Every derived field is recomputed only by an explicit method call and is
/// `None` until enough data exists to compute it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSeason {
    pub team: String,
    pub season_year: i32,
    pub league: String,
    pub conference: Option<String>,
    pub division: Option<String>,

    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub points_for: u32,
    pub points_against: u32,

    pub winning_percentage: Option<f64>,
    pub expected_wins: Option<f64>,
    pub expected_losses: Option<f64>,
    pub offensive_average: Option<f64>,
    pub offensive_factor: Option<f64>,
    pub offensive_index: Option<f64>,
    pub defensive_average: Option<f64>,
    pub defensive_factor: Option<f64>,
    pub defensive_index: Option<f64>,
    pub final_expected_winning_percentage: Option<f64>,
}

/// Per-game average, schedule factor, and blended index for one side of the
/// ball.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RatingComponent {
    pub average: Option<f64>,
    pub factor: Option<f64>,
    pub index: Option<f64>,
}

/// Signed change to every counter of a team season, produced by applying or
/// reversing one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterDelta {
    pub games: i64,
    pub wins: i64,
    pub losses: i64,
    pub ties: i64,
    pub points_for: i64,
    pub points_against: i64,
}

impl TeamSeason {
    /// A fresh record with zeroed counters and nothing derived yet.
    pub fn new(team: impl Into<String>, season_year: i32, league: impl Into<String>) -> Self {
        TeamSeason {
            team: team.into(),
            season_year,
            league: league.into(),
            conference: None,
            division: None,
            games: 0,
            wins: 0,
            losses: 0,
            ties: 0,
            points_for: 0,
            points_against: 0,
            winning_percentage: None,
            expected_wins: None,
            expected_losses: None,
            offensive_average: None,
            offensive_factor: None,
            offensive_index: None,
            defensive_average: None,
            defensive_factor: None,
            defensive_index: None,
            final_expected_winning_percentage: None,
        }
    }

    pub fn with_conference(mut self, conference: impl Into<String>) -> Self {
        self.conference = Some(conference.into());
        self
    }

    pub fn with_division(mut self, division: impl Into<String>) -> Self {
        self.division = Some(division.into());
        self
    }

    /// Apply `delta` to the counters, all or nothing. If any counter would go
    /// negative or overflow, nothing is changed.
    pub fn apply_delta(&mut self, delta: &CounterDelta) -> Result<(), LeagueError> {
        let games = self.shifted(self.games, delta.games, "games")?;
        let wins = self.shifted(self.wins, delta.wins, "wins")?;
        let losses = self.shifted(self.losses, delta.losses, "losses")?;
        let ties = self.shifted(self.ties, delta.ties, "ties")?;
        let points_for = self.shifted(self.points_for, delta.points_for, "points_for")?;
        let points_against =
            self.shifted(self.points_against, delta.points_against, "points_against")?;

        self.games = games;
        self.wins = wins;
        self.losses = losses;
        self.ties = ties;
        self.points_for = points_for;
        self.points_against = points_against;
        Ok(())
    }

    fn shifted(&self, value: u32, delta: i64, field: &'static str) -> Result<u32, LeagueError> {
        u32::try_from(i64::from(value) + delta).map_err(|_| LeagueError::CounterUnderflow {
            team: self.team.clone(),
            season_year: self.season_year,
            field,
        })
    }

    /// Ties count as half a win: `(2 * wins + ties) / (2 * games)`.
    pub fn calculate_winning_percentage(&mut self) {
        self.winning_percentage = if self.games == 0 {
            None
        } else {
            divide(
                f64::from(2 * self.wins + self.ties),
                f64::from(2 * self.games),
            )
        };
    }

    /// Pythagorean expectation: `pf^e / (pf^e + pa^e)`. `None` when both sides
    /// are zero or either input is missing.
    pub fn expected_winning_percentage(
        points_for: Option<f64>,
        points_against: Option<f64>,
    ) -> Option<f64> {
        let offense = power(points_for, EXPONENT)?;
        let defense = power(points_against, EXPONENT)?;
        divide(offense, offense + defense)
    }

    /// Expected wins and losses over the games played so far.
    ///
    /// Note the convention here differs from `update_rankings`: without enough
    /// scoring data both fields become zero rather than staying unset.
    pub fn calculate_expected_wins_and_losses(&mut self) {
        let games = f64::from(self.games);
        match Self::expected_winning_percentage(
            Some(f64::from(self.points_for)),
            Some(f64::from(self.points_against)),
        ) {
            Some(p) => {
                self.expected_wins = Some(p * games);
                self.expected_losses = Some((1.0 - p) * games);
            }
            None => {
                self.expected_wins = Some(0.0);
                self.expected_losses = Some(0.0);
            }
        }
    }

    /// Blend a raw per-game average with its schedule-adjusted counterpart.
    ///
    /// `factor` compares the team's average against what its opponents
    /// typically allow (or score); `index` is the mean of the raw average and
    /// the factor scaled to the league average.
    pub fn rating_component(
        points: u32,
        games: u32,
        opponent_schedule_average: f64,
        league_average: f64,
    ) -> RatingComponent {
        if games == 0 {
            return RatingComponent::default();
        }
        let average = divide(f64::from(points), f64::from(games));
        let factor = average.and_then(|a| divide(a, opponent_schedule_average));
        let index = match (average, factor) {
            (Some(a), Some(f)) => divide(a + f * league_average, 2.0),
            _ => None,
        };
        RatingComponent {
            average,
            factor,
            index,
        }
    }

    /// Recompute the schedule-adjusted offensive and defensive ratings.
    ///
    /// Offense is measured against the points the schedule typically allows,
    /// defense against the points it typically scores. The final expected
    /// winning percentage is only replaced when both indices exist.
    pub fn update_rankings(
        &mut self,
        schedule_avg_points_for: f64,
        schedule_avg_points_against: f64,
        league_avg_points: f64,
    ) {
        let offense = Self::rating_component(
            self.points_for,
            self.games,
            schedule_avg_points_against,
            league_avg_points,
        );
        let defense = Self::rating_component(
            self.points_against,
            self.games,
            schedule_avg_points_for,
            league_avg_points,
        );

        self.offensive_average = offense.average;
        self.offensive_factor = offense.factor;
        self.offensive_index = offense.index;
        self.defensive_average = defense.average;
        self.defensive_factor = defense.factor;
        self.defensive_index = defense.index;

        if offense.index.is_some() && defense.index.is_some() {
            self.final_expected_winning_percentage =
                Self::expected_winning_percentage(offense.index, defense.index);
        }
    }

    /// Whether the counter invariant `wins + losses + ties == games` holds.
    pub fn is_consistent(&self) -> bool {
        u64::from(self.wins) + u64::from(self.losses) + u64::from(self.ties)
            == u64::from(self.games)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn record(games: u32, points_for: u32, points_against: u32) -> TeamSeason {
        let mut ts = TeamSeason::new("Bears", 2023, "NFL");
        ts.games = games;
        ts.points_for = points_for;
        ts.points_against = points_against;
        ts
    }

    fn approx(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("value should be present");
        assert!(
            (actual - expected).abs() < EPS,
            "expected {expected}, got {actual}"
        );
    }

    // -- Winning percentage --

    #[test]
    fn winning_percentage_none_without_games() {
        let mut ts = record(0, 0, 0);
        ts.calculate_winning_percentage();
        assert_eq!(ts.winning_percentage, None);
    }

    #[test]
    fn winning_percentage_counts_ties_as_half() {
        let mut ts = record(4, 0, 0);
        ts.wins = 2;
        ts.losses = 1;
        ts.ties = 1;
        ts.calculate_winning_percentage();
        approx(ts.winning_percentage, 5.0 / 8.0);
    }

    #[test]
    fn winning_percentage_stays_in_unit_range() {
        for wins in 0..5u32 {
            for losses in 0..5u32 {
                for ties in 0..3u32 {
                    let mut ts = record(wins + losses + ties, 0, 0);
                    ts.wins = wins;
                    ts.losses = losses;
                    ts.ties = ties;
                    ts.calculate_winning_percentage();
                    match ts.winning_percentage {
                        None => assert_eq!(ts.games, 0),
                        Some(p) => assert!((0.0..=1.0).contains(&p)),
                    }
                }
            }
        }
    }

    // -- Pythagorean expectation --

    #[test]
    fn expected_percentage_none_when_both_sides_zero() {
        assert_eq!(
            TeamSeason::expected_winning_percentage(Some(0.0), Some(0.0)),
            None
        );
        assert_eq!(TeamSeason::expected_winning_percentage(None, Some(10.0)), None);
    }

    #[test]
    fn expected_percentage_even_scoring_is_half() {
        approx(
            TeamSeason::expected_winning_percentage(Some(300.0), Some(300.0)),
            0.5,
        );
    }

    #[test]
    fn expected_percentage_shutout_extremes() {
        approx(TeamSeason::expected_winning_percentage(Some(21.0), Some(0.0)), 1.0);
        approx(TeamSeason::expected_winning_percentage(Some(0.0), Some(21.0)), 0.0);
    }

    #[test]
    fn expected_wins_and_losses_split_games() {
        let mut ts = record(10, 300, 200);
        ts.calculate_expected_wins_and_losses();
        let p = 300f64.powf(EXPONENT) / (300f64.powf(EXPONENT) + 200f64.powf(EXPONENT));
        approx(ts.expected_wins, p * 10.0);
        approx(ts.expected_losses, (1.0 - p) * 10.0);
        approx(
            Some(ts.expected_wins.unwrap() + ts.expected_losses.unwrap()),
            10.0,
        );
    }

    #[test]
    fn expected_wins_and_losses_default_to_zero() {
        let mut ts = record(2, 0, 0);
        ts.calculate_expected_wins_and_losses();
        assert_eq!(ts.expected_wins, Some(0.0));
        assert_eq!(ts.expected_losses, Some(0.0));
    }

    // -- Rating components --

    #[test]
    fn rating_component_without_games_is_empty() {
        assert_eq!(
            TeamSeason::rating_component(50, 0, 20.0, 20.0),
            RatingComponent::default()
        );
    }

    #[test]
    fn rating_component_zero_schedule_leaves_factor_and_index_unset() {
        let c = TeamSeason::rating_component(60, 3, 0.0, 0.0);
        approx(c.average, 20.0);
        assert_eq!(c.factor, None);
        assert_eq!(c.index, None);
    }

    #[test]
    fn update_rankings_with_empty_schedule() {
        let mut ts = record(3, 60, 60);
        ts.update_rankings(0.0, 0.0, 0.0);

        approx(ts.offensive_average, 20.0);
        approx(ts.defensive_average, 20.0);
        assert_eq!(ts.offensive_factor, None);
        assert_eq!(ts.defensive_factor, None);
        assert_eq!(ts.offensive_index, None);
        assert_eq!(ts.defensive_index, None);
        assert_eq!(ts.final_expected_winning_percentage, None);
    }

    #[test]
    fn update_rankings_against_average_schedule() {
        let mut ts = record(3, 45, 75);
        ts.update_rankings(20.0, 20.0, 20.0);

        approx(ts.offensive_average, 15.0);
        approx(ts.offensive_factor, 0.75);
        approx(ts.offensive_index, 15.0);
        approx(ts.defensive_average, 25.0);
        approx(ts.defensive_factor, 1.25);
        approx(ts.defensive_index, 25.0);

        let expected = 15f64.powf(EXPONENT) / (15f64.powf(EXPONENT) + 25f64.powf(EXPONENT));
        approx(ts.final_expected_winning_percentage, expected);
    }

    #[test]
    fn update_rankings_uses_opposite_schedule_side() {
        // Offense is judged against what opponents allow, defense against
        // what they score.
        let mut ts = record(2, 40, 20);
        ts.update_rankings(10.0, 40.0, 25.0);
        approx(ts.offensive_factor, 20.0 / 40.0);
        approx(ts.defensive_factor, 10.0 / 10.0);
        approx(ts.offensive_index, (20.0 + 0.5 * 25.0) / 2.0);
        approx(ts.defensive_index, (10.0 + 1.0 * 25.0) / 2.0);
    }

    #[test]
    fn update_rankings_is_idempotent() {
        let mut ts = record(5, 130, 95);
        ts.update_rankings(21.5, 19.25, 22.0);
        let first = ts.clone();
        ts.update_rankings(21.5, 19.25, 22.0);
        assert_eq!(ts, first);
    }

    #[test]
    fn update_rankings_keeps_previous_final_when_indices_missing() {
        let mut ts = record(3, 45, 75);
        ts.update_rankings(20.0, 20.0, 20.0);
        let previous = ts.final_expected_winning_percentage;
        assert!(previous.is_some());

        ts.update_rankings(0.0, 0.0, 20.0);
        assert_eq!(ts.offensive_index, None);
        assert_eq!(ts.final_expected_winning_percentage, previous);
    }

    // -- Counter deltas --

    #[test]
    fn apply_delta_is_all_or_nothing() {
        let mut ts = record(1, 10, 3);
        ts.wins = 1;
        let before = ts.clone();

        let delta = CounterDelta {
            games: -1,
            losses: -1,
            points_for: -10,
            points_against: -3,
            ..Default::default()
        };
        let err = ts.apply_delta(&delta).unwrap_err();
        assert!(matches!(
            err,
            LeagueError::CounterUnderflow { field: "losses", .. }
        ));
        assert_eq!(ts, before);
    }

    #[test]
    fn consistency_check() {
        let mut ts = record(3, 0, 0);
        ts.wins = 1;
        ts.losses = 1;
        assert!(!ts.is_consistent());
        ts.ties = 1;
        assert!(ts.is_consistent());
    }
}
