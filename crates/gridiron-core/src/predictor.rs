// Score prediction from two teams' schedule-adjusted ratings.

use serde::Serialize;

use crate::error::LeagueError;
use crate::numeric::round_to;
use crate::store::TeamSeasonStore;
use crate::team_season::TeamSeason;

/// Predicted points for each side, rounded to one decimal. Both are `None`
/// when either team has no record for the season.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PredictedScore {
    pub guest: Option<f64>,
    pub host: Option<f64>,
}

/// The four rating fields a prediction reads from one team.
struct Ratings {
    offensive_factor: f64,
    offensive_average: f64,
    defensive_factor: f64,
    defensive_average: f64,
}

impl Ratings {
    fn of(ts: &TeamSeason) -> Result<Self, LeagueError> {
        let require = |value: Option<f64>, field: &'static str| {
            value.ok_or_else(|| LeagueError::PredictionUnavailable {
                team: ts.team.clone(),
                field,
            })
        };
        Ok(Ratings {
            offensive_factor: require(ts.offensive_factor, "offensive_factor")?,
            offensive_average: require(ts.offensive_average, "offensive_average")?,
            defensive_factor: require(ts.defensive_factor, "defensive_factor")?,
            defensive_average: require(ts.defensive_average, "defensive_average")?,
        })
    }
}

/// Each side's score averages two estimates: its offensive factor applied to
/// what the opponent's defense allows, and the opponent's defensive factor
/// applied to its own scoring average.
pub fn predict_game_score(
    guest: Option<&TeamSeason>,
    host: Option<&TeamSeason>,
) -> Result<PredictedScore, LeagueError> {
    let (Some(guest), Some(host)) = (guest, host) else {
        return Ok(PredictedScore::default());
    };
    let g = Ratings::of(guest)?;
    let h = Ratings::of(host)?;

    let guest_score = (g.offensive_factor * h.defensive_average
        + h.defensive_factor * g.offensive_average)
        / 2.0;
    let host_score = (h.offensive_factor * g.defensive_average
        + g.defensive_factor * h.offensive_average)
        / 2.0;

    Ok(PredictedScore {
        guest: Some(round_to(guest_score, 1)),
        host: Some(round_to(host_score, 1)),
    })
}

/// Look both teams up for `season_year` and predict their game.
pub fn predict<T: TeamSeasonStore>(
    team_seasons: &T,
    guest: &str,
    host: &str,
    season_year: i32,
) -> Result<PredictedScore, LeagueError> {
    let guest = team_seasons.get_by_team_and_season(guest, season_year)?;
    let host = team_seasons.get_by_team_and_season(host, season_year)?;
    predict_game_score(guest.as_ref(), host.as_ref())
}
