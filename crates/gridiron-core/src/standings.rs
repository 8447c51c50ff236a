// Ordering a season's team records by rating.

use std::cmp::Ordering;

use crate::team_season::TeamSeason;

/// Sort team seasons best first by final expected winning percentage.
/// Unrated teams go last; ties fall back to winning percentage, then name.
pub fn rank_teams(team_seasons: &[TeamSeason]) -> Vec<&TeamSeason> {
    let mut ranked: Vec<&TeamSeason> = team_seasons.iter().collect();
    ranked.sort_by(|a, b| {
        descending(
            a.final_expected_winning_percentage,
            b.final_expected_winning_percentage,
        )
        .then_with(|| descending(a.winning_percentage, b.winning_percentage))
        .then_with(|| a.team.cmp(&b.team))
    });
    ranked
}

fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
