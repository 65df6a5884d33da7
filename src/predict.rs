use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::PipelineError;
use crate::features::{FEATURE_COUNT, RateEntry, TeamWinRates, flag};
use crate::forest::RandomForest;
use crate::team_codes::TeamCodes;

pub const PLAYERS_DIFF_RANGE: (i32, i32) = (-2, 2);
/// Three regulation periods plus a five minute overtime.
pub const MAX_SECONDS_ELAPSED: u32 = 3 * 20 * 60 + 5 * 60;

/// Game state a coach asks about, seen from the team of interest.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Situation {
    pub home: bool,
    pub opponent: String,
    pub players_diff: i32,
    pub seconds_elapsed_game: u32,
    pub zone_offense: bool,
    pub zone_defense: bool,
    pub score_team: i32,
    pub score_diff: i32,
}

impl Situation {
    pub fn validate(&self, codes: &TeamCodes) -> Result<(), PipelineError> {
        let invalid = |field: &'static str, value: String| {
            Err(PipelineError::InvalidSituation { field, value })
        };
        let (lo, hi) = PLAYERS_DIFF_RANGE;
        if !(lo..=hi).contains(&self.players_diff) {
            return invalid("players_diff", self.players_diff.to_string());
        }
        if self.seconds_elapsed_game > MAX_SECONDS_ELAPSED {
            return invalid(
                "seconds_elapsed_game",
                self.seconds_elapsed_game.to_string(),
            );
        }
        if self.score_team < 0 {
            return invalid("score_team", self.score_team.to_string());
        }
        if !codes.contains_code(&self.opponent) {
            return Err(PipelineError::UnknownTeamCode {
                code: self.opponent.clone(),
            });
        }
        Ok(())
    }

    fn feature_vector(&self, player_win_rate: f64, opponent_win_rate: f64) -> [f64; FEATURE_COUNT] {
        [
            self.score_team as f64,
            self.score_diff as f64,
            flag(self.home),
            self.players_diff as f64,
            self.seconds_elapsed_game as f64,
            flag(self.zone_offense),
            flag(self.zone_defense),
            player_win_rate,
            opponent_win_rate,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlayerChance {
    pub player_id: u32,
    pub player_win_rate: f64,
    pub chance_to_win: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub opponent_win_rate: f64,
    pub chances: Vec<PlayerChance>,
    /// Every player tied at the top probability.
    pub best: Vec<u32>,
}

/// Scores the situation once per faceoff taker of the team of interest.
pub fn rank_players(
    model: &RandomForest,
    situation: &Situation,
    player_rates: &BTreeMap<u32, RateEntry>,
    team_rates: &TeamWinRates,
    codes: &TeamCodes,
) -> Result<Ranking, PipelineError> {
    situation.validate(codes)?;
    let opponent_win_rate = team_rates.win_rate(&situation.opponent).unwrap_or_default();

    let mut chances: Vec<PlayerChance> = player_rates
        .iter()
        .map(|(player_id, rate)| {
            let row = situation.feature_vector(rate.win_rate, opponent_win_rate);
            PlayerChance {
                player_id: *player_id,
                player_win_rate: rate.win_rate,
                chance_to_win: model.predict_proba(&row),
            }
        })
        .collect();
    chances.sort_by(|a, b| {
        b.chance_to_win
            .total_cmp(&a.chance_to_win)
            .then(a.player_id.cmp(&b.player_id))
    });

    let best = match chances.first() {
        Some(top) => chances
            .iter()
            .take_while(|c| c.chance_to_win == top.chance_to_win)
            .map(|c| c.player_id)
            .collect(),
        None => Vec::new(),
    };
    tracing::debug!(candidates = chances.len(), best = ?best, "situation ranked");
    Ok(Ranking {
        opponent_win_rate,
        chances,
        best,
    })
}
