use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::error::PipelineError;
use crate::normalize::{FaceoffRecord, ResolvedFaceoff, ScoreState, Zone};
use crate::players::PlayerRecord;

/// Columns fed to the classifier, in order.
pub const MODEL_FEATURES: [&str; 9] = [
    "score_team",
    "score_diff",
    "home",
    "players_diff",
    "seconds_elapsed__game",
    "zone__offense",
    "zone__defense",
    "playerid_team__win_rate",
    "opposing_team__win_rate",
];
pub const FEATURE_COUNT: usize = MODEL_FEATURES.len();

/// What happens to a faceoff whose acting or opposing player is missing from the player table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinPolicy {
    #[default]
    DropUnmatched,
    Reject,
}

impl JoinPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "drop" | "inner" => Some(JoinPolicy::DropUnmatched),
            "reject" | "error" | "strict" => Some(JoinPolicy::Reject),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateEntry {
    pub faceoffs: u32,
    pub wins: u32,
    pub win_rate: f64,
}

/// League-wide faceoff win rate per team code, both benches stacked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamWinRates {
    rates: BTreeMap<String, RateEntry>,
}

impl TeamWinRates {
    pub fn compute(resolved: &[ResolvedFaceoff]) -> Self {
        let mut tallies: BTreeMap<String, (u32, u32)> = BTreeMap::new();
        for f in resolved {
            for team in [&f.home_team, &f.away_team] {
                let entry = tallies.entry(team.clone()).or_insert((0, 0));
                entry.0 += 1;
                if f.winner_team == *team {
                    entry.1 += 1;
                }
            }
        }
        let rates = tallies
            .into_iter()
            .map(|(team, (faceoffs, wins))| {
                let entry = RateEntry {
                    faceoffs,
                    wins,
                    win_rate: wins as f64 / faceoffs as f64,
                };
                (team, entry)
            })
            .collect();
        Self { rates }
    }

    pub fn get(&self, team: &str) -> Option<&RateEntry> {
        self.rates.get(team)
    }

    pub fn win_rate(&self, team: &str) -> Option<f64> {
        self.rates.get(team).map(|r| r.win_rate)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RateEntry)> {
        self.rates.iter().map(|(k, v)| (k.as_str(), v))
    }
}

pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Acting player win rate (3 decimals) over the given records.
pub fn player_win_rates<'a>(
    records: impl IntoIterator<Item = &'a FaceoffRecord>,
) -> BTreeMap<u32, RateEntry> {
    let mut tallies: BTreeMap<u32, (u32, u32)> = BTreeMap::new();
    for r in records {
        let entry = tallies.entry(r.playerid_team).or_insert((0, 0));
        entry.0 += 1;
        if r.win {
            entry.1 += 1;
        }
    }
    tallies
        .into_iter()
        .map(|(id, (faceoffs, wins))| {
            (
                id,
                RateEntry {
                    faceoffs,
                    wins,
                    win_rate: round3(wins as f64 / faceoffs as f64),
                },
            )
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelReadyRecord {
    pub faceoff: FaceoffRecord,
    pub height_team: f64,
    pub weight_team: f64,
    pub shoots_team: String,
    pub height_opponent: f64,
    pub weight_opponent: f64,
    pub shoots_opponent: String,
    pub zone_offense: bool,
    pub zone_defense: bool,
    pub leading: bool,
    pub trailing: bool,
    pub shoots_same: bool,
    pub height_diff: f64,
    pub weight_diff: f64,
    pub player_win_rate: f64,
    pub opponent_win_rate: f64,
}

impl ModelReadyRecord {
    pub fn feature_vector(&self) -> [f64; FEATURE_COUNT] {
        let f = &self.faceoff;
        [
            f.score_team as f64,
            f.score_diff as f64,
            flag(f.home),
            f.players_diff as f64,
            f.seconds_elapsed_game as f64,
            flag(self.zone_offense),
            flag(self.zone_defense),
            self.player_win_rate,
            self.opponent_win_rate,
        ]
    }

    pub fn label(&self) -> bool {
        self.faceoff.win
    }
}

pub fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub records: Vec<ModelReadyRecord>,
    /// Faceoffs left out because a player had no attributes.
    pub dropped: usize,
    pub player_rates: BTreeMap<u32, RateEntry>,
}

impl FeatureTable {
    pub fn features(&self) -> Vec<[f64; FEATURE_COUNT]> {
        self.records.iter().map(|r| r.feature_vector()).collect()
    }

    pub fn labels(&self) -> Vec<bool> {
        self.records.iter().map(|r| r.label()).collect()
    }
}

/// Joins both players' attributes onto each faceoff and derives the model columns.
/// Output keeps the input order of the records that survive the join.
pub fn build_features(
    records: &[FaceoffRecord],
    players: &[PlayerRecord],
    team_rates: &TeamWinRates,
    policy: JoinPolicy,
) -> Result<FeatureTable, PipelineError> {
    let by_id: HashMap<u32, &PlayerRecord> = players.iter().map(|p| (p.player_id, p)).collect();
    let mut joined = Vec::with_capacity(records.len());
    let mut dropped = 0usize;
    for record in records {
        let acting = by_id.get(&record.playerid_team);
        let opposing = by_id.get(&record.playerid_opponent);
        let (Some(acting), Some(opposing)) = (acting, opposing) else {
            let missing = if acting.is_none() {
                record.playerid_team
            } else {
                record.playerid_opponent
            };
            if policy == JoinPolicy::Reject {
                return Err(PipelineError::UnmatchedPlayer { player_id: missing });
            }
            tracing::debug!(player_id = missing, game_id = record.game_id, "faceoff dropped");
            dropped += 1;
            continue;
        };
        joined.push((record, *acting, *opposing));
    }

    // Rates count joined faceoffs only.
    let player_rates = player_win_rates(joined.iter().map(|(record, _, _)| *record));

    let mut out = Vec::with_capacity(joined.len());
    for (record, acting, opposing) in joined {
        let player_win_rate = player_rates
            .get(&record.playerid_team)
            .map(|r| r.win_rate)
            .unwrap_or_default();
        out.push(ModelReadyRecord {
            faceoff: record.clone(),
            height_team: acting.height,
            weight_team: acting.weight,
            shoots_team: acting.shoots.clone(),
            height_opponent: opposing.height,
            weight_opponent: opposing.weight,
            shoots_opponent: opposing.shoots.clone(),
            zone_offense: record.zone == Zone::Offense,
            zone_defense: record.zone == Zone::Defense,
            leading: record.score_state == ScoreState::Leading,
            trailing: record.score_state == ScoreState::Trailing,
            shoots_same: acting.shoots == opposing.shoots,
            height_diff: acting.height - opposing.height,
            weight_diff: acting.weight - opposing.weight,
            player_win_rate,
            opponent_win_rate: team_rates.win_rate(&record.opponent).unwrap_or_default(),
        });
    }

    if dropped > 0 {
        tracing::warn!(dropped, kept = out.len(), "faceoffs without player attributes dropped");
    }
    tracing::info!(records = out.len(), "built model-ready table");
    Ok(FeatureTable {
        records: out,
        dropped,
        player_rates,
    })
}
