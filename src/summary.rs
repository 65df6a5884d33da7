use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::InputError;
use crate::features::{ModelReadyRecord, round3};
use crate::players::PlayerRecord;

pub const RINK_X_RANGE: [f64; 2] = [-110.0, 110.0];
pub const RINK_Y_RANGE: [f64; 2] = [-42.5, 42.5];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TeamSummary {
    pub faceoffs: usize,
    pub wins: usize,
    pub win_pct: f64,
    pub players_used: usize,
}

pub fn team_summary(records: &[&ModelReadyRecord]) -> TeamSummary {
    let wins = records.iter().filter(|r| r.faceoff.win).count();
    let mut players: Vec<u32> = records.iter().map(|r| r.faceoff.playerid_team).collect();
    players.sort_unstable();
    players.dedup();
    TeamSummary {
        faceoffs: records.len(),
        wins,
        win_pct: ratio(wins, records.len()),
        players_used: players.len(),
    }
}

fn ratio(wins: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        wins as f64 / total as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Dimension {
    Opponent,
    Season,
    Period,
    Zone,
    PowerPlay,
    ShortHanded,
    EmptyNet,
    ExtraAttacker,
    ScoreState,
}

impl Dimension {
    pub const ALL: [Dimension; 9] = [
        Dimension::Opponent,
        Dimension::Season,
        Dimension::Period,
        Dimension::Zone,
        Dimension::PowerPlay,
        Dimension::ShortHanded,
        Dimension::EmptyNet,
        Dimension::ExtraAttacker,
        Dimension::ScoreState,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Dimension::Opponent => "Opponent",
            Dimension::Season => "Season",
            Dimension::Period => "Period",
            Dimension::Zone => "Zone",
            Dimension::PowerPlay => "Power Play",
            Dimension::ShortHanded => "Short Handed",
            Dimension::EmptyNet => "Empty Net",
            Dimension::ExtraAttacker => "Extra Attacker",
            Dimension::ScoreState => "Score State",
        }
    }

    fn key(self, record: &ModelReadyRecord) -> DimensionValue {
        let f = &record.faceoff;
        match self {
            Dimension::Opponent => DimensionValue::Text(f.opponent.clone()),
            Dimension::Season => DimensionValue::Number(f.season as i64),
            Dimension::Period => DimensionValue::Number(f.period as i64),
            Dimension::Zone => DimensionValue::Text(f.zone.label().to_string()),
            Dimension::PowerPlay => DimensionValue::Flag(f.power_play),
            Dimension::ShortHanded => DimensionValue::Flag(f.short_handed),
            Dimension::EmptyNet => DimensionValue::Flag(f.empty_net),
            Dimension::ExtraAttacker => DimensionValue::Flag(f.extra_attacker),
            Dimension::ScoreState => DimensionValue::Text(f.score_state.label().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum DimensionValue {
    Flag(bool),
    Number(i64),
    Text(String),
}

impl std::fmt::Display for DimensionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DimensionValue::Flag(v) => write!(f, "{}", u8::from(*v)),
            DimensionValue::Number(v) => write!(f, "{v}"),
            DimensionValue::Text(v) => f.write_str(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionRow {
    pub keys: Vec<DimensionValue>,
    pub faceoffs: usize,
    pub wins: usize,
    pub win_pct: f64,
}

pub fn dimension_summary(
    records: &[&ModelReadyRecord],
    dimensions: &[Dimension],
) -> Result<Vec<DimensionRow>, InputError> {
    if dimensions.is_empty() {
        return Err(InputError::NoDimensionsSelected);
    }
    let mut groups: BTreeMap<Vec<DimensionValue>, (usize, usize)> = BTreeMap::new();
    for r in records {
        let key = dimensions.iter().map(|d| d.key(r)).collect();
        let entry = groups.entry(key).or_insert((0, 0));
        entry.0 += 1;
        if r.faceoff.win {
            entry.1 += 1;
        }
    }
    Ok(groups
        .into_iter()
        .map(|(keys, (faceoffs, wins))| DimensionRow {
            keys,
            faceoffs,
            wins,
            win_pct: ratio(wins, faceoffs),
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSummaryRow {
    pub player_id: u32,
    pub faceoffs: usize,
    pub wins: usize,
    pub win_pct: f64,
}

/// Best win rate first; ties by player id.
pub fn player_summary(records: &[&ModelReadyRecord]) -> Vec<PlayerSummaryRow> {
    let mut tallies: BTreeMap<u32, (usize, usize)> = BTreeMap::new();
    for r in records {
        let entry = tallies.entry(r.faceoff.playerid_team).or_insert((0, 0));
        entry.0 += 1;
        if r.faceoff.win {
            entry.1 += 1;
        }
    }
    let mut rows: Vec<PlayerSummaryRow> = tallies
        .into_iter()
        .map(|(player_id, (faceoffs, wins))| PlayerSummaryRow {
            player_id,
            faceoffs,
            wins,
            win_pct: round3(ratio(wins, faceoffs)),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.win_pct
            .total_cmp(&a.win_pct)
            .then(a.player_id.cmp(&b.player_id))
    });
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerDetail {
    pub player: Option<PlayerRecord>,
    pub faceoffs: usize,
    pub win_rate: f64,
    pub by_zone: Vec<(String, f64)>,
    pub by_opposing_hand: Vec<(String, f64)>,
    pub power_play: f64,
    pub short_handed: f64,
    pub empty_net: f64,
    pub extra_attacker: f64,
    pub rink: Vec<RinkPoint>,
}

/// Exactly one player must be selected.
pub fn single_selection(selected: &[u32]) -> Result<u32, InputError> {
    match selected {
        [] => Err(InputError::NoPlayerSelected),
        [id] => Ok(*id),
        many => Err(InputError::MultiplePlayersSelected { count: many.len() }),
    }
}

pub fn player_detail(
    records: &[&ModelReadyRecord],
    players: &[PlayerRecord],
    selected: &[u32],
) -> Result<PlayerDetail, InputError> {
    let player_id = single_selection(selected)?;
    let own: Vec<&ModelReadyRecord> = records
        .iter()
        .copied()
        .filter(|r| r.faceoff.playerid_team == player_id)
        .collect();

    let rate_where = |pred: &dyn Fn(&ModelReadyRecord) -> bool| {
        let subset: Vec<_> = own.iter().filter(|r| pred(**r)).collect();
        ratio(subset.iter().filter(|r| r.faceoff.win).count(), subset.len())
    };
    let grouped = |key: &dyn Fn(&ModelReadyRecord) -> String| {
        let mut groups: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        for r in &own {
            let entry = groups.entry(key(*r)).or_insert((0, 0));
            entry.0 += 1;
            if r.faceoff.win {
                entry.1 += 1;
            }
        }
        groups
            .into_iter()
            .map(|(k, (n, w))| (k, ratio(w, n)))
            .collect::<Vec<_>>()
    };

    Ok(PlayerDetail {
        player: players.iter().find(|p| p.player_id == player_id).cloned(),
        faceoffs: own.len(),
        win_rate: rate_where(&|_| true),
        by_zone: grouped(&|r| r.faceoff.zone.label().to_string()),
        by_opposing_hand: grouped(&|r| r.shoots_opponent.clone()),
        power_play: rate_where(&|r| r.faceoff.power_play),
        short_handed: rate_where(&|r| r.faceoff.short_handed),
        empty_net: rate_where(&|r| r.faceoff.empty_net),
        extra_attacker: rate_where(&|r| r.faceoff.extra_attacker),
        rink: rink_points(&own),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RinkPoint {
    pub x: f64,
    pub y: f64,
    pub faceoffs: usize,
    pub win_pct: f64,
    pub label: String,
}

/// One point per faceoff location: size is the count, colour the win rate.
pub fn rink_points(records: &[&ModelReadyRecord]) -> Vec<RinkPoint> {
    let mut groups: BTreeMap<(u64, u64), (f64, f64, usize, usize)> = BTreeMap::new();
    for r in records {
        let (x, y) = (r.faceoff.x, r.faceoff.y);
        let key = (ordered_bits(x), ordered_bits(y));
        let entry = groups.entry(key).or_insert((x, y, 0, 0));
        entry.2 += 1;
        if r.faceoff.win {
            entry.3 += 1;
        }
    }
    groups
        .into_values()
        .map(|(x, y, faceoffs, wins)| {
            let win_pct = ratio(wins, faceoffs);
            RinkPoint {
                x,
                y,
                faceoffs,
                win_pct,
                label: format!("{:.1}%", win_pct * 100.0),
            }
        })
        .collect()
}

// Total order over f64 so locations sort by (x, y) numerically.
fn ordered_bits(v: f64) -> u64 {
    let bits = v.to_bits();
    if bits >> 63 == 1 { !bits } else { bits | (1 << 63) }
}
