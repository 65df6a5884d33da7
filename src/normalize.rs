use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

use crate::error::PipelineError;
use crate::sheet::RawFaceoff;
use crate::team_codes::TeamCodes;

pub const PERIOD_SECONDS: u32 = 20 * 60;
pub const OVERTIME_PERIOD: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Zone {
    Defense,
    Neutral,
    Offense,
}

impl Zone {
    pub fn parse(raw: &str) -> Result<Self, PipelineError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "off" | "offense" => Ok(Zone::Offense),
            "def" | "defense" => Ok(Zone::Defense),
            "neu" | "neutral" => Ok(Zone::Neutral),
            _ => Err(PipelineError::MalformedField {
                field: "zone",
                value: raw.to_string(),
            }),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Zone::Offense => "offense",
            Zone::Defense => "defense",
            Zone::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ScoreState {
    Leading,
    Tied,
    Trailing,
}

impl ScoreState {
    pub fn from_diff(diff: i32) -> Self {
        match diff.signum() {
            1 => ScoreState::Leading,
            -1 => ScoreState::Trailing,
            _ => ScoreState::Tied,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreState::Leading => "leading",
            ScoreState::Tied => "tied",
            ScoreState::Trailing => "trailing",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StrengthFlags {
    pub power_play: bool,
    pub short_handed: bool,
    pub empty_net: bool,
    pub extra_attacker: bool,
}

impl StrengthFlags {
    /// The same situation seen from the other bench.
    pub fn mirrored(self) -> Self {
        Self {
            power_play: self.short_handed,
            short_handed: self.power_play,
            empty_net: self.extra_attacker,
            extra_attacker: self.empty_net,
        }
    }
}

static STRENGTH_LABELS: Lazy<HashMap<&'static str, StrengthFlags>> = Lazy::new(|| {
    let flags = |power_play, short_handed, empty_net, extra_attacker| StrengthFlags {
        power_play,
        short_handed,
        empty_net,
        extra_attacker,
    };
    HashMap::from([
        ("PP", flags(true, false, false, false)),
        ("PP EN", flags(true, false, true, false)),
        ("PP EA", flags(true, false, false, true)),
        ("SH", flags(false, true, false, false)),
        ("SH EN", flags(false, true, true, false)),
        ("SH EA", flags(false, true, false, true)),
        ("EN", flags(false, false, true, false)),
        ("EA", flags(false, false, false, true)),
    ])
});

/// Home-side flags for a strength label; unlisted labels (even strength) carry none.
pub fn strength_flags(label: &str) -> StrengthFlags {
    let key = label.split_whitespace().collect::<Vec<_>>().join(" ");
    STRENGTH_LABELS
        .get(key.to_ascii_uppercase().as_str())
        .copied()
        .unwrap_or_default()
}

/// A league-wide faceoff with codes resolved and encodings decoded, still home/away oriented.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFaceoff {
    pub game_id: u32,
    pub season: u32,
    pub home_team: String,
    pub away_team: String,
    pub winner_team: String,
    pub winner_id: u32,
    pub loser_id: u32,
    pub period: u8,
    pub overtime: bool,
    pub seconds_remaining_period: u32,
    pub seconds_elapsed_period: u32,
    pub players_home: u8,
    pub players_away: u8,
    pub home_strength: StrengthFlags,
    pub home_zone: Zone,
    pub away_zone: Zone,
    pub score_home: i32,
    pub score_away: i32,
    pub x: f64,
    pub y: f64,
}

/// One faceoff seen from the team of interest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceoffRecord {
    pub game_id: u32,
    pub team: String,
    pub opponent: String,
    pub season: u32,
    pub home: bool,
    pub score_team: i32,
    pub score_opponent: i32,
    pub score_diff: i32,
    pub score_state: ScoreState,
    pub players_team: u8,
    pub players_opponent: u8,
    pub players_diff: i32,
    pub power_play: bool,
    pub short_handed: bool,
    pub empty_net: bool,
    pub extra_attacker: bool,
    pub period: u8,
    pub overtime: bool,
    pub seconds_remaining_period: u32,
    pub seconds_remaining_game: u32,
    pub seconds_elapsed_period: u32,
    pub seconds_elapsed_game: u32,
    pub zone: Zone,
    pub x: f64,
    pub y: f64,
    pub playerid_team: u32,
    pub playerid_opponent: u32,
    pub winner_team: String,
    pub winner_playerid: u32,
    pub win: bool,
}

/// Parses `M:SS` / `MM:SS` into seconds.
pub fn parse_clock(raw: &str) -> Result<u32, PipelineError> {
    let malformed = || PipelineError::MalformedTime {
        value: raw.to_string(),
    };
    let (minutes, seconds) = raw.trim().split_once(':').ok_or_else(malformed)?;
    if minutes.is_empty()
        || seconds.len() != 2
        || !minutes.bytes().all(|b| b.is_ascii_digit())
        || !seconds.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(malformed());
    }
    let minutes: u32 = minutes.parse().map_err(|_| malformed())?;
    let seconds: u32 = seconds.parse().map_err(|_| malformed())?;
    if seconds >= 60 {
        return Err(malformed());
    }
    minutes
        .checked_mul(60)
        .and_then(|m| m.checked_add(seconds))
        .ok_or_else(malformed)
}

/// Returns `(period, overtime)`.
pub fn parse_period(raw: &str) -> Result<(u8, bool), PipelineError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("OT") {
        return Ok((OVERTIME_PERIOD, true));
    }
    match trimmed.chars().next().and_then(|c| c.to_digit(10)) {
        Some(p @ 1..=3) => Ok((p as u8, false)),
        _ => Err(PipelineError::MalformedField {
            field: "period",
            value: raw.to_string(),
        }),
    }
}

/// Two digit strength code: home skaters then away skaters.
pub fn parse_strength_id(raw: &str) -> Result<(u8, u8), PipelineError> {
    let digits: Vec<u8> = raw
        .trim()
        .chars()
        .map(|c| c.to_digit(10).map(|d| d as u8))
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default();
    match digits.as_slice() {
        [home, away] => Ok((*home, *away)),
        _ => Err(PipelineError::MalformedField {
            field: "strength id",
            value: raw.to_string(),
        }),
    }
}

fn parse_season(raw: &str) -> Result<u32, PipelineError> {
    raw.trim()
        .get(..4)
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| PipelineError::MalformedField {
            field: "season",
            value: raw.to_string(),
        })
}

pub fn seconds_elapsed_game(period: u8, elapsed_in_period: u32) -> u32 {
    (period as u32).saturating_sub(1) * PERIOD_SECONDS + elapsed_in_period
}

pub fn seconds_remaining_game(period: u8, overtime: bool, remaining_in_period: u32) -> u32 {
    if overtime {
        remaining_in_period
    } else {
        3u32.saturating_sub(period as u32) * PERIOD_SECONDS + remaining_in_period
    }
}

pub fn resolve_faceoff(
    raw: &RawFaceoff,
    codes: &TeamCodes,
) -> Result<ResolvedFaceoff, PipelineError> {
    let (period, overtime) = parse_period(&raw.period)?;
    let (players_home, players_away) = parse_strength_id(&raw.strength_id)?;
    Ok(ResolvedFaceoff {
        game_id: raw.game_number,
        season: parse_season(&raw.season)?,
        home_team: codes.resolve(&raw.home_team)?.to_string(),
        away_team: codes.resolve(&raw.away_team)?.to_string(),
        winner_team: codes.resolve(&raw.winner_team)?.to_string(),
        winner_id: raw.winner_id,
        loser_id: raw.loser_id,
        period,
        overtime,
        seconds_remaining_period: parse_clock(&raw.time_remaining)?,
        seconds_elapsed_period: parse_clock(&raw.time_elapsed)?,
        players_home,
        players_away,
        home_strength: strength_flags(&raw.strength),
        home_zone: Zone::parse(&raw.home_zone)?,
        away_zone: Zone::parse(&raw.away_zone)?,
        score_home: raw.home_score,
        score_away: raw.away_score,
        x: raw.x,
        y: raw.y,
    })
}

/// Decodes every raw event; the first undecodable one aborts the run.
pub fn resolve_faceoffs(
    raw: &[RawFaceoff],
    codes: &TeamCodes,
) -> Result<Vec<ResolvedFaceoff>, PipelineError> {
    let out = raw
        .iter()
        .map(|r| resolve_faceoff(r, codes))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::info!(events = out.len(), "resolved faceoff events");
    Ok(out)
}

impl ResolvedFaceoff {
    pub fn involves(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }

    /// Re-expresses every home/away pair from `team`'s bench.
    pub fn project(&self, team: &str) -> Option<FaceoffRecord> {
        if !self.involves(team) {
            return None;
        }
        let home = self.home_team == team;

        let opponent = side(home, &self.away_team, &self.home_team).clone();
        let score_team = side(home, self.score_home, self.score_away);
        let score_opponent = side(home, self.score_away, self.score_home);
        let players_team = side(home, self.players_home, self.players_away);
        let players_opponent = side(home, self.players_away, self.players_home);
        let strength = side(home, self.home_strength, self.home_strength.mirrored());
        let zone = side(home, self.home_zone, self.away_zone);

        let win = self.winner_team == team;
        let (playerid_team, playerid_opponent) = if win {
            (self.winner_id, self.loser_id)
        } else {
            (self.loser_id, self.winner_id)
        };
        let score_diff = score_team - score_opponent;

        Some(FaceoffRecord {
            game_id: self.game_id,
            team: team.to_string(),
            opponent,
            season: self.season,
            home,
            score_team,
            score_opponent,
            score_diff,
            score_state: ScoreState::from_diff(score_diff),
            players_team,
            players_opponent,
            players_diff: players_team as i32 - players_opponent as i32,
            power_play: strength.power_play,
            short_handed: strength.short_handed,
            empty_net: strength.empty_net,
            extra_attacker: strength.extra_attacker,
            period: self.period,
            overtime: self.overtime,
            seconds_remaining_period: self.seconds_remaining_period,
            seconds_remaining_game: seconds_remaining_game(
                self.period,
                self.overtime,
                self.seconds_remaining_period,
            ),
            seconds_elapsed_period: self.seconds_elapsed_period,
            seconds_elapsed_game: seconds_elapsed_game(self.period, self.seconds_elapsed_period),
            zone,
            x: self.x,
            y: self.y,
            playerid_team,
            playerid_opponent,
            winner_team: self.winner_team.clone(),
            winner_playerid: self.winner_id,
            win,
        })
    }
}

fn side<T>(home: bool, home_value: T, away_value: T) -> T {
    if home { home_value } else { away_value }
}

pub fn project_for_team(resolved: &[ResolvedFaceoff], team: &str) -> Vec<FaceoffRecord> {
    let out: Vec<FaceoffRecord> = resolved.iter().filter_map(|f| f.project(team)).collect();
    tracing::info!(team, records = out.len(), "projected faceoffs for team");
    out
}

/// Resolve then project; `team` must be a known code.
pub fn normalize_faceoffs(
    raw: &[RawFaceoff],
    codes: &TeamCodes,
    team: &str,
) -> Result<Vec<FaceoffRecord>, PipelineError> {
    if !codes.contains_code(team) {
        return Err(PipelineError::UnknownTeamCode {
            code: team.to_string(),
        });
    }
    let resolved = resolve_faceoffs(raw, codes)?;
    Ok(project_for_team(&resolved, team))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_accepts_mm_ss_only() {
        assert_eq!(parse_clock("05:30"), Ok(330));
        assert_eq!(parse_clock("20:00"), Ok(1200));
        assert_eq!(parse_clock("0:07"), Ok(7));
        for bad in ["", "5", "5:3", "05:60", "ab:cd", "-1:00", "05:30:00", ":30", "99999999:00"] {
            assert!(
                matches!(parse_clock(bad), Err(PipelineError::MalformedTime { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn period_labels() {
        assert_eq!(parse_period("OT"), Ok((4, true)));
        assert_eq!(parse_period("2"), Ok((2, false)));
        assert_eq!(parse_period("3rd"), Ok((3, false)));
        assert!(parse_period("5").is_err());
        assert!(parse_period("SO").is_err());
    }

    #[test]
    fn strength_labels_and_mirror() {
        let f = strength_flags("SH EN");
        assert!(f.short_handed && f.empty_net);
        assert!(!f.power_play && !f.extra_attacker);
        assert_eq!(strength_flags("EV"), StrengthFlags::default());
        assert_eq!(strength_flags("pp  ea"), strength_flags("PP EA"));
        let m = f.mirrored();
        assert!(m.power_play && m.extra_attacker);
    }

    #[test]
    fn strength_id_needs_two_digits() {
        assert_eq!(parse_strength_id("54"), Ok((5, 4)));
        assert!(parse_strength_id("5").is_err());
        assert!(parse_strength_id("5x").is_err());
        assert!(parse_strength_id("554").is_err());
    }

    #[test]
    fn clock_arithmetic() {
        assert_eq!(seconds_elapsed_game(2, 870), 2070);
        assert_eq!(seconds_remaining_game(2, false, 330), 1530);
        assert_eq!(seconds_remaining_game(4, true, 200), 200);
        assert_eq!(seconds_elapsed_game(4, 60), 3660);
    }
}
