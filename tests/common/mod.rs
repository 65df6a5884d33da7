#![allow(dead_code)]

use faceoff_terminal::loader::Datasets;
use faceoff_terminal::sheet::{RawFaceoff, RawPlayer};
use faceoff_terminal::team_codes::TeamCodes;

pub const TEAMS: [(&str, &str, [u32; 3]); 4] = [
    ("Nashville Predators", "NSH", [1001, 1002, 1003]),
    ("Dallas Stars", "DAL", [2001, 2002, 2003]),
    ("Chicago Blackhawks", "CHI", [3001, 3002, 3003]),
    ("St. Louis Blues", "STL", [4001, 4002, 4003]),
];

pub fn codes() -> TeamCodes {
    TeamCodes::from_pairs(TEAMS.iter().map(|(name, code, _)| (*name, *code)))
}

pub fn raw(home: &str, away: &str, winner: &str, winner_id: u32, loser_id: u32) -> RawFaceoff {
    RawFaceoff {
        home_team: home.to_string(),
        away_team: away.to_string(),
        winner_team: winner.to_string(),
        winner_id,
        loser_id,
        season: "20222023".to_string(),
        game_number: 1,
        period: "1".to_string(),
        time_remaining: "20:00".to_string(),
        time_elapsed: "0:00".to_string(),
        strength_id: "55".to_string(),
        strength: "EV".to_string(),
        home_zone: "Neu".to_string(),
        away_zone: "Neu".to_string(),
        home_score: 0,
        away_score: 0,
        x: 0.0,
        y: 0.0,
    }
}

pub fn player(id: u32, height: &str, weight: f64, shoots: &str) -> RawPlayer {
    RawPlayer {
        player_id: id,
        height: Some(height.to_string()),
        weight: Some(weight),
        shoots: Some(shoots.to_string()),
        nationality: None,
    }
}

pub fn roster() -> Vec<RawPlayer> {
    let mut out = Vec::new();
    for (_, _, ids) in TEAMS {
        for (i, id) in ids.iter().enumerate() {
            let height = ["6'0", "6'2\"", "5'11"][i];
            let shoots = if i % 2 == 0 { "L" } else { "R" };
            out.push(player(*id, height, 185.0 + 5.0 * i as f64, shoots));
        }
    }
    out
}

/// A deterministic league season. Offensive-zone draws and each team's first
/// centre tilt the outcome so a classifier has something to learn.
pub fn season(games: usize) -> Vec<RawFaceoff> {
    const PAIRS: [(usize, usize); 6] = [(0, 1), (2, 0), (0, 3), (1, 2), (3, 1), (2, 3)];
    let mut out = Vec::new();
    for g in 0..games {
        let (hi, ai) = PAIRS[g % PAIRS.len()];
        let (home_name, _, home_ids) = TEAMS[hi];
        let (away_name, _, away_ids) = TEAMS[ai];
        for k in 0..18usize {
            let period = k / 6 + 1;
            let elapsed = (k % 6) as u32 * 180 + 30;
            let remaining = 1200 - elapsed;
            let (home_zone, away_zone, x) = match k % 3 {
                0 => ("Off", "Def", 69.0),
                1 => ("Neu", "Neu", 20.0),
                _ => ("Def", "Off", -69.0),
            };
            let (strength, strength_id) = match k % 9 {
                0 => ("PP", "54"),
                4 => ("SH", "45"),
                _ => ("EV", "55"),
            };
            let home_idx = k % 3;
            let away_idx = (k + g) % 3;
            let mut threshold: i32 = 50;
            threshold += match home_zone {
                "Off" => 15,
                "Def" => -15,
                _ => 0,
            };
            if home_idx == 0 {
                threshold += 10;
            }
            if away_idx == 0 {
                threshold -= 10;
            }
            let roll = ((g * 31 + k * 17) % 100) as i32;
            let home_wins = roll < threshold;
            let (winner, winner_id, loser_id) = if home_wins {
                (home_name, home_ids[home_idx], away_ids[away_idx])
            } else {
                (away_name, away_ids[away_idx], home_ids[home_idx])
            };

            let mut r = raw(home_name, away_name, winner, winner_id, loser_id);
            r.season = if g < games / 2 { "20212022" } else { "20222023" }.to_string();
            r.game_number = g as u32 + 1;
            r.period = period.to_string();
            r.time_elapsed = format!("{:02}:{:02}", elapsed / 60, elapsed % 60);
            r.time_remaining = format!("{:02}:{:02}", remaining / 60, remaining % 60);
            r.strength = strength.to_string();
            r.strength_id = strength_id.to_string();
            r.home_zone = home_zone.to_string();
            r.away_zone = away_zone.to_string();
            r.home_score = (k / 6) as i32;
            r.away_score = (k / 9) as i32;
            r.x = x;
            r.y = if k % 2 == 0 { 22.0 } else { -22.0 };
            out.push(r);
        }
    }
    out
}

pub fn datasets(games: usize) -> Datasets {
    Datasets {
        team_codes: codes(),
        faceoffs: season(games),
        players: roster(),
    }
}
