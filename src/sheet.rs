use std::path::Path;

use anyhow::{Context, Result, anyhow};
use calamine::{Data, Reader, open_workbook_auto};

use crate::error::PipelineError;

/// Plain text grid read from one worksheet; the first row is the header.
#[derive(Debug, Clone, Default)]
pub struct SheetTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    pub fn new(name: impl Into<String>, headers: &[&str], rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }

    pub fn column(&self, column: &'static str) -> Result<usize, PipelineError> {
        self.optional_column(column)
            .ok_or_else(|| PipelineError::MissingColumn {
                table: self.name.clone(),
                column,
            })
    }

    pub fn optional_column(&self, column: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(column))
    }

    pub fn cell<'a>(&'a self, row: &'a [String], idx: usize) -> &'a str {
        row.get(idx).map(|s| s.trim()).unwrap_or("")
    }
}

#[derive(Debug, Clone)]
pub struct RawFaceoff {
    pub home_team: String,
    pub away_team: String,
    pub winner_team: String,
    pub winner_id: u32,
    pub loser_id: u32,
    pub season: String,
    pub game_number: u32,
    pub period: String,
    pub time_remaining: String,
    pub time_elapsed: String,
    pub strength_id: String,
    pub strength: String,
    pub home_zone: String,
    pub away_zone: String,
    pub home_score: i32,
    pub away_score: i32,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawPlayer {
    pub player_id: u32,
    pub height: Option<String>,
    pub weight: Option<f64>,
    pub shoots: Option<String>,
    pub nationality: Option<String>,
}

pub fn read_workbook(
    path: &Path,
    events_sheet: &str,
    players_sheet: &str,
) -> Result<(SheetTable, SheetTable)> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("open workbook {}", path.display()))?;
    let mut read_sheet = |name: &str| -> Result<SheetTable> {
        let range = workbook
            .worksheet_range(name)
            .with_context(|| format!("read sheet {name:?} from {}", path.display()))?;
        let mut rows = range.rows();
        let headers = rows
            .next()
            .ok_or_else(|| anyhow!("sheet {name:?} is empty"))?
            .iter()
            .map(cell_text)
            .collect();
        let rows = rows
            .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
            .filter(|row: &Vec<String>| row.iter().any(|c| !c.is_empty()))
            .collect();
        Ok(SheetTable {
            name: name.to_string(),
            headers,
            rows,
        })
    };
    let events = read_sheet(events_sheet)?;
    let players = read_sheet(players_sheet)?;
    Ok((events, players))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(v) => v.to_string(),
        Data::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{}", *v as i64),
        Data::Float(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        other => other.to_string(),
    }
}

pub fn parse_raw_faceoffs(table: &SheetTable) -> Result<Vec<RawFaceoff>, PipelineError> {
    let home_team = table.column("HomeTeam")?;
    let away_team = table.column("AwayTeam")?;
    let winner_team = table.column("FOWinTeam")?;
    let winner_id = table.column("FOWinner")?;
    let loser_id = table.column("FOLoser")?;
    let season = table.column("Season")?;
    let game_number = table.column("GameNumber")?;
    let period = table.column("Period")?;
    let time_remaining = table.column("TimeRemaining")?;
    let time_elapsed = table.column("TimeElapsed")?;
    let strength_id = table.column("HomeStrengthID")?;
    let strength = table.column("HomeStrength")?;
    let home_zone = table.column("HomeZone")?;
    let away_zone = table.column("AwayZone")?;
    let home_score = table.column("HomeScore")?;
    let away_score = table.column("AwayScore")?;
    let x = table.column("x")?;
    let y = table.column("y")?;

    table
        .rows
        .iter()
        .map(|row| {
            let text = |idx: usize| table.cell(row, idx).to_string();
            Ok(RawFaceoff {
                home_team: text(home_team),
                away_team: text(away_team),
                winner_team: text(winner_team),
                winner_id: parse_id("FOWinner", table.cell(row, winner_id))?,
                loser_id: parse_id("FOLoser", table.cell(row, loser_id))?,
                season: text(season),
                game_number: parse_id("GameNumber", table.cell(row, game_number))?,
                period: text(period),
                time_remaining: text(time_remaining),
                time_elapsed: text(time_elapsed),
                strength_id: text(strength_id),
                strength: text(strength),
                home_zone: text(home_zone),
                away_zone: text(away_zone),
                home_score: parse_int("HomeScore", table.cell(row, home_score))?,
                away_score: parse_int("AwayScore", table.cell(row, away_score))?,
                x: parse_float("x", table.cell(row, x))?,
                y: parse_float("y", table.cell(row, y))?,
            })
        })
        .collect()
}

pub fn parse_raw_players(table: &SheetTable) -> Result<Vec<RawPlayer>, PipelineError> {
    let player_id = table.column("PlayerID")?;
    let height = table.column("Height")?;
    let weight = table.column("Weight")?;
    let shoots = table.column("Shoots")?;
    let nationality = table.optional_column("Nationality");

    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let id = parse_id("PlayerID", table.cell(row, player_id))?;
        if !seen.insert(id) {
            tracing::debug!(player_id = id, "duplicate player row ignored");
            continue;
        }
        let non_empty = |idx: usize| {
            let v = table.cell(row, idx);
            (!v.is_empty()).then(|| v.to_string())
        };
        out.push(RawPlayer {
            player_id: id,
            height: non_empty(height),
            weight: non_empty(weight).and_then(|v| v.parse::<f64>().ok()),
            shoots: non_empty(shoots),
            nationality: nationality.and_then(non_empty),
        });
    }
    Ok(out)
}

fn parse_float(field: &'static str, raw: &str) -> Result<f64, PipelineError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| PipelineError::MalformedField {
            field,
            value: raw.to_string(),
        })
}

fn parse_int(field: &'static str, raw: &str) -> Result<i32, PipelineError> {
    if let Ok(v) = raw.parse::<i32>() {
        return Ok(v);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v.abs() <= i32::MAX as f64 => Ok(v as i32),
        _ => Err(PipelineError::MalformedField {
            field,
            value: raw.to_string(),
        }),
    }
}

fn parse_id(field: &'static str, raw: &str) -> Result<u32, PipelineError> {
    let value = parse_int(field, raw)?;
    u32::try_from(value).map_err(|_| PipelineError::MalformedField {
        field,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_floats_parse_as_ints() {
        assert_eq!(parse_int("HomeScore", "3.0"), Ok(3));
        assert_eq!(parse_id("FOWinner", "8471214"), Ok(8_471_214));
        assert!(parse_id("FOWinner", "-4").is_err());
        assert!(parse_int("HomeScore", "2.5").is_err());
    }

    #[test]
    fn header_lookup_ignores_case() {
        let table = SheetTable::new("PlayerInfo", &["playerid", " Height "], Vec::new());
        assert_eq!(table.column("PlayerID"), Ok(0));
        assert_eq!(table.column("Height"), Ok(1));
        assert_eq!(
            table.column("Weight"),
            Err(PipelineError::MissingColumn {
                table: "PlayerInfo".to_string(),
                column: "Weight",
            })
        );
    }
}
