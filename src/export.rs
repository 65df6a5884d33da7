use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::features::ModelReadyRecord;
use crate::players::PlayerRecord;
use crate::session::{DashboardView, TeamAnalysis};
use crate::summary::{Dimension, DimensionRow, PlayerSummaryRow};

pub const MAX_FACEOFF_ROWS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub faceoffs: usize,
    pub players: usize,
    pub dimension_rows: usize,
    pub player_rows: usize,
}

pub fn export_workbook(
    path: &Path,
    analysis: &TeamAnalysis,
    view: &DashboardView,
) -> Result<ExportReport> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create export dir {}", parent.display()))?;
    }

    let mut faceoff_rows = vec![faceoff_header()];
    faceoff_rows.extend(
        analysis
            .table
            .records
            .iter()
            .take(MAX_FACEOFF_ROWS)
            .map(faceoff_row),
    );

    let mut player_rows = vec![vec![
        "player_id".to_string(),
        "height".to_string(),
        "weight".to_string(),
        "shoots".to_string(),
    ]];
    player_rows.extend(analysis.players.iter().map(player_row));

    let team_rows = vec![
        vec![
            "team".to_string(),
            "team_name".to_string(),
            "faceoffs".to_string(),
            "wins".to_string(),
            "win_pct".to_string(),
            "players_used".to_string(),
            "dropped_unmatched".to_string(),
        ],
        vec![
            analysis.team.clone(),
            analysis.team_name.clone(),
            view.team.faceoffs.to_string(),
            view.team.wins.to_string(),
            format!("{:.3}", view.team.win_pct),
            view.team.players_used.to_string(),
            analysis.table.dropped.to_string(),
        ],
    ];

    let dimension_rows = match &view.dimensions {
        Ok(rows) => dimension_sheet(&view.dimension_keys, rows),
        Err(err) => vec![vec![err.to_string()]],
    };

    let mut summary_rows = vec![vec![
        "player_id".to_string(),
        "faceoffs".to_string(),
        "wins".to_string(),
        "win_pct".to_string(),
    ]];
    summary_rows.extend(view.players.iter().map(player_summary_row));

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Faceoffs")?;
        write_rows(sheet, &faceoff_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Players")?;
        write_rows(sheet, &player_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("TeamSummary")?;
        write_rows(sheet, &team_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Dimensions")?;
        write_rows(sheet, &dimension_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("PlayerSummary")?;
        write_rows(sheet, &summary_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    let report = ExportReport {
        faceoffs: faceoff_rows.len().saturating_sub(1),
        players: player_rows.len().saturating_sub(1),
        dimension_rows: dimension_rows.len().saturating_sub(1),
        player_rows: summary_rows.len().saturating_sub(1),
    };
    tracing::info!(path = %path.display(), faceoffs = report.faceoffs, "workbook exported");
    Ok(report)
}

fn faceoff_header() -> Vec<String> {
    [
        "gameID",
        "season",
        "team",
        "opponent",
        "home",
        "period",
        "seconds_elapsed__game",
        "seconds_remaining__game",
        "zone",
        "score_team",
        "score_diff",
        "players_diff",
        "power_play",
        "short_handed",
        "empty_net",
        "extra_attacker",
        "x",
        "y",
        "playerid_team",
        "playerid_opponent",
        "height_diff",
        "weight_diff",
        "shoots_same",
        "playerid_team__win_rate",
        "opposing_team__win_rate",
        "win",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect()
}

fn bit(value: bool) -> String {
    u8::from(value).to_string()
}

fn faceoff_row(r: &ModelReadyRecord) -> Vec<String> {
    let f = &r.faceoff;
    vec![
        f.game_id.to_string(),
        f.season.to_string(),
        f.team.clone(),
        f.opponent.clone(),
        bit(f.home),
        f.period.to_string(),
        f.seconds_elapsed_game.to_string(),
        f.seconds_remaining_game.to_string(),
        f.zone.label().to_string(),
        f.score_team.to_string(),
        f.score_diff.to_string(),
        f.players_diff.to_string(),
        bit(f.power_play),
        bit(f.short_handed),
        bit(f.empty_net),
        bit(f.extra_attacker),
        f.x.to_string(),
        f.y.to_string(),
        f.playerid_team.to_string(),
        f.playerid_opponent.to_string(),
        r.height_diff.to_string(),
        r.weight_diff.to_string(),
        bit(r.shoots_same),
        format!("{:.3}", r.player_win_rate),
        format!("{:.3}", r.opponent_win_rate),
        bit(f.win),
    ]
}

fn player_row(p: &PlayerRecord) -> Vec<String> {
    vec![
        p.player_id.to_string(),
        p.height.to_string(),
        p.weight.to_string(),
        p.shoots.clone(),
    ]
}

fn dimension_sheet(dimensions: &[Dimension], rows: &[DimensionRow]) -> Vec<Vec<String>> {
    let mut header: Vec<String> = dimensions.iter().map(|d| d.title().to_string()).collect();
    header.extend(["faceoffs", "wins", "win_pct"].map(String::from));
    let mut out = vec![header];
    for row in rows {
        let mut cells: Vec<String> = row.keys.iter().map(|k| k.to_string()).collect();
        cells.push(row.faceoffs.to_string());
        cells.push(row.wins.to_string());
        cells.push(format!("{:.3}", row.win_pct));
        out.push(cells);
    }
    out
}

fn player_summary_row(row: &PlayerSummaryRow) -> Vec<String> {
    vec![
        row.player_id.to_string(),
        row.faceoffs.to_string(),
        row.wins.to_string(),
        format!("{:.3}", row.win_pct),
    ]
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
