use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use faceoff_terminal::config::AppConfig;
use faceoff_terminal::export::export_workbook;
use faceoff_terminal::loader::DataLoader;
use faceoff_terminal::session::{DashboardView, ModelReport, SessionContext, TeamAnalysis};
use faceoff_terminal::team_codes::team_logo_url;

const TOP_PLAYERS: usize = 10;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cfg = AppConfig::from_env();
    let mut loader = DataLoader::new(&cfg);
    let data = loader.load().context("load faceoff data")?;

    let requested = parse_team_arg().unwrap_or_else(|| cfg.default_team.clone());
    let team = data
        .team_codes
        .lookup(&requested)
        .with_context(|| format!("unknown team {requested}"))?
        .to_string();

    let analysis = TeamAnalysis::build(&data, &team, cfg.join_policy)?;
    let ctx = SessionContext::new(&team);
    let view = DashboardView::compute(&analysis, &ctx);

    println!("{} ({})", analysis.team_name, analysis.team);
    println!("logo: {}", team_logo_url(&analysis.team));
    println!(
        "faceoffs={} wins={} win_pct={:.3} players_used={} dropped_unmatched={}",
        view.team.faceoffs,
        view.team.wins,
        view.team.win_pct,
        view.team.players_used,
        analysis.table.dropped
    );

    println!();
    println!("By opponent:");
    match &view.dimensions {
        Ok(rows) => {
            for row in rows {
                let keys: Vec<String> = row.keys.iter().map(|k| k.to_string()).collect();
                println!(
                    "  {:<6} faceoffs={:<5} win_pct={:.3}",
                    keys.join("/"),
                    row.faceoffs,
                    row.win_pct
                );
            }
        }
        Err(err) => println!("  {err}"),
    }

    println!();
    println!("Top players:");
    for row in view.players.iter().take(TOP_PLAYERS) {
        println!(
            "  {:<9} faceoffs={:<5} win_pct={:.3}",
            row.player_id, row.faceoffs, row.win_pct
        );
    }

    if has_flag("--train") {
        let report = ModelReport::train(&analysis, &ctx.params)?;
        println!();
        println!("Model:");
        println!("{}", report.summary_json()?);
    }

    if let Some(out) = parse_out_arg() {
        let report = export_workbook(&out, &analysis, &view)?;
        println!();
        println!(
            "wrote {} ({} faceoffs, {} players)",
            out.display(),
            report.faceoffs,
            report.players
        );
    }
    Ok(())
}

fn parse_value_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(v) = arg.strip_prefix(&prefix)
            && !v.trim().is_empty()
        {
            return Some(v.to_string());
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.clone());
        }
    }
    None
}

fn parse_team_arg() -> Option<String> {
    parse_value_arg("--team")
}

fn parse_out_arg() -> Option<PathBuf> {
    parse_value_arg("--out").map(PathBuf::from)
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}
