use std::fs::OpenOptions;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Clear, Dataset, GraphType,
    Paragraph, Row, Table, TableState,
};
use tracing_subscriber::EnvFilter;

use faceoff_terminal::config::AppConfig;
use faceoff_terminal::export::export_workbook;
use faceoff_terminal::filters::{
    FaceoffFilter, LocationFilter, NetFilter, ScoreStateFilter, StrengthFilter,
};
use faceoff_terminal::loader::{DataLoader, Datasets};
use faceoff_terminal::session::{ModelReport, TeamAnalysis};
use faceoff_terminal::state::{AppState, ModelField, Screen};
use faceoff_terminal::summary::{Dimension, RINK_X_RANGE, RINK_Y_RANGE, RinkPoint};

struct App {
    state: AppState,
    should_quit: bool,
    cfg: AppConfig,
    loader: DataLoader,
    data: Option<Arc<Datasets>>,
}

impl App {
    fn new(cfg: AppConfig) -> Self {
        let mut loader = DataLoader::new(&cfg);
        let (data, teams, team, load_error) = match loader.load() {
            Ok(data) => {
                let teams = data.team_codes.distinct_codes();
                let team = data
                    .team_codes
                    .lookup(&cfg.default_team)
                    .map(str::to_string)
                    .or_else(|| teams.first().cloned())
                    .unwrap_or_default();
                (Some(data), teams, team, None)
            }
            Err(err) => (None, Vec::new(), String::new(), Some(err)),
        };

        let mut app = Self {
            state: AppState::new(teams, &team),
            should_quit: false,
            cfg,
            loader,
            data,
        };
        match load_error {
            Some(err) => {
                tracing::error!(error = %format!("{err:#}"), "data load failed");
                app.state.push_log(format!("[ERROR] Data load failed: {err:#}"));
            }
            None => app.switch_team(&team),
        }
        app
    }

    fn reload(&mut self) {
        match self.loader.load() {
            Ok(data) => self.data = Some(data),
            Err(err) => {
                self.state
                    .push_log(format!("[ERROR] Data reload failed: {err:#}"));
            }
        }
    }

    fn switch_team(&mut self, team: &str) {
        self.reload();
        let Some(data) = &self.data else {
            return;
        };
        match TeamAnalysis::build(data, team, self.cfg.join_policy) {
            Ok(analysis) => self.state.set_analysis(analysis),
            Err(err) => {
                tracing::warn!(team, error = %err, "team analysis failed");
                self.state
                    .push_log(format!("[ERROR] Could not build {team}: {err}"));
            }
        }
    }

    fn export(&mut self) {
        let (Some(analysis), Some(view)) = (&self.state.analysis, &self.state.view) else {
            self.state.push_log("[WARN] Nothing to export");
            return;
        };
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = self
            .cfg
            .export_dir
            .join(format!("faceoffs_{}_{stamp}.xlsx", analysis.team));
        match export_workbook(&path, analysis, view) {
            Ok(report) => {
                let shown = path.display().to_string();
                self.state.push_log(format!(
                    "[INFO] Exported {} faceoffs, {} players to {shown}",
                    report.faceoffs, report.players
                ));
                self.state.last_export = Some(shown);
            }
            Err(err) => self.state.push_log(format!("[ERROR] Export failed: {err:#}")),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            KeyCode::Char('1') => self.state.screen = Screen::Summary,
            KeyCode::Char('2') => self.state.screen = Screen::Players,
            KeyCode::Char('3') => self.state.screen = Screen::Model,
            KeyCode::Char('t') => {
                if let Some(team) = self.state.next_team() {
                    self.switch_team(&team);
                }
            }
            KeyCode::Char('T') => {
                if let Some(team) = self.state.prev_team() {
                    self.switch_team(&team);
                }
            }
            KeyCode::Char('o') => self.state.cycle_opponent(),
            KeyCode::Char('s') => self.state.cycle_season(),
            KeyCode::Char('p') => self.state.cycle_period(),
            KeyCode::Char('z') => self.state.cycle_zone(),
            KeyCode::Char('h') => self.state.cycle_location(),
            KeyCode::Char('g') => self.state.cycle_strength(),
            KeyCode::Char('n') => self.state.cycle_net(),
            KeyCode::Char('c') => self.state.cycle_score_state(),
            KeyCode::Char('x') => self.state.reset_filters(),
            KeyCode::Char('[') => self.state.dimension_prev(),
            KeyCode::Char(']') => self.state.dimension_next(),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char(' ') => match self.state.screen {
                Screen::Summary => self.state.toggle_dimension(),
                Screen::Players => self.state.toggle_player_mark(),
                Screen::Model => self.state.adjust_field(1),
            },
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Right => {
                if self.state.screen == Screen::Model {
                    self.state.adjust_field(1);
                }
            }
            KeyCode::Char('-') | KeyCode::Left => {
                if self.state.screen == Screen::Model {
                    self.state.adjust_field(-1);
                }
            }
            KeyCode::Enter => {
                self.state.screen = Screen::Model;
                self.state.push_log("[INFO] Training model...");
                self.state.train();
            }
            KeyCode::Char('e') => self.export(),
            _ => {}
        }
    }
}

fn init_tracing(cfg: &AppConfig) -> Result<()> {
    // Terminal output would corrupt the alternate screen, so log to a file or not at all.
    let Some(path) = &cfg.log_file else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cfg = AppConfig::from_env();
    init_tracing(&cfg)?;
    let mut app = App::new(cfg);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Summary => render_summary(frame, chunks[1], &app.state),
        Screen::Players => render_players(frame, chunks[1], &app.state),
        Screen::Model => render_model(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::TOP));
    frame.render_widget(console, chunks[2]);

    let footer =
        Paragraph::new(footer_text(app.state.screen)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let screen = match state.screen {
        Screen::Summary => "SUMMARY",
        Screen::Players => "PLAYERS",
        Screen::Model => "MODEL",
    };
    let team = match &state.analysis {
        Some(a) => format!("{} {}", a.team, a.team_name),
        None => "no data".to_string(),
    };
    let line1 = format!(" FACEOFF TERMINAL | {screen} | {team}");
    let line2 = format!(" Filters: {}", filter_text(&state.ctx.filter));
    format!("{line1}\n{line2}")
}

fn filter_text(filter: &FaceoffFilter) -> String {
    if filter.is_unfiltered() {
        return "none".to_string();
    }
    let mut parts = Vec::new();
    if !filter.opponents.is_empty() {
        let list: Vec<&str> = filter.opponents.iter().map(String::as_str).collect();
        parts.push(format!("vs {}", list.join(",")));
    }
    if let Some(seasons) = &filter.seasons {
        let list: Vec<String> = seasons.iter().map(|s| s.to_string()).collect();
        parts.push(format!("season {}", list.join(",")));
    }
    if let Some(periods) = &filter.periods {
        let list: Vec<String> = periods.iter().map(|p| p.to_string()).collect();
        parts.push(format!("period {}", list.join(",")));
    }
    if let Some(zones) = &filter.zones {
        let list: Vec<&str> = zones.iter().map(|z| z.label()).collect();
        parts.push(format!("zone {}", list.join(",")));
    }
    match filter.location {
        LocationFilter::All => {}
        LocationFilter::Home => parts.push("home".to_string()),
        LocationFilter::Away => parts.push("away".to_string()),
    }
    match filter.strength {
        StrengthFilter::All => {}
        StrengthFilter::PowerPlay => parts.push("power play".to_string()),
        StrengthFilter::EvenStrength => parts.push("even strength".to_string()),
        StrengthFilter::ShortHanded => parts.push("short handed".to_string()),
    }
    match filter.net {
        NetFilter::All => {}
        NetFilter::Standard => parts.push("both goalies".to_string()),
        NetFilter::EmptyNet => parts.push("empty net".to_string()),
        NetFilter::ExtraAttacker => parts.push("extra attacker".to_string()),
    }
    if let ScoreStateFilter::Only(state) = filter.score_state {
        parts.push(state.label().to_string());
    }
    parts.join(" | ")
}

fn footer_text(screen: Screen) -> &'static str {
    match screen {
        Screen::Summary => {
            "1/2/3 Screens | t/T Team | o s p z h g n c Filters | x Reset | [/] + space Dimensions | e Export | ? Help | q Quit"
        }
        Screen::Players => {
            "1/2/3 Screens | t/T Team | j/k Move | space Mark | o s p z h g n c Filters | e Export | ? Help | q Quit"
        }
        Screen::Model => {
            "1/2/3 Screens | j/k Field | +/- Adjust | Enter Train | ? Help | q Quit"
        }
    }
}

fn render_summary(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(view) = &state.view else {
        frame.render_widget(
            Paragraph::new("No team data loaded").block(Block::default().borders(Borders::ALL)),
            area,
        );
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);
    let kpi = format!(
        "Faceoffs {}   Wins {}   Win % {:.1}   Players used {}",
        view.team.faceoffs,
        view.team.wins,
        view.team.win_pct * 100.0,
        view.team.players_used
    );
    frame.render_widget(
        Paragraph::new(kpi).block(Block::default().title("Team").borders(Borders::ALL)),
        rows[0],
    );

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(22),
            Constraint::Percentage(45),
            Constraint::Min(20),
        ])
        .split(rows[1]);

    let picker: Vec<Row> = Dimension::ALL
        .iter()
        .enumerate()
        .map(|(i, dim)| {
            let order = state.ctx.dimensions.iter().position(|d| d == dim);
            let mark = order.map(|o| format!("{}", o + 1)).unwrap_or_default();
            let style = if i == state.dimension_cursor {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Row::new(vec![Cell::from(mark), Cell::from(dim.title())]).style(style)
        })
        .collect();
    let picker = Table::new(picker, [Constraint::Length(2), Constraint::Min(10)])
        .block(Block::default().title("Group by").borders(Borders::ALL));
    frame.render_widget(picker, columns[0]);

    match &view.dimensions {
        Ok(groups) => {
            let mut header: Vec<Cell> = view
                .dimension_keys
                .iter()
                .map(|d| Cell::from(d.title()))
                .collect();
            header.extend(["Faceoffs", "Win %"].map(Cell::from));
            let body: Vec<Row> = groups
                .iter()
                .map(|g| {
                    let mut cells: Vec<Cell> =
                        g.keys.iter().map(|k| Cell::from(k.to_string())).collect();
                    cells.push(Cell::from(g.faceoffs.to_string()));
                    cells.push(Cell::from(format!("{:.1}", g.win_pct * 100.0)));
                    Row::new(cells).style(Style::default().fg(win_color(g.win_pct)))
                })
                .collect();
            let widths: Vec<Constraint> = (0..view.dimension_keys.len() + 2)
                .map(|_| Constraint::Min(8))
                .collect();
            let table = Table::new(body, widths)
                .header(Row::new(header).style(Style::default().add_modifier(Modifier::BOLD)))
                .block(Block::default().title("Win % by dimension").borders(Borders::ALL));
            frame.render_widget(table, columns[1]);
        }
        Err(err) => {
            frame.render_widget(
                Paragraph::new(err.to_string())
                    .block(Block::default().title("Win % by dimension").borders(Borders::ALL)),
                columns[1],
            );
        }
    }

    render_rink(frame, columns[2], &view.rink, "Rink");
}

fn win_color(win_pct: f64) -> Color {
    if win_pct >= 0.55 {
        Color::Green
    } else if win_pct >= 0.45 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn render_rink(frame: &mut Frame, area: Rect, points: &[RinkPoint], title: &str) {
    let mut low = Vec::new();
    let mut even = Vec::new();
    let mut high = Vec::new();
    for p in points {
        let target = match win_color(p.win_pct) {
            Color::Green => &mut high,
            Color::Yellow => &mut even,
            _ => &mut low,
        };
        target.push((p.x, p.y));
    }
    let datasets = vec![
        Dataset::default()
            .name("<45%")
            .marker(Marker::Braille)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Red))
            .data(&low),
        Dataset::default()
            .name("45-55%")
            .marker(Marker::Braille)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Yellow))
            .data(&even),
        Dataset::default()
            .name(">=55%")
            .marker(Marker::Braille)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Green))
            .data(&high),
    ];
    let [x_lo, x_hi] = RINK_X_RANGE;
    let [y_lo, y_hi] = RINK_Y_RANGE;
    let chart = Chart::new(datasets)
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .bounds(RINK_X_RANGE)
                .labels(vec![
                    Span::raw(format!("{x_lo:.0}")),
                    Span::raw("0"),
                    Span::raw(format!("{x_hi:.0}")),
                ]),
        )
        .y_axis(
            Axis::default()
                .bounds(RINK_Y_RANGE)
                .labels(vec![
                    Span::raw(format!("{y_lo:.1}")),
                    Span::raw(format!("{y_hi:.1}")),
                ]),
        );
    frame.render_widget(chart, area);
}

fn render_players(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(view) = &state.view else {
        frame.render_widget(
            Paragraph::new("No team data loaded").block(Block::default().borders(Borders::ALL)),
            area,
        );
        return;
    };
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(40), Constraint::Min(20)])
        .split(area);

    let body: Vec<Row> = view
        .players
        .iter()
        .map(|p| {
            let marked = state.ctx.selected_players.contains(&p.player_id);
            Row::new(vec![
                Cell::from(if marked { "*" } else { "" }),
                Cell::from(p.player_id.to_string()),
                Cell::from(p.faceoffs.to_string()),
                Cell::from(p.wins.to_string()),
                Cell::from(format!("{:.1}", p.win_pct * 100.0)),
            ])
        })
        .collect();
    let table = Table::new(
        body,
        [
            Constraint::Length(1),
            Constraint::Length(9),
            Constraint::Length(8),
            Constraint::Length(6),
            Constraint::Length(7),
        ],
    )
    .header(
        Row::new(vec!["", "Player", "Faceoffs", "Wins", "Win %"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
    .block(Block::default().title("Players").borders(Borders::ALL));
    let mut table_state = TableState::default();
    if !view.players.is_empty() {
        table_state.select(Some(state.player_cursor));
    }
    frame.render_stateful_widget(table, columns[0], &mut table_state);

    match &view.detail {
        Ok(detail) => {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(9), Constraint::Min(5)])
                .split(columns[1]);
            let mut lines = Vec::new();
            if let Some(p) = &detail.player {
                lines.push(format!(
                    "Player {}  height {:.0} in  weight {:.0} lb  shoots {}",
                    p.player_id, p.height, p.weight, p.shoots
                ));
            }
            lines.push(format!(
                "Faceoffs {}  Win % {:.1}",
                detail.faceoffs,
                detail.win_rate * 100.0
            ));
            let zones: Vec<String> = detail
                .by_zone
                .iter()
                .map(|(z, r)| format!("{z} {:.1}", r * 100.0))
                .collect();
            lines.push(format!("By zone: {}", zones.join("  ")));
            let hands: Vec<String> = detail
                .by_opposing_hand
                .iter()
                .map(|(h, r)| format!("vs {h} {:.1}", r * 100.0))
                .collect();
            lines.push(format!("By opposing hand: {}", hands.join("  ")));
            lines.push(format!(
                "Power play {:.1}  Short handed {:.1}",
                detail.power_play * 100.0,
                detail.short_handed * 100.0
            ));
            lines.push(format!(
                "Empty net {:.1}  Extra attacker {:.1}",
                detail.empty_net * 100.0,
                detail.extra_attacker * 100.0
            ));
            frame.render_widget(
                Paragraph::new(lines.join("\n"))
                    .block(Block::default().title("Player detail").borders(Borders::ALL)),
                rows[0],
            );
            render_rink(frame, rows[1], &detail.rink, "Player rink");
        }
        Err(err) => {
            frame.render_widget(
                Paragraph::new(format!("{err}\n\nMark exactly one player with space."))
                    .block(Block::default().title("Player detail").borders(Borders::ALL)),
                columns[1],
            );
        }
    }
}

fn render_model(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(34),
            Constraint::Percentage(40),
            Constraint::Min(24),
        ])
        .split(area);

    let form: Vec<Row> = ModelField::ALL
        .iter()
        .map(|field| {
            Row::new(vec![
                Cell::from(field.label()),
                Cell::from(field_value(state, *field)),
            ])
        })
        .collect();
    let form = Table::new(form, [Constraint::Length(16), Constraint::Min(8)])
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .block(Block::default().title("Model / situation").borders(Borders::ALL));
    let mut form_state = TableState::default();
    form_state.select(Some(state.field_cursor));
    frame.render_stateful_widget(form, columns[0], &mut form_state);

    let Some(model) = &state.model else {
        frame.render_widget(
            Paragraph::new("Press Enter to train")
                .block(Block::default().title("Metrics").borders(Borders::ALL)),
            columns[1],
        );
        return;
    };

    let middle = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(5)])
        .split(columns[1]);
    let m = &model.metrics;
    let auc = m
        .auc
        .map(|v| format!("{v:.3}"))
        .unwrap_or_else(|| "n/a".to_string());
    let metrics = [
        format!("Train {}  Test {}", model.train_size, model.test_size),
        format!("AUC {auc}  Accuracy {:.3}", m.accuracy),
        format!("Precision {:.3}  Recall {:.3}  F1 {:.3}", m.precision, m.recall, m.f1),
        format!("Brier {:.4}", m.brier),
        format!(
            "TP {}  FP {}  TN {}  FN {}",
            m.confusion.true_positive,
            m.confusion.false_positive,
            m.confusion.true_negative,
            m.confusion.false_negative
        ),
        format!("Calibration bins {}", m.calibration.len()),
    ]
    .join("\n");
    frame.render_widget(
        Paragraph::new(metrics).block(Block::default().title("Metrics").borders(Borders::ALL)),
        middle[0],
    );
    frame.render_widget(importance_chart(model), middle[1]);

    let Some(ranking) = &state.ranking else {
        frame.render_widget(
            Paragraph::new("No ranking for this situation")
                .block(Block::default().title("Who takes it").borders(Borders::ALL)),
            columns[2],
        );
        return;
    };
    let best: Vec<String> = ranking.best.iter().map(|id| id.to_string()).collect();
    let body: Vec<Row> = ranking
        .chances
        .iter()
        .map(|c| {
            let style = if ranking.best.contains(&c.player_id) {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(c.player_id.to_string()),
                Cell::from(format!("{:.3}", c.player_win_rate)),
                Cell::from(format!("{:.1}", c.chance_to_win * 100.0)),
            ])
            .style(style)
        })
        .collect();
    let table = Table::new(
        body,
        [
            Constraint::Length(9),
            Constraint::Length(8),
            Constraint::Min(8),
        ],
    )
    .header(
        Row::new(vec!["Player", "FO rate", "Chance %"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .title(format!("Best: {}", best.join(", ")))
            .borders(Borders::ALL),
    );
    frame.render_widget(table, columns[2]);
}

fn field_value(state: &AppState, field: ModelField) -> String {
    let params = &state.ctx.params;
    let s = &state.ctx.situation;
    let yes_no = |v: bool| if v { "yes" } else { "no" }.to_string();
    match field {
        ModelField::MaxDepth => params.max_depth.to_string(),
        ModelField::NEstimators => params.n_estimators.to_string(),
        ModelField::MinSamplesSplit => format!("{:.2}", params.min_samples_split),
        ModelField::MinSamplesLeaf => format!("{:.2}", params.min_samples_leaf),
        ModelField::MaxFeatures => params
            .max_features
            .map(|k| k.to_string())
            .unwrap_or_else(|| "all".to_string()),
        ModelField::Home => yes_no(s.home),
        ModelField::Opponent => s.opponent.clone(),
        ModelField::PlayersDiff => format!("{:+}", s.players_diff),
        ModelField::SecondsElapsed => s.seconds_elapsed_game.to_string(),
        ModelField::ZoneOffense => yes_no(s.zone_offense),
        ModelField::ZoneDefense => yes_no(s.zone_defense),
        ModelField::ScoreTeam => s.score_team.to_string(),
        ModelField::ScoreDiff => format!("{:+}", s.score_diff),
    }
}

fn importance_chart(model: &ModelReport) -> BarChart<'static> {
    let bars: Vec<Bar> = model
        .importances
        .iter()
        .map(|imp| {
            Bar::default()
                .label(Line::from(imp.feature))
                .value((imp.importance * 1000.0).round() as u64)
                .text_value(format!("{:.3}", imp.importance))
                .style(Style::default().fg(Color::Cyan))
        })
        .collect();

    BarChart::default()
        .block(Block::default().title("Feature importance").borders(Borders::ALL))
        .data(BarGroup::default().bars(&bars))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .max(1000)
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(4)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Faceoff Terminal - Help",
        "",
        "Global:",
        "  1 / 2 / 3    Summary / Players / Model",
        "  t / T        Next / previous team",
        "  e            Export workbook",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Filters:",
        "  o opponent  s season  p period  z zone",
        "  h home/away  g strength  n net  c score state",
        "  x            Reset filters",
        "",
        "Summary:",
        "  [ / ]        Move dimension cursor",
        "  space        Add/remove dimension",
        "",
        "Players:",
        "  j/k or ↑/↓   Move",
        "  space        Mark player",
        "",
        "Model:",
        "  j/k          Focus field",
        "  + / -        Adjust field",
        "  Enter        Train and rank",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
