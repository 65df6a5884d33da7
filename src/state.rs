use std::collections::{BTreeSet, VecDeque};

use crate::error::InputError;
use crate::features::FEATURE_COUNT;
use crate::filters::{FaceoffFilter, LocationFilter, NetFilter, ScoreStateFilter, StrengthFilter};
use crate::forest::ForestParams;
use crate::normalize::{ScoreState, Zone};
use crate::predict::{MAX_SECONDS_ELAPSED, PLAYERS_DIFF_RANGE, Ranking};
use crate::session::{DashboardView, ModelReport, SessionContext, TeamAnalysis};
use crate::summary::Dimension;

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Summary,
    Players,
    Model,
}

/// Editable fields on the model screen, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelField {
    MaxDepth,
    NEstimators,
    MinSamplesSplit,
    MinSamplesLeaf,
    MaxFeatures,
    Home,
    Opponent,
    PlayersDiff,
    SecondsElapsed,
    ZoneOffense,
    ZoneDefense,
    ScoreTeam,
    ScoreDiff,
}

impl ModelField {
    pub const ALL: [ModelField; 13] = [
        ModelField::MaxDepth,
        ModelField::NEstimators,
        ModelField::MinSamplesSplit,
        ModelField::MinSamplesLeaf,
        ModelField::MaxFeatures,
        ModelField::Home,
        ModelField::Opponent,
        ModelField::PlayersDiff,
        ModelField::SecondsElapsed,
        ModelField::ZoneOffense,
        ModelField::ZoneDefense,
        ModelField::ScoreTeam,
        ModelField::ScoreDiff,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ModelField::MaxDepth => "Max depth",
            ModelField::NEstimators => "Trees",
            ModelField::MinSamplesSplit => "Min split frac",
            ModelField::MinSamplesLeaf => "Min leaf frac",
            ModelField::MaxFeatures => "Max features",
            ModelField::Home => "Home",
            ModelField::Opponent => "Opponent",
            ModelField::PlayersDiff => "Skater diff",
            ModelField::SecondsElapsed => "Seconds elapsed",
            ModelField::ZoneOffense => "Offensive zone",
            ModelField::ZoneDefense => "Defensive zone",
            ModelField::ScoreTeam => "Goals for",
            ModelField::ScoreDiff => "Goal diff",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub help_overlay: bool,
    pub logs: VecDeque<String>,
    /// Team codes in file order.
    pub teams: Vec<String>,
    pub ctx: SessionContext,
    pub analysis: Option<TeamAnalysis>,
    pub view: Option<DashboardView>,
    pub model: Option<ModelReport>,
    pub ranking: Option<Ranking>,
    pub dimension_cursor: usize,
    pub player_cursor: usize,
    pub field_cursor: usize,
    pub last_export: Option<String>,
}

impl AppState {
    pub fn new(teams: Vec<String>, team: &str) -> Self {
        Self {
            screen: Screen::Summary,
            help_overlay: false,
            logs: VecDeque::with_capacity(MAX_LOGS),
            teams,
            ctx: SessionContext::new(team),
            analysis: None,
            view: None,
            model: None,
            ranking: None,
            dimension_cursor: 0,
            player_cursor: 0,
            field_cursor: 0,
            last_export: None,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    /// Installs a freshly built analysis; model results belong to the old team.
    pub fn set_analysis(&mut self, analysis: TeamAnalysis) {
        let mut situation = self.ctx.situation.clone();
        if situation.opponent.is_empty() || situation.opponent == analysis.team {
            situation.opponent = self
                .teams
                .iter()
                .find(|code| **code != analysis.team)
                .cloned()
                .unwrap_or_default();
        }
        self.ctx = self.ctx.with_team(analysis.team.clone()).with_situation(situation);
        self.push_log(format!(
            "[INFO] {} loaded: {} faceoffs, {} dropped without player data",
            analysis.team,
            analysis.table.records.len(),
            analysis.table.dropped
        ));
        self.analysis = Some(analysis);
        self.model = None;
        self.ranking = None;
        self.player_cursor = 0;
        self.refresh_view();
    }

    pub fn refresh_view(&mut self) {
        self.view = self
            .analysis
            .as_ref()
            .map(|analysis| DashboardView::compute(analysis, &self.ctx));
        let players = self.view.as_ref().map(|v| v.players.len()).unwrap_or(0);
        self.player_cursor = self.player_cursor.min(players.saturating_sub(1));
    }

    fn team_offset(&self, step: isize) -> Option<String> {
        if self.teams.is_empty() {
            return None;
        }
        let len = self.teams.len() as isize;
        let current = self
            .teams
            .iter()
            .position(|c| *c == self.ctx.team)
            .unwrap_or(0) as isize;
        let next = (current + step).rem_euclid(len) as usize;
        self.teams.get(next).cloned()
    }

    pub fn next_team(&self) -> Option<String> {
        self.team_offset(1)
    }

    pub fn prev_team(&self) -> Option<String> {
        self.team_offset(-1)
    }

    fn update_filter(&mut self, change: impl FnOnce(&mut FaceoffFilter)) {
        let mut filter = self.ctx.filter.clone();
        change(&mut filter);
        self.ctx = self.ctx.with_filter(filter);
        self.refresh_view();
    }

    fn opponents(&self) -> Vec<String> {
        let Some(analysis) = &self.analysis else {
            return Vec::new();
        };
        let set: BTreeSet<String> = analysis
            .table
            .records
            .iter()
            .map(|r| r.faceoff.opponent.clone())
            .collect();
        set.into_iter().collect()
    }

    fn seasons(&self) -> Vec<u32> {
        let Some(analysis) = &self.analysis else {
            return Vec::new();
        };
        let set: BTreeSet<u32> = analysis.table.records.iter().map(|r| r.faceoff.season).collect();
        set.into_iter().collect()
    }

    pub fn cycle_opponent(&mut self) {
        let opponents = self.opponents();
        self.update_filter(|f| {
            let current: Option<BTreeSet<String>> =
                (!f.opponents.is_empty()).then(|| f.opponents.clone());
            f.opponents = cycle_single(&current, &opponents).unwrap_or_default();
        });
    }

    pub fn cycle_season(&mut self) {
        let seasons = self.seasons();
        self.update_filter(|f| f.seasons = cycle_single(&f.seasons, &seasons));
    }

    pub fn cycle_period(&mut self) {
        self.update_filter(|f| f.periods = cycle_single(&f.periods, &[1, 2, 3, 4]));
    }

    pub fn cycle_zone(&mut self) {
        self.update_filter(|f| {
            f.zones = cycle_single(&f.zones, &[Zone::Offense, Zone::Neutral, Zone::Defense])
        });
    }

    pub fn cycle_location(&mut self) {
        self.update_filter(|f| {
            f.location = match f.location {
                LocationFilter::All => LocationFilter::Home,
                LocationFilter::Home => LocationFilter::Away,
                LocationFilter::Away => LocationFilter::All,
            }
        });
    }

    pub fn cycle_strength(&mut self) {
        self.update_filter(|f| {
            f.strength = match f.strength {
                StrengthFilter::All => StrengthFilter::EvenStrength,
                StrengthFilter::EvenStrength => StrengthFilter::PowerPlay,
                StrengthFilter::PowerPlay => StrengthFilter::ShortHanded,
                StrengthFilter::ShortHanded => StrengthFilter::All,
            }
        });
    }

    pub fn cycle_net(&mut self) {
        self.update_filter(|f| {
            f.net = match f.net {
                NetFilter::All => NetFilter::Standard,
                NetFilter::Standard => NetFilter::EmptyNet,
                NetFilter::EmptyNet => NetFilter::ExtraAttacker,
                NetFilter::ExtraAttacker => NetFilter::All,
            }
        });
    }

    pub fn cycle_score_state(&mut self) {
        self.update_filter(|f| {
            f.score_state = match f.score_state {
                ScoreStateFilter::All => ScoreStateFilter::Only(ScoreState::Leading),
                ScoreStateFilter::Only(ScoreState::Leading) => {
                    ScoreStateFilter::Only(ScoreState::Tied)
                }
                ScoreStateFilter::Only(ScoreState::Tied) => {
                    ScoreStateFilter::Only(ScoreState::Trailing)
                }
                ScoreStateFilter::Only(ScoreState::Trailing) => ScoreStateFilter::All,
            }
        });
    }

    pub fn reset_filters(&mut self) {
        self.update_filter(|f| *f = FaceoffFilter::default());
        self.push_log("[INFO] Filters reset");
    }

    pub fn dimension_next(&mut self) {
        self.dimension_cursor = (self.dimension_cursor + 1) % Dimension::ALL.len();
    }

    pub fn dimension_prev(&mut self) {
        self.dimension_cursor =
            (self.dimension_cursor + Dimension::ALL.len() - 1) % Dimension::ALL.len();
    }

    /// Adds or removes the dimension under the cursor, keeping selection order.
    pub fn toggle_dimension(&mut self) {
        let dim = Dimension::ALL[self.dimension_cursor];
        let mut dims = self.ctx.dimensions.clone();
        if let Some(pos) = dims.iter().position(|d| *d == dim) {
            dims.remove(pos);
        } else {
            dims.push(dim);
        }
        self.ctx = self.ctx.with_dimensions(dims);
        self.refresh_view();
    }

    pub fn select_next(&mut self) {
        match self.screen {
            Screen::Players => {
                let total = self.view.as_ref().map(|v| v.players.len()).unwrap_or(0);
                if total > 0 {
                    self.player_cursor = (self.player_cursor + 1).min(total - 1);
                }
            }
            Screen::Model => {
                self.field_cursor = (self.field_cursor + 1).min(ModelField::ALL.len() - 1);
            }
            Screen::Summary => self.dimension_next(),
        }
    }

    pub fn select_prev(&mut self) {
        match self.screen {
            Screen::Players => self.player_cursor = self.player_cursor.saturating_sub(1),
            Screen::Model => self.field_cursor = self.field_cursor.saturating_sub(1),
            Screen::Summary => self.dimension_prev(),
        }
    }

    pub fn cursor_player(&self) -> Option<u32> {
        self.view
            .as_ref()
            .and_then(|v| v.players.get(self.player_cursor))
            .map(|p| p.player_id)
    }

    pub fn toggle_player_mark(&mut self) {
        let Some(player_id) = self.cursor_player() else {
            return;
        };
        let mut selected = self.ctx.selected_players.clone();
        if let Some(pos) = selected.iter().position(|p| *p == player_id) {
            selected.remove(pos);
        } else {
            selected.push(player_id);
        }
        self.ctx = self.ctx.with_selected_players(selected);
        self.refresh_view();
    }

    pub fn focused_field(&self) -> ModelField {
        ModelField::ALL[self.field_cursor.min(ModelField::ALL.len() - 1)]
    }

    /// `+`/`-` on the focused model field. Values stay inside their allowed ranges.
    pub fn adjust_field(&mut self, step: i32) {
        let mut params = self.ctx.params;
        let mut situation = self.ctx.situation.clone();
        match self.focused_field() {
            ModelField::MaxDepth => {
                let (lo, hi) = ForestParams::MAX_DEPTH_RANGE;
                params.max_depth =
                    clamp_step(params.max_depth as i64, step as i64, lo as i64, hi as i64) as usize;
            }
            ModelField::NEstimators => {
                let (lo, hi) = ForestParams::N_ESTIMATORS_RANGE;
                params.n_estimators =
                    clamp_step(params.n_estimators as i64, 10 * step as i64, lo as i64, hi as i64)
                        as usize;
            }
            ModelField::MinSamplesSplit => {
                let (lo, hi) = ForestParams::MIN_SAMPLES_SPLIT_RANGE;
                params.min_samples_split =
                    round2(params.min_samples_split + 0.01 * step as f64).clamp(lo, hi);
            }
            ModelField::MinSamplesLeaf => {
                let (lo, hi) = ForestParams::MIN_SAMPLES_LEAF_RANGE;
                params.min_samples_leaf =
                    round2(params.min_samples_leaf + 0.01 * step as f64).clamp(lo, hi);
            }
            ModelField::MaxFeatures => {
                params.max_features = step_max_features(params.max_features, step);
            }
            ModelField::Home => situation.home = !situation.home,
            ModelField::ZoneOffense => situation.zone_offense = !situation.zone_offense,
            ModelField::ZoneDefense => situation.zone_defense = !situation.zone_defense,
            ModelField::Opponent => {
                let choices: Vec<&String> =
                    self.teams.iter().filter(|c| **c != self.ctx.team).collect();
                if !choices.is_empty() {
                    let len = choices.len() as i64;
                    let current = choices
                        .iter()
                        .position(|c| **c == situation.opponent)
                        .unwrap_or(0) as i64;
                    let next = (current + step as i64).rem_euclid(len) as usize;
                    situation.opponent = choices[next].clone();
                }
            }
            ModelField::PlayersDiff => {
                let (lo, hi) = PLAYERS_DIFF_RANGE;
                situation.players_diff = (situation.players_diff + step).clamp(lo, hi);
            }
            ModelField::SecondsElapsed => {
                situation.seconds_elapsed_game = clamp_step(
                    situation.seconds_elapsed_game as i64,
                    60 * step as i64,
                    0,
                    MAX_SECONDS_ELAPSED as i64,
                ) as u32;
            }
            ModelField::ScoreTeam => situation.score_team = (situation.score_team + step).max(0),
            ModelField::ScoreDiff => situation.score_diff += step,
        }
        self.ctx = self.ctx.with_params(params).with_situation(situation);
        if self.model.is_some() {
            self.rank();
        }
    }

    pub fn train(&mut self) {
        let Some(analysis) = &self.analysis else {
            self.push_log("[WARN] No team data loaded");
            return;
        };
        match ModelReport::train(analysis, &self.ctx.params) {
            Ok(report) => {
                let auc = report
                    .metrics
                    .auc
                    .map(|v| format!("{v:.3}"))
                    .unwrap_or_else(|| "n/a".to_string());
                self.push_log(format!(
                    "[INFO] Model trained on {} faceoffs (AUC {auc}, accuracy {:.3})",
                    report.train_size, report.metrics.accuracy
                ));
                self.model = Some(report);
                self.rank();
            }
            Err(err) => {
                self.model = None;
                self.ranking = None;
                self.push_log(format!("[ERROR] Training failed: {err}"));
            }
        }
    }

    pub fn rank(&mut self) {
        let (Some(model), Some(analysis)) = (&self.model, &self.analysis) else {
            return;
        };
        match model.rank(analysis, &self.ctx.situation) {
            Ok(ranking) => self.ranking = Some(ranking),
            Err(err) => {
                self.ranking = None;
                self.push_log(format!("[WARN] {err}"));
            }
        }
    }

    pub fn detail_error(&self) -> Option<InputError> {
        self.view.as_ref().and_then(|v| v.detail.as_ref().err().copied())
    }
}

/// None -> first value -> ... -> last value -> None.
pub fn cycle_single<T: Ord + Clone>(
    current: &Option<BTreeSet<T>>,
    values: &[T],
) -> Option<BTreeSet<T>> {
    let next = match current {
        None => values.first(),
        Some(set) if set.len() == 1 => {
            let pos = values.iter().position(|v| set.contains(v));
            pos.and_then(|p| values.get(p + 1))
        }
        Some(_) => None,
    };
    next.map(|v| BTreeSet::from([v.clone()]))
}

fn clamp_step(value: i64, step: i64, lo: i64, hi: i64) -> i64 {
    (value + step).clamp(lo, hi)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn step_max_features(current: Option<usize>, step: i32) -> Option<usize> {
    let all = FEATURE_COUNT;
    let k = current.unwrap_or(all) as i64 + step as i64;
    let k = k.clamp(1, all as i64) as usize;
    if k >= all { None } else { Some(k) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_single_wraps_to_none() {
        let values = [1u8, 2, 3];
        let first = cycle_single(&None, &values);
        assert_eq!(first, Some(BTreeSet::from([1])));
        let last = cycle_single(&Some(BTreeSet::from([3])), &values);
        assert_eq!(last, None);
    }

    #[test]
    fn max_features_steps_to_all() {
        assert_eq!(step_max_features(None, -1), Some(FEATURE_COUNT - 1));
        assert_eq!(step_max_features(Some(FEATURE_COUNT - 1), 1), None);
        assert_eq!(step_max_features(Some(1), -1), Some(1));
    }

    #[test]
    fn logs_are_bounded() {
        let mut state = AppState::new(vec!["NSH".to_string()], "NSH");
        for i in 0..250 {
            state.push_log(format!("[INFO] {i}"));
        }
        assert_eq!(state.logs.len(), MAX_LOGS);
        assert_eq!(state.logs.front().map(String::as_str), Some("[INFO] 50"));
    }
}
