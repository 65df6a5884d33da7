use serde::Serialize;

use crate::error::{InputError, PipelineError};
use crate::evaluation::{
    FeatureImportance, Metrics, SPLIT_SEED, TEST_FRACTION, evaluate, ranked_importances,
    stratified_split,
};
use crate::features::{FeatureTable, JoinPolicy, TeamWinRates, build_features};
use crate::filters::FaceoffFilter;
use crate::forest::{ForestParams, RandomForest};
use crate::loader::Datasets;
use crate::normalize::{project_for_team, resolve_faceoffs};
use crate::players::{PlayerRecord, clean_players};
use crate::predict::{Ranking, Situation, rank_players};
use crate::summary::{
    Dimension, DimensionRow, PlayerDetail, PlayerSummaryRow, RinkPoint, TeamSummary,
    dimension_summary, player_detail, player_summary, rink_points, team_summary,
};
use crate::team_codes::TeamCodes;

/// Everything one dashboard interaction depends on. Interactions build a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    pub team: String,
    pub filter: FaceoffFilter,
    pub dimensions: Vec<Dimension>,
    pub selected_players: Vec<u32>,
    pub params: ForestParams,
    pub situation: Situation,
}

impl SessionContext {
    pub fn new(team: impl Into<String>) -> Self {
        Self {
            team: team.into(),
            filter: FaceoffFilter::default(),
            dimensions: vec![Dimension::Opponent],
            selected_players: Vec::new(),
            params: ForestParams::default(),
            situation: Situation::default(),
        }
    }

    pub fn with_team(&self, team: impl Into<String>) -> Self {
        Self {
            team: team.into(),
            filter: FaceoffFilter::default(),
            selected_players: Vec::new(),
            ..self.clone()
        }
    }

    pub fn with_filter(&self, filter: FaceoffFilter) -> Self {
        Self {
            filter,
            ..self.clone()
        }
    }

    pub fn with_dimensions(&self, dimensions: Vec<Dimension>) -> Self {
        Self {
            dimensions,
            ..self.clone()
        }
    }

    pub fn with_selected_players(&self, selected_players: Vec<u32>) -> Self {
        Self {
            selected_players,
            ..self.clone()
        }
    }

    pub fn with_params(&self, params: ForestParams) -> Self {
        Self {
            params,
            ..self.clone()
        }
    }

    pub fn with_situation(&self, situation: Situation) -> Self {
        Self {
            situation,
            ..self.clone()
        }
    }
}

/// Normalized, cleaned and joined data for one team of interest.
#[derive(Debug, Clone)]
pub struct TeamAnalysis {
    pub team: String,
    pub team_name: String,
    pub team_codes: TeamCodes,
    pub team_rates: TeamWinRates,
    pub players: Vec<PlayerRecord>,
    pub table: FeatureTable,
}

impl TeamAnalysis {
    pub fn build(
        data: &Datasets,
        team: &str,
        policy: JoinPolicy,
    ) -> Result<Self, PipelineError> {
        let Some(team_name) = data.team_codes.name_for_code(team) else {
            return Err(PipelineError::UnknownTeamCode {
                code: team.to_string(),
            });
        };
        let resolved = resolve_faceoffs(&data.faceoffs, &data.team_codes)?;
        let team_rates = TeamWinRates::compute(&resolved);
        let records = project_for_team(&resolved, team);
        let players = clean_players(&data.players)?;
        let table = build_features(&records, &players, &team_rates, policy)?;
        Ok(Self {
            team: team.to_string(),
            team_name: team_name.to_string(),
            team_codes: data.team_codes.clone(),
            team_rates,
            players,
            table,
        })
    }
}

/// Summaries for the current filters and selections.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub matched: usize,
    pub team: TeamSummary,
    pub dimension_keys: Vec<Dimension>,
    pub dimensions: Result<Vec<DimensionRow>, InputError>,
    pub players: Vec<PlayerSummaryRow>,
    pub detail: Result<PlayerDetail, InputError>,
    pub rink: Vec<RinkPoint>,
}

impl DashboardView {
    pub fn compute(analysis: &TeamAnalysis, ctx: &SessionContext) -> Self {
        let filtered = ctx.filter.apply(&analysis.table.records);
        Self {
            matched: filtered.len(),
            team: team_summary(&filtered),
            dimension_keys: ctx.dimensions.clone(),
            dimensions: dimension_summary(&filtered, &ctx.dimensions),
            players: player_summary(&filtered),
            detail: player_detail(&filtered, &analysis.players, &ctx.selected_players),
            rink: rink_points(&filtered),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary<'a> {
    pub team: &'a str,
    pub params: &'a ForestParams,
    pub train_size: usize,
    pub test_size: usize,
    pub metrics: &'a Metrics,
    pub importances: &'a [FeatureImportance],
}

#[derive(Debug, Clone)]
pub struct ModelReport {
    pub team: String,
    pub params: ForestParams,
    pub model: RandomForest,
    pub train_size: usize,
    pub test_size: usize,
    pub metrics: Metrics,
    pub importances: Vec<FeatureImportance>,
}

impl ModelReport {
    /// Fits on a stratified 80% of the team's faceoffs and scores the rest.
    pub fn train(analysis: &TeamAnalysis, params: &ForestParams) -> Result<Self, PipelineError> {
        params.validate()?;
        let x: Vec<Vec<f64>> = analysis
            .table
            .features()
            .into_iter()
            .map(|row| row.to_vec())
            .collect();
        let y = analysis.table.labels();
        if x.is_empty() {
            return Err(PipelineError::EmptyTrainingSet);
        }

        let split = stratified_split(&y, TEST_FRACTION, SPLIT_SEED);
        let x_train: Vec<Vec<f64>> = split.train.iter().map(|i| x[*i].clone()).collect();
        let y_train: Vec<bool> = split.train.iter().map(|i| y[*i]).collect();
        let model = RandomForest::fit(&x_train, &y_train, params)?;

        let probs: Vec<f64> = split
            .test
            .iter()
            .map(|i| model.predict_proba(&x[*i]))
            .collect();
        let y_test: Vec<bool> = split.test.iter().map(|i| y[*i]).collect();
        let metrics = evaluate(&probs, &y_test);
        let importances = ranked_importances(&model.feature_importances());

        tracing::info!(
            team = %analysis.team,
            train = split.train.len(),
            test = split.test.len(),
            auc = ?metrics.auc,
            accuracy = metrics.accuracy,
            "model trained"
        );
        Ok(Self {
            team: analysis.team.clone(),
            params: *params,
            model,
            train_size: split.train.len(),
            test_size: split.test.len(),
            metrics,
            importances,
        })
    }

    pub fn rank(
        &self,
        analysis: &TeamAnalysis,
        situation: &Situation,
    ) -> Result<Ranking, PipelineError> {
        rank_players(
            &self.model,
            situation,
            &analysis.table.player_rates,
            &analysis.team_rates,
            &analysis.team_codes,
        )
    }

    pub fn summary(&self) -> ModelSummary<'_> {
        ModelSummary {
            team: &self.team,
            params: &self.params,
            train_size: self.train_size,
            test_size: self.test_size,
            metrics: &self.metrics,
            importances: &self.importances,
        }
    }

    pub fn summary_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.summary())
    }
}
