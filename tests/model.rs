mod common;

use faceoff_terminal::error::PipelineError;
use faceoff_terminal::evaluation::{
    ConfusionMatrix, SPLIT_SEED, TEST_FRACTION, evaluate, ranked_importances, roc_auc,
    stratified_split,
};
use faceoff_terminal::features::{JoinPolicy, MODEL_FEATURES};
use faceoff_terminal::forest::{ForestParams, RandomForest};
use faceoff_terminal::predict::Situation;
use faceoff_terminal::session::{ModelReport, TeamAnalysis};

fn quick_params() -> ForestParams {
    ForestParams {
        n_estimators: 30,
        ..ForestParams::default()
    }
}

fn threshold_data(n: usize) -> (Vec<Vec<f64>>, Vec<bool>) {
    let x: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            let signal = i as f64 / n as f64;
            let noise = ((i * 7919) % 97) as f64 / 97.0;
            vec![signal, noise]
        })
        .collect();
    let y = x.iter().map(|row| row[0] > 0.6).collect();
    (x, y)
}

#[test]
fn forest_is_deterministic_for_a_seed() {
    let (x, y) = threshold_data(200);
    let a = RandomForest::fit(&x, &y, &quick_params()).unwrap();
    let b = RandomForest::fit(&x, &y, &quick_params()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.n_trees(), 30);

    let other = RandomForest::fit(
        &x,
        &y,
        &ForestParams {
            seed: 7,
            ..quick_params()
        },
    )
    .unwrap();
    assert_eq!(other.n_trees(), 30);
}

#[test]
fn forest_learns_a_threshold_and_credits_the_signal() {
    let (x, y) = threshold_data(300);
    let model = RandomForest::fit(&x, &y, &quick_params()).unwrap();
    assert!(model.predict(&[0.9, 0.5]));
    assert!(!model.predict(&[0.1, 0.5]));
    let p = model.predict_proba(&[0.95, 0.1]);
    assert!((0.0..=1.0).contains(&p));

    let importances = model.feature_importances();
    assert_eq!(importances.len(), 2);
    assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    assert!(importances[0] > importances[1]);
}

#[test]
fn out_of_range_hyperparameters_are_rejected() {
    let (x, y) = threshold_data(50);
    let bad_depth = ForestParams {
        max_depth: 11,
        ..ForestParams::default()
    };
    assert!(matches!(
        RandomForest::fit(&x, &y, &bad_depth),
        Err(PipelineError::InvalidHyperparameter {
            name: "max_depth",
            ..
        })
    ));
    let few_trees = ForestParams {
        n_estimators: 5,
        ..ForestParams::default()
    };
    assert!(matches!(
        RandomForest::fit(&x, &y, &few_trees),
        Err(PipelineError::InvalidHyperparameter {
            name: "n_estimators",
            ..
        })
    ));
}

#[test]
fn single_class_labels_cannot_be_fit() {
    let x = vec![vec![0.0], vec![1.0], vec![2.0]];
    assert_eq!(
        RandomForest::fit(&x, &[true, true, true], &quick_params()).unwrap_err(),
        PipelineError::DegenerateLabels
    );
    assert_eq!(
        RandomForest::fit(&[], &[], &quick_params()).unwrap_err(),
        PipelineError::EmptyTrainingSet
    );
}

#[test]
fn stratified_split_keeps_the_class_ratio() {
    let labels: Vec<bool> = (0..100).map(|i| i % 4 == 0).collect();
    let split = stratified_split(&labels, TEST_FRACTION, SPLIT_SEED);
    assert_eq!(split.test.len(), 20);
    assert_eq!(split.train.len(), 80);
    let test_wins = split.test.iter().filter(|i| labels[**i]).count();
    assert_eq!(test_wins, 5);

    let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
    all.sort_unstable();
    assert_eq!(all, (0..100).collect::<Vec<_>>());
    assert_eq!(split, stratified_split(&labels, TEST_FRACTION, SPLIT_SEED));
}

#[test]
fn metrics_from_known_predictions() {
    let probs = [0.9, 0.8, 0.3, 0.6, 0.2];
    let actual = [true, true, false, false, true];
    let m = evaluate(&probs, &actual);
    assert_eq!(
        m.confusion,
        ConfusionMatrix {
            true_positive: 2,
            false_positive: 1,
            true_negative: 1,
            false_negative: 1,
        }
    );
    assert_eq!(m.samples, 5);
    assert!((m.accuracy - 0.6).abs() < 1e-12);
    assert!((m.precision - 2.0 / 3.0).abs() < 1e-12);
    assert!((m.recall - 2.0 / 3.0).abs() < 1e-12);
    assert!((m.f1 - 2.0 / 3.0).abs() < 1e-12);
    // Positives rank 5, 4, 1 among five scores.
    assert!((m.auc.unwrap() - 4.0 / 6.0).abs() < 1e-12);
    let brier = (0.01 + 0.04 + 0.09 + 0.36 + 0.64) / 5.0;
    assert!((m.brier - brier).abs() < 1e-12);
    assert_eq!(m.calibration.iter().map(|b| b.count).sum::<usize>(), 5);

    assert_eq!(roc_auc(&[0.4, 0.6], &[true, true]), None);
}

#[test]
fn importances_are_named_and_ranked() {
    let raw = [0.05, 0.3, 0.0, 0.1, 0.2, 0.05, 0.05, 0.2, 0.05];
    let ranked = ranked_importances(&raw);
    assert_eq!(ranked.len(), MODEL_FEATURES.len());
    assert_eq!(ranked[0].feature, MODEL_FEATURES[1]);
    assert!(ranked.windows(2).all(|w| w[0].importance >= w[1].importance));
}

fn trained() -> (TeamAnalysis, ModelReport) {
    let analysis =
        TeamAnalysis::build(&common::datasets(60), "NSH", JoinPolicy::DropUnmatched).unwrap();
    let report = ModelReport::train(&analysis, &quick_params()).unwrap();
    (analysis, report)
}

#[test]
fn team_model_trains_and_reports() {
    let (analysis, report) = trained();
    assert_eq!(
        report.train_size + report.test_size,
        analysis.table.records.len()
    );
    assert_eq!(report.metrics.samples, report.test_size);
    let auc = report.metrics.auc.unwrap();
    assert!((0.0..=1.0).contains(&auc));
    assert_eq!(report.importances.len(), MODEL_FEATURES.len());

    let json = report.summary_json().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["team"], "NSH");
    assert_eq!(parsed["params"]["n_estimators"], 30);
}

#[test]
fn ranking_scores_every_faceoff_taker() {
    let (analysis, report) = trained();
    let situation = Situation {
        home: true,
        opponent: "DAL".to_string(),
        players_diff: 0,
        seconds_elapsed_game: 600,
        zone_offense: true,
        zone_defense: false,
        score_team: 1,
        score_diff: 0,
    };
    let ranking = report.rank(&analysis, &situation).unwrap();
    assert_eq!(ranking.chances.len(), analysis.table.player_rates.len());
    assert_eq!(
        Some(ranking.opponent_win_rate),
        analysis.team_rates.win_rate("DAL")
    );
    assert!(
        ranking
            .chances
            .windows(2)
            .all(|w| w[0].chance_to_win >= w[1].chance_to_win)
    );
    let top = ranking.chances[0].chance_to_win;
    let tied: Vec<u32> = ranking
        .chances
        .iter()
        .filter(|c| c.chance_to_win == top)
        .map(|c| c.player_id)
        .collect();
    assert_eq!(ranking.best, tied);
}

#[test]
fn invalid_situations_are_rejected() {
    let (analysis, report) = trained();
    let base = Situation {
        opponent: "DAL".to_string(),
        ..Situation::default()
    };

    let too_many = Situation {
        players_diff: 3,
        ..base.clone()
    };
    assert!(matches!(
        report.rank(&analysis, &too_many),
        Err(PipelineError::InvalidSituation {
            field: "players_diff",
            ..
        })
    ));

    let late = Situation {
        seconds_elapsed_game: 4000,
        ..base.clone()
    };
    assert!(report.rank(&analysis, &late).is_err());

    let unknown = Situation {
        opponent: "XYZ".to_string(),
        ..base
    };
    assert_eq!(
        report.rank(&analysis, &unknown).unwrap_err(),
        PipelineError::UnknownTeamCode {
            code: "XYZ".to_string()
        }
    );
}

#[test]
fn players_without_attributes_are_not_ranked() {
    let mut data = common::datasets(60);
    data.players.retain(|p| p.player_id != 1003);
    let analysis = TeamAnalysis::build(&data, "NSH", JoinPolicy::DropUnmatched).unwrap();
    assert!(analysis.table.dropped > 0);
    assert!(!analysis.table.player_rates.contains_key(&1003));
    assert!(
        analysis
            .table
            .records
            .iter()
            .all(|r| r.faceoff.playerid_team != 1003)
    );

    let report = ModelReport::train(&analysis, &quick_params()).unwrap();
    let situation = Situation {
        opponent: "DAL".to_string(),
        ..Situation::default()
    };
    let ranking = report.rank(&analysis, &situation).unwrap();
    let ranked: Vec<u32> = ranking.chances.iter().map(|c| c.player_id).collect();
    assert_eq!(ranked.len(), 2);
    assert!(!ranked.contains(&1003));
    assert!(!ranking.best.contains(&1003));
}
