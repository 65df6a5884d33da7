mod common;

use faceoff_terminal::error::InputError;
use faceoff_terminal::features::JoinPolicy;
use faceoff_terminal::filters::{LocationFilter, StrengthFilter};
use faceoff_terminal::forest::ForestParams;
use faceoff_terminal::session::TeamAnalysis;
use faceoff_terminal::state::{AppState, ModelField, Screen};
use faceoff_terminal::summary::Dimension;

fn loaded(team: &str) -> AppState {
    let data = common::datasets(36);
    let teams = data.team_codes.distinct_codes();
    let mut state = AppState::new(teams, team);
    state.set_analysis(TeamAnalysis::build(&data, team, JoinPolicy::DropUnmatched).unwrap());
    state
}

fn focus(state: &mut AppState, field: ModelField) {
    state.screen = Screen::Model;
    state.field_cursor = ModelField::ALL
        .iter()
        .position(|f| *f == field)
        .unwrap_or(0);
}

#[test]
fn loading_a_team_builds_the_view() {
    let state = loaded("NSH");
    let view = state.view.as_ref().unwrap();
    assert_eq!(view.matched, state.analysis.as_ref().unwrap().table.records.len());
    assert_eq!(state.ctx.situation.opponent, "DAL");
    assert!(state.logs.back().unwrap().starts_with("[INFO] NSH loaded"));
    assert_eq!(state.detail_error(), Some(InputError::NoPlayerSelected));
}

#[test]
fn team_cycling_wraps_in_file_order() {
    let state = loaded("NSH");
    assert_eq!(state.next_team().as_deref(), Some("DAL"));
    assert_eq!(state.prev_team().as_deref(), Some("STL"));
}

#[test]
fn filter_keys_narrow_and_reset() {
    let mut state = loaded("NSH");
    let all = state.view.as_ref().unwrap().matched;

    state.cycle_location();
    assert_eq!(state.ctx.filter.location, LocationFilter::Home);
    let home = state.view.as_ref().unwrap().matched;
    assert!(home < all && home > 0);

    state.cycle_strength();
    assert_eq!(state.ctx.filter.strength, StrengthFilter::EvenStrength);

    state.cycle_opponent();
    assert_eq!(state.ctx.filter.opponents.len(), 1);
    assert_eq!(state.ctx.filter.opponents.iter().next().unwrap(), "CHI");

    state.cycle_period();
    state.cycle_period();
    assert_eq!(state.ctx.filter.periods.as_ref().unwrap().len(), 1);
    assert!(state.ctx.filter.periods.as_ref().unwrap().contains(&2));

    state.reset_filters();
    assert!(state.ctx.filter.is_unfiltered());
    assert_eq!(state.view.as_ref().unwrap().matched, all);
    assert_eq!(state.logs.back().map(String::as_str), Some("[INFO] Filters reset"));
}

#[test]
fn season_filter_cycles_through_observed_seasons() {
    let mut state = loaded("NSH");
    state.cycle_season();
    assert!(state.ctx.filter.seasons.as_ref().unwrap().contains(&20212022));
    state.cycle_season();
    assert!(state.ctx.filter.seasons.as_ref().unwrap().contains(&20222023));
    state.cycle_season();
    assert_eq!(state.ctx.filter.seasons, None);
}

#[test]
fn removing_every_dimension_reports_inline() {
    let mut state = loaded("NSH");
    state.dimension_cursor = 0;
    state.toggle_dimension();
    assert!(state.ctx.dimensions.is_empty());
    assert_eq!(
        state.view.as_ref().unwrap().dimensions,
        Err(InputError::NoDimensionsSelected)
    );

    state.dimension_next();
    state.toggle_dimension();
    assert_eq!(state.ctx.dimensions, vec![Dimension::Season]);
    assert!(state.view.as_ref().unwrap().dimensions.is_ok());
}

#[test]
fn marking_players_drives_the_detail_panel() {
    let mut state = loaded("NSH");
    state.screen = Screen::Players;
    state.toggle_player_mark();
    assert_eq!(state.detail_error(), None);
    let first = state.cursor_player().unwrap();
    assert_eq!(state.ctx.selected_players, vec![first]);

    state.select_next();
    state.toggle_player_mark();
    assert_eq!(
        state.detail_error(),
        Some(InputError::MultiplePlayersSelected { count: 2 })
    );

    state.select_prev();
    state.toggle_player_mark();
    assert_eq!(state.ctx.selected_players.len(), 1);
    assert_eq!(state.detail_error(), None);
}

#[test]
fn switching_team_clears_model_and_selection() {
    let mut state = loaded("NSH");
    state.screen = Screen::Players;
    state.toggle_player_mark();
    let data = common::datasets(36);
    state.set_analysis(TeamAnalysis::build(&data, "DAL", JoinPolicy::DropUnmatched).unwrap());
    assert_eq!(state.ctx.team, "DAL");
    assert!(state.ctx.selected_players.is_empty());
    assert!(state.model.is_none());
    assert_eq!(state.ctx.situation.opponent, "NSH");
}

#[test]
fn model_fields_stay_in_range() {
    let mut state = loaded("NSH");
    focus(&mut state, ModelField::MaxDepth);
    for _ in 0..20 {
        state.adjust_field(1);
    }
    assert_eq!(state.ctx.params.max_depth, ForestParams::MAX_DEPTH_RANGE.1);

    focus(&mut state, ModelField::PlayersDiff);
    for _ in 0..5 {
        state.adjust_field(-1);
    }
    assert_eq!(state.ctx.situation.players_diff, -2);

    focus(&mut state, ModelField::MinSamplesLeaf);
    state.adjust_field(-10);
    assert_eq!(state.ctx.params.min_samples_leaf, 0.0);

    focus(&mut state, ModelField::Opponent);
    state.adjust_field(1);
    assert_eq!(state.ctx.situation.opponent, "CHI");
    state.adjust_field(-2);
    assert_eq!(state.ctx.situation.opponent, "STL");

    focus(&mut state, ModelField::SecondsElapsed);
    state.adjust_field(-1);
    assert_eq!(state.ctx.situation.seconds_elapsed_game, 0);
    assert!(state.ctx.params.validate().is_ok());
}

#[test]
fn training_from_state_ranks_the_situation() {
    let mut state = loaded("NSH");
    focus(&mut state, ModelField::NEstimators);
    for _ in 0..20 {
        state.adjust_field(-1);
    }
    assert_eq!(state.ctx.params.n_estimators, ForestParams::N_ESTIMATORS_RANGE.0);

    state.train();
    assert!(state.model.is_some());
    let ranking = state.ranking.as_ref().unwrap();
    assert_eq!(ranking.chances.len(), 3);
    assert!(state.logs.iter().any(|l| l.starts_with("[INFO] Model trained")));

    focus(&mut state, ModelField::Home);
    state.adjust_field(1);
    assert!(state.ctx.situation.home);
    assert!(state.ranking.is_some());
}
