use thiserror::Error;

/// Failures that abort the current pipeline run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("team name {name:?} has no entry in the team code table")]
    UnresolvableTeam { name: String },

    #[error("malformed time {value:?} (expected MM:SS)")]
    MalformedTime { value: String },

    #[error("malformed {field} value {value:?}")]
    MalformedField { field: &'static str, value: String },

    #[error("table {table:?} is missing required column {column:?}")]
    MissingColumn { table: String, column: &'static str },

    #[error("player {player_id} has no entry in the player table")]
    UnmatchedPlayer { player_id: u32 },

    #[error("no observed values for {field}; cannot impute")]
    NoObservedValues { field: &'static str },

    #[error("unknown team code {code:?}")]
    UnknownTeamCode { code: String },

    #[error("hyperparameter {name} out of range: {value}")]
    InvalidHyperparameter { name: &'static str, value: String },

    #[error("situation field {field} out of range: {value}")]
    InvalidSituation { field: &'static str, value: String },

    #[error("training data holds a single class; cannot fit a classifier")]
    DegenerateLabels,

    #[error("no rows available for training")]
    EmptyTrainingSet,
}

/// Selection mistakes that are reported inline and leave the render intact.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    #[error("No player selected")]
    NoPlayerSelected,

    #[error("Please only select a single player ({count} selected)")]
    MultiplePlayersSelected { count: usize },

    #[error("Please select at least one dimension to display the summary table")]
    NoDimensionsSelected,
}
