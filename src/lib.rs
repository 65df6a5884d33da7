pub mod config;
pub mod error;
pub mod evaluation;
pub mod export;
pub mod features;
pub mod filters;
pub mod forest;
pub mod loader;
pub mod normalize;
pub mod players;
pub mod predict;
pub mod session;
pub mod sheet;
pub mod state;
pub mod summary;
pub mod team_codes;
