pub mod config;
pub mod scoreboard;
pub mod transition;

pub use config::EngineConfig;
pub use scoreboard::{ScoreboardAggregator, ScoreboardSnapshot};
pub use transition::{SceneTransitionEngine, Transition};
