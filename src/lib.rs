//! Records Cuphead speedrun attempts into run recap (`.rrc`) files.
//!
//! The host (a timer plugin) hands a [`StateProbe`] over the game and a
//! [`RunClock`] over its own timer to a [`RecorderController`], then forwards
//! every [`TimerEvent`]. Level, scoreboard and in-between segments are written
//! to the recap file as they close.

pub mod engine;
pub mod models;
pub mod probe;
pub mod recorder;
pub mod settings;
pub mod store;
pub mod timer;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use engine::{EngineConfig, SceneTransitionEngine, ScoreboardAggregator, Transition};
pub use models::{
    Attempt, Difficulty, GenericSegment, LevelSegment, RecapDocument, ScoreboardSegment,
    ScoringReading, Segment,
};
pub use probe::{ProbeFrame, StateProbe};
pub use recorder::{Recorder, RecorderController};
pub use settings::{RecapSettings, SettingsStore};
pub use store::{RecapStore, CURRENT_RECAP_VERSION};
pub use timer::{format_game_time, RunClock, TimerEvent};
pub use utils::init_logging;
