pub mod attempt;
pub mod scoring;
pub mod segment;

pub use attempt::{Attempt, RecapDocument};
pub use scoring::{Difficulty, ScoringReading};
pub use segment::{GenericSegment, LevelSegment, ScoreboardSegment, Segment};
