//! Boundary to the running game.
//!
//! How values are read (process memory, a mod, a replay file) is up to the
//! host; the recorder only sees this trait.

use anyhow::Result;

use crate::models::{Difficulty, ScoringReading};

/// The values read on every poll tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeFrame {
    pub scene_name: String,
    pub is_loading: bool,
    /// In-level timer shown on the scoreboard, in seconds.
    pub scoring_time: f32,
}

/// Live game state source. Every read may fail while the game is starting,
/// closing or between hooks; failures skip the tick.
pub trait StateProbe: Send {
    /// Whether the game is attached. No tick runs while this is false.
    fn connected(&mut self) -> bool;

    fn poll(&mut self) -> Result<ProbeFrame>;

    fn scoring_hits(&mut self) -> Result<u32>;
    fn scoring_parries(&mut self) -> Result<u32>;
    fn scoring_super_meter(&mut self) -> Result<u32>;
    fn scoring_coins(&mut self) -> Result<u32>;
    fn use_coins_instead_of_super_meter(&mut self) -> Result<bool>;
    fn difficulty(&mut self) -> Result<Option<Difficulty>>;

    /// Monotonic count of star skips. Games without one report zero.
    fn star_skip_counter(&mut self) -> Result<u32> {
        Ok(0)
    }

    /// Reads every scoreboard value at once.
    fn scoring(&mut self) -> Result<ScoringReading> {
        Ok(ScoringReading {
            hits: self.scoring_hits()?,
            parries: self.scoring_parries()?,
            super_meter: self.scoring_super_meter()?,
            coins: self.scoring_coins()?,
            use_coins_instead_of_super_meter: self.use_coins_instead_of_super_meter()?,
            difficulty: self.difficulty()?,
        })
    }
}
