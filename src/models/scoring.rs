use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

/// Scoreboard values read from the game when the post-level scoreboard loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringReading {
    pub hits: u32,
    pub parries: u32,
    pub super_meter: u32,
    pub coins: u32,
    pub use_coins_instead_of_super_meter: bool,
    /// `None` when the game did not expose a difficulty for this level.
    pub difficulty: Option<Difficulty>,
}
