use crate::models::{Difficulty, ScoreboardSegment, ScoringReading, Segment};

/// Maximum HP bonus shown on the scoreboard.
const MAX_HP_BONUS: u32 = 3;

/// Scoreboard values captured when the scoreboard scene loads, waiting to be
/// written out when the player leaves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreboardSnapshot {
    pub level: String,
    pub hp: u32,
    pub parries: u32,
    pub super_meter: u32,
    pub coins: u32,
    pub use_coins_instead_of_super_meter: bool,
    pub difficulty: Option<Difficulty>,
}

impl Default for ScoreboardSnapshot {
    fn default() -> Self {
        Self {
            level: String::new(),
            hp: MAX_HP_BONUS,
            parries: 0,
            super_meter: 0,
            coins: 0,
            use_coins_instead_of_super_meter: false,
            difficulty: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScoreboardAggregator {
    snapshot: ScoreboardSnapshot,
    /// Last difficulty seen in this attempt; survives snapshot resets.
    known_difficulty: Option<Difficulty>,
    /// Star skip counter value at the last finalized scoreboard, unknown
    /// until the game could first be read.
    star_skip_baseline: Option<u32>,
}

pub fn hp_bonus(hits: u32) -> u32 {
    MAX_HP_BONUS.saturating_sub(hits)
}

impl ScoreboardAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot_state(&self) -> &ScoreboardSnapshot {
        &self.snapshot
    }

    /// Clears everything carried from a previous attempt and seeds the star
    /// skip baseline from the game's current counter, when it could be read.
    pub fn begin_attempt(&mut self, star_skip_counter: Option<u32>) {
        self.snapshot = ScoreboardSnapshot::default();
        self.known_difficulty = None;
        self.star_skip_baseline = star_skip_counter;
    }

    /// Captures the scoreboard of `level_scene` as it starts loading.
    pub fn snapshot(&mut self, level_scene: &str, reading: &ScoringReading) {
        if reading.difficulty.is_some() {
            self.known_difficulty = reading.difficulty;
        }

        self.snapshot = ScoreboardSnapshot {
            level: level_scene.to_string(),
            hp: hp_bonus(reading.hits),
            parries: reading.parries,
            super_meter: reading.super_meter,
            coins: reading.coins,
            use_coins_instead_of_super_meter: reading.use_coins_instead_of_super_meter,
            difficulty: self.known_difficulty,
        };
    }

    /// Captures a scoreboard whose values could not be read. Only the level
    /// and the attempt's known difficulty are kept; every counter is omitted.
    pub fn snapshot_unread(&mut self, level_scene: &str) {
        self.snapshot = ScoreboardSnapshot {
            level: level_scene.to_string(),
            hp: 0,
            difficulty: self.known_difficulty,
            ..ScoreboardSnapshot::default()
        };
    }

    /// Turns the pending snapshot into a scoreboard segment and resets it.
    ///
    /// Only non-zero values are kept. Of super meter and coins, only the one
    /// the level actually scores is considered. Without a counter reading no
    /// star skips are recorded and the baseline is left alone.
    pub fn finalize(&mut self, star_skip_counter: Option<u32>, end_time: String) -> Segment {
        let snapshot = std::mem::take(&mut self.snapshot);

        let star_skips = match (star_skip_counter, self.star_skip_baseline) {
            (Some(counter), Some(baseline)) => counter.saturating_sub(baseline),
            _ => 0,
        };
        if star_skip_counter.is_some() {
            self.star_skip_baseline = star_skip_counter;
        }

        let (super_meter, coins) = if snapshot.use_coins_instead_of_super_meter {
            (None, non_zero(snapshot.coins))
        } else {
            (non_zero(snapshot.super_meter), None)
        };

        Segment::Scoreboard(ScoreboardSegment {
            hp: non_zero(snapshot.hp),
            parries: non_zero(snapshot.parries),
            super_meter,
            coins,
            star_skips: non_zero(star_skips),
            difficulty: snapshot.difficulty,
            end_time,
        })
    }
}

fn non_zero(value: u32) -> Option<u32> {
    (value != 0).then_some(value)
}
