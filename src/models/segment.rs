use serde::{Deserialize, Serialize};

use super::scoring::Difficulty;

/// Name every scoreboard segment is recorded under.
pub const SCOREBOARD_SEGMENT_NAME: &str = "win";

const SCENE_PREFIX: &str = "scene_";

/// One recorded slice of an attempt.
///
/// All variants share a single flat JSON shape on disk; the variant is
/// recovered from the fields present when the document is read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SegmentRecord", into = "SegmentRecord")]
pub enum Segment {
    Level(LevelSegment),
    Scoreboard(ScoreboardSegment),
    Generic(GenericSegment),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelSegment {
    pub name: String,
    /// In-game scoring time in seconds, truncated to hundredths.
    pub level_time: f64,
    pub end_time: String,
}

/// Scoreboard values for one cleared level. `None` fields were zero and are
/// left out of the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreboardSegment {
    pub hp: Option<u32>,
    pub parries: Option<u32>,
    pub super_meter: Option<u32>,
    pub coins: Option<u32>,
    pub star_skips: Option<u32>,
    pub difficulty: Option<Difficulty>,
    pub end_time: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenericSegment {
    pub name: String,
    pub end_time: String,
}

impl Segment {
    pub fn level(scene_name: &str, scoring_time: f32, end_time: String) -> Self {
        Segment::Level(LevelSegment {
            name: display_name(scene_name).to_string(),
            level_time: truncate_scoring_time(scoring_time),
            end_time,
        })
    }

    pub fn generic(scene_name: &str, end_time: String) -> Self {
        Segment::Generic(GenericSegment {
            name: display_name(scene_name).to_string(),
            end_time,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Segment::Level(level) => &level.name,
            Segment::Scoreboard(_) => SCOREBOARD_SEGMENT_NAME,
            Segment::Generic(generic) => &generic.name,
        }
    }

    pub fn end_time(&self) -> &str {
        match self {
            Segment::Level(level) => &level.end_time,
            Segment::Scoreboard(scoreboard) => &scoreboard.end_time,
            Segment::Generic(generic) => &generic.end_time,
        }
    }
}

/// Strips the engine's `scene_` prefix from a scene identifier.
pub fn display_name(scene_name: &str) -> &str {
    scene_name.strip_prefix(SCENE_PREFIX).unwrap_or(scene_name)
}

/// Truncates (never rounds) a number of seconds to two decimals.
///
/// Float noise below a ten-thousandth of a hundredth is cleared first so that
/// `12.29` does not come out as `12.28`.
pub fn truncate_hundredths(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let hundredths = (value * 100.0 * 10_000.0).round() / 10_000.0;
    hundredths.trunc() / 100.0
}

/// Truncates the game's single precision scoring time to two decimals.
///
/// The truncation happens in `f32` like the game's own scoreboard, so the
/// stored value matches what the player saw.
pub fn truncate_scoring_time(seconds: f32) -> f64 {
    if !seconds.is_finite() {
        return 0.0;
    }
    f64::from((seconds * 100.0).trunc()) / 100.0
}

/// Flat on-disk form shared by every segment variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SegmentRecord {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    level_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hp: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    super_meter: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    coins: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    star_skips: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    difficulty: Option<Difficulty>,
    end_time: String,
}

impl From<SegmentRecord> for Segment {
    fn from(record: SegmentRecord) -> Self {
        if record.name == SCOREBOARD_SEGMENT_NAME {
            return Segment::Scoreboard(ScoreboardSegment {
                hp: record.hp,
                parries: record.parries,
                super_meter: record.super_meter,
                coins: record.coins,
                star_skips: record.star_skips,
                difficulty: record.difficulty,
                end_time: record.end_time,
            });
        }

        match record.level_time {
            Some(level_time) => Segment::Level(LevelSegment {
                name: record.name,
                level_time,
                end_time: record.end_time,
            }),
            None => Segment::Generic(GenericSegment {
                name: record.name,
                end_time: record.end_time,
            }),
        }
    }
}

impl From<Segment> for SegmentRecord {
    fn from(segment: Segment) -> Self {
        let empty = |name: String, end_time: String| SegmentRecord {
            name,
            level_time: None,
            hp: None,
            parries: None,
            super_meter: None,
            coins: None,
            star_skips: None,
            difficulty: None,
            end_time,
        };

        match segment {
            Segment::Level(level) => SegmentRecord {
                level_time: Some(level.level_time),
                ..empty(level.name, level.end_time)
            },
            Segment::Scoreboard(scoreboard) => SegmentRecord {
                hp: scoreboard.hp,
                parries: scoreboard.parries,
                super_meter: scoreboard.super_meter,
                coins: scoreboard.coins,
                star_skips: scoreboard.star_skips,
                difficulty: scoreboard.difficulty,
                ..empty(SCOREBOARD_SEGMENT_NAME.to_string(), scoreboard.end_time)
            },
            Segment::Generic(generic) => empty(generic.name, generic.end_time),
        }
    }
}
