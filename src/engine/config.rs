/// Scene identifier of the post-level scoreboard.
pub const SCOREBOARD_SCENE: &str = "scene_win";

/// Scene identifiers of playable levels share this prefix.
pub const LEVEL_SCENE_PREFIX: &str = "scene_level";

/// Tunables for scene transition detection.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Scenes that are phases of a larger fight (King Dice's mini bosses).
    /// Empty disables phase detection. The scoreboard rules are checked
    /// first, so this never shadows [`SCOREBOARD_SCENE`].
    pub sub_boss_scene_prefix: String,

    /// A sub-boss load only counts as a phase boundary when the scoring timer
    /// is past this, so a single stale frame reading ~0 is not mistaken for one.
    pub sub_phase_min_scoring_time: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sub_boss_scene_prefix: "scene_level_dice_palace_".into(),
            sub_phase_min_scoring_time: 0.2,
        }
    }
}
