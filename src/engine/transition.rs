use crate::probe::ProbeFrame;

use super::config::{EngineConfig, SCOREBOARD_SCENE};

/// What a loading span closed. Carried scene names are raw identifiers
/// (`scene_level_veggies`), not display names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The scoreboard is loading: the level that was just cleared closes.
    ScoreboardEntered { level_scene: String },
    /// Leaving the scoreboard: its stats close as one segment.
    ScoreboardExited,
    /// A multi-phase fight moved to its next phase mid-fight.
    SubPhase { scene: String },
    /// Any other scene change.
    SceneChanged { scene: String },
}

/// Infers segment boundaries from the polled loading flag and scene name.
///
/// The game never reports "level finished"; a boundary is any span of ticks
/// where loading is true. `saved_scene_data` latches once a span has produced
/// its segment and is only re-armed by a non-loading tick, so a span yields at
/// most one transition no matter how many ticks it lasts.
///
/// Deciding and committing are separate steps: the caller acts on
/// [`decide`](Self::decide) and only then calls [`commit`](Self::commit), so a
/// tick that fails halfway leaves the engine as it was and is retried.
#[derive(Debug, Clone)]
pub struct SceneTransitionEngine {
    config: EngineConfig,
    previous_scene: Option<String>,
    /// `previous_scene` was first learned inside the loading span still in
    /// progress, so it only closes once that span reports another scene.
    previous_from_this_span: bool,
    saved_scene_data: bool,
}

impl SceneTransitionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            previous_scene: None,
            previous_from_this_span: false,
            saved_scene_data: true,
        }
    }

    /// Forgets the previous scene and waits for the current loading span, if
    /// any, to end before closing anything.
    pub fn reset(&mut self) {
        self.previous_scene = None;
        self.previous_from_this_span = false;
        self.saved_scene_data = true;
    }

    pub fn previous_scene(&self) -> Option<&str> {
        self.previous_scene.as_deref()
    }

    pub fn saved_scene_data(&self) -> bool {
        self.saved_scene_data
    }

    pub fn decide(&self, frame: &ProbeFrame) -> Option<Transition> {
        if !frame.is_loading || self.saved_scene_data {
            return None;
        }
        let previous = self.previous_scene.as_deref()?;
        if self.previous_from_this_span && previous == frame.scene_name {
            return None;
        }

        let transition = if frame.scene_name == SCOREBOARD_SCENE {
            Transition::ScoreboardEntered {
                level_scene: previous.to_string(),
            }
        } else if previous == SCOREBOARD_SCENE {
            Transition::ScoreboardExited
        } else if self.is_sub_phase(frame) {
            Transition::SubPhase {
                scene: previous.to_string(),
            }
        } else {
            Transition::SceneChanged {
                scene: previous.to_string(),
            }
        };
        Some(transition)
    }

    /// Advances the edge detector past `frame`. `fired` is whether the
    /// transition returned by `decide` for this frame was recorded.
    pub fn commit(&mut self, frame: &ProbeFrame, fired: bool) {
        if frame.is_loading {
            if fired {
                self.saved_scene_data = true;
            }
            if self.previous_scene.is_none() {
                self.previous_from_this_span = true;
            }
            self.previous_scene = Some(frame.scene_name.clone());
        } else {
            self.saved_scene_data = false;
            self.previous_from_this_span = false;
        }
    }

    fn is_sub_phase(&self, frame: &ProbeFrame) -> bool {
        let prefix = self.config.sub_boss_scene_prefix.as_str();
        !prefix.is_empty()
            && frame.scene_name.starts_with(prefix)
            && frame.scoring_time > self.config.sub_phase_min_scoring_time
    }
}

impl Default for SceneTransitionEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
