//! Scripted stand-ins for the game and the host timer.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{bail, Result};

use crate::{
    models::{Difficulty, ScoringReading},
    probe::{ProbeFrame, StateProbe},
    timer::RunClock,
};

#[derive(Debug, Clone)]
pub struct ProbeState {
    pub connected: bool,
    /// Every read fails.
    pub failing: bool,
    /// Only the scoreboard value reads fail.
    pub scoring_unreadable: bool,
    /// Only the star skip counter read fails.
    pub star_skips_unreadable: bool,
    pub frame: ProbeFrame,
    pub reading: ScoringReading,
    pub star_skips: u32,
}

impl Default for ProbeState {
    fn default() -> Self {
        Self {
            connected: true,
            failing: false,
            scoring_unreadable: false,
            star_skips_unreadable: false,
            frame: ProbeFrame {
                scene_name: "scene_title".into(),
                is_loading: false,
                scoring_time: 0.0,
            },
            reading: ScoringReading {
                hits: 0,
                parries: 0,
                super_meter: 0,
                coins: 0,
                use_coins_instead_of_super_meter: false,
                difficulty: None,
            },
            star_skips: 0,
        }
    }
}

/// Probe whose state is shared with the test through cheap clones.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProbe {
    state: Arc<Mutex<ProbeState>>,
}

impl ScriptedProbe {
    pub fn update(&self, apply: impl FnOnce(&mut ProbeState)) {
        apply(&mut self.state.lock().unwrap());
    }

    pub fn show(&self, scene: &str, is_loading: bool) {
        self.update(|state| {
            state.frame.scene_name = scene.to_string();
            state.frame.is_loading = is_loading;
        });
    }

    fn read<T>(&self, read: impl FnOnce(&ProbeState) -> T) -> Result<T> {
        let state = self.state.lock().unwrap();
        if state.failing {
            bail!("game memory unreadable");
        }
        Ok(read(&state))
    }

    fn read_scoring(&self, read: impl FnOnce(&ProbeState) -> u32) -> Result<u32> {
        if self.state.lock().unwrap().scoring_unreadable {
            bail!("scoreboard not hooked");
        }
        self.read(read)
    }
}

impl StateProbe for ScriptedProbe {
    fn connected(&mut self) -> bool {
        self.state.lock().unwrap().connected
    }

    fn poll(&mut self) -> Result<ProbeFrame> {
        self.read(|state| state.frame.clone())
    }

    fn scoring_hits(&mut self) -> Result<u32> {
        self.read_scoring(|state| state.reading.hits)
    }

    fn scoring_parries(&mut self) -> Result<u32> {
        self.read_scoring(|state| state.reading.parries)
    }

    fn scoring_super_meter(&mut self) -> Result<u32> {
        self.read_scoring(|state| state.reading.super_meter)
    }

    fn scoring_coins(&mut self) -> Result<u32> {
        self.read_scoring(|state| state.reading.coins)
    }

    fn use_coins_instead_of_super_meter(&mut self) -> Result<bool> {
        self.read(|state| state.reading.use_coins_instead_of_super_meter)
    }

    fn difficulty(&mut self) -> Result<Option<Difficulty>> {
        self.read(|state| state.reading.difficulty)
    }

    fn star_skip_counter(&mut self) -> Result<u32> {
        if self.state.lock().unwrap().star_skips_unreadable {
            bail!("star skip counter not exposed");
        }
        self.read(|state| state.star_skips)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClockState {
    pub game_time: Option<Duration>,
    pub final_split_reached: bool,
    pub attempt_index: Option<u32>,
    pub run_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    state: Arc<Mutex<ClockState>>,
}

impl ManualClock {
    pub fn update(&self, apply: impl FnOnce(&mut ClockState)) {
        apply(&mut self.state.lock().unwrap());
    }

    pub fn set_game_time(&self, millis: u64) {
        self.update(|state| state.game_time = Some(Duration::from_millis(millis)));
    }
}

impl RunClock for ManualClock {
    fn current_game_time(&self) -> Option<Duration> {
        self.state.lock().unwrap().game_time
    }

    fn final_split_reached(&self) -> bool {
        self.state.lock().unwrap().final_split_reached
    }

    fn attempt_index(&self) -> Option<u32> {
        self.state.lock().unwrap().attempt_index
    }

    fn run_file(&self) -> Option<PathBuf> {
        self.state.lock().unwrap().run_file.clone()
    }
}
