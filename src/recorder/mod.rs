pub mod controller;
pub mod loop_worker;

pub use controller::RecorderController;

use anyhow::{Context, Result};

use crate::{
    engine::{
        config::LEVEL_SCENE_PREFIX, SceneTransitionEngine, ScoreboardAggregator, Transition,
    },
    models::Segment,
    probe::{ProbeFrame, StateProbe},
    settings::RecapSettings,
    store::RecapStore,
    timer::{format_game_time, RunClock, TimerEvent},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Ties the transition engine, the scoreboard aggregator and the recap store
/// to one game probe and one host timer.
///
/// A recorder is owned by a single thread; timer events and poll ticks are
/// applied one after the other, so an attempt is always fully created and
/// persisted before the next tick can append to it.
pub struct Recorder<P, C> {
    probe: P,
    clock: C,
    settings: RecapSettings,
    engine: SceneTransitionEngine,
    scoreboard: ScoreboardAggregator,
    store: Option<RecapStore>,
    run_in_progress: bool,
    /// Transition whose game reads failed, retried until its loading span ends.
    unread: Option<(Transition, ProbeFrame)>,
}

impl<P: StateProbe, C: RunClock> Recorder<P, C> {
    pub fn new(probe: P, clock: C, settings: RecapSettings) -> Self {
        Self {
            probe,
            clock,
            engine: SceneTransitionEngine::new(settings.engine_config()),
            settings,
            scoreboard: ScoreboardAggregator::new(),
            store: None,
            run_in_progress: false,
            unread: None,
        }
    }

    pub fn is_run_in_progress(&self) -> bool {
        self.run_in_progress
    }

    pub fn store(&self) -> Option<&RecapStore> {
        self.store.as_ref()
    }

    pub fn engine(&self) -> &SceneTransitionEngine {
        &self.engine
    }

    pub fn scoreboard(&self) -> &ScoreboardAggregator {
        &self.scoreboard
    }

    pub fn settings(&self) -> &RecapSettings {
        &self.settings
    }

    /// New settings apply from the next `Start` on; the running attempt keeps
    /// its file and scene rules.
    pub fn set_settings(&mut self, settings: RecapSettings) {
        self.settings = settings;
    }

    pub fn handle_event(&mut self, event: TimerEvent) -> Result<()> {
        match event {
            TimerEvent::Start => self.start_attempt(),
            TimerEvent::Reset => {
                log_info!("Run reset");
                self.run_in_progress = false;
                self.engine.reset();
                self.unread = None;
                Ok(())
            }
            TimerEvent::Split => {
                if self.run_in_progress && self.clock.final_split_reached() {
                    self.finish_run()
                } else {
                    Ok(())
                }
            }
            TimerEvent::Pause
            | TimerEvent::Resume
            | TimerEvent::UndoSplit
            | TimerEvent::SkipSplit => {
                log_debug!("Ignoring timer event {}", event.as_str());
                Ok(())
            }
        }
    }

    /// Runs one poll of the game. Does nothing unless a run is in progress
    /// and the game is attached.
    ///
    /// A failed read returns the error before anything is recorded or the
    /// engine advances, so the same transition is attempted again next tick.
    /// If the loading span ends while the reads still fail, the transition is
    /// recorded with what is known and the engine moves past it.
    pub fn tick(&mut self) -> Result<()> {
        if !self.run_in_progress || !self.probe.connected() {
            return Ok(());
        }

        let frame = self.probe.poll().context("failed to poll game state")?;

        if !frame.is_loading {
            if let Some((transition, span_frame)) = self.unread.take() {
                log_warn!("Loading span ended before {transition:?} could be read");
                self.apply_unread(&transition, &span_frame);
                self.engine.commit(&span_frame, true);
            }
        }

        let transition = self.engine.decide(&frame);
        if let Some(transition) = &transition {
            if let Err(err) = self.apply(transition, &frame) {
                self.unread = Some((transition.clone(), frame));
                return Err(err);
            }
            self.unread = None;
        }
        self.engine.commit(&frame, transition.is_some());
        Ok(())
    }

    fn start_attempt(&mut self) -> Result<()> {
        log_info!("Starting attempt");

        let path = self
            .settings
            .recap_path(self.clock.run_file().as_deref());
        let mut store = RecapStore::load(path);
        if let Err(err) = store.create_attempt(self.clock.attempt_index()) {
            log_error!("Attempt kept in memory only: {err:?}");
        }
        self.store = Some(store);

        let star_skips = if self.probe.connected() {
            match self.probe.star_skip_counter() {
                Ok(count) => Some(count),
                Err(err) => {
                    log_warn!("Star skip counter unavailable at start: {err:?}");
                    None
                }
            }
        } else {
            None
        };
        self.scoreboard.begin_attempt(star_skips);

        self.engine = SceneTransitionEngine::new(self.settings.engine_config());
        self.unread = None;
        self.run_in_progress = true;
        Ok(())
    }

    /// Records the scene the final split was taken in.
    fn finish_run(&mut self) -> Result<()> {
        self.run_in_progress = false;

        if !self.probe.connected() {
            log_warn!("Final split taken while the game is detached, nothing to record");
            return Ok(());
        }
        let frame = self
            .probe
            .poll()
            .context("failed to read the final scene")?;
        let end_time = self.end_time();

        log_info!("Final split in {}", frame.scene_name);
        let segment = if frame.scene_name.starts_with(LEVEL_SCENE_PREFIX) {
            Segment::level(&frame.scene_name, frame.scoring_time, end_time)
        } else {
            Segment::generic(&frame.scene_name, end_time)
        };
        self.record(segment);
        Ok(())
    }

    fn apply(&mut self, transition: &Transition, frame: &ProbeFrame) -> Result<()> {
        match transition {
            Transition::ScoreboardEntered { level_scene } => {
                let reading = self
                    .probe
                    .scoring()
                    .context("failed to read scoreboard values")?;
                log_info!("Saving level data for {level_scene}");
                let end_time = self.end_time();
                self.record(Segment::level(level_scene, frame.scoring_time, end_time));
                self.scoreboard.snapshot(level_scene, &reading);
            }
            Transition::ScoreboardExited => {
                let star_skips = match self.probe.star_skip_counter() {
                    Ok(counter) => Some(counter),
                    Err(err) => {
                        log_warn!("Star skip counter unreadable, leaving it out: {err:?}");
                        None
                    }
                };
                log_info!(
                    "Saving scoreboard data for {}",
                    self.scoreboard.snapshot_state().level
                );
                let end_time = self.end_time();
                let segment = self.scoreboard.finalize(star_skips, end_time);
                self.record(segment);
            }
            Transition::SubPhase { scene } => {
                log_info!("Saving fight phase data for {scene}");
                let end_time = self.end_time();
                self.record(Segment::level(scene, frame.scoring_time, end_time));
            }
            Transition::SceneChanged { scene } => {
                log_info!("Saving generic scene data for {scene}");
                let end_time = self.end_time();
                self.record(Segment::generic(scene, end_time));
            }
        }
        Ok(())
    }

    /// Records `transition` without the game reads that kept failing.
    fn apply_unread(&mut self, transition: &Transition, frame: &ProbeFrame) {
        match transition {
            Transition::ScoreboardEntered { level_scene } => {
                let end_time = self.end_time();
                self.record(Segment::level(level_scene, frame.scoring_time, end_time));
                self.scoreboard.snapshot_unread(level_scene);
            }
            other => {
                if let Err(err) = self.apply(other, frame) {
                    log_error!("Dropping {other:?}: {err:?}");
                }
            }
        }
    }

    /// Appends to the current attempt. Without one the segment is dropped; a
    /// failed write is only logged since the segment stays in memory.
    fn record(&mut self, segment: Segment) {
        let Some(store) = self.store.as_mut() else {
            return;
        };
        if let Err(err) = store.append_segment(segment) {
            log_error!("Segment kept in memory only: {err:?}");
        }
    }

    fn end_time(&self) -> String {
        format_game_time(self.clock.current_game_time().unwrap_or_default())
    }
}
