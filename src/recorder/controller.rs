use std::{
    sync::mpsc,
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, bail, Context, Result};
use log::{error, info};

use crate::{
    probe::StateProbe,
    settings::RecapSettings,
    timer::{RunClock, TimerEvent},
};

use super::{
    loop_worker::{poll_loop, RecorderCommand},
    Recorder,
};

/// Owns the recorder thread. Timer events are queued to it so they are
/// applied between poll ticks, never during one.
#[derive(Default)]
pub struct RecorderController {
    sender: Option<mpsc::Sender<RecorderCommand>>,
    handle: Option<JoinHandle<()>>,
}

impl RecorderController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Spawns the poll thread. Calling it again while running does nothing.
    pub fn start<P, C>(&mut self, probe: P, clock: C, settings: RecapSettings) -> Result<()>
    where
        P: StateProbe + 'static,
        C: RunClock + 'static,
    {
        if self.is_running() {
            info!("Recorder already running");
            return Ok(());
        }

        let (sender, receiver) = mpsc::channel();
        let recorder = Recorder::new(probe, clock, settings);
        let handle = thread::Builder::new()
            .name("run-recap-poll".into())
            .spawn(move || poll_loop(recorder, receiver))
            .context("failed to spawn recorder thread")?;

        self.sender = Some(sender);
        self.handle = Some(handle);
        info!("Recorder started");
        Ok(())
    }

    /// Queues a host timer event.
    pub fn send(&self, event: TimerEvent) -> Result<()> {
        self.command(RecorderCommand::Timer(event))
            .with_context(|| format!("failed to forward timer event {}", event.as_str()))
    }

    /// The refresh rate changes right away; everything else from the next
    /// `Start` on.
    pub fn update_settings(&self, settings: RecapSettings) -> Result<()> {
        self.command(RecorderCommand::UpdateSettings(settings))
    }

    /// Applies every queued event, then stops the thread and waits for it.
    pub fn stop(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        if let Some(sender) = self.sender.take() {
            // The thread also exits once the sender is dropped.
            let _ = sender.send(RecorderCommand::Shutdown);
        }
        handle
            .join()
            .map_err(|_| anyhow!("recorder thread panicked"))?;
        info!("Recorder stopped");
        Ok(())
    }

    fn command(&self, command: RecorderCommand) -> Result<()> {
        let Some(sender) = &self.sender else {
            bail!("recorder is not running");
        };
        sender
            .send(command)
            .map_err(|_| anyhow!("recorder thread has exited"))
    }
}

impl Drop for RecorderController {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            error!("Failed to stop recorder: {err:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ManualClock, ScriptedProbe};

    fn settings(dir: &tempfile::TempDir) -> RecapSettings {
        RecapSettings {
            recap_directory: Some(dir.path().to_path_buf()),
            refresh_rate_hz: 1000,
            ..RecapSettings::default()
        }
    }

    #[test]
    fn events_sent_before_stop_are_applied() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = RecorderController::new();
        controller
            .start(ScriptedProbe::default(), ManualClock::default(), settings(&dir))
            .unwrap();

        controller.send(TimerEvent::Start).unwrap();
        controller.send(TimerEvent::Reset).unwrap();
        controller.send(TimerEvent::Start).unwrap();
        controller.stop().unwrap();

        let contents = std::fs::read_to_string(dir.path().join("run_recap.rrc")).unwrap();
        let document: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(document["attempts"].as_array().unwrap().len(), 2);
        assert!(!controller.is_running());
    }

    #[test]
    fn start_twice_keeps_one_thread() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = RecorderController::new();
        controller
            .start(ScriptedProbe::default(), ManualClock::default(), settings(&dir))
            .unwrap();
        controller
            .start(ScriptedProbe::default(), ManualClock::default(), settings(&dir))
            .unwrap();

        assert!(controller.is_running());
        controller.stop().unwrap();
        controller.stop().unwrap();
    }

    #[test]
    fn sending_without_a_thread_fails() {
        let controller = RecorderController::new();
        assert!(controller.send(TimerEvent::Start).is_err());
    }

    #[test]
    fn settings_update_reaches_the_next_attempt() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let mut controller = RecorderController::new();
        controller
            .start(ScriptedProbe::default(), ManualClock::default(), settings(&first))
            .unwrap();

        controller.update_settings(settings(&second)).unwrap();
        controller.send(TimerEvent::Start).unwrap();
        controller.stop().unwrap();

        assert!(!first.path().join("run_recap.rrc").exists());
        assert!(second.path().join("run_recap.rrc").exists());
    }
}
