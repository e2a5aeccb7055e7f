use std::{
    ops::ControlFlow,
    sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError},
    time::{Duration, Instant},
};

use crate::{
    probe::StateProbe,
    settings::RecapSettings,
    timer::{RunClock, TimerEvent},
};

use super::Recorder;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

pub(crate) enum RecorderCommand {
    Timer(TimerEvent),
    UpdateSettings(RecapSettings),
    Shutdown,
}

/// Body of the recorder thread: applies queued commands in arrival order,
/// then polls the game once, at the configured refresh rate.
///
/// Returns on `Shutdown` or when every sender is gone. Commands queued ahead
/// of `Shutdown` are still applied.
pub(crate) fn poll_loop<P, C>(mut recorder: Recorder<P, C>, commands: Receiver<RecorderCommand>)
where
    P: StateProbe,
    C: RunClock,
{
    let mut interval = recorder.settings().poll_interval();
    let mut failing_since: Option<Instant> = None;

    log_info!("Recorder loop started, polling every {interval:?}");

    loop {
        let tick_start = Instant::now();

        loop {
            match commands.try_recv() {
                Ok(command) => {
                    if apply_command(&mut recorder, command, &mut interval).is_break() {
                        return;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log_info!("Recorder handle dropped, loop exiting");
                    return;
                }
            }
        }

        match recorder.tick() {
            Ok(()) => {
                if let Some(since) = failing_since.take() {
                    log_info!("Game reads recovered after {:?}", since.elapsed());
                }
            }
            Err(err) if failing_since.is_none() => {
                log_warn!("Poll tick failed, retrying: {err:?}");
                failing_since = Some(Instant::now());
            }
            Err(err) => log_debug!("Poll tick failed again: {err:?}"),
        }

        let remaining = interval.saturating_sub(tick_start.elapsed());
        match commands.recv_timeout(remaining) {
            Ok(command) => {
                if apply_command(&mut recorder, command, &mut interval).is_break() {
                    return;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                log_info!("Recorder handle dropped, loop exiting");
                return;
            }
        }
    }
}

fn apply_command<P, C>(
    recorder: &mut Recorder<P, C>,
    command: RecorderCommand,
    interval: &mut Duration,
) -> ControlFlow<()>
where
    P: StateProbe,
    C: RunClock,
{
    match command {
        RecorderCommand::Timer(event) => {
            if let Err(err) = recorder.handle_event(event) {
                log_error!("Failed to handle timer event {}: {err:?}", event.as_str());
            }
        }
        RecorderCommand::UpdateSettings(settings) => {
            *interval = settings.poll_interval();
            log_info!("Recorder settings updated, polling every {:?}", *interval);
            recorder.set_settings(settings);
        }
        RecorderCommand::Shutdown => {
            log_info!("Recorder loop shutting down");
            return ControlFlow::Break(());
        }
    }
    ControlFlow::Continue(())
}
