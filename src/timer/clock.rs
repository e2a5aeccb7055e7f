use std::{path::PathBuf, time::Duration};

/// Read-only view of the host timer.
///
/// Implementations are queried from the poll worker thread, so they must be
/// `Send` and do their own synchronization with the host.
pub trait RunClock: Send {
    /// Elapsed game time of the running attempt, `None` while the timer is idle.
    fn current_game_time(&self) -> Option<Duration>;

    /// True once the split that was just taken was the last one of the run.
    fn final_split_reached(&self) -> bool;

    /// The host's own attempt counter. Informational only.
    fn attempt_index(&self) -> Option<u32>;

    /// Path of the run definition currently loaded by the host, if it was
    /// opened from a file.
    fn run_file(&self) -> Option<PathBuf>;
}
