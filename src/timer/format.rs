use std::time::Duration;

/// Formats elapsed game time as `HH:MM:SS.mmm`.
///
/// Hours are total hours and are not wrapped at a day boundary.
pub fn format_game_time(elapsed: Duration) -> String {
    let total_ms = elapsed.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1_000) % 60;
    let millis = total_ms % 1_000;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}
