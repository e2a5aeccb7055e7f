pub mod clock;
pub mod events;
pub mod format;

pub use clock::RunClock;
pub use events::TimerEvent;
pub use format::format_game_time;
