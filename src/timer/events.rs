use serde::{Deserialize, Serialize};

/// Lifecycle events forwarded by the host timer.
///
/// Events carry no payload; whatever the recorder needs about the timer at the
/// moment of the event is read back through [`RunClock`](super::RunClock).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerEvent {
    Start,
    Reset,
    Pause,
    Resume,
    Split,
    UndoSplit,
    SkipSplit,
}

impl TimerEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerEvent::Start => "Start",
            TimerEvent::Reset => "Reset",
            TimerEvent::Pause => "Pause",
            TimerEvent::Resume => "Resume",
            TimerEvent::Split => "Split",
            TimerEvent::UndoSplit => "UndoSplit",
            TimerEvent::SkipSplit => "SkipSplit",
        }
    }
}
