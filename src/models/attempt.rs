use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::segment::Segment;

/// One speedrun try, from the timer's `Start` until the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    /// Position of the attempt in the document. Rebuilt on every load.
    #[serde(default)]
    pub id: usize,
    /// The host timer's own attempt counter, kept for cross-referencing only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_attempt_id: Option<u32>,
    /// Missing in documents recorded before attempts were timestamped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    pub scenes: Vec<Segment>,
}

impl Attempt {
    pub fn new(id: usize, external_attempt_id: Option<u32>, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            external_attempt_id,
            started_at: Some(started_at),
            scenes: Vec::new(),
        }
    }
}

/// Root of a `.rrc` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecapDocument {
    pub version: String,
    pub attempts: Vec<Attempt>,
}

impl RecapDocument {
    pub fn empty(version: &str) -> Self {
        Self {
            version: version.to_string(),
            attempts: Vec::new(),
        }
    }

    /// Rewrites every attempt id to its position, discarding stored ids.
    pub fn reindex_attempts(&mut self) {
        for (index, attempt) in self.attempts.iter_mut().enumerate() {
            attempt.id = index;
        }
    }

    pub fn current_attempt(&self) -> Option<&Attempt> {
        self.attempts.last()
    }

    pub fn current_attempt_mut(&mut self) -> Option<&mut Attempt> {
        self.attempts.last_mut()
    }
}
