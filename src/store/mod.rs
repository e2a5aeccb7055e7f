use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;

mod atomic_io;
pub mod helpers;
pub mod migrations;

use atomic_io::write_text_atomic;
use migrations::run_migrations;
pub use migrations::CURRENT_RECAP_VERSION;

use crate::models::{Attempt, RecapDocument, Segment};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Owns the recap document of one run file and writes it back after every
/// change.
#[derive(Debug)]
pub struct RecapStore {
    path: PathBuf,
    document: RecapDocument,
    /// The file at `path` could not be loaded and must be moved aside before
    /// it is first written over.
    preserve_original: bool,
}

impl RecapStore {
    /// Reads and migrates the document at `path`.
    ///
    /// A missing file yields an empty document. A file that cannot be read,
    /// parsed or migrated is logged and also replaced by an empty document; the
    /// first [`persist`](Self::persist) renames it to a timestamped `.bak`
    /// beside it instead of writing over it.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut preserve_original = false;
        let mut document = match read_document(&path) {
            Ok(Some(document)) => document,
            Ok(None) => {
                log_info!("No recap at {}, starting a new one", path.display());
                RecapDocument::empty(CURRENT_RECAP_VERSION)
            }
            Err(err) => {
                log_error!(
                    "Ignoring unreadable recap {}: {err:?}",
                    path.display()
                );
                preserve_original = true;
                RecapDocument::empty(CURRENT_RECAP_VERSION)
            }
        };

        document.reindex_attempts();

        Self {
            path,
            document,
            preserve_original,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &RecapDocument {
        &self.document
    }

    /// Starts a new attempt and persists it.
    ///
    /// The attempt stays in memory even when the write fails, so later
    /// segments still land in it.
    pub fn create_attempt(&mut self, external_attempt_id: Option<u32>) -> Result<&Attempt> {
        let id = self.document.attempts.len();
        self.document
            .attempts
            .push(Attempt::new(id, external_attempt_id, Utc::now()));
        log_info!("Created attempt {id} in {}", self.path.display());

        self.persist()?;
        Ok(&self.document.attempts[id])
    }

    pub fn current_attempt(&self) -> Option<&Attempt> {
        self.document.current_attempt()
    }

    /// Appends `segment` to the current attempt and persists.
    ///
    /// Returns `Ok(false)` without touching anything when no attempt exists.
    /// On a failed write the segment is kept in memory and the error returned.
    pub fn append_segment(&mut self, segment: Segment) -> Result<bool> {
        let Some(attempt) = self.document.current_attempt_mut() else {
            log_warn!("No attempt in progress, dropping segment {}", segment.name());
            return Ok(false);
        };

        log_info!(
            "Recording segment {} at {} in attempt {}",
            segment.name(),
            segment.end_time(),
            attempt.id
        );
        attempt.scenes.push(segment);

        self.persist()?;
        Ok(true)
    }

    /// Writes the whole document. Fails without writing when an unreadable
    /// original could not be moved aside.
    pub fn persist(&mut self) -> Result<()> {
        if self.preserve_original {
            self.move_original_aside()?;
        }
        let serialized = serde_json::to_string_pretty(&self.document)
            .context("failed to serialize recap document")?;
        write_text_atomic(&self.path, &serialized)
            .with_context(|| format!("failed to write recap to {}", self.path.display()))
    }

    fn move_original_aside(&mut self) -> Result<()> {
        let backup = backup_path(&self.path, Utc::now());
        match fs::rename(&self.path, &backup) {
            Ok(()) => log_warn!(
                "Moved unreadable recap {} to {}",
                self.path.display(),
                backup.display()
            ),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| {
                    format!(
                        "refusing to overwrite unreadable recap {}",
                        self.path.display()
                    )
                })
            }
        }
        self.preserve_original = false;
        Ok(())
    }
}

/// `<file name>.<UTC timestamp>.bak` in the same directory.
fn backup_path(path: &Path, now: DateTime<Utc>) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.bak", now.format("%Y%m%d%H%M%S")));
    path.with_file_name(name)
}

fn read_document(path: &Path) -> Result<Option<RecapDocument>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()))
        }
    };

    let raw: Value = serde_json::from_str(&contents).context("recap is not valid JSON")?;
    let migrated = run_migrations(raw).context("failed to migrate recap")?;
    let document = serde_json::from_value(migrated).context("recap has an unexpected shape")?;
    Ok(Some(document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_json(path: &Path, value: Value) {
        fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    }

    #[test]
    fn missing_file_starts_empty_at_current_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecapStore::load(dir.path().join("run.rrc"));

        assert_eq!(store.document().version, CURRENT_RECAP_VERSION);
        assert!(store.document().attempts.is_empty());
        assert!(store.current_attempt().is_none());
    }

    fn backups(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "bak"))
            .collect()
    }

    #[test]
    fn malformed_file_is_moved_aside_on_first_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.rrc");
        fs::write(&path, "{ not json").unwrap();

        let mut store = RecapStore::load(&path);
        assert!(store.document().attempts.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
        assert!(backups(dir.path()).is_empty());

        store.create_attempt(None).unwrap();
        let reloaded = RecapStore::load(&path);
        assert_eq!(reloaded.document().attempts.len(), 1);

        let moved = backups(dir.path());
        assert_eq!(moved.len(), 1);
        assert_eq!(fs::read_to_string(&moved[0]).unwrap(), "{ not json");

        store.create_attempt(None).unwrap();
        assert_eq!(backups(dir.path()).len(), 1);
    }

    #[test]
    fn unreadable_file_is_never_written_over() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.rrc");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("history"), "earlier attempts").unwrap();

        let mut store = RecapStore::load(&path);
        assert!(store.document().attempts.is_empty());
        store.create_attempt(Some(3)).unwrap();

        let moved = backups(dir.path());
        assert_eq!(moved.len(), 1);
        assert_eq!(
            fs::read_to_string(moved[0].join("history")).unwrap(),
            "earlier attempts"
        );
        let reloaded = RecapStore::load(&path);
        assert_eq!(reloaded.document().attempts[0].external_attempt_id, Some(3));
    }

    #[test]
    fn backup_name_keeps_the_recap_name() {
        let now = DateTime::parse_from_rfc3339("2024-03-09T17:05:42Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            backup_path(Path::new("/recaps/any%.v2.rrc"), now),
            PathBuf::from("/recaps/any%.v2.rrc.20240309170542.bak")
        );
    }

    #[test]
    fn old_documents_are_migrated_and_reindexed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.rrc");
        write_json(
            &path,
            json!({
                "version": "v0.2",
                "attempts": [
                    { "id": 41, "scenes": [
                        { "name": "level_veggies", "levelTime": "12,345", "endTime": "00:00:20.000" },
                        { "name": "win", "hp": 3, "parries": 0, "superMeter": 0, "endTime": "00:00:30.000" }
                    ] },
                    { "id": 41, "scenes": [] },
                    { "id": 7, "scenes": [] }
                ]
            }),
        );

        let store = RecapStore::load(&path);
        let document = store.document();

        assert_eq!(document.version, CURRENT_RECAP_VERSION);
        for (index, attempt) in document.attempts.iter().enumerate() {
            assert_eq!(attempt.id, index);
        }
        match &document.attempts[0].scenes[0] {
            Segment::Level(level) => assert_eq!(level.level_time, 12.34),
            other => panic!("expected a level segment, got {other:?}"),
        }
        match &document.attempts[0].scenes[1] {
            Segment::Scoreboard(board) => {
                assert_eq!(board.hp, Some(3));
                assert_eq!(board.parries, None);
                assert_eq!(board.super_meter, None);
            }
            other => panic!("expected a scoreboard segment, got {other:?}"),
        }
    }

    #[test]
    fn attempts_get_sequential_ids_and_persist_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.rrc");

        let mut store = RecapStore::load(&path);
        store.create_attempt(Some(120)).unwrap();
        let second = store.create_attempt(Some(121)).unwrap();
        assert_eq!(second.id, 1);

        let on_disk: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk["version"], CURRENT_RECAP_VERSION);
        assert_eq!(on_disk["attempts"][1]["id"], 1);
        assert_eq!(on_disk["attempts"][1]["externalAttemptId"], 121);
        assert!(on_disk["attempts"][1]["startedAt"].is_string());
    }

    #[test]
    fn segments_go_to_the_last_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.rrc");

        let mut store = RecapStore::load(&path);
        store.create_attempt(None).unwrap();
        store.create_attempt(None).unwrap();
        let appended = store
            .append_segment(Segment::generic("scene_map_world_1", "00:00:05.000".into()))
            .unwrap();

        assert!(appended);
        let reloaded = RecapStore::load(&path);
        assert!(reloaded.document().attempts[0].scenes.is_empty());
        assert_eq!(reloaded.document().attempts[1].scenes.len(), 1);
        assert_eq!(reloaded.document().attempts[1].scenes[0].name(), "map_world_1");
    }

    #[test]
    fn appending_without_an_attempt_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.rrc");

        let mut store = RecapStore::load(&path);
        let appended = store
            .append_segment(Segment::generic("scene_title", "00:00:00.000".into()))
            .unwrap();

        assert!(!appended);
        assert!(!path.exists());
    }

    #[test]
    fn failed_writes_keep_segments_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "").unwrap();

        let mut store = RecapStore::load(blocker.join("run.rrc"));
        assert!(store.create_attempt(None).is_err());
        assert!(store
            .append_segment(Segment::generic("scene_map_world_1", "00:00:01.000".into()))
            .is_err());

        let attempt = store.current_attempt().unwrap();
        assert_eq!(attempt.scenes.len(), 1);
    }
}
