use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
    time::Duration,
};

use crate::engine::EngineConfig;

pub const DEFAULT_REFRESH_RATE_HZ: u32 = 120;
pub const RECAP_EXTENSION: &str = "rrc";

const DEFAULT_RECAP_DIR_NAME: &str = "RunRecaps";
const FALLBACK_RECAP_FILE_STEM: &str = "run_recap";
const MAX_REFRESH_RATE_HZ: u32 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecapSettings {
    /// Where `.rrc` files are written. `None` uses a folder beside the host
    /// executable.
    pub recap_directory: Option<PathBuf>,
    pub refresh_rate_hz: u32,
    pub sub_boss_scene_prefix: String,
}

impl Default for RecapSettings {
    fn default() -> Self {
        Self {
            recap_directory: None,
            refresh_rate_hz: DEFAULT_REFRESH_RATE_HZ,
            sub_boss_scene_prefix: EngineConfig::default().sub_boss_scene_prefix,
        }
    }
}

impl RecapSettings {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            sub_boss_scene_prefix: self.sub_boss_scene_prefix.clone(),
            ..EngineConfig::default()
        }
    }

    /// Target time between two poll ticks.
    pub fn poll_interval(&self) -> Duration {
        let rate = match self.refresh_rate_hz {
            0 => DEFAULT_REFRESH_RATE_HZ,
            rate => rate.min(MAX_REFRESH_RATE_HZ),
        };
        Duration::from_secs(1) / rate
    }

    pub fn recap_directory(&self) -> PathBuf {
        self.recap_directory
            .clone()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(default_recap_directory)
    }

    /// Recap file for the run definition the host has loaded, named after it.
    pub fn recap_path(&self, run_file: Option<&Path>) -> PathBuf {
        let stem = run_file
            .and_then(Path::file_stem)
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .unwrap_or(FALLBACK_RECAP_FILE_STEM);
        self.recap_directory()
            .join(format!("{stem}.{RECAP_EXTENSION}"))
    }
}

pub fn default_recap_directory() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_default()
        .join(DEFAULT_RECAP_DIR_NAME)
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<RecapSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!(
                    "Ignoring malformed settings in {}: {err}",
                    path.display()
                );
                RecapSettings::default()
            })
        } else {
            RecapSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> RecapSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update(&self, settings: RecapSettings) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &RecapSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory {}", parent.display())
            })?;
        }
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
