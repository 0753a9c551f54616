use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::guide::ReconcileConfig;

pub const DATA_DIR_ENV: &str = "EPG_GRID_DATA_DIR";
pub const DEBUG_ENV: &str = "EPG_GRID_DEBUG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuideSettings {
    pub preserve_existing_window: bool,
    pub staleness_tolerance_minutes: i64,
    pub cache_file_name: String,
}

impl Default for GuideSettings {
    fn default() -> Self {
        Self {
            preserve_existing_window: true,
            staleness_tolerance_minutes: 30,
            cache_file_name: "guide-cache.json".into(),
        }
    }
}

impl GuideSettings {
    pub fn reconcile_config(&self) -> ReconcileConfig {
        ReconcileConfig {
            staleness_tolerance_minutes: self.staleness_tolerance_minutes,
            ..ReconcileConfig::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserSettings {
    #[serde(default)]
    guide: GuideSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn guide(&self) -> GuideSettings {
        self.read().guide.clone()
    }

    pub fn update_guide(&self, settings: GuideSettings) -> Result<()> {
        let mut guard = self.write();
        guard.guide = settings;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: UserSettings = serde_json::from_str(&contents)?;
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, UserSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// `$EPG_GRID_DATA_DIR`, else `<platform data dir>/epg-grid`, else `./.epg-grid`.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|value| !value.is_empty()) {
        return PathBuf::from(dir);
    }

    dirs::data_dir()
        .map(|dir| dir.join("epg-grid"))
        .unwrap_or_else(|| PathBuf::from(".epg-grid"))
}

pub fn debug_enabled() -> bool {
    std::env::var(DEBUG_ENV)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
