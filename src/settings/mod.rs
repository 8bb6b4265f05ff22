pub mod schema;

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::{EditorError, Result};

use schema::Settings;

pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    pub fn load() -> Self {
        Self::with_path(settings_path())
    }

    /// Never fails: an unreadable or corrupt file yields defaults. On first
    /// run the defaults are written out so there is a file to edit.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !path.exists() {
            let settings = Settings::default();
            if let Err(error) = save_settings_to(path.as_path(), &settings) {
                tracing::warn!(path = %path.display(), %error, "could not write default settings");
            }
            return Self { path, settings };
        }

        let settings = match load_settings_from(path.as_path()) {
            Ok(settings) => settings,
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "using default settings");
                Settings::default()
            }
        };
        Self { path, settings }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

pub fn settings_path() -> PathBuf {
    if let Some(root) = portable_root() {
        return root.join("settings.json");
    }

    if let Some(base) = dirs::config_dir() {
        base.join("Markpad").join("settings.json")
    } else {
        PathBuf::from("settings.json")
    }
}

pub fn portable_root() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let dir = exe.parent()?.to_path_buf();
    if dir.join("markpad.ini").exists() {
        Some(dir)
    } else {
        None
    }
}

/// A missing file is not an error.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Settings::default());
        }
        Err(error) => return Err(EditorError::Settings(error.to_string())),
    };

    serde_json::from_str::<Settings>(&data)
        .map(Settings::migrate)
        .map_err(|error| EditorError::Settings(error.to_string()))
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| EditorError::write(parent, source))?;
    }
    let data = serde_json::to_string_pretty(&settings.clone().migrate())
        .map_err(|error| EditorError::Settings(error.to_string()))?;
    fs::write(path, data).map_err(|source| EditorError::write(path, source))
}
