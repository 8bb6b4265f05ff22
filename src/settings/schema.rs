use serde::{Deserialize, Serialize};

pub const SETTINGS_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub schema_version: u32,
    pub session: SessionSettings,
    pub window: WindowSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: SETTINGS_SCHEMA_VERSION,
            session: SessionSettings::default(),
            window: WindowSettings::default(),
        }
    }
}

impl Settings {
    pub fn migrate(mut self) -> Self {
        if self.schema_version > SETTINGS_SCHEMA_VERSION {
            return self;
        }

        self.schema_version = SETTINGS_SCHEMA_VERSION;
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct SessionSettings {
    pub title_mode: TitleMode,
    pub save_policy: SavePolicy,
}

/// How a successful open or save changes the window title.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TitleMode {
    /// `"<base> <name>"`, recomputed each time.
    #[default]
    Replace,
    /// Appends `" <name>"` to whatever the title already is.
    Append,
}

/// What the Save menu item does once a destination is known.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SavePolicy {
    #[default]
    WriteInPlace,
    /// Save stays enabled but does nothing; only Save as writes.
    Inert,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowSettings {
    pub base_title: String,
    pub width: i32,
    pub height: i32,
    pub split_ratio: f32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            base_title: "Markdown".to_string(),
            width: 800,
            height: 500,
            split_ratio: 0.5,
        }
    }
}

impl WindowSettings {
    #[cfg_attr(not(windows), allow(dead_code))]
    pub fn clamped_split_ratio(&self) -> f32 {
        if self.split_ratio.is_finite() {
            self.split_ratio.clamp(0.1, 0.9)
        } else {
            0.5
        }
    }
}
