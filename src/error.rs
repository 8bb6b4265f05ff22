use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EditorError>;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("file dialog failed (code {code:#x})")]
    #[cfg_attr(not(windows), allow(dead_code))]
    Dialog { code: u32 },

    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("settings unavailable: {0}")]
    Settings(String),

    #[error("platform error: {0}")]
    Platform(String),
}

impl EditorError {
    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Caption used for the modal shown to the user.
    #[cfg_attr(not(windows), allow(dead_code))]
    pub fn caption(&self) -> &'static str {
        match self {
            Self::Dialog { .. } => "File dialog error",
            Self::Read { .. } => "Open failed",
            Self::Write { .. } => "Save failed",
            Self::Settings(_) => "Settings error",
            Self::Platform(_) => "Error",
        }
    }
}

#[cfg(windows)]
impl From<windows::core::Error> for EditorError {
    fn from(error: windows::core::Error) -> Self {
        Self::Platform(error.message())
    }
}
