use crate::{
    error::Result,
    logging,
    settings::{SettingsStore, schema::Settings},
};

#[cfg(windows)]
use crate::window::AppWindow;

pub struct App {
    #[cfg(windows)]
    window: AppWindow,
    settings: Settings,
}

impl App {
    pub fn new() -> Result<Self> {
        logging::init();

        let store = SettingsStore::load();
        tracing::debug!(path = %store.path().display(), "settings loaded");
        let settings = store.settings().clone();

        #[cfg(windows)]
        let window = AppWindow::new(&settings)?;

        Ok(Self {
            #[cfg(windows)]
            window,
            settings,
        })
    }

    #[cfg(windows)]
    pub fn run(self) -> Result<()> {
        tracing::info!(title = %self.settings.window.base_title, "starting");
        self.window.run()
    }

    #[cfg(not(windows))]
    pub fn run(self) -> Result<()> {
        Err(crate::error::EditorError::Platform(format!(
            "{} needs the Win32 desktop; this build has no window shell",
            self.settings.window.base_title
        )))
    }
}
