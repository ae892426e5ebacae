use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{BookingError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Where the theme preference survives restarts
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<Option<Theme>>;
    fn save(&self, theme: Theme) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSettings {
    theme: Theme,
}

/// JSON file holding `{"theme": "dark"}`
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Result<Option<Theme>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| BookingError::Settings(format!("{}: {}", self.path.display(), e)))?;
        let stored: StoredSettings = serde_json::from_str(&raw)?;
        Ok(Some(stored.theme))
    }

    fn save(&self, theme: Theme) -> Result<()> {
        let raw = serde_json::to_string(&StoredSettings { theme })?;
        fs::write(&self.path, raw)
            .map_err(|e| BookingError::Settings(format!("{}: {}", self.path.display(), e)))
    }
}

#[derive(Default)]
pub struct InMemorySettingsStore {
    theme: Mutex<Option<Theme>>,
}

impl SettingsStore for InMemorySettingsStore {
    fn load(&self) -> Result<Option<Theme>> {
        Ok(*self.theme.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn save(&self, theme: Theme) -> Result<()> {
        *self.theme.lock().unwrap_or_else(PoisonError::into_inner) = Some(theme);
        Ok(())
    }
}

/// Process-wide display preferences, injected where needed.
pub struct ThemeSettings {
    store: Arc<dyn SettingsStore>,
    theme: Mutex<Theme>,
}

impl ThemeSettings {
    /// Use the stored theme, or the environment's preference when nothing is
    /// stored. An unreadable store counts as empty.
    pub fn init(store: Arc<dyn SettingsStore>, prefers_dark: bool) -> Self {
        let fallback = if prefers_dark { Theme::Dark } else { Theme::Light };
        let theme = match store.load() {
            Ok(Some(theme)) => theme,
            Ok(None) => fallback,
            Err(e) => {
                warn!(error = %e, "Could not read stored theme, using environment preference");
                fallback
            }
        };
        info!(theme = ?theme, "Theme initialised");
        Self {
            store,
            theme: Mutex::new(theme),
        }
    }

    pub fn theme(&self) -> Theme {
        *self.theme.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Flip the theme and write it through to the store.
    pub fn toggle(&self) -> Result<Theme> {
        let mut theme = self.theme.lock().unwrap_or_else(PoisonError::into_inner);
        let next = theme.toggled();
        self.store.save(next)?;
        *theme = next;
        Ok(next)
    }
}
