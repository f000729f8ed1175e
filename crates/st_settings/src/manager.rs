use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::Settings;

/// Unified config manager.
pub struct ConfigManager {
    settings: Arc<RwLock<Settings>>,
    path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create a new config manager (loads settings once from the primary path and caches them).
    pub fn new() -> Self {
        Self {
            settings: Arc::new(RwLock::new(Settings::load())),
            path: None,
        }
    }

    /// Config manager backed by an explicit settings file.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            settings: Arc::new(RwLock::new(Settings::load_from(&path))),
            path: Some(path),
        }
    }

    /// Config manager holding the given settings (nothing is read from disk).
    pub fn from_settings(settings: Settings) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings)),
            path: None,
        }
    }

    /// Get a snapshot copy of current settings.
    pub fn get(&self) -> Settings {
        self.settings.read().clone()
    }

    /// Get the shared settings reference.
    pub fn get_shared(&self) -> Arc<RwLock<Settings>> {
        Arc::clone(&self.settings)
    }

    /// Reload settings from disk.
    pub fn reload(&mut self) {
        let new_settings = match &self.path {
            Some(path) => Settings::load_from(path),
            None => Settings::load(),
        };
        *self.settings.write() = new_settings;
    }

    // Convenience accessors.

    #[inline]
    pub fn ocr_language(&self) -> String {
        self.settings.read().ocr_language.clone()
    }

    #[inline]
    pub fn models_dir(&self) -> PathBuf {
        self.settings.read().models_dir.clone()
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
