use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::defaults::*;

/// Application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    // OCR
    /// `+`-joined recognition languages, e.g. "eng+kor+jpn".
    #[serde(default = "default_ocr_language")]
    pub ocr_language: String,
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    // Selection
    #[serde(default = "default_selection_min_size")]
    pub selection_min_size: i32,
    /// Pause between overlay teardown and capture so the overlay is not captured.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    // Extraction
    #[serde(default = "default_min_line_size")]
    pub min_line_size: i32,
    #[serde(default = "default_word_tier_min_confidence")]
    pub word_tier_min_confidence: f32,

    // Normalization
    #[serde(default = "default_min_ocr_width")]
    pub min_ocr_width: u32,
    #[serde(default = "default_max_ocr_width")]
    pub max_ocr_width: u32,

    // Timeouts
    #[serde(default = "default_capture_timeout_ms")]
    pub capture_timeout_ms: u64,
    #[serde(default = "default_image_load_timeout_ms")]
    pub image_load_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ocr_language: default_ocr_language(),
            models_dir: default_models_dir(),

            selection_min_size: default_selection_min_size(),
            settle_delay_ms: default_settle_delay_ms(),

            min_line_size: default_min_line_size(),
            word_tier_min_confidence: default_word_tier_min_confidence(),

            min_ocr_width: default_min_ocr_width(),
            max_ocr_width: default_max_ocr_width(),

            capture_timeout_ms: default_capture_timeout_ms(),
            image_load_timeout_ms: default_image_load_timeout_ms(),
        }
    }
}

impl Settings {
    fn settings_dir() -> PathBuf {
        PathBuf::from(default_config_path()).join(".snaptext")
    }

    pub fn primary_settings_path() -> PathBuf {
        Self::settings_dir().join("settings.json")
    }

    /// Load settings from the primary path.
    ///
    /// Falls back to defaults (and persists them) if loading fails.
    pub fn load() -> Self {
        let primary = Self::primary_settings_path();
        if let Some(settings) = Self::read(&primary) {
            return settings;
        }

        let default_settings = Self::default();
        if !primary.exists()
            && let Err(e) = default_settings.save_to(&primary)
        {
            warn!("Could not persist default settings: {e}");
        }
        default_settings
    }

    /// Load settings from an explicit file; defaults if it is missing or invalid.
    pub fn load_from(path: &Path) -> Self {
        Self::read(path).unwrap_or_default()
    }

    fn read(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        match serde_json::from_str::<Settings>(&content) {
            Ok(settings) => Some(settings),
            Err(e) => {
                warn!("Ignoring invalid settings file {}: {e}", path.display());
                None
            }
        }
    }

    /// Save settings to the primary path.
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::primary_settings_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }

    pub fn image_load_timeout(&self) -> Duration {
        Duration::from_millis(self.image_load_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
