use std::path::PathBuf;

// OCR defaults
pub fn default_ocr_language() -> String {
    "eng+kor+jpn".to_string()
}

pub fn default_models_dir() -> PathBuf {
    PathBuf::from(default_config_path())
        .join(".snaptext")
        .join("models")
}

// Selection
pub fn default_selection_min_size() -> i32 {
    60
}

pub fn default_settle_delay_ms() -> u64 {
    100
}

// Extraction cascade
pub fn default_min_line_size() -> i32 {
    5
}

pub fn default_word_tier_min_confidence() -> f32 {
    20.0
}

// Source normalizer width window
pub fn default_min_ocr_width() -> u32 {
    600
}

pub fn default_max_ocr_width() -> u32 {
    2000
}

// Timeouts
pub fn default_capture_timeout_ms() -> u64 {
    15_000
}

pub fn default_image_load_timeout_ms() -> u64 {
    3_000
}

// Config path default
pub fn default_config_path() -> String {
    // Prefer a user home directory.
    if let Ok(home_dir) = std::env::var("HOME") {
        return home_dir;
    }
    if let Ok(home_dir) = std::env::var("USERPROFILE") {
        return home_dir;
    }

    // Fallback: program directory.
    if let Ok(exe_path) = std::env::current_exe()
        && let Some(exe_dir) = exe_path.parent()
    {
        return exe_dir.to_string_lossy().to_string();
    }

    // Last resort: cwd.
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .to_string_lossy()
        .to_string()
}
