use std::future::Future;

use st_capture::OcrSource;

use crate::types::RawOcrResult;

/// OCR failures surfaced to callers.
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    /// Engine runtime assets (models, charset, ...) could not be loaded.
    #[error("OCR engine failed to load: {0}")]
    EngineLoad(String),
    /// The engine started but failed while recognizing.
    #[error("OCR failed: {0}")]
    Recognition(String),
    /// The engine completed without any result payload.
    #[error("OCR returned no data.")]
    NoData,
}

/// Recognition progress report.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub status: String,
    /// 0.0..=1.0
    pub progress: f32,
}

impl Progress {
    pub const RECOGNIZING: &'static str = "recognizing text";

    pub fn new(status: impl Into<String>, progress: f32) -> Self {
        Self {
            status: status.into(),
            progress,
        }
    }
}

pub type ProgressFn<'a> = &'a (dyn Fn(Progress) + Send + Sync);

/// OCR engine capability.
pub trait Recognizer: Send + Sync {
    /// Recognize text in `source`.
    ///
    /// `languages` is a `+`-joined hint such as `"eng+kor+jpn"`. `Ok(None)` means the engine
    /// completed without producing a payload.
    fn recognize(
        &self,
        source: &OcrSource,
        languages: &str,
        progress: ProgressFn<'_>,
    ) -> impl Future<Output = Result<Option<RawOcrResult>, OcrError>> + Send;
}

/// Explicit engine construction step.
pub trait EngineLoader: Send + Sync {
    type Engine: Recognizer + 'static;

    /// Resolve runtime assets and build the engine.
    fn load(&self) -> Result<Self::Engine, OcrError>;
}
