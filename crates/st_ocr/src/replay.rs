//! Replays a recorded OCR result from a JSON file.
//!
//! Lets hosts that run recognition elsewhere (or tests) feed a Tesseract-style result
//! through the same extraction path. A file containing `null` replays an engine that
//! returned no payload.

use std::future::Future;
use std::path::PathBuf;

use st_capture::OcrSource;
use tracing::debug;

use crate::recognizer::{EngineLoader, OcrError, Progress, ProgressFn, Recognizer};
use crate::types::RawOcrResult;

#[derive(Debug, Clone)]
pub struct ReplayLoader {
    path: PathBuf,
}

impl ReplayLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl EngineLoader for ReplayLoader {
    type Engine = ReplayRecognizer;

    fn load(&self) -> Result<ReplayRecognizer, OcrError> {
        if !self.path.is_file() {
            return Err(OcrError::EngineLoad(format!(
                "recorded OCR result not found: {}",
                self.path.display()
            )));
        }
        Ok(ReplayRecognizer {
            path: self.path.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ReplayRecognizer {
    path: PathBuf,
}

impl Recognizer for ReplayRecognizer {
    fn recognize(
        &self,
        source: &OcrSource,
        languages: &str,
        progress: ProgressFn<'_>,
    ) -> impl Future<Output = Result<Option<RawOcrResult>, OcrError>> + Send {
        let path = self.path.clone();
        debug!(
            "Replaying {} for {}x{} source ({languages})",
            path.display(),
            source.width,
            source.height
        );

        async move {
            progress(Progress::new(Progress::RECOGNIZING, 0.0));
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| OcrError::Recognition(format!("{}: {e}", path.display())))?;
            let raw = serde_json::from_str::<Option<RawOcrResult>>(&content)
                .map_err(|e| OcrError::Recognition(format!("{}: {e}", path.display())))?;
            progress(Progress::new(Progress::RECOGNIZING, 1.0));
            Ok(raw)
        }
    }
}
