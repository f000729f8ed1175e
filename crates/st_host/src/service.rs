//! Region-select OCR pipeline.
//!
//! selection → settle delay → capture → decode → crop → normalize → engine → cascade.
//! Each request runs as one sequential task; blocking work goes to the blocking pool.

use std::sync::Arc;

use image::GenericImageView;
use parking_lot::Mutex;
use st_app::{InputEvent, PageContext, ocr};
use st_capture::{OcrSource, Viewport, WidthWindow, crop_capture, decode_image_payload, load_bitmap};
use st_ocr::{CascadeConfig, EngineLoader, ExtractionResult, Progress, Recognizer, extract};
use st_settings::Settings;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::capture::{CaptureSource, capture_with_timeout};
use crate::error::PipelineError;
use crate::protocol::{Request, Response};
use crate::selection::{OverlaySurface, run_selection};

pub struct OcrService<C, L: EngineLoader> {
    settings: Settings,
    capture: C,
    loader: Arc<L>,
    engine: tokio::sync::Mutex<Option<Arc<L::Engine>>>,
    job: Mutex<ocr::Model>,
}

impl<C: CaptureSource, L: EngineLoader + 'static> OcrService<C, L> {
    pub fn new(settings: Settings, capture: C, loader: L) -> Self {
        Self {
            settings,
            capture,
            loader: Arc::new(loader),
            engine: tokio::sync::Mutex::new(None),
            job: Mutex::new(ocr::Model::default()),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// True while a recognition job is running.
    pub fn is_busy(&self) -> bool {
        self.job.lock().is_running()
    }

    pub fn completed_jobs(&self) -> u64 {
        self.job.lock().completed()
    }

    /// Let the user select a region of the viewport and return its text.
    ///
    /// `screenshot` is a pre-captured viewport bitmap; without one the capture source is
    /// called after the overlay is gone. `viewport` defaults to the bitmap size.
    pub async fn select_region<S: OverlaySurface>(
        &self,
        page: &Arc<PageContext>,
        screenshot: Option<Vec<u8>>,
        viewport: Option<Viewport>,
        surface: &mut S,
        input: &mut mpsc::Receiver<InputEvent>,
    ) -> Result<ExtractionResult, PipelineError> {
        let rect = run_selection(page, surface, input, self.settings.selection_min_size).await?;

        let settle = self.settings.settle_delay();
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }

        let bytes = match screenshot {
            Some(bytes) => bytes,
            None => capture_with_timeout(&self.capture, self.settings.capture_timeout()).await?,
        };

        let Some(bitmap) = load_bitmap(bytes, self.settings.image_load_timeout()).await else {
            warn!("Captured bitmap unusable, returning no text");
            return Ok(ExtractionResult::empty());
        };

        let (bitmap_w, bitmap_h) = bitmap.dimensions();
        let viewport = viewport.unwrap_or(Viewport::new(bitmap_w, bitmap_h));
        let capture = crop_capture(&bitmap, rect, viewport)?;
        info!(
            "Cropped {}x{} from {}x{} bitmap (scale {:.3} x {:.3})",
            capture.region.width, capture.region.height, bitmap_w, bitmap_h, capture.scale_x,
            capture.scale_y
        );

        let window = self.width_window();
        let cropped = capture.cropped;
        let source = tokio::task::spawn_blocking(move || st_capture::normalize(cropped, window))
            .await
            .map_err(|e| PipelineError::OcrFailed(e.to_string()))?;
        info!("OCR source {}x{}", source.width, source.height);

        self.run_ocr(source).await
    }

    /// OCR a whole encoded image, without selection or cropping.
    pub async fn recognize_image(&self, bytes: Vec<u8>) -> Result<ExtractionResult, PipelineError> {
        if bytes.is_empty() {
            return Err(PipelineError::NoImageData);
        }
        let Some(bitmap) = load_bitmap(bytes, self.settings.image_load_timeout()).await else {
            return Err(PipelineError::OcrFailed(
                "image data could not be decoded".to_string(),
            ));
        };
        self.run_ocr(OcrSource::unscaled(bitmap)).await
    }

    /// Serve one protocol request. Every failure becomes a `{ok: false, error}` response.
    pub async fn handle<S: OverlaySurface>(
        &self,
        request: Request,
        page: &Arc<PageContext>,
        surface: &mut S,
        input: &mut mpsc::Receiver<InputEvent>,
    ) -> Response {
        match request {
            Request::Ping => Response::pong(),
            Request::SelectRegion {
                screenshot_data_url,
                viewport,
            } => {
                let screenshot = screenshot_data_url
                    .filter(|url| !url.trim().is_empty())
                    .map(|url| {
                        decode_image_payload(&url).unwrap_or_else(|e| {
                            warn!("Ignoring unreadable screenshot: {e}");
                            Vec::new()
                        })
                    });
                self.select_region(page, screenshot, viewport.map(Into::into), surface, input)
                    .await
                    .into()
            }
            Request::OcrDataUrl { data_url } => {
                if data_url.trim().is_empty() {
                    return Response::failure(PipelineError::NoImageData.to_string());
                }
                match decode_image_payload(&data_url) {
                    Ok(bytes) => self.recognize_image(bytes).await.into(),
                    Err(e) => Response::failure(PipelineError::OcrFailed(e.to_string()).to_string()),
                }
            }
        }
    }

    /// Parse and serve a JSON request.
    pub async fn handle_json<S: OverlaySurface>(
        &self,
        json: &str,
        page: &Arc<PageContext>,
        surface: &mut S,
        input: &mut mpsc::Receiver<InputEvent>,
    ) -> Response {
        match serde_json::from_str::<Request>(json) {
            Ok(request) => self.handle(request, page, surface, input).await,
            Err(e) => Response::failure(format!("Invalid request: {e}")),
        }
    }

    async fn run_ocr(&self, source: OcrSource) -> Result<ExtractionResult, PipelineError> {
        let _job = self.start_job()?;
        let engine = self.engine().await?;

        let progress = ProgressLog::default();
        let report = |p: Progress| progress.report(p);
        let raw = engine
            .recognize(&source, &self.settings.ocr_language, &report)
            .await?
            .ok_or(PipelineError::OcrNoData)?;
        info!("OCR recognition completed");

        Ok(extract(&raw, &self.cascade_config())?)
    }

    fn start_job(&self) -> Result<JobGuard<'_>, PipelineError> {
        if !self.job.lock().try_start() {
            return Err(PipelineError::Busy);
        }
        Ok(JobGuard { job: &self.job })
    }

    /// Loaded engine, loading it on the blocking pool on first use.
    async fn engine(&self) -> Result<Arc<L::Engine>, PipelineError> {
        let mut slot = self.engine.lock().await;
        if let Some(engine) = slot.as_ref() {
            return Ok(Arc::clone(engine));
        }

        let loader = Arc::clone(&self.loader);
        let engine = tokio::task::spawn_blocking(move || loader.load())
            .await
            .map_err(|e| PipelineError::OcrEngineLoadFailure(e.to_string()))??;
        let engine = Arc::new(engine);
        *slot = Some(Arc::clone(&engine));
        Ok(engine)
    }

    fn width_window(&self) -> WidthWindow {
        WidthWindow::new(self.settings.min_ocr_width, self.settings.max_ocr_width)
    }

    fn cascade_config(&self) -> CascadeConfig {
        CascadeConfig {
            min_line_size: self.settings.min_line_size,
            word_tier_min_confidence: self.settings.word_tier_min_confidence,
        }
    }
}

/// Marks the OCR job finished when dropped.
struct JobGuard<'a> {
    job: &'a Mutex<ocr::Model>,
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        self.job.lock().finish();
    }
}

/// Logs recognition progress at 25% milestones.
#[derive(Default)]
struct ProgressLog {
    last: Mutex<Option<u32>>,
}

impl ProgressLog {
    fn report(&self, progress: Progress) {
        if progress.status != Progress::RECOGNIZING {
            debug!("OCR: {}", progress.status);
            return;
        }

        let percent = (progress.progress.clamp(0.0, 1.0) * 100.0).round() as u32;
        let milestone = percent / 25 * 25;
        let mut last = self.last.lock();
        if last.is_none_or(|l| milestone > l) {
            *last = Some(milestone);
            info!("OCR {}: {}%", progress.status, milestone);
        }
    }
}
