use std::future::Future;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::ThreadId;
use std::time::Duration;

use image::{DynamicImage, ImageFormat, RgbImage};
use parking_lot::Mutex;
use st_app::{InputEvent, KeyCode, PageContext, Rect};
use st_capture::{OcrSource, Viewport};
use st_host::{
    CaptureError, CaptureSource, NoCapture, OcrService, OverlaySurface, PipelineError, Response,
};
use st_ocr::{
    BoundingBox, EngineLoader, ExtractionResult, OcrData, OcrError, OcrLine, ProgressFn,
    RawOcrResult, Recognizer, ReplayLoader,
};
use st_settings::Settings;
use tokio::sync::{Notify, mpsc};

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn settings() -> Settings {
    Settings {
        settle_delay_ms: 0,
        ..Settings::default()
    }
}

fn hello() -> RawOcrResult {
    RawOcrResult::new(OcrData {
        lines: vec![OcrLine {
            text: "Hello".into(),
            bbox: BoundingBox::new(0, 0, 50, 20),
        }],
        confidence: 80.0,
        ..Default::default()
    })
}

/// Returns a fixed result and records the size of every source it sees.
#[derive(Clone)]
struct FixedRecognizer {
    result: Option<RawOcrResult>,
    sources: Arc<Mutex<Vec<(u32, u32)>>>,
    gate: Option<Arc<Notify>>,
}

impl Recognizer for FixedRecognizer {
    fn recognize(
        &self,
        source: &OcrSource,
        _languages: &str,
        _progress: ProgressFn<'_>,
    ) -> impl Future<Output = Result<Option<RawOcrResult>, OcrError>> + Send {
        self.sources.lock().push((source.width, source.height));
        let result = self.result.clone();
        let gate = self.gate.clone();
        async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            Ok(result)
        }
    }
}

struct FixedLoader {
    engine: FixedRecognizer,
    loads: Arc<AtomicUsize>,
    load_thread: Arc<Mutex<Option<ThreadId>>>,
}

impl FixedLoader {
    fn new(result: Option<RawOcrResult>) -> Self {
        Self {
            engine: FixedRecognizer {
                result,
                sources: Arc::default(),
                gate: None,
            },
            loads: Arc::default(),
            load_thread: Arc::default(),
        }
    }

    fn sources(&self) -> Arc<Mutex<Vec<(u32, u32)>>> {
        Arc::clone(&self.engine.sources)
    }
}

impl EngineLoader for FixedLoader {
    type Engine = FixedRecognizer;

    fn load(&self) -> Result<FixedRecognizer, OcrError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        *self.load_thread.lock() = Some(std::thread::current().id());
        Ok(self.engine.clone())
    }
}

/// Records overlay lifecycle calls.
#[derive(Default)]
struct RecordingSurface {
    attached: usize,
    detached: usize,
    drawn: Vec<Rect>,
}

impl OverlaySurface for RecordingSurface {
    fn attach(&mut self, _session: u64) {
        self.attached += 1;
    }

    fn draw(&mut self, selection: Rect) {
        self.drawn.push(selection);
    }

    fn detach(&mut self) {
        self.detached += 1;
    }
}

/// Captures a fixed bitmap and notes whether the overlay was still up at capture time.
struct PageCapture {
    page: Arc<PageContext>,
    bytes: Vec<u8>,
    overlay_seen: Arc<AtomicBool>,
}

impl CaptureSource for PageCapture {
    fn capture_viewport(&self) -> impl Future<Output = Result<Vec<u8>, CaptureError>> + Send {
        if self.page.is_overlay_active() {
            self.overlay_seen.store(true, Ordering::SeqCst);
        }
        std::future::ready(Ok(self.bytes.clone()))
    }
}

struct StalledCapture;

impl CaptureSource for StalledCapture {
    fn capture_viewport(&self) -> impl Future<Output = Result<Vec<u8>, CaptureError>> + Send {
        std::future::pending()
    }
}

fn drag(left: i32, top: i32, right: i32, bottom: i32) -> mpsc::Receiver<InputEvent> {
    let (tx, rx) = mpsc::channel(8);
    for event in [
        InputEvent::PointerDown { x: left, y: top },
        InputEvent::PointerMove {
            x: (left + right) / 2,
            y: (top + bottom) / 2,
        },
        InputEvent::PointerUp {
            x: right,
            y: bottom,
        },
    ] {
        tx.try_send(event).unwrap();
    }
    rx
}

#[tokio::test]
async fn select_region_with_supplied_screenshot() {
    let loader = FixedLoader::new(Some(hello()));
    let sources = loader.sources();
    let service = OcrService::new(settings(), NoCapture, loader);
    let page = PageContext::new();
    let mut surface = RecordingSurface::default();
    let mut input = drag(100, 100, 200, 180);

    // 2x device pixel ratio: 400x300 viewport captured as 800x600.
    let result = service
        .select_region(
            &page,
            Some(png(800, 600)),
            Some(Viewport::new(400, 300)),
            &mut surface,
            &mut input,
        )
        .await
        .unwrap();

    assert_eq!(result, ExtractionResult::new(1, "Hello"));
    // 200x160 crop scaled up to the 600px minimum width.
    assert_eq!(*sources.lock(), vec![(600, 480)]);
    assert_eq!((surface.attached, surface.detached), (1, 1));
    assert_eq!(surface.drawn.last(), Some(&Rect::new(100, 100, 50, 40)));
    assert!(!page.is_overlay_active());
    assert_eq!(service.completed_jobs(), 1);
}

#[tokio::test]
async fn capture_happens_after_overlay_teardown() {
    let page = PageContext::new();
    let overlay_seen = Arc::new(AtomicBool::new(false));
    let capture = PageCapture {
        page: Arc::clone(&page),
        bytes: png(800, 600),
        overlay_seen: Arc::clone(&overlay_seen),
    };
    let service = OcrService::new(settings(), capture, FixedLoader::new(Some(hello())));

    let result = service
        .select_region(
            &page,
            None,
            None,
            &mut RecordingSurface::default(),
            &mut drag(10, 10, 110, 110),
        )
        .await
        .unwrap();

    assert_eq!(result.text, "Hello");
    assert!(!overlay_seen.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn stalled_capture_times_out() {
    let service = OcrService::new(settings(), StalledCapture, FixedLoader::new(Some(hello())));
    let page = PageContext::new();

    let err = service
        .select_region(
            &page,
            None,
            None,
            &mut RecordingSurface::default(),
            &mut drag(0, 0, 100, 100),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::CaptureTimeout));
    assert!(!page.is_overlay_active());
}

#[tokio::test]
async fn selection_outside_bitmap_is_out_of_bounds() {
    let service = OcrService::new(settings(), NoCapture, FixedLoader::new(Some(hello())));

    let err = service
        .select_region(
            &PageContext::new(),
            Some(png(800, 600)),
            None,
            &mut RecordingSurface::default(),
            &mut drag(1000, 0, 1060, 60),
        )
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Selection is out of bounds.");
}

#[tokio::test]
async fn too_small_and_cancelled_selections_never_capture() {
    let loader = FixedLoader::new(Some(hello()));
    let sources = loader.sources();
    let service = OcrService::new(settings(), NoCapture, loader);
    let page = PageContext::new();
    let mut surface = RecordingSurface::default();

    let err = service
        .select_region(&page, None, None, &mut surface, &mut drag(0, 0, 59, 100))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::SelectionTooSmall));

    let (tx, mut rx) = mpsc::channel(2);
    tx.send(InputEvent::KeyDown {
        key: KeyCode::ESCAPE,
    })
    .await
    .unwrap();
    let err = service
        .select_region(&page, None, None, &mut surface, &mut rx)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::SelectionCancelled));

    assert_eq!((surface.attached, surface.detached), (2, 2));
    assert!(sources.lock().is_empty());
}

#[tokio::test]
async fn unusable_screenshot_yields_empty_result() {
    let loader = FixedLoader::new(Some(hello()));
    let sources = loader.sources();
    let service = OcrService::new(settings(), NoCapture, loader);

    let result = service
        .select_region(
            &PageContext::new(),
            Some(b"not an image".to_vec()),
            None,
            &mut RecordingSurface::default(),
            &mut drag(0, 0, 100, 100),
        )
        .await
        .unwrap();

    assert!(result.is_empty());
    assert_eq!(result.line_count, 0);
    assert!(sources.lock().is_empty());
}

#[tokio::test]
async fn engine_without_payload_is_no_data() {
    let service = OcrService::new(settings(), NoCapture, FixedLoader::new(None));
    let err = service.recognize_image(png(100, 40)).await.unwrap_err();
    assert_eq!(err.to_string(), "OCR returned no data.");
    assert!(!service.is_busy());
}

#[tokio::test]
async fn recognize_image_checks_input_and_loads_engine_once() {
    let loader = FixedLoader::new(Some(hello()));
    let loads = Arc::clone(&loader.loads);
    let load_thread = Arc::clone(&loader.load_thread);
    let sources = loader.sources();
    let service = OcrService::new(settings(), NoCapture, loader);

    let err = service.recognize_image(Vec::new()).await.unwrap_err();
    assert!(matches!(err, PipelineError::NoImageData));

    for _ in 0..2 {
        let result = service.recognize_image(png(100, 40)).await.unwrap();
        assert_eq!(result, ExtractionResult::new(1, "Hello"));
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    // Loaded on the blocking pool, not on the runtime thread running this test.
    assert_ne!(*load_thread.lock(), Some(std::thread::current().id()));
    assert!(load_thread.lock().is_some());
    // Whole images are passed through at their own size.
    assert_eq!(*sources.lock(), vec![(100, 40), (100, 40)]);
}

#[tokio::test]
async fn missing_engine_assets_fail_to_load() {
    let service = OcrService::new(
        settings(),
        NoCapture,
        ReplayLoader::new("/nonexistent/recorded.json"),
    );
    let err = service.recognize_image(png(10, 10)).await.unwrap_err();
    assert!(matches!(err, PipelineError::OcrEngineLoadFailure(_)));
}

#[tokio::test]
async fn replayed_result_runs_through_cascade() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recorded.json");
    std::fs::write(
        &path,
        r#"{"data": {"lines": [], "words": [{"text": "Hi"}, {"text": "a"}], "confidence": 45}}"#,
    )
    .unwrap();

    let service = OcrService::new(settings(), NoCapture, ReplayLoader::new(&path));
    let result = service.recognize_image(png(10, 10)).await.unwrap();
    assert_eq!(result, ExtractionResult::new(2, "Hi"));
}

#[tokio::test]
async fn concurrent_ocr_is_rejected_as_busy() {
    let gate = Arc::new(Notify::new());
    let mut loader = FixedLoader::new(Some(hello()));
    loader.engine.gate = Some(Arc::clone(&gate));
    let service = Arc::new(OcrService::new(settings(), NoCapture, loader));

    let first = tokio::spawn({
        let service = Arc::clone(&service);
        async move { service.recognize_image(png(20, 20)).await }
    });
    while !service.is_busy() {
        tokio::task::yield_now().await;
    }

    let err = service.recognize_image(png(20, 20)).await.unwrap_err();
    assert!(matches!(err, PipelineError::Busy));

    gate.notify_one();
    assert_eq!(first.await.unwrap().unwrap().text, "Hello");
    assert!(!service.is_busy());
}

#[tokio::test]
async fn protocol_requests_map_to_responses() {
    let service = OcrService::new(settings(), NoCapture, FixedLoader::new(Some(hello())));
    let page = PageContext::new();
    let mut surface = RecordingSurface::default();
    let (_tx, mut idle) = mpsc::channel(1);

    let pong = service
        .handle_json(r#"{"type": "ping"}"#, &page, &mut surface, &mut idle)
        .await;
    assert_eq!(pong, Response::pong());

    let missing = service
        .handle_json(
            r#"{"type": "ocr-data-url", "dataUrl": ""}"#,
            &page,
            &mut surface,
            &mut idle,
        )
        .await;
    assert_eq!(missing, Response::failure("No image data provided."));

    let garbage = service
        .handle_json("{", &page, &mut surface, &mut idle)
        .await;
    assert!(!garbage.ok);
    assert!(garbage.error.unwrap().starts_with("Invalid request"));

    use base64::Engine as _;
    let data_url = format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png(30, 30))
    );
    let request = serde_json::json!({"type": "ocr-data-url", "dataUrl": data_url}).to_string();
    let ok = service
        .handle_json(&request, &page, &mut surface, &mut idle)
        .await;
    assert_eq!(serde_json::to_value(ok).unwrap(), serde_json::json!({"ok": true, "lines": 1, "text": "Hello"}));
}

#[tokio::test]
async fn second_selection_on_busy_page_fails_fast() {
    let service = OcrService::new(settings(), NoCapture, FixedLoader::new(Some(hello())));
    let page = PageContext::new();
    let _active = page.acquire_overlay().unwrap();
    let mut surface = RecordingSurface::default();

    let response = service
        .handle_json(
            r#"{"type": "select-region"}"#,
            &page,
            &mut surface,
            &mut drag(0, 0, 100, 100),
        )
        .await;

    assert_eq!(
        response,
        Response::failure("A selection is already in progress on this page.")
    );
    assert_eq!(surface.attached, 0);
}

#[tokio::test(start_paused = true)]
async fn dropping_request_mid_drag_tears_down_overlay() {
    let service = OcrService::new(settings(), NoCapture, FixedLoader::new(Some(hello())));
    let page = PageContext::new();
    let mut surface = RecordingSurface::default();
    let (tx, mut input) = mpsc::channel(4);
    tx.send(InputEvent::PointerDown { x: 10, y: 10 })
        .await
        .unwrap();

    {
        let request = service.select_region(&page, None, None, &mut surface, &mut input);
        let mut request = std::pin::pin!(request);
        // Still waiting for the pointer to be released.
        assert!(
            tokio::time::timeout(Duration::from_millis(50), &mut request)
                .await
                .is_err()
        );
        assert!(page.is_overlay_active());
    }

    assert_eq!((surface.attached, surface.detached), (1, 1));
    assert_eq!(surface.drawn, vec![Rect::new(10, 10, 0, 0)]);
    assert!(!page.is_overlay_active());
    assert!(page.acquire_overlay().is_ok());
    drop(tx);
}
