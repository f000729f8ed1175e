use std::future::Future;
use std::path::Path;

use anyhow::{Context, Result, bail};
use st_app::{InputEvent, PageContext, Rect};
use st_host::{
    CaptureError, CaptureSource, FileCapture, HttpCapture, LogSurface, NoCapture, OcrService,
    Response,
};
use st_ocr::EngineLoader;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;

use crate::cli::Commands;

/// Capture source picked from the command line.
pub enum Capture {
    File(FileCapture),
    Http(HttpCapture),
    None(NoCapture),
}

impl Capture {
    pub fn for_command(command: &Commands, capture_url: Option<&str>) -> Self {
        match (command, capture_url) {
            (
                Commands::Region {
                    screenshot: Some(path),
                    ..
                },
                _,
            ) => Capture::File(FileCapture::new(path)),
            (_, Some(url)) => Capture::Http(HttpCapture::new(url)),
            _ => Capture::None(NoCapture),
        }
    }
}

impl CaptureSource for Capture {
    fn capture_viewport(&self) -> impl Future<Output = Result<Vec<u8>, CaptureError>> + Send {
        async move {
            match self {
                Capture::File(c) => c.capture_viewport().await,
                Capture::Http(c) => c.capture_viewport().await,
                Capture::None(c) => c.capture_viewport().await,
            }
        }
    }
}

/// Input channel replaying a drag over `rect`; closed when no rect is given.
fn drag_events(rect: Option<Rect>) -> mpsc::Receiver<InputEvent> {
    let (tx, rx) = mpsc::channel(4);
    if let Some(r) = rect {
        let events = [
            InputEvent::PointerDown {
                x: r.left,
                y: r.top,
            },
            InputEvent::PointerMove {
                x: r.left + r.width / 2,
                y: r.top + r.height / 2,
            },
            InputEvent::PointerUp {
                x: r.right(),
                y: r.bottom(),
            },
        ];
        for event in events {
            // Capacity covers every event.
            let _ = tx.try_send(event);
        }
    }
    rx
}

pub async fn run<C: CaptureSource, L: EngineLoader + 'static>(
    service: OcrService<C, L>,
    command: Commands,
) -> Result<Response> {
    let page = PageContext::new();
    let mut surface = LogSurface::default();

    let response = match command {
        Commands::Image { file } => {
            let bytes = read_file(&file).await?;
            service.recognize_image(bytes).await.into()
        }
        Commands::Region { rect, viewport, .. } => {
            let mut input = drag_events(Some(rect));
            service
                .select_region(&page, None, viewport, &mut surface, &mut input)
                .await
                .into()
        }
        Commands::Request { json, rect } => {
            let json = if json == "-" {
                let mut buf = String::new();
                tokio::io::stdin()
                    .read_to_string(&mut buf)
                    .await
                    .context("reading request from stdin")?;
                buf
            } else {
                json
            };
            let mut input = drag_events(rect);
            service
                .handle_json(&json, &page, &mut surface, &mut input)
                .await
        }
    };
    Ok(response)
}

async fn read_file(path: &Path) -> Result<Vec<u8>> {
    if !path.is_file() {
        bail!("image not found: {}", path.display());
    }
    tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}
