//! Viewport capture capability.
//!
//! A [`CaptureSource`] produces the encoded bitmap (PNG, JPEG, ...) of the visible viewport.
//! The pipeline only ever calls it through [`capture_with_timeout`].

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::PipelineError;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("{0}")]
    Unavailable(String),
    #[error("could not read screenshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("screenshot request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("screenshot request returned HTTP {0}")]
    Status(u16),
}

/// Host capability that rasterizes the current viewport.
pub trait CaptureSource: Send + Sync {
    fn capture_viewport(&self) -> impl Future<Output = Result<Vec<u8>, CaptureError>> + Send;
}

/// Capture with an upper bound; exceeding it is [`PipelineError::CaptureTimeout`].
pub async fn capture_with_timeout<C: CaptureSource>(
    source: &C,
    timeout: Duration,
) -> Result<Vec<u8>, PipelineError> {
    match tokio::time::timeout(timeout, source.capture_viewport()).await {
        Ok(Ok(bytes)) => {
            debug!("Captured viewport ({} bytes)", bytes.len());
            Ok(bytes)
        }
        Ok(Err(e)) => {
            warn!("Viewport capture failed: {e}");
            Err(e.into())
        }
        Err(_) => {
            warn!("Viewport capture timed out after {:?}", timeout);
            Err(PipelineError::CaptureTimeout)
        }
    }
}

/// Reads an existing screenshot from disk.
#[derive(Debug, Clone)]
pub struct FileCapture {
    path: PathBuf,
}

impl FileCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CaptureSource for FileCapture {
    fn capture_viewport(&self) -> impl Future<Output = Result<Vec<u8>, CaptureError>> + Send {
        let path = self.path.clone();
        async move { Ok(tokio::fs::read(&path).await?) }
    }
}

/// Fetches a screenshot over HTTP (e.g. from a browser-side relay).
#[derive(Debug, Clone)]
pub struct HttpCapture {
    client: reqwest::Client,
    url: String,
}

impl HttpCapture {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl CaptureSource for HttpCapture {
    fn capture_viewport(&self) -> impl Future<Output = Result<Vec<u8>, CaptureError>> + Send {
        let request = self.client.get(&self.url);
        async move {
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(CaptureError::Status(status.as_u16()));
            }
            Ok(response.bytes().await?.to_vec())
        }
    }
}

/// Capture source for hosts that always supply the bitmap themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapture;

impl CaptureSource for NoCapture {
    fn capture_viewport(&self) -> impl Future<Output = Result<Vec<u8>, CaptureError>> + Send {
        std::future::ready(Err(CaptureError::Unavailable(
            "no capture source configured".to_string(),
        )))
    }
}
