//! Bitmap decoding for captured and caller-supplied images.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;
use tracing::warn;

/// Upper bound for decoding a bitmap before it is treated as unusable.
pub const IMAGE_LOAD_TIMEOUT: Duration = Duration::from_millis(3000);

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("data URL is not base64 encoded")]
    NotBase64,
    #[error("invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Decode an image payload into encoded image bytes.
///
/// Accepts `data:image/...;base64,...` URLs and bare base64 strings.
pub fn decode_image_payload(payload: &str) -> Result<Vec<u8>, PayloadError> {
    let payload = payload.trim();

    let body = match payload.strip_prefix("data:") {
        Some(rest) => {
            let (header, body) = rest.split_once(',').ok_or(PayloadError::NotBase64)?;
            if !header.ends_with(";base64") {
                return Err(PayloadError::NotBase64);
            }
            body
        }
        None => payload,
    };

    Ok(STANDARD.decode(body)?)
}

/// Decode encoded image bytes (PNG, JPEG, ...).
pub fn decode_bitmap(bytes: &[u8]) -> Result<DynamicImage, image::ImageError> {
    image::load_from_memory(bytes)
}

/// Decode `bytes` off the async executor, giving up after `timeout`.
///
/// Returns `None` when the bitmap is unusable (decode error or timeout); callers treat that
/// as "nothing to recognize" rather than as a failure.
pub async fn load_bitmap(bytes: Vec<u8>, timeout: Duration) -> Option<DynamicImage> {
    if bytes.is_empty() {
        warn!("Bitmap load skipped: no image data");
        return None;
    }

    load_with(move || decode_bitmap(&bytes), timeout).await
}

async fn load_with<F>(decode: F, timeout: Duration) -> Option<DynamicImage>
where
    F: FnOnce() -> Result<DynamicImage, image::ImageError> + Send + 'static,
{
    let decode = tokio::task::spawn_blocking(decode);
    match tokio::time::timeout(timeout, decode).await {
        Ok(Ok(Ok(bitmap))) => Some(bitmap),
        Ok(Ok(Err(e))) => {
            warn!("Bitmap decode failed: {e}");
            None
        }
        Ok(Err(e)) => {
            warn!("Bitmap decode task failed: {e}");
            None
        }
        Err(_) => {
            warn!("Bitmap load timed out after {:?}", timeout);
            None
        }
    }
}
