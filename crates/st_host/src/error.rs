use st_app::{CancelReason, OverlayBusy};
use st_capture::OutOfBounds;
use st_ocr::OcrError;

use crate::capture::CaptureError;

/// Every way a region-select or image OCR request can fail.
///
/// `Display` is the user-facing message returned in protocol responses.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Selection canceled.")]
    SelectionCancelled,
    #[error("Selection too small.")]
    SelectionTooSmall,
    #[error("A selection is already in progress on this page.")]
    SelectionAlreadyActive,
    #[error("Capture timed out.")]
    CaptureTimeout,
    #[error("Capture failed: {0}")]
    CaptureFailed(String),
    #[error("Selection is out of bounds.")]
    CaptureOutOfBounds,
    #[error("OCR engine failed to load: {0}")]
    OcrEngineLoadFailure(String),
    #[error("OCR failed: {0}")]
    OcrFailed(String),
    #[error("OCR returned no data.")]
    OcrNoData,
    #[error("No image data provided.")]
    NoImageData,
    #[error("OCR is already running.")]
    Busy,
}

impl From<CancelReason> for PipelineError {
    fn from(reason: CancelReason) -> Self {
        match reason {
            CancelReason::Canceled => PipelineError::SelectionCancelled,
            CancelReason::TooSmall => PipelineError::SelectionTooSmall,
        }
    }
}

impl From<OverlayBusy> for PipelineError {
    fn from(_: OverlayBusy) -> Self {
        PipelineError::SelectionAlreadyActive
    }
}

impl From<OutOfBounds> for PipelineError {
    fn from(_: OutOfBounds) -> Self {
        PipelineError::CaptureOutOfBounds
    }
}

impl From<CaptureError> for PipelineError {
    fn from(error: CaptureError) -> Self {
        PipelineError::CaptureFailed(error.to_string())
    }
}

impl From<OcrError> for PipelineError {
    fn from(error: OcrError) -> Self {
        match error {
            OcrError::EngineLoad(msg) => PipelineError::OcrEngineLoadFailure(msg),
            OcrError::Recognition(msg) => PipelineError::OcrFailed(msg),
            OcrError::NoData => PipelineError::OcrNoData,
        }
    }
}
