pub mod capture;
pub mod error;
pub mod protocol;
pub mod selection;
pub mod service;

pub use capture::{CaptureError, CaptureSource, FileCapture, HttpCapture, NoCapture};
pub use error::PipelineError;
pub use protocol::{Request, Response};
pub use selection::{LogSurface, OverlaySurface, run_selection};
pub use service::OcrService;
