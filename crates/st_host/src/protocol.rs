//! JSON request/response messages exchanged with the page host.

use serde::{Deserialize, Serialize};
use st_capture::Viewport;
use st_ocr::ExtractionResult;

use crate::error::PipelineError;

/// Requests, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Request {
    Ping,
    /// Let the user select a region, then OCR it.
    #[serde(rename_all = "camelCase")]
    SelectRegion {
        /// Pre-captured viewport bitmap; the capture source is used when absent.
        #[serde(default)]
        screenshot_data_url: Option<String>,
        /// Viewport the selection is expressed in; the bitmap size when absent.
        #[serde(default)]
        viewport: Option<ViewportSize>,
    },
    /// OCR a whole image.
    #[serde(rename_all = "camelCase")]
    OcrDataUrl {
        #[serde(default)]
        data_url: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl From<ViewportSize> for Viewport {
    fn from(size: ViewportSize) -> Self {
        Viewport::new(size.width, size.height)
    }
}

/// `{ok: true, lines, text}` on success, `{ok: false, error}` on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn pong() -> Self {
        Self {
            ok: true,
            lines: None,
            text: None,
            error: None,
        }
    }

    pub fn success(result: ExtractionResult) -> Self {
        Self {
            ok: true,
            lines: Some(result.line_count),
            text: Some(result.text),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            lines: None,
            text: None,
            error: Some(message.into()),
        }
    }
}

impl From<Result<ExtractionResult, PipelineError>> for Response {
    fn from(result: Result<ExtractionResult, PipelineError>) -> Self {
        match result {
            Ok(result) => Response::success(result),
            Err(e) => Response::failure(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn requests_parse_by_type_tag() {
        let ping: Request = serde_json::from_value(json!({"type": "ping"})).unwrap();
        assert_eq!(ping, Request::Ping);

        let select: Request = serde_json::from_value(json!({
            "type": "select-region",
            "screenshotDataUrl": "data:image/png;base64,AAAA",
            "viewport": {"width": 1280, "height": 720}
        }))
        .unwrap();
        assert_eq!(
            select,
            Request::SelectRegion {
                screenshot_data_url: Some("data:image/png;base64,AAAA".into()),
                viewport: Some(ViewportSize {
                    width: 1280,
                    height: 720
                }),
            }
        );

        let bare: Request = serde_json::from_value(json!({"type": "select-region"})).unwrap();
        assert_eq!(
            bare,
            Request::SelectRegion {
                screenshot_data_url: None,
                viewport: None
            }
        );

        let ocr: Request = serde_json::from_value(json!({"type": "ocr-data-url"})).unwrap();
        assert_eq!(
            ocr,
            Request::OcrDataUrl {
                data_url: String::new()
            }
        );

        assert!(serde_json::from_value::<Request>(json!({"type": "translate"})).is_err());
    }

    #[test]
    fn responses_serialize_flat() {
        let ok = serde_json::to_value(Response::success(ExtractionResult::new(2, "Hi"))).unwrap();
        assert_eq!(ok, json!({"ok": true, "lines": 2, "text": "Hi"}));

        let empty = serde_json::to_value(Response::success(ExtractionResult::empty())).unwrap();
        assert_eq!(empty, json!({"ok": true, "lines": 0, "text": ""}));

        let err = serde_json::to_value(Response::from(Err(PipelineError::SelectionTooSmall)))
            .unwrap();
        assert_eq!(err, json!({"ok": false, "error": "Selection too small."}));

        assert_eq!(serde_json::to_value(Response::pong()).unwrap(), json!({"ok": true}));
    }
}
