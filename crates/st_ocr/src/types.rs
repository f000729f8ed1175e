use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Bounding box of a detected text region, in OCR-source pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundingBox {
    #[serde(deserialize_with = "null_as_default")]
    pub x0: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub y0: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub x1: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub y1: i32,
}

impl BoundingBox {
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.y1 - self.y0
    }
}

/// One recognized line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrLine {
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub bbox: BoundingBox,
}

/// One recognized word.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrWord {
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
}

/// Recognition payload. Every field may be missing or empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrData {
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
    /// Engine self-reported certainty, 0..=100.
    #[serde(deserialize_with = "null_as_default")]
    pub confidence: f32,
    #[serde(deserialize_with = "null_as_default")]
    pub lines: Vec<OcrLine>,
    #[serde(deserialize_with = "null_as_default")]
    pub words: Vec<OcrWord>,
}

/// Raw result as produced by an OCR engine (Tesseract-style `{ "data": { ... } }`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOcrResult {
    #[serde(default)]
    pub data: Option<OcrData>,
}

impl RawOcrResult {
    pub fn new(data: OcrData) -> Self {
        Self { data: Some(data) }
    }
}

/// Clean text extracted from one OCR request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Number of surviving lines (words for the word tier).
    #[serde(rename = "lines")]
    pub line_count: usize,
    pub text: String,
}

impl ExtractionResult {
    pub fn new(line_count: usize, text: impl Into<String>) -> Self {
        Self {
            line_count,
            text: text.into(),
        }
    }

    /// "No text detected".
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tesseract_shaped_json_deserializes_with_missing_fields() {
        let raw: RawOcrResult = serde_json::from_str(
            r#"{"data": {"confidence": 87.5, "lines": [{"text": "Hi", "bbox": {"x0": 1, "y0": 2, "x1": 30, "y1": 14}, "confidence": 90}], "paragraphs": []}}"#,
        )
        .unwrap();

        let data = raw.data.unwrap();
        assert_eq!(data.text, "");
        assert_eq!(data.confidence, 87.5);
        assert_eq!(data.lines[0].bbox.width(), 29);
        assert_eq!(data.lines[0].bbox.height(), 12);
        assert!(data.words.is_empty());
    }

    #[test]
    fn null_fields_read_as_empty() {
        let raw: RawOcrResult = serde_json::from_str(
            r#"{"data": {"text": null, "confidence": null, "lines": null, "words": null}}"#,
        )
        .unwrap();
        assert_eq!(raw.data.unwrap(), OcrData::default());

        let raw: RawOcrResult = serde_json::from_str(
            r#"{"data": {"text": "Hello world", "confidence": 50, "lines": [{"text": null, "bbox": null}], "words": [{"text": null}]}}"#,
        )
        .unwrap();
        let data = raw.data.unwrap();
        assert_eq!(data.text, "Hello world");
        assert_eq!(data.lines, vec![OcrLine::default()]);
        assert_eq!(data.words, vec![OcrWord::default()]);
    }

    #[test]
    fn missing_data_payload_is_none() {
        let raw: RawOcrResult = serde_json::from_str("{}").unwrap();
        assert!(raw.data.is_none());
    }

    #[test]
    fn extraction_result_serializes_line_count_as_lines() {
        let json = serde_json::to_value(ExtractionResult::new(2, "a\nb")).unwrap();
        assert_eq!(json, serde_json::json!({"lines": 2, "text": "a\nb"}));
    }
}
