//! Three-tier extraction of clean text from a raw OCR result.
//!
//! 1. **Lines**: non-empty lines whose bbox is at least `min_line_size` on both axes.
//! 2. **Words**: only when tier 1 is empty and confidence exceeds the threshold.
//! 3. **Full text**: the engine's free-form text, passed through [`clean_text`].
//!
//! The first tier yielding non-empty text wins. Finding nothing is a valid, empty result.

use tracing::{debug, info};

use crate::clean::clean_text;
use crate::recognizer::OcrError;
use crate::types::{ExtractionResult, OcrData, RawOcrResult};

/// Minimum bbox width/height (px) for a line to count as real text.
pub const MIN_LINE_SIZE: i32 = 5;

/// Word tier is only consulted above this confidence.
pub const WORD_TIER_MIN_CONFIDENCE: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeConfig {
    pub min_line_size: i32,
    pub word_tier_min_confidence: f32,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            min_line_size: MIN_LINE_SIZE,
            word_tier_min_confidence: WORD_TIER_MIN_CONFIDENCE,
        }
    }
}

/// Which tier produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Lines,
    Words,
    FullText,
}

/// Run the cascade over a raw result.
///
/// Fails with [`OcrError::NoData`] only when the result carries no payload at all.
pub fn extract(raw: &RawOcrResult, config: &CascadeConfig) -> Result<ExtractionResult, OcrError> {
    let data = raw.data.as_ref().ok_or(OcrError::NoData)?;

    debug!(
        confidence = data.confidence,
        lines = data.lines.len(),
        words = data.words.len(),
        text_len = data.text.len(),
        "OCR result structure"
    );

    match extract_with_tier(data, config) {
        Some((tier, result)) => {
            info!(?tier, lines = result.line_count, "Extracted OCR text");
            Ok(result)
        }
        None => {
            info!("OCR found no text");
            Ok(ExtractionResult::empty())
        }
    }
}

/// Run the cascade and report the winning tier; `None` when every tier is empty.
pub fn extract_with_tier(
    data: &OcrData,
    config: &CascadeConfig,
) -> Option<(Tier, ExtractionResult)> {
    line_tier(data, config.min_line_size)
        .map(|r| (Tier::Lines, r))
        .or_else(|| {
            (data.confidence > config.word_tier_min_confidence)
                .then(|| word_tier(data))
                .flatten()
                .map(|r| (Tier::Words, r))
        })
        .or_else(|| full_text_tier(data).map(|r| (Tier::FullText, r)))
}

fn line_tier(data: &OcrData, min_size: i32) -> Option<ExtractionResult> {
    let lines: Vec<&str> = data
        .lines
        .iter()
        .filter(|line| !line.text.trim().is_empty())
        .filter(|line| line.bbox.width() >= min_size && line.bbox.height() >= min_size)
        .map(|line| line.text.trim())
        .collect();

    if lines.is_empty() {
        return None;
    }
    Some(ExtractionResult::new(lines.len(), lines.join("\n")))
}

fn word_tier(data: &OcrData) -> Option<ExtractionResult> {
    let words: Vec<&str> = data
        .words
        .iter()
        .map(|word| word.text.trim())
        .filter(|text| !text.is_empty())
        .collect();

    let text = words
        .iter()
        .copied()
        .filter(|text| text.chars().count() > 1)
        .collect::<Vec<_>>()
        .join(" ");

    if text.is_empty() {
        return None;
    }
    // Counts every non-empty word, including the single-character ones left out of `text`.
    Some(ExtractionResult::new(words.len(), text))
}

fn full_text_tier(data: &OcrData) -> Option<ExtractionResult> {
    let text = clean_text(data.text.trim());
    if text.is_empty() {
        return None;
    }
    let line_count = text.split('\n').filter(|l| !l.trim().is_empty()).count();
    Some(ExtractionResult::new(line_count, text))
}
