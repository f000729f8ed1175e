//! ocr-rs (PaddleOCR) backend.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, anyhow};
use ocr_rs::OcrEngine;
use parking_lot::Mutex;
use st_capture::OcrSource;
use tracing::{debug, info};

use crate::recognizer::{EngineLoader, OcrError, Progress, ProgressFn, Recognizer};
use crate::types::{BoundingBox, OcrData, OcrLine, OcrWord, RawOcrResult};

/// Detection model, shared by all languages.
pub const DETECTION_MODEL: &str = "PP-OCRv5_mobile_det.mnn";

/// Blocks whose top edges are within this many pixels belong to the same line.
pub const LINE_MERGE_THRESHOLD: i32 = 20;

/// (id, display name, recognition model, charset)
const LANGUAGE_MODELS: [(&str, &str, &str, &str); 11] = [
    (
        "chinese",
        "简体中文",
        "PP-OCRv5_mobile_rec.mnn",
        "ppocr_keys_v5.txt",
    ),
    (
        "english",
        "English",
        "en_PP-OCRv5_mobile_rec_infer.mnn",
        "ppocr_keys_en.txt",
    ),
    (
        "korean",
        "한국어",
        "korean_PP-OCRv5_mobile_rec_infer.mnn",
        "ppocr_keys_korean.txt",
    ),
    (
        "arabic",
        "العربية",
        "arabic_PP-OCRv5_mobile_rec_infer.mnn",
        "ppocr_keys_arabic.txt",
    ),
    (
        "cyrillic",
        "Кириллица",
        "cyrillic_PP-OCRv5_mobile_rec_infer.mnn",
        "ppocr_keys_cyrillic.txt",
    ),
    (
        "devanagari",
        "देवनागरी",
        "devanagari_PP-OCRv5_mobile_rec_infer.mnn",
        "ppocr_keys_devanagari.txt",
    ),
    (
        "latin",
        "Latin",
        "latin_PP-OCRv5_mobile_rec_infer.mnn",
        "ppocr_keys_latin.txt",
    ),
    (
        "greek",
        "Ελληνικά",
        "el_PP-OCRv5_mobile_rec_infer.mnn",
        "ppocr_keys_el.txt",
    ),
    (
        "thai",
        "ไทย",
        "th_PP-OCRv5_mobile_rec_infer.mnn",
        "ppocr_keys_th.txt",
    ),
    (
        "tamil",
        "தமிழ்",
        "ta_PP-OCRv5_mobile_rec_infer.mnn",
        "ppocr_keys_ta.txt",
    ),
    (
        "telugu",
        "తెలుగు",
        "te_PP-OCRv5_mobile_rec_infer.mnn",
        "ppocr_keys_te.txt",
    ),
];

/// Installed recognition language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrLanguageInfo {
    /// Language identifier (e.g. "korean", "english").
    pub id: String,
    pub display_name: String,
    pub rec_model: String,
    pub charset_file: String,
}

/// Where the models live and which languages to prefer.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub models_dir: PathBuf,
    /// `+`-joined language hint, e.g. `"eng+kor+jpn"`.
    pub languages: String,
}

impl OcrConfig {
    pub fn new(models_dir: impl Into<PathBuf>, languages: impl Into<String>) -> Self {
        Self {
            models_dir: models_dir.into(),
            languages: languages.into(),
        }
    }
}

/// Resolved model files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub language: String,
    pub detection: PathBuf,
    pub recognition: PathBuf,
    pub charset: PathBuf,
}

/// Map a language code (Tesseract-style or a model id) to a model language id.
pub fn model_language_id(code: &str) -> Option<&'static str> {
    let id = match code.trim().to_ascii_lowercase().as_str() {
        "eng" | "english" => "english",
        "kor" | "korean" => "korean",
        // The v5 Chinese model also covers kana.
        "chi_sim" | "chi_tra" | "jpn" | "chinese" => "chinese",
        "ara" | "arabic" => "arabic",
        "rus" | "ukr" | "bel" | "bul" | "srp" | "cyrillic" => "cyrillic",
        "hin" | "mar" | "nep" | "devanagari" => "devanagari",
        "fra" | "deu" | "spa" | "ita" | "por" | "nld" | "lat" | "latin" => "latin",
        "ell" | "greek" => "greek",
        "tha" | "thai" => "thai",
        "tam" | "tamil" => "tamil",
        "tel" | "telugu" => "telugu",
        _ => return None,
    };
    Some(id)
}

/// Detect installed languages by inspecting the models directory.
pub fn get_available_languages(models_dir: &Path) -> Vec<OcrLanguageInfo> {
    LANGUAGE_MODELS
        .iter()
        .filter(|(_, _, rec_model, charset)| {
            models_dir.join(rec_model).exists() && models_dir.join(charset).exists()
        })
        .map(|(id, display_name, rec_model, charset)| OcrLanguageInfo {
            id: id.to_string(),
            display_name: display_name.to_string(),
            rec_model: rec_model.to_string(),
            charset_file: charset.to_string(),
        })
        .collect()
}

/// Pick the first installed language named by `hint`, else the first installed one.
pub fn resolve_language<'a>(
    hint: &str,
    available: &'a [OcrLanguageInfo],
) -> Option<&'a OcrLanguageInfo> {
    hint.split('+')
        .filter_map(model_language_id)
        .find_map(|id| available.iter().find(|l| l.id == id))
        .or_else(|| available.first())
}

/// Resolve and validate the model files for `config`.
pub fn get_model_paths(config: &OcrConfig) -> Result<ModelPaths> {
    let available = get_available_languages(&config.models_dir);
    let info = resolve_language(&config.languages, &available).ok_or_else(|| {
        anyhow!(
            "no OCR language models found in {}",
            config.models_dir.display()
        )
    })?;

    let detection = config.models_dir.join(DETECTION_MODEL);
    if !detection.exists() {
        return Err(anyhow!("detection model missing: {}", detection.display()));
    }

    Ok(ModelPaths {
        language: info.id.clone(),
        detection,
        recognition: config.models_dir.join(&info.rec_model),
        charset: config.models_dir.join(&info.charset_file),
    })
}

/// Whether model files exist for `config`.
pub fn models_exist(config: &OcrConfig) -> bool {
    get_model_paths(config).is_ok()
}

/// One detected text block, in source pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub text: String,
    /// 0.0..=1.0
    pub confidence: f32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Group blocks into reading-order lines and build a raw result.
///
/// Blocks whose top edges lie within `line_threshold` of a line's first block join that
/// line, ordered left to right. Words are the whitespace-separated tokens of each line.
pub fn raw_result_from_blocks(blocks: Vec<TextBlock>, line_threshold: i32) -> RawOcrResult {
    let mut blocks: Vec<TextBlock> = blocks
        .into_iter()
        .filter(|b| !b.text.trim().is_empty())
        .collect();
    blocks.sort_by_key(|b| b.y);

    let confidence = if blocks.is_empty() {
        0.0
    } else {
        blocks.iter().map(|b| b.confidence).sum::<f32>() / blocks.len() as f32 * 100.0
    };

    let mut grouped: Vec<Vec<TextBlock>> = Vec::new();
    for block in blocks {
        match grouped
            .iter_mut()
            .find(|line| (block.y - line[0].y).abs() <= line_threshold)
        {
            Some(line) => line.push(block),
            None => grouped.push(vec![block]),
        }
    }

    let mut lines = Vec::with_capacity(grouped.len());
    for mut line_blocks in grouped {
        line_blocks.sort_by_key(|b| b.x);

        let text = line_blocks
            .iter()
            .map(|b| b.text.trim())
            .collect::<Vec<_>>()
            .join(" ");
        let bbox = line_blocks.iter().fold(
            BoundingBox::new(i32::MAX, i32::MAX, i32::MIN, i32::MIN),
            |acc, b| BoundingBox {
                x0: acc.x0.min(b.x),
                y0: acc.y0.min(b.y),
                x1: acc.x1.max(b.x + b.width),
                y1: acc.y1.max(b.y + b.height),
            },
        );
        lines.push(OcrLine { text, bbox });
    }
    lines.sort_by_key(|l| l.bbox.y0);

    let words = lines
        .iter()
        .flat_map(|l| l.text.split_whitespace())
        .map(|w| OcrWord {
            text: w.to_string(),
        })
        .collect();
    let text = lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    RawOcrResult::new(OcrData {
        text,
        confidence,
        lines,
        words,
    })
}

/// Loads a [`PaddleRecognizer`] from the configured models directory.
#[derive(Debug, Clone)]
pub struct PaddleLoader {
    config: OcrConfig,
}

impl PaddleLoader {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }
}

impl EngineLoader for PaddleLoader {
    type Engine = PaddleRecognizer;

    fn load(&self) -> Result<PaddleRecognizer, OcrError> {
        let paths =
            get_model_paths(&self.config).map_err(|e| OcrError::EngineLoad(e.to_string()))?;

        let start = std::time::Instant::now();
        let engine = OcrEngine::new(&paths.detection, &paths.recognition, &paths.charset, None)
            .map_err(|e| OcrError::EngineLoad(e.to_string()))?;
        info!(
            "OCR engine ready ({}) in {:?}",
            paths.language,
            start.elapsed()
        );

        Ok(PaddleRecognizer {
            engine: Arc::new(Mutex::new(engine)),
            language: paths.language,
        })
    }
}

/// ocr-rs backed recognizer. Inference runs on the blocking pool.
pub struct PaddleRecognizer {
    engine: Arc<Mutex<OcrEngine>>,
    language: String,
}

impl PaddleRecognizer {
    /// Model language id this engine was loaded with.
    pub fn language(&self) -> &str {
        &self.language
    }
}

impl Recognizer for PaddleRecognizer {
    fn recognize(
        &self,
        source: &OcrSource,
        languages: &str,
        progress: ProgressFn<'_>,
    ) -> impl Future<Output = Result<Option<RawOcrResult>, OcrError>> + Send {
        let engine = Arc::clone(&self.engine);
        let bitmap = source.bitmap.clone();
        let loaded = self.language.clone();
        let requested = languages.to_string();

        async move {
            if !requested
                .split('+')
                .any(|code| model_language_id(code) == Some(loaded.as_str()))
            {
                debug!("Requested languages {requested:?} not loaded, using {loaded}");
            }

            progress(Progress::new(Progress::RECOGNIZING, 0.0));

            let blocks = tokio::task::spawn_blocking(move || {
                let engine = engine.lock();
                engine
                    .recognize(&bitmap)
                    .map(|results| {
                        results
                            .into_iter()
                            .map(|r| TextBlock {
                                text: r.text,
                                confidence: r.confidence,
                                x: r.bbox.rect.left(),
                                y: r.bbox.rect.top(),
                                width: r.bbox.rect.width() as i32,
                                height: r.bbox.rect.height() as i32,
                            })
                            .collect::<Vec<_>>()
                    })
                    .map_err(|e| e.to_string())
            })
            .await
            .map_err(|e| OcrError::Recognition(e.to_string()))?
            .map_err(OcrError::Recognition)?;

            progress(Progress::new(Progress::RECOGNIZING, 1.0));
            Ok(Some(raw_result_from_blocks(blocks, LINE_MERGE_THRESHOLD)))
        }
    }
}
