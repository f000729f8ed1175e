pub mod cascade;
pub mod clean;
pub mod engine;
pub mod recognizer;
pub mod replay;
pub mod types;

pub use cascade::{CascadeConfig, Tier, extract};
pub use clean::clean_text;
pub use engine::{OcrConfig, PaddleLoader, PaddleRecognizer};
pub use recognizer::{EngineLoader, OcrError, Progress, ProgressFn, Recognizer};
pub use replay::{ReplayLoader, ReplayRecognizer};
pub use types::*;
