use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckAiError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("setup error: {0}")]
    Setup(String),

    #[error("model fetch failed: {0}")]
    ModelFetch(String),

    #[error("image upload failed: {0}")]
    ImageUpload(String),

    #[error("check processing failed: {0}")]
    Processing(String),

    #[error("PDF generation failed: {0}")]
    PdfGeneration(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("folder not found: {0}")]
    FolderNotFound(String),

    #[error("no check images found: {0}")]
    NoImagesFound(String),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CheckAiError>;

impl CheckAiError {
    /// Step label under which the failure is surfaced to the user.
    pub fn step_label(&self) -> &'static str {
        match self {
            CheckAiError::Config(_) | CheckAiError::Setup(_) => "Setup",
            CheckAiError::ModelFetch(_) => "Model Fetch",
            CheckAiError::ImageUpload(_)
            | CheckAiError::FileNotFound(_)
            | CheckAiError::FolderNotFound(_)
            | CheckAiError::NoImagesFound(_) => "Image Upload",
            CheckAiError::Processing(_) | CheckAiError::JsonParse(_) | CheckAiError::Io(_) => {
                "Check Processing"
            }
            CheckAiError::PdfGeneration(_) => "PDF Generation",
        }
    }
}

/// Surfaced form of a pipeline failure. At most one is active per session;
/// the last error wins and a new operation clears it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingError {
    pub step: String,
    pub message: String,
}

impl From<&CheckAiError> for ProcessingError {
    fn from(err: &CheckAiError) -> Self {
        let message = match err {
            CheckAiError::Config(m)
            | CheckAiError::Setup(m)
            | CheckAiError::ModelFetch(m)
            | CheckAiError::ImageUpload(m)
            | CheckAiError::Processing(m)
            | CheckAiError::PdfGeneration(m)
            | CheckAiError::FileNotFound(m)
            | CheckAiError::FolderNotFound(m)
            | CheckAiError::NoImagesFound(m) => m.clone(),
            other => other.to_string(),
        };
        ProcessingError {
            step: err.step_label().to_string(),
            message,
        }
    }
}

impl std::fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.step, self.message)
    }
}

/// Heuristic classifier for errors caused by a misconfigured OCR toolchain
/// on the backend host. It matches on backend wording, so it stays a pure
/// function over normalized text and can be swapped for structured error
/// codes if the backend contract gains them.
pub fn classify_as_setup_issue(message: &str) -> bool {
    let m = message.to_lowercase();
    const TOOL_TERMS: [&str; 4] = ["tesseract", "easyocr", "pytesseract", "ocr tool"];
    TOOL_TERMS.iter().any(|term| m.contains(term))
        || (m.contains("setup") && m.contains("incomplete"))
}
