pub mod language;
pub mod ocr;
pub mod orchestrator;
pub mod preprocess;
pub mod region;
pub mod sanitize;
pub mod types;

pub use language::detect_language;
pub use ocr::OcrWorkerPool;
pub use orchestrator::DocumentExtractor;
pub use sanitize::sanitize_extracted_text;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported format '{extension}', accepted: {accepted}")]
    UnsupportedFormat { extension: String, accepted: String },

    #[error("Corrupt document: {0}")]
    CorruptDocument(String),

    #[error("OCR engine unavailable: {0}")]
    OcrUnavailable(String),

    #[error("OCR processing failed: {0}")]
    OcrProcessing(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),
}
