//! Extraction and structuring of Algerian legal documents.
//!
//! The pipeline goes scanned page -> geometry (lines, borders, columns,
//! tables) -> OCR -> entities -> relationships -> form mapping ->
//! validation, with every confidence combined through [`confidence`].

pub mod confidence;
pub mod config;
pub mod entities;
pub mod extraction;
pub mod geometry;
pub mod jobs;
pub mod mapping;
pub mod relations;
pub mod validation;

use tracing_subscriber::EnvFilter;

pub use config::ExtractionConfig;
pub use entities::{EntityExtractionResult, EntityRecognizer, EntityType, LegalEntity};
pub use extraction::{DocumentExtractor, ExtractedDocument, ExtractionError, PageResult};
pub use mapping::{FormMapper, FormSchema, MappingHistory, MappingResult};
pub use relations::{LegalRelationship, RelationAnalyzer};
pub use validation::{DataQualityReport, Validator};

/// Install the global tracing subscriber. Intended for embedding
/// binaries; repeated calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
