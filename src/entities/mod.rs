pub mod recognizer;
pub mod reference;
pub mod rules;
pub mod types;

pub use recognizer::EntityRecognizer;
pub use types::{EntityExtractionResult, EntityType, LegalEntity};
