//! Mapping extracted content onto administrative form schemas.

pub mod history;
pub mod mapper;
pub mod schema;

use thiserror::Error;

pub use history::{FeedbackRecord, MappingHistory};
pub use mapper::{
    AlternativeValue, AmbiguousField, FieldSuggestion, FormMapper, MappingResult,
    MappingStrategy,
};
pub use schema::{BuiltinSchemas, FieldType, FormField, FormSchema, FormSection, SchemaProvider};

#[derive(Error, Debug)]
pub enum MappingError {
    #[error("No usable data to map: {0}")]
    DataMissing(String),
}
