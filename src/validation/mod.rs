//! Rule-based validation of mapped form data.

pub mod rules;
pub mod validator;

pub use rules::{RuleCategory, Severity, ValidationRule};
pub use validator::{
    DataQualityReport, FieldResult, ImprovementSuggestion, SuggestionKind, Validator, Violation,
};
