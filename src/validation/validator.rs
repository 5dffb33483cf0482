//! Field validation and data quality reporting.
//!
//! Mapped values are checked against the rule table, against each other
//! (date ordering, territorial coherence) and against the recognized
//! entities. Violations down-weight the field confidence and feed an
//! aggregate quality score with actionable suggestions.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::rules::{self, RuleCategory, Severity, ValidationRule};
use crate::config::ValidationConfig;
use crate::confidence;
use crate::entities::{EntityExtractionResult, EntityType};
use crate::mapping::{FormSchema, MappingResult};

/// Confidence factor per violation severity.
const ERROR_FACTOR: f32 = 0.5;
const WARNING_FACTOR: f32 = 0.8;
const INFO_FACTOR: f32 = 0.95;

/// Score penalty per violation, with per-severity caps.
const ERROR_PENALTY: f32 = 10.0;
const ERROR_PENALTY_CAP: f32 = 30.0;
const WARNING_PENALTY: f32 = 5.0;
const WARNING_PENALTY_CAP: f32 = 20.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub rule_id: String,
    pub category: RuleCategory,
    pub severity: Severity,
    pub message: String,
    pub suggested_fix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldResult {
    pub field_id: String,
    pub value: String,
    /// False when any error-severity violation is present.
    pub valid: bool,
    pub violations: Vec<Violation>,
    /// Mapping confidence after violation down-weighting.
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Correction,
    Addition,
    Improvement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImprovementSuggestion {
    pub kind: SuggestionKind,
    /// 1 is most urgent.
    pub priority: u8,
    pub field_id: String,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataQualityReport {
    /// 0-100 composite of validity, completeness and conformity minus
    /// capped violation penalties.
    pub overall_score: f32,
    pub validity: f32,
    pub completeness: f32,
    pub conformity: f32,
    pub field_results: Vec<FieldResult>,
    pub suggestions: Vec<ImprovementSuggestion>,
}

pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate one field value against its keyword-selected rules.
    /// Deterministic: same id, value and confidence give the same result.
    pub fn validate_field(&self, field_id: &str, value: &str, conf: f32) -> FieldResult {
        let mut violations = Vec::new();
        for rule in rules::rules_for(field_id) {
            if !run_check(rule, value) {
                violations.push(violation_of(rule));
            }
        }
        self.finish_field(field_id, value, conf, violations)
    }

    /// Validate a mapping result: per-field rules, cross-field coherence
    /// and entity-backing checks, then the aggregate quality report.
    pub fn validate(
        &self,
        mapping: &MappingResult,
        schema: &FormSchema,
        entities: &EntityExtractionResult,
    ) -> DataQualityReport {
        let values: BTreeMap<&str, &str> = mapping
            .suggestions
            .iter()
            .map(|s| (s.field_id.as_str(), s.value.as_str()))
            .collect();

        let mut field_results = Vec::new();
        for suggestion in &mapping.suggestions {
            let mut result =
                self.validate_field(&suggestion.field_id, &suggestion.value, suggestion.confidence);
            let mut extra = cross_field_violations(&suggestion.field_id, &suggestion.value, &values);
            extra.extend(entity_backing_violations(
                &suggestion.field_id,
                &suggestion.value,
                entities,
            ));
            if !extra.is_empty() {
                result.violations.extend(extra);
                result = self.finish_field(
                    &suggestion.field_id,
                    &suggestion.value,
                    suggestion.confidence,
                    result.violations,
                );
            }
            field_results.push(result);
        }

        let report = self.build_report(field_results, mapping, schema);
        debug!(
            score = report.overall_score,
            fields = report.field_results.len(),
            suggestions = report.suggestions.len(),
            "Validation complete"
        );
        report
    }

    fn finish_field(
        &self,
        field_id: &str,
        value: &str,
        base_confidence: f32,
        violations: Vec<Violation>,
    ) -> FieldResult {
        let mut conf = base_confidence;
        for violation in &violations {
            let factor = match violation.severity {
                Severity::Error => ERROR_FACTOR,
                Severity::Warning => WARNING_FACTOR,
                Severity::Info => INFO_FACTOR,
            };
            conf = confidence::penalize(conf, factor, self.config.confidence_floor);
        }
        let valid = !violations.iter().any(|v| v.severity == Severity::Error);
        FieldResult {
            field_id: field_id.to_string(),
            value: value.to_string(),
            valid,
            violations,
            confidence: conf,
        }
    }

    fn build_report(
        &self,
        field_results: Vec<FieldResult>,
        mapping: &MappingResult,
        schema: &FormSchema,
    ) -> DataQualityReport {
        let total = field_results.len();
        let validity = percent(field_results.iter().filter(|f| f.valid).count(), total);
        let conformity = percent(
            field_results.iter().filter(|f| f.violations.is_empty()).count(),
            total,
        );

        let required: Vec<_> = schema.fields().filter(|f| f.required).collect();
        let present = required
            .iter()
            .filter(|f| mapping.suggestions.iter().any(|s| s.field_id == f.id))
            .count();
        let completeness = if required.is_empty() {
            100.0
        } else {
            percent(present, required.len())
        };

        let errors = count_severity(&field_results, Severity::Error);
        let warnings = count_severity(&field_results, Severity::Warning);
        let penalty = (errors as f32 * ERROR_PENALTY).min(ERROR_PENALTY_CAP)
            + (warnings as f32 * WARNING_PENALTY).min(WARNING_PENALTY_CAP);

        let overall_score =
            (0.4 * validity + 0.3 * completeness + 0.3 * conformity - penalty).clamp(0.0, 100.0);

        let suggestions = improvement_suggestions(&field_results, &required, mapping);

        DataQualityReport {
            overall_score,
            validity,
            completeness,
            conformity,
            field_results,
            suggestions,
        }
    }
}

/// Run one rule check, treating a panic inside it as a failed check.
fn run_check(rule: &ValidationRule, value: &str) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(|| (rule.check)(value))) {
        Ok(valid) => valid,
        Err(_) => {
            warn!(rule = rule.id, "Validation check panicked, treated as failure");
            false
        }
    }
}

fn violation_of(rule: &ValidationRule) -> Violation {
    Violation {
        rule_id: rule.id.to_string(),
        category: rule.category,
        severity: rule.severity,
        message: rule.message.to_string(),
        suggested_fix: rule.suggested_fix.to_string(),
    }
}

/// Date ordering and territorial coherence against sibling fields.
fn cross_field_violations(
    field_id: &str,
    value: &str,
    values: &BTreeMap<&str, &str>,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    let lower = field_id.to_lowercase();

    // Publication and end dates must not precede their start counterpart.
    let earlier_key = if lower.contains("publication") {
        Some("signature")
    } else if lower.contains("fin") {
        Some("debut")
    } else {
        None
    };
    if let Some(key) = earlier_key {
        let earlier = values
            .iter()
            .find(|(id, _)| id.to_lowercase().contains(key))
            .and_then(|(_, v)| parse_date(v));
        if let (Some(earlier), Some(later)) = (earlier, parse_date(value)) {
            if later < earlier {
                violations.push(Violation {
                    rule_id: "date_ordering".into(),
                    category: RuleCategory::Consistency,
                    severity: Severity::Error,
                    message: "La date précède la date de référence".into(),
                    suggested_fix: "Vérifier l'ordre chronologique des dates".into(),
                });
            }
        }
    }

    // A commune only makes sense inside a known wilaya.
    if lower.contains("commune") && !value.trim().is_empty() {
        let wilaya_present = values
            .iter()
            .any(|(id, v)| id.to_lowercase().contains("wilaya") && !v.trim().is_empty());
        if !wilaya_present {
            violations.push(Violation {
                rule_id: "commune_without_wilaya".into(),
                category: RuleCategory::Consistency,
                severity: Severity::Warning,
                message: "Commune renseignée sans wilaya de rattachement".into(),
                suggested_fix: "Renseigner la wilaya correspondante".into(),
            });
        }
    }

    violations
}

/// A name field should be backed by a recognized person entity.
fn entity_backing_violations(
    field_id: &str,
    value: &str,
    entities: &EntityExtractionResult,
) -> Vec<Violation> {
    let lower = field_id.to_lowercase();
    if !lower.contains("nom") && !lower.contains("personne") {
        return Vec::new();
    }
    let needle = value.trim().to_lowercase();
    let backed = entities.of_type(EntityType::Person).any(|e| {
        e.raw_text.to_lowercase().contains(&needle)
            || e.normalized_value.to_lowercase().contains(&needle)
    });
    if backed {
        Vec::new()
    } else {
        vec![Violation {
            rule_id: "person_not_recognized".into(),
            category: RuleCategory::Business,
            severity: Severity::Info,
            message: "Le nom ne correspond à aucune personne reconnue dans le texte".into(),
            suggested_fix: "Vérifier l'orthographe du nom dans le document source".into(),
        }]
    }
}

fn improvement_suggestions(
    field_results: &[FieldResult],
    required: &[&crate::mapping::FormField],
    mapping: &MappingResult,
) -> Vec<ImprovementSuggestion> {
    let mut suggestions = Vec::new();
    for result in field_results {
        for violation in &result.violations {
            let (kind, priority) = match violation.severity {
                Severity::Error => (SuggestionKind::Correction, 1),
                Severity::Warning => (SuggestionKind::Improvement, 3),
                Severity::Info => continue,
            };
            suggestions.push(ImprovementSuggestion {
                kind,
                priority,
                field_id: result.field_id.clone(),
                detail: violation.suggested_fix.clone(),
            });
        }
    }
    for field in required {
        let present = mapping.suggestions.iter().any(|s| s.field_id == field.id);
        if !present {
            suggestions.push(ImprovementSuggestion {
                kind: SuggestionKind::Addition,
                priority: 2,
                field_id: field.id.clone(),
                detail: format!("Renseigner le champ obligatoire '{}'", field.label),
            });
        }
    }
    suggestions.sort_by_key(|s| s.priority);
    suggestions
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%d/%m/%Y").ok()
}

fn percent(part: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        part as f32 / total as f32 * 100.0
    }
}

fn count_severity(field_results: &[FieldResult], severity: Severity) -> usize {
    field_results
        .iter()
        .flat_map(|f| f.violations.iter())
        .filter(|v| v.severity == severity)
        .count()
}
