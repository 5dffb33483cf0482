//! Five-strategy field mapper.
//!
//! Candidates for every schema field come from direct "label: value"
//! lines, recognized entities (generic, legal instrument, and procedural
//! reference), and the feedback history. Candidates agreeing on a value
//! merge, and agreement across strategies only ever raises confidence.
//! Fields whose best candidate stays below the confidence threshold are
//! reported as ambiguous for review instead of being silently filled.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::history::MappingHistory;
use super::schema::{FormField, FormSchema};
use super::MappingError;
use crate::config::MappingConfig;
use crate::confidence;
use crate::entities::{EntityExtractionResult, EntityType};

/// Confidence for a value found on a "label: value" line.
const DIRECT_TEXT_CONFIDENCE: f32 = 0.75;

/// Bonus per additional agreeing strategy.
const AGREEMENT_BONUS: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingStrategy {
    DirectText,
    Entity,
    LegalPattern,
    ProcedurePattern,
    Learned,
}

/// A runner-up value kept alongside a confident primary suggestion so a
/// reviewer can swap without re-running the mapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternativeValue {
    pub value: String,
    pub confidence: f32,
    pub justification: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSuggestion {
    pub field_id: String,
    pub value: String,
    pub confidence: f32,
    pub strategies: Vec<MappingStrategy>,
    pub justification: String,
    /// Next-best values, at most `max_alternatives`, best first.
    pub alternatives: Vec<AlternativeValue>,
}

/// A field whose candidates all fell below the confidence threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmbiguousField {
    pub field_id: String,
    /// Best first, at most `max_alternatives`.
    pub candidates: Vec<FieldSuggestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingResult {
    pub suggestions: Vec<FieldSuggestion>,
    /// Percentage of schema fields with an accepted suggestion.
    pub completeness: f32,
    pub overall_confidence: f32,
    pub unmapped_fields: Vec<String>,
    pub ambiguous_fields: Vec<AmbiguousField>,
}

pub struct FormMapper {
    config: MappingConfig,
}

impl FormMapper {
    pub fn new(config: MappingConfig) -> Self {
        Self { config }
    }

    pub fn map(
        &self,
        text: &str,
        entities: &EntityExtractionResult,
        schema: &FormSchema,
        history: &MappingHistory,
    ) -> Result<MappingResult, MappingError> {
        if text.trim().is_empty() && entities.entities.is_empty() {
            return Err(MappingError::DataMissing(
                "empty text and no recognized entities".into(),
            ));
        }

        let mut suggestions = Vec::new();
        let mut unmapped_fields = Vec::new();
        let mut ambiguous_fields = Vec::new();

        for field in schema.fields() {
            let mut candidates = self.collect_candidates(field, text, entities, history);
            if candidates.is_empty() {
                unmapped_fields.push(field.id.clone());
                continue;
            }

            candidates = merge_agreeing(candidates);
            if candidates[0].confidence >= self.config.confidence_threshold {
                let mut primary = candidates.remove(0);
                primary.alternatives = candidates
                    .into_iter()
                    .take(self.config.max_alternatives)
                    .map(|c| AlternativeValue {
                        value: c.value,
                        confidence: c.confidence,
                        justification: c.justification,
                    })
                    .collect();
                suggestions.push(primary);
            } else {
                candidates.truncate(self.config.max_alternatives);
                ambiguous_fields.push(AmbiguousField {
                    field_id: field.id.clone(),
                    candidates,
                });
            }
        }

        let total = schema.field_count();
        let completeness = if total == 0 {
            0.0
        } else {
            suggestions.len() as f32 / total as f32 * 100.0
        };
        let overall_confidence = confidence::mean(
            &suggestions.iter().map(|s| s.confidence).collect::<Vec<_>>(),
        );

        debug!(
            mapped = suggestions.len(),
            ambiguous = ambiguous_fields.len(),
            unmapped = unmapped_fields.len(),
            "Form mapping complete"
        );

        Ok(MappingResult {
            suggestions,
            completeness,
            overall_confidence,
            unmapped_fields,
            ambiguous_fields,
        })
    }

    fn collect_candidates(
        &self,
        field: &FormField,
        text: &str,
        entities: &EntityExtractionResult,
        history: &MappingHistory,
    ) -> Vec<FieldSuggestion> {
        let mut candidates = direct_text_candidates(field, text);
        candidates.extend(entity_candidates(field, entities));
        if let Some((value, conf)) =
            history.suggest(&field.id, text, self.config.similarity_threshold)
        {
            candidates.push(FieldSuggestion {
                field_id: field.id.clone(),
                value,
                confidence: conf,
                strategies: vec![MappingStrategy::Learned],
                justification: "accepted on a similar document".into(),
                alternatives: Vec::new(),
            });
        }
        candidates
    }
}

/// Scan for "label: value" lines using the field label and synonyms.
fn direct_text_candidates(field: &FormField, text: &str) -> Vec<FieldSuggestion> {
    let mut keys: Vec<&str> = vec![field.label.as_str()];
    keys.extend(field.synonyms.iter().map(String::as_str));

    let mut candidates = Vec::new();
    for line in text.lines() {
        for key in &keys {
            let Some(rest) = strip_prefix_ci(line.trim_start(), key) else {
                continue;
            };
            let value = rest.trim_start_matches([':', '-', ' ', '\t']).trim();
            if !value.is_empty() {
                candidates.push(FieldSuggestion {
                    field_id: field.id.clone(),
                    value: value.to_string(),
                    confidence: DIRECT_TEXT_CONFIDENCE,
                    strategies: vec![MappingStrategy::DirectText],
                    justification: format!("line labelled '{key}'"),
                    alternatives: Vec::new(),
                });
            }
        }
    }
    candidates
}

/// Candidates from recognized entities matching the field's entity type.
/// A field wanting any instrument accepts all instrument entity types.
fn entity_candidates(
    field: &FormField,
    entities: &EntityExtractionResult,
) -> Vec<FieldSuggestion> {
    let Some(wanted) = field.entity_type else {
        return Vec::new();
    };

    entities
        .entities
        .iter()
        .filter(|e| {
            e.entity_type == wanted
                || (is_instrument(wanted) && is_instrument(e.entity_type))
        })
        .map(|e| FieldSuggestion {
            field_id: field.id.clone(),
            value: e.normalized_value.clone(),
            confidence: e.confidence,
            strategies: vec![strategy_for(e.entity_type)],
            justification: format!("{} entity '{}'", e.entity_type.label(), e.raw_text),
            alternatives: Vec::new(),
        })
        .collect()
}

fn is_instrument(entity_type: EntityType) -> bool {
    matches!(
        entity_type,
        EntityType::Law
            | EntityType::Decree
            | EntityType::Arrete
            | EntityType::Ordonnance
            | EntityType::Circulaire
    )
}

fn strategy_for(entity_type: EntityType) -> MappingStrategy {
    if is_instrument(entity_type) {
        MappingStrategy::LegalPattern
    } else if matches!(
        entity_type,
        EntityType::Reference
            | EntityType::ProcedureStep
            | EntityType::RequiredDocument
            | EntityType::Deadline
            | EntityType::Cost
            | EntityType::Contact
    ) {
        MappingStrategy::ProcedurePattern
    } else {
        MappingStrategy::Entity
    }
}

/// Merge candidates agreeing on a value: union of strategies, max
/// confidence plus a small bonus per extra strategy. Sorted best first
/// with a value tie-break for determinism.
fn merge_agreeing(candidates: Vec<FieldSuggestion>) -> Vec<FieldSuggestion> {
    let mut merged: Vec<FieldSuggestion> = Vec::new();
    for candidate in candidates {
        let key = candidate.value.trim().to_lowercase();
        if let Some(existing) = merged
            .iter_mut()
            .find(|m| m.value.trim().to_lowercase() == key)
        {
            if !existing.strategies.contains(&candidate.strategies[0]) {
                existing.strategies.push(candidate.strategies[0]);
            }
            existing.confidence = existing.confidence.max(candidate.confidence);
            existing.justification.push_str("; ");
            existing.justification.push_str(&candidate.justification);
        } else {
            merged.push(candidate);
        }
    }

    for suggestion in &mut merged {
        suggestion.strategies.sort();
        let extra = suggestion.strategies.len().saturating_sub(1) as f32;
        suggestion.confidence =
            confidence::bonus(suggestion.confidence, AGREEMENT_BONUS * extra);
    }

    merged.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.value.cmp(&b.value))
    });
    merged
}

/// Case-insensitive prefix strip preserving the original tail.
fn strip_prefix_ci<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let mut line_chars = line.char_indices();
    let mut key_chars = key.chars();
    loop {
        let Some(kc) = key_chars.next() else {
            return match line_chars.next() {
                Some((i, _)) => Some(&line[i..]),
                None => Some(""),
            };
        };
        let (_, lc) = line_chars.next()?;
        if !lc.to_lowercase().eq(kc.to_lowercase()) {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{EntityRecognizer, LegalEntity};
    use crate::mapping::schema::{BuiltinSchemas, SchemaProvider};
    use crate::mapping::history::FeedbackRecord;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn mapper() -> FormMapper {
        FormMapper::new(MappingConfig::default())
    }

    fn recognize(text: &str) -> EntityExtractionResult {
        EntityRecognizer::new(Default::default()).recognize(text)
    }

    fn entity(entity_type: EntityType, value: &str, conf: f32) -> LegalEntity {
        LegalEntity {
            id: Uuid::new_v4(),
            entity_type,
            raw_text: value.to_string(),
            normalized_value: value.to_string(),
            confidence: conf,
            span: (0, value.len()),
            context: String::new(),
            links: Vec::new(),
        }
    }

    fn result_of(entities: Vec<LegalEntity>) -> EntityExtractionResult {
        let overall = confidence::mean(
            &entities.iter().map(|e| e.confidence).collect::<Vec<_>>(),
        );
        EntityExtractionResult { entities, counts: BTreeMap::new(), overall_confidence: overall }
    }

    #[test]
    fn decree_text_maps_number_and_date() {
        let text = "Vu le décret exécutif n° 21-92 du 1er mars 2021 portant organisation";
        let entities = recognize(text);
        let schema = BuiltinSchemas.schema_for("décret");
        let result = mapper()
            .map(text, &entities, &schema, &MappingHistory::new(10))
            .unwrap();

        let numero = result.suggestions.iter().find(|s| s.field_id == "numero").unwrap();
        assert_eq!(numero.value, "21-92");
        assert!(numero.strategies.contains(&MappingStrategy::LegalPattern));

        let date = result
            .suggestions
            .iter()
            .find(|s| s.field_id == "date_signature")
            .unwrap();
        assert_eq!(date.value, "01/03/2021");

        assert!(result.unmapped_fields.contains(&"wilaya".to_string()));
        assert!(result.completeness > 0.0 && result.completeness <= 100.0);
    }

    #[test]
    fn empty_input_is_data_missing() {
        let schema = BuiltinSchemas.schema_for("décret");
        let result = mapper().map(
            "   ",
            &result_of(vec![]),
            &schema,
            &MappingHistory::new(10),
        );
        assert!(matches!(result, Err(MappingError::DataMissing(_))));
    }

    #[test]
    fn agreeing_strategies_merge_and_boost() {
        let text = "Numéro: 21-92\nsuite du texte";
        let entities = result_of(vec![entity(EntityType::Decree, "21-92", 0.8)]);
        let schema = BuiltinSchemas.schema_for("décret");
        let result = mapper()
            .map(text, &entities, &schema, &MappingHistory::new(10))
            .unwrap();

        let numero = result.suggestions.iter().find(|s| s.field_id == "numero").unwrap();
        assert_eq!(numero.strategies.len(), 2);
        assert!(numero.strategies.contains(&MappingStrategy::DirectText));
        assert!(numero.strategies.contains(&MappingStrategy::LegalPattern));
        // max(0.75, 0.8) + one agreement bonus
        assert!((numero.confidence - 0.85).abs() < 1e-6);
    }

    #[test]
    fn extra_strategy_never_lowers_confidence() {
        let schema = BuiltinSchemas.schema_for("décret");
        let entities = result_of(vec![entity(EntityType::Decree, "21-92", 0.8)]);

        let alone = mapper()
            .map("texte sans étiquette", &entities, &schema, &MappingHistory::new(10))
            .unwrap();
        let with_label = mapper()
            .map("Numéro: 21-92", &entities, &schema, &MappingHistory::new(10))
            .unwrap();

        let conf = |r: &MappingResult| {
            r.suggestions
                .iter()
                .find(|s| s.field_id == "numero")
                .unwrap()
                .confidence
        };
        assert!(conf(&with_label) >= conf(&alone));
    }

    #[test]
    fn low_confidence_candidates_become_ambiguous() {
        let entities = result_of(vec![
            entity(EntityType::Wilaya, "Alger", 0.5),
            entity(EntityType::Wilaya, "Oran", 0.55),
        ]);
        let schema = BuiltinSchemas.schema_for("décret");
        let result = mapper()
            .map("texte", &entities, &schema, &MappingHistory::new(10))
            .unwrap();

        let ambiguous = result
            .ambiguous_fields
            .iter()
            .find(|a| a.field_id == "wilaya")
            .unwrap();
        assert_eq!(ambiguous.candidates.len(), 2);
        assert!(ambiguous.candidates[0].confidence >= ambiguous.candidates[1].confidence);
        assert!(!result.suggestions.iter().any(|s| s.field_id == "wilaya"));
    }

    #[test]
    fn ambiguous_candidates_respect_max_alternatives() {
        let entities = result_of(
            (0..6)
                .map(|i| entity(EntityType::Wilaya, &format!("W{i}"), 0.5))
                .collect(),
        );
        let schema = BuiltinSchemas.schema_for("décret");
        let result = mapper()
            .map("texte", &entities, &schema, &MappingHistory::new(10))
            .unwrap();
        let ambiguous = result
            .ambiguous_fields
            .iter()
            .find(|a| a.field_id == "wilaya")
            .unwrap();
        assert_eq!(ambiguous.candidates.len(), MappingConfig::default().max_alternatives);
    }

    #[test]
    fn confident_primary_keeps_runner_ups_as_alternatives() {
        let entities = result_of(vec![
            entity(EntityType::Wilaya, "Alger", 0.85),
            entity(EntityType::Wilaya, "Oran", 0.7),
        ]);
        let schema = BuiltinSchemas.schema_for("décret");
        let result = mapper()
            .map("texte", &entities, &schema, &MappingHistory::new(10))
            .unwrap();

        let wilaya = result.suggestions.iter().find(|s| s.field_id == "wilaya").unwrap();
        assert_eq!(wilaya.value, "Alger");
        assert_eq!(wilaya.alternatives.len(), 1);
        assert_eq!(wilaya.alternatives[0].value, "Oran");
        assert!(wilaya.alternatives[0].confidence <= wilaya.confidence);
    }

    #[test]
    fn alternatives_are_capped_at_max_alternatives() {
        let mut pool = vec![entity(EntityType::Wilaya, "Alger", 0.9)];
        pool.extend((0..6).map(|i| entity(EntityType::Wilaya, &format!("W{i}"), 0.5)));
        let schema = BuiltinSchemas.schema_for("décret");
        let result = mapper()
            .map("texte", &result_of(pool), &schema, &MappingHistory::new(10))
            .unwrap();
        let wilaya = result.suggestions.iter().find(|s| s.field_id == "wilaya").unwrap();
        assert_eq!(wilaya.alternatives.len(), MappingConfig::default().max_alternatives);
    }

    #[test]
    fn procedure_entities_use_procedure_strategy() {
        let entities = result_of(vec![
            entity(EntityType::Deadline, "30 jours", 0.75),
            entity(EntityType::Cost, "2000", 0.75),
        ]);
        let schema = BuiltinSchemas.schema_for("décret");
        let result = mapper()
            .map("texte", &entities, &schema, &MappingHistory::new(10))
            .unwrap();

        let delai = result.suggestions.iter().find(|s| s.field_id == "delai").unwrap();
        assert_eq!(delai.value, "30 jours");
        assert!(delai.strategies.contains(&MappingStrategy::ProcedurePattern));
        let frais = result.suggestions.iter().find(|s| s.field_id == "frais").unwrap();
        assert!(frais.strategies.contains(&MappingStrategy::ProcedurePattern));
    }

    #[test]
    fn learned_strategy_reuses_accepted_value() {
        let text = "le siège de la wilaya est fixé à Constantine";
        let mut history = MappingHistory::new(10);
        history.record(FeedbackRecord {
            form_id: "instrument".into(),
            field_id: "wilaya".into(),
            suggested_value: "Constantine".into(),
            final_value: "Constantine".into(),
            accepted: true,
            context: "le siège de la wilaya est fixé à Constantine".into(),
            recorded_at: Utc::now(),
        });

        let schema = BuiltinSchemas.schema_for("décret");
        let result = mapper()
            .map(text, &result_of(vec![]), &schema, &history)
            .unwrap();
        let wilaya = result.suggestions.iter().find(|s| s.field_id == "wilaya").unwrap();
        assert_eq!(wilaya.value, "Constantine");
        assert!(wilaya.strategies.contains(&MappingStrategy::Learned));
    }

    #[test]
    fn completeness_counts_only_confident_suggestions() {
        let entities = result_of(vec![entity(EntityType::Decree, "21-92", 0.9)]);
        let schema = BuiltinSchemas.schema_for("décret");
        let result = mapper()
            .map("texte", &entities, &schema, &MappingHistory::new(10))
            .unwrap();
        let expected = result.suggestions.len() as f32 / schema.field_count() as f32 * 100.0;
        assert!((result.completeness - expected).abs() < 1e-6);
    }

    #[test]
    fn no_entities_and_no_labels_leave_everything_unmapped() {
        let schema = BuiltinSchemas.schema_for("décret");
        let result = mapper()
            .map("texte sans aucune donnée utile", &result_of(vec![]), &schema, &MappingHistory::new(10))
            .unwrap();

        assert_eq!(result.completeness, 0.0);
        assert!(result.suggestions.is_empty());
        let mut unmapped = result.unmapped_fields.clone();
        unmapped.sort();
        let mut expected: Vec<String> = schema.fields().map(|f| f.id.clone()).collect();
        expected.sort();
        assert_eq!(unmapped, expected);
    }

    #[test]
    fn more_entities_never_decrease_completeness() {
        let schema = BuiltinSchemas.schema_for("décret");
        let history = MappingHistory::new(10);
        let few = result_of(vec![entity(EntityType::Decree, "21-92", 0.9)]);
        let more = result_of(vec![
            entity(EntityType::Decree, "21-92", 0.9),
            entity(EntityType::Wilaya, "Alger", 0.8),
            entity(EntityType::Amount, "150000.00", 0.7),
        ]);

        let base = mapper().map("texte", &few, &schema, &history).unwrap();
        let richer = mapper().map("texte", &more, &schema, &history).unwrap();
        assert!(richer.completeness >= base.completeness);
    }

    #[test]
    fn direct_label_is_case_insensitive() {
        let schema = BuiltinSchemas.schema_for("autre");
        let text = "TITRE: Décision portant nomination";
        let result = mapper()
            .map(text, &result_of(vec![]), &schema, &MappingHistory::new(10))
            .unwrap();
        let titre = result.suggestions.iter().find(|s| s.field_id == "titre").unwrap();
        assert_eq!(titre.value, "Décision portant nomination");
    }
}
