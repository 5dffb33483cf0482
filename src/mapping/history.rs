//! Feedback history for the learned mapping strategy.
//!
//! Every reviewed suggestion is recorded. Later documents reuse accepted
//! values when their surrounding context is similar enough, with the
//! suggestion confidence scaled by the field's acceptance rate. The
//! record ring is capped so an old installation cannot grow unbounded.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub form_id: String,
    pub field_id: String,
    pub suggested_value: String,
    /// Value the reviewer kept, equal to the suggestion when accepted.
    pub final_value: String,
    pub accepted: bool,
    /// Context window the suggestion was made from.
    pub context: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MappingHistory {
    records: VecDeque<FeedbackRecord>,
    cap: usize,
}

impl MappingHistory {
    pub fn new(cap: usize) -> Self {
        Self { records: VecDeque::new(), cap: cap.max(1) }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record one reviewed suggestion, evicting the oldest at the cap.
    pub fn record(&mut self, record: FeedbackRecord) {
        if self.records.len() == self.cap {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Fraction of reviewed suggestions for a field that were accepted.
    /// `None` until the field has any history.
    pub fn acceptance_rate(&self, field_id: &str) -> Option<f32> {
        let reviewed: Vec<_> = self
            .records
            .iter()
            .filter(|r| r.field_id == field_id)
            .collect();
        if reviewed.is_empty() {
            return None;
        }
        let accepted = reviewed.iter().filter(|r| r.accepted).count();
        Some(accepted as f32 / reviewed.len() as f32)
    }

    /// Best learned value for a field in the given context: the accepted
    /// record with the highest context overlap above the similarity
    /// threshold. Confidence blends overlap with the acceptance rate.
    pub fn suggest(
        &self,
        field_id: &str,
        context: &str,
        similarity_threshold: f32,
    ) -> Option<(String, f32)> {
        let rate = self.acceptance_rate(field_id)?;
        let best = self
            .records
            .iter()
            .filter(|r| r.field_id == field_id && r.accepted)
            .map(|r| (r, word_overlap(context, &r.context)))
            .filter(|(_, overlap)| *overlap > similarity_threshold)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))?;

        let (record, overlap) = best;
        let confidence = crate::confidence::blend(&[(overlap, 0.5), (rate, 0.5)]);
        debug!(field = field_id, overlap, rate, "Learned suggestion found");
        Some((record.final_value.clone(), confidence))
    }

    /// Serialize all records for persistence by the caller.
    pub fn export(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.records.iter().collect::<Vec<_>>())
    }

    /// Rebuild a history from exported records, respecting the cap.
    pub fn import(json: &str, cap: usize) -> Result<Self, serde_json::Error> {
        let records: Vec<FeedbackRecord> = serde_json::from_str(json)?;
        let mut history = Self::new(cap);
        for record in records {
            history.record(record);
        }
        Ok(history)
    }
}

/// Jaccard overlap of lowercase word sets.
fn word_overlap(a: &str, b: &str) -> f32 {
    let words = |s: &str| {
        s.to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect::<HashSet<_>>()
    };
    let wa = words(a);
    let wb = words(b);
    if wa.is_empty() || wb.is_empty() {
        return 0.0;
    }
    let intersection = wa.intersection(&wb).count() as f32;
    let union = wa.union(&wb).count() as f32;
    intersection / union
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(field: &str, value: &str, accepted: bool, context: &str) -> FeedbackRecord {
        FeedbackRecord {
            form_id: "instrument".to_string(),
            field_id: field.to_string(),
            suggested_value: value.to_string(),
            final_value: value.to_string(),
            accepted,
            context: context.to_string(),
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn cap_evicts_oldest_record() {
        let mut history = MappingHistory::new(3);
        for i in 0..5 {
            history.record(record("numero", &format!("v{i}"), true, "ctx"));
        }
        assert_eq!(history.len(), 3);
        let json = history.export().unwrap();
        assert!(!json.contains("v0"));
        assert!(json.contains("v4"));
    }

    #[test]
    fn acceptance_rate_counts_per_field() {
        let mut history = MappingHistory::new(10);
        history.record(record("numero", "12-34", true, "ctx"));
        history.record(record("numero", "56-78", false, "ctx"));
        history.record(record("wilaya", "Alger", true, "ctx"));
        assert_eq!(history.acceptance_rate("numero"), Some(0.5));
        assert_eq!(history.acceptance_rate("wilaya"), Some(1.0));
        assert_eq!(history.acceptance_rate("inconnu"), None);
    }

    #[test]
    fn similar_context_yields_suggestion() {
        let mut history = MappingHistory::new(10);
        history.record(record(
            "wilaya",
            "Constantine",
            true,
            "siège de la wilaya de Constantine fixé",
        ));
        let suggestion = history.suggest(
            "wilaya",
            "le siège de la wilaya de Constantine est fixé",
            0.7,
        );
        let (value, confidence) = suggestion.unwrap();
        assert_eq!(value, "Constantine");
        assert!(confidence > 0.7);
    }

    #[test]
    fn dissimilar_context_yields_nothing() {
        let mut history = MappingHistory::new(10);
        history.record(record("wilaya", "Constantine", true, "siège de la wilaya"));
        assert!(history
            .suggest("wilaya", "montant du budget annuel alloué", 0.7)
            .is_none());
    }

    #[test]
    fn rejected_records_never_suggest() {
        let mut history = MappingHistory::new(10);
        history.record(record("numero", "99-99", false, "même contexte exact"));
        assert!(history.suggest("numero", "même contexte exact", 0.7).is_none());
    }

    #[test]
    fn export_import_round_trip() {
        let mut history = MappingHistory::new(10);
        history.record(record("numero", "12-34", true, "vu la loi"));
        let json = history.export().unwrap();
        let restored = MappingHistory::import(&json, 10).unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.acceptance_rate("numero"), Some(1.0));
    }

    #[test]
    fn exported_history_survives_a_file_round_trip() {
        let mut history = MappingHistory::new(10);
        history.record(record("numero", "12-34", true, "vu la loi"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, history.export().unwrap()).unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        let restored = MappingHistory::import(&json, 10).unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.acceptance_rate("numero"), Some(1.0));
    }

    #[test]
    fn import_respects_smaller_cap() {
        let mut history = MappingHistory::new(10);
        for i in 0..6 {
            history.record(record("f", &format!("v{i}"), true, "ctx"));
        }
        let json = history.export().unwrap();
        let restored = MappingHistory::import(&json, 2).unwrap();
        assert_eq!(restored.len(), 2);
    }

    #[test]
    fn word_overlap_is_jaccard() {
        assert!((word_overlap("a b c", "a b c") - 1.0).abs() < f32::EPSILON);
        assert!((word_overlap("a b", "b c") - (1.0 / 3.0)).abs() < 1e-6);
        assert_eq!(word_overlap("", "a"), 0.0);
    }
}
