//! Entity recognition over extracted text.
//!
//! Runs every pattern table over the text, scores each match from its
//! base confidence plus context and format evidence, de-duplicates by
//! (type, normalized value), and links co-occurring entities such as an
//! instrument and its publication date.

use std::collections::BTreeMap;

use tracing::debug;
use uuid::Uuid;

use super::rules::{self, Normalizer, GENERIC_RULES, LEGAL_RULES, PROCEDURE_RULES};
use super::types::{EntityExtractionResult, EntityType, LegalEntity};
use crate::config::EntityConfig;
use crate::confidence;

/// Bonus for a supporting keyword in the context window.
const CONTEXT_BONUS: f32 = 0.10;

/// Bonus for a canonically well-formed value.
const FORMAT_BONUS: f32 = 0.10;

/// Penalty for a wilaya name missing from the reference table.
const UNKNOWN_PENALTY: f32 = 0.20;

pub struct EntityRecognizer {
    config: EntityConfig,
}

impl EntityRecognizer {
    pub fn new(config: EntityConfig) -> Self {
        Self { config }
    }

    pub fn recognize(&self, text: &str) -> EntityExtractionResult {
        let mut entities: Vec<LegalEntity> = Vec::new();

        let all_rules = LEGAL_RULES
            .iter()
            .chain(PROCEDURE_RULES.iter())
            .chain(GENERIC_RULES.iter());

        for rule in all_rules {
            for caps in rule.regex.captures_iter(text) {
                let Some(matched) = caps.get(0) else { continue };
                let Some((normalized, well_formed)) = rules::normalize(rule, &caps) else {
                    continue;
                };

                let context = context_window(
                    text,
                    matched.start(),
                    matched.end(),
                    self.config.context_radius,
                );

                let mut conf = rule.base_confidence;
                if has_context_keyword(rule.entity_type, &context) {
                    conf = confidence::bonus(conf, CONTEXT_BONUS);
                }
                if well_formed {
                    conf = confidence::bonus(conf, FORMAT_BONUS);
                } else if rule.normalizer == Normalizer::WilayaName {
                    conf = confidence::clamp(conf - UNKNOWN_PENALTY);
                }

                if conf < self.config.confidence_threshold {
                    continue;
                }

                entities.push(LegalEntity {
                    id: Uuid::new_v4(),
                    entity_type: rule.entity_type,
                    raw_text: matched.as_str().to_string(),
                    normalized_value: normalized,
                    confidence: conf,
                    span: (matched.start(), matched.end()),
                    context,
                    links: Vec::new(),
                });
            }
        }

        let mut entities = dedup(entities);
        entities.sort_by_key(|e| e.span);
        link_cooccurring(&mut entities, self.config.link_distance);

        let mut counts: BTreeMap<EntityType, usize> = BTreeMap::new();
        for entity in &entities {
            *counts.entry(entity.entity_type).or_insert(0) += 1;
        }
        let overall_confidence = confidence::mean(
            &entities.iter().map(|e| e.confidence).collect::<Vec<_>>(),
        );

        debug!(
            entities = entities.len(),
            confidence = overall_confidence,
            "Entity recognition complete"
        );

        EntityExtractionResult { entities, counts, overall_confidence }
    }
}

/// Keep the highest-confidence occurrence per (type, normalized value).
fn dedup(entities: Vec<LegalEntity>) -> Vec<LegalEntity> {
    let mut best: BTreeMap<(EntityType, String), LegalEntity> = BTreeMap::new();
    for entity in entities {
        let key = (entity.entity_type, entity.normalized_value.clone());
        match best.get(&key) {
            Some(existing) if existing.confidence >= entity.confidence => {}
            _ => {
                best.insert(key, entity);
            }
        }
    }
    best.into_values().collect()
}

/// Link entity pairs that commonly belong together when they sit within
/// `link_distance` bytes of each other: an instrument and its date, a
/// person and their institution.
fn link_cooccurring(entities: &mut [LegalEntity], link_distance: usize) {
    for i in 0..entities.len() {
        for j in (i + 1)..entities.len() {
            let gap = entities[j].span.0.saturating_sub(entities[i].span.1);
            if gap > link_distance {
                break;
            }
            if linkable(entities[i].entity_type, entities[j].entity_type) {
                let (id_i, id_j) = (entities[i].id, entities[j].id);
                entities[i].links.push(id_j);
                entities[j].links.push(id_i);
            }
        }
    }
}

fn linkable(a: EntityType, b: EntityType) -> bool {
    let pair = |x, y| (a == x && b == y) || (a == y && b == x);
    let instrument = |t| {
        matches!(
            t,
            EntityType::Law
                | EntityType::Decree
                | EntityType::Arrete
                | EntityType::Ordonnance
                | EntityType::Circulaire
        )
    };
    (instrument(a) && b == EntityType::Date)
        || (instrument(b) && a == EntityType::Date)
        || pair(EntityType::Person, EntityType::Institution)
        || pair(EntityType::Person, EntityType::Organization)
}

fn has_context_keyword(entity_type: EntityType, context: &str) -> bool {
    let lower = context.to_lowercase();
    context_keywords(entity_type)
        .iter()
        .any(|k| lower.contains(k))
}

fn context_keywords(entity_type: EntityType) -> &'static [&'static str] {
    match entity_type {
        EntityType::Law
        | EntityType::Decree
        | EntityType::Arrete
        | EntityType::Ordonnance
        | EntityType::Circulaire => &["vu ", "portant", "modifi", "complét", "relatif"],
        EntityType::Date => &["du ", "en date", "correspondant"],
        EntityType::Institution => &["auprès", "tutelle", "représent"],
        EntityType::Person => &["nommé", "désigné", "signé"],
        EntityType::Amount => &["montant", "somme", "budget", "taxe"],
        EntityType::Percentage => &["taux", "pourcentage", "part "],
        EntityType::Title => &["fonctions", "exerc", "qualité", "rapport"],
        EntityType::Organization => &["tutelle", "créée", "dénommée"],
        EntityType::Wilaya => &["territoire", "commune", "daïra", "siège"],
        EntityType::Reference => &["conformément", "en application", "vu "],
        EntityType::ProcedureStep => &["procédure", "démarche", "formulaire"],
        EntityType::RequiredDocument => &["fournir", "joindre", "dépôt"],
        EntityType::Deadline => &["compter", "avant", "dépôt"],
        EntityType::Cost => &["paiement", "acquitt", "versement"],
        EntityType::Contact => &["renseignement", "joindre", "adresse"],
        EntityType::Misc => &[],
    }
}

/// Context window around a byte span, snapped to char boundaries.
fn context_window(text: &str, start: usize, end: usize, radius: usize) -> String {
    let mut from = start.saturating_sub(radius);
    while from > 0 && !text.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = (end + radius).min(text.len());
    while to < text.len() && !text.is_char_boundary(to) {
        to += 1;
    }
    text[from..to].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognizer() -> EntityRecognizer {
        EntityRecognizer::new(EntityConfig::default())
    }

    #[test]
    fn law_with_date_is_recognized_and_linked() {
        let result = recognizer().recognize("Loi n° 12-34 du 5 janvier 2020");

        let law: Vec<_> = result.of_type(EntityType::Law).collect();
        assert_eq!(law.len(), 1);
        assert_eq!(law[0].normalized_value, "12-34");

        let date: Vec<_> = result.of_type(EntityType::Date).collect();
        assert_eq!(date.len(), 1);
        assert_eq!(date[0].normalized_value, "05/01/2020");

        assert!(law[0].links.contains(&date[0].id));
        assert!(date[0].links.contains(&law[0].id));
    }

    #[test]
    fn repeated_citation_is_deduplicated() {
        let text = "Vu la loi n° 08-09; la loi n° 08-09 est modifiée comme suit";
        let result = recognizer().recognize(text);
        assert_eq!(result.count_of(EntityType::Law), 1);
    }

    #[test]
    fn vu_context_raises_confidence() {
        let with_vu = recognizer().recognize("Vu la loi n° 08-09 du 25 février 2008");
        let without = recognizer().recognize("selon la loi n° 08-09");
        let conf_with = with_vu.of_type(EntityType::Law).next().unwrap().confidence;
        let conf_without = without.of_type(EntityType::Law).next().unwrap().confidence;
        assert!(conf_with > conf_without);
    }

    #[test]
    fn entities_are_ordered_by_span() {
        let text = "Décret exécutif n° 21-92 du 1er mars 2021 fixant le montant de 5 000 DA";
        let result = recognizer().recognize(text);
        for pair in result.entities.windows(2) {
            assert!(pair[0].span.0 <= pair[1].span.0);
        }
    }

    #[test]
    fn distant_entities_are_not_linked() {
        let filler = "lorem ipsum ".repeat(30);
        let text = format!("loi n° 12-34 {filler} le 5 janvier 2020");
        let result = recognizer().recognize(&text);
        let law = result.of_type(EntityType::Law).next().unwrap();
        assert!(law.links.is_empty());
    }

    #[test]
    fn empty_text_yields_empty_result() {
        let result = recognizer().recognize("");
        assert!(result.entities.is_empty());
        assert_eq!(result.overall_confidence, 0.0);
    }

    #[test]
    fn wilaya_and_amount_recognized() {
        let text = "le budget de la wilaya de Constantine, un montant de 250 000 DA";
        let result = recognizer().recognize(text);
        let wilaya = result.of_type(EntityType::Wilaya).next().unwrap();
        assert_eq!(wilaya.normalized_value, "Constantine");
        let amount = result.of_type(EntityType::Amount).next().unwrap();
        assert_eq!(amount.normalized_value, "250000");
    }

    #[test]
    fn context_window_respects_utf8_boundaries() {
        let text = "ééééééé loi n° 12-34 ééééééé";
        // Must not panic on multi-byte boundaries
        let result = recognizer().recognize(text);
        assert_eq!(result.count_of(EntityType::Law), 1);
    }

    #[test]
    fn counts_summarize_by_type() {
        let text = "Vu la loi n° 90-08 du 7 avril 1990; vu la loi n° 90-09 du 7 avril 1990";
        let result = recognizer().recognize(text);
        assert_eq!(result.count_of(EntityType::Law), 2);
        assert_eq!(result.count_of(EntityType::Date), 1, "Same date deduplicated");
    }

    #[test]
    fn procedure_text_yields_typed_entities() {
        let text = "Étape 1 : le dossier doit être déposé dans un délai de 30 jours. \
                    Les frais d'un coût de 2.000 DA. Contact : 0551234567.";
        let result = recognizer().recognize(text);

        let step = result.of_type(EntityType::ProcedureStep).next().unwrap();
        assert_eq!(step.normalized_value, "1");
        assert!(result.of_type(EntityType::RequiredDocument).next().is_some());
        let deadline = result.of_type(EntityType::Deadline).next().unwrap();
        assert_eq!(deadline.normalized_value, "30 jours");
        let cost = result.of_type(EntityType::Cost).next().unwrap();
        assert_eq!(cost.normalized_value, "2000");
        let contact = result.of_type(EntityType::Contact).next().unwrap();
        assert_eq!(contact.normalized_value, "0551234567");
    }

    #[test]
    fn percentages_are_recognized() {
        let text = "Le taux est fixé à 15 % du montant, soit une part de 7,5%.";
        let result = recognizer().recognize(text);
        let values: Vec<_> = result
            .of_type(EntityType::Percentage)
            .map(|e| e.normalized_value.as_str())
            .collect();
        assert!(values.contains(&"15"));
        assert!(values.contains(&"7.5"));
    }

    #[test]
    fn title_and_organization_recognized() {
        let text = "sur rapport du Premier ministre, placée sous tutelle de \
                    l'agence nationale de l'emploi,";
        let result = recognizer().recognize(text);
        assert_eq!(result.count_of(EntityType::Title), 1);
        assert_eq!(result.count_of(EntityType::Organization), 1);
    }

    #[test]
    fn overall_confidence_is_mean_of_entities() {
        let result = recognizer().recognize("Vu la loi n° 12-34 du 5 janvier 2020");
        let mean: f32 = result.entities.iter().map(|e| e.confidence).sum::<f32>()
            / result.entities.len() as f32;
        assert!((result.overall_confidence - mean).abs() < 1e-6);
    }
}
