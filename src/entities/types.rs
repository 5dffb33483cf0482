use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Entity categories recognized in legal document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Law,
    Decree,
    Arrete,
    Ordonnance,
    Circulaire,
    Date,
    Institution,
    Organization,
    Person,
    Title,
    Amount,
    Percentage,
    /// Geographic locations are wilayas in this corpus.
    Wilaya,
    Reference,
    ProcedureStep,
    RequiredDocument,
    Deadline,
    Cost,
    Contact,
    Misc,
}

impl EntityType {
    pub fn label(&self) -> &'static str {
        match self {
            EntityType::Law => "LAW",
            EntityType::Decree => "DECREE",
            EntityType::Arrete => "ARRETE",
            EntityType::Ordonnance => "ORDONNANCE",
            EntityType::Circulaire => "CIRCULAIRE",
            EntityType::Date => "DATE",
            EntityType::Institution => "INSTITUTION",
            EntityType::Organization => "ORGANIZATION",
            EntityType::Person => "PERSON",
            EntityType::Title => "TITLE",
            EntityType::Amount => "AMOUNT",
            EntityType::Percentage => "PERCENTAGE",
            EntityType::Wilaya => "WILAYA",
            EntityType::Reference => "REFERENCE",
            EntityType::ProcedureStep => "PROCEDURE_STEP",
            EntityType::RequiredDocument => "REQUIRED_DOCUMENT",
            EntityType::Deadline => "DEADLINE",
            EntityType::Cost => "COST",
            EntityType::Contact => "CONTACT",
            EntityType::Misc => "MISC",
        }
    }
}

/// One recognized entity occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalEntity {
    pub id: Uuid,
    pub entity_type: EntityType,
    /// Text exactly as matched.
    pub raw_text: String,
    /// Canonical form: "12-34" for instruments, "DD/MM/YYYY" for dates.
    pub normalized_value: String,
    pub confidence: f32,
    /// Byte span in the source text.
    pub span: (usize, usize),
    /// Surrounding text window used for confidence scoring.
    pub context: String,
    /// Ids of co-occurring entities this one is linked to.
    pub links: Vec<Uuid>,
}

/// Recognition output for one text, entities ordered by span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityExtractionResult {
    pub entities: Vec<LegalEntity>,
    pub counts: BTreeMap<EntityType, usize>,
    pub overall_confidence: f32,
}

impl EntityExtractionResult {
    pub fn of_type(&self, entity_type: EntityType) -> impl Iterator<Item = &LegalEntity> {
        self.entities
            .iter()
            .filter(move |e| e.entity_type == entity_type)
    }

    pub fn count_of(&self, entity_type: EntityType) -> usize {
        self.counts.get(&entity_type).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_type_serializes_screaming_snake() {
        let json = serde_json::to_string(&EntityType::Arrete).unwrap();
        assert_eq!(json, "\"ARRETE\"");
        let json = serde_json::to_string(&EntityType::Law).unwrap();
        assert_eq!(json, "\"LAW\"");
    }

    #[test]
    fn labels_match_serialized_form() {
        for t in [
            EntityType::Law,
            EntityType::Date,
            EntityType::Wilaya,
            EntityType::Percentage,
            EntityType::ProcedureStep,
            EntityType::RequiredDocument,
            EntityType::Deadline,
            EntityType::Cost,
            EntityType::Contact,
        ] {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json.trim_matches('"'), t.label());
        }
    }
}
