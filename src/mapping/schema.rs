//! Form schema model and built-in schemas.
//!
//! A schema describes the target form: sections of typed fields, each
//! with the synonyms it is cited under and, when applicable, the entity
//! type that feeds it.

use serde::{Deserialize, Serialize};

use crate::entities::EntityType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Date,
    Number,
    Amount,
    Choice { options: Vec<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormField {
    pub id: String,
    pub label: String,
    pub field_type: FieldType,
    pub required: bool,
    /// Alternative labels the value may be cited under.
    pub synonyms: Vec<String>,
    /// Entity type that can feed this field directly.
    pub entity_type: Option<EntityType>,
}

impl FormField {
    fn new(id: &str, label: &str, field_type: FieldType) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            field_type,
            required: false,
            synonyms: Vec::new(),
            entity_type: None,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn synonyms(mut self, synonyms: &[&str]) -> Self {
        self.synonyms = synonyms.iter().map(|s| s.to_string()).collect();
        self
    }

    fn entity(mut self, entity_type: EntityType) -> Self {
        self.entity_type = Some(entity_type);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSection {
    pub id: String,
    pub title: String,
    pub fields: Vec<FormField>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSchema {
    pub id: String,
    pub title: String,
    pub sections: Vec<FormSection>,
}

impl FormSchema {
    pub fn fields(&self) -> impl Iterator<Item = &FormField> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    pub fn field_count(&self) -> usize {
        self.sections.iter().map(|s| s.fields.len()).sum()
    }

    pub fn field(&self, id: &str) -> Option<&FormField> {
        self.fields().find(|f| f.id == id)
    }
}

/// Source of form schemas. Unknown document kinds fall back to the
/// generic schema rather than failing.
pub trait SchemaProvider {
    fn schema_for(&self, document_kind: &str) -> FormSchema;
}

/// Built-in schemas for the common Journal Officiel instrument kinds.
pub struct BuiltinSchemas;

impl SchemaProvider for BuiltinSchemas {
    fn schema_for(&self, document_kind: &str) -> FormSchema {
        match document_kind.trim().to_lowercase().as_str() {
            "decret" | "décret" | "loi" | "ordonnance" | "arrete" | "arrêté" => {
                instrument_schema()
            }
            _ => generic_schema(),
        }
    }
}

fn instrument_schema() -> FormSchema {
    FormSchema {
        id: "instrument".into(),
        title: "Fiche d'instrument juridique".into(),
        sections: vec![
            FormSection {
                id: "identification".into(),
                title: "Identification".into(),
                fields: vec![
                    FormField::new("numero", "Numéro", FieldType::Text)
                        .required()
                        .synonyms(&["n°", "numéro de l'acte", "référence"])
                        .entity(EntityType::Decree),
                    FormField::new("date_signature", "Date de signature", FieldType::Date)
                        .required()
                        .synonyms(&["date", "signé le", "fait à alger le"])
                        .entity(EntityType::Date),
                    FormField::new("titre", "Titre", FieldType::Text)
                        .synonyms(&["objet", "intitulé", "portant"]),
                    FormField::new("autorite", "Autorité émettrice", FieldType::Text)
                        .synonyms(&["émis par", "autorité"])
                        .entity(EntityType::Institution),
                ],
            },
            FormSection {
                id: "localisation".into(),
                title: "Localisation".into(),
                fields: vec![
                    FormField::new("wilaya", "Wilaya", FieldType::Text)
                        .synonyms(&["circonscription", "territoire"])
                        .entity(EntityType::Wilaya),
                ],
            },
            FormSection {
                id: "references".into(),
                title: "Références".into(),
                fields: vec![
                    FormField::new("articles_vises", "Articles visés", FieldType::Text)
                        .synonyms(&["articles", "dispositions"])
                        .entity(EntityType::Reference),
                    FormField::new("montant", "Montant", FieldType::Amount)
                        .synonyms(&["somme", "budget alloué"])
                        .entity(EntityType::Amount),
                ],
            },
            FormSection {
                id: "procedure".into(),
                title: "Procédure".into(),
                fields: vec![
                    FormField::new("delai", "Délai", FieldType::Text)
                        .synonyms(&["délai de dépôt", "dans un délai de"])
                        .entity(EntityType::Deadline),
                    FormField::new("frais", "Frais", FieldType::Amount)
                        .synonyms(&["coût", "droits", "frais d'inscription"])
                        .entity(EntityType::Cost),
                    FormField::new("contact", "Contact", FieldType::Text)
                        .synonyms(&["téléphone", "renseignements"])
                        .entity(EntityType::Contact),
                ],
            },
        ],
    }
}

fn generic_schema() -> FormSchema {
    FormSchema {
        id: "generic".into(),
        title: "Fiche générique".into(),
        sections: vec![FormSection {
            id: "contenu".into(),
            title: "Contenu".into(),
            fields: vec![
                FormField::new("titre", "Titre", FieldType::Text)
                    .required()
                    .synonyms(&["objet", "intitulé"]),
                FormField::new("date", "Date", FieldType::Date)
                    .synonyms(&["en date du", "daté du"])
                    .entity(EntityType::Date),
                FormField::new("reference", "Référence", FieldType::Text)
                    .synonyms(&["n°", "numéro"])
                    .entity(EntityType::Reference),
                FormField::new("observations", "Observations", FieldType::Text),
            ],
        }],
    }
}
