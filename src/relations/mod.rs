//! Relationships between legal instruments.

pub mod analyzer;
pub mod graph;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use analyzer::RelationAnalyzer;
pub use graph::{build_graph, ClusterKind, RelationCluster, RelationshipGraph};

/// The seven citation relationships found in Algerian legal texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    /// "Vu la loi ..." preamble citation.
    Vu,
    Modification,
    Abrogation,
    Approbation,
    Controle,
    Extension,
    Annexe,
}

/// The instrument a relationship points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Instrument kind as cited: "loi", "décret exécutif", "ordonnance".
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Normalized "NN-NNN" number.
    pub number: String,
}

/// Norm level at which a control relationship operates, classified from
/// the citation context (reviewing body, instrument kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControleLevel {
    Constitutional,
    Legal,
    Regulatory,
}

/// Kind-specific detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelationDetail {
    Abrogation { articles: Vec<String>, partial: bool },
    Controle { level: ControleLevel },
}

/// One detected relationship occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalRelationship {
    pub id: Uuid,
    pub kind: RelationKind,
    /// The citing instrument, when the caller knows it.
    pub source: Option<DocumentRef>,
    pub target: DocumentRef,
    /// Gregorian date as printed, e.g. "25 décembre 2022". Hijri dates
    /// resolve through their "correspondant au" clause.
    pub gregorian_date: Option<String>,
    /// Issuing authority when named near the citation.
    pub authority: Option<String>,
    pub detail: Option<RelationDetail>,
    pub confidence: f32,
    /// Byte span of the trigger phrase in the source text.
    pub span: (usize, usize),
}
