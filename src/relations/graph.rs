//! Clustering over detected relationships.
//!
//! Two groupings are reported: thematic clusters of citations sharing a
//! target instrument, and chronological clusters of citations dated in
//! the same year. Small groups are noise and are not reported.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LegalRelationship;

/// Thematic clusters below or at this size are dropped.
const MIN_THEMATIC_SIZE: usize = 2;

/// Chronological clusters below or at this size are dropped.
const MIN_CHRONOLOGICAL_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterKind {
    Thematic,
    Chronological,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationCluster {
    pub kind: ClusterKind,
    /// Shared target "type number" or the shared year.
    pub label: String,
    pub relationship_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationshipGraph {
    pub clusters: Vec<RelationCluster>,
}

/// Build the cluster graph for one document's relationships.
pub fn build_graph(relationships: &[LegalRelationship]) -> RelationshipGraph {
    let mut by_target: BTreeMap<String, Vec<Uuid>> = BTreeMap::new();
    let mut by_year: BTreeMap<String, Vec<Uuid>> = BTreeMap::new();

    for rel in relationships {
        let target_key = format!("{} {}", rel.target.doc_type, rel.target.number);
        by_target.entry(target_key).or_default().push(rel.id);

        if let Some(year) = rel.gregorian_date.as_deref().and_then(extract_year) {
            by_year.entry(year).or_default().push(rel.id);
        }
    }

    let mut clusters = Vec::new();
    for (label, ids) in by_target {
        if ids.len() > MIN_THEMATIC_SIZE {
            clusters.push(RelationCluster {
                kind: ClusterKind::Thematic,
                label,
                relationship_ids: ids,
            });
        }
    }
    for (label, ids) in by_year {
        if ids.len() > MIN_CHRONOLOGICAL_SIZE {
            clusters.push(RelationCluster {
                kind: ClusterKind::Chronological,
                label,
                relationship_ids: ids,
            });
        }
    }

    RelationshipGraph { clusters }
}

fn extract_year(date: &str) -> Option<String> {
    date.split_whitespace()
        .last()
        .filter(|y| y.len() == 4 && y.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
}
