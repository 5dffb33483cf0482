//! Relationship detection over document text.
//!
//! Each relationship kind is triggered by its citation phrasing around an
//! instrument reference. A window after the trigger supplies the date and
//! authority: Journal Officiel citations print the hijri date first, so
//! the Gregorian date is taken from the "correspondant au" clause when one
//! is present.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;
use uuid::Uuid;

use super::{ControleLevel, DocumentRef, LegalRelationship, RelationDetail, RelationKind};
use crate::confidence;

/// Base confidence for any matched trigger.
const BASE_CONFIDENCE: f32 = 0.7;

/// Bonus for a well-formed "NN-NNN" instrument number.
const NUMBER_BONUS: f32 = 0.1;

/// Window (bytes) after the trigger scanned for date and authority.
const DETAIL_WINDOW: usize = 200;

/// Shared fragment: instrument kind capture + number capture.
const INSTRUMENT: &str = r"(?:la\s+|le\s+|l')?\s*(loi|ordonnance|décret\s+exécutif|décret\s+présidentiel|décret\s+législatif|décret|arrêté\s+interministériel|arrêté|circulaire)\s+n[°o]?\s*(\d{1,2}[-\u{2013}]\d{1,3})";

struct RelationPattern {
    regex: Regex,
    kind: RelationKind,
    bonus: f32,
}

fn trigger(re: String, kind: RelationKind, bonus: f32) -> RelationPattern {
    RelationPattern {
        regex: Regex::new(&re).expect("invalid relation pattern"),
        kind,
        bonus,
    }
}

static RELATION_PATTERNS: LazyLock<Vec<RelationPattern>> = LazyLock::new(|| {
    vec![
        trigger(
            format!(r"(?i)\bvu\s+{INSTRUMENT}"),
            RelationKind::Vu,
            0.05,
        ),
        trigger(
            format!(r"(?i)\b(?:modifiant|modifiée?s?\s+par|portant\s+modification\s+de)\s+{INSTRUMENT}"),
            RelationKind::Modification,
            0.1,
        ),
        // Partial abrogation names the struck articles.
        trigger(
            format!(
                r"(?i)\b(?:sont\s+abrogées?\s+)?les\s+dispositions\s+des?\s+articles?\s+([\d\s,et]+?)\s+de\s+{INSTRUMENT}"
            ),
            RelationKind::Abrogation,
            0.1,
        ),
        trigger(
            format!(r"(?i)\babroge(?:ant|ées?|és?)?\s+{INSTRUMENT}"),
            RelationKind::Abrogation,
            0.1,
        ),
        trigger(
            format!(r"(?i)\b(?:approuvant|portant\s+approbation\s+de)\s+{INSTRUMENT}"),
            RelationKind::Approbation,
            0.08,
        ),
        trigger(
            format!(
                r"(?i)\bcontrôle\s+(?:a\s+priori\s+|a\s+posteriori\s+)?(?:prévu|institué|exercé)?\s*par\s+{INSTRUMENT}"
            ),
            RelationKind::Controle,
            0.05,
        ),
        trigger(
            format!(r"(?i)\b(?:étendant|portant\s+extension\s+(?:de|des\s+dispositions\s+de))\s+{INSTRUMENT}"),
            RelationKind::Extension,
            0.08,
        ),
        trigger(
            format!(r"(?i)\bannexée?s?\s+(?:à|au)\s+{INSTRUMENT}"),
            RelationKind::Annexe,
            0.05,
        ),
    ]
});

static GREGORIAN_FROM_HIJRI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)correspondant\s+au\s+(\d{1,2}(?:er)?\s+\p{L}+\s+\d{4})")
        .expect("invalid date pattern")
});

static GREGORIAN_DIRECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bdu\s+(\d{1,2}(?:er)?\s+(?:janvier|février|mars|avril|mai|juin|juillet|ao[uû]t|septembre|octobre|novembre|décembre)\s+\d{4})",
    )
    .expect("invalid date pattern")
});

static AUTHORITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(premier\s+ministre|président\s+de\s+la\s+république|ministre\s+[^,;.\n()]{3,50}|wali\s+de\s+[\p{L} \-]+)",
    )
    .expect("invalid authority pattern")
});

pub struct RelationAnalyzer;

impl RelationAnalyzer {
    /// Detect all relationships in `text`, ordered by trigger span.
    /// `source` is the citing instrument when the caller has identified
    /// it; it is carried into every relationship found.
    pub fn analyze(text: &str, source: Option<&DocumentRef>) -> Vec<LegalRelationship> {
        let mut relationships = Vec::new();

        for pattern in RELATION_PATTERNS.iter() {
            for caps in pattern.regex.captures_iter(text) {
                let Some(matched) = caps.get(0) else { continue };
                if let Some(rel) =
                    build_relationship(text, pattern, &caps, matched.start(), matched.end(), source)
                {
                    relationships.push(rel);
                }
            }
        }

        relationships = dedup(relationships);
        relationships.sort_by_key(|r| r.span);
        debug!(relationships = relationships.len(), "Relation analysis complete");
        relationships
    }
}

fn build_relationship(
    text: &str,
    pattern: &RelationPattern,
    caps: &Captures,
    start: usize,
    end: usize,
    source: Option<&DocumentRef>,
) -> Option<LegalRelationship> {
    // The instrument groups are the last two captures; the partial
    // abrogation pattern carries one extra leading group.
    let group_count = caps.len();
    let doc_type = caps.get(group_count - 2)?.as_str();
    let raw_number = caps.get(group_count - 1)?.as_str();
    let number = normalize_number(raw_number);

    let mut conf = confidence::bonus(BASE_CONFIDENCE, pattern.bonus);
    if well_formed_number(&number) {
        conf = confidence::bonus(conf, NUMBER_BONUS);
    }

    let window = detail_window(text, end);
    let gregorian_date = find_gregorian_date(window);
    let authority = AUTHORITY
        .captures(window)
        .and_then(|c| c.get(1))
        .map(|m| collapse_whitespace(m.as_str()));

    let detail = match pattern.kind {
        RelationKind::Abrogation => {
            let articles = caps
                .get(1)
                .filter(|_| group_count == 4)
                .map(|m| parse_article_list(m.as_str()))
                .unwrap_or_default();
            Some(RelationDetail::Abrogation { partial: !articles.is_empty(), articles })
        }
        RelationKind::Controle => {
            Some(RelationDetail::Controle { level: controle_level(doc_type, window) })
        }
        _ => None,
    };

    Some(LegalRelationship {
        id: Uuid::new_v4(),
        kind: pattern.kind,
        source: source.cloned(),
        target: DocumentRef {
            doc_type: collapse_whitespace(doc_type).to_lowercase(),
            number,
        },
        gregorian_date,
        authority,
        detail,
        confidence: conf,
        span: (start, end),
    })
}

/// The Gregorian date after a trigger. A "correspondant au" clause wins
/// over a direct "du <date>" since the latter would pick up the hijri
/// year otherwise.
fn find_gregorian_date(window: &str) -> Option<String> {
    if let Some(caps) = GREGORIAN_FROM_HIJRI.captures(window) {
        return caps.get(1).map(|m| collapse_whitespace(m.as_str()));
    }
    GREGORIAN_DIRECT
        .captures(window)
        .and_then(|c| c.get(1))
        .map(|m| collapse_whitespace(m.as_str()))
}

/// Norm level of a control relationship. A constitutional reviewing body
/// in the window wins; otherwise a regulatory instrument kind or an
/// explicit "réglementaire" marks regulatory control, and statute-level
/// instruments default to legal control.
fn controle_level(doc_type: &str, window: &str) -> ControleLevel {
    let lower = window.to_lowercase();
    if lower.contains("constitutionnel") {
        ControleLevel::Constitutional
    } else if doc_type.contains("décret")
        || doc_type.contains("arrêté")
        || doc_type.contains("circulaire")
        || lower.contains("réglementaire")
    {
        ControleLevel::Regulatory
    } else {
        ControleLevel::Legal
    }
}

fn detail_window(text: &str, from: usize) -> &str {
    let mut to = (from + DETAIL_WINDOW).min(text.len());
    while to < text.len() && !text.is_char_boundary(to) {
        to += 1;
    }
    &text[from..to]
}

fn normalize_number(raw: &str) -> String {
    let cleaned = raw.replace('\u{2013}', "-");
    match cleaned.split_once('-') {
        Some((year, seq)) => format!("{year:0>2}-{seq}"),
        None => cleaned,
    }
}

fn well_formed_number(number: &str) -> bool {
    let mut parts = number.splitn(2, '-');
    let year = parts.next().unwrap_or_default();
    let seq = parts.next().unwrap_or_default();
    year.len() == 2
        && year.chars().all(|c| c.is_ascii_digit())
        && (1..=3).contains(&seq.len())
        && seq.chars().all(|c| c.is_ascii_digit())
}

fn parse_article_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty() && *s != "et")
        .map(str::to_string)
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Same (kind, target) cited twice keeps the higher-confidence, earlier
/// occurrence.
fn dedup(relationships: Vec<LegalRelationship>) -> Vec<LegalRelationship> {
    let mut kept: Vec<LegalRelationship> = Vec::new();
    for rel in relationships {
        if let Some(existing) = kept
            .iter_mut()
            .find(|k| k.kind == rel.kind && k.target == rel.target)
        {
            if rel.confidence > existing.confidence {
                *existing = rel;
            }
        } else {
            kept.push(rel);
        }
    }
    kept
}
