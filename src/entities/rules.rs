//! Recognition patterns for legal, procedural and generic entities.
//!
//! Each rule carries a compiled regex, a base confidence, and the
//! normalizer that turns the matched text into its canonical form.
//! Instruments normalize to "NN-NNN", dates to "DD/MM/YYYY".

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::{Captures, Regex};

use super::reference;
use super::types::EntityType;

/// How a matched string is canonicalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalizer {
    /// Instrument number from the digit capture groups.
    InstrumentNumber,
    /// "5 janvier 2020" style date.
    FrenchDate,
    /// "05/01/2020" style date.
    NumericDate,
    /// Monetary amount, thousands separators stripped.
    Amount,
    /// Wilaya name resolved against the reference table.
    WilayaName,
    /// Trimmed match (first capture group when present).
    Verbatim,
}

pub struct PatternRule {
    pub regex: Regex,
    pub entity_type: EntityType,
    pub base_confidence: f32,
    pub normalizer: Normalizer,
    pub description: &'static str,
}

fn pattern(
    re: &str,
    entity_type: EntityType,
    base_confidence: f32,
    normalizer: Normalizer,
    description: &'static str,
) -> PatternRule {
    PatternRule {
        regex: Regex::new(re).expect("invalid entity pattern"),
        entity_type,
        base_confidence,
        normalizer,
        description,
    }
}

/// Legal instrument citations.
pub static LEGAL_RULES: LazyLock<Vec<PatternRule>> = LazyLock::new(|| {
    vec![
        pattern(
            r"(?i)\bloi\s+n[°o]?\s*(\d{1,2})[-\u{2013}](\d{1,3})\b",
            EntityType::Law,
            0.75,
            Normalizer::InstrumentNumber,
            "Law citation: 'loi n° NN-NNN'",
        ),
        pattern(
            r"(?i)\bdécret\s+(?:exécutif|présidentiel|législatif)\s+n[°o]?\s*(\d{1,2})[-\u{2013}](\d{1,3})\b",
            EntityType::Decree,
            0.75,
            Normalizer::InstrumentNumber,
            "Qualified decree citation",
        ),
        pattern(
            r"(?i)\bdécret\s+n[°o]?\s*(\d{1,2})[-\u{2013}](\d{1,3})\b",
            EntityType::Decree,
            0.65,
            Normalizer::InstrumentNumber,
            "Bare decree citation",
        ),
        pattern(
            r"(?i)\bordonnance\s+n[°o]?\s*(\d{1,2})[-\u{2013}](\d{1,3})\b",
            EntityType::Ordonnance,
            0.75,
            Normalizer::InstrumentNumber,
            "Ordonnance citation",
        ),
        pattern(
            r"(?i)\barrêté(?:\s+(?:interministériel|ministériel))?(?:\s+n[°o]?\s*(\d{1,4}))?\b",
            EntityType::Arrete,
            0.6,
            Normalizer::InstrumentNumber,
            "Arrêté, optionally numbered",
        ),
        pattern(
            r"(?i)\bcirculaire\s+n[°o]?\s*([\d/\-]+)\b",
            EntityType::Circulaire,
            0.7,
            Normalizer::InstrumentNumber,
            "Circulaire citation",
        ),
    ]
});

/// Administrative procedure references.
pub static PROCEDURE_RULES: LazyLock<Vec<PatternRule>> = LazyLock::new(|| {
    vec![
        pattern(
            r"(?i)\barticles?\s+\d+(?:\s*(?:,|et)\s*\d+)*(?:\s+(?:bis|ter))?\b",
            EntityType::Reference,
            0.6,
            Normalizer::Verbatim,
            "Article reference",
        ),
        pattern(
            r"(?i)\bdossier\s+n[°o]?\s*([\w/\-]+)\b",
            EntityType::Reference,
            0.6,
            Normalizer::InstrumentNumber,
            "Case file number",
        ),
        pattern(
            r"(?i)\bjournal\s+officiel\s+n[°o]?\s*(\d+)\b",
            EntityType::Reference,
            0.65,
            Normalizer::InstrumentNumber,
            "Journal Officiel issue reference",
        ),
        pattern(
            r"(?i)\b(?:étape|phase)\s+(\d{1,2})\b",
            EntityType::ProcedureStep,
            0.6,
            Normalizer::Verbatim,
            "Numbered procedure step",
        ),
        pattern(
            r"(?i)\b(pièces?\s+(?:à\s+fournir|justificatives?)|documents?\s+(?:requis|à\s+fournir)|dossier\s+(?:de\s+candidature|complet|comprenant|composé|doit\s+être\s+déposé))",
            EntityType::RequiredDocument,
            0.6,
            Normalizer::Verbatim,
            "Required document phrasing",
        ),
        pattern(
            r"(?i)\bdélai\s+(?:maximal\s+)?(?:de\s+|d')?(\d{1,3}\s*(?:jours?|mois|semaines?|ans?|heures?))\b",
            EntityType::Deadline,
            0.65,
            Normalizer::Verbatim,
            "Deadline in days/weeks/months",
        ),
        pattern(
            r"(?i)\b(?:frais|coûts?|droits?|taxes?|redevances?)\s+(?:d'inscription\s+)?(?:de\s+|d'|fixés?\s+à\s+)?(\d{1,3}(?:[ .]\d{3})*(?:,\d{1,2})?)\s*(?:DA\b|dinars?\b)",
            EntityType::Cost,
            0.65,
            Normalizer::Amount,
            "Procedure cost in dinars",
        ),
        pattern(
            r"(?i)\b(?:contact|tél(?:éphone)?|fax|renseignements?)\s*:?\s*((?:\+213|0)[567]\d{8})\b",
            EntityType::Contact,
            0.7,
            Normalizer::Verbatim,
            "Contact phone number",
        ),
    ]
});

/// Dates, amounts, institutions, persons, wilayas.
pub static GENERIC_RULES: LazyLock<Vec<PatternRule>> = LazyLock::new(|| {
    vec![
        pattern(
            r"(?i)\b(\d{1,2})(?:er)?\s+(janvier|février|mars|avril|mai|juin|juillet|ao[uû]t|septembre|octobre|novembre|décembre)\s+(\d{4})\b",
            EntityType::Date,
            0.7,
            Normalizer::FrenchDate,
            "Spelled French date",
        ),
        pattern(
            r"\b(\d{1,2})[/.](\d{1,2})[/.](\d{4})\b",
            EntityType::Date,
            0.65,
            Normalizer::NumericDate,
            "Numeric date",
        ),
        pattern(
            r"(?i)\b(\d{1,3}(?:[ .]\d{3})*(?:,\d{1,2})?)\s*(?:DA\b|dinars?\b)",
            EntityType::Amount,
            0.65,
            Normalizer::Amount,
            "Dinar amount",
        ),
        pattern(
            r"(?i)\b(ministère\s+[^,;.\n()]{3,60})",
            EntityType::Institution,
            0.6,
            Normalizer::Verbatim,
            "Ministry",
        ),
        pattern(
            r"(?i)\b(présidence\s+de\s+la\s+république|assemblée\s+populaire\s+(?:nationale|communale)|conseil\s+d'état|conseil\s+constitutionnel|cour\s+suprême|cour\s+des\s+comptes)\b",
            EntityType::Institution,
            0.7,
            Normalizer::Verbatim,
            "Named state institution",
        ),
        pattern(
            r"\b(?:Monsieur|Madame|M\.|Mme)\s+(\p{Lu}[\p{L}'\-]+(?:\s+\p{Lu}[\p{L}'\-]+){0,2})",
            EntityType::Person,
            0.55,
            Normalizer::Verbatim,
            "Titled person name",
        ),
        pattern(
            r"(?i)\bwilaya\s+(?:de\s+|d')([\p{L} '\-]+?)(?:[,;.\n)]|$)",
            EntityType::Wilaya,
            0.7,
            Normalizer::WilayaName,
            "Wilaya mention",
        ),
        pattern(
            r"(?i)\b(\d{1,3}(?:[.,]\d{1,2})?)\s*(?:%|pour\s+cent)",
            EntityType::Percentage,
            0.65,
            Normalizer::Amount,
            "Percentage",
        ),
        pattern(
            r"(?i)\b(premier\s+ministre|président\s+de\s+la\s+république|ministre\s+de\s+[^,;.\n()]{3,50}|secrétaire\s+général|directeur\s+général|wali)\b",
            EntityType::Title,
            0.6,
            Normalizer::Verbatim,
            "Official title",
        ),
        pattern(
            r"(?i)\b((?:office|agence|caisse|fonds|institut)\s+national(?:e|aux)?\s+[^,;.\n()]{3,60}|société\s+(?:nationale|algérienne)\s+[^,;.\n()]{3,60})",
            EntityType::Organization,
            0.6,
            Normalizer::Verbatim,
            "State organization",
        ),
    ]
});

/// Canonicalize a match. Returns the normalized value and whether it is
/// well formed (which earns the format bonus). `None` rejects the match
/// outright, used for impossible dates.
pub fn normalize(rule: &PatternRule, caps: &Captures) -> Option<(String, bool)> {
    match rule.normalizer {
        Normalizer::InstrumentNumber => Some(normalize_instrument(caps)),
        Normalizer::FrenchDate => {
            let day = caps.get(1)?.as_str();
            let month = reference::month_number(caps.get(2)?.as_str())?;
            let year = caps.get(3)?.as_str();
            format_date(day, month, year).map(|d| (d, true))
        }
        Normalizer::NumericDate => {
            let day = caps.get(1)?.as_str();
            let month: u32 = caps.get(2)?.as_str().parse().ok()?;
            let year = caps.get(3)?.as_str();
            format_date(day, month, year).map(|d| (d, true))
        }
        Normalizer::Amount => Some((normalize_amount(caps.get(1)?.as_str()), true)),
        Normalizer::WilayaName => {
            let raw = caps.get(1)?.as_str().trim();
            match reference::wilaya_code(raw) {
                Some(code) => {
                    let name = reference::wilaya_name(code).unwrap_or(raw);
                    Some((name.to_string(), true))
                }
                None => Some((raw.to_string(), false)),
            }
        }
        Normalizer::Verbatim => {
            let text = caps
                .get(1)
                .map_or_else(|| caps[0].to_string(), |g| g.as_str().to_string());
            Some((collapse_whitespace(text.trim()), false))
        }
    }
}

/// "NN-NNN" from the digit groups; an unnumbered match falls back to the
/// lowercased matched text.
fn normalize_instrument(caps: &Captures) -> (String, bool) {
    match (caps.get(1), caps.get(2)) {
        (Some(a), Some(b)) => (format!("{:0>2}-{}", a.as_str(), b.as_str()), true),
        (Some(a), None) => (a.as_str().to_string(), true),
        _ => (collapse_whitespace(caps[0].trim()).to_lowercase(), false),
    }
}

/// "DD/MM/YYYY" after calendar validation.
fn format_date(day: &str, month: u32, year: &str) -> Option<String> {
    let d: u32 = day.parse().ok()?;
    let y: i32 = year.parse().ok()?;
    let date = NaiveDate::from_ymd_opt(y, month, d)?;
    Some(date.format("%d/%m/%Y").to_string())
}

/// Digits with thousands separators stripped, decimal comma kept as a dot.
fn normalize_amount(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == ',')
        .collect::<String>()
        .replace(',', ".")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
