//! Validation rule table for Algerian administrative data.
//!
//! Rules are selected by keyword-matching field identifiers, so schemas
//! do not have to declare rule bindings. Checks are plain functions and
//! return true for a valid value.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::entities::reference;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    Format,
    Range,
    Required,
    Consistency,
    Business,
    Regulatory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

pub struct ValidationRule {
    pub id: &'static str,
    pub category: RuleCategory,
    pub severity: Severity,
    /// Returns true when the value satisfies the rule.
    pub check: fn(&str) -> bool,
    pub message: &'static str,
    pub suggested_fix: &'static str,
    /// Field-id fragments this rule applies to.
    pub keywords: &'static [&'static str],
}

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\+213|0)[567]\d{8}$").expect("invalid phone pattern")
});

static INSTRUMENT_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{2}[-\u{2013}]\d{1,3}$").expect("invalid instrument number pattern")
});

static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2})/(\d{2})/(\d{4})$").expect("invalid date pattern")
});

static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(?:\.\d{1,2})?$").expect("invalid amount pattern")
});

fn check_cin(value: &str) -> bool {
    value.len() == 18 && value.chars().all(|c| c.is_ascii_digit())
}

fn check_phone(value: &str) -> bool {
    PHONE.is_match(value)
}

/// Wilaya given as a code must fall in 01-48; given as a name it must
/// resolve against the wilaya table.
fn check_wilaya(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        return trimmed
            .parse::<u8>()
            .is_ok_and(|code| (1..=48).contains(&code));
    }
    reference::wilaya_code(trimmed).is_some()
}

fn check_postal(value: &str) -> bool {
    value.len() == 5 && value.chars().all(|c| c.is_ascii_digit())
}

fn check_date(value: &str) -> bool {
    let Some(caps) = DATE.captures(value.trim()) else {
        return false;
    };
    let day: u32 = caps[1].parse().unwrap_or(0);
    let month: u32 = caps[2].parse().unwrap_or(0);
    let year: i32 = caps[3].parse().unwrap_or(0);
    chrono::NaiveDate::from_ymd_opt(year, month, day).is_some()
}

fn check_amount(value: &str) -> bool {
    AMOUNT.is_match(value.trim())
}

fn check_instrument_number(value: &str) -> bool {
    INSTRUMENT_NUMBER.is_match(value.trim())
}

/// All built-in rules, in evaluation order.
pub static RULES: LazyLock<Vec<ValidationRule>> = LazyLock::new(|| {
    vec![
        ValidationRule {
            id: "cin_format",
            category: RuleCategory::Regulatory,
            severity: Severity::Error,
            check: check_cin,
            message: "Le numéro d'identification nationale est invalide",
            suggested_fix: "Le NIN comporte exactement 18 chiffres",
            keywords: &["cin", "nin", "identification"],
        },
        ValidationRule {
            id: "phone_format",
            category: RuleCategory::Format,
            severity: Severity::Error,
            check: check_phone,
            message: "Le numéro de téléphone est invalide",
            suggested_fix: "Format attendu: 0XXXXXXXXX ou +213XXXXXXXXX (mobile 5, 6 ou 7)",
            keywords: &["tel", "phone", "mobile", "fax"],
        },
        ValidationRule {
            id: "wilaya_code_range",
            category: RuleCategory::Range,
            severity: Severity::Error,
            check: check_wilaya,
            message: "La wilaya est inconnue",
            suggested_fix: "Utiliser un code de 01 à 48 ou un nom de wilaya officiel",
            keywords: &["wilaya"],
        },
        ValidationRule {
            id: "postal_code_format",
            category: RuleCategory::Format,
            severity: Severity::Error,
            check: check_postal,
            message: "Le code postal est invalide",
            suggested_fix: "Le code postal comporte exactement 5 chiffres",
            keywords: &["postal", "code_postal"],
        },
        ValidationRule {
            id: "date_format",
            category: RuleCategory::Format,
            severity: Severity::Error,
            check: check_date,
            message: "La date est invalide ou impossible",
            suggested_fix: "Format attendu: JJ/MM/AAAA",
            keywords: &["date"],
        },
        ValidationRule {
            id: "amount_format",
            category: RuleCategory::Format,
            severity: Severity::Warning,
            check: check_amount,
            message: "Le montant n'est pas un nombre",
            suggested_fix: "Chiffres uniquement, décimales séparées par un point",
            keywords: &["montant", "somme", "budget"],
        },
        ValidationRule {
            id: "instrument_number_format",
            category: RuleCategory::Business,
            severity: Severity::Warning,
            check: check_instrument_number,
            message: "Le numéro d'acte ne suit pas le format AA-NNN",
            suggested_fix: "Format attendu: année sur deux chiffres, tiret, numéro de séquence",
            keywords: &["numero", "reference", "référence"],
        },
    ]
});

/// Rules applicable to a field, matched on id fragments.
pub fn rules_for(field_id: &str) -> Vec<&'static ValidationRule> {
    let lower = field_id.to_lowercase();
    RULES
        .iter()
        .filter(|rule| rule.keywords.iter().any(|k| lower.contains(k)))
        .collect()
}
