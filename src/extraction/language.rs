//! Script-based language tagging for extracted text.
//!
//! Algerian official documents mix French and Arabic, frequently on the
//! same page. Tagging drives which engine language key the OCR retry and
//! downstream recognition use, so the heuristic only needs to separate
//! the two scripts, not identify languages in general.

use super::types::LanguageTag;

/// Fraction of letters the minority script must reach before the text is
/// tagged as mixed rather than as the majority script.
const MIXED_THRESHOLD: f32 = 0.15;

/// Tag text by script composition. Empty or script-free text defaults to
/// French, the publication language of the Journal Officiel's French
/// edition.
pub fn detect_language(text: &str) -> LanguageTag {
    let mut latin = 0u32;
    let mut arabic = 0u32;

    for ch in text.chars() {
        if is_arabic(ch) {
            arabic += 1;
        } else if ch.is_alphabetic() {
            latin += 1;
        }
    }

    let total = latin + arabic;
    if total == 0 {
        return LanguageTag::French;
    }

    let minority = latin.min(arabic) as f32 / total as f32;
    if minority >= MIXED_THRESHOLD {
        LanguageTag::Mixed
    } else if arabic > latin {
        LanguageTag::Arabic
    } else {
        LanguageTag::French
    }
}

fn is_arabic(ch: char) -> bool {
    matches!(
        ch,
        '\u{0600}'..='\u{06FF}' | '\u{0750}'..='\u{077F}' | '\u{08A0}'..='\u{08FF}'
    )
}
