//! Region content extraction.
//!
//! Crops each layout region out of the page raster, picks OCR parameters
//! for the region kind, and reruns recognition on a contrast-enhanced crop
//! when the first pass comes back below the retry threshold. OCR failure
//! never aborts a page: the region is kept with empty text at zero
//! confidence and a warning.

use image::GrayImage;
use tracing::{debug, warn};

use super::ocr::OcrWorkerPool;
use super::preprocess;
use super::sanitize::sanitize_extracted_text;
use super::types::{ExtractionWarning, LanguageTag, OcrOutput, RegionKind, SegmentationMode};
use crate::config::OcrConfig;
use crate::confidence;
use crate::geometry::Rect;

/// Contrast stretch applied before the retry pass.
const RETRY_CONTRAST_FACTOR: f32 = 1.5;
const RETRY_BRIGHTNESS: i16 = 10;

/// Recognized content for one region.
#[derive(Debug, Clone)]
pub struct RegionContent {
    pub text: String,
    pub confidence: f32,
    pub warnings: Vec<ExtractionWarning>,
}

/// Segmentation hint per region kind. Tables span multiple rows and keep
/// block segmentation; running headers and footers are single lines;
/// signature blocks hold sparse stamps and scrawl.
pub fn segmentation_for(kind: RegionKind) -> SegmentationMode {
    match kind {
        RegionKind::Text | RegionKind::Table => SegmentationMode::Block,
        RegionKind::Header | RegionKind::Footer => SegmentationMode::SingleLine,
        RegionKind::Signature => SegmentationMode::SparseText,
    }
}

/// Table cells hold numbers, codes and short labels. Stray glyphs the
/// engine hallucinates on ruling lines are dropped, keeping letters,
/// digits, ASCII punctuation and whitespace.
fn apply_table_whitelist(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || c.is_ascii_punctuation() || c.is_whitespace())
        .collect()
}

pub fn extract_region(
    pool: &OcrWorkerPool,
    page: &GrayImage,
    page_number: usize,
    rect: Rect,
    kind: RegionKind,
    language: LanguageTag,
    config: &OcrConfig,
) -> RegionContent {
    let crop = preprocess::crop_region(page, rect.x, rect.y, rect.width, rect.height);
    let mode = segmentation_for(kind);

    let mut warnings = Vec::new();
    let output = match pool.recognize(&crop, language.code(), mode) {
        Ok(first) => {
            if config.retry_enabled && first.confidence < config.retry_threshold {
                retry_enhanced(pool, &crop, language, mode, first)
            } else {
                first
            }
        }
        Err(err) => {
            warn!(page = page_number, error = %err, "OCR failed for region");
            warnings.push(ExtractionWarning::OcrFailed {
                page: page_number,
                detail: err.to_string(),
            });
            OcrOutput { text: String::new(), confidence: 0.0 }
        }
    };

    if output.confidence > 0.0 && output.confidence < config.retry_threshold {
        warnings.push(ExtractionWarning::LowConfidenceRegion {
            page: page_number,
            confidence: output.confidence,
        });
    }

    let text = if matches!(kind, RegionKind::Table) {
        apply_table_whitelist(&output.text)
    } else {
        output.text
    };

    RegionContent {
        text: sanitize_extracted_text(&text),
        confidence: confidence::clamp(output.confidence),
        warnings,
    }
}

/// Second pass on an enhanced crop. The better of the two results wins;
/// a failed retry falls back to the first pass.
fn retry_enhanced(
    pool: &OcrWorkerPool,
    crop: &GrayImage,
    language: LanguageTag,
    mode: SegmentationMode,
    first: OcrOutput,
) -> OcrOutput {
    let enhanced = preprocess::enhance_contrast(crop, RETRY_CONTRAST_FACTOR, RETRY_BRIGHTNESS);
    match pool.recognize(&enhanced, language.code(), mode) {
        Ok(second) if second.confidence > first.confidence => {
            debug!(
                first = first.confidence,
                second = second.confidence,
                "Retry pass improved recognition"
            );
            second
        }
        _ => first,
    }
}
