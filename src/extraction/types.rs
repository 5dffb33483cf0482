use image::GrayImage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ExtractionError;
use crate::geometry::{ContentRegion, Rect};

/// Result of structuring a whole document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub document_id: Uuid,
    pub pages: Vec<PageResult>,
    pub full_text: String,
    pub overall_confidence: f32,
    pub language: LanguageTag,
    pub page_count: usize,
}

/// Per-page structuring result. Pages are keyed by their one-based page
/// number, never by processing order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    pub page_number: usize,
    pub content_region: ContentRegion,
    /// Ordered left to right.
    pub columns: Vec<Rect>,
    pub regions: Vec<TextRegion>,
    pub tables: Vec<TableRegion>,
    pub full_text: String,
    pub confidence: f32,
    pub warnings: Vec<ExtractionWarning>,
}

/// What a page region holds, which drives the OCR parameters used on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    Text,
    Table,
    Header,
    Footer,
    Signature,
}

/// Language composition of extracted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    French,
    Arabic,
    Mixed,
}

impl LanguageTag {
    /// Engine language key for this tag.
    pub fn code(&self) -> &'static str {
        match self {
            LanguageTag::French => "fra",
            LanguageTag::Arabic => "ara",
            LanguageTag::Mixed => "fra+ara",
        }
    }
}

/// One recognized text region of a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRegion {
    pub rect: Rect,
    pub kind: RegionKind,
    pub text: String,
    pub confidence: f32,
    pub language: LanguageTag,
}

/// A structured table with its recognized cell contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRegion {
    pub rect: Rect,
    pub rows: usize,
    pub columns: usize,
    /// Indexed by grid position via (row, column).
    pub cells: Vec<TableCell>,
    pub confidence: f32,
    pub implicit_rows: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCell {
    pub row: usize,
    pub column: usize,
    pub rect: Rect,
    pub text: String,
    pub confidence: f32,
}

/// Quality warnings attached to a page result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionWarning {
    LowConfidenceRegion { page: usize, confidence: f32 },
    OcrFailed { page: usize, detail: String },
    DegradedBorders { page: usize },
    NoContentDetected { page: usize },
}

/// Raw OCR output for one image.
#[derive(Debug, Clone)]
pub struct OcrOutput {
    pub text: String,
    pub confidence: f32,
}

/// Page segmentation hint passed to the OCR engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentationMode {
    /// Uniform block of text.
    Block,
    /// Single line, used for table cells and headers.
    SingleLine,
    /// Sparse text in no particular order, used for signature blocks.
    SparseText,
}

/// OCR engine abstraction (allows mocking for tests).
pub trait OcrEngine: Send + Sync {
    fn recognize(
        &self,
        image: &GrayImage,
        language: &str,
        mode: SegmentationMode,
    ) -> Result<OcrOutput, ExtractionError>;
}

/// Page raster source abstraction. Production implementations decode PDF
/// or image files; tests supply fixture pages.
pub trait Rasterizer: Send + Sync {
    fn page_count(&self, document: &[u8]) -> Result<usize, ExtractionError>;

    /// Render one page as grayscale. `page_number` is one-based.
    fn rasterize(&self, document: &[u8], page_number: usize)
        -> Result<GrayImage, ExtractionError>;
}

/// Mock OCR engine for unit testing without a real engine.
pub struct MockOcrEngine {
    pub text: String,
    pub confidence: f32,
}

impl MockOcrEngine {
    pub fn new(text: &str, confidence: f32) -> Self {
        Self { text: text.to_string(), confidence }
    }
}

impl OcrEngine for MockOcrEngine {
    fn recognize(
        &self,
        _image: &GrayImage,
        _language: &str,
        _mode: SegmentationMode,
    ) -> Result<OcrOutput, ExtractionError> {
        Ok(OcrOutput {
            text: self.text.clone(),
            confidence: self.confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_ocr_returns_configured_text() {
        let engine = MockOcrEngine::new("Décret exécutif n° 21-92", 0.92);
        let image = GrayImage::new(4, 4);
        let result = engine
            .recognize(&image, "fra", SegmentationMode::Block)
            .unwrap();
        assert_eq!(result.text, "Décret exécutif n° 21-92");
        assert!((result.confidence - 0.92).abs() < f32::EPSILON);
    }

    #[test]
    fn language_tag_codes() {
        assert_eq!(LanguageTag::French.code(), "fra");
        assert_eq!(LanguageTag::Arabic.code(), "ara");
        assert_eq!(LanguageTag::Mixed.code(), "fra+ara");
    }

    #[test]
    fn warning_serializes_with_kind_tag() {
        let warning = ExtractionWarning::LowConfidenceRegion { page: 2, confidence: 0.4 };
        let json = serde_json::to_string(&warning).unwrap();
        assert!(json.contains("\"kind\":\"low_confidence_region\""));
        assert!(json.contains("\"page\":2"));
    }
}
