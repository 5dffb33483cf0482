//! Document structuring orchestrator.
//!
//! Drives the fixed per-page order: rasterize, detect rules, strip the
//! decorative border, split text columns and find tables inside the content
//! region, then recognize region contents through the OCR pool. Page
//! results are keyed by page number and a page that yields nothing still
//! produces a result carrying its warnings.

use std::sync::Arc;

use image::GrayImage;
use tracing::{info, instrument};
use uuid::Uuid;

use super::language::detect_language;
use super::ocr::OcrWorkerPool;
use super::region::{self, RegionContent};
use super::types::{
    ExtractedDocument, ExtractionWarning, LanguageTag, OcrEngine, PageResult, Rasterizer,
    RegionKind, TableCell, TableRegion, TextRegion,
};
use super::ExtractionError;
use crate::config::ExtractionConfig;
use crate::confidence;
use crate::geometry::{
    BorderRemover, LineDetectBackend, LineDetector, SeparatorDetector, TableCandidate,
    TableDetector,
};

pub struct DocumentExtractor {
    rasterizer: Box<dyn Rasterizer>,
    line_detector: LineDetector,
    pool: OcrWorkerPool,
    config: ExtractionConfig,
}

impl DocumentExtractor {
    pub fn new(
        rasterizer: Box<dyn Rasterizer>,
        engine: Arc<dyn OcrEngine>,
        config: ExtractionConfig,
    ) -> Result<Self, ExtractionError> {
        let pool = OcrWorkerPool::new(engine, config.ocr.worker_count)?;
        Ok(Self {
            rasterizer,
            line_detector: LineDetector::new(),
            pool,
            config,
        })
    }

    /// Replace the line detection backend. Tests feed fixture line sets.
    pub fn with_line_backend(mut self, backend: Box<dyn LineDetectBackend>) -> Self {
        self.line_detector = LineDetector::with_backend(backend);
        self
    }

    pub fn extract(
        &self,
        document_id: Uuid,
        document: &[u8],
    ) -> Result<ExtractedDocument, ExtractionError> {
        self.extract_with_progress(document_id, document, |_, _| {})
    }

    /// Extract with a progress callback invoked after each page as
    /// (pages_done, page_count). Calls are strictly monotonic.
    #[instrument(skip(self, document, progress), fields(document_id = %document_id))]
    pub fn extract_with_progress<F>(
        &self,
        document_id: Uuid,
        document: &[u8],
        mut progress: F,
    ) -> Result<ExtractedDocument, ExtractionError>
    where
        F: FnMut(usize, usize),
    {
        let page_count = self.rasterizer.page_count(document)?;
        if page_count == 0 {
            return Err(ExtractionError::CorruptDocument(
                "document has no pages".into(),
            ));
        }

        let mut pages = Vec::with_capacity(page_count);
        for page_number in 1..=page_count {
            let raster = self.rasterizer.rasterize(document, page_number)?;
            pages.push(self.process_page(page_number, &raster));
            progress(page_number, page_count);
        }

        let full_text = pages
            .iter()
            .map(|p| p.full_text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        // Length-weighted so a dense page outweighs a near-empty one.
        let overall_confidence = confidence::blend(
            &pages
                .iter()
                .map(|p| (p.confidence, p.full_text.len().max(1) as f32))
                .collect::<Vec<_>>(),
        );
        let language = detect_language(&full_text);

        info!(
            pages = page_count,
            confidence = overall_confidence,
            "Document extraction complete"
        );

        Ok(ExtractedDocument {
            document_id,
            pages,
            full_text,
            overall_confidence,
            language,
            page_count,
        })
    }

    fn process_page(&self, page_number: usize, raster: &GrayImage) -> PageResult {
        let page_width = raster.width() as f32;
        let page_height = raster.height() as f32;

        let lines = self.line_detector.detect(raster, &self.config.line);
        let content_region =
            BorderRemover::remove(&lines, page_width, page_height, &self.config.border);

        let mut warnings = Vec::new();
        if content_region.borders.total() == 0 {
            warnings.push(ExtractionWarning::DegradedBorders { page: page_number });
        }

        let columns = SeparatorDetector::detect(&lines, &content_region, &self.config.separator);
        let candidates = TableDetector::detect(&lines, &content_region, &self.config.table);

        let page_language = language_tag_from_code(&self.config.ocr.default_language);

        let tables: Vec<TableRegion> = candidates
            .iter()
            .map(|c| self.extract_table(page_number, raster, c, page_language, &mut warnings))
            .collect();

        let mut regions = Vec::new();
        for column in &columns {
            let content = region::extract_region(
                &self.pool,
                raster,
                page_number,
                *column,
                RegionKind::Text,
                page_language,
                &self.config.ocr,
            );
            let RegionContent { text, confidence, warnings: region_warnings } = content;
            warnings.extend(region_warnings);
            let language = if text.is_empty() { page_language } else { detect_language(&text) };
            regions.push(TextRegion {
                rect: *column,
                kind: RegionKind::Text,
                text,
                confidence,
                language,
            });
        }

        let full_text = assemble_page_text(&regions, &tables);
        if full_text.is_empty() {
            warnings.push(ExtractionWarning::NoContentDetected { page: page_number });
        }

        let mut parts: Vec<(f32, f32)> = regions
            .iter()
            .map(|r| (r.confidence, r.text.len().max(1) as f32))
            .collect();
        for table in &tables {
            let cell_text_len: usize = table.cells.iter().map(|c| c.text.len()).sum();
            parts.push((table.confidence, cell_text_len.max(1) as f32));
        }
        let page_confidence = confidence::blend(&parts);

        PageResult {
            page_number,
            content_region,
            columns,
            regions,
            tables,
            full_text,
            confidence: page_confidence,
            warnings,
        }
    }

    fn extract_table(
        &self,
        page_number: usize,
        raster: &GrayImage,
        candidate: &TableCandidate,
        language: LanguageTag,
        warnings: &mut Vec<ExtractionWarning>,
    ) -> TableRegion {
        let grid = TableDetector::reconstruct_grid(candidate);

        let mut cells = Vec::with_capacity(grid.rows * grid.columns);
        for row in 0..grid.rows {
            for column in 0..grid.columns {
                if let Some(rect) = grid.cell_rect(row, column) {
                    let content = region::extract_region(
                        &self.pool,
                        raster,
                        page_number,
                        rect,
                        RegionKind::Table,
                        language,
                        &self.config.ocr,
                    );
                    warnings.extend(content.warnings);
                    cells.push(TableCell {
                        row,
                        column,
                        rect,
                        text: content.text,
                        confidence: content.confidence,
                    });
                }
            }
        }

        TableRegion {
            rect: grid.rect,
            rows: grid.rows,
            columns: grid.columns,
            cells,
            confidence: grid.confidence,
            implicit_rows: grid.implicit_rows_applied,
        }
    }
}

fn language_tag_from_code(code: &str) -> LanguageTag {
    match code {
        "ara" => LanguageTag::Arabic,
        "fra+ara" | "ara+fra" => LanguageTag::Mixed,
        _ => LanguageTag::French,
    }
}

/// Page text: text columns left to right, then tables row by row with
/// cells separated by tabs.
fn assemble_page_text(regions: &[TextRegion], tables: &[TableRegion]) -> String {
    let mut parts: Vec<String> = regions
        .iter()
        .filter(|r| !r.text.is_empty())
        .map(|r| r.text.clone())
        .collect();

    for table in tables {
        let mut rows: Vec<String> = Vec::with_capacity(table.rows);
        for row in 0..table.rows {
            let line = table
                .cells
                .iter()
                .filter(|c| c.row == row)
                .map(|c| c.text.as_str())
                .collect::<Vec<_>>()
                .join("\t");
            if !line.trim().is_empty() {
                rows.push(line);
            }
        }
        if !rows.is_empty() {
            parts.push(rows.join("\n"));
        }
    }

    parts.join("\n\n")
}
