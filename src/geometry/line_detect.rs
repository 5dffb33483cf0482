//! Straight-rule detection on page rasters.
//!
//! Morphological closing thickens and cleans candidate strokes, binarization
//! separates ink from paper, then row/column run scans find long foreground
//! runs. Candidates are classified by endpoint angle and scored by a blend
//! of angle-closeness and normalized length.
//!
//! The backend seam lets tests feed exact line sets instead of rasters, so
//! nothing downstream depends on pixel-level detector accuracy.

use image::GrayImage;
use tracing::debug;

use super::types::{DetectedLine, DetectedLines, Orientation};
use crate::config::LineDetectConfig;
use crate::confidence;
use crate::extraction::preprocess;

/// Angle window (degrees) around 0/180 accepted as horizontal.
const HORIZONTAL_ANGLE_TOLERANCE: f32 = 10.0;

/// Angle window (degrees) around 90 accepted as vertical.
const VERTICAL_ANGLE_TOLERANCE: f32 = 10.0;

/// Rows/columns closer than this are merged into one thick line.
const MERGE_DISTANCE: f32 = 2.0;

/// Pluggable detection backend: morphological raster analysis in
/// production, fixture line sets in tests.
pub trait LineDetectBackend: Send + Sync {
    fn detect(&self, page: &GrayImage, config: &LineDetectConfig) -> DetectedLines;
}

/// Front-end over a detection backend, applying the confidence threshold.
pub struct LineDetector {
    backend: Box<dyn LineDetectBackend>,
}

impl Default for LineDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDetector {
    pub fn new() -> Self {
        Self {
            backend: Box::new(MorphologicalBackend),
        }
    }

    pub fn with_backend(backend: Box<dyn LineDetectBackend>) -> Self {
        Self { backend }
    }

    /// Detect classified line segments on one page raster. Zero lines is a
    /// valid output; downstream stages degrade instead of failing.
    pub fn detect(&self, page: &GrayImage, config: &LineDetectConfig) -> DetectedLines {
        let mut lines = self.backend.detect(page, config);
        lines
            .horizontal
            .retain(|l| l.confidence >= config.confidence_threshold);
        lines
            .vertical
            .retain(|l| l.confidence >= config.confidence_threshold);
        debug!(
            horizontal = lines.horizontal.len(),
            vertical = lines.vertical.len(),
            "Line detection complete"
        );
        lines
    }
}

/// Classify a segment by the angle between its endpoints.
/// Near 0/180 degrees is horizontal, 80-100 is vertical, anything else is
/// discarded (diagonal strokes are not printed rules).
pub fn classify_angle(dx: f32, dy: f32) -> Option<Orientation> {
    let angle = dy.atan2(dx).to_degrees().abs();
    if angle < HORIZONTAL_ANGLE_TOLERANCE || angle > 180.0 - HORIZONTAL_ANGLE_TOLERANCE {
        Some(Orientation::Horizontal)
    } else if (angle - 90.0).abs() <= VERTICAL_ANGLE_TOLERANCE {
        Some(Orientation::Vertical)
    } else {
        None
    }
}

/// Confidence for a classified segment: angle-closeness blended with length
/// normalized by the relevant page dimension, equal weights.
pub fn line_confidence(dx: f32, dy: f32, length: f32, page_extent: f32) -> f32 {
    let angle = dy.atan2(dx).to_degrees().abs();
    let deviation = if angle <= 45.0 {
        angle
    } else if angle >= 135.0 {
        180.0 - angle
    } else {
        (angle - 90.0).abs()
    };
    let angle_closeness = 1.0 - (deviation / HORIZONTAL_ANGLE_TOLERANCE).min(1.0);
    let normalized_length = if page_extent > 0.0 {
        (length / page_extent).min(1.0)
    } else {
        0.0
    };
    confidence::blend(&[(angle_closeness, 0.5), (normalized_length, 0.5)])
}

/// Production backend: closing, binarization, run scans.
pub struct MorphologicalBackend;

impl LineDetectBackend for MorphologicalBackend {
    fn detect(&self, page: &GrayImage, config: &LineDetectConfig) -> DetectedLines {
        let closed = preprocess::close(page, config.kernel_size);
        let binary = preprocess::binarize(&closed, config.binarize_threshold);

        let horizontal = merge_parallel(
            scan_rows(&binary, config),
            Orientation::Horizontal,
        );
        let vertical = merge_parallel(
            scan_columns(&binary, config),
            Orientation::Vertical,
        );

        DetectedLines { horizontal, vertical }
    }
}

/// Fixture backend returning a preset line set regardless of input.
pub struct FixtureBackend {
    pub lines: DetectedLines,
}

impl LineDetectBackend for FixtureBackend {
    fn detect(&self, _page: &GrayImage, _config: &LineDetectConfig) -> DetectedLines {
        self.lines.clone()
    }
}

/// One foreground run on a single row or column.
struct Run {
    /// Fixed coordinate (y for row scans, x for column scans).
    position: u32,
    start: u32,
    end: u32,
}

fn scan_rows(binary: &GrayImage, config: &LineDetectConfig) -> Vec<DetectedLine> {
    let width = binary.width();
    let mut lines = Vec::new();
    for y in 0..binary.height() {
        let runs = scan_line(
            (0..width).map(|x| binary.get_pixel(x, y).0[0]),
            y,
            config,
        );
        for run in runs {
            let length = (run.end - run.start) as f32;
            let conf = line_confidence(length, 0.0, length, width as f32);
            lines.push(DetectedLine::horizontal(
                run.start as f32,
                run.end as f32,
                run.position as f32,
                conf,
            ));
        }
    }
    lines
}

fn scan_columns(binary: &GrayImage, config: &LineDetectConfig) -> Vec<DetectedLine> {
    let height = binary.height();
    let mut lines = Vec::new();
    for x in 0..binary.width() {
        let runs = scan_line(
            (0..height).map(|y| binary.get_pixel(x, y).0[0]),
            x,
            config,
        );
        for run in runs {
            let length = (run.end - run.start) as f32;
            let conf = line_confidence(0.0, length, length, height as f32);
            lines.push(DetectedLine::vertical(
                run.position as f32,
                run.start as f32,
                run.end as f32,
                conf,
            ));
        }
    }
    lines
}

/// Collect foreground runs along one scanline, merging runs separated by
/// gaps no wider than `max_line_gap` and keeping runs of at least
/// `min_line_length`.
fn scan_line<I>(pixels: I, position: u32, config: &LineDetectConfig) -> Vec<Run>
where
    I: Iterator<Item = u8>,
{
    let mut runs: Vec<Run> = Vec::new();
    let mut current: Option<(u32, u32)> = None; // (start, end) exclusive
    let mut gap = 0u32;

    for (i, value) in pixels.enumerate() {
        let i = i as u32;
        if value == preprocess::FOREGROUND {
            current = match current {
                Some((start, _)) => Some((start, i + 1)),
                None => Some((i, i + 1)),
            };
            gap = 0;
        } else if let Some((start, end)) = current {
            gap += 1;
            if gap > config.max_line_gap {
                if end - start >= config.min_line_length {
                    runs.push(Run { position, start, end });
                }
                current = None;
            }
        }
    }
    if let Some((start, end)) = current {
        if end - start >= config.min_line_length {
            runs.push(Run { position, start, end });
        }
    }
    runs
}

/// A printed rule several pixels thick produces one run per row/column.
/// Merge adjacent parallel segments with overlapping extents into a single
/// line at the mean position, recording the thickness.
fn merge_parallel(mut lines: Vec<DetectedLine>, orientation: Orientation) -> Vec<DetectedLine> {
    lines.sort_by(|a, b| {
        a.position()
            .partial_cmp(&b.position())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut merged: Vec<DetectedLine> = Vec::new();
    let mut group: Vec<DetectedLine> = Vec::new();

    for line in lines {
        let adjacent = group.last().is_some_and(|prev: &DetectedLine| {
            (line.position() - prev.position()).abs() <= MERGE_DISTANCE
                && extents_overlap(prev, &line)
        });
        if adjacent || group.is_empty() {
            group.push(line);
        } else {
            merged.push(collapse_group(&group, orientation));
            group = vec![line];
        }
    }
    if !group.is_empty() {
        merged.push(collapse_group(&group, orientation));
    }
    merged
}

fn extents_overlap(a: &DetectedLine, b: &DetectedLine) -> bool {
    let (a0, a1, b0, b1) = match a.orientation {
        Orientation::Horizontal => (a.p1.x, a.p2.x, b.p1.x, b.p2.x),
        Orientation::Vertical => (a.p1.y, a.p2.y, b.p1.y, b.p2.y),
    };
    a0.max(b0) <= a1.min(b1)
}

fn collapse_group(group: &[DetectedLine], orientation: Orientation) -> DetectedLine {
    let position =
        group.iter().map(DetectedLine::position).sum::<f32>() / group.len() as f32;
    let conf = group
        .iter()
        .map(|l| l.confidence)
        .fold(0.0f32, f32::max);
    let thickness = group.len() as f32;

    let mut line = match orientation {
        Orientation::Horizontal => {
            let start = group.iter().map(|l| l.p1.x).fold(f32::INFINITY, f32::min);
            let end = group.iter().map(|l| l.p2.x).fold(f32::NEG_INFINITY, f32::max);
            DetectedLine::horizontal(start, end, position, conf)
        }
        Orientation::Vertical => {
            let start = group.iter().map(|l| l.p1.y).fold(f32::INFINITY, f32::min);
            let end = group.iter().map(|l| l.p2.y).fold(f32::NEG_INFINITY, f32::max);
            DetectedLine::vertical(position, start, end, conf)
        }
    };
    line.thickness = Some(thickness);
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn blank_page(w: u32, h: u32) -> GrayImage {
        GrayImage::from_pixel(w, h, Luma([255]))
    }

    fn draw_hline(img: &mut GrayImage, y: u32, x0: u32, x1: u32) {
        for x in x0..x1 {
            img.put_pixel(x, y, Luma([0]));
        }
    }

    fn draw_vline(img: &mut GrayImage, x: u32, y0: u32, y1: u32) {
        for y in y0..y1 {
            img.put_pixel(x, y, Luma([0]));
        }
    }

    #[test]
    fn detects_horizontal_rule() {
        let mut page = blank_page(200, 100);
        draw_hline(&mut page, 50, 20, 180);
        let lines = LineDetector::new().detect(&page, &LineDetectConfig::default());
        assert_eq!(lines.horizontal.len(), 1);
        let line = &lines.horizontal[0];
        assert!((line.position() - 50.0).abs() <= 2.0);
        assert!(line.length() >= 150.0);
        assert!(line.confidence >= 0.5 && line.confidence <= 1.0);
    }

    #[test]
    fn detects_vertical_rule() {
        let mut page = blank_page(100, 200);
        draw_vline(&mut page, 50, 10, 190);
        let lines = LineDetector::new().detect(&page, &LineDetectConfig::default());
        assert_eq!(lines.vertical.len(), 1);
        assert!((lines.vertical[0].position() - 50.0).abs() <= 2.0);
    }

    #[test]
    fn blank_page_yields_no_lines() {
        let page = blank_page(200, 200);
        let lines = LineDetector::new().detect(&page, &LineDetectConfig::default());
        assert!(lines.is_empty());
    }

    #[test]
    fn short_strokes_are_ignored() {
        let mut page = blank_page(200, 100);
        draw_hline(&mut page, 30, 10, 40); // 30 px < min_line_length 50
        let lines = LineDetector::new().detect(&page, &LineDetectConfig::default());
        assert!(lines.horizontal.is_empty());
    }

    #[test]
    fn gap_within_tolerance_is_bridged() {
        let mut page = blank_page(200, 100);
        draw_hline(&mut page, 50, 20, 95);
        draw_hline(&mut page, 50, 99, 180); // 4 px gap <= max_line_gap 5
        let lines = LineDetector::new().detect(&page, &LineDetectConfig::default());
        assert_eq!(lines.horizontal.len(), 1);
        assert!(lines.horizontal[0].length() >= 150.0);
    }

    #[test]
    fn thick_rule_collapses_to_one_line_with_thickness() {
        let mut page = blank_page(200, 100);
        for y in 49..52 {
            draw_hline(&mut page, y, 20, 180);
        }
        let lines = LineDetector::new().detect(&page, &LineDetectConfig::default());
        assert_eq!(lines.horizontal.len(), 1);
        let thickness = lines.horizontal[0].thickness.unwrap();
        assert!(thickness >= 3.0, "Expected thickness >= 3, got {thickness}");
    }

    #[test]
    fn all_confidences_in_unit_interval() {
        let mut page = blank_page(300, 300);
        draw_hline(&mut page, 10, 0, 300);
        draw_hline(&mut page, 150, 50, 250);
        draw_vline(&mut page, 150, 0, 300);
        let lines = LineDetector::new().detect(&page, &LineDetectConfig::default());
        for line in lines.horizontal.iter().chain(lines.vertical.iter()) {
            assert!(line.confidence >= 0.0 && line.confidence <= 1.0);
        }
    }

    // --- classify_angle: the orientation contract ---

    #[test]
    fn near_zero_angle_is_horizontal() {
        assert_eq!(classify_angle(100.0, 5.0), Some(Orientation::Horizontal));
        assert_eq!(classify_angle(-100.0, 3.0), Some(Orientation::Horizontal));
    }

    #[test]
    fn near_ninety_angle_is_vertical() {
        assert_eq!(classify_angle(5.0, 100.0), Some(Orientation::Vertical));
        assert_eq!(classify_angle(-8.0, 80.0), Some(Orientation::Vertical));
    }

    #[test]
    fn diagonal_is_discarded() {
        assert_eq!(classify_angle(100.0, 100.0), None);
        assert_eq!(classify_angle(50.0, -70.0), None);
    }

    #[test]
    fn axis_aligned_full_span_has_high_confidence() {
        // Perfect angle + full page span: 0.5*1.0 + 0.5*1.0
        let conf = line_confidence(500.0, 0.0, 500.0, 500.0);
        assert!((conf - 1.0).abs() < 1e-6);
    }

    #[test]
    fn fixture_backend_returns_preset_lines() {
        let preset = DetectedLines {
            horizontal: vec![DetectedLine::horizontal(0.0, 100.0, 10.0, 0.9)],
            vertical: vec![DetectedLine::vertical(50.0, 0.0, 100.0, 0.8)],
        };
        let detector = LineDetector::with_backend(Box::new(FixtureBackend {
            lines: preset.clone(),
        }));
        let page = blank_page(10, 10);
        let lines = detector.detect(&page, &LineDetectConfig::default());
        assert_eq!(lines.horizontal.len(), 1);
        assert_eq!(lines.vertical.len(), 1);
    }

    #[test]
    fn front_end_applies_confidence_threshold() {
        let preset = DetectedLines {
            horizontal: vec![
                DetectedLine::horizontal(0.0, 100.0, 10.0, 0.9),
                DetectedLine::horizontal(0.0, 100.0, 20.0, 0.2),
            ],
            vertical: vec![],
        };
        let detector = LineDetector::with_backend(Box::new(FixtureBackend { lines: preset }));
        let lines = detector.detect(&blank_page(10, 10), &LineDetectConfig::default());
        assert_eq!(lines.horizontal.len(), 1);
        assert!(lines.horizontal[0].confidence >= 0.5);
    }

    #[test]
    fn detection_is_deterministic() {
        let mut page = blank_page(200, 200);
        draw_hline(&mut page, 40, 10, 190);
        draw_vline(&mut page, 100, 10, 190);
        let detector = LineDetector::new();
        let config = LineDetectConfig::default();
        let a = detector.detect(&page, &config);
        let b = detector.detect(&page, &config);
        assert_eq!(a.horizontal.len(), b.horizontal.len());
        assert_eq!(a.vertical.len(), b.vertical.len());
    }
}
