//! Decorative border removal.
//!
//! Journal Officiel pages frame their content with a fixed count of printed
//! rules per side (three across the top, two elsewhere). Removing them first
//! keeps the column and table stages from misreading frame rules as layout.

use tracing::debug;

use super::types::{BorderLines, ContentRegion, DetectedLine, DetectedLines, Rect};
use crate::config::BorderConfig;

/// Confidence reported when no border was found on any side and the region
/// fell back to a tolerance inset of the raw page.
const DEGRADED_CONFIDENCE: f32 = 0.5;

pub struct BorderRemover;

impl BorderRemover {
    /// Identify border lines near each page edge and compute the interior
    /// content region. Always returns a sub-rectangle of the page, for any
    /// input line set including the empty set.
    pub fn remove(
        lines: &DetectedLines,
        page_width: f32,
        page_height: f32,
        config: &BorderConfig,
    ) -> ContentRegion {
        let h_band = page_height * config.edge_band_ratio;
        let v_band = page_width * config.edge_band_ratio;
        let min_h_span = page_width * config.min_span_ratio;
        let min_v_span = page_height * config.min_span_ratio;

        let top = select_side(
            &lines.horizontal,
            |l| l.position() <= h_band,
            |l| l.position(),
            min_h_span,
            config.expected_top,
        );
        let bottom = select_side(
            &lines.horizontal,
            |l| l.position() >= page_height - h_band,
            |l| page_height - l.position(),
            min_h_span,
            config.expected_bottom,
        );
        let left = select_side(
            &lines.vertical,
            |l| l.position() <= v_band,
            |l| l.position(),
            min_v_span,
            config.expected_left,
        );
        let right = select_side(
            &lines.vertical,
            |l| l.position() >= page_width - v_band,
            |l| page_width - l.position(),
            min_v_span,
            config.expected_right,
        );

        // Innermost border per side, falling back to a tolerance inset.
        let x0 = inner_edge(&left, config.tolerance, |l| l.position() + config.tolerance);
        let y0 = inner_edge(&top, config.tolerance, |l| l.position() + config.tolerance);
        let x1 = match innermost(&right) {
            Some(l) => l.position() - config.tolerance,
            None => page_width - config.tolerance,
        };
        let y1 = match innermost(&bottom) {
            Some(l) => l.position() - config.tolerance,
            None => page_height - config.tolerance,
        };

        let rect = clamp_to_page(x0, y0, x1, y1, page_width, page_height);

        let borders = BorderLines { top, bottom, left, right };
        let expected = config.expected_top
            + config.expected_bottom
            + config.expected_left
            + config.expected_right;
        let detected = borders.total();

        let confidence = if detected == 0 {
            DEGRADED_CONFIDENCE
        } else {
            (detected as f32 / expected.max(1) as f32).min(1.0)
        };

        debug!(
            detected,
            expected,
            confidence,
            "Border removal complete"
        );

        ContentRegion { rect, borders, confidence }
    }
}

/// Within one edge's search band, keep lines spanning enough of the page,
/// sorted by distance from the edge, truncated to the expected count.
fn select_side<B, D>(
    lines: &[DetectedLine],
    in_band: B,
    edge_distance: D,
    min_span: f32,
    expected: usize,
) -> Vec<DetectedLine>
where
    B: Fn(&DetectedLine) -> bool,
    D: Fn(&DetectedLine) -> f32,
{
    let mut candidates: Vec<DetectedLine> = lines
        .iter()
        .filter(|l| in_band(l) && l.length() >= min_span)
        .copied()
        .collect();
    candidates.sort_by(|a, b| {
        edge_distance(a)
            .partial_cmp(&edge_distance(b))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(expected);
    candidates
}

/// The border line farthest from the edge (last after distance sort).
fn innermost(side: &[DetectedLine]) -> Option<&DetectedLine> {
    side.last()
}

fn inner_edge<F>(side: &[DetectedLine], tolerance: f32, project: F) -> f32
where
    F: Fn(&DetectedLine) -> f32,
{
    match innermost(side) {
        Some(line) => project(line),
        None => tolerance,
    }
}

fn clamp_to_page(x0: f32, y0: f32, x1: f32, y1: f32, page_w: f32, page_h: f32) -> Rect {
    let x0 = x0.clamp(0.0, page_w);
    let y0 = y0.clamp(0.0, page_h);
    let x1 = x1.clamp(x0, page_w);
    let y1 = y1.clamp(y0, page_h);
    Rect::new(x0, y0, x1 - x0, y1 - y0)
}
