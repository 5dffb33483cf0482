//! Text-column separator detection.
//!
//! Two-column legal layouts print a single vertical rule near the physical
//! page center. A vertical line qualifies as a separator only when it sits
//! near the content-region centerline, covers most of the region height,
//! and crosses no horizontal line — the last condition keeps table
//! gridlines from being misread as column dividers.

use tracing::debug;

use super::types::{ContentRegion, DetectedLine, DetectedLines, Rect};
use crate::config::SeparatorConfig;

pub struct SeparatorDetector;

impl SeparatorDetector {
    /// Partition the content region into ordered text columns. Zero
    /// qualifying separators yield a single column spanning the region.
    pub fn detect(
        lines: &DetectedLines,
        region: &ContentRegion,
        config: &SeparatorConfig,
    ) -> Vec<Rect> {
        let mut separators: Vec<&DetectedLine> = lines
            .vertical
            .iter()
            .filter(|line| qualifies(line, &lines.horizontal, region, config))
            .collect();

        separators.sort_by(|a, b| {
            a.position()
                .partial_cmp(&b.position())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        debug!(separators = separators.len(), "Separator detection complete");

        let rect = region.rect;
        if separators.is_empty() {
            return vec![rect];
        }

        let mut columns = Vec::with_capacity(separators.len() + 1);
        let mut left_edge = rect.x;
        for separator in &separators {
            let x = separator.position();
            columns.push(Rect::new(left_edge, rect.y, x - left_edge, rect.height));
            left_edge = x;
        }
        columns.push(Rect::new(
            left_edge,
            rect.y,
            rect.right() - left_edge,
            rect.height,
        ));
        columns
    }
}

fn qualifies(
    line: &DetectedLine,
    horizontals: &[DetectedLine],
    region: &ContentRegion,
    config: &SeparatorConfig,
) -> bool {
    let rect = region.rect;
    let x = line.position();

    // (a) inside the content region
    if x < rect.x || x > rect.right() {
        return false;
    }
    if line.p2.y < rect.y || line.p1.y > rect.bottom() {
        return false;
    }

    // (b) near the vertical centerline
    if (x - rect.center_x()).abs() > config.center_tolerance {
        return false;
    }

    // (c) covers enough of the region height
    let covered = (line.p2.y.min(rect.bottom()) - line.p1.y.max(rect.y)).max(0.0);
    if covered < rect.height * config.min_height_ratio {
        return false;
    }

    // (d) crosses no horizontal line (table gridlines disqualify)
    !horizontals
        .iter()
        .any(|h| intersects(line, h, config.intersection_tolerance))
}

/// A vertical and a horizontal segment intersect when each one's fixed
/// coordinate falls within the other's extent, within tolerance.
pub fn intersects(vertical: &DetectedLine, horizontal: &DetectedLine, tolerance: f32) -> bool {
    let x = vertical.position();
    let y = horizontal.position();
    x >= horizontal.p1.x - tolerance
        && x <= horizontal.p2.x + tolerance
        && y >= vertical.p1.y - tolerance
        && y <= vertical.p2.y + tolerance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::types::BorderLines;

    fn region(x: f32, y: f32, w: f32, h: f32) -> ContentRegion {
        ContentRegion {
            rect: Rect::new(x, y, w, h),
            borders: BorderLines::default(),
            confidence: 1.0,
        }
    }

    fn center_separator(region: &ContentRegion) -> DetectedLine {
        let rect = region.rect;
        DetectedLine::vertical(rect.center_x(), rect.y + 10.0, rect.bottom() - 10.0, 0.9)
    }

    #[test]
    fn central_full_height_line_splits_two_columns() {
        let region = region(50.0, 50.0, 500.0, 700.0);
        let lines = DetectedLines {
            horizontal: vec![],
            vertical: vec![center_separator(&region)],
        };
        let columns = SeparatorDetector::detect(&lines, &region, &SeparatorConfig::default());
        assert_eq!(columns.len(), 2);
        assert!((columns[0].x - 50.0).abs() < f32::EPSILON);
        assert!((columns[0].right() - 300.0).abs() < f32::EPSILON);
        assert!((columns[1].x - 300.0).abs() < f32::EPSILON);
        assert!((columns[1].right() - 550.0).abs() < f32::EPSILON);
    }

    #[test]
    fn no_separator_yields_single_column() {
        let region = region(50.0, 50.0, 500.0, 700.0);
        let columns = SeparatorDetector::detect(
            &DetectedLines::default(),
            &region,
            &SeparatorConfig::default(),
        );
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0], region.rect);
    }

    #[test]
    fn off_center_line_is_rejected() {
        let region = region(50.0, 50.0, 500.0, 700.0);
        let lines = DetectedLines {
            horizontal: vec![],
            // 100 px from the centerline, beyond the 40 px tolerance
            vertical: vec![DetectedLine::vertical(400.0, 60.0, 740.0, 0.9)],
        };
        let columns = SeparatorDetector::detect(&lines, &region, &SeparatorConfig::default());
        assert_eq!(columns.len(), 1);
    }

    #[test]
    fn short_line_is_rejected() {
        let region = region(50.0, 50.0, 500.0, 700.0);
        let lines = DetectedLines {
            horizontal: vec![],
            // Covers 300/700 < 60% of the region height
            vertical: vec![DetectedLine::vertical(300.0, 100.0, 400.0, 0.9)],
        };
        let columns = SeparatorDetector::detect(&lines, &region, &SeparatorConfig::default());
        assert_eq!(columns.len(), 1);
    }

    #[test]
    fn line_crossing_a_horizontal_never_separates() {
        // The §8 property: a vertical intersecting any horizontal within
        // tolerance must never appear in the separator output.
        let region = region(50.0, 50.0, 500.0, 700.0);
        let separator = center_separator(&region);
        let crossing = DetectedLine::horizontal(200.0, 400.0, 300.0, 0.9);
        let lines = DetectedLines {
            horizontal: vec![crossing],
            vertical: vec![separator],
        };
        let columns = SeparatorDetector::detect(&lines, &region, &SeparatorConfig::default());
        assert_eq!(columns.len(), 1, "Crossed vertical must not separate");
    }

    #[test]
    fn non_crossing_horizontal_does_not_disqualify() {
        let region = region(50.0, 50.0, 500.0, 700.0);
        let separator = center_separator(&region);
        // Horizontal well to the left of the separator
        let distant = DetectedLine::horizontal(60.0, 200.0, 300.0, 0.9);
        let lines = DetectedLines {
            horizontal: vec![distant],
            vertical: vec![separator],
        };
        let columns = SeparatorDetector::detect(&lines, &region, &SeparatorConfig::default());
        assert_eq!(columns.len(), 2);
    }

    #[test]
    fn line_outside_region_is_rejected() {
        let region = region(200.0, 200.0, 200.0, 400.0);
        let lines = DetectedLines {
            horizontal: vec![],
            vertical: vec![DetectedLine::vertical(100.0, 0.0, 800.0, 0.9)],
        };
        let columns = SeparatorDetector::detect(&lines, &region, &SeparatorConfig::default());
        assert_eq!(columns.len(), 1);
    }

    #[test]
    fn columns_tile_the_region_left_to_right() {
        let region = region(0.0, 0.0, 400.0, 600.0);
        let lines = DetectedLines {
            horizontal: vec![],
            vertical: vec![DetectedLine::vertical(195.0, 10.0, 590.0, 0.9)],
        };
        let columns = SeparatorDetector::detect(&lines, &region, &SeparatorConfig::default());
        assert_eq!(columns.len(), 2);
        let total_width: f32 = columns.iter().map(|c| c.width).sum();
        assert!((total_width - region.rect.width).abs() < 1e-3);
        assert!(columns[0].x < columns[1].x);
    }

    #[test]
    fn intersects_respects_tolerance() {
        let v = DetectedLine::vertical(100.0, 50.0, 300.0, 0.9);
        let touching = DetectedLine::horizontal(103.0, 200.0, 150.0, 0.9);
        assert!(intersects(&v, &touching, 5.0));
        let distant = DetectedLine::horizontal(110.0, 200.0, 150.0, 0.9);
        assert!(!intersects(&v, &distant, 5.0));
    }
}
