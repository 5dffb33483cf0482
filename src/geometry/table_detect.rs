//! Table detection from ruling-line intersections.
//!
//! Intersections between horizontal and vertical rules are clustered into
//! rectangular candidates, scored, filtered, and de-duplicated with greedy
//! non-max suppression. Grid reconstruction then resolves "implicit rows":
//! some Journal Officiel tables omit interior row rules, so missing
//! boundaries are inferred at the expected regular spacing.

use tracing::debug;

use super::separator::intersects;
use super::types::{ContentRegion, DetectedLine, DetectedLines, Point, Rect};
use crate::config::TableDetectConfig;
use crate::confidence;

/// Cluster radius multiplier applied to the minimum cell dimension.
const CLUSTER_RADIUS_FACTOR: f32 = 3.0;

/// Minimum intersection count for a cluster to become a candidate.
const MIN_CLUSTER_POINTS: usize = 4;

/// Candidates overlapping a better-scored candidate by more than this
/// fraction of their union area are suppressed.
const MAX_OVERLAP_RATIO: f32 = 0.5;

/// Composite NMS score weights: 0.6 x confidence + 0.4 x normalized area.
const SCORE_CONFIDENCE_WEIGHT: f32 = 0.6;
const SCORE_AREA_WEIGHT: f32 = 0.4;

/// Relative tolerance when snapping an implicit-row gap to a multiple of
/// the base row spacing.
const IMPLICIT_SPACING_TOLERANCE: f32 = 0.25;

/// A detected table candidate with its constituent rules.
#[derive(Debug, Clone)]
pub struct TableCandidate {
    pub rect: Rect,
    pub rows: usize,
    pub columns: usize,
    pub confidence: f32,
    pub horizontals: Vec<DetectedLine>,
    pub verticals: Vec<DetectedLine>,
}

/// A complete cell grid for one table, after implicit-row reconstruction.
#[derive(Debug, Clone)]
pub struct TableGrid {
    pub rect: Rect,
    pub rows: usize,
    pub columns: usize,
    /// rows + 1 sorted y boundaries.
    pub row_boundaries: Vec<f32>,
    /// columns + 1 sorted x boundaries.
    pub col_boundaries: Vec<f32>,
    pub implicit_rows_applied: bool,
    pub confidence: f32,
}

impl TableGrid {
    /// Cell rectangle at (row, column). Cells are indexed by grid position,
    /// never by append order.
    pub fn cell_rect(&self, row: usize, column: usize) -> Option<Rect> {
        if row + 1 >= self.row_boundaries.len() || column + 1 >= self.col_boundaries.len() {
            return None;
        }
        let x = self.col_boundaries[column];
        let y = self.row_boundaries[row];
        Some(Rect::new(
            x,
            y,
            self.col_boundaries[column + 1] - x,
            self.row_boundaries[row + 1] - y,
        ))
    }
}

struct Intersection {
    point: Point,
    confidence: f32,
}

pub struct TableDetector;

impl TableDetector {
    /// Detect non-overlapping table candidates inside the content region.
    /// Deterministic: identical line sets yield identical candidates.
    pub fn detect(
        lines: &DetectedLines,
        region: &ContentRegion,
        config: &TableDetectConfig,
    ) -> Vec<TableCandidate> {
        let intersections = find_intersections(lines, region, config);
        if intersections.len() < MIN_CLUSTER_POINTS {
            return Vec::new();
        }

        let radius = config.min_cell_size * CLUSTER_RADIUS_FACTOR;
        let clusters = cluster_points(&intersections, radius);

        let mut candidates: Vec<TableCandidate> = clusters
            .iter()
            .filter(|cluster| cluster.len() >= MIN_CLUSTER_POINTS)
            .filter_map(|cluster| build_candidate(cluster, &intersections, lines, config))
            .filter(|c| {
                c.rect.width >= config.min_table_width
                    && c.rect.height >= config.min_table_height
                    && c.confidence >= config.confidence_threshold
            })
            .collect();

        let kept = suppress_overlaps(&mut candidates);
        debug!(candidates = kept.len(), "Table detection complete");
        kept
    }

    /// Reconstruct the complete cell grid for a candidate, inferring row
    /// boundaries missing from the printed rules.
    pub fn reconstruct_grid(candidate: &TableCandidate) -> TableGrid {
        let col_boundaries = boundary_positions(&candidate.verticals, candidate.rect.x, candidate.rect.right());
        let visible_rows = boundary_positions(&candidate.horizontals, candidate.rect.y, candidate.rect.bottom());
        let (row_boundaries, implicit_rows_applied) = infer_implicit_rows(&visible_rows);

        TableGrid {
            rect: candidate.rect,
            rows: row_boundaries.len().saturating_sub(1),
            columns: col_boundaries.len().saturating_sub(1),
            row_boundaries,
            col_boundaries,
            implicit_rows_applied,
            confidence: candidate.confidence,
        }
    }
}

fn find_intersections(
    lines: &DetectedLines,
    region: &ContentRegion,
    config: &TableDetectConfig,
) -> Vec<Intersection> {
    let mut points = Vec::new();
    for v in &lines.vertical {
        for h in &lines.horizontal {
            if intersects(v, h, config.intersection_tolerance) {
                let point = Point::new(v.position(), h.position());
                if region.rect.contains_point(&point) {
                    points.push(Intersection {
                        point,
                        confidence: confidence::mean(&[v.confidence, h.confidence]),
                    });
                }
            }
        }
    }
    points
}

/// Group intersections by spatial proximity: points within `radius` of any
/// cluster member join that cluster (breadth-first flood over an adjacency
/// relation). Returns clusters as index lists.
fn cluster_points(points: &[Intersection], radius: f32) -> Vec<Vec<usize>> {
    let mut assigned = vec![false; points.len()];
    let mut clusters = Vec::new();

    for seed in 0..points.len() {
        if assigned[seed] {
            continue;
        }
        let mut cluster = vec![seed];
        assigned[seed] = true;
        let mut frontier = vec![seed];
        while let Some(current) = frontier.pop() {
            for (i, other) in points.iter().enumerate() {
                if !assigned[i]
                    && points[current].point.distance_to(&other.point) <= radius
                {
                    assigned[i] = true;
                    cluster.push(i);
                    frontier.push(i);
                }
            }
        }
        clusters.push(cluster);
    }
    clusters
}

fn build_candidate(
    cluster: &[usize],
    intersections: &[Intersection],
    lines: &DetectedLines,
    config: &TableDetectConfig,
) -> Option<TableCandidate> {
    let xs: Vec<f32> = cluster.iter().map(|&i| intersections[i].point.x).collect();
    let ys: Vec<f32> = cluster.iter().map(|&i| intersections[i].point.y).collect();
    let x0 = xs.iter().copied().fold(f32::INFINITY, f32::min);
    let x1 = xs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let y0 = ys.iter().copied().fold(f32::INFINITY, f32::min);
    let y1 = ys.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let rect = Rect::new(x0, y0, x1 - x0, y1 - y0);

    let tol = config.intersection_tolerance;
    let horizontals: Vec<DetectedLine> = lines
        .horizontal
        .iter()
        .filter(|h| h.position() >= y0 - tol && h.position() <= y1 + tol)
        .copied()
        .collect();
    let verticals: Vec<DetectedLine> = lines
        .vertical
        .iter()
        .filter(|v| v.position() >= x0 - tol && v.position() <= x1 + tol)
        .copied()
        .collect();

    if horizontals.len() < 2 || verticals.len() < 2 {
        return None;
    }

    let rows = horizontals.len() - 1;
    let columns = verticals.len() - 1;

    // Density: found intersections over the complete grid's expectation.
    let expected = (horizontals.len() * verticals.len()) as f32;
    let density = (cluster.len() as f32 / expected).min(1.0);

    let mean_confidence = confidence::mean(
        &cluster
            .iter()
            .map(|&i| intersections[i].confidence)
            .collect::<Vec<_>>(),
    );

    let regularity = confidence::mean(&[
        spacing_regularity(&horizontals),
        spacing_regularity(&verticals),
    ]);

    let conf = confidence::blend(&[
        (density, 0.4),
        (mean_confidence, 0.3),
        (regularity, 0.3),
    ]);

    Some(TableCandidate {
        rect,
        rows,
        columns,
        confidence: conf,
        horizontals,
        verticals,
    })
}

/// 1.0 for perfectly even spacing, approaching 0 as spacing diverges.
fn spacing_regularity(lines: &[DetectedLine]) -> f32 {
    if lines.len() < 3 {
        return 1.0;
    }
    let mut positions: Vec<f32> = lines.iter().map(DetectedLine::position).collect();
    positions.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let gaps: Vec<f32> = positions.windows(2).map(|w| w[1] - w[0]).collect();
    let mean_gap = gaps.iter().sum::<f32>() / gaps.len() as f32;
    if mean_gap <= 0.0 {
        return 0.0;
    }
    let variance = gaps.iter().map(|g| (g - mean_gap).powi(2)).sum::<f32>() / gaps.len() as f32;
    confidence::clamp(1.0 - variance.sqrt() / mean_gap)
}

/// Greedy non-max suppression by composite score, deterministic via a
/// (score desc, x, y) sort before the pass.
fn suppress_overlaps(candidates: &mut Vec<TableCandidate>) -> Vec<TableCandidate> {
    let max_area = candidates
        .iter()
        .map(|c| c.rect.area())
        .fold(0.0f32, f32::max);

    let score = |c: &TableCandidate| {
        let normalized_area = if max_area > 0.0 { c.rect.area() / max_area } else { 0.0 };
        SCORE_CONFIDENCE_WEIGHT * c.confidence + SCORE_AREA_WEIGHT * normalized_area
    };

    candidates.sort_by(|a, b| {
        score(b)
            .partial_cmp(&score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.rect.x.partial_cmp(&b.rect.x).unwrap_or(std::cmp::Ordering::Equal))
            .then(a.rect.y.partial_cmp(&b.rect.y).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut kept: Vec<TableCandidate> = Vec::new();
    for candidate in candidates.drain(..) {
        let overlaps = kept
            .iter()
            .any(|k| k.rect.overlap_ratio(&candidate.rect) > MAX_OVERLAP_RATIO);
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept
}

/// Sorted, de-duplicated boundary positions from member lines, clamped to
/// the candidate extent.
fn boundary_positions(lines: &[DetectedLine], min: f32, max: f32) -> Vec<f32> {
    let mut positions: Vec<f32> = lines
        .iter()
        .map(DetectedLine::position)
        .map(|p| p.clamp(min, max))
        .collect();
    positions.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    positions.dedup_by(|a, b| (*a - *b).abs() < 1.0);
    positions
}

/// Infer missing row boundaries. When one gap is close to an integer
/// multiple of the smallest gap, the missing rules are inserted at the
/// regular spacing. Returns (complete boundaries, whether any inferred).
fn infer_implicit_rows(visible: &[f32]) -> (Vec<f32>, bool) {
    if visible.len() < 3 {
        return (visible.to_vec(), false);
    }
    let gaps: Vec<f32> = visible.windows(2).map(|w| w[1] - w[0]).collect();
    let base = gaps.iter().copied().fold(f32::INFINITY, f32::min);
    if !base.is_finite() || base <= 0.0 {
        return (visible.to_vec(), false);
    }

    let mut boundaries = vec![visible[0]];
    let mut inferred = false;
    for (i, gap) in gaps.iter().enumerate() {
        let multiple = (gap / base).round() as usize;
        let fits = multiple >= 2
            && (gap - multiple as f32 * base).abs() <= base * IMPLICIT_SPACING_TOLERANCE;
        if fits {
            let spacing = gap / multiple as f32;
            for k in 1..multiple {
                boundaries.push(visible[i] + spacing * k as f32);
            }
            inferred = true;
        }
        boundaries.push(visible[i + 1]);
    }
    (boundaries, inferred)
}
