//! Geometric value types shared by the layout analysis stages.

use serde::{Deserialize, Serialize};

/// A point in page pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// An axis-aligned rectangle in page pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Intersection area with another rectangle. Zero when disjoint.
    pub fn intersection_area(&self, other: &Rect) -> f32 {
        let w = (self.right().min(other.right()) - self.x.max(other.x)).max(0.0);
        let h = (self.bottom().min(other.bottom()) - self.y.max(other.y)).max(0.0);
        w * h
    }

    /// Area of the union of the two rectangles.
    pub fn union_area(&self, other: &Rect) -> f32 {
        self.area() + other.area() - self.intersection_area(other)
    }

    /// Overlap as a fraction of the union area (IoU). Zero for empty union.
    pub fn overlap_ratio(&self, other: &Rect) -> f32 {
        let union = self.union_area(other);
        if union <= 0.0 {
            return 0.0;
        }
        self.intersection_area(other) / union
    }
}

/// Line segment orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A straight line segment detected on a page raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectedLine {
    pub p1: Point,
    pub p2: Point,
    pub orientation: Orientation,
    /// In [0, 1].
    pub confidence: f32,
    pub thickness: Option<f32>,
}

impl DetectedLine {
    pub fn horizontal(x1: f32, x2: f32, y: f32, confidence: f32) -> Self {
        Self {
            p1: Point::new(x1.min(x2), y),
            p2: Point::new(x1.max(x2), y),
            orientation: Orientation::Horizontal,
            confidence,
            thickness: None,
        }
    }

    pub fn vertical(x: f32, y1: f32, y2: f32, confidence: f32) -> Self {
        Self {
            p1: Point::new(x, y1.min(y2)),
            p2: Point::new(x, y1.max(y2)),
            orientation: Orientation::Vertical,
            confidence,
            thickness: None,
        }
    }

    pub fn length(&self) -> f32 {
        self.p1.distance_to(&self.p2)
    }

    pub fn midpoint(&self) -> Point {
        Point::new((self.p1.x + self.p2.x) / 2.0, (self.p1.y + self.p2.y) / 2.0)
    }

    /// Fixed coordinate: y for horizontals, x for verticals.
    pub fn position(&self) -> f32 {
        match self.orientation {
            Orientation::Horizontal => self.p1.y,
            Orientation::Vertical => self.p1.x,
        }
    }
}

/// Classified line sets for one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectedLines {
    pub horizontal: Vec<DetectedLine>,
    pub vertical: Vec<DetectedLine>,
}

impl DetectedLines {
    pub fn is_empty(&self) -> bool {
        self.horizontal.is_empty() && self.vertical.is_empty()
    }

    pub fn total(&self) -> usize {
        self.horizontal.len() + self.vertical.len()
    }
}

/// Border lines removed from a page, grouped by side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BorderLines {
    pub top: Vec<DetectedLine>,
    pub bottom: Vec<DetectedLine>,
    pub left: Vec<DetectedLine>,
    pub right: Vec<DetectedLine>,
}

impl BorderLines {
    pub fn total(&self) -> usize {
        self.top.len() + self.bottom.len() + self.left.len() + self.right.len()
    }
}

/// The page area remaining after removing decorative border rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRegion {
    pub rect: Rect,
    pub borders: BorderLines,
    /// Detected-over-expected border ratio, in [0, 1].
    pub confidence: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_and_intersection() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        let inner = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(outer.contains_rect(&inner));
        assert!(!inner.contains_rect(&outer));
        assert!((outer.intersection_area(&inner) - 400.0).abs() < f32::EPSILON);
    }

    #[test]
    fn disjoint_rects_have_zero_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(50.0, 50.0, 10.0, 10.0);
        assert_eq!(a.intersection_area(&b), 0.0);
        assert_eq!(a.overlap_ratio(&b), 0.0);
    }

    #[test]
    fn identical_rects_have_full_overlap() {
        let a = Rect::new(5.0, 5.0, 30.0, 40.0);
        assert!((a.overlap_ratio(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn union_area_is_inclusive_exclusive() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 0.0, 10.0, 10.0);
        // 100 + 100 - 50
        assert!((a.union_area(&b) - 150.0).abs() < f32::EPSILON);
    }

    #[test]
    fn line_constructors_normalize_endpoint_order() {
        let h = DetectedLine::horizontal(90.0, 10.0, 5.0, 0.9);
        assert!(h.p1.x < h.p2.x);
        assert_eq!(h.orientation, Orientation::Horizontal);
        assert!((h.length() - 80.0).abs() < f32::EPSILON);

        let v = DetectedLine::vertical(5.0, 70.0, 20.0, 0.9);
        assert!(v.p1.y < v.p2.y);
        assert!((v.length() - 50.0).abs() < f32::EPSILON);
    }

    #[test]
    fn line_position_follows_orientation() {
        let h = DetectedLine::horizontal(0.0, 10.0, 42.0, 1.0);
        assert_eq!(h.position(), 42.0);
        let v = DetectedLine::vertical(17.0, 0.0, 10.0, 1.0);
        assert_eq!(v.position(), 17.0);
    }

    #[test]
    fn midpoint_is_halfway() {
        let h = DetectedLine::horizontal(0.0, 100.0, 10.0, 1.0);
        let m = h.midpoint();
        assert_eq!(m.x, 50.0);
        assert_eq!(m.y, 10.0);
    }
}
