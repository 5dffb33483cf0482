//! Page layout analysis: line detection, border removal, column separation
//! and table detection.
//!
//! The stages run in a fixed order. Raw rules come out of [`line_detect`],
//! [`border`] strips the decorative frame and yields the content region,
//! then [`separator`] and [`table_detect`] interpret the remaining rules
//! inside that region.

pub mod border;
pub mod line_detect;
pub mod separator;
pub mod table_detect;
pub mod types;

pub use border::BorderRemover;
pub use line_detect::{FixtureBackend, LineDetectBackend, LineDetector, MorphologicalBackend};
pub use separator::SeparatorDetector;
pub use table_detect::{TableCandidate, TableDetector, TableGrid};
pub use types::{
    BorderLines, ContentRegion, DetectedLine, DetectedLines, Orientation, Point, Rect,
};
