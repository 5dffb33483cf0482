//! Pipeline configuration.
//!
//! One aggregate [`ExtractionConfig`] with per-stage sub-configs. All
//! defaults are tunable values derived from scanned Journal Officiel
//! layouts, not load-bearing contracts.

use serde::{Deserialize, Serialize};

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> &'static str {
    "legidoc=info"
}

/// Aggregate configuration for a pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub line: LineDetectConfig,
    pub border: BorderConfig,
    pub separator: SeparatorConfig,
    pub table: TableDetectConfig,
    pub ocr: OcrConfig,
    pub entity: EntityConfig,
    pub mapping: MappingConfig,
    pub validation: ValidationConfig,
    pub jobs: JobConfig,
}

/// Line detection tuning (morphology + run scan).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineDetectConfig {
    /// Square kernel size for dilation/erosion (morphological closing).
    pub kernel_size: u32,
    /// Binarization threshold on the 0-255 gray scale.
    pub binarize_threshold: u8,
    /// Minimum run length (pixels) to keep a candidate line.
    pub min_line_length: u32,
    /// Maximum gap (pixels) bridged when merging collinear runs.
    pub max_line_gap: u32,
    /// Lines below this confidence are discarded.
    pub confidence_threshold: f32,
}

impl Default for LineDetectConfig {
    fn default() -> Self {
        Self {
            kernel_size: 3,
            binarize_threshold: 128,
            min_line_length: 50,
            max_line_gap: 5,
            confidence_threshold: 0.5,
        }
    }
}

/// Border removal tuning. Journal Officiel pages carry a fixed count of
/// decorative rules per side (3 top, 2 elsewhere).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorderConfig {
    pub expected_top: usize,
    pub expected_bottom: usize,
    pub expected_left: usize,
    pub expected_right: usize,
    /// Search band near each edge, as a fraction of the page dimension.
    pub edge_band_ratio: f32,
    /// A border line must span at least this fraction of the page dimension.
    pub min_span_ratio: f32,
    /// Gap (pixels) between the innermost border and the content region.
    pub tolerance: f32,
}

impl Default for BorderConfig {
    fn default() -> Self {
        Self {
            expected_top: 3,
            expected_bottom: 2,
            expected_left: 2,
            expected_right: 2,
            edge_band_ratio: 0.12,
            min_span_ratio: 0.70,
            tolerance: 8.0,
        }
    }
}

/// Text-column separator tuning. Two-column legal layouts place a single
/// separator near the physical page center.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeparatorConfig {
    /// Maximum horizontal distance (pixels) from the region centerline.
    pub center_tolerance: f32,
    /// A separator must cover at least this fraction of the region height.
    pub min_height_ratio: f32,
    /// Distance (pixels) within which a crossing horizontal disqualifies.
    pub intersection_tolerance: f32,
}

impl Default for SeparatorConfig {
    fn default() -> Self {
        Self {
            center_tolerance: 40.0,
            min_height_ratio: 0.60,
            intersection_tolerance: 5.0,
        }
    }
}

/// Table detection tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDetectConfig {
    pub min_table_width: f32,
    pub min_table_height: f32,
    pub min_cell_size: f32,
    /// Distance (pixels) within which a horizontal and vertical line count
    /// as intersecting.
    pub intersection_tolerance: f32,
    pub confidence_threshold: f32,
}

impl Default for TableDetectConfig {
    fn default() -> Self {
        Self {
            min_table_width: 100.0,
            min_table_height: 50.0,
            min_cell_size: 20.0,
            intersection_tolerance: 5.0,
            confidence_threshold: 0.5,
        }
    }
}

/// OCR invocation tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Worker threads per language key.
    pub worker_count: usize,
    /// Default language hint ("fra", "ara", "fra+ara").
    pub default_language: String,
    /// Below this confidence the region is retried after enhancement.
    pub retry_threshold: f32,
    /// Whether the enhancement retry pass is enabled.
    pub retry_enabled: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            worker_count: 3,
            default_language: "fra".to_string(),
            retry_threshold: 0.60,
            retry_enabled: true,
        }
    }
}

/// Entity recognition tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Context window radius (characters) around each match.
    pub context_radius: usize,
    /// Matches below this confidence are discarded.
    pub confidence_threshold: f32,
    /// Maximum character distance for linking co-occurring entities.
    pub link_distance: usize,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            context_radius: 50,
            confidence_threshold: 0.45,
            link_distance: 120,
        }
    }
}

/// Form mapping tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Best suggestion below this becomes ambiguous instead of primary.
    pub confidence_threshold: f32,
    /// Alternatives retained per field for manual resolution.
    pub max_alternatives: usize,
    /// Word-overlap similarity required to re-apply a learned mapping.
    pub similarity_threshold: f32,
    /// Feedback records kept before oldest-first eviction.
    pub history_cap: usize,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.60,
            max_alternatives: 3,
            similarity_threshold: 0.70,
            history_cap: 500,
        }
    }
}

/// Validation tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Floor applied when violations down-weight a field confidence.
    pub confidence_floor: f32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            confidence_floor: 0.1,
        }
    }
}

/// Job/cache layer tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Concurrent heavy operations allowed.
    pub max_concurrent_jobs: usize,
    /// Cache byte ceiling before LRU eviction.
    pub cache_max_bytes: usize,
    /// Default cache entry TTL in seconds. None = no expiry.
    pub cache_ttl_secs: Option<u64>,
    /// Pages per chunk for progressive processing.
    pub chunk_size: usize,
    /// Retry attempts per chunk.
    pub max_retries: u32,
    /// Base backoff delay in milliseconds (doubles per attempt).
    pub backoff_base_ms: u64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 3,
            cache_max_bytes: 64 * 1024 * 1024,
            cache_ttl_secs: Some(30 * 60),
            chunk_size: 8,
            max_retries: 3,
            backoff_base_ms: 100,
        }
    }
}
