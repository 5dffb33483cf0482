//! Central confidence-combination policy.
//!
//! Every stage that produces or adjusts a confidence goes through these
//! helpers, so tests can assert exact scores instead of "reasonable" ranges.

/// Confidence thresholds used across the pipeline.
pub mod thresholds {
    /// Below this: the stage likely failed. Results are degraded defaults.
    pub const VERY_LOW: f32 = 0.30;

    /// Below this: significant uncertainty. Flag all derived values.
    pub const LOW: f32 = 0.50;

    /// Below this: some uncertainty. Mapping suggestions become ambiguous.
    pub const MODERATE: f32 = 0.70;

    /// Above this: high confidence. No special flagging.
    pub const HIGH: f32 = 0.85;

    /// Above this: very high confidence. Clean geometry or exact match.
    pub const VERY_HIGH: f32 = 0.95;
}

/// Clamp a confidence into [0, 1]. NaN collapses to 0.
pub fn clamp(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Weighted mean of (value, weight) pairs, clamped into [0, 1].
/// Returns 0.0 when the total weight is zero.
pub fn blend(parts: &[(f32, f32)]) -> f32 {
    let total_weight: f32 = parts.iter().map(|(_, w)| w).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    let weighted: f32 = parts.iter().map(|(v, w)| v * w).sum();
    clamp(weighted / total_weight)
}

/// Down-weight a confidence by a multiplicative factor, never going
/// below `floor`. Used by the validator (x0.5 error, x0.8 warning,
/// x0.95 info, floor 0.1).
pub fn penalize(confidence: f32, factor: f32, floor: f32) -> f32 {
    clamp((confidence * factor).max(floor))
}

/// Add a bonus to a base confidence, capped at 1.0.
pub fn bonus(confidence: f32, amount: f32) -> f32 {
    clamp(confidence + amount)
}

/// Mean of a slice of confidences. Empty slice yields 0.0.
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    clamp(values.iter().sum::<f32>() / values.len() as f32)
}
