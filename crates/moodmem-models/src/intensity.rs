//! Intensity and label normalization.
//!
//! Upstream classifiers report intensity on a 1..5 scale. Every average kept
//! by the memory layers works on the normalized [0, 1] value.

/// Upper bound of the raw classifier intensity scale.
pub const RAW_INTENSITY_MAX: f64 = 5.0;

/// Normalize a raw 1..5 intensity to [0, 1].
///
/// Out-of-range inputs are clamped; non-finite inputs count as 0.
pub fn intensity01(raw: f64) -> f64 {
    if !raw.is_finite() {
        return 0.0;
    }
    (raw / RAW_INTENSITY_MAX).clamp(0.0, 1.0)
}

/// Canonical form of an emotion label (`" anxious "` -> `"ANXIOUS"`).
///
/// Returns `None` for blank labels.
pub fn normalize_label(label: &str) -> Option<String> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}
