//! Axis normalization and percentage math.
//!
//! All functions work in the normalized travel space:
//!
//! ```text
//! 0        = pedal at rest (idle)
//! axis_max = pedal fully pressed
//! ```
//!
//! Integer math throughout; every percentage is floored.

/// Map a raw hardware reading into the normalized travel space.
///
/// Inverted hardware (idle near `axis_max`, pressed near 0) is mirrored when
/// `invert` is set. Readings above `axis_max` saturate at 0 instead of wrapping.
///
/// # Examples
///
/// ```
/// use pedalwatch_calibration::normalize_pedal_axis;
///
/// assert_eq!(normalize_pedal_axis(1000, 1023, true), 23);
/// assert_eq!(normalize_pedal_axis(1000, 1023, false), 1000);
/// ```
#[inline]
pub fn normalize_pedal_axis(raw: u32, axis_max: u32, invert: bool) -> u32 {
    if invert {
        axis_max.saturating_sub(raw)
    } else {
        raw
    }
}

/// `floor(100 * value / axis_max)`.
///
/// Returns 0 for a zero `axis_max`.
#[inline]
pub fn physical_pct(value: u32, axis_max: u32) -> u32 {
    if axis_max == 0 {
        return 0;
    }
    scale(u64::from(value), 100, u64::from(axis_max))
}

/// Remap a normalized value through idle/full thresholds into 0..=100.
///
/// - `full_min <= idle_max` (degenerate calibration) gives 0 for every value
/// - `value <= idle_max` gives 0
/// - `value >= full_min` gives 100
/// - otherwise `floor(100 * (value - idle_max) / (full_min - idle_max))`
///
/// # Examples
///
/// ```
/// use pedalwatch_calibration::compute_logical_pct;
///
/// assert_eq!(compute_logical_pct(32000, 3276, 60947), 49);
/// assert_eq!(compute_logical_pct(3000, 3276, 60947), 0);
/// assert_eq!(compute_logical_pct(62000, 3276, 60947), 100);
/// ```
pub fn compute_logical_pct(value: u32, idle_max: u32, full_min: u32) -> u32 {
    // Degenerate span: never divide by zero or by a negative range.
    if full_min <= idle_max {
        return 0;
    }
    if value <= idle_max {
        return 0;
    }
    if value >= full_min {
        return 100;
    }
    let span = u64::from(full_min - idle_max);
    scale(u64::from(value - idle_max), 100, span)
}

/// Convert a percentage of travel into axis units: `axis_max * pct / 100`.
#[inline]
pub fn threshold_from_pct(axis_max: u32, pct: u32) -> u32 {
    let units = scale(u64::from(axis_max), u64::from(pct), 100);
    units.min(axis_max)
}

/// `floor(numerator * factor / denominator)` in u64, saturated into u32.
fn scale(numerator: u64, factor: u64, denominator: u64) -> u32 {
    let product = numerator.saturating_mul(factor);
    let quotient = product.checked_div(denominator).unwrap_or(0);
    u32::try_from(quotient).unwrap_or(u32::MAX)
}
