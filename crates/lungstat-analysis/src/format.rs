//! Number formatting for report cells.
//!
//! Report cells follow two rules:
//!
//! - [`round_half_even`] scales by a power of ten, rounds half to even on
//!   the scaled binary value and scales back, the way numpy and pandas round.
//! - [`display_float`] renders the shortest string that round-trips to the
//!   same `f64`, always with a fractional part (`25.0`, not `25`).
//!
//! Rounding and display are separate steps, so a value computed after
//! rounding (for example a rounded proportion scaled by 100) keeps any
//! binary artifact in its display.

/// Rounds `value` to `decimals` decimal places.
///
/// Computes `(value * 10^decimals).round_ties_even() / 10^decimals`, so ties
/// are decided on the scaled `f64` rather than on the exact decimal
/// expansion of `value`. Non-finite values are returned unchanged.
///
/// ```
/// # use lungstat_analysis::format::round_half_even;
/// assert_eq!(round_half_even(62.447_368, 1), 62.4);
/// assert_eq!(round_half_even(2.5, 0), 2.0);
/// assert_eq!(round_half_even(0.125, 2), 0.12);
/// // 2.675 * 100 is exactly 267.5 in binary
/// assert_eq!(round_half_even(2.675, 2), 2.68);
/// // 27 / 60 is stored just above 0.45, but scales to exactly 4.5
/// assert_eq!(round_half_even(27.0 / 60.0, 1), 0.4);
/// assert!(round_half_even(f64::NAN, 1).is_nan());
/// ```
#[must_use]
pub fn round_half_even(value: f64, decimals: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let Ok(exponent) = i32::try_from(decimals) else {
        return value;
    };
    let scale = 10_f64.powi(exponent);
    let scaled = value * scale;
    if !scale.is_finite() || !scaled.is_finite() {
        return value;
    }
    scaled.round_ties_even() / scale
}

/// Renders `value` as the shortest round-trip decimal with a fractional part.
///
/// ```
/// # use lungstat_analysis::format::display_float;
/// assert_eq!(display_float(25.0), "25.0");
/// assert_eq!(display_float(17.5), "17.5");
/// assert_eq!(display_float(0.07 * 100.0), "7.000000000000001");
/// assert_eq!(display_float(-3.0), "-3.0");
/// assert_eq!(display_float(f64::NAN), "nan");
/// assert_eq!(display_float(f64::NEG_INFINITY), "-inf");
/// ```
#[must_use]
pub fn display_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_owned();
    }
    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}

/// Rounds then displays, the combination used for most statistic cells.
#[must_use]
pub fn display_rounded(value: f64, decimals: usize) -> String {
    display_float(round_half_even(value, decimals))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_zero_keeps_sign() {
        assert_eq!(display_rounded(-0.04, 1), "-0.0");
    }

    #[test]
    fn test_rounding_more_places_than_needed() {
        assert_eq!(display_rounded(1.5, 4), "1.5");
        assert_eq!(display_rounded(100.0, 4), "100.0");
    }

    #[test]
    fn test_proportion_artifacts_survive() {
        // Rounded proportion scaled to a percentage
        assert_eq!(display_float(round_half_even(3.0 / 5.0, 1) * 100.0), "60.0");
        assert_eq!(display_float(round_half_even(2.0 / 5.0, 1) * 100.0), "40.0");
        assert_eq!(
            display_float(round_half_even(7.0 / 100.0, 2) * 100.0),
            "7.000000000000001"
        );
    }

    #[test]
    fn test_ties_decided_on_scaled_value() {
        assert_eq!(display_float(round_half_even(27.0 / 60.0, 1) * 100.0), "40.0");
        assert_eq!(display_float(round_half_even(33.0 / 60.0, 1) * 100.0), "60.0");
        assert_eq!(round_half_even(1.0 / 8.0, 2), 0.12);
        assert_eq!(round_half_even(5.0 / 8.0, 2), 0.62);
        assert_eq!(round_half_even(-2.5, 0), -2.0);
    }

    #[test]
    fn test_extreme_decimals_leave_value_unchanged() {
        assert_eq!(round_half_even(1.234, 400), 1.234);
        assert_eq!(round_half_even(1e300, 20), 1e300);
    }
}
