//! Display Rounding and Placeholders
//!
//! Values are carried unrounded through every computation; these helpers are
//! the only place rounding to 2 decimals happens.

/// Shown where a value cannot be computed (zero baseline, zero area, no data)
pub const PLACEHOLDER: &str = "-";

/// Shown in every predicted cell of a plot without a prediction
pub const NOT_AVAILABLE: &str = "NA";

/// Round half away from zero to 2 decimals
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    // Avoid rendering "-0.00"
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Two decimals, always (`12.50`)
pub fn fmt_fixed2(value: f64) -> String {
    format!("{:.2}", round2(value))
}

/// Two decimals with a trailing `.00` dropped (`12.50`, `250000`)
pub fn fmt_smart(value: f64) -> String {
    let fixed = fmt_fixed2(value);
    match fixed.strip_suffix(".00") {
        Some(whole) => whole.to_string(),
        None => fixed,
    }
}

/// `fmt_smart`, or the placeholder when the value is unavailable
pub fn fmt_optional(value: Option<f64>) -> String {
    value.map(fmt_smart).unwrap_or_else(|| PLACEHOLDER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(2.666_666), 2.67);
        assert_eq!(round2(-1.234), -1.23);
        assert_eq!(round2(-0.001), 0.0);
        assert!(round2(-0.001).is_sign_positive());
    }

    #[test]
    fn test_fmt_smart() {
        assert_eq!(fmt_smart(250_000.0), "250000");
        assert_eq!(fmt_smart(12.5), "12.50");
        assert_eq!(fmt_smart(2.666_666), "2.67");
        assert_eq!(fmt_smart(-0.001), "0");
    }

    #[test]
    fn test_fmt_optional() {
        assert_eq!(fmt_optional(None), "-");
        assert_eq!(fmt_optional(Some(3.0)), "3");
    }
}
