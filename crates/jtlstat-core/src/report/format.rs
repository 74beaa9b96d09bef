/// Round to two decimal places. Non-finite values pass through unchanged.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Render a derived metric for the text report.
///
/// Uses the shortest decimal form (`150`, `0.75`) and spells out non-finite
/// values as `Infinity`, `-Infinity` and `NaN`, which is what existing JTL
/// summary consumers expect.
pub fn format_metric(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "Infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if value == 0.0 {
        // Collapses -0.0 as well.
        "0".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_cases() {
        assert_eq!(round2(3.333_333), 3.33);
        assert_eq!(round2(0.666_666), 0.67);
        assert_eq!(round2(150.0), 150.0);
        assert!(round2(f64::INFINITY).is_infinite());
        assert!(round2(f64::NAN).is_nan());
    }

    #[test]
    fn format_integral_without_fraction() {
        assert_eq!(format_metric(150.0), "150");
        assert_eq!(format_metric(1024.0), "1024");
    }

    #[test]
    fn format_fractional_shortest() {
        assert_eq!(format_metric(0.75), "0.75");
        assert_eq!(format_metric(1.5), "1.5");
        assert_eq!(format_metric(round2(2.0 / 3.0)), "0.67");
    }

    #[test]
    fn format_zero_and_negative_zero() {
        assert_eq!(format_metric(0.0), "0");
        assert_eq!(format_metric(-0.0), "0");
    }

    #[test]
    fn format_non_finite() {
        assert_eq!(format_metric(f64::INFINITY), "Infinity");
        assert_eq!(format_metric(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_metric(f64::NAN), "NaN");
    }
}
