use super::Dynamic;

/// Generic formula failure.
pub const ERROR: &str = "#ERROR!";
/// AVERAGE over no values.
pub const DIV_ZERO: &str = "#DIV/0!";
/// The cell takes part in a reference cycle.
pub const CYCLE: &str = "#CYCLE!";
/// The formula mentions a reference that was deleted.
pub const REF: &str = "#REF!";

/// True for the sentinel strings a formula can evaluate to.
pub fn is_error_value(s: &str) -> bool {
    matches!(s, ERROR | DIV_ZERO | CYCLE | REF)
}

/// Format a Dynamic value for display. Only numbers are valid formula results.
pub fn format_dynamic(value: &Dynamic) -> String {
    if let Ok(n) = value.as_float() {
        format_number(n)
    } else if let Ok(n) = value.as_int() {
        format_number(n as f64)
    } else {
        ERROR.to_string()
    }
}

/// Format a number for display.
///
/// Whole numbers print without a fractional part. Everything else prints
/// with two decimals, and only an exact `.00` suffix is dropped, so `7.5`
/// shows as `7.50` while `2.999` rounds to `3`.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return ERROR.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.fract() == 0.0 {
        return format!("{:.0}", n);
    }
    let fixed = format!("{:.2}", n);
    match fixed.strip_suffix(".00") {
        Some("-0") => "0".to_string(),
        Some(whole) => whole.to_string(),
        None => fixed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_integers() {
        assert_eq!(format_number(15.0), "15");
        assert_eq!(format_number(-4.0), "-4");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1e15), "1000000000000000");
    }

    #[test]
    fn test_format_number_keeps_single_trailing_zero() {
        assert_eq!(format_number(7.5), "7.50");
        assert_eq!(format_number(0.1), "0.10");
        assert_eq!(format_number(1.234), "1.23");
        assert_eq!(format_number(-2.5), "-2.50");
    }

    #[test]
    fn test_format_number_strips_exact_double_zero() {
        assert_eq!(format_number(2.999), "3");
        assert_eq!(format_number(10.001), "10");
        assert_eq!(format_number(-0.001), "0");
    }

    #[test]
    fn test_format_number_non_finite_is_error() {
        assert_eq!(format_number(f64::INFINITY), ERROR);
        assert_eq!(format_number(f64::NAN), ERROR);
    }

    #[test]
    fn test_format_dynamic() {
        assert_eq!(format_dynamic(&Dynamic::from(3.25_f64)), "3.25");
        assert_eq!(format_dynamic(&Dynamic::from(4_i64)), "4");
        assert_eq!(format_dynamic(&Dynamic::from("x".to_string())), ERROR);
        assert_eq!(format_dynamic(&Dynamic::from(true)), ERROR);
    }

    #[test]
    fn test_is_error_value() {
        assert!(is_error_value("#ERROR!"));
        assert!(is_error_value("#CYCLE!"));
        assert!(!is_error_value("ERROR"));
    }
}
