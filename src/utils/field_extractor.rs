//! Tolerant Field Extraction
//!
//! Spreadsheet headers differ between sources ("Expected Yield", "exp_yield",
//! "EXPECTED_YIELD"). Instead of a fixed schema, each logical field is described
//! by an ordered list of case-insensitive substrings.
//!
//! Lookup order: for each candidate (priority order), the FIRST column in row
//! order whose lower-cased name contains it is examined. A numeric lookup that
//! lands on a non-numeric value falls through to the next candidate.
//!
//! When two logical fields share an ambiguous substring, the first candidate in
//! priority order wins. Overlaps are not resolved any further.

use crate::data::{RawRow, Scalar};

/// Candidate substrings for every logical field the normalizer reads
pub mod candidates {
    pub const PLOT_NAME: &[&str] = &["ca name"];
    pub const AUDITED_AREA: &[&str] = &["audited area", "area"];

    pub const EXPECTED_YIELD: &[&str] = &["expected yield", "exp_yield"];
    pub const REESTIMATED_YIELD: &[&str] = &["re-estimated yield", "re_yield"];
    pub const EXPECTED_HARVEST: &[&str] = &["expected harvest", "exp_harvest"];
    pub const REESTIMATED_HARVEST: &[&str] = &["re-estimated harvest", "re_harvest"];

    pub const PREDICTED_YIELD_MIN: &[&str] =
        &["yield min predicted", "min predicted yield", "predicted yield min"];
    pub const PREDICTED_YIELD_MAX: &[&str] =
        &["yield max predicted", "max predicted yield", "predicted yield max"];
    pub const PREDICTED_HARVEST_MIN: &[&str] =
        &["harvest min predicted", "min predicted harvest", "predicted harvest min"];
    pub const PREDICTED_HARVEST_MAX: &[&str] =
        &["harvest max predicted", "max predicted harvest", "predicted harvest max"];
}

/// First cell (in column order) whose name contains `candidate`, case-insensitive
fn find_cell<'a>(row: &'a RawRow, candidate: &str) -> Option<&'a Scalar> {
    let needle = candidate.to_lowercase();
    row.iter()
        .find(|(name, _)| name.to_lowercase().contains(&needle))
        .map(|(_, value)| value)
}

/// Numeric value of the best-matching column, or 0
pub fn extract_numeric(row: &RawRow, candidates: &[&str]) -> f64 {
    candidates
        .iter()
        .filter_map(|candidate| find_cell(row, candidate))
        .find_map(scalar_to_number)
        .unwrap_or(0.0)
}

/// Raw value of the best-matching column, or `Scalar::Empty`
///
/// Unlike `extract_numeric` this never falls through: the first candidate that
/// matches any column decides the result, whatever the value is.
pub fn extract_text(row: &RawRow, candidates: &[&str]) -> Scalar {
    candidates
        .iter()
        .find_map(|candidate| find_cell(row, candidate))
        .cloned()
        .unwrap_or(Scalar::Empty)
}

/// Interpret a cell as a number the way spreadsheet users expect
///
/// Numbers pass through, text yields its leading decimal prefix
/// (`"12.5 ha"` → 12.5). NaN and infinities count as "not a number".
pub fn scalar_to_number(value: &Scalar) -> Option<f64> {
    let parsed = match value {
        Scalar::Number(n) => Some(*n),
        Scalar::Text(s) => parse_leading_float(s),
        Scalar::Empty => None,
    };
    parsed.filter(|n| n.is_finite())
}

/// Parse the longest leading `[+-]digits[.digits][e[+-]digits]` prefix
pub fn parse_leading_float(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    // Exponent only counts when followed by at least one digit
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> RawRow {
        RawRow::new()
            .with("CA Name", "Plot A")
            .with("EXPECTED_YIELD", "NA")
            .with("exp_yield", 2.5)
            .with("Audited Area (Acres)", "12.5 ac")
    }

    #[test]
    fn test_case_insensitive_substring_match() {
        let row = RawRow::new().with("Yield Min Predicted (t/ha)", "1.75");
        assert_eq!(extract_numeric(&row, candidates::PREDICTED_YIELD_MIN), 1.75);
    }

    #[test]
    fn test_non_numeric_falls_through_to_next_candidate() {
        let row = RawRow::new()
            .with("Expected Yield", "NA")
            .with("exp_yield", 2.5);
        assert_eq!(extract_numeric(&row, candidates::EXPECTED_YIELD), 2.5);
        assert_eq!(extract_numeric(&self::row(), candidates::EXPECTED_YIELD), 2.5);
    }

    #[test]
    fn test_only_first_matching_column_is_examined() {
        // Second "expected yield" column is never reached for that candidate
        let row = RawRow::new()
            .with("Expected Yield (old)", "NA")
            .with("Expected Yield", 3.0);
        assert_eq!(extract_numeric(&row, candidates::EXPECTED_YIELD), 0.0);
    }

    #[test]
    fn test_first_candidate_wins_on_ambiguity() {
        let row = RawRow::new()
            .with("Total Area", 99.0)
            .with("Audited Area", 10.0);
        assert_eq!(extract_numeric(&row, candidates::AUDITED_AREA), 10.0);
        assert_eq!(extract_numeric(&row, &["area", "audited area"]), 99.0);
    }

    #[test]
    fn test_missing_field_is_zero() {
        assert_eq!(extract_numeric(&row(), candidates::PREDICTED_HARVEST_MAX), 0.0);
    }

    #[test]
    fn test_extract_text() {
        assert_eq!(extract_text(&row(), candidates::PLOT_NAME), Scalar::Text("Plot A".to_string()));
        assert_eq!(
            extract_text(&row(), candidates::AUDITED_AREA),
            Scalar::Text("12.5 ac".to_string())
        );
        assert_eq!(extract_text(&row(), &["nothing"]), Scalar::Empty);
    }

    #[test]
    fn test_parse_leading_float() {
        assert_eq!(parse_leading_float("12.5 ha"), Some(12.5));
        assert_eq!(parse_leading_float("  -3"), Some(-3.0));
        assert_eq!(parse_leading_float(".5"), Some(0.5));
        assert_eq!(parse_leading_float("7."), Some(7.0));
        assert_eq!(parse_leading_float("1e3x"), Some(1000.0));
        assert_eq!(parse_leading_float("2e"), Some(2.0));
        assert_eq!(parse_leading_float("NA"), None);
        assert_eq!(parse_leading_float(""), None);
        assert_eq!(parse_leading_float("-"), None);
        assert_eq!(parse_leading_float("."), None);
    }

    #[test]
    fn test_nan_is_not_numeric() {
        assert_eq!(scalar_to_number(&Scalar::Number(f64::NAN)), None);
        assert_eq!(scalar_to_number(&Scalar::Empty), None);
    }
}
