//! Mapping simulation steps onto calendar months for reporting.

/// Abbreviated month names
pub const ALL_MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Index of the month in which the financial year starts (April)
const FISCAL_START_MONTH: i64 = 3;

/// The name of the month `elapsed` months after the start of the financial year
pub fn month_name(elapsed: i64) -> &'static str {
    ALL_MONTHS[(FISCAL_START_MONTH + elapsed).rem_euclid(12) as usize]
}

/// A label for log messages at the given step, e.g. `Month: 1 (apr)`.
///
/// Step 1 is the first month of the financial year.
pub fn timestamp(step: u32) -> String {
    format!("Month: {step} ({})", month_name(i64::from(step) - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "apr")]
    #[case(8, "dec")]
    #[case(9, "jan")]
    #[case(12, "apr")]
    #[case(-1, "mar")]
    fn test_month_name(#[case] elapsed: i64, #[case] expected: &str) {
        assert_eq!(month_name(elapsed), expected);
    }

    #[test]
    fn test_timestamp() {
        assert_eq!(timestamp(0), "Month: 0 (mar)");
        assert_eq!(timestamp(1), "Month: 1 (apr)");
    }
}
