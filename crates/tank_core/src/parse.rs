//! Locale-flexible numeric input normalizer.

/// Parse decimal text, accepting both `.` and `,` as the separator.
///
/// Empty and non-numeric input yield `None`, never zero.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.replace(',', ".").parse::<f64>().ok()
}
