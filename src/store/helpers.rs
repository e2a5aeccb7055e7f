/// Parses a number that was written with the writer's locale.
///
/// The last `.` or `,` is the decimal separator; every other `.`, `,` or
/// space before it is a grouping separator. `"12,345"` and `"1.234,5"` read as
/// `12.345` and `1234.5`.
pub fn parse_localized_decimal(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let normalized = match trimmed.rfind(|c: char| c == '.' || c == ',') {
        Some(index) => {
            let (integer, fraction) = trimmed.split_at(index);
            let integer: String = integer
                .chars()
                .filter(|c| !matches!(c, '.' | ',' | ' ' | '\u{a0}'))
                .collect();
            format!("{integer}.{}", &fraction[1..])
        }
        None => trimmed.to_string(),
    };

    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
