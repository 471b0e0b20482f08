// ABOUTME: Display helpers shared by the table and dashboard renderers
// Currency grouping, optional-value placeholders and column truncation

/// Formats an amount as dollars with thousands separators, e.g. `$1,250,000.50`.
/// Whole amounts drop the cents.
pub fn format_amount(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    if frac == 0 {
        format!("{}${}", sign, grouped)
    } else {
        format!("{}${}.{:02}", sign, grouped, frac)
    }
}

/// Renders an optional value, falling back to `N/A`.
pub fn format_optional<T: std::fmt::Display>(value: Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "N/A".to_string(),
    }
}

/// Truncates to `max` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let kept: String = text.chars().take(max - 1).collect();
    format!("{}…", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount_groups_thousands() {
        assert_eq!(format_amount(0.0), "$0");
        assert_eq!(format_amount(950.0), "$950");
        assert_eq!(format_amount(1_250_000.0), "$1,250,000");
        assert_eq!(format_amount(1234.5), "$1,234.50");
        assert_eq!(format_amount(-42_000.25), "-$42,000.25");
    }

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(Some(7.5)), "7.5");
        assert_eq!(format_optional::<f64>(None), "N/A");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long address line", 8), "a very …");
        assert_eq!(truncate("abc", 0), "");
    }
}
