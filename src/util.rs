// Utility helpers for parsing sheet cells and formatting numbers.
//
// Sheet cells arrive as untyped text, so everything that turns a cell into a
// number lives here and never fails: bad input becomes 0.
use num_format::{Locale, ToFormattedString};

/// Parse a count cell the way a spreadsheet user would read it.
///
/// - Trims whitespace and drops thousands separators (`"1,234"` is 1234).
///   This is deliberate: a plain integer parse would stop at the comma and
///   read 1.
/// - Reads the leading base-10 digits and ignores any trailing text
///   (`"42 members"` is 42).
/// - Anything without leading digits, or a negative number, is 0.
pub fn parse_count(s: &str) -> u64 {
    let s = s.trim().replace(',', "");
    let s = s.strip_prefix('+').unwrap_or(&s);
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 0;
    }
    // Saturate instead of wrapping on absurdly long digit runs.
    digits.parse::<u64>().unwrap_or(u64::MAX)
}

/// Case-insensitive substring test. An empty needle always matches.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals with locale thousands separators (e.g. `1,234.5`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let int_val: u64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = parts.next() {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Render a growth percentage for a year card; `None` means there is no
/// older year to compare against.
pub fn format_growth(growth: Option<f64>) -> String {
    match growth {
        Some(g) if g >= 0.0 => format!("+{}% YoY", format_number(g, 1)),
        Some(g) => format!("{}% YoY", format_number(g, 1)),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_count_is_forgiving() {
        assert_eq!(parse_count("42"), 42);
        assert_eq!(parse_count(" 1,234 "), 1234);
        assert_eq!(parse_count("17 members"), 17);
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("n/a"), 0);
        assert_eq!(parse_count("-5"), 0);
        assert_eq!(parse_count("+8"), 8);
    }

    #[test]
    fn contains_ci_ignores_case() {
        assert!(contains_ci("GDB London", "london"));
        assert!(contains_ci("anything", ""));
        assert!(!contains_ci("Paris", "london"));
    }

    #[test]
    fn formats_numbers() {
        assert_eq!(format_int(1234567u64), "1,234,567");
        assert_eq!(format_number(1234.567, 2), "1,234.57");
        assert_eq!(format_number(-12.0, 1), "-12.0");
        assert_eq!(format_growth(Some(25.0)), "+25.0% YoY");
        assert_eq!(format_growth(Some(-50.0)), "-50.0% YoY");
        assert_eq!(format_growth(None), "n/a");
    }
}
