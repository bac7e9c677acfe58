//! Parsers for the free-form text fields a listing form produces.
//!
//! The lenient parsers return `None` (or [`Field::Defaulted`]) instead of an
//! error; the caller decides which default to substitute and records a
//! [`Diagnostic`](super::Diagnostic) so the substitution stays visible.

const STOREY_SEPARATOR: &str = " TO ";
const LEASE_UNIT_WORDS: [&str; 4] = ["years", "year", "months", "month"];

/// A value that was either read from the input or substituted with a default
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<T> {
    Parsed(T),
    Defaulted(T),
}

impl<T: Copy> Field<T> {
    pub fn value(&self) -> T {
        match self {
            Self::Parsed(value) | Self::Defaulted(value) => *value,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Self::Defaulted(_))
    }
}

/// Midpoint of a storey range such as `"07 TO 09"`.
pub fn parse_storey_midpoint(text: &str) -> Option<f32> {
    let (lower, upper) = text.split_once(STOREY_SEPARATOR)?;
    let lower: f32 = lower.trim().parse().ok()?;
    let upper: f32 = upper.trim().parse().ok()?;
    Some((lower + upper) / 2.0)
}

/// Remaining lease in years.
///
/// Accepts a plain number (`"75.5"`) or a years/months phrase such as
/// `"75 years 03 months"`, `"61 years"` or `"70 YEARS 6 MONTHS"`.
pub fn parse_remaining_lease_years(text: &str) -> Option<f32> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(years) = text.parse::<f32>() {
        return Some(years);
    }

    let mut stripped = text.to_lowercase();
    // Longer words first so "years" is not left as a dangling "s".
    for word in LEASE_UNIT_WORDS {
        stripped = stripped.replace(word, " ");
    }

    let mut tokens = stripped.split_whitespace();
    let years: i32 = tokens.next()?.parse().ok()?;
    let months: i32 = match tokens.next() {
        Some(token) => token.parse().ok()?,
        None => 0,
    };
    Some(years as f32 + months as f32 / 12.0)
}

/// Year of a `"YYYY-MM"` reference month, or `fallback` when the text does
/// not follow that pattern.
pub fn parse_reference_year(text: &str, fallback: i32) -> Field<f32> {
    match split_year_month(text.trim()) {
        Some(year) => Field::Parsed(year as f32),
        None => Field::Defaulted(fallback as f32),
    }
}

fn split_year_month(text: &str) -> Option<i32> {
    let (year, month) = text.split_once('-')?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if month.is_empty() || month.len() > 2 || !month.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let month: u32 = month.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    year.parse().ok()
}

/// Age of a flat relative to the model's fixed anchor year.
pub fn compute_flat_age(current_reference_year: i32, lease_commence_year: i32) -> f32 {
    (i64::from(current_reference_year) - i64::from(lease_commence_year)) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storey_midpoint() {
        assert_eq!(parse_storey_midpoint("07 TO 09"), Some(8.0));
        assert_eq!(parse_storey_midpoint("10 TO 12"), Some(11.0));
        assert_eq!(parse_storey_midpoint("01 TO 05"), Some(3.0));
    }

    #[test]
    fn test_storey_midpoint_malformed() {
        assert_eq!(parse_storey_midpoint("07 to 09"), None);
        assert_eq!(parse_storey_midpoint("07-09"), None);
        assert_eq!(parse_storey_midpoint("07 TO "), None);
        assert_eq!(parse_storey_midpoint("AB TO 09"), None);
        assert_eq!(parse_storey_midpoint(""), None);
    }

    #[test]
    fn test_remaining_lease_formats() {
        assert_eq!(parse_remaining_lease_years("75 years 00 months"), Some(75.0));
        assert_eq!(parse_remaining_lease_years("75.5"), Some(75.5));
        assert_eq!(parse_remaining_lease_years("61 years"), Some(61.0));
        assert_eq!(parse_remaining_lease_years("70 YEARS 06 MONTHS"), Some(70.5));
        assert_eq!(parse_remaining_lease_years("1 year 1 month"), Some(1.0 + 1.0 / 12.0));
    }

    #[test]
    fn test_remaining_lease_absent() {
        assert_eq!(parse_remaining_lease_years(""), None);
        assert_eq!(parse_remaining_lease_years("   "), None);
        assert_eq!(parse_remaining_lease_years("years"), None);
        assert_eq!(parse_remaining_lease_years("seventy years"), None);
        assert_eq!(parse_remaining_lease_years("75 years six months"), None);
    }

    #[test]
    fn test_reference_year() {
        assert_eq!(parse_reference_year("2019-06", 2024), Field::Parsed(2019.0));
        assert_eq!(parse_reference_year(" 2021-1 ", 2024), Field::Parsed(2021.0));
    }

    #[test]
    fn test_reference_year_fallback() {
        for text in ["", "2019", "19-06", "2019-13", "2019-00", "June 2019", "2019/06"] {
            let year = parse_reference_year(text, 2024);
            assert!(year.is_default(), "'{}' should fall back", text);
            assert_eq!(year.value(), 2024.0);
        }
    }

    #[test]
    fn test_flat_age() {
        assert_eq!(compute_flat_age(2024, 1990), 34.0);
        assert_eq!(compute_flat_age(2024, 2024), 0.0);
        assert_eq!(compute_flat_age(2024, 2030), -6.0);
    }

    #[test]
    fn test_flat_age_extreme_years_do_not_overflow() {
        assert_eq!(compute_flat_age(2024, i32::MIN), 2024.0 + 2_147_483_648.0);
        assert_eq!(compute_flat_age(i32::MIN, i32::MAX), -4_294_967_295.0);
    }
}
