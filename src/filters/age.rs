//! "Time ago" normalization.
//!
//! Months are 30 days and years 365 days on both sides of the comparison.
//! This is an approximation of calendar math and is kept as such.

use crate::core::types::{AgeFilter, AgeUnit};
use regex::Regex;
use std::sync::OnceLock;

static RELATIVE_AGE: OnceLock<Regex> = OnceLock::new();

fn relative_age() -> &'static Regex {
    RELATIVE_AGE.get_or_init(|| {
        Regex::new(r"(?i)\b(an?|\d+)\s+(day|week|month|year)s?\b")
            .expect("valid relative-age regex")
    })
}

pub fn unit_days(unit: AgeUnit) -> u32 {
    match unit {
        AgeUnit::Days => 1,
        AgeUnit::Weeks => 7,
        AgeUnit::Months => 30,
        AgeUnit::Years => 365,
    }
}

/// Filter side: `(value, unit)` to a day count.
pub fn threshold_days(value: u32, unit: AgeUnit) -> u32 {
    value.saturating_mul(unit_days(unit))
}

/// Item side: `"3 weeks ago"` → `Some(21)`, `"a year ago"` → `Some(365)`.
///
/// Anything without a `(a|an|N) (day|week|month|year)[s]` phrase is unknown.
pub fn age_in_days(text: &str) -> Option<u32> {
    let caps = relative_age().captures(text)?;
    let amount = caps.get(1)?.as_str();
    let amount: u32 = if amount.eq_ignore_ascii_case("a") || amount.eq_ignore_ascii_case("an") {
        1
    } else {
        amount.parse().ok()?
    };
    let unit = AgeUnit::parse_str(caps.get(2)?.as_str())?;
    Some(threshold_days(amount, unit))
}

/// An item is "older than" the filter when its age is strictly greater.
pub fn is_older_than(age_days: u32, filter: &AgeFilter) -> bool {
    age_days > filter.threshold_days
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_side_parsing() {
        assert_eq!(age_in_days("a year ago"), Some(365));
        assert_eq!(age_in_days("3 weeks ago"), Some(21));
        assert_eq!(age_in_days("An hour... no, 2 Months ago"), Some(60));
        assert_eq!(age_in_days("Streamed 1 day ago"), Some(1));
        assert_eq!(age_in_days("garbage"), None);
        assert_eq!(age_in_days("5 hours ago"), None);
    }

    #[test]
    fn test_filter_side() {
        assert_eq!(threshold_days(2, AgeUnit::Weeks), 14);
        assert_eq!(threshold_days(6, AgeUnit::Months), 180);
        assert_eq!(threshold_days(1, AgeUnit::Years), 365);
        assert_eq!(AgeFilter::new(10, AgeUnit::Days).threshold_days, 10);
    }

    #[test]
    fn test_boundary_is_strict() {
        let filter = AgeFilter::new(1, AgeUnit::Months);
        assert!(!is_older_than(30, &filter));
        assert!(is_older_than(31, &filter));
    }

    #[test]
    fn test_huge_values_saturate() {
        assert_eq!(threshold_days(u32::MAX, AgeUnit::Years), u32::MAX);
    }
}
