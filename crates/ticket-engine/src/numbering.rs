//! Ticket number formatting and daily partitioning
//!
//! Ticket numbers are `<prefix>-<sequence>` where the prefix is a single
//! letter derived from the organization kind and the sequence is a per-day,
//! per-prefix counter starting at 1, zero-padded to three digits
//! (`A-007`). Sequences past 999 simply widen (`A-1000`). The day partition
//! is the calendar day under a fixed service-clock UTC offset, so every
//! branch of a deployment rolls its counters at the same wall-clock
//! midnight.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::directory::OrganizationKind;

/// Prefix used for organization kinds without a dedicated letter
pub const DEFAULT_PREFIX: char = 'Z';

impl OrganizationKind {
    /// Single-letter ticket number namespace for this organization kind
    ///
    /// # Examples
    ///
    /// ```
    /// use queuehub_ticket_engine::directory::OrganizationKind;
    ///
    /// assert_eq!(OrganizationKind::Bank.category_prefix(), 'A');
    /// assert_eq!(OrganizationKind::Other.category_prefix(), 'Z');
    /// ```
    pub fn category_prefix(self) -> char {
        match self {
            OrganizationKind::Bank => 'A',
            OrganizationKind::Clinic => 'B',
            OrganizationKind::Government => 'C',
            OrganizationKind::Passport => 'D',
            OrganizationKind::Tax => 'E',
            OrganizationKind::Other => DEFAULT_PREFIX,
        }
    }
}

/// Format a ticket number from its prefix and sequence
pub fn format_number(prefix: char, sequence: i64) -> String {
    format!("{}-{:03}", prefix, sequence)
}

/// Check a ticket number against the `^[A-Z]-\d{3,}$` contract
pub fn is_valid_number(number: &str) -> bool {
    let bytes = number.as_bytes();
    if bytes.len() < 5 {
        return false;
    }
    if !bytes[0].is_ascii_uppercase() || bytes[1] != b'-' {
        return false;
    }
    bytes[2..].iter().all(|b| b.is_ascii_digit())
}

/// Split a well-formed ticket number into its prefix and sequence
pub fn parse_number(number: &str) -> Option<(char, i64)> {
    if !is_valid_number(number) {
        return None;
    }
    let prefix = number.chars().next()?;
    let sequence = number[2..].parse::<i64>().ok()?;
    Some((prefix, sequence))
}

/// Calendar day under the pinned service clock
///
/// Counters partition on this day key; `timezone_offset_minutes` shifts
/// the UTC instant to the deployment's wall clock before taking the date.
pub fn day_key(now: DateTime<Utc>, timezone_offset_minutes: i32) -> NaiveDate {
    (now + Duration::minutes(timezone_offset_minutes as i64)).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn prefix_mapping_is_fixed() {
        assert_eq!(OrganizationKind::Bank.category_prefix(), 'A');
        assert_eq!(OrganizationKind::Clinic.category_prefix(), 'B');
        assert_eq!(OrganizationKind::Government.category_prefix(), 'C');
        assert_eq!(OrganizationKind::Passport.category_prefix(), 'D');
        assert_eq!(OrganizationKind::Tax.category_prefix(), 'E');
        assert_eq!(OrganizationKind::Other.category_prefix(), 'Z');
    }

    #[test]
    fn numbers_are_zero_padded_and_widen() {
        assert_eq!(format_number('A', 1), "A-001");
        assert_eq!(format_number('B', 42), "B-042");
        assert_eq!(format_number('C', 999), "C-999");
        assert_eq!(format_number('C', 1000), "C-1000");
    }

    #[test]
    fn number_format_contract() {
        assert!(is_valid_number("A-001"));
        assert!(is_valid_number("Z-123"));
        assert!(is_valid_number("E-12345"));
        assert!(!is_valid_number("A-01"));
        assert!(!is_valid_number("a-001"));
        assert!(!is_valid_number("AB-001"));
        assert!(!is_valid_number("A-00x"));
        assert!(!is_valid_number(""));
    }

    #[test]
    fn parse_recovers_prefix_and_sequence() {
        assert_eq!(parse_number("A-007"), Some(('A', 7)));
        assert_eq!(parse_number("Z-1000"), Some(('Z', 1000)));
        assert_eq!(parse_number("bogus"), None);
    }

    #[test]
    fn day_key_respects_service_clock_offset() {
        let late_evening = Utc.with_ymd_and_hms(2025, 3, 9, 23, 30, 0).unwrap();
        assert_eq!(
            day_key(late_evening, 0),
            NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()
        );
        // +60 minutes pushes the service clock past midnight
        assert_eq!(
            day_key(late_evening, 60),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );
        // Negative offsets pull the day back
        let just_after_midnight = Utc.with_ymd_and_hms(2025, 3, 10, 0, 30, 0).unwrap();
        assert_eq!(
            day_key(just_after_midnight, -60),
            NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()
        );
    }
}
