//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use chrono::{DateTime, Utc, Duration};
use uuid::Uuid;

/// Generate a new UUID v4
pub fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Format a timestamp for display
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Format the time remaining until an event starts
pub fn format_countdown(start_date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = start_date.signed_duration_since(now);

    if diff <= Duration::zero() {
        "Already started".to_string()
    } else if diff < Duration::hours(1) {
        format!("Starts in {} minutes", std::cmp::max(diff.num_minutes(), 1))
    } else if diff < Duration::days(1) {
        format!("Starts in {} hours", diff.num_hours())
    } else {
        format!("Starts in {} days", diff.num_days())
    }
}

/// Format a ticket price in cents for display, free events get a label
pub fn format_price(price_cents: i64) -> String {
    if price_cents <= 0 {
        "Free".to_string()
    } else {
        format!("${}.{:02}", price_cents / 100, price_cents % 100)
    }
}

/// Truncate text to a maximum length with ellipsis
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.len() <= max_length {
        text.to_string()
    } else {
        format!("{}...", &text[..max_length.saturating_sub(3)])
    }
}

/// Validate email format
pub fn is_valid_email(email: &str) -> bool {
    email.contains('@') && email.contains('.') && email.len() > 5
}

/// Validate phone number format (basic validation)
pub fn is_valid_phone(phone: &str) -> bool {
    phone.chars().all(|c| c.is_ascii_digit() || c == '+' || c == '-' || c == ' ')
        && phone.len() >= 10
}

/// Parse a user-entered price into cents, accepts "12", "12.5", "12.50"
pub fn parse_price(input: &str) -> Option<i64> {
    let trimmed = input.trim().trim_start_matches('$');
    if trimmed.is_empty() {
        return None;
    }

    match trimmed.split_once('.') {
        None => trimmed.parse::<i64>().ok().map(|d| d * 100),
        Some((dollars, cents)) => {
            if cents.len() > 2 || cents.is_empty() {
                return None;
            }
            let d = dollars.parse::<i64>().ok()?;
            let mut c = cents.parse::<i64>().ok()?;
            if cents.len() == 1 {
                c *= 10;
            }
            Some(d * 100 + c)
        }
    }
}

/// Sanitize a logical name for use as an object storage key segment
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generate_uuid_is_unique() {
        assert_ne!(generate_uuid(), generate_uuid());
        assert_eq!(generate_uuid().len(), 36);
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 8), "hello...");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(0), "Free");
        assert_eq!(format_price(-5), "Free");
        assert_eq!(format_price(500), "$5.00");
        assert_eq!(format_price(1250), "$12.50");
        assert_eq!(format_price(1205), "$12.05");
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("12"), Some(1200));
        assert_eq!(parse_price("$12.50"), Some(1250));
        assert_eq!(parse_price("12.5"), Some(1250));
        assert_eq!(parse_price("0"), Some(0));
        assert_eq!(parse_price("12.345"), None);
        assert_eq!(parse_price("abc"), None);
        assert_eq!(parse_price(""), None);
    }

    #[test]
    fn test_format_countdown() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let soon = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap();
        let tomorrow = Utc.with_ymd_and_hms(2024, 6, 2, 14, 0, 0).unwrap();
        let next_week = Utc.with_ymd_and_hms(2024, 6, 8, 12, 0, 0).unwrap();
        let past = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        assert_eq!(format_countdown(soon, now), "Starts in 30 minutes");
        assert_eq!(format_countdown(tomorrow, now), "Starts in 26 hours");
        assert_eq!(format_countdown(next_week, now), "Starts in 7 days");
        assert_eq!(format_countdown(past, now), "Already started");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Summer Dance 2024!"), "Summer_Dance_2024_");
        assert_eq!(sanitize_filename("  padded  "), "padded");
        assert_eq!(sanitize_filename("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_filename("fine-name_1.jpg"), "fine-name_1.jpg");
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("user@example.com"));
        assert!(!is_valid_email("nope"));
        assert!(!is_valid_email("a@b"));
    }

    #[test]
    fn test_is_valid_phone() {
        assert!(is_valid_phone("+1 780-555-0199"));
        assert!(!is_valid_phone("call me"));
        assert!(!is_valid_phone("123"));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn sanitize_filename_never_emits_path_characters(input in ".*") {
                let sanitized = sanitize_filename(&input);
                prop_assert!(!sanitized.contains('/'));
                prop_assert!(!sanitized.contains('\\'));
                prop_assert!(!sanitized.contains(' '));
            }

            #[test]
            fn parse_price_round_trips_whole_dollars(dollars in 0u32..1_000_000u32) {
                prop_assert_eq!(parse_price(&dollars.to_string()), Some(dollars as i64 * 100));
            }

            #[test]
            fn truncate_text_respects_limit(input in "[ -~]{0,100}", limit in 4usize..60) {
                prop_assert!(truncate_text(&input, limit).len() <= limit.max(3));
            }
        }
    }
}
