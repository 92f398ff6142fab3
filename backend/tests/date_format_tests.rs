//! Calendar date serialization tests
//!
//! Movement dates are calendar-only values that must round-trip through JSON
//! as YYYY-MM-DD strings with no time component.

use chrono::NaiveDate;

#[test]
fn dates_serialize_as_iso_calendar_strings() {
    let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
    assert_eq!(serde_json::to_string(&date).unwrap(), "\"2024-01-10\"");
}

#[test]
fn dates_deserialize_from_iso_calendar_strings() {
    let date: NaiveDate = serde_json::from_str("\"2024-01-10\"").unwrap();
    assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
}

#[test]
fn single_digit_months_and_days_are_zero_padded() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
    assert_eq!(serde_json::to_string(&date).unwrap(), "\"2024-03-05\"");
}

#[test]
fn timestamps_are_rejected_as_movement_dates() {
    assert!(serde_json::from_str::<NaiveDate>("\"2024-01-10T00:00:00Z\"").is_err());
    assert!(serde_json::from_str::<NaiveDate>("\"10/01/2024\"").is_err());
    assert!(serde_json::from_str::<NaiveDate>("\"2024-02-30\"").is_err());
}
