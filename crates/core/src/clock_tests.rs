use super::*;
use std::time::Duration;

#[test]
fn format_then_parse_round_trips() {
    let t = SystemTime::UNIX_EPOCH + Duration::from_secs(1_722_500_000);
    let formatted = format_timestamp(t);
    let parsed = parse_timestamp(&formatted).unwrap();
    assert_eq!(format_timestamp(parsed), formatted);
}

#[test]
fn known_instant_formats_as_expected() {
    // 2024-01-01T00:00:00Z
    let t = SystemTime::UNIX_EPOCH + Duration::from_secs(1_704_067_200);
    assert_eq!(format_timestamp(t), "Jan 01 2024 00:00:00");
}

#[test]
fn parse_rejects_malformed_input() {
    assert!(parse_timestamp("not a timestamp").is_none());
}

#[test]
fn system_clock_returns_plausible_time() {
    let clock = SystemClock;
    let now = clock.now();
    assert!(now.duration_since(SystemTime::UNIX_EPOCH).is_ok());
}
