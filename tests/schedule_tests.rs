use chrono::{Duration, TimeZone, Timelike, Utc};
use quartz_lite::scheduler::schedule::{next_run_from, parse, Recurrence};

#[test]
fn test_every_n_minutes() {
    let now = Utc.with_ymd_and_hms(2024, 5, 10, 15, 30, 0).unwrap();
    assert_eq!(
        next_run_from("every 5 minutes", now),
        now + Duration::minutes(5)
    );
    assert_eq!(
        next_run_from("every 2 minutes", now),
        now + Duration::minutes(2)
    );
}

#[test]
fn test_every_minute_defaults_to_five() {
    let now = Utc.with_ymd_and_hms(2024, 5, 10, 15, 30, 0).unwrap();
    assert_eq!(next_run_from("every minute", now), now + Duration::minutes(5));
}

#[test]
fn test_every_n_hours() {
    let now = Utc.with_ymd_and_hms(2024, 5, 10, 15, 30, 0).unwrap();
    assert_eq!(next_run_from("every 2 hours", now), now + Duration::hours(2));
    assert_eq!(next_run_from("every hour", now), now + Duration::hours(1));
}

#[test]
fn test_daily_at_6_am() {
    let now = Utc.with_ymd_and_hms(2024, 5, 10, 15, 30, 45).unwrap();
    let next = next_run_from("daily at 6 AM", now);
    assert_eq!(next, Utc.with_ymd_and_hms(2024, 5, 11, 6, 0, 0).unwrap());
}

#[test]
fn test_daily_at_9_pm() {
    let now = Utc.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap();
    let next = next_run_from("daily at 9 pm", now);
    assert_eq!(next, Utc.with_ymd_and_hms(2024, 5, 11, 21, 0, 0).unwrap());
}

#[test]
fn test_daily_twelve_hour_conversion() {
    let now = Utc.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap();
    // 12 AM is midnight
    assert_eq!(
        next_run_from("daily at 12 am", now),
        Utc.with_ymd_and_hms(2024, 5, 11, 0, 0, 0).unwrap()
    );
    // 12 PM stays noon
    assert_eq!(
        next_run_from("daily at 12 pm", now),
        Utc.with_ymd_and_hms(2024, 5, 11, 12, 0, 0).unwrap()
    );
}

#[test]
fn test_daily_without_time_keeps_time_of_day() {
    let now = Utc.with_ymd_and_hms(2024, 5, 10, 15, 30, 45).unwrap();
    let next = next_run_from("daily", now);
    assert_eq!(next, now + Duration::days(1));
    assert_eq!(next.hour(), 15);
    assert_eq!(next.minute(), 30);
}

#[test]
fn test_weekly() {
    let now = Utc.with_ymd_and_hms(2024, 5, 10, 15, 30, 0).unwrap();
    assert_eq!(next_run_from("weekly", now), now + Duration::days(7));
}

#[test]
fn test_unrecognized_defaults_to_five_minutes() {
    let now = Utc.with_ymd_and_hms(2024, 5, 10, 15, 30, 0).unwrap();
    assert_eq!(next_run_from("whenever", now), now + Duration::minutes(5));
    assert_eq!(next_run_from("", now), now + Duration::minutes(5));
}

#[test]
fn test_parse_is_case_insensitive() {
    assert_eq!(parse("Every 10 Minutes"), Recurrence::EveryMinutes(10));
    assert_eq!(parse("DAILY AT 6 AM"), Recurrence::Daily { hour: Some(6) });
    assert_eq!(parse("Weekly"), Recurrence::Weekly);
}

#[test]
fn test_minute_rule_wins_over_daily() {
    // Rules are evaluated in order; the minute rule matches first.
    assert_eq!(parse("every 90 minutes daily"), Recurrence::EveryMinutes(90));
}

#[test]
fn test_typed_recurrence_variants() {
    assert_eq!(parse("every 3 hours"), Recurrence::EveryHours(3));
    assert_eq!(parse("daily"), Recurrence::Daily { hour: None });
    // "at" present but no parsable time keeps the time-of-day behavior
    assert_eq!(parse("daily at dawn"), Recurrence::Daily { hour: None });
}
