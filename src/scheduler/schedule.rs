use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Typed recurrence descriptor parsed from a free-form schedule string.
///
/// The grammar is deliberately forgiving: rules are tried in order and the
/// first match wins, with `EveryMinutes(5)` as the fallback for anything
/// unrecognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recurrence {
    EveryMinutes(i64),
    EveryHours(i64),
    /// Next day; `hour` is a 24-hour time-of-day when the expression carried
    /// an "at <hour> am|pm" clause, otherwise the current time-of-day is kept.
    Daily { hour: Option<u32> },
    Weekly,
}

/// Parse a schedule expression into its recurrence.
///
/// Rules, first match wins:
/// 1. "every" + "minute" -> `EveryMinutes(n)`, n defaulting to 5
/// 2. "every" + "hour"   -> `EveryHours(n)`, n defaulting to 1
/// 3. "daily"            -> `Daily`, with an optional "at <hour> am|pm" time
/// 4. "weekly"           -> `Weekly`
/// 5. anything else      -> `EveryMinutes(5)`
pub fn parse(schedule: &str) -> Recurrence {
    let schedule = schedule.to_lowercase();

    if schedule.contains("every") && schedule.contains("minute") {
        Recurrence::EveryMinutes(first_number(&schedule).unwrap_or(5))
    } else if schedule.contains("every") && schedule.contains("hour") {
        Recurrence::EveryHours(first_number(&schedule).unwrap_or(1))
    } else if schedule.contains("daily") {
        let hour = if schedule.contains("at") {
            hour_with_meridiem(&schedule)
        } else {
            None
        };
        Recurrence::Daily { hour }
    } else if schedule.contains("weekly") {
        Recurrence::Weekly
    } else {
        Recurrence::EveryMinutes(5)
    }
}

impl Recurrence {
    /// Compute the next execution time starting from `now`.
    pub fn next_run(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Recurrence::EveryMinutes(minutes) => now + Duration::minutes(*minutes),
            Recurrence::EveryHours(hours) => now + Duration::hours(*hours),
            Recurrence::Daily { hour } => {
                let next_day = now + Duration::days(1);
                match hour {
                    Some(h) => next_day
                        .with_hour(*h)
                        .and_then(|d| d.with_minute(0))
                        .and_then(|d| d.with_second(0))
                        .and_then(|d| d.with_nanosecond(0))
                        .unwrap_or(next_day),
                    None => next_day,
                }
            }
            Recurrence::Weekly => now + Duration::days(7),
        }
    }
}

/// Parse `schedule` and compute the next run from `now` in one step.
pub fn next_run_from(schedule: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    parse(schedule).next_run(now)
}

/// First run of digits anywhere in the string, as an integer.
fn first_number(s: &str) -> Option<i64> {
    s.split(|c: char| !c.is_ascii_digit())
        .find(|token| !token.is_empty())
        .and_then(|token| token.parse().ok())
}

/// Scan for a "<digits> am|pm" pattern and convert to a 24-hour value.
/// 12 AM maps to 0, 12 PM stays 12, other PM hours gain 12.
fn hour_with_meridiem(s: &str) -> Option<u32> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let hour: u32 = s[start..i].parse().ok()?;

            let rest = s[i..].trim_start();
            let is_pm = if rest.starts_with("pm") {
                true
            } else if rest.starts_with("am") {
                false
            } else {
                continue;
            };

            return Some(if is_pm && hour != 12 {
                hour + 12
            } else if !is_pm && hour == 12 {
                0
            } else {
                hour
            });
        }
        i += 1;
    }
    None
}
