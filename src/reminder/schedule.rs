use std::sync::OnceLock;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use regex::Regex;

/// Clock times of the fixed all-day window.
pub const ALL_DAY_START: (u32, u32) = (8, 0);
pub const ALL_DAY_END: (u32, u32) = (18, 0);

/// Format used when pre-filling and displaying form date-times.
pub const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

fn date_time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{4,6})-(\d{1,2})-(\d{1,2})T(\d{2}):(\d{2})$").expect("valid regex")
    })
}

/// Does `text` have the `YYYY-MM-DDTHH:MM` shape accepted by the form?
pub fn matches_pattern(text: &str) -> bool {
    date_time_pattern().is_match(text.trim())
}

/// Parse a form date-time. `None` if the shape is wrong or the calendar
/// values are out of range.
pub fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    let caps = date_time_pattern().captures(text.trim())?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    let hour: u32 = caps[4].parse().ok()?;
    let minute: u32 = caps[5].parse().ok()?;

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    Some(date.and_time(time))
}

/// Normalize `start` to 08:00 and derive the 18:00 end on the same date.
/// Only the clock fields change.
pub fn all_day_window(start: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let date = start.date();
    let at = |(h, m): (u32, u32)| date.and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default());
    (at(ALL_DAY_START), at(ALL_DAY_END))
}

/// Resolve a wall-clock time in the local zone. Ambiguous times take the
/// earlier instant; times inside a DST gap do not exist.
pub fn to_local(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    Local.from_local_datetime(&naive).earliest()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, INPUT_FORMAT).unwrap()
    }

    #[test]
    fn all_day_derivation() {
        let start = parse_date_time("2024-03-10T14:00").unwrap();
        let (start, end) = all_day_window(start);
        assert_eq!(start, dt("2024-03-10T08:00"));
        assert_eq!(end, dt("2024-03-10T18:00"));
    }

    #[test]
    fn all_day_keeps_date_near_midnight() {
        let (start, end) = all_day_window(dt("2024-12-31T23:59"));
        assert_eq!(start, dt("2024-12-31T08:00"));
        assert_eq!(end, dt("2024-12-31T18:00"));
    }

    #[test]
    fn pattern_accepts_short_month_and_long_year() {
        assert!(matches_pattern("2024-3-9T07:05"));
        assert!(matches_pattern("120245-12-01T07:05"));
        assert_eq!(
            parse_date_time("2024-3-9T07:05"),
            Some(dt("2024-03-09T07:05"))
        );
    }

    #[test]
    fn pattern_rejects_malformed() {
        assert!(!matches_pattern("24-03-10T14:00"));
        assert!(!matches_pattern("2024-03-10 14:00"));
        assert!(!matches_pattern("2024-03-10T14"));
        assert!(!matches_pattern("2024-003-10T14:00"));
        assert!(!matches_pattern(""));
    }

    #[test]
    fn parse_rejects_impossible_dates() {
        assert!(matches_pattern("2023-02-30T10:00"));
        assert_eq!(parse_date_time("2023-02-30T10:00"), None);
        assert_eq!(parse_date_time("2023-01-10T25:00"), None);
    }
}
