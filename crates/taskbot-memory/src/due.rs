//! Due-date extraction from free-text task bodies.
//!
//! Recognized forms (interpreted in the configured UTC offset):
//! - `25/10`, `25/10/2026`, `25/10/26`
//! - `hôm nay` / `today`, `ngày mai` / `tomorrow`
//! - an optional time anywhere in the text: `17:30`, `17h`, `17h30`
//!
//! Without a time the deadline is the end of that day (23:59).

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;
use taskbot_core::normalize::fold;

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{4}|\d{2}))?\b").unwrap())
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{1,2})(?::(\d{2})|h(\d{2})?)\b").unwrap())
}

/// Parse the first due date in `text`, relative to `now`.
pub fn parse_due(text: &str, utc_offset_hours: i32, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let offset = FixedOffset::east_opt(utc_offset_hours.checked_mul(3600)?)?;
    let today = now.with_timezone(&offset).date_naive();

    let date = explicit_date(text, today).or_else(|| relative_date(text, today))?;
    let time = time_of_day(text).unwrap_or_else(end_of_day);

    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|local| local.with_timezone(&Utc))
}

fn explicit_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let caps = date_re().captures(text)?;
    let day: u32 = caps.get(1)?.as_str().parse().ok()?;
    let month: u32 = caps.get(2)?.as_str().parse().ok()?;

    match caps.get(3) {
        Some(year) => {
            let mut year: i32 = year.as_str().parse().ok()?;
            if year < 100 {
                year += 2000;
            }
            NaiveDate::from_ymd_opt(year, month, day)
        }
        None => {
            let this_year = NaiveDate::from_ymd_opt(today.year(), month, day)?;
            if this_year < today {
                // A date already past this year means next year's.
                NaiveDate::from_ymd_opt(today.year() + 1, month, day)
            } else {
                Some(this_year)
            }
        }
    }
}

fn relative_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let folded = fold(text);
    if folded.contains("ngay mai") || folded.contains("tomorrow") {
        return Some(today + Duration::days(1));
    }
    if folded.contains("hom nay") || folded.contains("today") {
        return Some(today);
    }
    None
}

fn time_of_day(text: &str) -> Option<NaiveTime> {
    let caps = time_re().captures(text)?;
    let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = caps
        .get(2)
        .or_else(|| caps.get(3))
        .map_or(Some(0), |m| m.as_str().parse().ok())?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_date_and_time() {
        let now = at("2026-10-18T00:00:00Z");
        let due = parse_due("Sửa đường ống A, hạn 25/10 17:00", 7, now).unwrap();
        assert_eq!(due, at("2026-10-25T10:00:00Z"));
    }

    #[test]
    fn test_hour_suffix_form() {
        let now = at("2026-10-18T00:00:00Z");
        let due = parse_due("thay bóng đèn 20/10 9h30", 7, now).unwrap();
        assert_eq!(due, at("2026-10-20T02:30:00Z"));
        let due = parse_due("thay bóng đèn 20/10 9h", 7, now).unwrap();
        assert_eq!(due, at("2026-10-20T02:00:00Z"));
    }

    #[test]
    fn test_date_without_time_is_end_of_day() {
        let now = at("2026-10-18T00:00:00Z");
        let due = parse_due("nộp báo cáo 31/10/2026", 7, now).unwrap();
        assert_eq!(due, at("2026-10-31T16:59:00Z"));
    }

    #[test]
    fn test_past_date_rolls_to_next_year() {
        let now = at("2026-10-18T00:00:00Z");
        let due = parse_due("kiểm tra 02/01", 7, now).unwrap();
        assert_eq!(due.year(), 2027);
    }

    #[test]
    fn test_two_digit_year() {
        let now = at("2026-10-18T00:00:00Z");
        let due = parse_due("hạn 05/11/26", 0, now).unwrap();
        assert_eq!(due, at("2026-11-05T23:59:00Z"));
    }

    #[test]
    fn test_relative_tomorrow() {
        let now = at("2026-10-18T03:00:00Z");
        let due = parse_due("Ngày mai 8h kiểm tra máy bơm", 7, now).unwrap();
        assert_eq!(due, at("2026-10-19T01:00:00Z"));
    }

    #[test]
    fn test_out_of_range_offset_yields_none() {
        let now = at("2026-10-18T00:00:00Z");
        assert!(parse_due("hạn 25/10", i32::MAX, now).is_none());
        assert!(parse_due("hạn 25/10", 30, now).is_none());
    }

    #[test]
    fn test_invalid_or_missing_date() {
        let now = at("2026-10-18T00:00:00Z");
        assert!(parse_due("31/02 hỏng", 7, now).is_none());
        assert!(parse_due("sửa ống nước tầng 3", 7, now).is_none());
        assert!(parse_due("lúc 17h", 7, now).is_none());
    }
}
