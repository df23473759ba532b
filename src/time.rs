//! Time and interval utilities.
//!
//! Job timestamps are wall-clock values in the board's time zone, held as
//! [`NaiveDateTime`]. Strings carrying an explicit UTC offset are converted
//! into that zone once, when they are parsed; everything downstream (day
//! bucketing, Shabbat tests, layout) works on local wall-clock fields.
//!
//! # Interval Convention
//! Intervals are half-open `[start, end)`: touching endpoints do not overlap.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use chrono_tz::Tz;

use crate::models::Job;

/// Time zone the board operates in unless configured otherwise.
pub const DEFAULT_TIME_ZONE: Tz = chrono_tz::Asia::Jerusalem;

/// Display format used by tables and exports.
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Format used by date-time inputs (`YYYY-MM-DDTHH:mm`).
const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Friday hour at which Shabbat begins.
const SHABBAT_START_HOUR: u32 = 18;

/// Parses a timestamp into board-local wall-clock time.
///
/// Accepts RFC 3339 (offset converted into `tz`), `YYYY-MM-DDTHH:mm[:ss]`,
/// `YYYY-MM-DD HH:mm[:ss]` and a bare `YYYY-MM-DD` (midnight).
/// Blank or unparseable input yields `None`.
pub fn parse_timestamp(raw: &str, tz: Tz) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&tz).naive_local());
    }
    // Offset without seconds, e.g. `2024-01-01T10:00+02:00`.
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M%:z") {
        return Some(dt.with_timezone(&tz).naive_local());
    }

    parse_local(s)
}

/// Parses a wall-clock timestamp without an offset.
fn parse_local(s: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Formats a timestamp as `YYYY-MM-DD HH:mm`; empty for `None`.
pub fn fmt(t: Option<NaiveDateTime>) -> String {
    t.map(|t| t.format(DISPLAY_FORMAT).to_string())
        .unwrap_or_default()
}

/// Formats a timestamp the way date-time inputs expect (`YYYY-MM-DDTHH:mm`).
pub fn format_input(t: NaiveDateTime) -> String {
    t.format(INPUT_FORMAT).to_string()
}

/// Duration between two timestamps as `"<h>h <m>m"`.
///
/// Returns an empty string if either endpoint is missing.
pub fn duration_str(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> String {
    let (Some(start), Some(end)) = (start, end) else {
        return String::new();
    };
    let mins = (end - start).num_minutes();
    let h = mins.div_euclid(60);
    let m = mins % 60;
    format!("{h}h {m}m")
}

/// Whether `[a_start, a_end)` and `[b_start, b_end)` overlap.
///
/// An empty range overlaps nothing, not even a range containing it.
#[inline]
pub fn is_overlap(
    a_start: NaiveDateTime,
    a_end: NaiveDateTime,
    b_start: NaiveDateTime,
    b_end: NaiveDateTime,
) -> bool {
    a_start < a_end && b_start < b_end && a_start < b_end && b_start < a_end
}

/// Weekday number with Sunday = 0 through Saturday = 6.
#[inline]
pub fn weekday_index(t: NaiveDateTime) -> u32 {
    t.weekday().num_days_from_sunday()
}

/// Whether a timestamp falls on Shabbat: all of Saturday, or Friday from 18:00.
pub fn is_shabbat(t: NaiveDateTime) -> bool {
    match weekday_index(t) {
        6 => true,
        5 => t.hour() >= SHABBAT_START_HOUR,
        _ => false,
    }
}

/// Whether a scheduled job touches Shabbat.
///
/// True when either endpoint is on Shabbat, or the job starts on a Friday
/// and ends on a Saturday. Jobs missing an endpoint never touch Shabbat.
pub fn job_touches_shabbat(job: &Job) -> bool {
    let (Some(start), Some(end)) = (job.start, job.end) else {
        return false;
    };
    is_shabbat(start) || is_shabbat(end) || (weekday_index(start) == 5 && weekday_index(end) == 6)
}

/// Rounds the minute component to the nearest quarter hour, zeroing seconds.
///
/// Halves round up; minute 53 rounds to the next full hour.
pub fn round_to_15(t: NaiveDateTime) -> NaiveDateTime {
    round_to_minutes(t, 15)
}

/// Rounds to the nearest multiple of `step` minutes since local midnight,
/// zeroing seconds. Halves round up. A zero step only zeroes seconds.
/// A rounding past the last representable time returns `t` unchanged.
pub fn round_to_minutes(t: NaiveDateTime, step: u32) -> NaiveDateTime {
    let minutes = i64::from(t.hour() * 60 + t.minute());
    let step = i64::from(step.max(1));
    let steps = (minutes as f64 / step as f64).round() as i64;
    day_start(t.date())
        .checked_add_signed(Duration::minutes(steps * step))
        .unwrap_or(t)
}

/// String form of [`round_to_15`] over `YYYY-MM-DDTHH:mm` values.
///
/// The value is already board-local, so no zone is involved. Input that
/// cannot be parsed, including offset-qualified timestamps, is returned
/// unchanged.
pub fn round_to_15_str(raw: &str) -> String {
    match parse_local(raw.trim()) {
        Some(t) => format_input(round_to_15(t)),
        None => raw.to_string(),
    }
}

/// Whether a job is running at instant `t` (`start <= t < end`).
pub fn is_active_at(job: &Job, t: NaiveDateTime) -> bool {
    match (job.start, job.end) {
        (Some(start), Some(end)) => start <= t && t < end,
        _ => false,
    }
}

/// Whether a job overlaps the slot `[slot_start, slot_end)`.
pub fn is_active_during(job: &Job, slot_start: NaiveDateTime, slot_end: NaiveDateTime) -> bool {
    match (job.start, job.end) {
        (Some(start), Some(end)) => is_overlap(start, end, slot_start, slot_end),
        _ => false,
    }
}

/// Midnight at the start of a day.
#[inline]
pub(crate) fn day_start(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN)
}

/// Hours elapsed since local midnight, at minute resolution.
#[inline]
pub(crate) fn hours_into_day(t: NaiveDateTime) -> f64 {
    f64::from(t.hour()) + f64::from(t.minute()) / 60.0
}

#[cfg(test)]
pub(crate) fn at(s: &str) -> NaiveDateTime {
    parse_timestamp(s, DEFAULT_TIME_ZONE).expect("valid test timestamp")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_half_open() {
        assert!(is_overlap(
            at("2024-01-01T09:00"),
            at("2024-01-01T11:00"),
            at("2024-01-01T10:00"),
            at("2024-01-01T12:00"),
        ));
        // Touching endpoints
        assert!(!is_overlap(
            at("2024-01-01T09:00"),
            at("2024-01-01T10:00"),
            at("2024-01-01T10:00"),
            at("2024-01-01T11:00"),
        ));
        // Zero-length range overlaps nothing
        let t = at("2024-01-01T10:30");
        assert!(!is_overlap(t, t, at("2024-01-01T10:00"), at("2024-01-01T11:00")));
        assert!(!is_overlap(at("2024-01-01T10:00"), at("2024-01-01T11:00"), t, t));
        assert!(!is_overlap(t, t, t, t));
        // Inverted range is empty too
        assert!(!is_overlap(
            at("2024-01-01T11:00"),
            at("2024-01-01T10:00"),
            at("2024-01-01T09:00"),
            at("2024-01-01T12:00"),
        ));
    }

    #[test]
    fn test_is_shabbat() {
        // 2024-01-05 is a Friday, 2024-01-06 a Saturday
        assert!(is_shabbat(at("2024-01-06T03:00")));
        assert!(is_shabbat(at("2024-01-06T23:59")));
        assert!(is_shabbat(at("2024-01-05T18:00")));
        assert!(!is_shabbat(at("2024-01-05T17:59")));
        assert!(!is_shabbat(at("2024-01-07T12:00"))); // Sunday
        assert!(!is_shabbat(at("2024-01-03T20:00"))); // Wednesday evening
    }

    #[test]
    fn test_weekday_index_sunday_zero() {
        assert_eq!(weekday_index(at("2024-01-07T00:00")), 0);
        assert_eq!(weekday_index(at("2024-01-06T00:00")), 6);
    }

    #[test]
    fn test_job_touches_shabbat() {
        let friday_day = Job::new("1", "a").with_schedule(at("2024-01-05T08:00"), at("2024-01-05T12:00"));
        assert!(!job_touches_shabbat(&friday_day));

        let into_evening =
            Job::new("2", "b").with_schedule(at("2024-01-05T16:00"), at("2024-01-05T19:00"));
        assert!(job_touches_shabbat(&into_evening));

        let unscheduled = Job::new("3", "c");
        assert!(!job_touches_shabbat(&unscheduled));
    }

    #[test]
    fn test_round_to_15() {
        assert_eq!(round_to_15_str("2024-01-01T10:07"), "2024-01-01T10:00");
        assert_eq!(round_to_15_str("2024-01-01T10:08"), "2024-01-01T10:15");
        assert_eq!(round_to_15_str("2024-01-01T10:53"), "2024-01-01T11:00");
        assert_eq!(round_to_15_str("2024-01-01T23:55"), "2024-01-02T00:00");
        assert_eq!(round_to_15_str("not a date"), "not a date");
        assert_eq!(
            round_to_15_str("2024-01-01T10:07+02:00"),
            "2024-01-01T10:07+02:00"
        );
    }

    #[test]
    fn test_round_to_15_zeroes_seconds() {
        let t = round_to_15(at("2024-01-01T10:22:41"));
        assert_eq!(t, at("2024-01-01T10:15"));
    }

    #[test]
    fn test_round_to_hour() {
        assert_eq!(round_to_minutes(at("2024-01-01T10:29"), 60), at("2024-01-01T10:00"));
        assert_eq!(round_to_minutes(at("2024-01-01T10:30"), 60), at("2024-01-01T11:00"));
        assert_eq!(round_to_minutes(at("2024-01-01T23:45"), 60), at("2024-01-02T00:00"));
    }

    #[test]
    fn test_duration_str() {
        assert_eq!(
            duration_str(Some(at("2024-01-01T09:00")), Some(at("2024-01-01T11:30"))),
            "2h 30m"
        );
        assert_eq!(duration_str(None, Some(at("2024-01-01T11:30"))), "");
    }

    #[test]
    fn test_parse_offset_converts_to_board_zone() {
        // Jerusalem is UTC+2 in January
        let t = parse_timestamp("2024-01-01T08:00:00Z", DEFAULT_TIME_ZONE).unwrap();
        assert_eq!(t, at("2024-01-01T10:00"));

        let t = parse_timestamp("2024-01-01T10:00:00+02:00", DEFAULT_TIME_ZONE).unwrap();
        assert_eq!(t, at("2024-01-01T10:00"));
    }

    #[test]
    fn test_parse_formats() {
        assert!(parse_timestamp("", DEFAULT_TIME_ZONE).is_none());
        assert!(parse_timestamp("garbage", DEFAULT_TIME_ZONE).is_none());
        assert_eq!(
            parse_timestamp("2024-03-04 07:15", DEFAULT_TIME_ZONE),
            Some(at("2024-03-04T07:15"))
        );
        assert_eq!(
            parse_timestamp("2024-03-04", DEFAULT_TIME_ZONE),
            Some(at("2024-03-04T00:00"))
        );
    }

    #[test]
    fn test_fmt() {
        assert_eq!(fmt(Some(at("2024-03-04T07:15"))), "2024-03-04 07:15");
        assert_eq!(fmt(None), "");
    }

    #[test]
    fn test_activity_predicates() {
        let job = Job::new("1", "a").with_schedule(at("2024-01-01T09:00"), at("2024-01-01T11:00"));
        assert!(is_active_at(&job, at("2024-01-01T09:00")));
        assert!(is_active_at(&job, at("2024-01-01T10:59")));
        assert!(!is_active_at(&job, at("2024-01-01T11:00")));

        assert!(is_active_during(&job, at("2024-01-01T10:00"), at("2024-01-01T11:00")));
        assert!(!is_active_during(&job, at("2024-01-01T11:00"), at("2024-01-01T12:00")));
    }
}
