//! Compressed day-axis layout.
//!
//! The Timeline and Gantt surfaces share one horizontal coordinate system
//! that skips calendar days with no job activity. Every displayed day is a
//! uniform 24-hour block of `24 × pixels_per_hour` pixels, laid out in
//! chronological order.
//!
//! # Mapping
//! - time → pixels: `index(day) × 24 × pph + (hour + minute/60) × pph`;
//!   a day that is not displayed maps to the end of the axis.
//! - pixels → time: consume 24-hour blocks; the remainder is an offset into
//!   the day reached. Past the last day the overflow runs on from the end
//!   of the last day (no extra displayed days are invented).
//!
//! Coordinates here are always axis coordinates, growing with time. Screen
//! direction is applied separately through [`Orientation`].

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::config::Surface;
use crate::models::Job;
use crate::time::{day_start, hours_into_day};

const HOURS_PER_DAY: f64 = 24.0;
const MS_PER_HOUR: f64 = 3_600_000.0;

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range; the bounds are swapped if given in reverse.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if end < start {
            Self { start: end, end: start }
        } else {
            Self { start, end }
        }
    }

    #[inline]
    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start && day <= self.end
    }

    /// Every day in the range, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// The ordered list of days to display.
///
/// With `show_empty_days` and a range: every day of the range. Otherwise
/// the sorted, deduplicated days touched by any scheduled job's span
/// (every day from its start day through its end day), restricted to the
/// range when one is given.
pub fn days_with_jobs<'a>(
    jobs: impl IntoIterator<Item = &'a Job>,
    range: Option<DateRange>,
    show_empty_days: bool,
) -> Vec<NaiveDate> {
    if let (true, Some(range)) = (show_empty_days, range) {
        return range.days().collect();
    }

    let mut days = BTreeSet::new();
    for job in jobs {
        let Some(window) = job.window() else { continue };
        days.extend(
            window
                .days()
                .filter(|d| range.map_or(true, |r| r.contains(*d))),
        );
    }
    days.into_iter().collect()
}

/// Screen direction of the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Time grows to the right (Gantt).
    #[default]
    LeftToRight,
    /// Time grows to the left (Timeline, RTL board).
    RightToLeft,
}

impl Orientation {
    /// Converts an axis point to a screen x coordinate.
    pub fn to_screen(self, axis_x: f64, total_width: f64) -> f64 {
        match self {
            Self::LeftToRight => axis_x,
            Self::RightToLeft => total_width - axis_x,
        }
    }

    /// Converts a screen x coordinate back to an axis point.
    pub fn to_axis(self, screen_x: f64, total_width: f64) -> f64 {
        // Mirroring is its own inverse.
        self.to_screen(screen_x, total_width)
    }

    /// Screen-space left edge of a bar occupying `[left, left + width)` on the axis.
    pub fn bar_left(self, left: f64, width: f64, total_width: f64) -> f64 {
        match self {
            Self::LeftToRight => left,
            Self::RightToLeft => total_width - left - width,
        }
    }

    /// Converts a horizontal pointer delta into an axis delta.
    pub fn axis_delta(self, screen_dx: f64) -> f64 {
        match self {
            Self::LeftToRight => screen_dx,
            Self::RightToLeft => -screen_dx,
        }
    }
}

/// Header block for one displayed day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayHeader {
    pub day: NaiveDate,
    pub left: f64,
    pub width: f64,
    /// e.g. `"Mon 01/01"`.
    pub label: String,
}

/// Tick mark for one hour of a displayed day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourTick {
    pub left: f64,
    pub hour: u32,
    /// e.g. `"9:00"`.
    pub label: String,
}

/// A compressed time axis over a fixed list of days.
#[derive(Debug, Clone, PartialEq)]
pub struct DayAxis {
    days: Vec<NaiveDate>,
    pixels_per_hour: f64,
}

impl DayAxis {
    /// Creates an axis. `days` should be in chronological order.
    pub fn new(days: Vec<NaiveDate>, pixels_per_hour: f64) -> Self {
        Self {
            days,
            pixels_per_hour,
        }
    }

    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    pub fn pixels_per_hour(&self) -> f64 {
        self.pixels_per_hour
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    fn day_width(&self) -> f64 {
        HOURS_PER_DAY * self.pixels_per_hour
    }

    /// Total axis width: `days × 24 × pph`.
    pub fn total_width(&self) -> f64 {
        self.days.len() as f64 * self.day_width()
    }

    /// Axis position of a timestamp.
    ///
    /// Timestamps on days not displayed map to [`total_width`](Self::total_width).
    pub fn position(&self, t: NaiveDateTime) -> f64 {
        match self.days.iter().position(|d| *d == t.date()) {
            Some(idx) => idx as f64 * self.day_width() + hours_into_day(t) * self.pixels_per_hour,
            None => self.total_width(),
        }
    }

    /// Bar width for `[start, end)`, never below `min_width`.
    pub fn width(&self, start: NaiveDateTime, end: NaiveDateTime, min_width: f64) -> f64 {
        let hours = (end - start).num_milliseconds() as f64 / MS_PER_HOUR;
        (hours * self.pixels_per_hour).max(min_width)
    }

    /// Timestamp at an axis position.
    ///
    /// `None` for an empty axis, or when the position does not map to a
    /// representable time (non-finite input, degenerate scale, overflow).
    pub fn time_at(&self, px: f64) -> Option<NaiveDateTime> {
        let last = *self.days.last()?;
        let mut remaining = px / self.pixels_per_hour;
        if !remaining.is_finite() {
            return None;
        }
        for day in &self.days {
            if remaining < HOURS_PER_DAY {
                return day_start(*day).checked_add_signed(hours_to_duration(remaining)?);
            }
            remaining -= HOURS_PER_DAY;
        }
        // Past the last block: overflow into the last day.
        day_start(last).checked_add_signed(hours_to_duration(remaining + HOURS_PER_DAY)?)
    }

    /// One header per displayed day.
    pub fn day_headers(&self) -> Vec<DayHeader> {
        let width = self.day_width();
        self.days
            .iter()
            .enumerate()
            .map(|(i, day)| DayHeader {
                day: *day,
                left: i as f64 * width,
                width,
                label: day.format("%a %d/%m").to_string(),
            })
            .collect()
    }

    /// 24 ticks per displayed day.
    pub fn hour_ticks(&self) -> Vec<HourTick> {
        let day_width = self.day_width();
        let pph = self.pixels_per_hour;
        (0..self.days.len())
            .flat_map(|i| {
                (0..24u32).map(move |h| HourTick {
                    left: i as f64 * day_width + f64::from(h) * pph,
                    hour: h,
                    label: format!("{h}:00"),
                })
            })
            .collect()
    }
}

fn hours_to_duration(hours: f64) -> Option<Duration> {
    let ms = (hours * MS_PER_HOUR).round();
    if !ms.is_finite() || ms.abs() >= i64::MAX as f64 {
        return None;
    }
    Duration::try_milliseconds(ms as i64)
}

/// Axis position of `t` over `days`. See [`DayAxis::position`].
pub fn calculate_position(t: NaiveDateTime, days: &[NaiveDate], pixels_per_hour: f64) -> f64 {
    DayAxis::new(days.to_vec(), pixels_per_hour).position(t)
}

/// Bar width: `max(min_width, hours × pph)`.
pub fn calculate_width(
    start: NaiveDateTime,
    end: NaiveDateTime,
    pixels_per_hour: f64,
    min_width: f64,
) -> f64 {
    let hours = (end - start).num_milliseconds() as f64 / MS_PER_HOUR;
    (hours * pixels_per_hour).max(min_width)
}

/// Inverse of [`calculate_position`]. See [`DayAxis::time_at`].
pub fn position_to_time(
    px: f64,
    days: &[NaiveDate],
    pixels_per_hour: f64,
) -> Option<NaiveDateTime> {
    DayAxis::new(days.to_vec(), pixels_per_hour).time_at(px)
}

/// Everything a day axis depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AxisKey {
    /// Board version the axis was built from.
    pub version: u64,
    pub surface: Surface,
    /// [`FilterCriteria::fingerprint`](crate::filter::FilterCriteria::fingerprint).
    pub filter: u64,
    pub range: Option<DateRange>,
    pub show_empty_days: bool,
    /// `pixels_per_hour` as raw bits.
    pub pixels_per_hour: u64,
}

/// Single-entry memo for the day axis.
///
/// Any change of [`AxisKey`] rebuilds the axis; an unchanged key reuses it.
#[derive(Debug, Default)]
pub struct DayAxisCache {
    entry: Option<(AxisKey, DayAxis)>,
    misses: u64,
}

impl DayAxisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached axis for `key`, building it on a miss.
    pub fn get_or_build(&mut self, key: AxisKey, build: impl FnOnce() -> DayAxis) -> &DayAxis {
        match self.entry.take() {
            Some((cached, axis)) if cached == key => &self.entry.insert((cached, axis)).1,
            _ => {
                self.misses += 1;
                let axis = build();
                debug!(
                    version = key.version,
                    days = axis.days().len(),
                    "rebuilt day axis"
                );
                &self.entry.insert((key, axis)).1
            }
        }
    }

    /// Number of rebuilds so far.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Drops the cached axis.
    pub fn clear(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::at;

    fn d(s: &str) -> NaiveDate {
        at(s).date()
    }

    fn job(id: &str, start: &str, end: &str) -> Job {
        Job::new(id, id).with_schedule(at(start), at(end))
    }

    #[test]
    fn test_days_with_jobs_spanning() {
        // Mon 23:00 to Wed 02:00 covers three days
        let jobs = vec![job("1", "2024-01-01T23:00", "2024-01-03T02:00")];
        let days = days_with_jobs(&jobs, None, false);
        assert_eq!(
            days,
            vec![d("2024-01-01T00:00"), d("2024-01-02T00:00"), d("2024-01-03T00:00")]
        );
    }

    #[test]
    fn test_days_with_jobs_sorted_dedup_compressed() {
        let jobs = vec![
            job("1", "2024-01-10T09:00", "2024-01-10T10:00"),
            job("2", "2024-01-03T09:00", "2024-01-03T10:00"),
            job("3", "2024-01-10T12:00", "2024-01-10T13:00"),
            Job::new("4", "unscheduled"),
        ];
        let days = days_with_jobs(&jobs, None, false);
        assert_eq!(days, vec![d("2024-01-03T00:00"), d("2024-01-10T00:00")]);
    }

    #[test]
    fn test_days_with_jobs_range() {
        let jobs = vec![job("1", "2024-01-01T09:00", "2024-01-05T10:00")];
        let range = DateRange::new(d("2024-01-02T00:00"), d("2024-01-03T00:00"));
        assert_eq!(days_with_jobs(&jobs, Some(range), false).len(), 2);

        // Dense: every day of the range regardless of jobs
        let range = DateRange::new(d("2024-02-01T00:00"), d("2024-02-07T00:00"));
        assert_eq!(days_with_jobs(&jobs, Some(range), true).len(), 7);

        // show_empty_days without a range falls back to job days
        assert_eq!(days_with_jobs(&jobs, None, true).len(), 5);
    }

    #[test]
    fn test_position_compressed() {
        let days = vec![d("2024-01-03T00:00"), d("2024-01-10T00:00")];
        let axis = DayAxis::new(days, 40.0);

        assert_eq!(axis.position(at("2024-01-03T00:00")), 0.0);
        assert_eq!(axis.position(at("2024-01-03T09:30")), 9.5 * 40.0);
        // Second displayed day starts right after the first
        assert_eq!(axis.position(at("2024-01-10T06:00")), (24.0 + 6.0) * 40.0);
        // Undisplayed day → end of axis
        assert_eq!(axis.position(at("2024-01-05T06:00")), axis.total_width());
        assert_eq!(axis.total_width(), 2.0 * 24.0 * 40.0);
    }

    #[test]
    fn test_width_minimum() {
        let axis = DayAxis::new(vec![d("2024-01-01T00:00")], 40.0);
        assert_eq!(axis.width(at("2024-01-01T09:00"), at("2024-01-01T11:30"), 20.0), 100.0);
        assert_eq!(axis.width(at("2024-01-01T09:00"), at("2024-01-01T09:15"), 20.0), 20.0);
        assert_eq!(
            calculate_width(at("2024-01-01T09:00"), at("2024-01-01T09:00"), 40.0, 20.0),
            20.0
        );
    }

    #[test]
    fn test_time_at() {
        let days = vec![d("2024-01-03T00:00"), d("2024-01-10T00:00")];
        let axis = DayAxis::new(days, 40.0);

        assert_eq!(axis.time_at(0.0), Some(at("2024-01-03T00:00")));
        assert_eq!(axis.time_at(30.0 * 40.0), Some(at("2024-01-10T06:00")));
        // Beyond the last day: overflow continues past the last day's end
        assert_eq!(axis.time_at(50.0 * 40.0), Some(at("2024-01-11T02:00")));
        assert_eq!(axis.time_at(axis.total_width()), Some(at("2024-01-11T00:00")));
        assert_eq!(DayAxis::new(vec![], 40.0).time_at(10.0), None);
    }

    #[test]
    fn test_time_at_degenerate_input() {
        let days = vec![d("2024-01-03T00:00")];
        assert_eq!(DayAxis::new(days.clone(), 0.0).time_at(120.0), None);
        assert_eq!(DayAxis::new(days.clone(), 0.0).time_at(0.0), None);

        let axis = DayAxis::new(days, 40.0);
        assert_eq!(axis.time_at(f64::INFINITY), None);
        assert_eq!(axis.time_at(f64::NAN), None);
        assert_eq!(axis.time_at(1e30), None);
        assert_eq!(axis.time_at(-1e30), None);
    }

    #[test]
    fn test_round_trip() {
        let days = vec![
            d("2024-01-01T00:00"),
            d("2024-01-04T00:00"),
            d("2024-01-05T00:00"),
        ];
        let pph = 40.0;
        let total = days.len() as f64 * 24.0 * pph;
        // Position resolution is one minute
        let tolerance = pph / 60.0;

        let mut p = 0.0;
        while p <= total {
            let t = position_to_time(p, &days, pph).unwrap();
            let back = calculate_position(t, &days, pph);
            assert!((back - p).abs() <= tolerance, "p={p} back={back}");
            p += 7.3;
        }
    }

    #[test]
    fn test_headers_and_ticks() {
        let axis = DayAxis::new(vec![d("2024-01-01T00:00"), d("2024-01-03T00:00")], 10.0);
        let headers = axis.day_headers();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].label, "Mon 01/01");
        assert_eq!(headers[1].left, 240.0);
        assert_eq!(headers[1].width, 240.0);

        let ticks = axis.hour_ticks();
        assert_eq!(ticks.len(), 48);
        assert_eq!(ticks[25].left, 250.0);
        assert_eq!(ticks[25].label, "1:00");
    }

    #[test]
    fn test_orientation() {
        let rtl = Orientation::RightToLeft;
        assert_eq!(rtl.to_screen(100.0, 960.0), 860.0);
        assert_eq!(rtl.to_axis(860.0, 960.0), 100.0);
        assert_eq!(rtl.bar_left(100.0, 40.0, 960.0), 820.0);
        assert_eq!(rtl.axis_delta(15.0), -15.0);

        let ltr = Orientation::LeftToRight;
        assert_eq!(ltr.to_screen(100.0, 960.0), 100.0);
        assert_eq!(ltr.bar_left(100.0, 40.0, 960.0), 100.0);
    }

    #[test]
    fn test_cache_invalidation() {
        let mut cache = DayAxisCache::new();
        let key = AxisKey {
            version: 1,
            surface: Surface::Gantt,
            filter: 0,
            range: None,
            show_empty_days: false,
            pixels_per_hour: 40f64.to_bits(),
        };
        let build = || DayAxis::new(vec![d("2024-01-01T00:00")], 40.0);

        cache.get_or_build(key, build);
        cache.get_or_build(key, build);
        assert_eq!(cache.misses(), 1);

        let bumped = AxisKey { version: 2, ..key };
        cache.get_or_build(bumped, build);
        assert_eq!(cache.misses(), 2);

        let shown = AxisKey {
            show_empty_days: true,
            ..bumped
        };
        cache.get_or_build(shown, build);
        assert_eq!(cache.misses(), 3);
    }
}
