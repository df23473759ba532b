//! Time window model.
//!
//! A half-open wall-clock interval `[start, end)` used for job spans,
//! export slots, and day coverage.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::time::is_overlap;

/// One endpoint of a job's interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Start,
    End,
}

/// A time interval [start, end).
///
/// Half-open interval: includes start, excludes end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Interval start (inclusive).
    pub start: NaiveDateTime,
    /// Interval end (exclusive).
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// Creates a new time window.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Duration of this window.
    #[inline]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Duration in fractional hours.
    pub fn hours(&self) -> f64 {
        self.duration().num_milliseconds() as f64 / 3_600_000.0
    }

    /// Whether a timestamp falls within this window.
    #[inline]
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        t >= self.start && t < self.end
    }

    /// Whether two windows overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        is_overlap(self.start, self.end, other.start, other.end)
    }

    /// Every calendar day from the start's day to the end's day, inclusive.
    ///
    /// A job ending exactly at midnight still touches the day it ends on.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let last = self.end.date();
        self.start
            .date()
            .iter_days()
            .take_while(move |d| *d <= last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::at;

    #[test]
    fn test_time_window() {
        let w = TimeWindow::new(at("2024-01-01T09:00"), at("2024-01-01T11:30"));
        assert_eq!(w.duration(), Duration::minutes(150));
        assert!((w.hours() - 2.5).abs() < 1e-10);
        assert!(w.contains(at("2024-01-01T09:00")));
        assert!(!w.contains(at("2024-01-01T11:30"))); // exclusive end
    }

    #[test]
    fn test_time_window_overlap() {
        let a = TimeWindow::new(at("2024-01-01T09:00"), at("2024-01-01T10:00"));
        let b = TimeWindow::new(at("2024-01-01T09:30"), at("2024-01-01T12:00"));
        let c = TimeWindow::new(at("2024-01-01T10:00"), at("2024-01-01T11:00"));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c)); // touching but not overlapping
    }

    #[test]
    fn test_days_spanned() {
        // Mon 23:00 to Wed 02:00
        let w = TimeWindow::new(at("2024-01-01T23:00"), at("2024-01-03T02:00"));
        let days: Vec<_> = w.days().collect();
        assert_eq!(days.len(), 3);
        assert_eq!(days[0], at("2024-01-01T00:00").date());
        assert_eq!(days[2], at("2024-01-03T00:00").date());
    }
}
