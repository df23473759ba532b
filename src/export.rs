//! Tabular export artifacts.
//!
//! Builds plain tables that a spreadsheet writer (outside this crate) can
//! serialize as-is:
//!
//! | Artifact | Columns | Cells |
//! |----------|---------|-------|
//! | [`task_table`] | one per job field | formatted values |
//! | [`hourly_grid`] | every clock hour any job spans | `✓` where active |
//! | [`daily_grid`] | 24 hours for every day any job spans | `✓` where active |
//!
//! Grids list scheduled jobs only, sorted by start. Runs of consecutive
//! active cells are reported as [`CellSpan`]s so a styling layer can merge
//! them into one bar.

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use crate::issues::{bar_color, status_classes, Issues};
use crate::models::Job;
use crate::time::{day_start, duration_str, fmt, is_active_during};

/// Mark placed in an active grid cell.
pub const ACTIVE_MARK: &str = "✓";

/// Leading job columns of a grid: title, factory, workers.
pub const GRID_JOB_COLUMNS: usize = 3;

/// A header row plus data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A run of consecutive active cells in one grid row.
///
/// `row` indexes [`Grid::rows`]; columns are inclusive indices into the
/// full row, job columns included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellSpan {
    pub row: usize,
    pub first_col: usize,
    pub last_col: usize,
}

/// A time grid with a two-level header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Grid {
    /// Date labels, set on the first slot of each date and blank after.
    pub date_header: Vec<String>,
    /// Slot labels (`HH:00`).
    pub slot_header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub spans: Vec<CellSpan>,
}

impl Grid {
    /// Number of time slots.
    pub fn slot_count(&self) -> usize {
        self.slot_header.len().saturating_sub(GRID_JOB_COLUMNS)
    }
}

/// One row per job, in board order.
///
/// The dependency column shows the referenced job's title (blank when it
/// does not exist). Status and colour mirror the on-screen bar.
pub fn task_table(jobs: &[Job], issues: &Issues) -> Table {
    let headers = [
        "משימה",
        "מפעל",
        "עובד מבצע",
        "מפקח עבודה",
        "מנהל עבודה",
        "עדיפות",
        "מספר ציוד",
        "קריאת שירות",
        "מחלקה מבצעת",
        "התחלה",
        "סיום",
        "משך",
        "תלוי ב",
        "הערות",
        "סטטוס",
        "צבע",
    ];

    let rows = jobs
        .iter()
        .map(|j| {
            let dependency = j
                .depends_on
                .as_deref()
                .and_then(|id| jobs.iter().find(|d| d.id == id))
                .map(|d| d.title.clone())
                .unwrap_or_default();
            vec![
                j.title.clone(),
                j.factory.clone(),
                j.workers.join(", "),
                j.factory_manager.clone(),
                j.maintenance_manager.clone(),
                j.priority
                    .map(|p| p.hebrew_label().to_string())
                    .unwrap_or_default(),
                j.equipment_number.clone(),
                j.service_call.clone(),
                j.department.clone(),
                fmt(j.start),
                fmt(j.end),
                duration_str(j.start, j.end),
                dependency,
                j.notes.clone(),
                status_classes(j, issues).join(" "),
                bar_color(j, issues).to_string(),
            ]
        })
        .collect();

    Table {
        headers: headers.iter().map(|h| h.to_string()).collect(),
        rows,
    }
}

/// Scheduled jobs sorted by start.
fn scheduled_by_start(jobs: &[Job]) -> Vec<&Job> {
    let mut scheduled: Vec<&Job> = jobs.iter().filter(|j| j.is_scheduled()).collect();
    scheduled.sort_by_key(|j| j.start);
    scheduled
}

fn floor_to_hour(t: NaiveDateTime) -> NaiveDateTime {
    day_start(t.date()) + Duration::hours(i64::from(t.hour()))
}

/// Grid over the clock hours touched by any scheduled job.
///
/// A job contributes every hour from its start hour through its end hour.
pub fn hourly_grid(jobs: &[Job]) -> Grid {
    let scheduled = scheduled_by_start(jobs);

    let mut hours = BTreeSet::new();
    for job in &scheduled {
        let Some(window) = job.window() else { continue };
        let mut h = floor_to_hour(window.start);
        let last = floor_to_hour(window.end);
        while h <= last {
            hours.insert(h);
            h += Duration::hours(1);
        }
    }

    let slots: Vec<NaiveDateTime> = hours.into_iter().collect();
    debug!("hourly grid: {} jobs x {} hours", scheduled.len(), slots.len());
    build_grid(&scheduled, &slots)
}

/// Grid of 24 hourly slots for every day touched by any scheduled job.
pub fn daily_grid(jobs: &[Job]) -> Grid {
    let scheduled = scheduled_by_start(jobs);

    let days: BTreeSet<_> = scheduled
        .iter()
        .filter_map(|j| j.window())
        .flat_map(|w| w.days())
        .collect();
    let slots: Vec<NaiveDateTime> = days
        .into_iter()
        .flat_map(|d| (0..24).map(move |h| day_start(d) + Duration::hours(h)))
        .collect();

    debug!("daily grid: {} jobs x {} slots", scheduled.len(), slots.len());
    build_grid(&scheduled, &slots)
}

/// Fills a grid of one-hour `slots` for `jobs`.
fn build_grid(jobs: &[&Job], slots: &[NaiveDateTime]) -> Grid {
    let mut date_header = vec![
        "משימה".to_string(),
        "מפעל".to_string(),
        "עובד מבצע".to_string(),
    ];
    let mut slot_header = vec![String::new(); GRID_JOB_COLUMNS];

    let mut prev_date = None;
    for slot in slots {
        let date = slot.date();
        if prev_date == Some(date) {
            date_header.push(String::new());
        } else {
            date_header.push(date.format("%Y-%m-%d").to_string());
            prev_date = Some(date);
        }
        slot_header.push(slot.format("%H:%M").to_string());
    }

    let mut rows = Vec::with_capacity(jobs.len());
    let mut spans = Vec::new();
    for (row_idx, job) in jobs.iter().enumerate() {
        let mut row = vec![job.title.clone(), job.factory.clone(), job.workers.join(", ")];
        let mut run_start: Option<usize> = None;

        for (i, slot) in slots.iter().enumerate() {
            let col = GRID_JOB_COLUMNS + i;
            if is_active_during(job, *slot, *slot + Duration::hours(1)) {
                row.push(ACTIVE_MARK.to_string());
                run_start.get_or_insert(col);
            } else {
                row.push(String::new());
                if let Some(first_col) = run_start.take() {
                    spans.push(CellSpan {
                        row: row_idx,
                        first_col,
                        last_col: col - 1,
                    });
                }
            }
        }
        if let Some(first_col) = run_start {
            spans.push(CellSpan {
                row: row_idx,
                first_col,
                last_col: GRID_JOB_COLUMNS + slots.len() - 1,
            });
        }
        rows.push(row);
    }

    Grid {
        date_header,
        slot_header,
        rows,
        spans,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use crate::time::at;

    fn jobs() -> Vec<Job> {
        vec![
            Job::new("1", "Pump")
                .with_factory("North")
                .with_worker("Dana")
                .with_priority(Priority::High)
                .with_schedule(at("2024-01-01T09:30"), at("2024-01-01T11:00")),
            Job::new("2", "Valve")
                .with_worker("Avi")
                .with_worker("Moshe")
                .with_dependency("1")
                .with_schedule(at("2024-01-01T08:00"), at("2024-01-01T09:00")),
            Job::new("3", "Unscheduled"),
        ]
    }

    #[test]
    fn test_task_table() {
        let jobs = jobs();
        let issues = Issues::compute(&jobs);
        let table = task_table(&jobs, &issues);

        assert_eq!(table.headers.len(), 16);
        assert_eq!(table.rows.len(), 3);

        let pump = &table.rows[0];
        assert_eq!(pump[5], "גבוהה");
        assert_eq!(pump[9], "2024-01-01 09:30");
        assert_eq!(pump[11], "1h 30m");

        let valve = &table.rows[1];
        assert_eq!(valve[2], "Avi, Moshe");
        assert_eq!(valve[12], "Pump");
        // Valve starts before Pump ends
        assert_eq!(valve[14], "dep-issue");

        assert_eq!(table.rows[2][9], "");
        assert_eq!(table.rows[2][11], "");
    }

    #[test]
    fn test_hourly_grid() {
        let grid = hourly_grid(&jobs());

        // 08:00 through 11:00, ordered by start
        assert_eq!(grid.slot_count(), 4);
        assert_eq!(grid.slot_header[3], "08:00");
        assert_eq!(grid.date_header[3], "2024-01-01");
        assert_eq!(grid.date_header[4], "");
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[0][0], "Valve");

        // Valve: 08:00 only; ends exactly at 09:00
        assert_eq!(grid.rows[0][3..], ["✓", "", "", ""]);
        // Pump: 09:30-11:00 covers the 09 and 10 hours
        assert_eq!(grid.rows[1][3..], ["", "✓", "✓", ""]);

        assert_eq!(
            grid.spans,
            vec![
                CellSpan { row: 0, first_col: 3, last_col: 3 },
                CellSpan { row: 1, first_col: 4, last_col: 5 },
            ]
        );
    }

    #[test]
    fn test_daily_grid_spans_midnight() {
        let jobs = vec![Job::new("1", "Night shift")
            .with_worker("Dana")
            .with_schedule(at("2024-01-01T22:00"), at("2024-01-02T02:00"))];
        let grid = daily_grid(&jobs);

        assert_eq!(grid.slot_count(), 48);
        assert_eq!(grid.date_header[GRID_JOB_COLUMNS + 24], "2024-01-02");
        assert_eq!(
            grid.spans,
            vec![CellSpan {
                row: 0,
                first_col: GRID_JOB_COLUMNS + 22,
                last_col: GRID_JOB_COLUMNS + 25,
            }]
        );
    }

    #[test]
    fn test_empty_grids() {
        let jobs = vec![Job::new("1", "Unscheduled")];
        assert_eq!(hourly_grid(&jobs).slot_count(), 0);
        assert!(daily_grid(&jobs).rows.is_empty());
    }
}
