//! Render-ready views of the board.
//!
//! The read pipeline shared by both surfaces:
//!
//! 1. Issues over the **full** job collection (cached per board version)
//! 2. Filter with [`pass_filters`]
//! 3. Day axis over the jobs that survived filtering (cached per
//!    [`AxisKey`])
//! 4. Rows with positioned bars
//!
//! | Surface | Rows | Order |
//! |---------|------|-------|
//! | Timeline | one lane per worker, plus an unassigned lane | lane name; unassigned first |
//! | Gantt | one row per job, unscheduled rows without a bar | start; unscheduled last |
//!
//! On the Timeline an active issue mode shows **every** job of the workers
//! involved in a flagged job, not just the flagged jobs themselves, so the
//! whole lane stays readable.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::board::Board;
use crate::config::Surface;
use crate::filter::{pass_filters, FilterCriteria};
use crate::issues::{bar_color, status_classes, workers_with_issues, BarStatus, Issues};
use crate::layout::{days_with_jobs, AxisKey, DateRange, DayAxis, DayAxisCache, DayHeader, HourTick};
use crate::models::Job;
use crate::time::day_start;

/// Lane label for jobs without workers.
pub const UNASSIGNED_LANE_LABEL: &str = "(ללא עובד מבצע)";

/// Row label for jobs without a title.
pub const UNTITLED_LABEL: &str = "ללא כותרת";

/// What to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRequest {
    pub surface: Surface,
    pub criteria: FilterCriteria,
    /// Days to show. `None` shows every day with jobs.
    pub range: Option<DateRange>,
    /// With a range, show its days even when they have no jobs.
    pub show_empty_days: bool,
}

impl ViewRequest {
    pub fn new(surface: Surface) -> Self {
        Self {
            surface,
            criteria: FilterCriteria::default(),
            range: None,
            show_empty_days: false,
        }
    }

    pub fn with_criteria(mut self, criteria: FilterCriteria) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn with_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.range = Some(DateRange::new(start, end));
        self
    }

    pub fn with_empty_days(mut self, show: bool) -> Self {
        self.show_empty_days = show;
        self
    }
}

/// A positioned job bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub job_id: String,
    /// Axis coordinate of the bar's start.
    pub left: f64,
    pub width: f64,
    /// Left edge on screen after applying the surface orientation.
    pub screen_left: f64,
    pub status: BarStatus,
    pub color: &'static str,
    pub classes: Vec<&'static str>,
}

/// What a row stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RowKey {
    /// A Timeline lane; `None` is the unassigned lane.
    Worker(Option<String>),
    /// A Gantt row.
    Job(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewRow {
    pub key: RowKey,
    pub label: String,
    pub bars: Vec<Bar>,
}

/// A complete render model for one surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardView {
    pub surface: Surface,
    pub days: Vec<NaiveDate>,
    pub day_headers: Vec<DayHeader>,
    pub hour_ticks: Vec<HourTick>,
    pub total_width: f64,
    pub rows: Vec<ViewRow>,
    /// Number of distinct jobs that passed filtering.
    pub visible_jobs: usize,
}

impl BoardView {
    pub fn is_empty(&self) -> bool {
        self.visible_jobs == 0
    }

    /// Finds the bars of a job (several on the Timeline for multi-worker jobs).
    pub fn bars_for<'a>(&'a self, job_id: &'a str) -> impl Iterator<Item = &'a Bar> + 'a {
        self.rows
            .iter()
            .flat_map(|r| r.bars.iter())
            .filter(move |b| b.job_id == job_id)
    }
}

/// Range bounds as `[first midnight, midnight after the last day)`.
fn range_bounds(range: DateRange) -> (NaiveDateTime, NaiveDateTime) {
    (
        day_start(range.start),
        day_start(range.end) + Duration::days(1),
    )
}

fn in_range(job: &Job, range: Option<DateRange>) -> bool {
    let (Some(range), Some(window)) = (range, job.window()) else {
        return true;
    };
    let (from, to) = range_bounds(range);
    window.start < to && window.end > from
}

/// Jobs shown on a surface, in board order.
fn visible_jobs<'a>(
    jobs: &'a [Job],
    request: &ViewRequest,
    issues: &Issues,
) -> Vec<&'a Job> {
    let criteria = &request.criteria;
    match request.surface {
        Surface::Timeline if criteria.has_issue_mode() => {
            let workers = workers_with_issues(jobs, issues);
            let rest = criteria.without_issue_modes();
            jobs.iter()
                .filter(|j| j.is_scheduled() && in_range(j, request.range))
                .filter(|j| j.workers.iter().any(|w| workers.contains(w)))
                .filter(|j| pass_filters(j, &rest, issues))
                .collect()
        }
        Surface::Timeline => jobs
            .iter()
            .filter(|j| j.is_scheduled() && in_range(j, request.range))
            .filter(|j| pass_filters(j, criteria, issues))
            .collect(),
        Surface::Gantt => jobs
            .iter()
            .filter(|j| in_range(j, request.range))
            .filter(|j| pass_filters(j, criteria, issues))
            .collect(),
    }
}

/// Builds the bar of a scheduled job, clipped to the requested range.
fn make_bar(
    job: &Job,
    axis: &DayAxis,
    request: &ViewRequest,
    min_width: f64,
    board: &Board,
) -> Option<Bar> {
    let window = job.window()?;
    let (mut start, mut end) = (window.start, window.end);
    if let Some(range) = request.range {
        let (from, to) = range_bounds(range);
        start = start.max(from);
        end = end.min(to);
    }

    let issues = board.issues();
    let orientation = board.config().surface(request.surface).orientation;
    let left = axis.position(start);
    let width = axis.width(start, end, min_width);
    Some(Bar {
        job_id: job.id.clone(),
        left,
        width,
        screen_left: orientation.bar_left(left, width, axis.total_width()),
        status: BarStatus::classify(job, issues),
        color: bar_color(job, issues),
        classes: status_classes(job, issues),
    })
}

/// Runs the read pipeline for one surface.
pub fn build_view(board: &Board, request: &ViewRequest, cache: &mut DayAxisCache) -> BoardView {
    let surface = board.config().surface(request.surface);
    let issues = board.issues();
    let jobs = visible_jobs(board.jobs(), request, issues);

    let key = AxisKey {
        version: board.version(),
        surface: request.surface,
        filter: request.criteria.fingerprint(),
        range: request.range,
        show_empty_days: request.show_empty_days,
        pixels_per_hour: surface.pixels_per_hour.to_bits(),
    };
    let axis = cache.get_or_build(key, || {
        DayAxis::new(
            days_with_jobs(jobs.iter().copied(), request.range, request.show_empty_days),
            surface.pixels_per_hour,
        )
    });

    let min_width = surface.min_bar_width;
    let rows: Vec<ViewRow> = match request.surface {
        Surface::Timeline => {
            let mut lanes: BTreeMap<Option<&str>, Vec<&Job>> = BTreeMap::new();
            for job in jobs.iter().copied() {
                if job.workers.is_empty() {
                    lanes.entry(None).or_default().push(job);
                }
                for w in &job.workers {
                    lanes.entry(Some(w.as_str())).or_default().push(job);
                }
            }
            lanes
                .into_iter()
                .map(|(worker, mut lane_jobs)| {
                    lane_jobs.sort_by_key(|j| j.start);
                    ViewRow {
                        key: RowKey::Worker(worker.map(str::to_string)),
                        label: worker.unwrap_or(UNASSIGNED_LANE_LABEL).to_string(),
                        bars: lane_jobs
                            .iter()
                            .filter_map(|j| make_bar(j, axis, request, min_width, board))
                            .collect(),
                    }
                })
                .collect()
        }
        Surface::Gantt => {
            let mut ordered = jobs.clone();
            ordered.sort_by_key(|j| (j.start.is_none(), j.start));
            ordered
                .iter()
                .map(|j| ViewRow {
                    key: RowKey::Job(j.id.clone()),
                    label: if j.title.is_empty() {
                        UNTITLED_LABEL.to_string()
                    } else {
                        j.title.clone()
                    },
                    bars: make_bar(j, axis, request, min_width, board)
                        .into_iter()
                        .collect(),
                })
                .collect()
        }
    };

    debug!(
        "built {:?} view: {} jobs, {} rows, {} days",
        request.surface,
        jobs.len(),
        rows.len(),
        axis.days().len()
    );

    BoardView {
        surface: request.surface,
        days: axis.days().to_vec(),
        day_headers: axis.day_headers(),
        hour_ticks: axis.hour_ticks(),
        total_width: axis.total_width(),
        rows,
        visible_jobs: jobs.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::at;

    fn sample_board() -> Board {
        let mut board = Board::default();
        for (title, worker, start, end) in [
            ("A", "Dana", "2024-01-01T09:00", "2024-01-01T11:00"),
            ("B", "Dana", "2024-01-01T10:00", "2024-01-01T12:00"),
            ("C", "Avi", "2024-01-03T08:00", "2024-01-03T09:00"),
            ("D", "Moshe", "2024-01-03T13:00", "2024-01-03T14:00"),
        ] {
            board
                .create_job(
                    Job::draft(title)
                        .with_worker(worker)
                        .with_schedule(at(start), at(end)),
                )
                .unwrap();
        }
        board.create_job(Job::draft("Unscheduled")).unwrap();
        board
    }

    #[test]
    fn test_gantt_rows_and_compressed_axis() {
        let board = sample_board();
        let mut cache = DayAxisCache::new();
        let view = board.view(&ViewRequest::new(Surface::Gantt), &mut cache);

        // Jan 2 has no jobs and is skipped
        assert_eq!(view.days.len(), 2);
        assert_eq!(view.total_width, 2.0 * 24.0 * 40.0);
        assert_eq!(view.rows.len(), 5);
        assert_eq!(view.rows[4].label, "Unscheduled");
        assert!(view.rows[4].bars.is_empty());

        let c = view.bars_for("3").next().unwrap();
        assert_eq!(c.left, (24.0 + 8.0) * 40.0);
        assert_eq!(c.width, 40.0);
        assert_eq!(c.screen_left, c.left);
    }

    #[test]
    fn test_timeline_lanes() {
        let board = sample_board();
        let mut cache = DayAxisCache::new();
        let view = board.view(&ViewRequest::new(Surface::Timeline), &mut cache);

        let labels: Vec<&str> = view.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Avi", "Dana", "Moshe"]);
        assert_eq!(view.rows[1].bars.len(), 2);
        assert_eq!(view.rows[1].bars[0].status, BarStatus::Conflict);

        // Right-to-left: the earliest bar sits at the far right
        let a = &view.rows[1].bars[0];
        assert_eq!(a.screen_left, view.total_width - a.left - a.width);
    }

    #[test]
    fn test_timeline_issue_mode_shows_whole_lane() {
        let mut board = sample_board();
        board
            .create_job(
                Job::draft("E")
                    .with_worker("Dana")
                    .with_schedule(at("2024-01-03T08:00"), at("2024-01-03T09:00")),
            )
            .unwrap();
        let mut cache = DayAxisCache::new();

        let request = ViewRequest::new(Surface::Timeline)
            .with_criteria(FilterCriteria::new().with_conflicts_only(true));
        let view = board.view(&request, &mut cache);
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].bars.len(), 3);

        // The Gantt shows only the flagged jobs
        let request = ViewRequest { surface: Surface::Gantt, ..request };
        let view = board.view(&request, &mut cache);
        assert_eq!(view.visible_jobs, 2);
    }

    #[test]
    fn test_unassigned_lane_first() {
        let mut board = Board::default();
        board
            .create_job(
                Job::draft("Loose").with_schedule(at("2024-01-01T09:00"), at("2024-01-01T10:00")),
            )
            .unwrap();
        board
            .create_job(
                Job::draft("Owned")
                    .with_worker("Avi")
                    .with_schedule(at("2024-01-01T09:00"), at("2024-01-01T10:00")),
            )
            .unwrap();

        let view = board.view(&ViewRequest::new(Surface::Timeline), &mut DayAxisCache::new());
        assert_eq!(view.rows[0].key, RowKey::Worker(None));
        assert_eq!(view.rows[0].label, UNASSIGNED_LANE_LABEL);
    }

    #[test]
    fn test_range_and_empty_days() {
        let board = sample_board();
        let mut cache = DayAxisCache::new();
        let d = |s: &str| at(s).date();

        let request = ViewRequest::new(Surface::Gantt)
            .with_range(d("2024-01-01T00:00"), d("2024-01-02T00:00"));
        let view = board.view(&request, &mut cache);
        assert_eq!(view.days, vec![d("2024-01-01T00:00")]);
        // Unscheduled jobs stay listed
        assert_eq!(view.visible_jobs, 3);

        let view = board.view(&request.clone().with_empty_days(true), &mut cache);
        assert_eq!(view.days.len(), 2);
    }

    #[test]
    fn test_axis_cache_follows_version() {
        let mut board = sample_board();
        let mut cache = DayAxisCache::new();
        let request = ViewRequest::new(Surface::Gantt);

        board.view(&request, &mut cache);
        board.view(&request, &mut cache);
        assert_eq!(cache.misses(), 1);

        board.toggle_finished("1").unwrap();
        let view = board.view(&request, &mut cache);
        assert_eq!(cache.misses(), 2);
        assert_eq!(view.bars_for("1").next().unwrap().status, BarStatus::Conflict);
    }
}
