//! Drag-move and resize gesture sessions.
//!
//! A gesture runs in three phases:
//!
//! 1. **begin**: capture the job's original endpoints and workers
//! 2. **update**: apply a provisional value to the live job on every move,
//!    without touching the undo history
//! 3. **end**: push one snapshot of the pre-gesture state and commit, or
//!    **cancel**: restore the captured originals with no snapshot
//!
//! A session holds `&mut Board` for its whole life, so two gestures can
//! never run at once. Dropping a session without ending it cancels it.

use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use crate::board::Board;
use crate::config::{Surface, SurfaceConfig};
use crate::error::{BoardError, BoardResult};
use crate::layout::DayAxis;
use crate::models::{Edge, Job, RegistryKind, TimeWindow};
use crate::time::round_to_minutes;
use crate::undo::UndoAction;

/// Captures a scheduled job for a gesture.
fn capture(board: &Board, id: &str) -> BoardResult<(Job, TimeWindow)> {
    let job = board
        .job(id)
        .ok_or_else(|| BoardError::JobNotFound(id.to_string()))?;
    let window = job
        .window()
        .ok_or_else(|| BoardError::Validation(format!("job '{id}' is not scheduled")))?;
    Ok((job.clone(), window))
}

/// Puts the captured start, end and workers back onto the live job.
fn restore(board: &mut Board, original: &Job) -> bool {
    let Some(job) = board.job_mut(&original.id) else {
        return false;
    };
    let changed = job.start != original.start
        || job.end != original.end
        || job.workers != original.workers;
    job.start = original.start;
    job.end = original.end;
    job.workers = original.workers.clone();
    changed
}

/// Pushes the pre-gesture snapshot if the job changed.
fn commit(board: &mut Board, original: &Job, action: UndoAction) -> bool {
    let changed = board.job(&original.id).is_some_and(|job| {
        job.start != original.start || job.end != original.end || job.workers != original.workers
    });
    if !changed {
        return false;
    }

    let mut before = board.state();
    if let Some(job) = before.jobs.iter_mut().find(|j| j.id == original.id) {
        job.start = original.start;
        job.end = original.end;
        job.workers = original.workers.clone();
    }
    board.push_snapshot(action, before);
    board.touch();
    true
}

/// An in-progress drag-move.
#[derive(Debug)]
pub struct DragSession<'b> {
    board: &'b mut Board,
    original: Job,
    duration: Duration,
    surface: SurfaceConfig,
    from_lane: Option<String>,
    done: bool,
}

impl<'b> DragSession<'b> {
    /// Starts dragging a scheduled job. `lane` is the worker lane the
    /// gesture starts in.
    pub fn begin(
        board: &'b mut Board,
        id: &str,
        surface: Surface,
        lane: Option<&str>,
    ) -> BoardResult<Self> {
        let (original, window) = capture(board, id)?;
        let surface = board.config().surface(surface).clone();
        debug!("drag started for job {}", id);
        Ok(Self {
            board,
            original,
            duration: window.duration(),
            surface,
            from_lane: lane.map(str::to_string),
            done: false,
        })
    }

    /// Read access to the board while the gesture runs.
    pub fn board(&self) -> &Board {
        &*self.board
    }

    pub fn job_id(&self) -> &str {
        &self.original.id
    }

    /// Moves the job so it starts at the (snapped) time under `axis_left`.
    ///
    /// Returns the provisional start, or `None` if the axis is empty.
    pub fn update(&mut self, axis: &DayAxis, axis_left: f64) -> Option<NaiveDateTime> {
        let t = axis.time_at(axis_left.max(0.0))?;
        Some(self.move_to(t))
    }

    /// Moves the job to start at `start` (snapped), preserving duration.
    ///
    /// A start leaving no room for the job before the last representable
    /// time is ignored; the current start is returned.
    pub fn move_to(&mut self, start: NaiveDateTime) -> NaiveDateTime {
        let start = round_to_minutes(start, self.surface.snap_minutes);
        let Some(end) = start.checked_add_signed(self.duration) else {
            return self
                .board
                .job(&self.original.id)
                .and_then(|j| j.start)
                .unwrap_or(start);
        };
        if let Some(job) = self.board.job_mut(&self.original.id) {
            job.start = Some(start);
            job.end = Some(end);
        }
        self.board.touch();
        start
    }

    /// Provisionally reassigns the job from the starting lane to `to`.
    pub fn set_lane(&mut self, to: Option<&str>) {
        let from = self.from_lane.as_deref();
        if let Some(job) = self.board.job_mut(&self.original.id) {
            job.workers = self.original.workers.clone();
            job.move_between_lanes(from, to);
        }
        self.board.touch();
    }

    /// Commits the gesture. Returns `false` if nothing changed (no undo entry).
    pub fn end(mut self) -> bool {
        self.done = true;
        let lane_workers: Vec<String> = self
            .board
            .job(&self.original.id)
            .map(|j| j.workers.clone())
            .unwrap_or_default();
        let committed = commit(self.board, &self.original, UndoAction::MoveJob);
        if committed {
            for w in &lane_workers {
                self.board.registries_mut().insert(RegistryKind::Worker, w);
            }
        }
        debug!("drag ended for job {} (committed: {})", self.original.id, committed);
        committed
    }

    /// Abandons the gesture, restoring the original schedule and workers.
    pub fn cancel(mut self) {
        self.done = true;
        self.rollback();
    }

    fn rollback(&mut self) {
        if restore(self.board, &self.original) {
            self.board.touch();
        }
        debug!("drag cancelled for job {}", self.original.id);
    }
}

impl Drop for DragSession<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.rollback();
        }
    }
}

/// An in-progress resize of one edge.
#[derive(Debug)]
pub struct ResizeSession<'b> {
    board: &'b mut Board,
    original: Job,
    edge: Edge,
    current: TimeWindow,
    surface: SurfaceConfig,
    done: bool,
}

impl<'b> ResizeSession<'b> {
    /// Starts resizing `edge` of a scheduled job.
    pub fn begin(board: &'b mut Board, id: &str, edge: Edge, surface: Surface) -> BoardResult<Self> {
        let (original, window) = capture(board, id)?;
        let surface = board.config().surface(surface).clone();
        debug!("resize of {:?} started for job {}", edge, id);
        Ok(Self {
            board,
            original,
            edge,
            current: window,
            surface,
            done: false,
        })
    }

    pub fn board(&self) -> &Board {
        &*self.board
    }

    pub fn job_id(&self) -> &str {
        &self.original.id
    }

    pub fn edge(&self) -> Edge {
        self.edge
    }

    /// The job's provisional interval.
    pub fn current(&self) -> TimeWindow {
        self.current
    }

    /// Moves the edge to the (snapped) time at `axis_x`.
    ///
    /// Returns whether the change was applied. See [`resize_to`](Self::resize_to).
    pub fn update(&mut self, axis: &DayAxis, axis_x: f64) -> bool {
        match axis.time_at(axis_x) {
            Some(t) => self.resize_to(t),
            None => false,
        }
    }

    /// Moves the edge to `t` (snapped).
    ///
    /// A value that would make the job shorter than the surface's minimum
    /// duration is rejected and the previous value retained.
    pub fn resize_to(&mut self, t: NaiveDateTime) -> bool {
        let t = round_to_minutes(t, self.surface.snap_minutes);
        let candidate = match self.edge {
            Edge::Start => TimeWindow::new(t, self.current.end),
            Edge::End => TimeWindow::new(self.current.start, t),
        };
        let min = Duration::minutes(i64::from(self.surface.min_resize_minutes.max(1)));
        if candidate.duration() < min {
            return false;
        }
        if candidate == self.current {
            return true;
        }

        self.current = candidate;
        if let Some(job) = self.board.job_mut(&self.original.id) {
            job.start = Some(candidate.start);
            job.end = Some(candidate.end);
        }
        self.board.touch();
        true
    }

    /// Commits the gesture. Returns `false` if nothing changed (no undo entry).
    pub fn end(mut self) -> bool {
        self.done = true;
        let committed = commit(self.board, &self.original, UndoAction::ResizeJob);
        debug!("resize ended for job {} (committed: {})", self.original.id, committed);
        committed
    }

    /// Abandons the gesture, restoring the original interval.
    pub fn cancel(mut self) {
        self.done = true;
        self.rollback();
    }

    fn rollback(&mut self) {
        if restore(self.board, &self.original) {
            self.board.touch();
        }
        debug!("resize cancelled for job {}", self.original.id);
    }
}

impl Drop for ResizeSession<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.rollback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoardConfig;
    use crate::layout::Orientation;
    use crate::time::at;

    fn board() -> (Board, String) {
        let mut board = Board::default();
        let id = board
            .create_job(
                Job::draft("pump")
                    .with_worker("Dana")
                    .with_schedule(at("2024-01-01T09:00"), at("2024-01-01T11:00")),
            )
            .unwrap();
        (board, id)
    }

    fn axis() -> DayAxis {
        DayAxis::new(vec![at("2024-01-01T00:00").date(), at("2024-01-02T00:00").date()], 40.0)
    }

    #[test]
    fn test_drag_end_single_undo_entry() {
        let (mut board, id) = board();
        let history = board.history().len();
        let before = board.state();

        let mut drag = board.begin_drag(&id, Surface::Timeline, Some("Dana")).unwrap();
        // 13:07 snaps to 13:00 on the timeline
        let axis = axis();
        let start = drag.update(&axis, axis.position(at("2024-01-01T13:07"))).unwrap();
        assert_eq!(start, at("2024-01-01T13:00"));
        drag.update(&axis, axis.position(at("2024-01-02T08:22"))).unwrap();
        assert_eq!(drag.board().job(&id).unwrap().start, Some(at("2024-01-02T08:15")));
        assert_eq!(drag.board().history().len(), history);
        assert!(drag.end());

        let job = board.job(&id).unwrap();
        assert_eq!(job.end, Some(at("2024-01-02T10:15")));
        assert_eq!(board.history().len(), history + 1);

        board.undo().unwrap();
        assert_eq!(board.state(), before);
    }

    #[test]
    fn test_drag_far_off_axis_keeps_job() {
        let (mut board, id) = board();
        let before = board.state();

        let mut drag = board.begin_drag(&id, Surface::Timeline, Some("Dana")).unwrap();
        let axis = axis();
        assert_eq!(drag.update(&axis, 1e12), None);
        assert_eq!(drag.update(&axis, f64::INFINITY), None);
        assert_eq!(
            drag.move_to(NaiveDateTime::MAX - Duration::minutes(30)),
            at("2024-01-01T09:00")
        );
        assert!(!drag.end());
        assert_eq!(board.state(), before);
    }

    #[test]
    fn test_drag_gantt_snaps_to_hours() {
        let (mut board, id) = board();
        let mut drag = board.begin_drag(&id, Surface::Gantt, Some("Dana")).unwrap();
        assert_eq!(drag.move_to(at("2024-01-01T13:40")), at("2024-01-01T14:00"));
        drag.end();
        assert_eq!(board.job(&id).unwrap().end, Some(at("2024-01-01T16:00")));
    }

    #[test]
    fn test_drag_cancel_restores_without_undo() {
        let (mut board, id) = board();
        let before = board.state();
        let history = board.history().len();

        let mut drag = board.begin_drag(&id, Surface::Timeline, Some("Dana")).unwrap();
        drag.move_to(at("2024-01-01T15:00"));
        drag.set_lane(Some("Avi"));
        assert!(drag.board().job(&id).unwrap().has_worker("Avi"));
        drag.cancel();

        assert_eq!(board.state(), before);
        assert_eq!(board.history().len(), history);
    }

    #[test]
    fn test_drag_dropped_session_cancels() {
        let (mut board, id) = board();
        let before = board.state();
        {
            let mut drag = board.begin_drag(&id, Surface::Timeline, None).unwrap();
            drag.move_to(at("2024-01-01T15:00"));
        }
        assert_eq!(board.state(), before);
    }

    #[test]
    fn test_drag_without_change_skips_undo() {
        let (mut board, id) = board();
        let history = board.history().len();
        let mut drag = board.begin_drag(&id, Surface::Timeline, Some("Dana")).unwrap();
        drag.move_to(at("2024-01-01T09:00"));
        assert!(!drag.end());
        assert_eq!(board.history().len(), history);
    }

    #[test]
    fn test_drag_lane_change_commits() {
        let (mut board, id) = board();
        let mut drag = board.begin_drag(&id, Surface::Timeline, Some("Dana")).unwrap();
        drag.set_lane(Some("Moshe"));
        assert!(drag.end());
        assert_eq!(board.job(&id).unwrap().workers, vec!["Moshe"]);
        assert!(board.registries().contains(RegistryKind::Worker, "Moshe"));
    }

    #[test]
    fn test_begin_errors() {
        let (mut board, _) = board();
        assert!(matches!(
            board.begin_drag("404", Surface::Gantt, None),
            Err(BoardError::JobNotFound(_))
        ));
        let draft = board.create_job(Job::draft("unscheduled")).unwrap();
        assert!(matches!(
            board.begin_resize(&draft, Edge::End, Surface::Gantt),
            Err(BoardError::Validation(_))
        ));
    }

    #[test]
    fn test_resize_timeline_with_partial_config() {
        let config = BoardConfig::from_json(r#"{"timeline": {"pixels_per_hour": 60}}"#).unwrap();
        let mut board = Board::new(config);
        let id = board
            .create_job(
                Job::draft("pump")
                    .with_worker("Dana")
                    .with_schedule(at("2024-01-01T09:00"), at("2024-01-01T11:00")),
            )
            .unwrap();

        let mut resize = board.begin_resize(&id, Edge::End, Surface::Timeline).unwrap();
        assert!(resize.resize_to(at("2024-01-01T09:15")));
        assert!(resize.end());
        assert_eq!(board.job(&id).unwrap().end, Some(at("2024-01-01T09:15")));
        assert_eq!(board.config().timeline.orientation, Orientation::RightToLeft);
    }

    #[test]
    fn test_resize_minimum_duration() {
        let (mut board, id) = board();
        let history = board.history().len();

        let mut resize = board.begin_resize(&id, Edge::End, Surface::Timeline).unwrap();
        assert!(resize.resize_to(at("2024-01-01T09:15")));
        // Would collapse / invert: rejected, previous value kept
        assert!(!resize.resize_to(at("2024-01-01T09:00")));
        assert!(!resize.resize_to(at("2024-01-01T08:00")));
        assert_eq!(resize.current().end, at("2024-01-01T09:15"));
        assert!(resize.end());

        assert_eq!(board.job(&id).unwrap().end, Some(at("2024-01-01T09:15")));
        assert_eq!(board.history().len(), history + 1);
    }

    #[test]
    fn test_resize_gantt_one_hour_minimum() {
        let (mut board, id) = board();
        let mut resize = board.begin_resize(&id, Edge::Start, Surface::Gantt).unwrap();
        assert!(!resize.resize_to(at("2024-01-01T10:30")));
        assert!(resize.resize_to(at("2024-01-01T10:00")));
        assert!(resize.resize_to(at("2024-01-01T07:10")));
        assert_eq!(resize.current().start, at("2024-01-01T07:00"));
        resize.cancel();
        assert_eq!(board.job(&id).unwrap().start, Some(at("2024-01-01T09:00")));
    }

    #[test]
    fn test_resize_via_axis() {
        let (mut board, id) = board();
        let axis = axis();
        let mut resize = board.begin_resize(&id, Edge::End, Surface::Timeline).unwrap();
        assert!(resize.update(&axis, axis.position(at("2024-01-01T12:30"))));
        resize.end();
        assert_eq!(board.job(&id).unwrap().end, Some(at("2024-01-01T12:30")));
    }
}
