//! The board store.
//!
//! [`Board`] is the single owner of the job collection, the label
//! registries, the undo history and a monotonically increasing version.
//! Every command follows the same pattern:
//!
//! 1. Resolve and validate (failure → [`BoardError`], nothing changed)
//! 2. Push a snapshot of the full state onto the undo history
//! 3. Mutate
//! 4. Bump the version, which invalidates every derived cache
//!
//! Readers use `&self`; the conflict and dependency sets are computed
//! lazily once per version and shared by every view.

use chrono::{Duration, NaiveDateTime};
use std::cell::OnceCell;
use tracing::{debug, info, warn};

use crate::config::{BoardConfig, Surface};
use crate::error::{BoardError, BoardResult};
use crate::import::{import_sheet, ColumnMapping, ImportOutcome, Sheet};
use crate::issues::Issues;
use crate::layout::DayAxisCache;
use crate::models::{next_numeric_id, BoardState, Edge, Job, Registries, RegistryKind};
use crate::persistence::Persistence;
use crate::session::{DragSession, ResizeSession};
use crate::time::round_to_15;
use crate::undo::{Snapshot, UndoAction, UndoHistory};
use crate::validation::{validate_board, validate_job};
use crate::view::{build_view, BoardView, ViewRequest};

/// Suffix appended to the title of a cloned job.
pub const CLONE_SUFFIX: &str = " (עותק)";

/// Reassignment of a job from one worker lane to another.
///
/// `None` is the lane of jobs without workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneChange {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl LaneChange {
    pub fn new(from: Option<&str>, to: Option<&str>) -> Self {
        Self {
            from: from.map(str::to_string),
            to: to.map(str::to_string),
        }
    }
}

/// The job board.
#[derive(Debug)]
pub struct Board {
    config: BoardConfig,
    jobs: Vec<Job>,
    registries: Registries,
    history: UndoHistory,
    next_id: u64,
    version: u64,
    issues: OnceCell<Issues>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(BoardConfig::default())
    }
}

impl Board {
    /// Creates an empty board.
    pub fn new(config: BoardConfig) -> Self {
        let history = UndoHistory::new(config.undo_capacity);
        Self {
            config,
            jobs: Vec::new(),
            registries: Registries::new(),
            history,
            next_id: 1,
            version: 0,
            issues: OnceCell::new(),
        }
    }

    /// Creates a board from a stored state.
    ///
    /// Jobs are normalized and registries are extended with every label the
    /// jobs reference. Integrity problems are logged, not rejected.
    pub fn from_state(state: BoardState, config: BoardConfig) -> Self {
        let mut board = Self::new(config);
        board.replace_state(state);
        if let Err(errors) = validate_board(&board.jobs) {
            for e in &errors {
                warn!("loaded board: {}", e.message);
            }
        }
        board
    }

    // ---- Accessors ----

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// All jobs, in insertion order.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn job(&self, id: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    /// Version counter, bumped by every change.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Conflict and dependency sets for the current version.
    pub fn issues(&self) -> &Issues {
        self.issues.get_or_init(|| Issues::compute(&self.jobs))
    }

    /// Deep copy of jobs and registries.
    pub fn state(&self) -> BoardState {
        BoardState::new(self.jobs.clone(), self.registries.clone())
    }

    /// Number of jobs referencing a label.
    pub fn count_jobs(&self, kind: RegistryKind, label: &str) -> usize {
        Registries::count_jobs(&self.jobs, kind, label)
    }

    /// Builds a render-ready view. See [`build_view`].
    pub fn view(&self, request: &ViewRequest, cache: &mut DayAxisCache) -> BoardView {
        build_view(self, request, cache)
    }

    // ---- Job commands ----

    /// Adds a job. Start and end are rounded to 15 minutes.
    ///
    /// Returns the new job's ID.
    pub fn create_job(&mut self, draft: Job) -> BoardResult<String> {
        let id = self.next_id.to_string();
        let mut job = self.prepare(draft, &id)?;
        job.finished = false;

        self.record(UndoAction::CreateJob);
        self.registries.absorb(&job);
        self.jobs.push(job);
        self.next_id += 1;
        self.touch();
        info!("created job {}", id);
        Ok(id)
    }

    /// Replaces a job's fields with those of `draft`.
    ///
    /// The ID and completion flag are kept; start and end are rounded to
    /// 15 minutes.
    pub fn update_job(&mut self, id: &str, draft: Job) -> BoardResult<()> {
        let idx = self.index_of(id)?;
        let mut job = self.prepare(draft, id)?;
        job.finished = self.jobs[idx].finished;

        self.record(UndoAction::UpdateJob);
        self.registries.absorb(&job);
        self.jobs[idx] = job;
        self.touch();
        info!("updated job {}", id);
        Ok(())
    }

    /// Inline edit of one endpoint, rounded to 15 minutes.
    ///
    /// Rejected if the result would leave `end <= start`.
    pub fn set_job_time(&mut self, id: &str, edge: Edge, value: NaiveDateTime) -> BoardResult<()> {
        let idx = self.index_of(id)?;
        let value = round_to_15(value);

        let job = &self.jobs[idx];
        let (start, end) = match edge {
            Edge::Start => (Some(value), job.end),
            Edge::End => (job.start, Some(value)),
        };
        if let (Some(start), Some(end)) = (start, end) {
            if end <= start {
                return Err(BoardError::Validation("end must be after start".into()));
            }
        }

        self.record(UndoAction::SetJobTime);
        let job = &mut self.jobs[idx];
        job.start = start;
        job.end = end;
        self.touch();
        info!("set {:?} of job {} to {}", edge, id, value);
        Ok(())
    }

    /// Removes a job permanently (recoverable through undo).
    pub fn delete_job(&mut self, id: &str) -> BoardResult<Job> {
        let idx = self.index_of(id)?;
        self.record(UndoAction::DeleteJob);
        let removed = self.jobs.remove(idx);
        self.touch();
        info!("deleted job {}", id);
        Ok(removed)
    }

    /// Duplicates a job under a new ID.
    ///
    /// The copy's title gets [`CLONE_SUFFIX`], a scheduled copy is shifted
    /// one hour later, and it starts unfinished. Returns the new ID.
    pub fn clone_job(&mut self, id: &str) -> BoardResult<String> {
        let idx = self.index_of(id)?;
        let new_id = self.next_id.to_string();

        let mut copy = self.jobs[idx].clone();
        copy.id = new_id.clone();
        copy.title.push_str(CLONE_SUFFIX);
        copy.finished = false;
        if let (Some(start), Some(end)) = (copy.start, copy.end) {
            copy.start = Some(start + Duration::hours(1));
            copy.end = Some(end + Duration::hours(1));
        }

        self.record(UndoAction::CloneJob);
        self.jobs.push(copy);
        self.next_id += 1;
        self.touch();
        info!("cloned job {} as {}", id, new_id);
        Ok(new_id)
    }

    /// Flips the completion flag. Returns the new value.
    pub fn toggle_finished(&mut self, id: &str) -> BoardResult<bool> {
        let idx = self.index_of(id)?;
        self.record(UndoAction::ToggleFinished);
        let job = &mut self.jobs[idx];
        job.finished = !job.finished;
        let finished = job.finished;
        self.touch();
        info!("job {} finished = {}", id, finished);
        Ok(finished)
    }

    /// Moves a scheduled job to `new_start`, preserving its duration, and
    /// optionally into another worker lane.
    pub fn move_job(
        &mut self,
        id: &str,
        new_start: NaiveDateTime,
        lane: Option<LaneChange>,
    ) -> BoardResult<()> {
        let idx = self.index_of(id)?;
        let Some(window) = self.jobs[idx].window() else {
            return Err(BoardError::Validation(format!("job '{id}' is not scheduled")));
        };

        self.record(UndoAction::MoveJob);
        let job = &mut self.jobs[idx];
        job.start = Some(new_start);
        job.end = Some(new_start + window.duration());
        if let Some(lane) = lane {
            job.move_between_lanes(lane.from.as_deref(), lane.to.as_deref());
            if let Some(to) = lane.to.as_deref() {
                self.registries.insert(RegistryKind::Worker, to);
            }
        }
        self.touch();
        info!("moved job {} to {}", id, new_start);
        Ok(())
    }

    // ---- Registry commands ----

    /// Registers a new label.
    pub fn add_label(&mut self, kind: RegistryKind, label: &str) -> BoardResult<()> {
        let label = label.trim();
        if label.is_empty() {
            return Err(BoardError::BlankLabel(kind));
        }
        if self.registries.contains(kind, label) {
            return Err(BoardError::DuplicateLabel {
                kind,
                label: label.to_string(),
            });
        }

        self.record(UndoAction::AddLabel);
        self.registries.insert(kind, label);
        self.touch();
        info!("added {} '{}'", kind, label);
        Ok(())
    }

    /// Renames a label everywhere it is used.
    ///
    /// Renaming to the same name is a no-op. Returns the number of jobs
    /// updated.
    pub fn rename_label(&mut self, kind: RegistryKind, old: &str, new: &str) -> BoardResult<usize> {
        let new = new.trim();
        if new.is_empty() {
            return Err(BoardError::BlankLabel(kind));
        }
        if !self.registries.contains(kind, old) {
            return Err(BoardError::LabelNotFound {
                kind,
                label: old.to_string(),
            });
        }
        if new == old {
            return Ok(0);
        }
        if self.registries.contains(kind, new) {
            return Err(BoardError::DuplicateLabel {
                kind,
                label: new.to_string(),
            });
        }

        self.record(UndoAction::RenameLabel);
        self.registries.remove(kind, old);
        self.registries.insert(kind, new);
        let updated = self
            .jobs
            .iter_mut()
            .map(|job| job.rename_label(kind, old, new))
            .filter(|changed| *changed)
            .count();
        self.touch();
        info!("renamed {} '{}' to '{}' in {} jobs", kind, old, new, updated);
        Ok(updated)
    }

    /// Removes a label and clears it from every job. Jobs are kept.
    ///
    /// Returns the number of jobs updated.
    pub fn delete_label(&mut self, kind: RegistryKind, label: &str) -> BoardResult<usize> {
        if !self.registries.contains(kind, label) {
            return Err(BoardError::LabelNotFound {
                kind,
                label: label.to_string(),
            });
        }

        self.record(UndoAction::DeleteLabel);
        self.registries.remove(kind, label);
        let updated = self
            .jobs
            .iter_mut()
            .map(|job| job.clear_label(kind, label))
            .filter(|changed| *changed)
            .count();
        self.touch();
        info!("deleted {} '{}' from {} jobs", kind, label, updated);
        Ok(updated)
    }

    // ---- Bulk ----

    /// Replaces the whole board with imported jobs and rebuilds registries.
    ///
    /// Returns the number of jobs imported.
    pub fn import(&mut self, outcome: ImportOutcome) -> usize {
        self.record(UndoAction::Import);
        let count = outcome.jobs.len();
        self.replace_state(BoardState::from_jobs(outcome.jobs));
        self.touch();
        info!("imported {} jobs ({} rows skipped)", count, outcome.skipped);
        count
    }

    /// Imports a sheet, reading offset timestamps in the board's zone.
    ///
    /// See [`import`](Self::import).
    pub fn import_sheet(&mut self, sheet: &Sheet, mapping: &ColumnMapping) -> usize {
        let outcome = import_sheet(sheet, mapping, self.config.time_zone);
        self.import(outcome)
    }

    /// Restores the state before the most recent command.
    pub fn undo(&mut self) -> BoardResult<UndoAction> {
        let snapshot = self.history.pop().ok_or(BoardError::NothingToUndo)?;
        self.jobs = snapshot.state.jobs;
        self.registries = snapshot.state.registries;
        self.next_id = self.next_id.max(next_numeric_id(&self.jobs));
        self.touch();
        info!("undid {}", snapshot.action);
        Ok(snapshot.action)
    }

    // ---- Persistence ----

    /// Saves jobs and registries.
    pub fn save_to(&self, store: &mut impl Persistence) -> BoardResult<()> {
        store.save(&self.state())?;
        debug!("saved {} jobs", self.jobs.len());
        Ok(())
    }

    /// Loads a board; `None` if the store is empty or unreadable.
    ///
    /// Offset timestamps are converted into `config.time_zone`.
    pub fn load_from(store: &impl Persistence, config: BoardConfig) -> Option<Self> {
        let state = store.load(config.time_zone)?;
        info!("loaded {} jobs", state.jobs.len());
        Some(Self::from_state(state, config))
    }

    // ---- Gesture sessions ----

    /// Starts a drag-move of a scheduled job on a surface.
    ///
    /// `lane` is the worker lane the drag starts in (`None` for the
    /// unassigned lane).
    pub fn begin_drag(
        &mut self,
        id: &str,
        surface: Surface,
        lane: Option<&str>,
    ) -> BoardResult<DragSession<'_>> {
        DragSession::begin(self, id, surface, lane)
    }

    /// Starts resizing one edge of a scheduled job on a surface.
    pub fn begin_resize(
        &mut self,
        id: &str,
        edge: Edge,
        surface: Surface,
    ) -> BoardResult<ResizeSession<'_>> {
        ResizeSession::begin(self, id, edge, surface)
    }

    // ---- Internals ----

    fn index_of(&self, id: &str) -> BoardResult<usize> {
        self.jobs
            .iter()
            .position(|j| j.id == id)
            .ok_or_else(|| BoardError::JobNotFound(id.to_string()))
    }

    /// Normalizes, rounds and validates a submitted job under `id`.
    fn prepare(&self, mut draft: Job, id: &str) -> BoardResult<Job> {
        draft.id = id.to_string();
        draft.normalize();
        draft.start = draft.start.map(round_to_15);
        draft.end = draft.end.map(round_to_15);

        let report = validate_job(&draft, &self.config);
        if !report.is_valid() {
            return Err(BoardError::Validation(report.error_message()));
        }
        for w in &report.warnings {
            debug!("job {}: {}", id, w.message);
        }
        Ok(draft)
    }

    fn replace_state(&mut self, state: BoardState) {
        let BoardState {
            mut jobs,
            mut registries,
        } = state;
        for job in &mut jobs {
            job.normalize();
            registries.absorb(job);
        }
        self.next_id = next_numeric_id(&jobs);
        self.jobs = jobs;
        self.registries = registries;
    }

    /// Pushes a snapshot of the current state.
    fn record(&mut self, action: UndoAction) {
        let state = self.state();
        self.push_snapshot(action, state);
    }

    pub(crate) fn push_snapshot(&mut self, action: UndoAction, state: BoardState) {
        self.history.push(Snapshot::new(action, state));
    }

    pub(crate) fn job_mut(&mut self, id: &str) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }

    pub(crate) fn registries_mut(&mut self) -> &mut Registries {
        &mut self.registries
    }

    /// Marks the board changed: bumps the version and drops cached issues.
    pub(crate) fn touch(&mut self) {
        self.version += 1;
        self.issues = OnceCell::new();
    }
}
