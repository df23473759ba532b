//! Job model.
//!
//! A job is one maintenance or service task on the board: who does it,
//! where, when, and what it waits for.
//!
//! # Schedule State
//! A job is *scheduled* iff both `start` and `end` are set and `end > start`.
//! Jobs imported without dates are legal and simply unscheduled.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{RegistryKind, TimeWindow};

/// Job priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// All priorities, lowest first.
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    /// Parses English names (any case) or the board's Hebrew labels.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "low" | "נמוכה" => Some(Self::Low),
            "medium" | "בינונית" => Some(Self::Medium),
            "high" | "גבוהה" => Some(Self::High),
            "urgent" | "דחופה" => Some(Self::Urgent),
            _ => None,
        }
    }

    /// Canonical lowercase name.
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// Label shown on the Hebrew board.
    pub fn hebrew_label(self) -> &'static str {
        match self {
            Self::Low => "נמוכה",
            Self::Medium => "בינונית",
            Self::High => "גבוהה",
            Self::Urgent => "דחופה",
        }
    }
}

/// A maintenance or service job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Unique job identifier (assigned by the board).
    pub id: String,
    /// Display title.
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub factory: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub equipment_number: String,
    #[serde(default)]
    pub service_call: String,
    /// Assigned workers, in display order, without duplicates.
    #[serde(default)]
    pub workers: Vec<String>,
    #[serde(default)]
    pub factory_manager: String,
    #[serde(default)]
    pub maintenance_manager: String,
    /// Start, board-local wall-clock time.
    #[serde(default)]
    pub start: Option<NaiveDateTime>,
    /// End, board-local wall-clock time.
    #[serde(default)]
    pub end: Option<NaiveDateTime>,
    /// Job that must complete before this one starts.
    #[serde(default)]
    pub depends_on: Option<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub finished: bool,
}

impl Job {
    /// Creates an unscheduled job with the given ID and title.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            factory: String::new(),
            department: String::new(),
            priority: None,
            equipment_number: String::new(),
            service_call: String::new(),
            workers: Vec::new(),
            factory_manager: String::new(),
            maintenance_manager: String::new(),
            start: None,
            end: None,
            depends_on: None,
            notes: String::new(),
            finished: false,
        }
    }

    /// Creates a job without an ID, for submission to the board.
    pub fn draft(title: impl Into<String>) -> Self {
        Self::new(String::new(), title)
    }

    /// Sets start and end.
    pub fn with_schedule(mut self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    /// Adds a worker (ignored if already assigned).
    pub fn with_worker(mut self, worker: impl Into<String>) -> Self {
        let worker = worker.into();
        if !self.workers.contains(&worker) {
            self.workers.push(worker);
        }
        self
    }

    pub fn with_factory(mut self, factory: impl Into<String>) -> Self {
        self.factory = factory.into();
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_managers(
        mut self,
        factory_manager: impl Into<String>,
        maintenance_manager: impl Into<String>,
    ) -> Self {
        self.factory_manager = factory_manager.into();
        self.maintenance_manager = maintenance_manager.into();
        self
    }

    pub fn with_equipment(mut self, equipment_number: impl Into<String>) -> Self {
        self.equipment_number = equipment_number.into();
        self
    }

    pub fn with_service_call(mut self, service_call: impl Into<String>) -> Self {
        self.service_call = service_call.into();
        self
    }

    /// Sets the prerequisite job.
    pub fn with_dependency(mut self, job_id: impl Into<String>) -> Self {
        self.depends_on = Some(job_id.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_finished(mut self, finished: bool) -> Self {
        self.finished = finished;
        self
    }

    /// Whether the job has a valid `[start, end)` interval.
    pub fn is_scheduled(&self) -> bool {
        self.window().is_some()
    }

    /// The job's interval, if scheduled.
    pub fn window(&self) -> Option<TimeWindow> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if end > start => Some(TimeWindow::new(start, end)),
            _ => None,
        }
    }

    /// Duration (`end - start`) when both endpoints are set.
    pub fn duration(&self) -> Option<Duration> {
        Some(self.end? - self.start?)
    }

    /// Whether a worker is assigned.
    pub fn has_worker(&self, worker: &str) -> bool {
        self.workers.iter().any(|w| w == worker)
    }

    /// Trims text fields, drops blank or duplicate workers, and clears an
    /// empty dependency.
    pub fn normalize(&mut self) {
        for field in [
            &mut self.title,
            &mut self.factory,
            &mut self.department,
            &mut self.equipment_number,
            &mut self.service_call,
            &mut self.factory_manager,
            &mut self.maintenance_manager,
        ] {
            let trimmed = field.trim();
            if trimmed.len() != field.len() {
                *field = trimmed.to_string();
            }
        }

        let mut workers: Vec<String> = Vec::with_capacity(self.workers.len());
        for w in self.workers.drain(..) {
            let w = w.trim();
            if !w.is_empty() && !workers.iter().any(|x| x == w) {
                workers.push(w.to_string());
            }
        }
        self.workers = workers;

        if self
            .depends_on
            .as_deref()
            .is_some_and(|d| d.trim().is_empty())
        {
            self.depends_on = None;
        }
    }

    /// Returns the single-valued label field for a registry kind.
    ///
    /// `None` for [`RegistryKind::Worker`], which is multi-valued.
    pub fn label(&self, kind: RegistryKind) -> Option<&str> {
        match kind {
            RegistryKind::Factory => Some(&self.factory),
            RegistryKind::FactoryManager => Some(&self.factory_manager),
            RegistryKind::MaintenanceManager => Some(&self.maintenance_manager),
            RegistryKind::Department => Some(&self.department),
            RegistryKind::Worker => None,
        }
    }

    fn label_mut(&mut self, kind: RegistryKind) -> Option<&mut String> {
        match kind {
            RegistryKind::Factory => Some(&mut self.factory),
            RegistryKind::FactoryManager => Some(&mut self.factory_manager),
            RegistryKind::MaintenanceManager => Some(&mut self.maintenance_manager),
            RegistryKind::Department => Some(&mut self.department),
            RegistryKind::Worker => None,
        }
    }

    /// Whether this job references `label` in the given registry's field.
    pub fn references(&self, kind: RegistryKind, label: &str) -> bool {
        match self.label(kind) {
            Some(value) => value == label,
            None => self.has_worker(label),
        }
    }

    /// Replaces `old` with `new` in the field for `kind`. Returns whether
    /// anything changed.
    pub fn rename_label(&mut self, kind: RegistryKind, old: &str, new: &str) -> bool {
        if let Some(field) = self.label_mut(kind) {
            if field == old {
                *field = new.to_string();
                return true;
            }
            return false;
        }

        let Some(idx) = self.workers.iter().position(|w| w == old) else {
            return false;
        };
        if self.has_worker(new) {
            self.workers.remove(idx);
        } else {
            self.workers[idx] = new.to_string();
        }
        true
    }

    /// Clears `label` from the field for `kind`. Returns whether anything
    /// changed.
    pub fn clear_label(&mut self, kind: RegistryKind, label: &str) -> bool {
        if let Some(field) = self.label_mut(kind) {
            if field == label {
                field.clear();
                return true;
            }
            return false;
        }

        let before = self.workers.len();
        self.workers.retain(|w| w != label);
        self.workers.len() != before
    }

    /// Moves the job from one worker lane to another.
    ///
    /// `None` denotes the unassigned lane. Leaving a worker's lane removes
    /// that worker; entering one adds it (without duplicating).
    pub fn move_between_lanes(&mut self, from: Option<&str>, to: Option<&str>) {
        if from == to {
            return;
        }
        match (from, to) {
            (Some(from), Some(to)) => {
                self.rename_label(RegistryKind::Worker, from, to);
                if !self.has_worker(to) {
                    self.workers.push(to.to_string());
                }
            }
            (Some(from), None) => {
                self.workers.retain(|w| w != from);
            }
            (None, Some(to)) => {
                if !self.has_worker(to) {
                    self.workers.push(to.to_string());
                }
            }
            (None, None) => {}
        }
    }
}
