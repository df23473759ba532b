//! Filter and sort engine.
//!
//! [`pass_filters`] is a pure predicate combining every criterion with AND
//! semantics. Blank criteria (`None`, empty or whitespace strings) impose
//! no constraint.
//!
//! Issue modes need the [`Issues`] computed over the full collection:
//! - `conflicts_only`: job must be in the conflict set
//! - `dependency_issues_only`: job must be in the dependency-issue set
//! - `show_both`: job must be in either set (overrides the two above)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::issues::Issues;
use crate::models::{Job, Priority};

/// Completion-status facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    Any,
    Finished,
    Unfinished,
}

/// Filter criteria for the board views.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub factory: Option<String>,
    /// Matches if the job's worker list contains this worker.
    pub worker: Option<String>,
    pub factory_manager: Option<String>,
    pub maintenance_manager: Option<String>,
    pub priority: Option<Priority>,
    pub department: Option<String>,
    pub status: StatusFilter,
    /// Case-insensitive substring of the equipment number.
    pub equipment_number: Option<String>,
    /// Case-insensitive substring of the service call.
    pub service_call: Option<String>,
    /// Case-insensitive substring of title, notes, priority, equipment,
    /// service call or department.
    pub search: Option<String>,
    /// Jobs ending before this day are excluded.
    pub date_from: Option<NaiveDate>,
    /// Jobs starting after this day are excluded.
    pub date_to: Option<NaiveDate>,
    pub conflicts_only: bool,
    pub dependency_issues_only: bool,
    pub show_both: bool,
}

impl FilterCriteria {
    /// Creates an open filter.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_factory(mut self, factory: impl Into<String>) -> Self {
        self.factory = Some(factory.into());
        self
    }

    pub fn with_worker(mut self, worker: impl Into<String>) -> Self {
        self.worker = Some(worker.into());
        self
    }

    pub fn with_factory_manager(mut self, name: impl Into<String>) -> Self {
        self.factory_manager = Some(name.into());
        self
    }

    pub fn with_maintenance_manager(mut self, name: impl Into<String>) -> Self {
        self.maintenance_manager = Some(name.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_equipment_number(mut self, needle: impl Into<String>) -> Self {
        self.equipment_number = Some(needle.into());
        self
    }

    pub fn with_service_call(mut self, needle: impl Into<String>) -> Self {
        self.service_call = Some(needle.into());
        self
    }

    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }

    /// Sets the inclusive day range; either bound may be open.
    pub fn with_dates(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    pub fn with_conflicts_only(mut self, on: bool) -> Self {
        self.conflicts_only = on;
        self
    }

    pub fn with_dependency_issues_only(mut self, on: bool) -> Self {
        self.dependency_issues_only = on;
        self
    }

    pub fn with_show_both(mut self, on: bool) -> Self {
        self.show_both = on;
        self
    }

    /// Whether any issue mode is active.
    pub fn has_issue_mode(&self) -> bool {
        self.conflicts_only || self.dependency_issues_only || self.show_both
    }

    /// The same criteria with every issue mode switched off.
    pub fn without_issue_modes(&self) -> Self {
        Self {
            conflicts_only: false,
            dependency_issues_only: false,
            show_both: false,
            ..self.clone()
        }
    }

    /// Stable hash of the criteria, used as a cache key.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// Returns the trimmed criterion, or `None` if it is blank.
fn active(criterion: &Option<String>) -> Option<&str> {
    criterion
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Whether a job passes every criterion.
pub fn pass_filters(job: &Job, criteria: &FilterCriteria, issues: &Issues) -> bool {
    if active(&criteria.factory).is_some_and(|f| job.factory != f) {
        return false;
    }
    if active(&criteria.worker).is_some_and(|w| !job.has_worker(w)) {
        return false;
    }
    if active(&criteria.factory_manager).is_some_and(|m| job.factory_manager != m) {
        return false;
    }
    if active(&criteria.maintenance_manager).is_some_and(|m| job.maintenance_manager != m) {
        return false;
    }
    if criteria.priority.is_some() && job.priority != criteria.priority {
        return false;
    }
    if active(&criteria.equipment_number).is_some_and(|e| !contains_ci(&job.equipment_number, e)) {
        return false;
    }
    if active(&criteria.service_call).is_some_and(|s| !contains_ci(&job.service_call, s)) {
        return false;
    }
    if active(&criteria.department).is_some_and(|d| job.department != d) {
        return false;
    }

    match criteria.status {
        StatusFilter::Finished if !job.finished => return false,
        StatusFilter::Unfinished if job.finished => return false,
        _ => {}
    }

    if let (Some(from), Some(end)) = (criteria.date_from, job.end) {
        if end.date() < from {
            return false;
        }
    }
    if let (Some(to), Some(start)) = (criteria.date_to, job.start) {
        if start.date() > to {
            return false;
        }
    }

    if let Some(q) = active(&criteria.search) {
        let (priority, priority_he) = job
            .priority
            .map_or(("", ""), |p| (p.label(), p.hebrew_label()));
        let blob = format!(
            "{} {} {} {} {} {} {}",
            job.title,
            job.notes,
            priority,
            priority_he,
            job.equipment_number,
            job.service_call,
            job.department
        );
        if !contains_ci(&blob, q) {
            return false;
        }
    }

    if criteria.show_both {
        if !issues.is_flagged(&job.id) {
            return false;
        }
    } else {
        if criteria.conflicts_only && !issues.is_conflict(&job.id) {
            return false;
        }
        if criteria.dependency_issues_only && !issues.has_dependency_issue(&job.id) {
            return false;
        }
    }

    true
}

/// Table column to sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Title,
    Factory,
    Workers,
    FactoryManager,
    MaintenanceManager,
    Priority,
    EquipmentNumber,
    ServiceCall,
    Department,
    Start,
    End,
    Duration,
    Notes,
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn compare(a: &Job, b: &Job, key: SortKey) -> Ordering {
    match key {
        SortKey::Title => cmp_text(&a.title, &b.title),
        SortKey::Factory => cmp_text(&a.factory, &b.factory),
        SortKey::Workers => cmp_text(&a.workers.join(", "), &b.workers.join(", ")),
        SortKey::FactoryManager => cmp_text(&a.factory_manager, &b.factory_manager),
        SortKey::MaintenanceManager => cmp_text(&a.maintenance_manager, &b.maintenance_manager),
        SortKey::Priority => a.priority.cmp(&b.priority),
        SortKey::EquipmentNumber => cmp_text(&a.equipment_number, &b.equipment_number),
        SortKey::ServiceCall => cmp_text(&a.service_call, &b.service_call),
        SortKey::Department => cmp_text(&a.department, &b.department),
        SortKey::Start => a.start.cmp(&b.start),
        SortKey::End => a.end.cmp(&b.end),
        SortKey::Duration => a.duration().cmp(&b.duration()),
        SortKey::Notes => cmp_text(&a.notes, &b.notes),
    }
}

/// Stable sort of table rows. Missing values sort first when ascending.
pub fn sort_jobs(jobs: &mut [&Job], key: SortKey, ascending: bool) {
    jobs.sort_by(|a, b| {
        let ord = compare(a, b, key);
        if ascending {
            ord
        } else {
            ord.reverse()
        }
    });
}
