//! Scheduling consistency checks.
//!
//! Detects two kinds of problems over the **full** job collection:
//!
//! - **Conflicts**: a worker is booked on two jobs whose `[start, end)`
//!   intervals overlap.
//! - **Dependency issues**: a job starts before the job it depends on ends.
//!
//! Both are always computed over every job, never over a filtered view, so
//! filtering cannot hide a real problem among the jobs that stay visible.
//! Results are recomputed from scratch after each mutation.
//!
//! # Complexity
//! Conflicts: O(W·k²) for W workers with k jobs each. Dependencies: O(n).

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::models::{Job, Priority, TimeWindow};
use crate::time::{is_overlap, job_touches_shabbat};

/// IDs of every job in a worker double-booking.
///
/// Jobs are grouped per assigned worker (a job with N workers joins N
/// groups). Within a group every pair is tested, not only neighbours.
/// Jobs without workers or without a valid schedule are never compared.
pub fn recompute_conflicts(jobs: &[Job]) -> HashSet<String> {
    let mut by_worker: BTreeMap<&str, Vec<(&str, TimeWindow)>> = BTreeMap::new();
    for job in jobs {
        let Some(window) = job.window() else { continue };
        for worker in &job.workers {
            by_worker
                .entry(worker.as_str())
                .or_default()
                .push((job.id.as_str(), window));
        }
    }

    let mut conflicts = HashSet::new();
    for group in by_worker.values_mut() {
        group.sort_by_key(|(_, w)| w.start);
        for (i, (a_id, a)) in group.iter().enumerate() {
            for (b_id, b) in &group[i + 1..] {
                // Sorted by start: nothing later can reach back into `a`.
                if b.start >= a.end {
                    break;
                }
                if is_overlap(a.start, a.end, b.start, b.end) {
                    conflicts.insert((*a_id).to_string());
                    conflicts.insert((*b_id).to_string());
                }
            }
        }
    }
    conflicts
}

/// IDs of every job involved in a dependency-order violation.
///
/// A violation is a dependent job starting strictly before its
/// prerequisite ends. Both IDs are reported. Dangling references and
/// unscheduled jobs are skipped.
pub fn recompute_dependency_issues(jobs: &[Job]) -> HashSet<String> {
    let by_id: HashMap<&str, &Job> = jobs.iter().map(|j| (j.id.as_str(), j)).collect();

    let mut issues = HashSet::new();
    for job in jobs {
        let Some(dep_id) = job.depends_on.as_deref() else {
            continue;
        };
        let Some(dep) = by_id.get(dep_id) else {
            continue;
        };
        let (Some(own), Some(prereq)) = (job.window(), dep.window()) else {
            continue;
        };
        if own.start < prereq.end {
            issues.insert(job.id.clone());
            issues.insert(dep.id.clone());
        }
    }
    issues
}

/// Conflict and dependency-issue sets for one version of the board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Issues {
    pub conflicts: HashSet<String>,
    pub dependency_issues: HashSet<String>,
}

impl Issues {
    /// Computes both sets over the full collection.
    pub fn compute(jobs: &[Job]) -> Self {
        let issues = Self {
            conflicts: recompute_conflicts(jobs),
            dependency_issues: recompute_dependency_issues(jobs),
        };
        debug!(
            jobs = jobs.len(),
            conflicts = issues.conflicts.len(),
            dependency_issues = issues.dependency_issues.len(),
            "recomputed issues"
        );
        issues
    }

    #[inline]
    pub fn is_conflict(&self, job_id: &str) -> bool {
        self.conflicts.contains(job_id)
    }

    #[inline]
    pub fn has_dependency_issue(&self, job_id: &str) -> bool {
        self.dependency_issues.contains(job_id)
    }

    /// Whether the job is in either set.
    pub fn is_flagged(&self, job_id: &str) -> bool {
        self.is_conflict(job_id) || self.has_dependency_issue(job_id)
    }

    /// Whether the board has no issues at all.
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty() && self.dependency_issues.is_empty()
    }
}

/// Dominant visual status of a job bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BarStatus {
    Conflict,
    DependencyIssue,
    Finished,
    Shabbat,
    Normal,
}

impl BarStatus {
    /// Classifies a job: Conflict > DependencyIssue > Finished > Shabbat > Normal.
    pub fn classify(job: &Job, issues: &Issues) -> Self {
        if issues.is_conflict(&job.id) {
            Self::Conflict
        } else if issues.has_dependency_issue(&job.id) {
            Self::DependencyIssue
        } else if job.finished {
            Self::Finished
        } else if job_touches_shabbat(job) {
            Self::Shabbat
        } else {
            Self::Normal
        }
    }

    /// Fill colour for the status, or `None` for [`BarStatus::Normal`].
    pub fn color(self) -> Option<&'static str> {
        match self {
            Self::Conflict => Some("#dc3545"),
            Self::DependencyIssue => Some("#ffc107"),
            Self::Finished => Some("#28a745"),
            Self::Shabbat => Some("#ffc107"),
            Self::Normal => None,
        }
    }
}

/// Every status flag that applies to a job, as CSS-style class names.
pub fn status_classes(job: &Job, issues: &Issues) -> Vec<&'static str> {
    let mut classes = Vec::new();
    if job.finished {
        classes.push("finished");
    }
    if issues.is_conflict(&job.id) {
        classes.push("conflict");
    }
    if issues.has_dependency_issue(&job.id) {
        classes.push("dep-issue");
    }
    if job_touches_shabbat(job) {
        classes.push("shabbat");
    }
    classes
}

const FACTORY_PALETTE: [&str; 10] = [
    "#ff6b6b", "#4ecdc4", "#45b7d1", "#96ceb4", "#feca57", "#ff9ff3", "#54a0ff", "#5f27cd",
    "#00d2d3", "#ff9f43",
];

const DEFAULT_COLOR: &str = "#95a5a6";

fn priority_color(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "#45b7d1",
        Priority::Medium => "#4ecdc4",
        Priority::High => "#ff6b6b",
        Priority::Urgent => "#ff9f43",
    }
}

/// 32-bit rolling string hash (`h * 31 + c` over UTF-16 units).
fn factory_hash(factory: &str) -> i32 {
    factory
        .encode_utf16()
        .fold(0i32, |h, c| (h << 5).wrapping_sub(h).wrapping_add(i32::from(c)))
}

/// Bar fill colour: status colour, else priority colour, else a stable
/// per-factory palette colour, else grey.
pub fn bar_color(job: &Job, issues: &Issues) -> &'static str {
    if let Some(color) = BarStatus::classify(job, issues).color() {
        return color;
    }
    if let Some(priority) = job.priority {
        return priority_color(priority);
    }
    if !job.factory.is_empty() {
        let idx = factory_hash(&job.factory).unsigned_abs() as usize % FACTORY_PALETTE.len();
        return FACTORY_PALETTE[idx];
    }
    DEFAULT_COLOR
}

/// Workers assigned to at least one flagged job.
pub fn workers_with_issues(jobs: &[Job], issues: &Issues) -> BTreeSet<String> {
    jobs.iter()
        .filter(|j| issues.is_flagged(&j.id))
        .flat_map(|j| j.workers.iter().cloned())
        .collect()
}
