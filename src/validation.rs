//! Input validation for jobs and boards.
//!
//! Two levels:
//! - **Job** ([`validate_job`]): required title, consistent schedule, no
//!   self-dependency. Also produces non-blocking warnings (very short or
//!   long jobs, work outside the working day, no workers).
//! - **Board** ([`validate_board`]): structural integrity of a loaded or
//!   imported collection. Detects:
//!   - Duplicate IDs
//!   - Self-dependencies
//!   - Circular dependency chains (DAG validation)
//!
//! Dangling `depends_on` references are tolerated at both levels.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use chrono::{NaiveDateTime, Timelike};
use std::collections::{HashMap, HashSet};

use crate::config::BoardConfig;
use crate::models::Job;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two jobs share the same ID.
    DuplicateId,
    /// Title is empty or whitespace.
    MissingTitle,
    /// Only one of start/end is set.
    MissingEndpoint,
    /// End is not after start.
    InvalidRange,
    /// A job depends on itself.
    SelfDependency,
    /// Dependency chain contains a cycle.
    CyclicDependency,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// A non-blocking observation about a job.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    pub kind: WarningKind,
    pub message: String,
}

/// Categories of validation warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    TooShort,
    TooLong,
    BeforeWorkDay,
    AfterWorkDay,
    NoWorkers,
}

impl ValidationWarning {
    fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of [`validate_job`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl JobReport {
    /// Whether the job may be saved.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// All error messages joined with `"; "`.
    pub fn error_message(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Checks that both endpoints are present and `end > start`.
pub fn validate_range(
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
) -> Result<(), ValidationError> {
    let (Some(start), Some(end)) = (start, end) else {
        return Err(ValidationError::new(
            ValidationErrorKind::MissingEndpoint,
            "start and end are required",
        ));
    };
    if end <= start {
        return Err(ValidationError::new(
            ValidationErrorKind::InvalidRange,
            "end must be after start",
        ));
    }
    Ok(())
}

/// Like [`validate_range`], but an entirely unscheduled job is valid.
pub fn validate_schedule(
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
) -> Result<(), ValidationError> {
    if start.is_none() && end.is_none() {
        return Ok(());
    }
    validate_range(start, end)
}

/// Validates a single job.
///
/// Checks:
/// 1. Title is not blank
/// 2. Start and end are both set or both unset, and `end > start`
/// 3. The job does not depend on itself
///
/// Warnings (scheduled jobs only, except the last):
/// - duration under `short_job_minutes` or over `long_job_minutes`
/// - start before `work_day_start_hour`, end after `work_day_end_hour`
/// - no workers assigned
pub fn validate_job(job: &Job, config: &BoardConfig) -> JobReport {
    let mut report = JobReport::default();

    if job.title.trim().is_empty() {
        report.errors.push(ValidationError::new(
            ValidationErrorKind::MissingTitle,
            "title is required",
        ));
    }

    if let Err(e) = validate_schedule(job.start, job.end) {
        report.errors.push(e);
    }

    if !job.id.is_empty() && job.depends_on.as_deref() == Some(job.id.as_str()) {
        report.errors.push(ValidationError::new(
            ValidationErrorKind::SelfDependency,
            format!("job '{}' cannot depend on itself", job.id),
        ));
    }

    if let Some(window) = job.window() {
        let minutes = window.duration().num_minutes();
        if minutes < config.short_job_minutes {
            report.warnings.push(ValidationWarning::new(
                WarningKind::TooShort,
                format!("job is shorter than {} minutes", config.short_job_minutes),
            ));
        }
        if minutes > config.long_job_minutes {
            report.warnings.push(ValidationWarning::new(
                WarningKind::TooLong,
                format!("job is longer than {} minutes", config.long_job_minutes),
            ));
        }

        if window.start.hour() < config.work_day_start_hour {
            report.warnings.push(ValidationWarning::new(
                WarningKind::BeforeWorkDay,
                format!(
                    "starts before working hours ({}:00)",
                    config.work_day_start_hour
                ),
            ));
        }
        let end_hour = window.end.hour();
        if end_hour > config.work_day_end_hour
            || (end_hour == config.work_day_end_hour && window.end.minute() > 0)
        {
            report.warnings.push(ValidationWarning::new(
                WarningKind::AfterWorkDay,
                format!("ends after working hours ({}:00)", config.work_day_end_hour),
            ));
        }
    }

    if job.workers.is_empty() {
        report.warnings.push(ValidationWarning::new(
            WarningKind::NoWorkers,
            "no workers assigned",
        ));
    }

    report
}

/// Validates the integrity of a whole job collection.
///
/// Checks:
/// 1. No duplicate job IDs
/// 2. No job depends on itself
/// 3. No circular dependency chains
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_board(jobs: &[Job]) -> ValidationResult {
    let mut errors = Vec::new();

    let mut ids = HashSet::new();
    for job in jobs {
        if !ids.insert(job.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate job ID: {}", job.id),
            ));
        }
        if job.depends_on.as_deref() == Some(job.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::SelfDependency,
                format!("Job '{}' depends on itself", job.id),
            ));
        }
    }

    if let Some(cycle_err) = detect_cycles(jobs) {
        errors.push(cycle_err);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Detects cycles in the dependency graph using DFS.
///
/// # Algorithm
/// Topological sort via DFS. If a back-edge is found (visiting a node
/// currently in the recursion stack), a cycle exists. Self-loops and
/// dangling references are excluded from the graph.
///
/// # Reference
/// Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4
fn detect_cycles(jobs: &[Job]) -> Option<ValidationError> {
    let ids: HashSet<&str> = jobs.iter().map(|j| j.id.as_str()).collect();

    // Build adjacency list: prerequisite → dependents
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    for job in jobs {
        if let Some(dep) = job.depends_on.as_deref() {
            if dep != job.id && ids.contains(dep) {
                adj.entry(dep).or_default().push(job.id.as_str());
            }
        }
    }

    let mut visited = HashSet::new();
    let mut in_stack = HashSet::new();

    for job in jobs {
        let node = job.id.as_str();
        if !visited.contains(node) && has_cycle_dfs(node, &adj, &mut visited, &mut in_stack) {
            return Some(ValidationError::new(
                ValidationErrorKind::CyclicDependency,
                format!("Circular dependency detected involving job '{node}'"),
            ));
        }
    }

    None
}

fn has_cycle_dfs<'a>(
    node: &'a str,
    adj: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    in_stack: &mut HashSet<&'a str>,
) -> bool {
    visited.insert(node);
    in_stack.insert(node);

    if let Some(neighbors) = adj.get(node) {
        for &next in neighbors {
            if in_stack.contains(next) {
                return true; // Back edge → cycle
            }
            if !visited.contains(next) && has_cycle_dfs(next, adj, visited, in_stack) {
                return true;
            }
        }
    }

    in_stack.remove(node);
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::at;

    fn scheduled(id: &str, start: &str, end: &str) -> Job {
        Job::new(id, format!("job {id}"))
            .with_worker("Dana")
            .with_schedule(at(start), at(end))
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range(Some(at("2024-01-01T09:00")), Some(at("2024-01-01T10:00"))).is_ok());

        let err = validate_range(Some(at("2024-01-01T10:00")), Some(at("2024-01-01T10:00")))
            .unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidRange);

        let err = validate_range(None, Some(at("2024-01-01T10:00"))).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::MissingEndpoint);
    }

    #[test]
    fn test_unscheduled_job_is_valid() {
        let job = Job::draft("Inspect boiler").with_worker("Dana");
        let report = validate_job(&job, &BoardConfig::default());
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_job_errors() {
        let mut job = Job::new("5", "   ").with_dependency("5");
        job.start = Some(at("2024-01-01T10:00"));

        let report = validate_job(&job, &BoardConfig::default());
        assert!(!report.is_valid());
        let kinds: Vec<_> = report.errors.iter().map(|e| e.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                ValidationErrorKind::MissingTitle,
                ValidationErrorKind::MissingEndpoint,
                ValidationErrorKind::SelfDependency,
            ]
        );
        assert!(report.error_message().contains("title is required"));
    }

    #[test]
    fn test_job_warnings() {
        let config = BoardConfig::default();

        let short = scheduled("1", "2024-01-01T09:00", "2024-01-01T09:10");
        let kinds: Vec<_> = validate_job(&short, &config)
            .warnings
            .iter()
            .map(|w| w.kind)
            .collect();
        assert_eq!(kinds, vec![WarningKind::TooShort]);

        let long_night = Job::new("2", "overnight")
            .with_schedule(at("2024-01-01T05:00"), at("2024-01-01T22:30"));
        let kinds: Vec<_> = validate_job(&long_night, &config)
            .warnings
            .iter()
            .map(|w| w.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                WarningKind::TooLong,
                WarningKind::BeforeWorkDay,
                WarningKind::AfterWorkDay,
                WarningKind::NoWorkers,
            ]
        );

        // Ending exactly at 22:00 is inside the working day
        let on_the_hour = scheduled("3", "2024-01-01T20:00", "2024-01-01T22:00");
        assert!(validate_job(&on_the_hour, &config).warnings.is_empty());
    }

    #[test]
    fn test_valid_board() {
        let jobs = vec![
            scheduled("1", "2024-01-01T09:00", "2024-01-01T10:00"),
            scheduled("2", "2024-01-01T10:00", "2024-01-01T11:00").with_dependency("1"),
            scheduled("3", "2024-01-01T11:00", "2024-01-01T12:00").with_dependency("404"),
        ];
        assert!(validate_board(&jobs).is_ok());
    }

    #[test]
    fn test_duplicate_job_id() {
        let jobs = vec![Job::new("1", "a"), Job::new("1", "b")];
        let errors = validate_board(&jobs).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId));
    }

    #[test]
    fn test_self_dependency_reported_once() {
        let jobs = vec![Job::new("1", "a").with_dependency("1")];
        let errors = validate_board(&jobs).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::SelfDependency);
    }

    #[test]
    fn test_cyclic_dependency() {
        // 1 → 2 → 3 → 1
        let jobs = vec![
            Job::new("1", "a").with_dependency("3"),
            Job::new("2", "b").with_dependency("1"),
            Job::new("3", "c").with_dependency("2"),
        ];
        let errors = validate_board(&jobs).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::CyclicDependency));
    }
}
