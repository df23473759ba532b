//! Board state: the job collection plus its registries.
//!
//! This is the unit of persistence and of undo snapshots.

use serde::{Deserialize, Serialize};

use super::{Job, Registries};

/// Complete board contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardState {
    /// All jobs, in insertion order.
    #[serde(default)]
    pub jobs: Vec<Job>,
    /// Known labels.
    #[serde(flatten)]
    pub registries: Registries,
}

impl BoardState {
    /// Creates a state from jobs and registries.
    pub fn new(jobs: Vec<Job>, registries: Registries) -> Self {
        Self { jobs, registries }
    }

    /// Creates a state whose registries are rebuilt from the jobs.
    pub fn from_jobs(jobs: Vec<Job>) -> Self {
        let registries = Registries::from_jobs(&jobs);
        Self { jobs, registries }
    }

    /// Next free numeric ID: one past the largest numeric job ID.
    ///
    /// Non-numeric IDs are ignored.
    pub fn next_id(&self) -> u64 {
        next_numeric_id(&self.jobs)
    }

    /// Finds a job by ID.
    pub fn job(&self, id: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }
}

/// One past the largest numeric ID in `jobs` (1 if there is none).
pub(crate) fn next_numeric_id(jobs: &[Job]) -> u64 {
    jobs.iter()
        .filter_map(|j| j.id.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_id() {
        let state = BoardState::from_jobs(vec![
            Job::new("3", "a"),
            Job::new("x", "b"),
            Job::new("11", "c"),
        ]);
        assert_eq!(state.next_id(), 12);
        assert_eq!(BoardState::default().next_id(), 1);
    }

    #[test]
    fn test_flat_serialization() {
        let state = BoardState::from_jobs(vec![Job::new("1", "a").with_factory("North")]);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["jobs"][0]["id"], "1");
        assert_eq!(json["factories"][0], "North");

        let back: BoardState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
