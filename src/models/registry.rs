//! Label registries.
//!
//! The board keeps five sets of known labels (factories, workers, factory
//! managers, maintenance managers, departments). They populate pickers and
//! are the unit of team-management rename/delete, which propagate into jobs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::Job;

/// Which registry a label belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegistryKind {
    Factory,
    Worker,
    FactoryManager,
    MaintenanceManager,
    Department,
}

impl RegistryKind {
    /// All registry kinds.
    pub const ALL: [RegistryKind; 5] = [
        RegistryKind::Factory,
        RegistryKind::Worker,
        RegistryKind::FactoryManager,
        RegistryKind::MaintenanceManager,
        RegistryKind::Department,
    ];

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            Self::Factory => "factory",
            Self::Worker => "worker",
            Self::FactoryManager => "factory manager",
            Self::MaintenanceManager => "maintenance manager",
            Self::Department => "department",
        }
    }
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The five label registries.
///
/// Serialized flat (`factories`, `workers`, ...) next to the job list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registries {
    #[serde(default)]
    pub factories: BTreeSet<String>,
    #[serde(default)]
    pub workers: BTreeSet<String>,
    #[serde(default)]
    pub factory_managers: BTreeSet<String>,
    #[serde(default)]
    pub maintenance_managers: BTreeSet<String>,
    #[serde(default)]
    pub departments: BTreeSet<String>,
}

impl Registries {
    /// Creates empty registries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds registries from every label referenced by `jobs`.
    pub fn from_jobs<'a>(jobs: impl IntoIterator<Item = &'a Job>) -> Self {
        let mut registries = Self::new();
        for job in jobs {
            registries.absorb(job);
        }
        registries
    }

    /// Adds every non-blank label referenced by `job`.
    pub fn absorb(&mut self, job: &Job) {
        for kind in RegistryKind::ALL {
            match job.label(kind) {
                Some(label) => {
                    self.insert(kind, label);
                }
                None => {
                    for w in &job.workers {
                        self.insert(kind, w);
                    }
                }
            }
        }
    }

    /// The label set for a registry kind.
    pub fn get(&self, kind: RegistryKind) -> &BTreeSet<String> {
        match kind {
            RegistryKind::Factory => &self.factories,
            RegistryKind::Worker => &self.workers,
            RegistryKind::FactoryManager => &self.factory_managers,
            RegistryKind::MaintenanceManager => &self.maintenance_managers,
            RegistryKind::Department => &self.departments,
        }
    }

    pub(crate) fn get_mut(&mut self, kind: RegistryKind) -> &mut BTreeSet<String> {
        match kind {
            RegistryKind::Factory => &mut self.factories,
            RegistryKind::Worker => &mut self.workers,
            RegistryKind::FactoryManager => &mut self.factory_managers,
            RegistryKind::MaintenanceManager => &mut self.maintenance_managers,
            RegistryKind::Department => &mut self.departments,
        }
    }

    /// Whether a label is registered.
    pub fn contains(&self, kind: RegistryKind, label: &str) -> bool {
        self.get(kind).contains(label)
    }

    /// Inserts a trimmed label. Blank labels are ignored.
    ///
    /// Returns `true` if the label was newly added.
    pub fn insert(&mut self, kind: RegistryKind, label: &str) -> bool {
        let label = label.trim();
        if label.is_empty() {
            return false;
        }
        self.get_mut(kind).insert(label.to_string())
    }

    /// Removes a label. Returns `true` if it was present.
    pub fn remove(&mut self, kind: RegistryKind, label: &str) -> bool {
        self.get_mut(kind).remove(label)
    }

    /// Number of jobs referencing a label.
    pub fn count_jobs(jobs: &[Job], kind: RegistryKind, label: &str) -> usize {
        jobs.iter().filter(|j| j.references(kind, label)).count()
    }

    /// Total number of labels across all registries.
    pub fn len(&self) -> usize {
        RegistryKind::ALL.iter().map(|k| self.get(*k).len()).sum()
    }

    /// Whether all registries are empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
