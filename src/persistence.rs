//! Persistence collaborators.
//!
//! The board does not know its storage medium. A [`Persistence`]
//! implementation stores and returns a [`BoardState`]; absent or corrupt
//! storage loads as `None`, never as an error.
//!
//! # Stored Shapes
//! - Current: `{"jobs": [...], "factories": [...], "workers": [...], ...}`
//! - Legacy: a bare array of jobs; registries are rebuilt from the jobs
//!
//! Within a job, a legacy single `worker` string becomes a one-element
//! `workers` list, a `workers` string is split on `,`/`;`, numeric IDs are
//! stringified, empty dates and dependencies mean "unset", and timestamps
//! with a UTC offset are converted into the board time zone.

use chrono_tz::Tz;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::BoardResult;
use crate::models::{BoardState, Job, Priority, Registries};
use crate::time::parse_timestamp;

/// Storage for a board's jobs and registries.
pub trait Persistence {
    /// Stores the state, replacing anything stored before.
    fn save(&mut self, state: &BoardState) -> BoardResult<()>;

    /// Returns the stored state, or `None` if absent or unreadable.
    ///
    /// Timestamps carrying a UTC offset are converted into `tz`.
    fn load(&self, tz: Tz) -> Option<BoardState>;
}

/// Accepts a string, number or bool; anything else is empty.
fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(matches!(Value::deserialize(d)?, Value::Bool(true)))
}

/// `workers` as stored: a list, or a delimited string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredWorkers {
    List(Vec<Value>),
    Text(String),
}

/// A job as found in storage, before normalization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawJob {
    #[serde(default, deserialize_with = "lenient_string")]
    id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    factory: String,
    #[serde(default, deserialize_with = "lenient_string")]
    department: String,
    #[serde(default, deserialize_with = "lenient_string")]
    priority: String,
    #[serde(default, deserialize_with = "lenient_string")]
    equipment_number: String,
    #[serde(default, deserialize_with = "lenient_string")]
    service_call: String,
    #[serde(default)]
    workers: Option<StoredWorkers>,
    #[serde(default, deserialize_with = "lenient_string")]
    worker: String,
    #[serde(default, deserialize_with = "lenient_string")]
    factory_manager: String,
    #[serde(default, deserialize_with = "lenient_string")]
    maintenance_manager: String,
    #[serde(default, deserialize_with = "lenient_string")]
    start: String,
    #[serde(default, deserialize_with = "lenient_string")]
    end: String,
    #[serde(default, deserialize_with = "lenient_string")]
    depends_on: String,
    #[serde(default, deserialize_with = "lenient_string")]
    notes: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    finished: bool,
}

/// Splits a delimited worker list on `,` or `;`, dropping blanks.
pub(crate) fn split_workers(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

impl RawJob {
    fn into_job(self, tz: Tz) -> Job {
        let workers = match self.workers {
            Some(StoredWorkers::List(items)) => items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            Some(StoredWorkers::Text(text)) => split_workers(&text),
            None if !self.worker.trim().is_empty() => vec![self.worker],
            None => Vec::new(),
        };
        let depends_on = Some(self.depends_on).filter(|d| !d.trim().is_empty());

        let mut job = Job {
            id: self.id,
            title: self.title,
            factory: self.factory,
            department: self.department,
            priority: Priority::parse(&self.priority),
            equipment_number: self.equipment_number,
            service_call: self.service_call,
            workers,
            factory_manager: self.factory_manager,
            maintenance_manager: self.maintenance_manager,
            start: parse_timestamp(&self.start, tz),
            end: parse_timestamp(&self.end, tz),
            depends_on,
            notes: self.notes,
            finished: self.finished,
        };
        job.normalize();
        job
    }
}

/// Current stored layout.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredBoard {
    #[serde(default)]
    jobs: Vec<RawJob>,
    factories: Option<BTreeSet<String>>,
    workers: Option<BTreeSet<String>>,
    factory_managers: Option<BTreeSet<String>>,
    maintenance_managers: Option<BTreeSet<String>>,
    departments: Option<BTreeSet<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredState {
    Current(StoredBoard),
    Legacy(Vec<RawJob>),
}

/// Decodes stored JSON into a state.
///
/// Returns `None` (and logs a warning) if the JSON is unreadable.
pub fn decode_state(raw: &str, tz: Tz) -> Option<BoardState> {
    let stored: StoredState = match serde_json::from_str(raw) {
        Ok(s) => s,
        Err(e) => {
            warn!("ignoring corrupt board data: {}", e);
            return None;
        }
    };

    let state = match stored {
        StoredState::Legacy(jobs) => {
            debug!("decoding legacy job array ({} jobs)", jobs.len());
            BoardState::from_jobs(jobs.into_iter().map(|j| j.into_job(tz)).collect())
        }
        StoredState::Current(board) => {
            let jobs: Vec<Job> = board.jobs.into_iter().map(|j| j.into_job(tz)).collect();
            let all_absent = board.factories.is_none()
                && board.workers.is_none()
                && board.factory_managers.is_none()
                && board.maintenance_managers.is_none()
                && board.departments.is_none();
            if all_absent {
                BoardState::from_jobs(jobs)
            } else {
                let registries = Registries {
                    factories: board.factories.unwrap_or_default(),
                    workers: board.workers.unwrap_or_default(),
                    factory_managers: board.factory_managers.unwrap_or_default(),
                    maintenance_managers: board.maintenance_managers.unwrap_or_default(),
                    departments: board.departments.unwrap_or_default(),
                };
                BoardState::new(jobs, registries)
            }
        }
    };
    Some(state)
}

/// Encodes a state in the current stored layout.
pub fn encode_state(state: &BoardState) -> BoardResult<String> {
    Ok(serde_json::to_string(state)?)
}

/// Keeps the encoded state in memory.
#[derive(Debug, Clone)]
pub struct MemoryPersistence {
    slot: Option<String>,
}

impl Default for MemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self { slot: None }
    }

    /// Starts with previously stored raw JSON.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Some(raw.into()),
        }
    }

    /// The stored JSON, if any.
    pub fn raw(&self) -> Option<&str> {
        self.slot.as_deref()
    }
}

impl Persistence for MemoryPersistence {
    fn save(&mut self, state: &BoardState) -> BoardResult<()> {
        self.slot = Some(encode_state(state)?);
        Ok(())
    }

    fn load(&self, tz: Tz) -> Option<BoardState> {
        decode_state(self.slot.as_deref()?, tz)
    }
}

/// Stores the encoded state in a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persistence for JsonFilePersistence {
    fn save(&mut self, state: &BoardState) -> BoardResult<()> {
        let encoded = encode_state(state)?;
        fs::write(&self.path, encoded)?;
        debug!("wrote {}", self.path.display());
        Ok(())
    }

    fn load(&self, tz: Tz) -> Option<BoardState> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => decode_state(&raw, tz),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("cannot read {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::config::BoardConfig;
    use crate::models::RegistryKind;
    use crate::time::{at, DEFAULT_TIME_ZONE};

    fn sample_state() -> BoardState {
        BoardState::from_jobs(vec![
            Job::new("1", "Pump")
                .with_factory("North")
                .with_worker("Dana")
                .with_priority(Priority::High)
                .with_schedule(at("2024-01-01T09:00"), at("2024-01-01T11:00")),
            Job::new("2", "Valve").with_dependency("1").with_finished(true),
        ])
    }

    #[test]
    fn test_memory_round_trip() {
        let mut store = MemoryPersistence::new();
        assert!(store.load(DEFAULT_TIME_ZONE).is_none());

        let state = sample_state();
        store.save(&state).unwrap();
        assert_eq!(store.load(DEFAULT_TIME_ZONE), Some(state));
    }

    #[test]
    fn test_corrupt_is_none() {
        assert!(MemoryPersistence::with_raw("{not json").load(DEFAULT_TIME_ZONE).is_none());
        assert!(MemoryPersistence::with_raw("42").load(DEFAULT_TIME_ZONE).is_none());
    }

    #[test]
    fn test_legacy_array_shape() {
        let raw = r#"[
            {"id": 3, "title": "Old", "worker": "Dana", "factory": "North",
             "start": "2024-01-01T08:00:00+02:00", "end": "2024-01-01T10:00:00+02:00",
             "priority": "דחופה", "dependsOn": ""},
            {"id": "4", "title": "Older", "workers": "Avi; Moshe", "start": "", "end": null}
        ]"#;
        let state = MemoryPersistence::with_raw(raw).load(DEFAULT_TIME_ZONE).unwrap();

        let old = &state.jobs[0];
        assert_eq!(old.id, "3");
        assert_eq!(old.workers, vec!["Dana"]);
        assert_eq!(old.start, Some(at("2024-01-01T08:00")));
        assert_eq!(old.priority, Some(Priority::Urgent));
        assert!(old.depends_on.is_none());

        let older = &state.jobs[1];
        assert_eq!(older.workers, vec!["Avi", "Moshe"]);
        assert!(older.start.is_none());
        assert!(!older.finished);

        // Registries rebuilt from jobs
        assert!(state.registries.contains(RegistryKind::Factory, "North"));
        assert_eq!(state.registries.workers.len(), 3);
    }

    #[test]
    fn test_object_shape_keeps_registries() {
        let raw = r#"{
            "jobs": [{"id": "1", "title": "a", "workers": ["Dana"], "finished": true}],
            "factories": ["North", "South"],
            "workers": ["Dana", "Avi"]
        }"#;
        let state = MemoryPersistence::with_raw(raw).load(DEFAULT_TIME_ZONE).unwrap();
        assert!(state.jobs[0].finished);
        assert_eq!(state.registries.factories.len(), 2);
        assert!(state.registries.contains(RegistryKind::Worker, "Avi"));
        assert!(state.registries.departments.is_empty());
    }

    #[test]
    fn test_object_shape_without_registries_rebuilds() {
        let raw = r#"{"jobs": [{"id": "1", "title": "a", "department": "Electrical"}]}"#;
        let state = MemoryPersistence::with_raw(raw).load(DEFAULT_TIME_ZONE).unwrap();
        assert!(state.registries.contains(RegistryKind::Department, "Electrical"));
    }

    #[test]
    fn test_file_round_trip_through_board() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFilePersistence::new(dir.path().join("board.json"));
        assert!(Board::load_from(&store, BoardConfig::default()).is_none());

        let mut board = Board::from_state(sample_state(), BoardConfig::default());
        board.add_label(RegistryKind::Department, "Welding").unwrap();
        board.save_to(&mut store).unwrap();

        let loaded = Board::load_from(&store, BoardConfig::default()).unwrap();
        assert_eq!(loaded.state(), board.state());
        assert!(!loaded.can_undo());
    }

    #[test]
    fn test_load_converts_offsets_into_board_zone() {
        let raw = r#"[{"id": "1", "title": "Pump", "workers": ["Dana"],
            "start": "2024-01-15T08:00:00Z", "end": "2024-01-15T10:00:00+00:00"}]"#;
        let store = MemoryPersistence::with_raw(raw);

        let london = BoardConfig::default().with_time_zone(chrono_tz::Europe::London);
        let board = Board::load_from(&store, london).unwrap();
        let job = board.job("1").unwrap();
        assert_eq!(job.start, Some(at("2024-01-15T08:00")));
        assert_eq!(job.end, Some(at("2024-01-15T10:00")));

        // The default zone is two hours ahead in winter
        let board = Board::load_from(&store, BoardConfig::default()).unwrap();
        assert_eq!(board.job("1").unwrap().start, Some(at("2024-01-15T10:00")));
    }

    #[test]
    fn test_split_workers() {
        assert_eq!(split_workers("Dana, Avi;;Moshe ,"), vec!["Dana", "Avi", "Moshe"]);
        assert!(split_workers("  ").is_empty());
    }
}
