//! Bulk import from tabular rows.
//!
//! A spreadsheet reader (outside this crate) hands over a [`Sheet`] of
//! string cells. A [`ColumnMapping`] says which column feeds which job
//! field; [`ColumnMapping::detect`] guesses it from header names in
//! English and Hebrew.
//!
//! Imported jobs get fresh IDs `1..n`, trimmed text, workers split on `,`
//! or `;`, parsed dates, and `finished = false`. The result replaces the
//! whole board through [`Board::import`](crate::board::Board::import).

use chrono_tz::Tz;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::debug;

use crate::error::{BoardError, BoardResult};
use crate::models::{Job, Priority};
use crate::persistence::split_workers;
use crate::time::parse_timestamp;

/// A table of string cells with a header row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a data row. Short rows are padded with empty cells on read.
    pub fn with_row<S: Into<String>>(mut self, cells: impl IntoIterator<Item = S>) -> Self {
        self.rows.push(cells.into_iter().map(Into::into).collect());
        self
    }

    /// Index of the column with exactly this header.
    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }
}

/// Job field an import column can feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Title,
    Factory,
    Worker,
    FactoryManager,
    MaintenanceManager,
    Priority,
    EquipmentNumber,
    ServiceCall,
    Department,
    Start,
    End,
    DependsOn,
    Notes,
}

impl Field {
    /// Detection order.
    pub const ALL: [Field; 13] = [
        Field::Title,
        Field::Factory,
        Field::Worker,
        Field::FactoryManager,
        Field::MaintenanceManager,
        Field::Priority,
        Field::EquipmentNumber,
        Field::ServiceCall,
        Field::Department,
        Field::Start,
        Field::End,
        Field::DependsOn,
        Field::Notes,
    ];

    /// Column header the board itself uses for this field.
    pub fn hebrew_header(self) -> &'static str {
        match self {
            Field::Title => "משימה",
            Field::Factory => "מפעל",
            Field::Worker => "עובד מבצע",
            Field::FactoryManager => "מפקח עבודה",
            Field::MaintenanceManager => "מנהל עבודה",
            Field::Priority => "עדיפות",
            Field::EquipmentNumber => "מספר ציוד",
            Field::ServiceCall => "קריאת שירות",
            Field::Department => "מחלקה מבצעת",
            Field::Start => "התחלה",
            Field::End => "סיום",
            Field::DependsOn => "תלוי ב",
            Field::Notes => "הערות",
        }
    }

    /// Case-insensitive header pattern used by [`ColumnMapping::detect`].
    fn pattern(self) -> &'static str {
        match self {
            Field::Title => r"(?i)title|job|task|משימה|name|שם",
            Field::Factory => r"(?i)factory|מפעל|plant|facility",
            Field::Worker => r"(?i)worker|עובד|employee|staff|מבצע|executor",
            Field::FactoryManager => r"(?i)factory.*manager|מפקח|supervisor|supervise|מנהל.*מפעל",
            Field::MaintenanceManager => r"(?i)maintenance.*manager|מנהל.*עבודה|maintenance|אחזקה",
            Field::Priority => r"(?i)priority|עדיפות|urgent|importance",
            Field::EquipmentNumber => r"(?i)equipment|ציוד|number|מספר|machine|device|מכונה",
            Field::ServiceCall => r"(?i)service.*call|קריאת.*שירות|service|ticket|call|שירות",
            Field::Department => r"(?i)department|מחלקה|dept|unit|יחידה",
            Field::Start => r"(?i)start|begin|התחלה|from",
            Field::End => r"(?i)end|finish|סיום|to|due",
            Field::DependsOn => r"(?i)depend|תלוי|prerequisite|קודם",
            Field::Notes => {
                r"(?i)note|remark|הערה|comment|הערות|תיאור|description|desc|details|פרטים"
            }
        }
    }

    /// Canonical English key, as in stored JSON.
    fn key(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Factory => "factory",
            Field::Worker => "workers",
            Field::FactoryManager => "factoryManager",
            Field::MaintenanceManager => "maintenanceManager",
            Field::Priority => "priority",
            Field::EquipmentNumber => "equipmentNumber",
            Field::ServiceCall => "serviceCall",
            Field::Department => "department",
            Field::Start => "start",
            Field::End => "end",
            Field::DependsOn => "dependsOn",
            Field::Notes => "notes",
        }
    }
}

/// Which column feeds which field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    columns: BTreeMap<Field, usize>,
}

impl ColumnMapping {
    /// An empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps a field to a column index.
    pub fn with_column(mut self, field: Field, column: usize) -> Self {
        self.columns.insert(field, column);
        self
    }

    /// Column for a field, if mapped.
    pub fn column(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Guesses the mapping from header names.
    ///
    /// Two passes. First, headers naming a field exactly (its English key or
    /// the board's own Hebrew header, ignoring case and spacing) claim it.
    /// Then each remaining field, in [`Field::ALL`] order, takes the first
    /// unclaimed header matching its pattern. An unmapped title falls back
    /// to the first column.
    pub fn detect(headers: &[String]) -> BoardResult<Self> {
        let squash = |s: &str| -> String {
            s.chars()
                .filter(|c| !c.is_whitespace() && *c != '_')
                .flat_map(char::to_lowercase)
                .collect()
        };

        let mut mapping = Self::new();
        let mut claimed = vec![false; headers.len()];

        for field in Field::ALL {
            let names = [squash(field.key()), squash(field.hebrew_header())];
            let hit = headers
                .iter()
                .enumerate()
                .position(|(i, h)| !claimed[i] && names.contains(&squash(h)));
            if let Some(i) = hit {
                claimed[i] = true;
                mapping.columns.insert(field, i);
            }
        }

        for (field, re) in Field::ALL.into_iter().zip(header_patterns()?) {
            if mapping.columns.contains_key(&field) {
                continue;
            }
            let hit = headers
                .iter()
                .enumerate()
                .position(|(i, h)| !claimed[i] && re.is_match(h));
            if let Some(i) = hit {
                claimed[i] = true;
                mapping.columns.insert(field, i);
            }
        }

        if !mapping.columns.contains_key(&Field::Title) && !headers.is_empty() {
            mapping.columns.insert(Field::Title, 0);
        }

        debug!("detected {} of {} import columns", mapping.len(), Field::ALL.len());
        Ok(mapping)
    }
}

/// Header patterns in [`Field::ALL`] order, compiled once per process.
fn header_patterns() -> BoardResult<&'static [Regex]> {
    static PATTERNS: OnceLock<Result<Vec<Regex>, regex::Error>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| Field::ALL.iter().map(|f| Regex::new(f.pattern())).collect())
        .as_deref()
        .map_err(|e| BoardError::Config(e.to_string()))
}

/// Jobs produced by an import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportOutcome {
    pub jobs: Vec<Job>,
    /// Rows skipped because every mapped cell was blank.
    pub skipped: usize,
}

/// Converts sheet rows into jobs.
///
/// Text cells are trimmed; unparseable dates or priorities become unset.
/// Rows whose mapped cells are all blank are skipped. IDs restart at 1.
pub fn import_sheet(sheet: &Sheet, mapping: &ColumnMapping, tz: Tz) -> ImportOutcome {
    let mut outcome = ImportOutcome::default();

    for row in &sheet.rows {
        let cell = |field: Field| {
            mapping
                .column(field)
                .and_then(|i| row.get(i))
                .map(|c| c.trim())
                .unwrap_or("")
        };

        if Field::ALL.iter().all(|f| cell(*f).is_empty()) {
            outcome.skipped += 1;
            continue;
        }

        let id = outcome.jobs.len() + 1;
        let depends_on = Some(cell(Field::DependsOn))
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        let mut job = Job {
            id: id.to_string(),
            title: cell(Field::Title).to_string(),
            factory: cell(Field::Factory).to_string(),
            department: cell(Field::Department).to_string(),
            priority: Priority::parse(cell(Field::Priority)),
            equipment_number: cell(Field::EquipmentNumber).to_string(),
            service_call: cell(Field::ServiceCall).to_string(),
            workers: split_workers(cell(Field::Worker)),
            factory_manager: cell(Field::FactoryManager).to_string(),
            maintenance_manager: cell(Field::MaintenanceManager).to_string(),
            start: parse_timestamp(cell(Field::Start), tz),
            end: parse_timestamp(cell(Field::End), tz),
            depends_on,
            notes: cell(Field::Notes).to_string(),
            finished: false,
        };
        job.normalize();
        outcome.jobs.push(job);
    }

    debug!(
        "imported {} rows, skipped {}",
        outcome.jobs.len(),
        outcome.skipped
    );
    outcome
}
