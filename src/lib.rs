//! Scheduling engine for a factory job board.
//!
//! Maintenance and service jobs are planned on a shared board: each job has
//! a time range, workers, a factory and at most one prerequisite job. This
//! crate holds the engine behind the board's table, Timeline and Gantt
//! views. Rendering, input handling and spreadsheet I/O are left to the host.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Job`, `Priority`, `Registries`, `TimeWindow`, `BoardState`
//! - **`time`**: Interval, Shabbat and rounding utilities
//! - **`issues`**: Worker double-booking and dependency-order detection
//! - **`validation`**: Job checks (errors and warnings) and board integrity
//! - **`layout`**: Compressed day axis shared by Timeline and Gantt
//! - **`filter`**: Filter criteria and table sorting
//! - **`view`**: Read pipeline producing render-ready rows and bars
//! - **`board`**: The store; every mutating command
//! - **`undo`**: Bounded snapshot history
//! - **`session`**: Drag-move and resize gestures
//! - **`persistence`**, **`import`**, **`export`**: Storage and tabular I/O
//! - **`config`**, **`error`**: Configuration and error types
//!
//! # Data Flow
//!
//! Reads: jobs → issues over all jobs → filter → day axis → rows.
//! Writes: command → undo snapshot → mutate → version bump, which
//! invalidates every derived cache.
//!
//! # Example
//!
//! ```
//! use factory_board::{Board, Job, Surface, ViewRequest, DayAxisCache};
//! use chrono::NaiveDate;
//!
//! let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let mut board = Board::default();
//! board
//!     .create_job(
//!         Job::draft("Replace pump seal")
//!             .with_worker("Dana")
//!             .with_schedule(
//!                 day.and_hms_opt(9, 0, 0).unwrap(),
//!                 day.and_hms_opt(11, 0, 0).unwrap(),
//!             ),
//!     )
//!     .unwrap();
//!
//! let view = board.view(&ViewRequest::new(Surface::Timeline), &mut DayAxisCache::new());
//! assert_eq!(view.rows[0].label, "Dana");
//! ```

pub mod board;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod import;
pub mod issues;
pub mod layout;
pub mod models;
pub mod persistence;
pub mod session;
pub mod time;
pub mod undo;
pub mod validation;
pub mod view;

pub use board::{Board, LaneChange};
pub use config::{BoardConfig, Surface, SurfaceConfig};
pub use error::{BoardError, BoardResult};
pub use filter::{FilterCriteria, SortKey, StatusFilter};
pub use issues::{BarStatus, Issues};
pub use layout::{DateRange, DayAxis, DayAxisCache, Orientation};
pub use models::{BoardState, Edge, Job, Priority, Registries, RegistryKind, TimeWindow};
pub use persistence::{JsonFilePersistence, MemoryPersistence, Persistence};
pub use session::{DragSession, ResizeSession};
pub use undo::UndoAction;
pub use view::{BoardView, ViewRequest};
