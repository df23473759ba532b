//! Board domain models.
//!
//! Provides the core data types for the job board: the jobs themselves,
//! the label registries that classify them, the half-open time windows
//! they occupy, and the combined state that is persisted and snapshotted.
//!
//! # Domain Mappings
//!
//! | factory-board | Shop floor |
//! |---------------|-----------|
//! | Job | Maintenance / service task |
//! | Registries | Factories, workers, supervisors, departments |
//! | TimeWindow | Scheduled span of a task |
//! | BoardState | The whole planning board |

mod job;
mod registry;
mod state;
mod window;

pub use job::{Job, Priority};
pub use registry::{Registries, RegistryKind};
pub use state::BoardState;
pub(crate) use state::next_numeric_id;
pub use window::{Edge, TimeWindow};
