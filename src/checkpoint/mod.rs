//! Top-k checkpoint retention and early-stopping signal: the manager ranks
//! each epoch by a monitored metric, keeps the best k payloads on disk, and
//! counts non-improving epochs against a patience budget.

mod manager;
mod store;

pub use manager::{CheckpointConfig, CheckpointManager, Mode, Observation, StepOutcome};
pub use store::{CheckpointStore, DirectoryStore};
