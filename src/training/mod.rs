//! Training infrastructure: the epoch driver, the model trait it drives, and
//! per-epoch metrics history.

pub mod metrics;
mod model;
pub mod trainer;

pub use metrics::{EpochRecord, MetricsHistory};
pub use model::Trainable;
pub use trainer::{FitSummary, Trainer, TrainerConfig};
