use std::collections::BTreeMap;
use std::path::Path;

use crate::checkpoint::Mode;
use crate::error::TrainingError;

/// One epoch's learning rate and validation metrics.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EpochRecord {
    pub epoch: usize,
    pub lr: f64,
    pub metrics: BTreeMap<String, f64>,
}

/// Full per-epoch history of a run, exportable as JSON.
#[derive(Debug, Default, serde::Serialize)]
pub struct MetricsHistory {
    records: Vec<EpochRecord>,
}

impl MetricsHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, epoch: usize, lr: f64, metrics: BTreeMap<String, f64>) {
        self.records.push(EpochRecord { epoch, lr, metrics });
    }

    pub fn records(&self) -> &[EpochRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Best `(epoch, value)` for a metric under the given direction. Ties go
    /// to the earlier epoch. Epochs missing the metric are skipped.
    pub fn best(&self, monitor: &str, mode: Mode) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for record in &self.records {
            let Some(&value) = record.metrics.get(monitor) else {
                continue;
            };
            let better = match (best, mode) {
                (None, _) => true,
                (Some((_, b)), Mode::Max) => value > b,
                (Some((_, b)), Mode::Min) => value < b,
            };
            if better {
                best = Some((record.epoch, value));
            }
        }
        best
    }

    /// Write the history as pretty-printed JSON.
    pub fn save_json(&self, path: &Path) -> Result<(), TrainingError> {
        let json = serde_json::to_string_pretty(&self.records)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
