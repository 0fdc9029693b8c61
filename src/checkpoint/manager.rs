use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use crate::checkpoint::store::{CheckpointStore, DirectoryStore};
use crate::error::{CheckpointError, ConfigError};

/// Filename suffix for persisted model payloads.
const CHECKPOINT_SUFFIX: &str = ".mpk";

/// Direction in which the monitored metric improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Max,
    Min,
}

impl Mode {
    /// Whether `val` is strictly better than `worst` under this direction.
    /// Equal values are never an improvement.
    fn improves(self, val: f64, worst: f64) -> bool {
        match self {
            Mode::Max => val > worst,
            Mode::Min => val < worst,
        }
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max" => Ok(Mode::Max),
            "min" => Ok(Mode::Min),
            other => Err(ConfigError::Validation(format!(
                "mode must be 'max' or 'min', got '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Max => write!(f, "max"),
            Mode::Min => write!(f, "min"),
        }
    }
}

/// Configuration for the checkpoint manager.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CheckpointConfig {
    /// Metric key that drives ranking.
    pub monitor: String,
    pub mode: Mode,
    /// How many top checkpoints to keep on disk.
    pub save_top_k: usize,
    /// How many non-improving epochs to tolerate before signalling a stop.
    pub patience: usize,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        CheckpointConfig {
            monitor: "acc".to_string(),
            mode: Mode::Max,
            save_top_k: 5,
            patience: 10,
        }
    }
}

impl CheckpointConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monitor.is_empty() {
            return Err(ConfigError::Validation(
                "checkpoint.monitor must not be empty".into(),
            ));
        }
        if self.save_top_k == 0 {
            return Err(ConfigError::Validation(
                "checkpoint.save_top_k must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

/// One retained entry: the monitored value and the epoch it came from.
/// The epoch is the entry's identity; epochs are unique per manager by the
/// driver contract.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub value: f64,
    pub epoch: usize,
}

/// What `step` did with the round it was given.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// Whether this round entered the retained set (fill or eviction).
    pub improved: bool,
    /// Name the payload was stored under, if the round improved and the
    /// write succeeded.
    pub saved: Option<String>,
    /// Epoch displaced from the retained set this round.
    pub evicted: Option<usize>,
}

enum LedgerUpdate {
    Filled,
    Evicted(usize),
    Rejected,
}

/// Tracks the top-k checkpoints seen so far and signals when the monitored
/// metric has stopped improving.
///
/// Purely reactive: state changes only inside [`step`](Self::step), which the
/// driver calls once per epoch with strictly increasing epoch numbers. The
/// retained set lives in `history`, kept fully sorted best-first; storage
/// writes and eviction deletes happen synchronously within the same call.
pub struct CheckpointManager {
    config: CheckpointConfig,
    store: Box<dyn CheckpointStore>,
    history: Vec<Observation>,
    patience_count: usize,
    // Epoch of the most recent eviction. Single slot, overwritten on each
    // eviction and never cleared; the matching delete runs in the same step,
    // so only the latest victim ever matters.
    to_remove: Option<usize>,
}

impl std::fmt::Debug for CheckpointManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckpointManager")
            .field("config", &self.config)
            .field("history", &self.history)
            .field("patience_count", &self.patience_count)
            .field("to_remove", &self.to_remove)
            .finish_non_exhaustive()
    }
}

impl CheckpointManager {
    /// Create a manager storing checkpoints under `output_dir/checkpoints`.
    /// That directory must not already exist; creating it is part of
    /// construction.
    pub fn new(output_dir: &Path, config: CheckpointConfig) -> Result<Self, CheckpointError> {
        let store = DirectoryStore::create(output_dir.join("checkpoints"))?;
        Self::with_store(config, Box::new(store))
    }

    /// Create a manager over an arbitrary store.
    pub fn with_store(
        config: CheckpointConfig,
        store: Box<dyn CheckpointStore>,
    ) -> Result<Self, CheckpointError> {
        config.validate()?;
        Ok(CheckpointManager {
            config,
            store,
            history: Vec::new(),
            patience_count: 0,
            to_remove: None,
        })
    }

    /// Feed one epoch's validation metrics and model payload.
    ///
    /// Ranks the round by the monitored metric, updates the retained set, and
    /// on improving rounds persists `payload` (deleting the evicted epoch's
    /// files first when the set was full). Storage failures are reported but
    /// do not abort the round; the ledger update stands regardless.
    pub fn step(
        &mut self,
        epoch: usize,
        metrics: &BTreeMap<String, f64>,
        payload: &[u8],
    ) -> Result<StepOutcome, CheckpointError> {
        let val = *metrics
            .get(&self.config.monitor)
            .ok_or_else(|| CheckpointError::MissingMetric {
                monitor: self.config.monitor.clone(),
            })?;

        let update = self.update_ledger(val, epoch);

        let mut outcome = StepOutcome {
            improved: !matches!(update, LedgerUpdate::Rejected),
            saved: None,
            evicted: match update {
                LedgerUpdate::Evicted(e) => Some(e),
                _ => None,
            },
        };

        if outcome.improved {
            if self.history.len() == self.config.save_top_k {
                if let Some(victim) = self.to_remove {
                    self.remove_epoch_files(victim);
                }
            }
            let name = checkpoint_name(epoch, metrics);
            match self.store.write(&name, payload) {
                Ok(()) => outcome.saved = Some(name),
                Err(e) => eprintln!("Warning: failed to write checkpoint {name}: {e}"),
            }
        }

        Ok(outcome)
    }

    /// Best monitored value in the retained set, or `None` while empty.
    pub fn best_value(&self) -> Option<f64> {
        self.history.first().map(|o| o.value)
    }

    /// Whether the non-improving streak has reached the configured patience.
    pub fn patience_exhausted(&self) -> bool {
        self.patience_count >= self.config.patience
    }

    /// Consecutive non-improving epochs so far.
    pub fn patience_count(&self) -> usize {
        self.patience_count
    }

    /// Retained observations, best first.
    pub fn retained(&self) -> &[Observation] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn monitor(&self) -> &str {
        &self.config.monitor
    }

    fn update_ledger(&mut self, val: f64, epoch: usize) -> LedgerUpdate {
        if self.history.len() < self.config.save_top_k {
            self.push_sorted(val, epoch);
            return LedgerUpdate::Filled;
        }

        // Full: the worst retained score is the last element post-sort.
        let worst = self.history[self.history.len() - 1];
        if !self.config.mode.improves(val, worst.value) {
            self.patience_count += 1;
            return LedgerUpdate::Rejected;
        }

        self.to_remove = Some(worst.epoch);
        self.history.pop();
        self.push_sorted(val, epoch);
        LedgerUpdate::Evicted(worst.epoch)
    }

    fn push_sorted(&mut self, value: f64, epoch: usize) {
        self.history.push(Observation { value, epoch });
        let mode = self.config.mode;
        // Best first; ties rank the earlier epoch first.
        self.history.sort_by(|a, b| {
            let by_value = match mode {
                Mode::Max => b.value.partial_cmp(&a.value),
                Mode::Min => a.value.partial_cmp(&b.value),
            };
            by_value
                .unwrap_or(Ordering::Equal)
                .then(a.epoch.cmp(&b.epoch))
        });
        self.patience_count = 0;
    }

    /// Delete every stored entry belonging to `victim`. Matching is by the
    /// `epoch=<N>-` prefix because the full name also encodes that epoch's
    /// own metrics. Failures are warnings; the ledger has already moved on.
    fn remove_epoch_files(&self, victim: usize) {
        let prefix = format!("epoch={victim}-");
        match self.store.entries() {
            Ok(names) => {
                for name in names.iter().filter(|n| n.starts_with(&prefix)) {
                    if let Err(e) = self.store.delete(name) {
                        eprintln!("Warning: failed to delete checkpoint {name}: {e}");
                    }
                }
            }
            Err(e) => eprintln!("Warning: failed to list checkpoint store: {e}"),
        }
    }
}

/// Build the storage name for an epoch's payload: `epoch=<E>` followed by
/// every metric as `-<key>=<value>` with exactly 4 fractional digits, keys in
/// ascending order, then the model suffix.
fn checkpoint_name(epoch: usize, metrics: &BTreeMap<String, f64>) -> String {
    let mut name = format!("epoch={epoch}");
    for (key, value) in metrics {
        name.push_str(&format!("-{key}={value:.4}"));
    }
    name.push_str(CHECKPOINT_SUFFIX);
    name
}
