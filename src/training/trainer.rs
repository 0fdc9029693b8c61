use std::path::{Path, PathBuf};

use crate::checkpoint::{CheckpointConfig, CheckpointManager};
use crate::error::TrainingError;
use crate::schedule::LrSchedule;
use crate::training::metrics::MetricsHistory;
use crate::training::model::Trainable;

/// Trainer configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub max_epochs: usize,
    pub base_lr: f64,
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            max_epochs: 100,
            base_lr: 1e-3,
            seed: 42,
        }
    }
}

/// What a finished (or early-stopped) run looked like.
#[derive(Debug, Clone)]
pub struct FitSummary {
    pub epochs_run: usize,
    pub best_value: Option<f64>,
    pub stopped_early: bool,
}

/// Epoch driver: trains, validates, feeds the checkpoint manager once per
/// epoch, and stops as soon as the manager reports its patience exhausted.
#[derive(Debug)]
pub struct Trainer {
    config: TrainerConfig,
    schedule: LrSchedule,
    manager: CheckpointManager,
    history: MetricsHistory,
    output_dir: PathBuf,
}

impl Trainer {
    /// Build a trainer writing checkpoints under `output_dir/checkpoints`
    /// and the metrics history next to it. Fails if that checkpoint
    /// directory already exists.
    pub fn new(
        output_dir: &Path,
        config: TrainerConfig,
        schedule: LrSchedule,
        checkpoint: CheckpointConfig,
    ) -> Result<Self, TrainingError> {
        let manager = CheckpointManager::new(output_dir, checkpoint)?;
        Ok(Trainer {
            config,
            schedule,
            manager,
            history: MetricsHistory::new(),
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Run the training loop.
    pub fn fit(&mut self, model: &mut dyn Trainable) -> Result<FitSummary, TrainingError> {
        println!(
            "Starting training for up to {} epochs (monitoring {})...",
            self.config.max_epochs,
            self.manager.monitor()
        );
        println!("-------------------------------------------");

        let mut epochs_run = 0;
        let mut stopped_early = false;

        for epoch in 0..self.config.max_epochs {
            let lr = self.schedule.lr_at(self.config.base_lr, epoch);
            let train_loss = model.train_epoch(epoch, lr);
            let mut metrics = model.validate(epoch);
            metrics.insert("loss".to_string(), train_loss);

            let outcome = self.manager.step(epoch, &metrics, &model.state_bytes())?;
            epochs_run += 1;

            let monitored = metrics[self.manager.monitor()];
            println!(
                "Epoch {}/{} | lr: {:.6} | loss: {:.4} | {}: {:.4} | best: {:.4}",
                epoch,
                self.config.max_epochs,
                lr,
                train_loss,
                self.manager.monitor(),
                monitored,
                self.manager.best_value().unwrap_or(monitored),
            );
            if let Some(evicted) = outcome.evicted {
                println!("  >> Evicted checkpoint from epoch {}", evicted);
            }
            if let Some(name) = &outcome.saved {
                println!("  >> Checkpoint saved: {}", name);
            }

            self.history.record(epoch, lr, metrics);

            if self.manager.patience_exhausted() {
                println!(
                    "  >> {} has not improved for {} epochs, stopping early",
                    self.manager.monitor(),
                    self.manager.patience_count()
                );
                stopped_early = true;
                break;
            }
        }

        println!("-------------------------------------------");
        println!("Training complete. Epochs run: {}", epochs_run);

        let history_path = self.output_dir.join("metrics.json");
        self.history.save_json(&history_path)?;
        println!("Metrics history written to {}", history_path.display());

        Ok(FitSummary {
            epochs_run,
            best_value: self.manager.best_value(),
            stopped_early,
        })
    }

    pub fn history(&self) -> &MetricsHistory {
        &self.history
    }

    pub fn manager(&self) -> &CheckpointManager {
        &self.manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::Mode;
    use std::collections::BTreeMap;

    /// Model whose validation accuracy follows a script.
    struct ScriptedModel {
        accs: Vec<f64>,
    }

    impl Trainable for ScriptedModel {
        fn train_epoch(&mut self, epoch: usize, _lr: f64) -> f64 {
            1.0 / (epoch + 1) as f64
        }

        fn validate(&mut self, epoch: usize) -> BTreeMap<String, f64> {
            let mut m = BTreeMap::new();
            m.insert("acc".to_string(), self.accs[epoch]);
            m
        }

        fn state_bytes(&self) -> Vec<u8> {
            b"weights".to_vec()
        }
    }

    fn checkpoint_config(save_top_k: usize, patience: usize) -> CheckpointConfig {
        CheckpointConfig {
            monitor: "acc".to_string(),
            mode: Mode::Max,
            save_top_k,
            patience,
        }
    }

    fn trainer_config(max_epochs: usize) -> TrainerConfig {
        TrainerConfig {
            max_epochs,
            base_lr: 0.01,
            seed: 42,
        }
    }

    fn stored_names(output_dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(output_dir.join("checkpoints"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_fit_stops_early_when_patience_runs_out() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run");
        let mut trainer = Trainer::new(
            &out,
            trainer_config(10),
            LrSchedule::default(),
            checkpoint_config(2, 2),
        )
        .unwrap();

        let mut model = ScriptedModel {
            accs: vec![0.5, 0.6, 0.4, 0.3, 0.2, 0.9, 0.9, 0.9, 0.9, 0.9],
        };
        let summary = trainer.fit(&mut model).unwrap();

        // Epochs 0 and 1 fill the ledger; 2 and 3 fail to improve it and
        // exhaust a patience of 2 before the scripted 0.9s are reached.
        assert_eq!(summary.epochs_run, 4);
        assert!(summary.stopped_early);
        assert_eq!(summary.best_value, Some(0.6));
        assert!(trainer.manager().patience_exhausted());
    }

    #[test]
    fn test_fit_runs_to_completion_and_prunes_disk() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run");
        let mut trainer = Trainer::new(
            &out,
            trainer_config(4),
            LrSchedule::default(),
            checkpoint_config(2, 5),
        )
        .unwrap();

        let mut model = ScriptedModel {
            accs: vec![0.5, 0.6, 0.7, 0.8],
        };
        let summary = trainer.fit(&mut model).unwrap();

        assert_eq!(summary.epochs_run, 4);
        assert!(!summary.stopped_early);
        assert_eq!(summary.best_value, Some(0.8));

        // Only the top 2 epochs survive on disk; the filename carries the
        // full metrics map (acc plus the folded-in training loss).
        assert_eq!(
            stored_names(&out),
            vec![
                "epoch=2-acc=0.7000-loss=0.3333.mpk",
                "epoch=3-acc=0.8000-loss=0.2500.mpk"
            ]
        );
    }

    #[test]
    fn test_fit_writes_metrics_history() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run");
        let mut trainer = Trainer::new(
            &out,
            trainer_config(3),
            LrSchedule::default(),
            checkpoint_config(1, 5),
        )
        .unwrap();

        let mut model = ScriptedModel {
            accs: vec![0.5, 0.6, 0.7],
        };
        trainer.fit(&mut model).unwrap();

        let json = std::fs::read_to_string(out.join("metrics.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 3);
        assert_eq!(trainer.history().best("acc", Mode::Max), Some((2, 0.7)));
    }

    #[test]
    fn test_new_fails_on_existing_checkpoint_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("checkpoints")).unwrap();

        let err = Trainer::new(
            dir.path(),
            trainer_config(3),
            LrSchedule::default(),
            checkpoint_config(1, 5),
        )
        .unwrap_err();
        assert!(matches!(err, TrainingError::Checkpoint(_)));
    }
}
