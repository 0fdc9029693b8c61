use std::path::Path;

use crate::checkpoint::CheckpointConfig;
use crate::dataset::DatasetConfig;
use crate::error::ConfigError;
use crate::schedule::LrSchedule;
use crate::training::trainer::TrainerConfig;

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dataset: DatasetConfig,
    pub schedule: LrSchedule,
    pub training: TrainerConfig,
    pub checkpoint: CheckpointConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            dataset: DatasetConfig::default(),
            schedule: LrSchedule::default(),
            training: TrainerConfig::default(),
            checkpoint: CheckpointConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            eprintln!(
                "Warning: config file '{}' not found, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.training.max_epochs == 0 {
            return Err(ConfigError::Validation(
                "training.max_epochs must be > 0".into(),
            ));
        }
        if self.training.base_lr <= 0.0 {
            return Err(ConfigError::Validation(
                "training.base_lr must be > 0".into(),
            ));
        }

        self.checkpoint.validate()?;
        self.schedule.validate()?;

        for (label, folders) in self.dataset.class_map.iter().enumerate() {
            if folders.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "dataset.class_map[{label}] must name at least one folder"
                )));
            }
            if folders.iter().any(|f| f.is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "dataset.class_map[{label}] contains an empty folder name"
                )));
            }
        }
        if self.dataset.max_samples_per_class == Some(0) {
            return Err(ConfigError::Validation(
                "dataset.max_samples_per_class must be >= 1".into(),
            ));
        }

        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&AppConfig::default()).expect("default config serializes")
    }
}
