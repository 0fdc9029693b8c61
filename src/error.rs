use std::path::PathBuf;

/// Errors that can occur during checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("checkpoint destination already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("monitored metric '{monitor}' missing from metrics")]
    MissingMetric { monitor: String },

    #[error("invalid checkpoint configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while scanning an image-folder dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("data directory does not exist: {0}")]
    DirMissing(PathBuf),

    #[error("class directory does not exist: {0}")]
    ClassDirMissing(PathBuf),

    #[error("class directory has no images: {0}")]
    EmptyClassDir(PathBuf),

    #[error("no images found in {0}")]
    NoImages(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

/// Errors that can occur while driving a training run.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
