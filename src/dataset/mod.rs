//! Image-folder dataset scanning: labels from directory structure, structure
//! sanity checks, and per-class sample capping.

mod folder;

pub use folder::{ClassMap, DatasetConfig, FolderDataset, Sample, ScanOptions, Split};
