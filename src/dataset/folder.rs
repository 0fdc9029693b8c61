use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::DatasetError;

/// File extensions treated as images (matched case-insensitively).
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "ppm", "bmp", "pgm", "tif", "tiff", "webp",
];

/// Maps a class index to the folder names grouped under it. The index is the
/// label; a class may collect several folders (e.g. `["ok", "good"]`).
pub type ClassMap = Vec<Vec<String>>;

/// Which half of the `train`/`val` folder layout to scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Val,
}

impl Split {
    fn dir_name(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
        }
    }
}

/// One image path with its label. Unlabeled scans carry `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub path: PathBuf,
    pub label: Option<usize>,
}

/// Per-class sample capping options.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Cap each class at this many samples.
    pub max_samples_per_class: Option<usize>,
    /// Pick the capped samples at random instead of taking the first ones.
    pub random_samples: bool,
    pub seed: u64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            max_samples_per_class: None,
            random_samples: false,
            seed: 42,
        }
    }
}

/// Dataset section of the application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub class_map: ClassMap,
    pub max_samples_per_class: Option<usize>,
    pub random_samples: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        DatasetConfig {
            class_map: Vec::new(),
            max_samples_per_class: None,
            random_samples: false,
        }
    }
}

impl DatasetConfig {
    pub fn scan_options(&self, seed: u64) -> ScanOptions {
        ScanOptions {
            max_samples_per_class: self.max_samples_per_class,
            random_samples: self.random_samples,
            seed,
        }
    }
}

/// An image-folder dataset: labels come from the directory structure.
#[derive(Debug)]
pub struct FolderDataset {
    samples: Vec<Sample>,
    num_classes: usize,
}

impl FolderDataset {
    /// Scan `root/train` or `root/val` against a class map, checking that
    /// every class folder exists and holds at least one image.
    pub fn scan(
        root: &Path,
        split: Split,
        class_map: &ClassMap,
        options: &ScanOptions,
    ) -> Result<Self, DatasetError> {
        let data_dir = root.join(split.dir_name());
        sanity_check(&data_dir, class_map)?;

        let mut rng = StdRng::seed_from_u64(options.seed);
        let mut samples = Vec::new();
        for (label, folders) in class_map.iter().enumerate() {
            let mut class_paths = Vec::new();
            for folder in folders {
                class_paths.extend(image_files(&data_dir.join(folder))?);
            }
            // Directory listing order is OS-dependent; sort so capping is
            // reproducible.
            class_paths.sort();

            if let Some(max) = options.max_samples_per_class {
                if class_paths.len() > max {
                    println!(
                        "> Label {} limited from {} to {} samples{}",
                        label,
                        class_paths.len(),
                        max,
                        if options.random_samples {
                            " (selected randomly)"
                        } else {
                            ""
                        }
                    );
                    if options.random_samples {
                        class_paths.shuffle(&mut rng);
                    }
                    class_paths.truncate(max);
                }
            }

            samples.extend(class_paths.into_iter().map(|path| Sample {
                path,
                label: Some(label),
            }));
        }

        Ok(FolderDataset {
            samples,
            num_classes: class_map.len(),
        })
    }

    /// Scan a flat folder of images with no labels (inference input).
    pub fn scan_unlabeled(root: &Path) -> Result<Self, DatasetError> {
        if !root.exists() {
            return Err(DatasetError::DirMissing(root.to_path_buf()));
        }
        let mut paths = image_files(root)?;
        if paths.is_empty() {
            return Err(DatasetError::NoImages(root.to_path_buf()));
        }
        paths.sort();
        Ok(FolderDataset {
            samples: paths
                .into_iter()
                .map(|path| Sample { path, label: None })
                .collect(),
            num_classes: 0,
        })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Sample count per class index.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.num_classes];
        for sample in &self.samples {
            if let Some(label) = sample.label {
                counts[label] += 1;
            }
        }
        counts
    }

    /// Print the per-class distribution.
    pub fn print_stats(&self) {
        let total = self.samples.len();
        println!(" ----------- Dataset Stats -----------");
        for (label, count) in self.class_counts().iter().enumerate() {
            println!(
                "> label {}: {}/{} -> {:.3}%",
                label,
                count,
                total,
                100.0 * *count as f64 / total as f64
            );
        }
        println!(" -------------------------------------");
    }
}

fn sanity_check(data_dir: &Path, class_map: &ClassMap) -> Result<(), DatasetError> {
    for folders in class_map {
        for folder in folders {
            let class_dir = data_dir.join(folder);
            if !class_dir.exists() {
                return Err(DatasetError::ClassDirMissing(class_dir));
            }
            if image_files(&class_dir)?.is_empty() {
                return Err(DatasetError::EmptyClassDir(class_dir));
            }
        }
    }
    Ok(())
}

fn image_files(dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false);
        if is_image {
            paths.push(path);
        }
    }
    Ok(paths)
}
