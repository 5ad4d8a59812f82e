//! Image-folder dataset scanner
//!
//! Discovers class subdirectories and their image files from a dataset root
//! on disk. Only paths and labels are collected here; pixel data is decoded
//! later by the batching layer.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use super::IMAGE_EXTENSIONS;
use crate::utils::error::{ClassifierError, Result};

/// A single image file with its label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSample {
    /// Path to the image file
    pub path: PathBuf,
    /// Class label index (position of the class directory in sorted order)
    pub label: usize,
    /// Class directory name
    pub class_name: String,
}

/// A scanned image-folder dataset
#[derive(Debug, Clone)]
pub struct ImageFolder {
    /// Root directory of the dataset
    pub root_dir: PathBuf,
    /// All samples found under the root, grouped by class in label order
    pub samples: Vec<ImageSample>,
    /// Mapping from class name to label index
    pub class_to_idx: BTreeMap<String, usize>,
}

impl ImageFolder {
    /// Scan a dataset root directory.
    ///
    /// Fails if the root does not exist, contains no class subdirectories,
    /// or contains no image files at all.
    pub fn new<P: AsRef<Path>>(root_dir: P) -> Result<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();
        info!("Scanning dataset directory: {:?}", root_dir);

        if !root_dir.exists() {
            return Err(ClassifierError::MissingPath(root_dir));
        }

        let mut class_dirs: Vec<String> = Vec::new();
        for entry in std::fs::read_dir(&root_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    class_dirs.push(name.to_string());
                }
            }
        }
        class_dirs.sort();

        if class_dirs.is_empty() {
            return Err(ClassifierError::Dataset(format!(
                "no class subdirectories under {:?}",
                root_dir
            )));
        }

        let class_to_idx: BTreeMap<String, usize> = class_dirs
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();

        let mut samples = Vec::new();
        for class_name in &class_dirs {
            let class_dir = root_dir.join(class_name);
            let label = class_to_idx[class_name];
            let before = samples.len();

            for entry in WalkDir::new(&class_dir)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = entry.path().to_path_buf();
                if let Some(ext) = path.extension() {
                    let ext = ext.to_string_lossy().to_lowercase();
                    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
                        samples.push(ImageSample {
                            path,
                            label,
                            class_name: class_name.clone(),
                        });
                    }
                }
            }

            debug!(
                "Class '{}' (label {}): {} images",
                class_name,
                label,
                samples.len() - before
            );
        }

        if samples.is_empty() {
            return Err(ClassifierError::Dataset(format!(
                "no image files found under {:?}",
                root_dir
            )));
        }

        info!(
            "Found {} samples across {} classes",
            samples.len(),
            class_dirs.len()
        );

        Ok(Self {
            root_dir,
            samples,
            class_to_idx,
        })
    }

    /// Number of samples in the dataset
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the dataset holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of classes
    pub fn num_classes(&self) -> usize {
        self.class_to_idx.len()
    }

    /// Class name for a label index
    pub fn class_name(&self, label: usize) -> Option<&str> {
        self.class_to_idx
            .iter()
            .find(|(_, idx)| **idx == label)
            .map(|(name, _)| name.as_str())
    }

    /// Class names indexed by label, the reverse of `class_to_idx`
    pub fn idx_to_class(&self) -> Vec<&str> {
        let mut names = vec![""; self.class_to_idx.len()];
        for (name, idx) in &self.class_to_idx {
            names[*idx] = name.as_str();
        }
        names
    }

    /// All (path, label) pairs, for handing to the batching layer
    pub fn pairs(&self) -> Vec<(PathBuf, usize)> {
        self.samples
            .iter()
            .map(|s| (s.path.clone(), s.label))
            .collect()
    }

    /// Per-class statistics
    pub fn stats(&self) -> DatasetStats {
        let mut class_counts = vec![0usize; self.num_classes()];
        for sample in &self.samples {
            class_counts[sample.label] += 1;
        }

        let mut class_names: Vec<String> = vec![String::new(); self.num_classes()];
        for (name, idx) in &self.class_to_idx {
            class_names[*idx] = name.clone();
        }

        DatasetStats {
            total_samples: self.samples.len(),
            num_classes: self.num_classes(),
            class_counts,
            class_names,
        }
    }
}

/// Sample counts per class for a scanned dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetStats {
    pub total_samples: usize,
    pub num_classes: usize,
    pub class_counts: Vec<usize>,
    pub class_names: Vec<String>,
}

impl DatasetStats {
    /// Print a per-class histogram to the console
    pub fn print(&self) {
        println!("\nDataset statistics:");
        println!("  Total samples: {}", self.total_samples);
        println!("  Number of classes: {}", self.num_classes);
        println!("\n  Samples per class:");

        for (idx, name) in self.class_names.iter().enumerate() {
            let count = self.class_counts[idx];
            let bar_len = (count as f32 / self.total_samples as f32 * 40.0) as usize;
            let bar: String = "█".repeat(bar_len);
            println!("    {:3}. {:40} {:5} {}", idx, name, count, bar);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_image(path: &Path) {
        image::RgbImage::new(8, 8).save(path).unwrap();
    }

    fn build_folder(root: &Path, classes: &[(&str, usize)]) {
        for (class, count) in classes {
            let dir = root.join(class);
            std::fs::create_dir_all(&dir).unwrap();
            for i in 0..*count {
                write_image(&dir.join(format!("img{}.png", i)));
            }
        }
    }

    #[test]
    fn test_scan_assigns_sorted_labels() {
        let tmp = tempfile::tempdir().unwrap();
        build_folder(tmp.path(), &[("zebra", 1), ("ant", 2)]);

        let folder = ImageFolder::new(tmp.path()).unwrap();

        assert_eq!(folder.num_classes(), 2);
        assert_eq!(folder.len(), 3);
        // Sorted order: "ant" before "zebra"
        assert_eq!(folder.class_to_idx["ant"], 0);
        assert_eq!(folder.class_to_idx["zebra"], 1);
        assert_eq!(folder.class_name(1), Some("zebra"));
        assert_eq!(folder.idx_to_class(), vec!["ant", "zebra"]);
    }

    #[test]
    fn test_stats_counts_per_class() {
        let tmp = tempfile::tempdir().unwrap();
        build_folder(tmp.path(), &[("a", 2), ("b", 3)]);

        let folder = ImageFolder::new(tmp.path()).unwrap();
        let stats = folder.stats();

        assert_eq!(stats.total_samples, 5);
        assert_eq!(stats.class_counts, vec![2, 3]);
        assert_eq!(stats.class_names, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_non_image_files_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        build_folder(tmp.path(), &[("a", 1)]);
        std::fs::write(tmp.path().join("a").join("notes.txt"), "not an image").unwrap();

        let folder = ImageFolder::new(tmp.path()).unwrap();
        assert_eq!(folder.len(), 1);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let result = ImageFolder::new("/definitely/not/a/real/path");
        assert!(matches!(result, Err(ClassifierError::MissingPath(_))));
    }

    #[test]
    fn test_empty_root_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let result = ImageFolder::new(tmp.path());
        assert!(matches!(result, Err(ClassifierError::Dataset(_))));
    }
}
