//! Dataset handling for directory-structured image classification data
//!
//! A dataset root looks like:
//!
//! ```text
//! root/
//! ├── class_a/
//! │   ├── image1.jpg
//! │   └── image2.jpg
//! ├── class_b/
//! │   └── ...
//! └── ...
//! ```
//!
//! Subdirectory names, sorted lexicographically, define the label indices.
//! `loader` scans the directory tree; `batcher` decodes images into
//! fixed-shape samples and collates them into normalized tensor batches for
//! Burn's data loader.

pub mod batcher;
pub mod loader;

pub use batcher::{ClassifierBatch, ClassifierBatcher, ClassifierDataset, ClassifierItem};
pub use loader::{DatasetStats, ImageFolder, ImageSample};

/// Image file extensions recognized when scanning class directories
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];
