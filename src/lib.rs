//! # Xception Classifier
//!
//! A Rust library for training an Xception-style convolutional image
//! classifier on directory-structured datasets using the Burn framework.
//!
//! A dataset is a directory whose subdirectories are class labels, each
//! holding the image files for that class. Training runs a fixed sequence of
//! epochs, each followed by an evaluation pass over a held-out test
//! directory, and persists the trained weights as a checkpoint.
//!
//! ## Modules
//!
//! - `dataset`: directory scanning, image decoding, and batching
//! - `model`: the Xception architecture built with Burn
//! - `training`: training/evaluation loops, scheduling, and checkpointing
//! - `backend`: compute backend selection (CUDA or CPU)
//! - `utils`: errors and logging
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use xception_classifier::backend::TrainingBackend;
//! use xception_classifier::training::{run_training, TrainingConfig};
//!
//! let config = TrainingConfig::new("cropped_trainset", "cropped_testset");
//! run_training::<TrainingBackend>(&config)?;
//! ```

pub mod backend;
pub mod dataset;
pub mod model;
pub mod training;
pub mod utils;

pub use dataset::batcher::{ClassifierBatch, ClassifierBatcher, ClassifierDataset, ClassifierItem};
pub use dataset::loader::{DatasetStats, ImageFolder, ImageSample};
pub use model::xception::{Xception, XceptionConfig};
pub use training::loops::{evaluate, train_epoch, EvalReport};
pub use training::run::run_training;
pub use training::TrainingConfig;
pub use utils::error::{ClassifierError, Result};

/// Default edge length images are resized to (Xception's native input size)
pub const DEFAULT_IMAGE_SIZE: usize = 299;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
