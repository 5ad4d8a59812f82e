//! End-to-end training driver: dataset discovery, data loaders, the
//! epoch loop, and final checkpointing.

use std::path::PathBuf;

use anyhow::Context;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::AdamConfig,
    tensor::backend::AutodiffBackend,
};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backend::backend_name;
use crate::dataset::{ClassifierBatcher, ClassifierDataset, ImageFolder};
use crate::model::XceptionConfig;
use crate::training::{
    checkpoint::{epoch_checkpoint_path, save_config, save_model},
    loops::{evaluate, train_epoch},
    scheduler::StepDecay,
    DEFAULT_BATCH_SIZE, DEFAULT_CHECKPOINT_PATH, DEFAULT_EPOCHS, DEFAULT_LEARNING_RATE,
    DEFAULT_LR_GAMMA, DEFAULT_NUM_WORKERS, DEFAULT_TEST_BATCH_SIZE,
};
use crate::utils::{ClassifierError, Result};
use crate::DEFAULT_IMAGE_SIZE;

/// Configuration for a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Directory of training images, one sub-directory per class
    pub train_dir: PathBuf,
    /// Directory of evaluation images, one sub-directory per class
    pub test_dir: PathBuf,
    /// Number of epochs to train
    pub epochs: usize,
    /// Training batch size
    pub batch_size: usize,
    /// Evaluation batch size
    pub test_batch_size: usize,
    /// Adam learning rate
    pub learning_rate: f64,
    /// Multiplicative learning-rate decay factor
    pub lr_gamma: f64,
    /// Apply the step decay each epoch; when false the learning rate stays
    /// at `learning_rate` for the whole run
    pub decay_lr: bool,
    /// Number of data-loading workers
    pub num_workers: usize,
    /// Side length images are resized to
    pub image_size: usize,
    /// Shuffling seed for the training loader
    pub seed: u64,
    /// Where to write the trained model (stored with an `.mpk` extension)
    pub checkpoint_path: PathBuf,
    /// Also save every N epochs; 0 saves only at the end
    pub checkpoint_every: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            train_dir: PathBuf::from("cropped_trainset"),
            test_dir: PathBuf::from("cropped_testset"),
            epochs: DEFAULT_EPOCHS,
            batch_size: DEFAULT_BATCH_SIZE,
            test_batch_size: DEFAULT_TEST_BATCH_SIZE,
            learning_rate: DEFAULT_LEARNING_RATE,
            lr_gamma: DEFAULT_LR_GAMMA,
            decay_lr: false,
            num_workers: DEFAULT_NUM_WORKERS,
            image_size: DEFAULT_IMAGE_SIZE,
            seed: 42,
            checkpoint_path: PathBuf::from(DEFAULT_CHECKPOINT_PATH),
            checkpoint_every: 0,
        }
    }
}

impl TrainingConfig {
    pub fn new(train_dir: impl Into<PathBuf>, test_dir: impl Into<PathBuf>) -> Self {
        Self {
            train_dir: train_dir.into(),
            test_dir: test_dir.into(),
            ..Self::default()
        }
    }
}

/// Verify that the train and test sets expose the same class names with the
/// same label indices.
pub fn ensure_matching_classes(train: &ImageFolder, test: &ImageFolder) -> Result<()> {
    if train.class_to_idx != test.class_to_idx {
        return Err(ClassifierError::Dataset(format!(
            "train/test class mismatch: train has {:?}, test has {:?}",
            train.idx_to_class(),
            test.idx_to_class()
        )));
    }
    Ok(())
}

/// Run the full training pipeline.
pub fn run_training<B: AutodiffBackend>(config: &TrainingConfig) -> anyhow::Result<()> {
    let device = B::Device::default();

    println!(
        "{} {}",
        "Backend:".bold(),
        backend_name().cyan()
    );

    let train_folder = ImageFolder::new(&config.train_dir)
        .with_context(|| format!("loading training set from {}", config.train_dir.display()))?;
    let test_folder = ImageFolder::new(&config.test_dir)
        .with_context(|| format!("loading test set from {}", config.test_dir.display()))?;

    println!("{}", "Training set:".bold().green());
    train_folder.stats().print();
    println!("{}", "Test set:".bold().green());
    test_folder.stats().print();

    ensure_matching_classes(&train_folder, &test_folder)?;
    let num_classes = train_folder.num_classes();

    info!(
        num_classes,
        train_samples = train_folder.len(),
        test_samples = test_folder.len(),
        "datasets loaded"
    );

    let train_dataset = ClassifierDataset::load(train_folder.pairs(), config.image_size)
        .context("decoding training images")?;
    let test_dataset = ClassifierDataset::load(test_folder.pairs(), config.image_size)
        .context("decoding test images")?;

    let total_train = train_folder.len();
    let num_batches = total_train.div_ceil(config.batch_size.max(1));

    let train_loader = DataLoaderBuilder::new(ClassifierBatcher::<B>::new(config.image_size))
        .batch_size(config.batch_size)
        .shuffle(config.seed)
        .num_workers(config.num_workers)
        .build(train_dataset);

    let test_loader = DataLoaderBuilder::new(ClassifierBatcher::<B::InnerBackend>::new(
        config.image_size,
    ))
    .batch_size(config.test_batch_size)
    .num_workers(config.num_workers)
    .build(test_dataset);

    let model_config = XceptionConfig::new(num_classes);
    let mut model = model_config.init::<B>(&device);
    let mut optimizer = AdamConfig::new().init();
    let scheduler = StepDecay::new(config.learning_rate, config.lr_gamma, 1);

    for epoch in 0..config.epochs {
        let lr = if config.decay_lr {
            scheduler.lr(epoch)
        } else {
            config.learning_rate
        };
        info!(epoch, lr, "starting epoch");

        let (updated, _last_loss) = train_epoch(
            model,
            &mut optimizer,
            lr,
            train_loader.iter(),
            epoch,
            total_train,
            num_batches,
        );
        model = updated;

        evaluate(&model.valid(), test_loader.iter());

        if config.checkpoint_every > 0 && (epoch + 1) % config.checkpoint_every == 0 {
            let epoch_path = epoch_checkpoint_path(&config.checkpoint_path, epoch + 1);
            save_model(&model.valid(), &epoch_path)?;
        }
    }

    save_model(&model.valid(), &config.checkpoint_path)?;
    save_config(config, &config.checkpoint_path)?;

    println!(
        "{} {}",
        "Training complete. Model saved to".bold().green(),
        config.checkpoint_path.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_class_dirs(root: &std::path::Path, classes: &[&str]) {
        for class in classes {
            let dir = root.join(class);
            std::fs::create_dir_all(&dir).unwrap();
            image::RgbImage::new(8, 8)
                .save(dir.join("sample.png"))
                .unwrap();
        }
    }

    #[test]
    fn test_matching_classes_accepted() {
        let train = tempdir().unwrap();
        let test = tempdir().unwrap();
        make_class_dirs(train.path(), &["cat", "dog"]);
        make_class_dirs(test.path(), &["cat", "dog"]);

        let train_folder = ImageFolder::new(train.path()).unwrap();
        let test_folder = ImageFolder::new(test.path()).unwrap();

        assert!(ensure_matching_classes(&train_folder, &test_folder).is_ok());
    }

    #[test]
    fn test_mismatched_classes_rejected() {
        let train = tempdir().unwrap();
        let test = tempdir().unwrap();
        make_class_dirs(train.path(), &["cat", "dog"]);
        make_class_dirs(test.path(), &["cat", "ferret"]);

        let train_folder = ImageFolder::new(train.path()).unwrap();
        let test_folder = ImageFolder::new(test.path()).unwrap();

        let err = ensure_matching_classes(&train_folder, &test_folder).unwrap_err();
        assert!(matches!(err, ClassifierError::Dataset(_)));
    }

    #[test]
    fn test_default_config_matches_constants() {
        let config = TrainingConfig::default();
        assert_eq!(config.epochs, DEFAULT_EPOCHS);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.test_batch_size, DEFAULT_TEST_BATCH_SIZE);
        assert!((config.learning_rate - DEFAULT_LEARNING_RATE).abs() < f64::EPSILON);
        assert!(!config.decay_lr);
        assert_eq!(config.image_size, 299);
        assert_eq!(config.checkpoint_every, 0);
    }
}
