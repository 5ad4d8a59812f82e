//! Command-line interface for training and inspecting image-classification
//! datasets.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use xception_classifier::{
    backend::{backend_name, TrainingBackend},
    dataset::ImageFolder,
    training::{
        run_training, TrainingConfig, DEFAULT_BATCH_SIZE, DEFAULT_CHECKPOINT_PATH, DEFAULT_EPOCHS,
        DEFAULT_LEARNING_RATE, DEFAULT_LR_GAMMA, DEFAULT_NUM_WORKERS, DEFAULT_TEST_BATCH_SIZE,
    },
    utils::{init_logging, LogConfig},
    DEFAULT_IMAGE_SIZE,
};

#[derive(Parser)]
#[command(name = "xception_classifier")]
#[command(about = "Xception image classifier training", version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train a classifier on an image-folder dataset
    Train {
        /// Training images, one sub-directory per class
        #[arg(long, default_value = "cropped_trainset")]
        train_dir: PathBuf,

        /// Evaluation images, one sub-directory per class
        #[arg(long, default_value = "cropped_testset")]
        test_dir: PathBuf,

        /// Number of epochs
        #[arg(long, default_value_t = DEFAULT_EPOCHS)]
        epochs: usize,

        /// Training batch size
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Evaluation batch size
        #[arg(long, default_value_t = DEFAULT_TEST_BATCH_SIZE)]
        test_batch_size: usize,

        /// Adam learning rate
        #[arg(long, default_value_t = DEFAULT_LEARNING_RATE)]
        learning_rate: f64,

        /// Learning-rate decay factor (used with --decay-lr)
        #[arg(long, default_value_t = DEFAULT_LR_GAMMA)]
        lr_gamma: f64,

        /// Decay the learning rate each epoch
        #[arg(long)]
        decay_lr: bool,

        /// Data-loading workers
        #[arg(long, default_value_t = DEFAULT_NUM_WORKERS)]
        num_workers: usize,

        /// Side length images are resized to
        #[arg(long, default_value_t = DEFAULT_IMAGE_SIZE)]
        image_size: usize,

        /// Shuffling seed
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Where to save the trained model (stored with an `.mpk` extension)
        #[arg(long, default_value = DEFAULT_CHECKPOINT_PATH)]
        checkpoint_path: PathBuf,

        /// Also save every N epochs (0 saves only at the end)
        #[arg(long, default_value_t = 0)]
        checkpoint_every: usize,
    },

    /// Print class and sample statistics for a dataset directory
    Stats {
        /// Dataset root, one sub-directory per class
        data_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    init_logging(&log_config).map_err(anyhow::Error::msg)?;

    match cli.command {
        Command::Train {
            train_dir,
            test_dir,
            epochs,
            batch_size,
            test_batch_size,
            learning_rate,
            lr_gamma,
            decay_lr,
            num_workers,
            image_size,
            seed,
            checkpoint_path,
            checkpoint_every,
        } => {
            let config = TrainingConfig {
                train_dir,
                test_dir,
                epochs,
                batch_size,
                test_batch_size,
                learning_rate,
                lr_gamma,
                decay_lr,
                num_workers,
                image_size,
                seed,
                checkpoint_path,
                checkpoint_every,
            };
            run_training::<TrainingBackend>(&config)
        }
        Command::Stats { data_dir } => cmd_stats(&data_dir),
    }
}

fn cmd_stats(data_dir: &PathBuf) -> Result<()> {
    println!("{} {}", "Backend:".bold(), backend_name().cyan());
    let folder = ImageFolder::new(data_dir)?;
    folder.stats().print();
    Ok(())
}
