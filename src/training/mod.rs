//! Training pipeline: loss and accuracy loops, checkpointing, learning-rate
//! scheduling, and the end-to-end training driver.

pub mod checkpoint;
pub mod loops;
pub mod run;
pub mod scheduler;

pub use checkpoint::{epoch_checkpoint_path, load_model, save_config, save_model};
pub use loops::{evaluate, train_epoch, EvalReport};
pub use run::{run_training, TrainingConfig};
pub use scheduler::StepDecay;

/// Default number of training epochs
pub const DEFAULT_EPOCHS: usize = 100;

/// Default training batch size
pub const DEFAULT_BATCH_SIZE: usize = 3;

/// Default evaluation batch size
pub const DEFAULT_TEST_BATCH_SIZE: usize = 1;

/// Default learning rate for the Adam optimizer
pub const DEFAULT_LEARNING_RATE: f64 = 1e-3;

/// Default multiplicative learning-rate decay factor
pub const DEFAULT_LR_GAMMA: f64 = 0.8;

/// Default number of data-loading workers
pub const DEFAULT_NUM_WORKERS: usize = 2;

/// Default path for the saved model
pub const DEFAULT_CHECKPOINT_PATH: &str = "models/trained.model";
