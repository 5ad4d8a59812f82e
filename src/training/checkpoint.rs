//! Model persistence with burn's `CompactRecorder`.
//!
//! The recorder stores records under an `.mpk` extension, replacing any
//! extension already present on the given path: a checkpoint path of
//! `models/trained.model` is written to disk as `models/trained.mpk`.
//! Periodic checkpoints therefore get a per-epoch file stem (see
//! [`epoch_checkpoint_path`]) so they never collide with each other or with
//! the final save. The parent directory must already exist; it is not
//! created here.

use std::path::{Path, PathBuf};

use burn::{
    module::Module,
    record::{CompactRecorder, Recorder},
    tensor::backend::Backend,
};
use tracing::info;

use crate::model::{Xception, XceptionConfig};
use crate::training::run::TrainingConfig;
use crate::utils::{ClassifierError, Result};

/// Checkpoint path for a periodic save after the given one-indexed epoch.
///
/// The epoch number goes into the file stem, so the recorder's extension
/// handling yields a distinct file per epoch:
/// `models/trained.model` -> `models/trained-epoch5` -> `trained-epoch5.mpk`.
pub fn epoch_checkpoint_path(base: &Path, epoch: usize) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "checkpoint".to_string());
    base.with_file_name(format!("{stem}-epoch{epoch}"))
}

/// Save model weights to `path` (stored with an `.mpk` extension) and print
/// the checkpoint marker.
pub fn save_model<B: Backend>(model: &Xception<B>, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(ClassifierError::MissingPath(parent.to_path_buf()));
        }
    }

    println!();
    model
        .clone()
        .save_file(path, &CompactRecorder::new())
        .map_err(|e| ClassifierError::Checkpoint(format!("failed to save model: {e}")))?;

    println!("****----Checkpoint Saved----****");
    println!();
    info!(path = %path.display(), "model checkpoint written");

    Ok(())
}

/// Load model weights saved by [`save_model`] into a freshly initialized
/// model.
pub fn load_model<B: Backend>(
    config: &XceptionConfig,
    path: &Path,
    device: &B::Device,
) -> Result<Xception<B>> {
    let record = CompactRecorder::new()
        .load(PathBuf::from(path), device)
        .map_err(|e| ClassifierError::Checkpoint(format!("failed to load model: {e}")))?;

    Ok(config.init::<B>(device).load_record(record))
}

/// Write the training configuration next to the checkpoint as JSON.
pub fn save_config(config: &TrainingConfig, checkpoint_path: &Path) -> Result<()> {
    let config_path = checkpoint_path.with_extension("json");
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| ClassifierError::Checkpoint(format!("failed to serialize config: {e}")))?;
    std::fs::write(&config_path, json)?;
    info!(path = %config_path.display(), "training config written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::Tensor;
    use tempfile::tempdir;

    type TestBackend = burn::backend::NdArray;

    fn fc_weights(model: &Xception<TestBackend>) -> Vec<f32> {
        model
            .fc
            .weight
            .val()
            .into_data()
            .to_vec::<f32>()
            .unwrap()
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let device = Default::default();
        let config = XceptionConfig::new(3).with_middle_blocks(1);
        let model = config.init::<TestBackend>(&device);

        let dir = tempdir().unwrap();
        let path = dir.path().join("trained.model");
        save_model(&model, &path).unwrap();
        // the recorder swaps the configured extension for its own
        assert!(dir.path().join("trained.mpk").exists());
        assert!(!dir.path().join("trained.model.mpk").exists());

        let restored = load_model::<TestBackend>(&config, &path, &device).unwrap();
        assert_eq!(fc_weights(&model), fc_weights(&restored));

        // restored model still produces valid log-probabilities
        let input = Tensor::<TestBackend, 4>::zeros([1, 3, 64, 64], &device);
        let output = restored.forward(input);
        assert_eq!(output.dims(), [1, 3]);
    }

    #[test]
    fn test_epoch_checkpoint_paths_are_distinct() {
        let base = PathBuf::from("models/trained.model");

        assert_eq!(
            epoch_checkpoint_path(&base, 5),
            PathBuf::from("models/trained-epoch5")
        );
        assert_ne!(epoch_checkpoint_path(&base, 5), epoch_checkpoint_path(&base, 10));

        // a base without an extension gets the same treatment
        assert_eq!(
            epoch_checkpoint_path(&PathBuf::from("out/final"), 2),
            PathBuf::from("out/final-epoch2")
        );
    }

    #[test]
    fn test_periodic_saves_do_not_overwrite_each_other() {
        let device = Default::default();
        let config = XceptionConfig::new(2).with_middle_blocks(1);
        let model = config.init::<TestBackend>(&device);

        let dir = tempdir().unwrap();
        let base = dir.path().join("trained.model");

        save_model(&model, &epoch_checkpoint_path(&base, 1)).unwrap();
        save_model(&model, &epoch_checkpoint_path(&base, 2)).unwrap();
        save_model(&model, &base).unwrap();

        assert!(dir.path().join("trained-epoch1.mpk").exists());
        assert!(dir.path().join("trained-epoch2.mpk").exists());
        assert!(dir.path().join("trained.mpk").exists());
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let device = Default::default();
        let config = XceptionConfig::new(2).with_middle_blocks(1);
        let model = config.init::<TestBackend>(&device);

        let dir = tempdir().unwrap();
        let path = dir.path().join("does-not-exist").join("trained.model");
        let err = save_model(&model, &path).unwrap_err();
        assert!(matches!(err, ClassifierError::MissingPath(_)));
    }

    #[test]
    fn test_save_config_writes_json() {
        let dir = tempdir().unwrap();
        let checkpoint = dir.path().join("trained.model");
        let config = TrainingConfig::default();

        save_config(&config, &checkpoint).unwrap();

        let json = std::fs::read_to_string(dir.path().join("trained.json")).unwrap();
        let parsed: TrainingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.epochs, config.epochs);
        assert_eq!(parsed.batch_size, config.batch_size);
    }
}
