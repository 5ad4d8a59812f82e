//! Error types for the classifier library.
//!
//! Every failure in this crate is fatal: errors propagate to the binary
//! boundary and abort the run. There are no retries and no partial-failure
//! recovery anywhere in the pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for classifier operations
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// A required path (dataset root, checkpoint directory) does not exist
    #[error("Path not found: {0}")]
    MissingPath(PathBuf),

    /// Error scanning or validating a dataset
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Error decoding or preprocessing an image file
    #[error("Failed to load image at '{0}': {1}")]
    Image(PathBuf, String),

    /// Error persisting or restoring model weights
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for classifier operations
pub type Result<T> = std::result::Result<T, ClassifierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClassifierError::Dataset("no classes found".to_string());
        assert_eq!(format!("{}", err), "Dataset error: no classes found");
    }

    #[test]
    fn test_image_error_includes_path() {
        let err = ClassifierError::Image(
            PathBuf::from("/data/train/cat/img.jpg"),
            "truncated file".to_string(),
        );
        assert!(format!("{}", err).contains("img.jpg"));
    }
}
