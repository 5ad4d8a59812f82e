//! Compute backend selection
//!
//! The backend is chosen at compile time: the `cuda` feature selects the
//! CUDA GPU backend, otherwise the ndarray CPU backend is used. Training
//! always runs on `Autodiff<DefaultBackend>`; evaluation and inference use
//! the inner backend directly.

use burn::backend::Autodiff;

#[cfg(feature = "cuda")]
pub type DefaultBackend = burn_cuda::Cuda;

#[cfg(all(feature = "ndarray", not(feature = "cuda")))]
pub type DefaultBackend = burn::backend::NdArray;

#[cfg(not(any(feature = "cuda", feature = "ndarray")))]
compile_error!("Either the `cuda` or `ndarray` feature must be enabled.");

/// The autodiff backend used for training
pub type TrainingBackend = Autodiff<DefaultBackend>;

/// Human-readable name for the current backend
pub fn backend_name() -> &'static str {
    #[cfg(feature = "cuda")]
    {
        "CUDA (GPU)"
    }
    #[cfg(all(feature = "ndarray", not(feature = "cuda")))]
    {
        "NdArray (CPU)"
    }
}
