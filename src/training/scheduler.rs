//! Step-wise learning-rate decay

use serde::{Deserialize, Serialize};

/// Multiplies the learning rate by `gamma` every `step_size` epochs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDecay {
    initial_lr: f64,
    gamma: f64,
    step_size: usize,
}

impl StepDecay {
    pub fn new(initial_lr: f64, gamma: f64, step_size: usize) -> Self {
        Self {
            initial_lr,
            gamma,
            step_size,
        }
    }

    /// Learning rate for the given zero-indexed epoch
    pub fn lr(&self, epoch: usize) -> f64 {
        self.initial_lr * self.gamma.powi((epoch / self.step_size) as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decays_every_step() {
        let sched = StepDecay::new(1e-3, 0.8, 1);

        assert!((sched.lr(0) - 1e-3).abs() < 1e-12);
        assert!((sched.lr(1) - 0.8e-3).abs() < 1e-12);
        assert!((sched.lr(2) - 0.64e-3).abs() < 1e-12);
    }

    #[test]
    fn test_holds_within_step_window() {
        let sched = StepDecay::new(0.01, 0.5, 10);

        assert!((sched.lr(0) - 0.01).abs() < 1e-12);
        assert!((sched.lr(9) - 0.01).abs() < 1e-12);
        assert!((sched.lr(10) - 0.005).abs() < 1e-12);
        assert!((sched.lr(19) - 0.005).abs() < 1e-12);
        assert!((sched.lr(20) - 0.0025).abs() < 1e-12);
    }
}
