//! Per-epoch training and evaluation loops.
//!
//! The model outputs log-probabilities, so the loss is a plain negative
//! log-likelihood: gather the log-probability of the target class and
//! negate. Training uses the batch mean; evaluation sums per-sample losses
//! across the whole set and divides by the number of samples.

use burn::{
    optim::{GradientsParams, Optimizer},
    tensor::{backend::AutodiffBackend, backend::Backend, ElementConversion, Int, Tensor},
};
use tracing::debug;

use crate::dataset::ClassifierBatch;
use crate::model::Xception;

/// Per-sample negative log-likelihood from log-probabilities
fn per_sample_nll<B: Backend>(
    log_probs: Tensor<B, 2>,
    targets: Tensor<B, 1, Int>,
) -> Tensor<B, 1> {
    let indices = targets.unsqueeze_dim::<2>(1);
    log_probs.gather(1, indices).squeeze::<1>(1).neg()
}

/// Mean negative log-likelihood over a batch
pub fn nll_loss<B: Backend>(log_probs: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> Tensor<B, 1> {
    per_sample_nll(log_probs, targets).mean()
}

/// Summed negative log-likelihood over a batch
pub fn nll_loss_sum<B: Backend>(
    log_probs: Tensor<B, 2>,
    targets: Tensor<B, 1, Int>,
) -> Tensor<B, 1> {
    per_sample_nll(log_probs, targets).sum()
}

/// Number of samples whose argmax prediction matches the target
pub fn count_correct<B: Backend>(log_probs: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> i64 {
    let predictions = log_probs.argmax(1).squeeze::<1>(1);
    predictions
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>()
}

/// Results of an evaluation pass
#[derive(Debug, Clone, PartialEq)]
pub struct EvalReport {
    /// Number of samples evaluated
    pub total: usize,
    /// Number of correctly classified samples
    pub correct: usize,
    /// Summed per-sample loss divided by `total`
    pub avg_loss: f64,
}

impl EvalReport {
    /// Accuracy as a percentage in [0, 100]
    pub fn accuracy_pct(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * self.correct as f64 / self.total as f64
        }
    }
}

/// Train the model for one epoch, stepping the optimizer after each batch.
///
/// Progress is printed every tenth batch in the form
/// `Train Epoch: N [done/total (pct%)]  Loss: ...` and the loss of the last
/// batch is returned alongside the updated model.
pub fn train_epoch<B, O>(
    mut model: Xception<B>,
    optimizer: &mut O,
    lr: f64,
    batches: impl Iterator<Item = ClassifierBatch<B>>,
    epoch: usize,
    total_samples: usize,
    num_batches: usize,
) -> (Xception<B>, f64)
where
    B: AutodiffBackend,
    O: Optimizer<Xception<B>, B>,
{
    let mut last_loss = 0.0;

    for (batch_idx, batch) in batches.enumerate() {
        let batch_len = batch.images.dims()[0];

        let output = model.forward(batch.images);
        let loss = nll_loss(output, batch.targets);
        last_loss = loss.clone().into_scalar().elem::<f64>();

        let grads = GradientsParams::from_grads(loss.backward(), &model);
        model = optimizer.step(lr, model, grads);

        if batch_idx % 10 == 0 {
            let samples_done = batch_idx * batch_len;
            let percent = if num_batches == 0 {
                0.0
            } else {
                100.0 * batch_idx as f64 / num_batches as f64
            };
            println!(
                "Train Epoch: {} [{}/{} ({:.0}%)]\tLoss: {:.6}",
                epoch, samples_done, total_samples, percent, last_loss
            );
        }
        debug!(batch = batch_idx, loss = last_loss, "training batch done");
    }

    (model, last_loss)
}

/// Evaluate the model over the given batches and print a summary line.
///
/// `model` should be the inference-mode counterpart of the training model
/// (obtained via `AutodiffModule::valid`); no gradients are tracked here.
pub fn evaluate<B: Backend>(
    model: &Xception<B>,
    batches: impl Iterator<Item = ClassifierBatch<B>>,
) -> EvalReport {
    let mut total = 0usize;
    let mut correct = 0usize;
    let mut loss_sum = 0.0f64;

    for batch in batches {
        let batch_len = batch.images.dims()[0];
        let output = model.forward(batch.images);

        loss_sum += nll_loss_sum(output.clone(), batch.targets.clone())
            .into_scalar()
            .elem::<f64>();
        correct += count_correct(output, batch.targets) as usize;
        total += batch_len;
    }

    let avg_loss = if total == 0 { 0.0 } else { loss_sum / total as f64 };
    let report = EvalReport {
        total,
        correct,
        avg_loss,
    };

    println!();
    println!(
        "Test set: Average loss: {:.4}, Accuracy: {}/{} ({:.0}%)",
        report.avg_loss,
        report.correct,
        report.total,
        report.accuracy_pct()
    );
    println!();

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{
        backend::{Autodiff, NdArray},
        module::AutodiffModule,
        optim::AdamConfig,
        tensor::{Distribution, TensorData},
    };

    use crate::model::XceptionConfig;

    type TestBackend = NdArray;
    type TestAutodiff = Autodiff<NdArray>;

    fn tiny_model<B: Backend>(device: &B::Device) -> Xception<B> {
        XceptionConfig::new(2).with_middle_blocks(1).init(device)
    }

    fn random_batch<B: Backend>(
        batch_size: usize,
        device: &B::Device,
    ) -> ClassifierBatch<B> {
        let images = Tensor::<B, 4>::random(
            [batch_size, 3, 32, 32],
            Distribution::Uniform(-1.0, 1.0),
            device,
        );
        let labels: Vec<i64> = (0..batch_size).map(|i| (i % 2) as i64).collect();
        let targets = Tensor::<B, 1, Int>::from_data(
            TensorData::new(labels, [batch_size]),
            device,
        );
        ClassifierBatch { images, targets }
    }

    fn fc_weights<B: Backend>(model: &Xception<B>) -> Vec<f32> {
        model
            .fc
            .weight
            .val()
            .into_data()
            .to_vec::<f32>()
            .unwrap()
    }

    #[test]
    fn test_train_epoch_updates_weights() {
        let device = Default::default();
        let model = tiny_model::<TestAutodiff>(&device);
        let mut optimizer = AdamConfig::new().init();

        let before = fc_weights(&model);
        let batch = random_batch::<TestAutodiff>(2, &device);
        let (model, loss) =
            train_epoch(model, &mut optimizer, 1e-3, vec![batch].into_iter(), 0, 2, 1);
        let after = fc_weights(&model);

        assert!(loss.is_finite());
        assert_ne!(before, after);
    }

    #[test]
    fn test_evaluate_leaves_weights_unchanged() {
        let device = Default::default();
        let model = tiny_model::<TestAutodiff>(&device);
        let before = fc_weights(&model);

        let eval_model = model.valid();
        let batch = random_batch::<TestBackend>(3, &device);
        evaluate(&eval_model, vec![batch].into_iter());

        let after = fc_weights(&model);
        assert_eq!(before, after);
    }

    #[test]
    fn test_evaluate_counts_all_samples() {
        let device = Default::default();
        let model = tiny_model::<TestBackend>(&device);

        let batches = vec![
            random_batch::<TestBackend>(2, &device),
            random_batch::<TestBackend>(3, &device),
        ];
        let report = evaluate(&model, batches.into_iter());

        assert_eq!(report.total, 5);
        assert!(report.correct <= report.total);
        assert!(report.avg_loss.is_finite());
    }

    #[test]
    fn test_nll_loss_matches_hand_computation() {
        let device = Default::default();
        // log-probs for two samples over two classes
        let log_probs = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(
                vec![-0.1f32, -2.5, -3.0, -0.05],
                [2, 2],
            ),
            &device,
        );
        let targets = Tensor::<TestBackend, 1, Int>::from_data(
            TensorData::new(vec![0i64, 1], [2]),
            &device,
        );

        let mean: f32 = nll_loss(log_probs.clone(), targets.clone()).into_scalar();
        let sum: f32 = nll_loss_sum(log_probs, targets).into_scalar();

        assert!((mean - 0.075).abs() < 1e-5);
        assert!((sum - 0.15).abs() < 1e-5);
    }

    #[test]
    fn test_count_correct() {
        let device = Default::default();
        let log_probs = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(
                vec![-0.1f32, -2.5, -3.0, -0.05, -0.2, -1.8],
                [3, 2],
            ),
            &device,
        );
        let targets = Tensor::<TestBackend, 1, Int>::from_data(
            TensorData::new(vec![0i64, 1, 1], [3]),
            &device,
        );

        assert_eq!(count_correct(log_probs, targets), 2);
    }

    #[test]
    fn test_uniform_predictions_break_ties_deterministically() {
        let device = Default::default();
        // uniform log-probs over two classes: argmax resolves to index 0
        let uniform = (0.5f32).ln();
        let log_probs = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![uniform; 8], [4, 2]),
            &device,
        );
        let targets = Tensor::<TestBackend, 1, Int>::from_data(
            TensorData::new(vec![0i64, 1, 0, 1], [4]),
            &device,
        );

        let first = count_correct(log_probs.clone(), targets.clone());
        let second = count_correct(log_probs, targets);

        assert_eq!(first, 2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_eval_report_accuracy() {
        let report = EvalReport {
            total: 8,
            correct: 6,
            avg_loss: 0.3,
        };
        assert!((report.accuracy_pct() - 75.0).abs() < 1e-9);

        let empty = EvalReport {
            total: 0,
            correct: 0,
            avg_loss: 0.0,
        };
        assert_eq!(empty.accuracy_pct(), 0.0);
    }
}
