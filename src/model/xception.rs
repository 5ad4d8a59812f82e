//! Xception architecture for image classification
//!
//! The network follows the canonical Xception layout: an entry flow of two
//! plain convolutions and three downsampling blocks, a middle flow of
//! identity-shaped blocks, and an exit flow ending in global average
//! pooling and a linear head. All blocks are built from depthwise-separable
//! convolutions with residual 1x1 skip connections.
//!
//! The forward pass returns per-class **log-probabilities** (log-softmax
//! over the head's logits), matching the negative-log-likelihood loss used
//! by the training loop.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Linear, LinearConfig, PaddingConfig2d, Relu,
    },
    tensor::{activation::log_softmax, backend::Backend, Tensor},
};

/// Configuration for the Xception classifier
#[derive(Config, Debug)]
pub struct XceptionConfig {
    /// Number of output classes
    pub num_classes: usize,

    /// Number of input channels (3 for RGB)
    #[config(default = "3")]
    pub in_channels: usize,

    /// Number of identity-shaped blocks in the middle flow
    #[config(default = "8")]
    pub middle_blocks: usize,
}

impl XceptionConfig {
    /// Initialize the model on the given device
    pub fn init<B: Backend>(&self, device: &B::Device) -> Xception<B> {
        Xception::new(self, device)
    }
}

/// Depthwise-separable convolution: a per-channel 3x3 (or kxk) depthwise
/// convolution followed by a 1x1 pointwise convolution. Neither carries a
/// bias; batch norm follows in the enclosing block.
#[derive(Module, Debug)]
pub struct SeparableConv2d<B: Backend> {
    pub depthwise: Conv2d<B>,
    pub pointwise: Conv2d<B>,
}

impl<B: Backend> SeparableConv2d<B> {
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        device: &B::Device,
    ) -> Self {
        let pad = kernel_size / 2;
        let depthwise = Conv2dConfig::new([in_channels, in_channels], [kernel_size, kernel_size])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(pad, pad))
            .with_groups(in_channels)
            .with_bias(false)
            .init(device);

        let pointwise = Conv2dConfig::new([in_channels, out_channels], [1, 1])
            .with_bias(false)
            .init(device);

        Self {
            depthwise,
            pointwise,
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.depthwise.forward(x);
        self.pointwise.forward(x)
    }
}

/// Residual block of separable convolutions.
///
/// Each rep is ReLU -> separable conv -> batch norm, except that the first
/// ReLU is skipped when `entry_relu` is false (the very first block in the
/// entry flow). Downsampling blocks append a 3x3/2 max pool and carry a
/// strided 1x1 convolution on the skip path; identity-shaped blocks add the
/// input back directly.
#[derive(Module, Debug)]
pub struct XceptionBlock<B: Backend> {
    pub convs: Vec<SeparableConv2d<B>>,
    pub norms: Vec<BatchNorm<B, 2>>,
    pub pool: Option<MaxPool2d>,
    pub skip: Option<Conv2d<B>>,
    pub skip_norm: Option<BatchNorm<B, 2>>,
    entry_relu: bool,
}

impl<B: Backend> XceptionBlock<B> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        reps: usize,
        stride: usize,
        entry_relu: bool,
        grow_first: bool,
        device: &B::Device,
    ) -> Self {
        let mut convs = Vec::with_capacity(reps);
        let mut norms = Vec::with_capacity(reps);

        for i in 0..reps {
            let (cin, cout) = if grow_first {
                (
                    if i == 0 { in_channels } else { out_channels },
                    out_channels,
                )
            } else {
                (
                    in_channels,
                    if i == reps - 1 {
                        out_channels
                    } else {
                        in_channels
                    },
                )
            };
            convs.push(SeparableConv2d::new(cin, cout, 3, 1, device));
            norms.push(BatchNormConfig::new(cout).init(device));
        }

        let pool = if stride != 1 {
            Some(
                MaxPool2dConfig::new([3, 3])
                    .with_strides([stride, stride])
                    .with_padding(PaddingConfig2d::Explicit(1, 1))
                    .init(),
            )
        } else {
            None
        };

        let (skip, skip_norm) = if stride != 1 || in_channels != out_channels {
            let conv = Conv2dConfig::new([in_channels, out_channels], [1, 1])
                .with_stride([stride, stride])
                .with_bias(false)
                .init(device);
            let norm = BatchNormConfig::new(out_channels).init(device);
            (Some(conv), Some(norm))
        } else {
            (None, None)
        };

        Self {
            convs,
            norms,
            pool,
            skip,
            skip_norm,
            entry_relu,
        }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = input.clone();

        for (i, (conv, norm)) in self.convs.iter().zip(self.norms.iter()).enumerate() {
            if i > 0 || self.entry_relu {
                x = Relu::new().forward(x);
            }
            x = conv.forward(x);
            x = norm.forward(x);
        }

        if let Some(pool) = &self.pool {
            x = pool.forward(x);
        }

        let shortcut = match (&self.skip, &self.skip_norm) {
            (Some(conv), Some(norm)) => norm.forward(conv.forward(input)),
            _ => input,
        };

        x + shortcut
    }
}

/// Xception classifier producing per-class log-probabilities
#[derive(Module, Debug)]
pub struct Xception<B: Backend> {
    // Entry flow stem
    pub conv1: Conv2d<B>,
    pub bn1: BatchNorm<B, 2>,
    pub conv2: Conv2d<B>,
    pub bn2: BatchNorm<B, 2>,

    // Entry flow downsampling blocks
    pub entry1: XceptionBlock<B>,
    pub entry2: XceptionBlock<B>,
    pub entry3: XceptionBlock<B>,

    // Middle flow
    pub middle: Vec<XceptionBlock<B>>,

    // Exit flow
    pub exit_block: XceptionBlock<B>,
    pub sep1: SeparableConv2d<B>,
    pub exit_bn1: BatchNorm<B, 2>,
    pub sep2: SeparableConv2d<B>,
    pub exit_bn2: BatchNorm<B, 2>,

    pub global_pool: AdaptiveAvgPool2d,
    pub fc: Linear<B>,

    num_classes: usize,
}

impl<B: Backend> Xception<B> {
    /// Create a new model from configuration
    pub fn new(config: &XceptionConfig, device: &B::Device) -> Self {
        let conv1 = Conv2dConfig::new([config.in_channels, 32], [3, 3])
            .with_stride([2, 2])
            .with_bias(false)
            .init(device);
        let bn1 = BatchNormConfig::new(32).init(device);

        let conv2 = Conv2dConfig::new([32, 64], [3, 3])
            .with_bias(false)
            .init(device);
        let bn2 = BatchNormConfig::new(64).init(device);

        let entry1 = XceptionBlock::new(64, 128, 2, 2, false, true, device);
        let entry2 = XceptionBlock::new(128, 256, 2, 2, true, true, device);
        let entry3 = XceptionBlock::new(256, 728, 2, 2, true, true, device);

        let middle = (0..config.middle_blocks)
            .map(|_| XceptionBlock::new(728, 728, 3, 1, true, true, device))
            .collect();

        let exit_block = XceptionBlock::new(728, 1024, 2, 2, true, false, device);

        let sep1 = SeparableConv2d::new(1024, 1536, 3, 1, device);
        let exit_bn1 = BatchNormConfig::new(1536).init(device);
        let sep2 = SeparableConv2d::new(1536, 2048, 3, 1, device);
        let exit_bn2 = BatchNormConfig::new(2048).init(device);

        let global_pool = AdaptiveAvgPool2dConfig::new([1, 1]).init();
        let fc = LinearConfig::new(2048, config.num_classes).init(device);

        Self {
            conv1,
            bn1,
            conv2,
            bn2,
            entry1,
            entry2,
            entry3,
            middle,
            exit_block,
            sep1,
            exit_bn1,
            sep2,
            exit_bn2,
            global_pool,
            fc,
            num_classes: config.num_classes,
        }
    }

    /// Forward pass.
    ///
    /// # Arguments
    /// * `x` - Input tensor of shape [batch_size, channels, height, width]
    ///
    /// # Returns
    /// * Log-probabilities of shape [batch_size, num_classes]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(x);
        let x = self.bn1.forward(x);
        let x = Relu::new().forward(x);

        let x = self.conv2.forward(x);
        let x = self.bn2.forward(x);
        let x = Relu::new().forward(x);

        let x = self.entry1.forward(x);
        let x = self.entry2.forward(x);
        let x = self.entry3.forward(x);

        let mut x = x;
        for block in &self.middle {
            x = block.forward(x);
        }

        let x = self.exit_block.forward(x);

        let x = self.sep1.forward(x);
        let x = self.exit_bn1.forward(x);
        let x = Relu::new().forward(x);

        let x = self.sep2.forward(x);
        let x = self.exit_bn2.forward(x);
        let x = Relu::new().forward(x);

        // [B, C, H, W] -> [B, C, 1, 1] -> [B, C]
        let x = self.global_pool.forward(x);
        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        let logits = self.fc.forward(x);
        log_softmax(logits, 1)
    }

    /// Number of output classes
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}
