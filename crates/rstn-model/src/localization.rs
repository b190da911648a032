use burn::{
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        BatchNorm, BatchNormConfig, Linear, LinearConfig, PaddingConfig2d, Relu,
    },
    tensor::{backend::Backend, Tensor},
};

/// Regresses the 6 affine parameters `[a, b, c, d, tx, ty]` from an image.
#[derive(Module, Debug)]
pub struct LocalizationNetwork<B: Backend> {
    conv1: Conv2d<B>,
    bn1: BatchNorm<B, 2>,
    conv2: Conv2d<B>,
    bn2: BatchNorm<B, 2>,
    conv3: Conv2d<B>,
    bn3: BatchNorm<B, 2>,
    fc: Linear<B>,
    activation: Relu,
}

#[derive(Debug, Clone)]
pub struct LocalizationConfig {
    pub in_channels: usize,
    pub channels: Vec<usize>,
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            in_channels: 1,
            channels: vec![16, 32, 64],
        }
    }
}

impl LocalizationConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> LocalizationNetwork<B> {
        let activation = Relu::new();

        let conv1 = Conv2dConfig::new([self.in_channels, self.channels[0]], [3, 3])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let bn1 = BatchNormConfig::new(self.channels[0]).init(device);

        let conv2 = Conv2dConfig::new([self.channels[0], self.channels[1]], [3, 3])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let bn2 = BatchNormConfig::new(self.channels[1]).init(device);

        let conv3 = Conv2dConfig::new([self.channels[1], self.channels[2]], [3, 3])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let bn3 = BatchNormConfig::new(self.channels[2]).init(device);

        // The head regresses a residual on top of the identity transform, so
        // an untrained network starts from the identity warp.
        let fc = LinearConfig::new(self.channels[2], 6).init(device);

        LocalizationNetwork {
            conv1,
            bn1,
            conv2,
            bn2,
            conv3,
            bn3,
            fc,
            activation,
        }
    }
}

impl<B: Backend> LocalizationNetwork<B> {
    /// Input `[B, C, H, W]`, output `[B, 6]`.
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(x);
        let x = self.bn1.forward(x);
        let x = self.activation.forward(x);

        let x = self.conv2.forward(x);
        let x = self.bn2.forward(x);
        let x = self.activation.forward(x);

        let x = self.conv3.forward(x);
        let x = self.bn3.forward(x);
        let x = self.activation.forward(x);

        // Global average pooling: [B, C, H, W] -> [B, C]
        let x = x.flatten::<3>(2, 3);
        let x = x.mean_dim(2);
        let x = x.squeeze::<2>(2);

        let x = self.fc.forward(x);

        let batch_size = x.shape().dims[0];
        let identity =
            Tensor::<B, 1>::from_floats([1.0, 0.0, 0.0, 1.0, 0.0, 0.0], &x.device())
                .reshape([1, 6]);

        x + identity.repeat(&[batch_size, 1])
    }
}
