use burn::{
    module::Module,
    tensor::{backend::Backend, Tensor},
};
use rstn_core::{Result, SpatialTransformer};

use crate::classifier::{ClassifierConfig, ClassifierNetwork};
use crate::localization::{LocalizationConfig, LocalizationNetwork};

/// Spatial transformer classifier: localization -> warp -> classifier.
///
/// The module owns only trainable parameters. The [`SpatialTransformer`]
/// engine (which carries the memoized sampling grid) is owned by the caller
/// and passed into `forward`, so the same trained module can be driven
/// against transformers of different output resolutions or devices.
#[derive(Module, Debug)]
pub struct StnClassifier<B: Backend> {
    localization: LocalizationNetwork<B>,
    classifier: ClassifierNetwork<B>,
}

#[derive(Debug, Clone, Default)]
pub struct StnClassifierConfig {
    pub localization: LocalizationConfig,
    pub classifier: ClassifierConfig,
}

impl StnClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> StnClassifier<B> {
        StnClassifier {
            localization: self.localization.init(device),
            classifier: self.classifier.init(device),
        }
    }
}

/// Everything a forward pass produces; the warp and thetas are kept for
/// inspection and visualization.
#[derive(Debug, Clone)]
pub struct StnOutput<B: Backend> {
    pub thetas: Tensor<B, 2>,
    pub warped: Tensor<B, 4>,
    pub logits: Tensor<B, 2>,
}

impl<B: Backend> StnClassifier<B> {
    /// Classify `images`, warping them through `transformer` first.
    pub fn forward(
        &self,
        images: Tensor<B, 4>,
        transformer: &SpatialTransformer<B>,
    ) -> Result<StnOutput<B>> {
        let thetas = self.localization.forward(images.clone());
        let warped = transformer.warp(images, thetas.clone())?;
        let logits = self.classifier.forward(warped.clone());

        Ok(StnOutput {
            thetas,
            warped,
            logits,
        })
    }
}
