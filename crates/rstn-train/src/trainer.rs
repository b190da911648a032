//! Cross-entropy training loop for the spatial transformer classifier.

use anyhow::Result;
use burn::{
    data::{dataloader::DataLoaderBuilder, dataset::vision::MnistDataset},
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::{backend::AutodiffBackend, ElementConversion},
};
use rstn_core::SpatialTransformerConfig;
use rstn_model::{StnClassifier, StnClassifierConfig};

use crate::data::MnistBatcher;
use crate::metric::{accuracy, RunningAverage};
use crate::progress::{EarlyStoppingCallback, ProgressInfo, ProgressTracker};

#[derive(Config)]
pub struct TrainingConfig {
    pub optimizer: AdamConfig,
    #[config(default = 4)]
    pub num_epochs: usize,
    #[config(default = 64)]
    pub batch_size: usize,
    #[config(default = 4)]
    pub num_workers: usize,
    #[config(default = 42)]
    pub seed: u64,
    #[config(default = 1.0e-3)]
    pub learning_rate: f64,
}

/// Train an [`StnClassifier`] on MNIST.
///
/// The spatial transformer engines (one for the autodiff backend, one for the
/// validation backend) are owned here, so the sampling grid is built once per
/// backend and reused for the entire run.
pub fn train<B: AutodiffBackend>(
    config: &TrainingConfig,
    device: B::Device,
    tracker: &ProgressTracker,
    early_stopping: Option<&EarlyStoppingCallback>,
) -> Result<StnClassifier<B>> {
    tracker.start();

    match train_loop::<B>(config, device, tracker, early_stopping) {
        Ok((model, info)) => {
            tracker.complete(&info);
            Ok(model)
        }
        Err(err) => {
            tracker.error(&err.to_string());
            Err(err)
        }
    }
}

fn train_loop<B: AutodiffBackend>(
    config: &TrainingConfig,
    device: B::Device,
    tracker: &ProgressTracker,
    early_stopping: Option<&EarlyStoppingCallback>,
) -> Result<(StnClassifier<B>, ProgressInfo)> {
    B::seed(config.seed);

    let mut model: StnClassifier<B> = StnClassifierConfig::default().init(&device);
    let stn = SpatialTransformerConfig::new(28, 28).init::<B>(&device);
    let stn_valid = SpatialTransformerConfig::new(28, 28).init::<B::InnerBackend>(&device);

    let mut optimizer = config.optimizer.init();
    let loss_fn = CrossEntropyLossConfig::new().init(&device);

    let dataloader_train = DataLoaderBuilder::new(MnistBatcher::<B>::new(device.clone()))
        .batch_size(config.batch_size)
        .shuffle(config.seed)
        .num_workers(config.num_workers)
        .build(MnistDataset::train());

    let dataloader_valid =
        DataLoaderBuilder::new(MnistBatcher::<B::InnerBackend>::new(device.clone()))
            .batch_size(config.batch_size)
            .num_workers(config.num_workers)
            .build(MnistDataset::test());

    let mut last_info = ProgressInfo {
        epoch: 0,
        total_epochs: config.num_epochs,
        iteration: 0,
        loss: f64::NAN,
        accuracy: None,
        elapsed: tracker.elapsed(),
    };

    for epoch in 1..=config.num_epochs {
        let mut epoch_loss = RunningAverage::new();

        for (iteration, batch) in dataloader_train.iter().enumerate() {
            let output = model.forward(batch.images, &stn)?;
            let loss = loss_fn.forward(output.logits, batch.targets);

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(config.learning_rate, model, grads);

            let loss_value = loss.into_scalar().elem::<f64>();
            epoch_loss.update(loss_value);

            tracker.iteration(&ProgressInfo {
                epoch,
                total_epochs: config.num_epochs,
                iteration,
                loss: loss_value,
                accuracy: None,
                elapsed: tracker.elapsed(),
            });
        }

        // Validation pass on the inner backend
        let model_valid = model.valid();
        let mut valid_accuracy = RunningAverage::new();

        for batch in dataloader_valid.iter() {
            let output = model_valid.forward(batch.images, &stn_valid)?;
            valid_accuracy.update(accuracy(output.logits, batch.targets));
        }

        last_info = ProgressInfo {
            epoch,
            total_epochs: config.num_epochs,
            iteration: 0,
            loss: epoch_loss.value(),
            accuracy: Some(valid_accuracy.value()),
            elapsed: tracker.elapsed(),
        };
        tracker.epoch(&last_info);

        if early_stopping.is_some_and(|cb| cb.should_stop()) {
            tracing::info!("Stopping at epoch {} on early-stopping request", epoch);
            break;
        }
    }

    Ok((model, last_info))
}
