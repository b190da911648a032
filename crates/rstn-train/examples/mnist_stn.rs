use std::sync::Arc;

use burn::backend::Autodiff;
use burn::optim::AdamConfig;
use burn_ndarray::{NdArray, NdArrayDevice};
use rstn_train::{
    train, ConsoleProgressCallback, EarlyStoppingCallback, HistoryCallback, ProgressTracker,
    TrainingConfig,
};

type TrainBackend = Autodiff<NdArray<f32>>;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    println!("Training the spatial transformer classifier on MNIST...");

    let config = TrainingConfig::new(AdamConfig::new()).with_num_epochs(2);
    let device = NdArrayDevice::default();

    let history = Arc::new(HistoryCallback::new());
    let early_stopping = Arc::new(EarlyStoppingCallback::new(1e-3, 3));

    let mut tracker = ProgressTracker::new();
    tracker.add_callback(Arc::new(ConsoleProgressCallback::default()));
    tracker.add_callback(history.clone());
    tracker.add_callback(early_stopping.clone());

    let _model = train::<TrainBackend>(&config, device, &tracker, Some(early_stopping.as_ref()))?;

    for info in history.history() {
        println!(
            "Epoch {}: loss {:.4}, valid accuracy {:.2}%",
            info.epoch,
            info.loss,
            info.accuracy.unwrap_or(0.0) * 100.0,
        );
    }

    println!("Done.");
    Ok(())
}
