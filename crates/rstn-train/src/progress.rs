//! Progress reporting for training runs.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Snapshot of training state handed to callbacks.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Current epoch (1-based).
    pub epoch: usize,
    /// Total number of epochs.
    pub total_epochs: usize,
    /// Iteration within the current epoch.
    pub iteration: usize,
    /// Most recent training loss.
    pub loss: f64,
    /// Validation accuracy, present after an epoch completes.
    pub accuracy: Option<f64>,
    /// Time elapsed since training started.
    pub elapsed: Duration,
}

impl ProgressInfo {
    pub fn progress_percent(&self) -> f64 {
        (self.epoch as f64 / self.total_epochs as f64) * 100.0
    }
}

/// Callback trait for observing a training run.
pub trait ProgressCallback: Send + Sync {
    /// Called at each logged training iteration.
    fn on_iteration(&self, info: &ProgressInfo);

    /// Called after each epoch's validation pass.
    fn on_epoch(&self, _info: &ProgressInfo) {}

    /// Called when training starts.
    fn on_start(&self) {}

    /// Called when training finishes.
    fn on_complete(&self, _info: &ProgressInfo) {}

    /// Called when training fails.
    fn on_error(&self, _error: &str) {}
}

/// Logs progress through `tracing`.
#[derive(Debug, Clone)]
pub struct ConsoleProgressCallback {
    /// Iterations between log lines.
    pub log_interval: usize,
}

impl Default for ConsoleProgressCallback {
    fn default() -> Self {
        Self { log_interval: 50 }
    }
}

impl ConsoleProgressCallback {
    pub fn new(log_interval: usize) -> Self {
        Self { log_interval }
    }
}

impl ProgressCallback for ConsoleProgressCallback {
    fn on_iteration(&self, info: &ProgressInfo) {
        if info.iteration % self.log_interval == 0 {
            tracing::info!(
                "Epoch {}/{} | Iter {} | Loss: {:.6} | Elapsed: {:.1}s",
                info.epoch,
                info.total_epochs,
                info.iteration,
                info.loss,
                info.elapsed.as_secs_f64(),
            );
        }
    }

    fn on_epoch(&self, info: &ProgressInfo) {
        tracing::info!(
            "Epoch {}/{} done ({:.0}%) | Loss: {:.6} | Valid accuracy: {}",
            info.epoch,
            info.total_epochs,
            info.progress_percent(),
            info.loss,
            info.accuracy
                .map(|a| format!("{:.2}%", a * 100.0))
                .unwrap_or_else(|| "n/a".to_string()),
        );
    }

    fn on_start(&self) {
        tracing::info!("Training started");
    }

    fn on_complete(&self, info: &ProgressInfo) {
        tracing::info!(
            "Training completed in {:.1}s with final loss {:.6}",
            info.elapsed.as_secs_f64(),
            info.loss
        );
    }

    fn on_error(&self, error: &str) {
        tracing::error!("Training failed: {}", error);
    }
}

/// Records every epoch snapshot for later inspection.
#[derive(Debug, Clone, Default)]
pub struct HistoryCallback {
    history: Arc<Mutex<Vec<ProgressInfo>>>,
}

impl HistoryCallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<ProgressInfo> {
        self.history.lock().expect("history lock").clone()
    }
}

impl ProgressCallback for HistoryCallback {
    fn on_iteration(&self, _info: &ProgressInfo) {}

    fn on_epoch(&self, info: &ProgressInfo) {
        self.history.lock().expect("history lock").push(info.clone());
    }
}

/// Stops training when the epoch loss stops improving.
#[derive(Debug, Clone)]
pub struct EarlyStoppingCallback {
    /// Minimum loss decrease that counts as an improvement.
    pub min_improvement: f64,
    /// Epochs to wait for an improvement before stopping.
    pub patience: usize,
    stalled: Arc<Mutex<usize>>,
    best_loss: Arc<Mutex<f64>>,
    should_stop: Arc<Mutex<bool>>,
}

impl EarlyStoppingCallback {
    pub fn new(min_improvement: f64, patience: usize) -> Self {
        Self {
            min_improvement,
            patience,
            stalled: Arc::new(Mutex::new(0)),
            best_loss: Arc::new(Mutex::new(f64::INFINITY)),
            should_stop: Arc::new(Mutex::new(false)),
        }
    }

    pub fn should_stop(&self) -> bool {
        *self.should_stop.lock().expect("early stopping lock")
    }
}

impl ProgressCallback for EarlyStoppingCallback {
    fn on_iteration(&self, _info: &ProgressInfo) {}

    fn on_epoch(&self, info: &ProgressInfo) {
        let mut best_loss = self.best_loss.lock().expect("early stopping lock");
        let mut stalled = self.stalled.lock().expect("early stopping lock");

        if *best_loss - info.loss > self.min_improvement {
            *best_loss = info.loss;
            *stalled = 0;
            return;
        }

        *stalled += 1;
        if *stalled >= self.patience {
            *self.should_stop.lock().expect("early stopping lock") = true;
            tracing::info!(
                "Early stopping after {} stalled epochs (best loss {:.6})",
                self.patience,
                *best_loss
            );
        }
    }
}

/// Fans progress out to a set of callbacks and keeps the shared clock.
#[derive(Clone, Default)]
pub struct ProgressTracker {
    callbacks: Vec<Arc<dyn ProgressCallback>>,
    started: Arc<Mutex<Option<Instant>>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_callback(&mut self, callback: Arc<dyn ProgressCallback>) {
        self.callbacks.push(callback);
    }

    pub fn start(&self) {
        *self.started.lock().expect("tracker lock") = Some(Instant::now());
        for callback in &self.callbacks {
            callback.on_start();
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started
            .lock()
            .expect("tracker lock")
            .map(|t| t.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    pub fn iteration(&self, info: &ProgressInfo) {
        for callback in &self.callbacks {
            callback.on_iteration(info);
        }
    }

    pub fn epoch(&self, info: &ProgressInfo) {
        for callback in &self.callbacks {
            callback.on_epoch(info);
        }
    }

    pub fn complete(&self, info: &ProgressInfo) {
        for callback in &self.callbacks {
            callback.on_complete(info);
        }
    }

    pub fn error(&self, error: &str) {
        for callback in &self.callbacks {
            callback.on_error(error);
        }
    }
}
