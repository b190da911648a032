pub mod data;
pub mod metric;
pub mod progress;
pub mod trainer;

pub use data::{MnistBatch, MnistBatcher};
pub use metric::{accuracy, RunningAverage};
pub use progress::{
    ConsoleProgressCallback, EarlyStoppingCallback, HistoryCallback, ProgressCallback,
    ProgressInfo, ProgressTracker,
};
pub use trainer::{train, TrainingConfig};
