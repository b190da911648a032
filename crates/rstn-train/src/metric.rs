use burn::tensor::{backend::Backend, ElementConversion, Int, Tensor};

/// Fraction of rows whose argmax matches the target, in `[0, 1]`.
pub fn accuracy<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> f64 {
    let [batch, _classes] = logits.dims();

    let predictions = logits.argmax(1).reshape([batch]);
    let correct = predictions
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<f64>();

    correct / batch as f64
}

/// Running average over loss or metric values within an epoch.
#[derive(Debug, Clone, Default)]
pub struct RunningAverage {
    sum: f64,
    count: usize,
}

impl RunningAverage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn value(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    pub fn reset(&mut self) {
        self.sum = 0.0;
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::TensorData;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_accuracy() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 2>::from_data(
            TensorData::from([[0.1, 0.9], [0.8, 0.2], [0.3, 0.7]]),
            &device,
        );
        let targets =
            Tensor::<TestBackend, 1, Int>::from_data(TensorData::from([1i64, 0, 0]), &device);

        let acc = accuracy(logits, targets);
        assert!((acc - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_running_average() {
        let mut avg = RunningAverage::new();
        assert_eq!(avg.value(), 0.0);

        avg.update(1.0);
        avg.update(3.0);
        assert_eq!(avg.value(), 2.0);

        avg.reset();
        assert_eq!(avg.value(), 0.0);
    }
}
