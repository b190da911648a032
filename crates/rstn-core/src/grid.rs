//! Normalized sampling grid generation.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::error::{Result, TransformError};

/// Build the normalized homogeneous sampling grid for an output resolution.
///
/// Returns a tensor of shape `[batch, 3, height * width]` whose rows hold the
/// x coordinates, y coordinates, and a constant row of ones. Coordinates are
/// evenly spaced over `[-1, 1]`, with x varying fastest across a row
/// (`n = y * width + x`). Every batch slice is identical.
///
/// The output is a pure function of `(width, height, batch)` and is safe to
/// cache; see [`crate::SpatialTransformer`].
///
/// # Arguments
/// * `width` - Output width in pixels (must be positive)
/// * `height` - Output height in pixels (must be positive)
/// * `batch` - Batch size to replicate across (must be positive)
/// * `device` - The device to create the tensor on
pub fn sampling_grid<B: Backend>(
    width: usize,
    height: usize,
    batch: usize,
    device: &B::Device,
) -> Result<Tensor<B, 3>> {
    if width == 0 || height == 0 || batch == 0 {
        return Err(TransformError::invalid_dimension(format!(
            "grid dimensions must be positive, got {}x{} with batch {}",
            width, height, batch
        )));
    }

    let n = height * width;

    // x varies fastest across a row, y advances per row
    let xs = linspace::<B>(width, device)
        .reshape([1, 1, width])
        .repeat(&[1, height, 1])
        .reshape([1, n]);
    let ys = linspace::<B>(height, device)
        .reshape([1, height, 1])
        .repeat(&[1, 1, width])
        .reshape([1, n]);

    // Homogeneous row of ones so translation survives the matrix product
    let ones = Tensor::ones([1, n], device);

    let grid = Tensor::cat(vec![xs, ys, ones], 0);

    Ok(grid.unsqueeze::<3>().repeat(&[batch, 1, 1]))
}

/// `count` evenly spaced values over `[-1, 1]`. A single sample maps to -1.
fn linspace<B: Backend>(count: usize, device: &B::Device) -> Tensor<B, 1> {
    let step = if count > 1 {
        2.0 / (count as f32 - 1.0)
    } else {
        0.0
    };

    Tensor::arange(0..count as i64, device)
        .float()
        .mul_scalar(step)
        .sub_scalar(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_grid_shape() {
        let device = Default::default();
        let grid = sampling_grid::<TestBackend>(4, 3, 2, &device).unwrap();
        assert_eq!(grid.dims(), [2, 3, 12]);
    }

    #[test]
    fn test_grid_rejects_zero_dimensions() {
        let device = Default::default();
        assert!(sampling_grid::<TestBackend>(0, 3, 1, &device).is_err());
        assert!(sampling_grid::<TestBackend>(4, 0, 1, &device).is_err());
        assert!(sampling_grid::<TestBackend>(4, 3, 0, &device).is_err());
    }

    #[test]
    fn test_grid_corners_and_ordering() {
        let device = Default::default();
        let grid = sampling_grid::<TestBackend>(3, 2, 1, &device).unwrap();
        let data = grid.into_data();
        let values = data.as_slice::<f32>().unwrap();

        // Rows are [x; y; ones], each of length 6, flattened with x fastest.
        let x = &values[0..6];
        let y = &values[6..12];
        let ones = &values[12..18];

        assert_eq!(x, &[-1.0, 0.0, 1.0, -1.0, 0.0, 1.0]);
        assert_eq!(y, &[-1.0, -1.0, -1.0, 1.0, 1.0, 1.0]);
        assert!(ones.iter().all(|v| *v == 1.0));
    }

    #[test]
    fn test_grid_single_sample_axis() {
        let device = Default::default();
        let grid = sampling_grid::<TestBackend>(1, 2, 1, &device).unwrap();
        let data = grid.into_data();
        let values = data.as_slice::<f32>().unwrap();

        // width == 1 yields the interval start, not a division by zero
        assert_eq!(values[0], -1.0);
        assert_eq!(values[1], -1.0);
        assert!(values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_grid_batch_replication() {
        let device = Default::default();
        let grid = sampling_grid::<TestBackend>(4, 4, 3, &device).unwrap();
        let data = grid.into_data();
        let values = data.as_slice::<f32>().unwrap();

        let per_batch = 3 * 16;
        for b in 1..3 {
            assert_eq!(values[..per_batch], values[b * per_batch..(b + 1) * per_batch]);
        }
    }
}
