//! Spatial transformer composition: cached grid + affine generator + sampler.

use std::sync::Mutex;

use burn::prelude::*;

use crate::affine::affine_grid;
use crate::error::TransformError;
use crate::grid::sampling_grid;
use crate::sampler::{grid_sample, PaddingMode};

/// Configuration for a [`SpatialTransformer`].
#[derive(Config, Debug)]
pub struct SpatialTransformerConfig {
    /// Output height of the warped batch.
    pub output_height: usize,
    /// Output width of the warped batch.
    pub output_width: usize,
    /// Boundary policy for out-of-range samples.
    #[config(default = "PaddingMode::Zeros")]
    pub padding: PaddingMode,
}

impl SpatialTransformerConfig {
    /// Initialize a transformer on the given device.
    pub fn init<B: Backend>(&self, device: &B::Device) -> SpatialTransformer<B> {
        SpatialTransformer {
            config: self.clone(),
            device: device.clone(),
            grid: Mutex::new(None),
        }
    }
}

#[derive(Debug, Clone)]
struct GridCache<B: Backend> {
    batch: usize,
    grid: Tensor<B, 3>,
}

/// Warps an image batch with per-batch affine parameters.
///
/// The normalized sampling grid is a pure function of the configured output
/// resolution and the batch size, so it is computed once and reused until the
/// batch size changes. Everything else is stateless; the transformer is safe
/// to call repeatedly with varying parameters.
#[derive(Debug)]
pub struct SpatialTransformer<B: Backend> {
    config: SpatialTransformerConfig,
    device: B::Device,
    grid: Mutex<Option<GridCache<B>>>,
}

impl<B: Backend> SpatialTransformer<B> {
    /// The configuration this transformer was built from.
    pub fn config(&self) -> &SpatialTransformerConfig {
        &self.config
    }

    /// Warp `images` with `thetas`.
    ///
    /// # Arguments
    /// * `images` - Source batch `[B, C, Hin, Win]`
    /// * `thetas` - Affine parameters `[B, 6]` as `[a, b, c, d, tx, ty]`
    ///
    /// # Returns
    /// Warped batch `[B, C, output_height, output_width]`.
    pub fn warp(&self, images: Tensor<B, 4>, thetas: Tensor<B, 2>) -> crate::error::Result<Tensor<B, 4>> {
        let [batch, _channels, _h, _w] = images.dims();
        let [theta_batch, params] = thetas.dims();

        if batch != theta_batch {
            return Err(TransformError::shape_mismatch(
                [batch, 6],
                [theta_batch, params],
            ));
        }

        let grid = self.grid_for(batch)?;
        let coords = affine_grid(
            grid,
            thetas,
            self.config.output_height,
            self.config.output_width,
        )?;

        grid_sample(images, coords, self.config.padding)
    }

    /// Fetch the cached grid for `batch`, building it on first use or when
    /// the batch size changes. Write-once-then-read per batch size; the
    /// cached tensor is immutable after publication.
    fn grid_for(&self, batch: usize) -> crate::error::Result<Tensor<B, 3>> {
        let mut cache = match self.grid.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(entry) = cache.as_ref() {
            if entry.batch == batch {
                return Ok(entry.grid.clone());
            }
        }

        let grid = sampling_grid::<B>(
            self.config.output_width,
            self.config.output_height,
            batch,
            &self.device,
        )?;

        *cache = Some(GridCache {
            batch,
            grid: grid.clone(),
        });

        Ok(grid)
    }
}

impl<B: Backend> Clone for SpatialTransformer<B> {
    fn clone(&self) -> Self {
        let cache = match self.grid.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };

        Self {
            config: self.config.clone(),
            device: self.device.clone(),
            grid: Mutex::new(cache),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::TensorData;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn identity_thetas(batch: usize) -> Tensor<TestBackend, 2> {
        let device = Default::default();
        Tensor::<TestBackend, 1>::from_floats([1.0, 0.0, 0.0, 1.0, 0.0, 0.0], &device)
            .reshape([1, 6])
            .repeat(&[batch, 1])
    }

    #[test]
    fn test_warp_identity_preserves_image() {
        let device = Default::default();
        let stn = SpatialTransformerConfig::new(4, 4).init::<TestBackend>(&device);

        let images = Tensor::<TestBackend, 4>::random(
            [2, 1, 4, 4],
            burn::tensor::Distribution::Default,
            &device,
        );

        let warped = stn.warp(images.clone(), identity_thetas(2)).unwrap();
        let diff = (warped - images).abs().max().into_scalar();
        assert!(diff < 1e-5);
    }

    #[test]
    fn test_warp_rejects_batch_mismatch() {
        let device = Default::default();
        let stn = SpatialTransformerConfig::new(4, 4).init::<TestBackend>(&device);

        let images = Tensor::<TestBackend, 4>::zeros([3, 1, 4, 4], &device);
        let result = stn.warp(images, identity_thetas(2));
        assert!(matches!(result, Err(TransformError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_grid_cache_tracks_batch_size() {
        let device = Default::default();
        let stn = SpatialTransformerConfig::new(2, 2).init::<TestBackend>(&device);

        for batch in [1, 3, 3, 2] {
            let images = Tensor::<TestBackend, 4>::zeros([batch, 1, 2, 2], &device);
            let warped = stn.warp(images, identity_thetas(batch)).unwrap();
            assert_eq!(warped.dims(), [batch, 1, 2, 2]);
        }
    }

    #[test]
    fn test_output_resolution_differs_from_input() {
        let device = Default::default();
        let stn = SpatialTransformerConfig::new(2, 3).init::<TestBackend>(&device);

        let images = Tensor::<TestBackend, 4>::from_data(
            TensorData::from([[[[1.0, 2.0], [3.0, 4.0]]]]),
            &device,
        );

        let warped = stn.warp(images, identity_thetas(1)).unwrap();
        assert_eq!(warped.dims(), [1, 1, 2, 3]);
    }
}
