//! CPU-side construction of affine parameter vectors.

use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use nalgebra::{Matrix2, Vector2};

/// A 2D affine transform held as its linear part and translation.
///
/// This is the caller-side representation used to build `[B, 6]` theta
/// batches for [`crate::SpatialTransformer::warp`]. `theta()` emits the raw
/// `[a, b, c, d, tx, ty]` vector; the grid generator applies the
/// scale-coupling of the translation, so the values here are the parameters
/// as a localization network would emit them, not the effective matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineParams {
    pub linear: Matrix2<f32>,
    pub translation: Vector2<f32>,
}

impl AffineParams {
    /// The identity transform.
    pub fn identity() -> Self {
        Self {
            linear: Matrix2::identity(),
            translation: Vector2::zeros(),
        }
    }

    /// Counter-clockwise rotation by `radians`.
    pub fn rotation(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            linear: Matrix2::new(cos, -sin, sin, cos),
            translation: Vector2::zeros(),
        }
    }

    /// Per-axis scaling.
    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            linear: Matrix2::new(sx, 0.0, 0.0, sy),
            translation: Vector2::zeros(),
        }
    }

    /// Pure translation in normalized units.
    pub fn translation(tx: f32, ty: f32) -> Self {
        Self {
            linear: Matrix2::identity(),
            translation: Vector2::new(tx, ty),
        }
    }

    /// `self` applied after `other`.
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            linear: self.linear * other.linear,
            translation: self.linear * other.translation + self.translation,
        }
    }

    /// The raw parameter vector `[a, b, c, d, tx, ty]`.
    pub fn theta(&self) -> [f32; 6] {
        [
            self.linear[(0, 0)],
            self.linear[(0, 1)],
            self.linear[(1, 0)],
            self.linear[(1, 1)],
            self.translation.x,
            self.translation.y,
        ]
    }
}

impl Default for AffineParams {
    fn default() -> Self {
        Self::identity()
    }
}

/// Stack parameter vectors into a `[B, 6]` theta batch.
pub fn theta_batch<B: Backend>(params: &[AffineParams], device: &B::Device) -> Tensor<B, 2> {
    let batch = params.len();
    let values: Vec<f32> = params.iter().flat_map(|p| p.theta()).collect();

    Tensor::from_data(TensorData::new(values, [batch, 6]), device)
}

/// A `[B, 6]` batch of identity transforms.
pub fn identity_theta<B: Backend>(batch: usize, device: &B::Device) -> Tensor<B, 2> {
    theta_batch(&vec![AffineParams::identity(); batch], device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_identity_theta_vector() {
        assert_eq!(
            AffineParams::identity().theta(),
            [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_rotation_quarter_turn() {
        let theta = AffineParams::rotation(FRAC_PI_2).theta();
        assert!(theta[0].abs() < 1e-6);
        assert!((theta[1] + 1.0).abs() < 1e-6);
        assert!((theta[2] - 1.0).abs() < 1e-6);
        assert!(theta[3].abs() < 1e-6);
    }

    #[test]
    fn test_compose_applies_linear_to_translation() {
        let scaled = AffineParams::scale(2.0, 2.0).compose(&AffineParams::translation(0.5, 0.0));
        let theta = scaled.theta();
        assert_eq!(theta[0], 2.0);
        assert_eq!(theta[4], 1.0);
    }

    #[test]
    fn test_theta_batch_shape() {
        use burn_ndarray::NdArray;

        let device = Default::default();
        let batch = theta_batch::<NdArray<f32>>(
            &[AffineParams::identity(), AffineParams::rotation(0.3)],
            &device,
        );
        assert_eq!(batch.dims(), [2, 6]);
    }
}
