//! Affine grid generation.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::error::{Result, TransformError};

/// Apply per-batch affine transforms to a normalized sampling grid.
///
/// `thetas` is `[batch, 6]`, read as `[a, b, c, d, tx, ty]` for the 2x3
/// matrix `[[a, b, tx], [c, d, ty]]` mapping normalized output coordinates to
/// normalized input coordinates. The translation components are scaled by the
/// matching diagonal components before use, so the effective matrix is
/// `[[a, b, a*tx], [c, d, d*ty]]`. This keeps the translation in the same
/// normalized units as the scaled axis and must match what callers expect
/// when they construct `thetas`.
///
/// `grid` is `[batch, 3, N]` as produced by [`crate::sampling_grid`], with
/// `N == height * width`. The result is `[batch, 2, height, width]`, channel
/// 0 holding normalized x and channel 1 normalized y.
///
/// The whole operation is batched linear algebra (slice, multiply, matmul),
/// so gradients flow back to `thetas` under an autodiff backend.
pub fn affine_grid<B: Backend>(
    grid: Tensor<B, 3>,
    thetas: Tensor<B, 2>,
    height: usize,
    width: usize,
) -> Result<Tensor<B, 4>> {
    let [grid_batch, rows, n] = grid.dims();
    let [theta_batch, params] = thetas.dims();

    if grid_batch != theta_batch {
        return Err(TransformError::shape_mismatch(
            [grid_batch, 6],
            [theta_batch, params],
        ));
    }
    if rows != 3 || params != 6 {
        return Err(TransformError::shape_mismatch(
            [grid_batch, 3, 6],
            [grid_batch, rows, params],
        ));
    }
    if n != height * width {
        return Err(TransformError::shape_mismatch(
            [grid_batch, 3, height * width],
            [grid_batch, rows, n],
        ));
    }

    let b = theta_batch;

    let a = thetas.clone().slice([0..b, 0..1]);
    let bb = thetas.clone().slice([0..b, 1..2]);
    let c = thetas.clone().slice([0..b, 2..3]);
    let d = thetas.clone().slice([0..b, 3..4]);
    let tx = thetas.clone().slice([0..b, 4..5]);
    let ty = thetas.slice([0..b, 5..6]);

    // Effective matrix with the scale-coupled translation, built as one
    // derived value rather than patched in place.
    let theta = Tensor::cat(
        vec![a.clone(), bb, a * tx, c, d.clone(), d * ty],
        1,
    )
    .reshape([b, 2, 3]);

    let warped = theta.matmul(grid);

    Ok(warped.reshape([b, 2, height, width]))
}
