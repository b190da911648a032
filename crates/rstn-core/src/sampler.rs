//! Bilinear grid sampling.

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TransformError};

/// Boundary policy for out-of-range sample coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaddingMode {
    /// Out-of-bounds neighbor lookups contribute zero. Weights are not
    /// renormalized, so a partially out-of-bounds neighborhood blends toward
    /// zero at the edge and a fully out-of-bounds one yields exactly zero.
    Zeros,
    /// Clamp lookups to the nearest edge pixel.
    Border,
}

impl Default for PaddingMode {
    fn default() -> Self {
        PaddingMode::Zeros
    }
}

/// Sample an image batch at the given normalized coordinates with bilinear
/// interpolation.
///
/// # Arguments
/// * `image` - Source batch `[B, C, Hin, Win]`
/// * `coords` - Sampling coordinates `[B, 2, Hout, Wout]`, channel 0 holding
///   normalized x and channel 1 normalized y in `[-1, 1]` (values outside the
///   range are legal and resolved by `padding`)
/// * `padding` - Boundary policy
///
/// # Returns
/// Resampled batch `[B, C, Hout, Wout]`.
///
/// Gradients flow to `image` through the corner gathers and to `coords`
/// through the fractional weights; masks and gather indices do not carry
/// gradient.
pub fn grid_sample<B: Backend>(
    image: Tensor<B, 4>,
    coords: Tensor<B, 4>,
    padding: PaddingMode,
) -> Result<Tensor<B, 4>> {
    let [batch, channels, h_in, w_in] = image.dims();
    let [coord_batch, coord_channels, h_out, w_out] = coords.dims();

    if batch != coord_batch || coord_channels != 2 {
        return Err(TransformError::shape_mismatch(
            [batch, 2, h_out, w_out],
            [coord_batch, coord_channels, h_out, w_out],
        ));
    }

    let x = coords.clone().slice([0..batch, 0..1, 0..h_out, 0..w_out]);
    let y = coords.slice([0..batch, 1..2, 0..h_out, 0..w_out]);

    // Normalized [-1, 1] to source pixel space
    let px = (x + 1.0) * ((w_in - 1) as f32 / 2.0);
    let py = (y + 1.0) * ((h_in - 1) as f32 / 2.0);

    let x0 = px.clone().floor();
    let x1 = x0.clone() + 1.0;
    let y0 = py.clone().floor();
    let y1 = y0.clone() + 1.0;

    // Fractional weights; the coordinate gradient lives here
    let wx1 = px - x0.clone();
    let wx0 = wx1.clone().neg().add_scalar(1.0);
    let wy1 = py - y0.clone();
    let wy0 = wy1.clone().neg().add_scalar(1.0);

    // Per-corner validity, taken before clamping. Clamping the gather index
    // alone would substitute edge values and change both the edge blend and
    // the image gradient.
    let masks = match padding {
        PaddingMode::Zeros => Some((
            in_range(&x0, w_in),
            in_range(&x1, w_in),
            in_range(&y0, h_in),
            in_range(&y1, h_in),
        )),
        PaddingMode::Border => None,
    };

    let x0_idx = x0.clamp(0.0, (w_in - 1) as f32).int();
    let x1_idx = x1.clamp(0.0, (w_in - 1) as f32).int();
    let y0_off = y0.clamp(0.0, (h_in - 1) as f32).int().mul_scalar(w_in as i32);
    let y1_off = y1.clamp(0.0, (h_in - 1) as f32).int().mul_scalar(w_in as i32);

    let flat = image.reshape([batch, channels, h_in * w_in]);

    let gather_corner = |idx: Tensor<B, 4, Int>| -> Tensor<B, 4> {
        let idx = idx
            .reshape([batch, 1, h_out * w_out])
            .repeat(&[1, channels, 1]);
        flat.clone()
            .gather(2, idx)
            .reshape([batch, channels, h_out, w_out])
    };

    let mut v00 = gather_corner(y0_off.clone() + x0_idx.clone());
    let mut v10 = gather_corner(y0_off + x1_idx.clone());
    let mut v01 = gather_corner(y1_off.clone() + x0_idx);
    let mut v11 = gather_corner(y1_off + x1_idx);

    if let Some((mx0, mx1, my0, my1)) = masks {
        v00 = v00 * (mx0.clone() * my0.clone());
        v10 = v10 * (mx1.clone() * my0);
        v01 = v01 * (mx0 * my1.clone());
        v11 = v11 * (mx1 * my1);
    }

    // Interpolate x, then y
    let top = v00 * wx0.clone() + v10 * wx1.clone();
    let bottom = v01 * wx0 + v11 * wx1;

    Ok(top * wy0 + bottom * wy1)
}

/// 1.0 where the pixel coordinate lies inside `[0, size - 1]`, else 0.0.
fn in_range<B: Backend>(coord: &Tensor<B, 4>, size: usize) -> Tensor<B, 4> {
    let lower = coord.clone().greater_equal_elem(0.0).int();
    let upper = coord.clone().lower_equal_elem((size - 1) as f32).int();
    (lower * upper).float()
}
