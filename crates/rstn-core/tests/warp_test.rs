use burn::backend::Autodiff;
use burn::tensor::{Distribution, Tensor, TensorData};
use burn_ndarray::NdArray;
use rstn_core::{
    affine_grid, grid_sample, identity_theta, sampling_grid, AffineParams, PaddingMode,
    SpatialTransformerConfig,
};

type B = NdArray<f32>;
type AB = Autodiff<NdArray<f32>>;

#[test]
fn test_grid_is_deterministic() {
    let device = Default::default();

    let first = sampling_grid::<B>(7, 5, 3, &device).unwrap();
    let second = sampling_grid::<B>(7, 5, 3, &device).unwrap();

    let diff = (first - second).abs().max().into_scalar();
    assert_eq!(diff, 0.0);
}

#[test]
fn test_identity_warp_preserves_batch() {
    let device = Default::default();
    let stn = SpatialTransformerConfig::new(8, 8).init::<B>(&device);

    let images = Tensor::<B, 4>::random([3, 2, 8, 8], Distribution::Default, &device);
    let thetas = identity_theta::<B>(3, &device);

    let warped = stn.warp(images.clone(), thetas).unwrap();

    let diff = (warped - images).abs().max().into_scalar();
    assert!(diff < 1e-5, "identity warp deviated by {}", diff);
}

#[test]
fn test_extreme_coordinates_produce_zero() {
    let device = Default::default();
    let stn = SpatialTransformerConfig::new(4, 4).init::<B>(&device);

    let images = Tensor::<B, 4>::ones([1, 3, 4, 4], &device);
    // Shift everything far outside the source extent
    let thetas = rstn_core::theta_batch::<B>(&[AffineParams::translation(10.0, 10.0)], &device);

    let warped = stn.warp(images, thetas).unwrap();
    assert_eq!(warped.abs().max().into_scalar(), 0.0);
}

#[test]
fn test_translation_couples_with_scale() {
    let device = Default::default();
    let stn = SpatialTransformerConfig::new(5, 5).init::<B>(&device);

    // Single bright pixel in the bottom-right corner, normalized (1, 1)
    let mut pixels = [[0.0f32; 5]; 5];
    pixels[4][4] = 1.0;
    let image = Tensor::<B, 2>::from_data(TensorData::from(pixels), &device).reshape([1, 1, 5, 5]);

    // [2, 0, 0, 2, 0.5, 0.5]: the sampler must see translation (1, 1), which
    // maps the output center exactly onto the bright pixel. The uncoupled
    // reading (0.5, 0.5) would land between lattice points and split the mass.
    let thetas = Tensor::<B, 2>::from_data(
        TensorData::from([[2.0, 0.0, 0.0, 2.0, 0.5, 0.5]]),
        &device,
    );

    let warped = stn.warp(image, thetas).unwrap();
    let data = warped.into_data();
    let values = data.as_slice::<f32>().unwrap();

    let center = values[2 * 5 + 2];
    assert!((center - 1.0).abs() < 1e-6, "center was {}", center);

    let total: f32 = values.iter().sum();
    assert!((total - 1.0).abs() < 1e-6, "mass leaked: {}", total);
}

#[test]
fn test_batch_elements_do_not_contaminate() {
    let device = Default::default();
    let stn = SpatialTransformerConfig::new(6, 6).init::<B>(&device);

    let a = Tensor::<B, 4>::random([1, 1, 6, 6], Distribution::Default, &device);
    let b = Tensor::<B, 4>::random([1, 1, 6, 6], Distribution::Default, &device);
    let theta_a = rstn_core::theta_batch::<B>(&[AffineParams::rotation(0.4)], &device);
    let theta_b = rstn_core::theta_batch::<B>(&[AffineParams::scale(0.7, 1.2)], &device);

    let joint = stn
        .warp(
            Tensor::cat(vec![a.clone(), b.clone()], 0),
            Tensor::cat(vec![theta_a.clone(), theta_b.clone()], 0),
        )
        .unwrap();

    let solo_a = stn.warp(a.clone(), theta_a.clone()).unwrap();
    let solo_b = stn.warp(b.clone(), theta_b.clone()).unwrap();

    let diff_a = (joint.clone().slice([0..1]) - solo_a).abs().max().into_scalar();
    let diff_b = (joint.slice([1..2]) - solo_b.clone()).abs().max().into_scalar();
    assert!(diff_a < 1e-6);
    assert!(diff_b < 1e-6);

    // Permuting the batch permutes the output
    let swapped = stn
        .warp(
            Tensor::cat(vec![b, a], 0),
            Tensor::cat(vec![theta_b, theta_a], 0),
        )
        .unwrap();
    let diff = (swapped.slice([0..1]) - solo_b).abs().max().into_scalar();
    assert!(diff < 1e-6);
}

#[test]
fn test_gradients_reach_thetas() {
    let device = Default::default();

    let image = Tensor::<AB, 1>::from_floats(
        [
            0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0,
        ],
        &device,
    )
    .reshape([1, 1, 4, 4]);

    let thetas = Tensor::<AB, 2>::from_data(
        TensorData::from([[0.8, 0.0, 0.0, 0.8, 0.1, 0.1]]),
        &device,
    )
    .require_grad();

    let grid = sampling_grid::<AB>(4, 4, 1, &device).unwrap();
    let coords = affine_grid(grid, thetas.clone(), 4, 4).unwrap();
    let warped = grid_sample(image, coords, PaddingMode::Zeros).unwrap();

    let grads = warped.sum().backward();
    let theta_grad = thetas.grad(&grads).expect("thetas should receive a gradient");

    assert_eq!(theta_grad.dims(), [1, 6]);
    assert!(theta_grad.abs().sum().into_scalar() > 0.0);
}

#[test]
fn test_gradients_reach_image() {
    let device = Default::default();

    let image = Tensor::<AB, 4>::random([1, 1, 4, 4], Distribution::Default, &device)
        .require_grad();
    let thetas = Tensor::<AB, 2>::from_data(
        TensorData::from([[0.9, 0.0, 0.0, 0.9, 0.0, 0.0]]),
        &device,
    );

    let grid = sampling_grid::<AB>(4, 4, 1, &device).unwrap();
    let coords = affine_grid(grid, thetas, 4, 4).unwrap();
    let warped = grid_sample(image.clone(), coords, PaddingMode::Zeros).unwrap();

    let grads = warped.sum().backward();
    let image_grad = image.grad(&grads).expect("image should receive a gradient");

    assert_eq!(image_grad.dims(), [1, 1, 4, 4]);
    assert!(image_grad.abs().sum().into_scalar() > 0.0);
}
