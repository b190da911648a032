//! Warps a test pattern with a few hand-built affine transforms and renders
//! the results to the terminal.

use std::f32::consts::FRAC_PI_4;

use burn::tensor::{Tensor, TensorData};
use burn_ndarray::{NdArray, NdArrayDevice};
use rstn_core::{theta_batch, AffineParams, SpatialTransformerConfig};

type B = NdArray<f32>;

const SIZE: usize = 9;

fn main() -> anyhow::Result<()> {
    let device = NdArrayDevice::default();

    // Vertical bright bar through the image center
    let mut pixels = [[0.0f32; SIZE]; SIZE];
    for row in pixels.iter_mut() {
        row[SIZE / 2] = 1.0;
    }
    let image =
        Tensor::<B, 2>::from_data(TensorData::from(pixels), &device).reshape([1, 1, SIZE, SIZE]);

    let transforms = [
        ("identity", AffineParams::identity()),
        ("rotate 45 degrees", AffineParams::rotation(FRAC_PI_4)),
        ("zoom out 2x", AffineParams::scale(2.0, 2.0)),
        ("shift right", AffineParams::translation(-0.5, 0.0)),
    ];

    let stn = SpatialTransformerConfig::new(SIZE, SIZE).init::<B>(&device);

    let batch = image.repeat(&[transforms.len(), 1, 1, 1]);
    let params: Vec<AffineParams> = transforms.iter().map(|(_, p)| *p).collect();
    let warped = stn.warp(batch, theta_batch::<B>(&params, &device))?;

    let data = warped.into_data();
    let values = data.as_slice::<f32>().expect("warped batch is f32");

    for (index, (name, params)) in transforms.iter().enumerate() {
        println!("--- {} (theta {:?})", name, params.theta());
        render(&values[index * SIZE * SIZE..(index + 1) * SIZE * SIZE]);
    }

    Ok(())
}

fn render(pixels: &[f32]) {
    for y in 0..SIZE {
        let line: String = (0..SIZE)
            .map(|x| match pixels[y * SIZE + x] {
                v if v > 0.66 => '#',
                v if v > 0.33 => '+',
                v if v > 0.05 => '.',
                _ => ' ',
            })
            .collect();
        println!("{}", line);
    }
    println!();
}
