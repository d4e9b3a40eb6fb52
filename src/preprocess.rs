//! Resizing and normalizing a decoded image into the model's input tensor

use crate::config::{MEAN, STD};
use crate::decode::DecodedImage;
use image::imageops::{self, FilterType};
use image::RgbImage;
use tch::{Kind, Tensor};

/// Bilinear resize to the model's input resolution
pub fn resize(image: &DecodedImage, height: u32, width: u32) -> RgbImage {
    imageops::resize(image.as_rgb(), width, height, FilterType::Triangle)
}

/// Build the (1, 3, height, width) float tensor the model consumes
pub fn prepare(image: &DecodedImage, height: u32, width: u32) -> Tensor {
    let resized = resize(image, height, width);

    // (H, W, C) -> (C, H, W), then add the batch axis
    let pixels = Tensor::from_slice(resized.as_raw().as_slice())
        .view([height as i64, width as i64, 3])
        .permute([2, 0, 1])
        .unsqueeze(0)
        .to_kind(Kind::Float);

    normalize(&pixels)
}

/// `(v / 255 - mean[c]) / std[c]` for every channel `c` of a (1, 3, H, W)
/// tensor
pub fn normalize(pixels: &Tensor) -> Tensor {
    let mean = Tensor::from_slice(&MEAN).view([1, 3, 1, 1]);
    let std = Tensor::from_slice(&STD).view([1, 3, 1, 1]);
    (pixels / 255.0 - mean) / std
}
