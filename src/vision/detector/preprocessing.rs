// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Letterbox preprocessing for YOLO-style detectors

use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

/// Default square input size for YOLOv8 exports
pub const YOLO_INPUT_SIZE: u32 = 640;

/// Gray value used for letterbox padding
pub const PAD_VALUE: u8 = 114;

/// Geometry needed to map model-space boxes back onto the original image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub orig_width: u32,
    pub orig_height: u32,
}

impl Letterbox {
    /// Compute the letterbox transform for an image of the given size
    pub fn new(orig_width: u32, orig_height: u32, target_size: u32) -> Self {
        let target = target_size as f32;
        let scale = if orig_width == 0 || orig_height == 0 {
            1.0
        } else {
            (target / orig_width as f32).min(target / orig_height as f32)
        };

        let new_w = (orig_width as f32 * scale).round();
        let new_h = (orig_height as f32 * scale).round();

        Self {
            scale,
            pad_x: ((target - new_w) / 2.0).floor(),
            pad_y: ((target - new_h) / 2.0).floor(),
            orig_width,
            orig_height,
        }
    }

    /// Scaled (unpadded) size of the image inside the canvas
    pub fn scaled_size(&self) -> (u32, u32) {
        (
            ((self.orig_width as f32 * self.scale).round() as u32).max(1),
            ((self.orig_height as f32 * self.scale).round() as u32).max(1),
        )
    }

    /// Map a model-space box back to original image coordinates (unclamped)
    pub fn unmap(&self, bbox: [f32; 4]) -> [f32; 4] {
        let [x1, y1, x2, y2] = bbox;
        [
            (x1 - self.pad_x) / self.scale,
            (y1 - self.pad_y) / self.scale,
            (x2 - self.pad_x) / self.scale,
            (y2 - self.pad_y) / self.scale,
        ]
    }
}

/// Resize with aspect ratio preserved, center on a gray canvas and convert
/// to a normalized NCHW tensor `[1, 3, size, size]` in `[0, 1]`.
pub fn letterbox(image: &DynamicImage, target_size: u32) -> (Array4<f32>, Letterbox) {
    let (orig_w, orig_h) = image.dimensions();
    let geometry = Letterbox::new(orig_w, orig_h, target_size);
    let (new_w, new_h) = geometry.scaled_size();

    let resized = image
        .resize_exact(new_w, new_h, FilterType::Triangle)
        .to_rgb8();

    let mut canvas = RgbImage::from_pixel(target_size, target_size, Rgb([PAD_VALUE; 3]));
    image::imageops::replace(
        &mut canvas,
        &resized,
        geometry.pad_x as i64,
        geometry.pad_y as i64,
    );

    let size = target_size as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
    for (x, y, pixel) in canvas.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    (tensor, geometry)
}
