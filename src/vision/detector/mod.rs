// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Object detector abstraction and the ONNX YOLO backend
//!
//! Any model that turns an image into scored class boxes can sit behind
//! [`Detector`]. The service ships [`OnnxYoloDetector`] for YOLOv8 ONNX
//! exports.

pub mod postprocessing;
pub mod preprocessing;
pub mod yolo;

use image::DynamicImage;

pub use postprocessing::{decode_yolov8, iou, non_max_suppression};
pub use preprocessing::{letterbox, Letterbox, YOLO_INPUT_SIZE};
pub use yolo::{OnnxYoloDetector, YoloConfig};

/// A detector result in the detector's native coordinate space
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub class_id: u32,
    pub confidence: f32,
    /// `[x1, y1, x2, y2]` in pixels of the input image
    pub bbox: [f32; 4],
}

/// Shared, read-only detector
///
/// Implementations are built once and called concurrently from blocking
/// worker threads, so they must be `Send + Sync`.
#[cfg_attr(test, mockall::automock)]
pub trait Detector: Send + Sync {
    /// Run detection, returning boxes scoring at least `confidence`
    fn detect(&self, image: &DynamicImage, confidence: f32) -> anyhow::Result<Vec<RawDetection>>;
}
