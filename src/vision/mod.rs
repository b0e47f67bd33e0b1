// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing module for object detection
//!
//! This module provides:
//! - Image decoding/encoding (multipart bytes, base64, JPEG output)
//! - The class registry (names and display colors)
//! - The shared detector and its lazy loader
//! - Detection execution, vehicle filtering and box annotation

pub mod annotate;
pub mod classes;
pub mod detector;
pub mod errors;
pub mod executor;
pub mod image_utils;
pub mod model_manager;
pub mod vehicle_filter;

pub use annotate::Annotator;
pub use classes::{ClassEntry, ClassRegistry};
pub use detector::{Detector, OnnxYoloDetector, RawDetection, YoloConfig};
pub use errors::{VisionError, VisionResult};
pub use executor::{Detection, DetectionExecutor, ExecutorConfig};
pub use image_utils::{
    decode_base64_image, decode_image_bytes, detect_format, encode_image, to_base64, EncodeFormat,
    ImageError, ImageInfo,
};
pub use model_manager::{DetectionModelInfo, DetectorLoader, DetectorManager, OnnxYoloLoader};
pub use vehicle_filter::{PlateRegion, Vehicle, VehicleFilter, VehicleSummary};
