// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLOv8 detector running on ONNX Runtime

use anyhow::{anyhow, Context, Result};
use image::{DynamicImage, GenericImageView};
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::postprocessing::{decode_yolov8, non_max_suppression};
use super::preprocessing::{letterbox, YOLO_INPUT_SIZE};
use super::{Detector, RawDetection};

/// Settings for [`OnnxYoloDetector`]
#[derive(Debug, Clone)]
pub struct YoloConfig {
    pub model_path: PathBuf,
    /// Square model input size
    pub input_size: u32,
    pub iou_threshold: f32,
    pub max_detections: usize,
    pub intra_threads: usize,
    /// Try the CUDA execution provider before CPU
    pub use_cuda: bool,
}

impl Default for YoloConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("./models/yolov8n.onnx"),
            input_size: YOLO_INPUT_SIZE,
            iou_threshold: 0.45,
            max_detections: 300,
            intra_threads: 4,
            use_cuda: false,
        }
    }
}

/// YOLOv8 ONNX model
///
/// Expects a single `[1, 3, S, S]` float input in `[0, 1]` and the standard
/// `[1, 4 + classes, anchors]` head output.
#[derive(Clone)]
pub struct OnnxYoloDetector {
    /// ONNX Runtime session (run() needs &mut)
    session: Arc<Mutex<Session>>,
    input_name: String,
    config: YoloConfig,
}

impl std::fmt::Debug for OnnxYoloDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxYoloDetector")
            .field("input_name", &self.input_name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OnnxYoloDetector {
    /// Load the model described by `config`
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found
    /// - ONNX Runtime initialization fails
    pub fn load(config: YoloConfig) -> Result<Self> {
        let model_path = config.model_path.clone();

        if !model_path.exists() {
            anyhow::bail!("Detection model not found: {}", model_path.display());
        }

        info!("Loading YOLO detection model from {}", model_path.display());

        let session = if config.use_cuda {
            info!("   Attempting CUDA execution provider...");
            match Self::build_session(&model_path, &config, true) {
                Ok(s) => {
                    info!("✅ CUDA execution provider initialized");
                    s
                }
                Err(e) => {
                    warn!("⚠️  CUDA execution provider failed: {}", e);
                    warn!("   Falling back to CPU execution provider");
                    Self::build_session(&model_path, &config, false)?
                }
            }
        } else {
            Self::build_session(&model_path, &config, false)?
        };

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        if let Some(input) = session.inputs.first() {
            debug!("Detection model input: {} {:?}", input_name, input.input_type);
        }

        info!("✅ YOLO detection model loaded ({}x{} input)", config.input_size, config.input_size);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            config,
        })
    }

    fn build_session(model_path: &Path, config: &YoloConfig, cuda: bool) -> Result<Session> {
        let builder = Session::builder().context("Failed to create session builder")?;

        let builder = if cuda {
            builder
                .with_execution_providers([CUDAExecutionProvider::default().build()])
                .context("Failed to set CUDA execution provider")?
        } else {
            builder
                .with_execution_providers([CPUExecutionProvider::default().build()])
                .context("Failed to set CPU execution provider")?
        };

        builder
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(config.intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load detection model from {}",
                model_path.display()
            ))
    }

    pub fn config(&self) -> &YoloConfig {
        &self.config
    }
}

impl Detector for OnnxYoloDetector {
    fn detect(&self, image: &DynamicImage, confidence: f32) -> Result<Vec<RawDetection>> {
        let (width, height) = image.dimensions();
        let (tensor, geometry) = letterbox(image, self.config.input_size);

        let input_value = Value::from_array(tensor).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("Detection session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Detection inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        debug!("Detection output shape: {:?}", output_tensor.shape());

        let candidates = decode_yolov8(output_tensor.view(), confidence)?;
        let kept = non_max_suppression(
            candidates,
            self.config.iou_threshold,
            self.config.max_detections,
        );

        let detections: Vec<RawDetection> = kept
            .into_iter()
            .map(|det| RawDetection {
                bbox: geometry.unmap(det.bbox),
                ..det
            })
            .collect();

        debug!(
            "Detected {} objects in {}x{} image",
            detections.len(),
            width,
            height
        );

        Ok(detections)
    }
}
