// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request pipeline: decode -> ensure model -> infer -> annotate -> encode
//!
//! Each request moves through the stages in order and stops at the first
//! failure. Failures carry the stage they happened in.

use bytes::Bytes;
use image::DynamicImage;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::vision::image_utils::{decode_base64_image_with_limit, decode_image_bytes_with_limit};
use crate::vision::{
    encode_image, to_base64, Annotator, Detection, DetectionExecutor, DetectorManager,
    EncodeFormat, ImageError, ImageInfo, VisionError,
};

/// Turns the annotated canvas into response bytes
pub type ImageEncoder = fn(&DynamicImage, EncodeFormat) -> Result<Vec<u8>, ImageError>;

/// Pipeline stages, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Decoded,
    Inferred,
    Annotated,
    Encoded,
    Responded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Decoded => "decoded",
            Stage::Inferred => "inferred",
            Stage::Annotated => "annotated",
            Stage::Encoded => "encoded",
            Stage::Responded => "responded",
        };
        f.write_str(name)
    }
}

/// Image payload as it arrived
#[derive(Debug, Clone)]
pub enum ImageInput {
    /// Raw bytes from a multipart upload
    Bytes(Bytes),
    /// Base64 text (optionally a data URI)
    Base64(String),
}

#[derive(Debug, Clone, Copy)]
pub struct DetectOptions {
    pub confidence: f32,
    pub draw_boxes: bool,
}

/// Successful pipeline result
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub detections: Vec<Detection>,
    /// Base64 JPEG, present only when boxes were requested
    pub annotated_image: Option<String>,
    pub image_info: ImageInfo,
    /// Last stage reached
    pub stage: Stage,
}

/// Failure with the stage that was being attempted
#[derive(Debug)]
pub struct PipelineError {
    /// Last stage completed before the failure
    pub stage: Stage,
    pub error: VisionError,
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (after stage '{}')", self.error, self.stage)
    }
}

impl std::error::Error for PipelineError {}

pub struct DetectionPipeline {
    models: Arc<DetectorManager>,
    executor: Arc<DetectionExecutor>,
    annotator: Arc<Annotator>,
    encode_format: EncodeFormat,
    encoder: ImageEncoder,
    max_image_bytes: usize,
}

impl DetectionPipeline {
    pub fn new(
        models: Arc<DetectorManager>,
        executor: Arc<DetectionExecutor>,
        annotator: Arc<Annotator>,
        encode_format: EncodeFormat,
        max_image_bytes: usize,
    ) -> Self {
        Self {
            models,
            executor,
            annotator,
            encode_format,
            encoder: encode_image,
            max_image_bytes,
        }
    }

    /// Replace the output encoder (defaults to [`encode_image`])
    pub fn with_encoder(mut self, encoder: ImageEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn models(&self) -> &Arc<DetectorManager> {
        &self.models
    }

    pub fn executor(&self) -> &Arc<DetectionExecutor> {
        &self.executor
    }

    pub async fn run(
        &self,
        input: ImageInput,
        options: DetectOptions,
    ) -> Result<PipelineOutput, PipelineError> {
        let result = self.run_stages(input, options).await;

        if let Err(e) = &result {
            match e.error {
                VisionError::InvalidImage(_)
                | VisionError::InvalidEncoding(_)
                | VisionError::InvalidThreshold(_) => warn!("Detection rejected: {}", e),
                _ => error!("Detection failed: {}", e),
            }
        }

        result
    }

    async fn run_stages(
        &self,
        input: ImageInput,
        options: DetectOptions,
    ) -> Result<PipelineOutput, PipelineError> {
        let fail = |stage: Stage| move |error: VisionError| PipelineError { stage, error };

        // 1. Decode
        let max_bytes = self.max_image_bytes;
        let (image, image_info) = tokio::task::spawn_blocking(move || match input {
            ImageInput::Bytes(bytes) => decode_image_bytes_with_limit(&bytes, max_bytes),
            ImageInput::Base64(text) => decode_base64_image_with_limit(&text, max_bytes),
        })
        .await
        .map_err(|e| VisionError::InvalidImage(format!("decoder panicked: {}", e)))
        .and_then(|decoded| decoded.map_err(VisionError::from_decode))
        .map_err(fail(Stage::Received))?;

        debug!(
            "Decoded image: {}x{} {:?}, {} bytes",
            image_info.width, image_info.height, image_info.format, image_info.size_bytes
        );
        let image = Arc::new(image);

        // 2. Ensure the model, then infer
        let detector = self
            .models
            .ensure_loaded()
            .await
            .map_err(fail(Stage::Decoded))?;

        let detections = self
            .executor
            .run(detector, image.clone(), options.confidence)
            .await
            .map_err(fail(Stage::Decoded))?;

        debug!(
            "Inference complete: {} detections at threshold {}",
            detections.len(),
            options.confidence
        );

        if !options.draw_boxes {
            return Ok(PipelineOutput {
                detections,
                annotated_image: None,
                image_info,
                stage: Stage::Inferred,
            });
        }

        // 3. Annotate + encode
        let annotator = self.annotator.clone();
        let format = self.encode_format;
        let encoder = self.encoder;
        let to_draw = detections.clone();
        let encoded = tokio::task::spawn_blocking(move || {
            annotate_and_encode(&annotator, &image, &to_draw, format, encoder)
        })
        .await
        .map_err(|e| VisionError::EncodeFailed(format!("annotation panicked: {}", e)))
        .and_then(|r| r)
        .map_err(fail(Stage::Inferred))?;

        Ok(PipelineOutput {
            detections,
            annotated_image: Some(encoded),
            image_info,
            stage: Stage::Encoded,
        })
    }
}

fn annotate_and_encode(
    annotator: &Annotator,
    image: &DynamicImage,
    detections: &[Detection],
    format: EncodeFormat,
    encoder: ImageEncoder,
) -> Result<String, VisionError> {
    let canvas = annotator.annotate(image, detections);
    let bytes = encoder(&DynamicImage::ImageRgb8(canvas), format)
        .map_err(|e| VisionError::EncodeFailed(e.to_string()))?;
    Ok(to_base64(&bytes))
}
