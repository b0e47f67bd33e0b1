// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection executor: runs the shared detector off the async workers,
//! bounds concurrency and time, and turns raw boxes into [`Detection`]s.

use image::{DynamicImage, GenericImageView};
use serde::{Serialize, Serializer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::classes::ClassRegistry;
use super::detector::{Detector, RawDetection};
use super::errors::{VisionError, VisionResult};

/// A detection ready for the response: named, validated and clamped
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub class_id: u32,
    pub class_name: String,
    #[serde(serialize_with = "serialize_confidence")]
    pub confidence: f32,
    /// `[x1, y1, x2, y2]`, `x1 <= x2`, `y1 <= y2`, inside the image
    pub bbox: [u32; 4],
}

fn serialize_confidence<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_confidence(*value))
}

/// Confidence as reported to clients (3 decimals)
pub fn round_confidence(value: f32) -> f64 {
    (value as f64 * 1000.0).round() / 1000.0
}

/// Limits for [`DetectionExecutor`]
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Inferences allowed to run at once
    pub max_concurrent: usize,
    /// How long a request may wait for a free slot
    pub queue_timeout: Duration,
    /// Upper bound for a single inference
    pub inference_timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            queue_timeout: Duration::from_secs(5),
            inference_timeout: Duration::from_secs(30),
        }
    }
}

pub struct DetectionExecutor {
    registry: Arc<ClassRegistry>,
    permits: Arc<Semaphore>,
    config: ExecutorConfig,
}

impl DetectionExecutor {
    pub fn new(registry: Arc<ClassRegistry>, config: ExecutorConfig) -> Self {
        Self {
            registry,
            permits: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            config,
        }
    }

    pub fn registry(&self) -> &Arc<ClassRegistry> {
        &self.registry
    }

    /// Free inference slots right now
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run `detector` over `image`, keeping results scoring at least `threshold`
    pub async fn run(
        &self,
        detector: Arc<dyn Detector>,
        image: Arc<DynamicImage>,
        threshold: f32,
    ) -> VisionResult<Vec<Detection>> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(VisionError::InvalidThreshold(threshold));
        }

        let permit = tokio::time::timeout(
            self.config.queue_timeout,
            self.permits.clone().acquire_owned(),
        )
        .await
        .map_err(|_| {
            warn!(
                "Inference queue full ({} slots), rejecting request",
                self.config.max_concurrent
            );
            VisionError::Overloaded(self.config.queue_timeout.as_millis() as u64)
        })?
        .map_err(|_| VisionError::InferenceFailed("inference queue closed".to_string()))?;

        let worker_image = image.clone();
        // The permit moves into the blocking task so a timed-out inference
        // keeps its slot until it actually finishes.
        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            detector.detect(&worker_image, threshold)
        });

        let raw = match tokio::time::timeout(self.config.inference_timeout, task).await {
            Err(_) => {
                return Err(VisionError::InferenceTimeout(
                    self.config.inference_timeout.as_millis() as u64,
                ))
            }
            Ok(Err(join_err)) => {
                return Err(VisionError::InferenceFailed(format!(
                    "detector panicked: {}",
                    join_err
                )))
            }
            Ok(Ok(Err(e))) => return Err(VisionError::InferenceFailed(format!("{:#}", e))),
            Ok(Ok(Ok(raw))) => raw,
        };

        let (width, height) = image.dimensions();
        let total = raw.len();
        let detections = finalize(raw, width, height, threshold, &self.registry);

        if detections.len() != total {
            debug!(
                "Discarded {} of {} raw detections",
                total - detections.len(),
                total
            );
        }

        Ok(detections)
    }
}

/// Validate, threshold, clamp and name raw detector output, keeping order
pub fn finalize(
    raw: Vec<RawDetection>,
    width: u32,
    height: u32,
    threshold: f32,
    registry: &ClassRegistry,
) -> Vec<Detection> {
    raw.into_iter()
        .filter_map(|det| {
            if !det.confidence.is_finite()
                || !(0.0..=1.0).contains(&det.confidence)
                || det.confidence < threshold
            {
                return None;
            }
            let bbox = clamp_bbox(det.bbox, width, height)?;
            Some(Detection {
                class_id: det.class_id,
                class_name: registry.name(det.class_id).into_owned(),
                confidence: det.confidence,
                bbox,
            })
        })
        .collect()
}

/// Order corners and clamp to `[0, width] x [0, height]`; `None` for NaN input
pub fn clamp_bbox(bbox: [f32; 4], width: u32, height: u32) -> Option<[u32; 4]> {
    if bbox.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let [x1, y1, x2, y2] = bbox;
    let (x1, x2) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
    let (y1, y2) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };

    let cx = |v: f32| v.round().clamp(0.0, width as f32) as u32;
    let cy = |v: f32| v.round().clamp(0.0, height as f32) as u32;

    Some([cx(x1), cy(y1), cx(x2), cy(y2)])
}
