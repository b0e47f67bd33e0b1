// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection model manager: lazy, single-init ownership of the shared detector

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{error, info};

use super::detector::{Detector, OnnxYoloDetector, YoloConfig};
use super::errors::{VisionError, VisionResult};

/// Builds a detector. Called on a blocking thread; may be slow and may fail.
pub trait DetectorLoader: Send + Sync {
    fn load(&self) -> anyhow::Result<Arc<dyn Detector>>;
}

/// Loads [`OnnxYoloDetector`] from disk
#[derive(Debug, Clone)]
pub struct OnnxYoloLoader {
    pub config: YoloConfig,
}

impl OnnxYoloLoader {
    pub fn new(config: YoloConfig) -> Self {
        Self { config }
    }
}

impl DetectorLoader for OnnxYoloLoader {
    fn load(&self) -> anyhow::Result<Arc<dyn Detector>> {
        let detector = OnnxYoloDetector::load(self.config.clone())?;
        Ok(Arc::new(detector))
    }
}

/// Information about the managed detection model
#[derive(Debug, Clone)]
pub struct DetectionModelInfo {
    pub name: String,
    pub loaded: bool,
}

/// Owner of the process-wide detector
///
/// The detector is built on first use. Concurrent first callers wait on the
/// same initialization; once built, reads take no lock. A failed build leaves
/// the manager empty so a later call can try again.
pub struct DetectorManager {
    model_name: String,
    loader: Arc<dyn DetectorLoader>,
    detector: OnceCell<Arc<dyn Detector>>,
}

impl std::fmt::Debug for DetectorManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorManager")
            .field("model_name", &self.model_name)
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

impl DetectorManager {
    pub fn new(model_name: impl Into<String>, loader: Arc<dyn DetectorLoader>) -> Self {
        Self {
            model_name: model_name.into(),
            loader,
            detector: OnceCell::new(),
        }
    }

    /// Manager around an already-built detector (tests, embedding)
    pub fn with_detector(model_name: impl Into<String>, detector: Arc<dyn Detector>) -> Self {
        struct Ready(Arc<dyn Detector>);

        impl DetectorLoader for Ready {
            fn load(&self) -> anyhow::Result<Arc<dyn Detector>> {
                Ok(self.0.clone())
            }
        }

        Self {
            model_name: model_name.into(),
            loader: Arc::new(Ready(detector.clone())),
            detector: OnceCell::new_with(Some(detector)),
        }
    }

    /// Return the detector, building it on first call
    pub async fn ensure_loaded(&self) -> VisionResult<Arc<dyn Detector>> {
        if let Some(detector) = self.detector.get() {
            return Ok(detector.clone());
        }

        let detector = self
            .detector
            .get_or_try_init(|| async {
                info!("⏳ Loading detection model '{}'", self.model_name);
                let loader = self.loader.clone();

                let result = tokio::task::spawn_blocking(move || loader.load())
                    .await
                    .map_err(|e| {
                        VisionError::ModelUnavailable(format!("model loader panicked: {}", e))
                    })?;

                match result {
                    Ok(detector) => {
                        info!("✅ Detection model '{}' ready", self.model_name);
                        Ok(detector)
                    }
                    Err(e) => {
                        error!("❌ Failed to load detection model '{}': {:#}", self.model_name, e);
                        Err(VisionError::ModelUnavailable(format!("{:#}", e)))
                    }
                }
            })
            .await?;

        Ok(detector.clone())
    }

    /// Build the detector now rather than on the first request
    pub async fn preload(&self) -> VisionResult<()> {
        self.ensure_loaded().await.map(|_| ())
    }

    pub fn is_loaded(&self) -> bool {
        self.detector.initialized()
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn info(&self) -> DetectionModelInfo {
        DetectionModelInfo {
            name: self.model_name.clone(),
            loaded: self.is_loaded(),
        }
    }
}
