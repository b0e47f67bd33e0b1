// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration
//!
//! Values come from (lowest to highest precedence) built-in defaults, an
//! optional TOML file, environment variables and finally CLI flags.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::vision::{EncodeFormat, ExecutorConfig, YoloConfig};

/// Detection service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,

    /// ONNX weights of the detector
    pub model_path: PathBuf,
    /// Identifier reported by /health
    pub model_name: String,
    pub input_size: u32,
    pub iou_threshold: f32,
    pub max_detections: usize,
    pub intra_threads: usize,
    pub use_cuda: bool,
    /// Build the detector at startup instead of on the first request
    pub preload_model: bool,

    pub default_confidence: f32,
    pub plate_confidence: f32,
    pub jpeg_quality: u8,

    pub max_concurrent_inferences: usize,
    pub queue_timeout_ms: u64,
    pub inference_timeout_secs: u64,
    pub max_upload_bytes: usize,

    /// One class name per line; COCO names when unset
    pub class_labels_path: Option<PathBuf>,
    /// Label font; embedded DejaVu Sans when unset
    pub font_path: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
            model_path: PathBuf::from("./models/yolov8n.onnx"),
            model_name: "YOLOv8n".to_string(),
            input_size: 640,
            iou_threshold: 0.45,
            max_detections: 300,
            intra_threads: 4,
            use_cuda: false,
            preload_model: false,
            default_confidence: 0.5,
            plate_confidence: 0.3,
            jpeg_quality: 90,
            max_concurrent_inferences: 4,
            queue_timeout_ms: 5000,
            inference_timeout_secs: 30,
            max_upload_bytes: 10 * 1024 * 1024,
            class_labels_path: None,
            font_path: None,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file; missing keys keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Defaults overlaid with environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Overlay environment variables onto this configuration.
    /// Unparseable values are ignored with a warning.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("HOST") {
            self.host = val;
        }
        env_parse("API_PORT", &mut self.port);
        if let Ok(val) = std::env::var("MODEL_PATH") {
            self.model_path = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("MODEL_NAME") {
            self.model_name = val;
        }
        env_parse("MODEL_INPUT_SIZE", &mut self.input_size);
        env_parse("IOU_THRESHOLD", &mut self.iou_threshold);
        env_parse("MAX_DETECTIONS", &mut self.max_detections);
        env_parse("INTRA_THREADS", &mut self.intra_threads);
        env_parse("USE_CUDA", &mut self.use_cuda);
        env_parse("PRELOAD_MODEL", &mut self.preload_model);
        env_parse("DEFAULT_CONFIDENCE", &mut self.default_confidence);
        env_parse("PLATE_CONFIDENCE", &mut self.plate_confidence);
        env_parse("JPEG_QUALITY", &mut self.jpeg_quality);
        env_parse("MAX_CONCURRENT_INFERENCES", &mut self.max_concurrent_inferences);
        env_parse("QUEUE_TIMEOUT_MS", &mut self.queue_timeout_ms);
        env_parse("INFERENCE_TIMEOUT_SECS", &mut self.inference_timeout_secs);
        env_parse("MAX_UPLOAD_BYTES", &mut self.max_upload_bytes);
        if let Ok(val) = std::env::var("CLASS_LABELS_PATH") {
            self.class_labels_path = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("FONT_PATH") {
            self.font_path = Some(PathBuf::from(val));
        }
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("default_confidence", self.default_confidence),
            ("plate_confidence", self.plate_confidence),
            ("iou_threshold", self.iou_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{} must be between 0.0 and 1.0, got {}", name, value);
            }
        }
        if self.input_size == 0 || self.input_size % 32 != 0 {
            bail!("input_size must be a positive multiple of 32, got {}", self.input_size);
        }
        if self.max_concurrent_inferences == 0 {
            bail!("max_concurrent_inferences must be at least 1");
        }
        if self.max_upload_bytes == 0 {
            bail!("max_upload_bytes must be positive");
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            bail!("jpeg_quality must be between 1 and 100, got {}", self.jpeg_quality);
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }

    pub fn yolo_config(&self) -> YoloConfig {
        YoloConfig {
            model_path: self.model_path.clone(),
            input_size: self.input_size,
            iou_threshold: self.iou_threshold,
            max_detections: self.max_detections,
            intra_threads: self.intra_threads,
            use_cuda: self.use_cuda,
        }
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            max_concurrent: self.max_concurrent_inferences,
            queue_timeout: Duration::from_millis(self.queue_timeout_ms),
            inference_timeout: Duration::from_secs(self.inference_timeout_secs),
        }
    }

    pub fn encode_format(&self) -> EncodeFormat {
        EncodeFormat::Jpeg {
            quality: self.jpeg_quality,
        }
    }

    /// HTTP body limit: base64 inflates payloads by 4/3, plus JSON/multipart framing
    pub fn body_limit(&self) -> usize {
        self.max_upload_bytes / 3 * 4 + 64 * 1024
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, target: &mut T) {
    if let Ok(val) = std::env::var(key) {
        match val.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => tracing::warn!("Ignoring invalid value for {}: {:?}", key, val),
        }
    }
}
