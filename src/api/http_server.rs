// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared application state and the HTTP router

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::Request,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use uuid::Uuid;

use super::detect::{detect_base64_handler, detect_handler};
use super::handlers::{classes_handler, health_handler, not_found_handler, root_handler};
use super::pipeline::DetectionPipeline;
use super::plate::plate_recognize_handler;
use crate::config::ServiceConfig;
use crate::vision::{
    Annotator, ClassRegistry, DetectionExecutor, Detector, DetectorLoader, DetectorManager,
    OnnxYoloLoader, VehicleFilter,
};

/// State shared by every handler
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub registry: Arc<ClassRegistry>,
    pub pipeline: Arc<DetectionPipeline>,
    pub vehicle_filter: VehicleFilter,
}

impl AppState {
    /// Production state: the detector is loaded lazily from `config.model_path`
    pub fn from_config(config: ServiceConfig) -> Result<Self> {
        let loader: Arc<dyn DetectorLoader> = Arc::new(OnnxYoloLoader::new(config.yolo_config()));
        let models = DetectorManager::new(config.model_name.clone(), loader);
        Self::build(config, models)
    }

    /// State around an already-built detector
    pub fn with_detector(config: ServiceConfig, detector: Arc<dyn Detector>) -> Result<Self> {
        let models = DetectorManager::with_detector(config.model_name.clone(), detector);
        Self::build(config, models)
    }

    fn build(config: ServiceConfig, models: DetectorManager) -> Result<Self> {
        let registry = Arc::new(match &config.class_labels_path {
            Some(path) => ClassRegistry::from_labels_file(path)
                .with_context(|| format!("Failed to load class labels {}", path.display()))?,
            None => ClassRegistry::coco(),
        });
        info!("Class registry ready: {} classes", registry.len());

        let annotator = match &config.font_path {
            Some(path) => Annotator::from_font_file(registry.clone(), path)?,
            None => Annotator::new(registry.clone())?,
        };

        let executor = DetectionExecutor::new(registry.clone(), config.executor_config());
        let pipeline = DetectionPipeline::new(
            Arc::new(models),
            Arc::new(executor),
            Arc::new(annotator),
            config.encode_format(),
            config.max_upload_bytes,
        );

        let vehicle_filter = VehicleFilter::from_registry(&registry);

        Ok(Self {
            config: Arc::new(config),
            registry,
            pipeline: Arc::new(pipeline),
            vehicle_filter,
        })
    }
}

/// UUID v4 request ids for requests that arrive without one
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Build the service router
pub fn create_app(state: Arc<AppState>) -> Router {
    let body_limit = state.config.body_limit();

    Router::new()
        // Metadata
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/api/classes", get(classes_handler))
        // Detection
        .route("/api/detect", post(detect_handler))
        .route("/api/detect/base64", post(detect_base64_handler))
        .route("/api/plate/recognize", post(plate_recognize_handler))
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
