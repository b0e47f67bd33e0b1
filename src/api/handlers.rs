// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service metadata handlers: root, health, class list and the JSON 404

use axum::{extract::State, http::Uri, Json};
use serde::Serialize;
use std::sync::Arc;

use super::errors::ApiError;
use super::http_server::AppState;
use crate::version;

#[derive(Debug, Clone, Serialize)]
pub struct EndpointList {
    pub detect: &'static str,
    pub detect_base64: &'static str,
    pub plate: &'static str,
    pub classes: &'static str,
    pub health: &'static str,
}

impl Default for EndpointList {
    fn default() -> Self {
        Self {
            detect: "POST /api/detect",
            detect_base64: "POST /api/detect/base64",
            plate: "POST /api/plate/recognize",
            classes: "GET /api/classes",
            health: "GET /health",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RootResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub endpoints: EndpointList,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always "OK" while the process serves requests
    pub status: String,
    pub model: String,
    /// False until the detector has been built
    pub model_loaded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassInfo {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassesResponse {
    pub count: usize,
    pub classes: Vec<ClassInfo>,
}

/// GET /
pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        status: "running".to_string(),
        service: version::SERVICE_NAME.to_string(),
        version: version::VERSION_NUMBER.to_string(),
        endpoints: EndpointList::default(),
    })
}

/// GET /health
///
/// Never triggers a model load.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let info = state.pipeline.models().info();
    Json(HealthResponse {
        status: "OK".to_string(),
        model: info.name,
        model_loaded: info.loaded,
    })
}

/// GET /api/classes
pub async fn classes_handler(State(state): State<Arc<AppState>>) -> Json<ClassesResponse> {
    let classes: Vec<ClassInfo> = state
        .registry
        .entries()
        .map(|entry| ClassInfo {
            id: entry.id,
            name: entry.name.clone(),
        })
        .collect();

    Json(ClassesResponse {
        count: classes.len(),
        classes,
    })
}

/// Fallback for unknown routes
pub async fn not_found_handler(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("no route for {}", uri.path()))
}
