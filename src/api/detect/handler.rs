// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection endpoint handlers

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::HeaderMap,
    Json,
};
use axum_extra::extract::{multipart::MultipartRejection, Multipart};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::request::{Base64DetectRequest, DetectQuery};
use super::response::DetectionResponse;
use crate::api::errors::{ApiError, ApiErrorResponse};
use crate::api::http_server::AppState;
use crate::api::pipeline::{DetectOptions, ImageInput};
use crate::api::upload::{read_image_upload, request_id};

/// POST /api/detect - Detect objects in an uploaded image
///
/// # Request
/// - multipart body with the image in a field named `image` or `file`
/// - `confidence` query parameter (0.0-1.0), defaults to 0.5
/// - `drawBoxes` query parameter, defaults to true
///
/// # Response
/// - `success`, `count`, `detections`
/// - `annotatedImage`: base64 JPEG, only when `drawBoxes` is true
/// - `requestId`, `processingTimeMs`
///
/// # Errors
/// - 400 Bad Request: missing/undecodable image, bad query parameters
/// - 500 Internal Server Error: model unavailable, inference or encoding failure
/// - 503 Service Unavailable: all inference slots busy
/// - 504 Gateway Timeout: inference exceeded its deadline
pub async fn detect_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<DetectQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DetectionResponse>, ApiErrorResponse> {
    let request_id = request_id(&headers);
    let started = Instant::now();
    debug!("[{}] Detect upload request received", request_id);

    // 1. Resolve options
    let Query(query) = query.map_err(|e| {
        ApiError::InvalidRequest(format!("invalid query parameters: {}", e))
            .reject(&request_id)
    })?;
    let confidence = query
        .resolve_confidence(state.config.default_confidence)
        .map_err(|e| e.reject(&request_id))?;

    // 2. Read the upload
    let multipart = multipart.map_err(|e| {
        ApiError::InvalidImage(format!("expected a multipart/form-data upload: {}", e))
            .reject(&request_id)
    })?;
    let bytes = read_image_upload(multipart)
        .await
        .map_err(|e| e.reject(&request_id))?;

    // 3. Run the pipeline
    let output = state
        .pipeline
        .run(
            ImageInput::Bytes(bytes),
            DetectOptions {
                confidence,
                draw_boxes: query.draw_boxes,
            },
        )
        .await
        .map_err(|e| ApiError::from(e.error).with_request_id(&request_id))?;

    let processing_time_ms = started.elapsed().as_millis() as u64;
    info!(
        "[{}] Detection complete: {} objects, {}ms",
        request_id,
        output.detections.len(),
        processing_time_ms
    );

    Ok(Json(DetectionResponse::assemble(
        output.detections,
        output.annotated_image,
        request_id,
        processing_time_ms,
    )))
}

/// POST /api/detect/base64 - Detect objects in a base64-encoded image
///
/// # Request
/// - `image`: base64 image data or data URI (required)
/// - `confidence`: 0.0-1.0, defaults to 0.5
/// - `drawBoxes`: defaults to true
///
/// # Errors
/// Same as `/api/detect`; malformed base64 is reported as `invalid_encoding`.
pub async fn detect_base64_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<Base64DetectRequest>, JsonRejection>,
) -> Result<Json<DetectionResponse>, ApiErrorResponse> {
    let request_id = request_id(&headers);
    let started = Instant::now();
    debug!("[{}] Detect base64 request received", request_id);

    // 1. Validate request
    let Json(request) = payload.map_err(|e| {
        ApiError::InvalidRequest(format!("invalid JSON body: {}", e)).reject(&request_id)
    })?;
    request.validate().map_err(|e| e.reject(&request_id))?;
    let confidence = request
        .resolve_confidence(state.config.default_confidence)
        .map_err(|e| e.reject(&request_id))?;

    let image = request.image.unwrap_or_default();

    // 2. Run the pipeline
    let output = state
        .pipeline
        .run(
            ImageInput::Base64(image),
            DetectOptions {
                confidence,
                draw_boxes: request.draw_boxes,
            },
        )
        .await
        .map_err(|e| ApiError::from(e.error).with_request_id(&request_id))?;

    let processing_time_ms = started.elapsed().as_millis() as u64;
    info!(
        "[{}] Detection complete: {} objects, {}ms",
        request_id,
        output.detections.len(),
        processing_time_ms
    );

    Ok(Json(DetectionResponse::assemble(
        output.detections,
        output.annotated_image,
        request_id,
        processing_time_ms,
    )))
}
