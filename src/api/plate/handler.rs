// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plate recognition endpoint handler

use axum::{extract::State, http::HeaderMap, Json};
use axum_extra::extract::{multipart::MultipartRejection, Multipart};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::response::PlateRecognitionResponse;
use crate::api::errors::{ApiError, ApiErrorResponse};
use crate::api::http_server::AppState;
use crate::api::pipeline::{DetectOptions, ImageInput};
use crate::api::upload::{read_image_upload, request_id};

/// POST /api/plate/recognize - Find vehicles and their likely plate regions
///
/// Runs detection at the plate threshold (0.3 by default, lower than
/// `/api/detect`) and keeps only car, bus and truck detections. No image is
/// annotated.
///
/// # Response
/// - `vehicleCount`, `vehicles` (`type`, `confidence`, `bbox`, `plateRegion`)
/// - `message`: "{n} vehicles detected" ("1 vehicle detected" for one)
pub async fn plate_recognize_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PlateRecognitionResponse>, ApiErrorResponse> {
    let request_id = request_id(&headers);
    let started = Instant::now();
    debug!("[{}] Plate recognition request received", request_id);

    // 1. Read the upload
    let multipart = multipart.map_err(|e| {
        ApiError::InvalidImage(format!("expected a multipart/form-data upload: {}", e))
            .reject(&request_id)
    })?;
    let bytes = read_image_upload(multipart)
        .await
        .map_err(|e| e.reject(&request_id))?;

    // 2. Detect at the plate threshold
    let output = state
        .pipeline
        .run(
            ImageInput::Bytes(bytes),
            DetectOptions {
                confidence: state.config.plate_confidence,
                draw_boxes: false,
            },
        )
        .await
        .map_err(|e| ApiError::from(e.error).with_request_id(&request_id))?;

    // 3. Keep vehicles only
    let summary = state.vehicle_filter.filter(&output.detections);

    let processing_time_ms = started.elapsed().as_millis() as u64;
    info!(
        "[{}] Plate recognition complete: {} of {} detections are vehicles, {}ms",
        request_id,
        summary.count(),
        output.detections.len(),
        processing_time_ms
    );

    Ok(Json(PlateRecognitionResponse::new(
        summary,
        request_id,
        processing_time_ms,
    )))
}
