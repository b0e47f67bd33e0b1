// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection response types

use serde::Serialize;

use crate::vision::Detection;

/// Response from POST /api/detect and /api/detect/base64
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResponse {
    pub success: bool,
    /// Always `detections.len()`
    pub count: usize,
    pub detections: Vec<Detection>,
    /// Base64 JPEG with boxes drawn; omitted when not requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated_image: Option<String>,
    pub request_id: String,
    pub processing_time_ms: u64,
}

impl DetectionResponse {
    /// Package a finished detection run
    pub fn assemble(
        detections: Vec<Detection>,
        annotated_image: Option<String>,
        request_id: String,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            success: true,
            count: detections.len(),
            detections,
            annotated_image,
            request_id,
            processing_time_ms,
        }
    }
}
