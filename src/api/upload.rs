// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Helpers shared by the upload endpoints: request ids and multipart reading

use axum::http::HeaderMap;
use axum_extra::extract::Multipart;
use bytes::Bytes;
use tracing::debug;
use uuid::Uuid;

use super::errors::ApiError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Multipart field names accepted for the image, in preference order
pub const IMAGE_FIELD_NAMES: [&str; 2] = ["image", "file"];

/// Caller-supplied `X-Request-ID`, or a fresh UUID v4
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Read the uploaded image from a multipart body.
///
/// Takes the first field named `image` or `file`; when neither is present the
/// first field of any name is used.
pub async fn read_image_upload(mut multipart: Multipart) -> Result<Bytes, ApiError> {
    let mut fallback: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidImage(format!("failed to read upload: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let is_image_field = IMAGE_FIELD_NAMES.contains(&name.as_str());

        if !is_image_field && fallback.is_some() {
            continue;
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidImage(format!("failed to read upload: {}", e)))?;

        if is_image_field {
            debug!("Read image field '{}' ({} bytes)", name, data.len());
            return Ok(data);
        }
        fallback = Some(data);
    }

    fallback.ok_or_else(|| ApiError::InvalidImage("no image file in upload".to_string()))
}
