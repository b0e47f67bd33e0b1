// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

use crate::vision::VisionError;

/// Uniform JSON error body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Human readable message
    pub detail: String,
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    /// Bytes do not form a decodable image
    InvalidImage(String),
    /// Transport encoding (base64) is malformed
    InvalidEncoding(String),
    InvalidRequest(String),
    ValidationError {
        field: String,
        message: String,
    },
    NotFound(String),
    /// Detector could not be initialized
    ModelUnavailable(String),
    /// Detector failed during a call
    InferenceFailed(String),
    /// Annotation or re-encoding failed after inference
    EncodeFailed(String),
    /// Admission control rejected the request
    ServiceUnavailable(String),
    Timeout(String),
    InternalError(String),
}

impl ApiError {
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::InvalidImage(_) => "invalid_image",
            ApiError::InvalidEncoding(_) => "invalid_encoding",
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::ValidationError { .. } => "validation_error",
            ApiError::NotFound(_) => "not_found",
            ApiError::ModelUnavailable(_) => "model_unavailable",
            ApiError::InferenceFailed(_) => "inference_failed",
            ApiError::EncodeFailed(_) => "encode_failed",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
            ApiError::Timeout(_) => "timeout",
            ApiError::InternalError(_) => "internal_error",
        }
    }

    pub fn to_response(&self, request_id: Option<String>) -> ErrorResponse {
        let details = match self {
            ApiError::ValidationError { field, .. } => {
                let mut details = HashMap::new();
                details.insert(
                    "field".to_string(),
                    serde_json::Value::String(field.clone()),
                );
                Some(details)
            }
            _ => None,
        };

        ErrorResponse {
            detail: self.to_string(),
            error_type: self.error_type().to_string(),
            request_id,
            details,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidImage(_)
            | ApiError::InvalidEncoding(_)
            | ApiError::InvalidRequest(_)
            | ApiError::ValidationError { .. } => 400,
            ApiError::NotFound(_) => 404,
            ApiError::ModelUnavailable(_)
            | ApiError::InferenceFailed(_)
            | ApiError::EncodeFailed(_)
            | ApiError::InternalError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
            ApiError::Timeout(_) => 504,
        }
    }

    /// True for failures caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }

    pub fn with_request_id(self, request_id: impl Into<String>) -> ApiErrorResponse {
        ApiErrorResponse {
            error: self,
            request_id: Some(request_id.into()),
        }
    }

    /// Log a request turned away before detection and attach its id
    pub fn reject(self, request_id: &str) -> ApiErrorResponse {
        warn!(
            "[{}] Request rejected ({}): {}",
            request_id,
            self.error_type(),
            self
        );
        self.with_request_id(request_id)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidImage(msg) => write!(f, "Invalid image: {}", msg),
            ApiError::InvalidEncoding(msg) => write!(f, "Invalid encoding: {}", msg),
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ModelUnavailable(msg) => write!(f, "Model unavailable: {}", msg),
            ApiError::InferenceFailed(msg) => write!(f, "Inference failed: {}", msg),
            ApiError::EncodeFailed(msg) => write!(f, "Encoding failed: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::Timeout(msg) => write!(f, "Request timed out: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<VisionError> for ApiError {
    fn from(err: VisionError) -> Self {
        match err {
            VisionError::InvalidImage(msg) => ApiError::InvalidImage(msg),
            VisionError::InvalidEncoding(msg) => ApiError::InvalidEncoding(msg),
            VisionError::InvalidThreshold(value) => ApiError::ValidationError {
                field: "confidence".to_string(),
                message: format!("must be between 0.0 and 1.0, got {}", value),
            },
            VisionError::ModelUnavailable(msg) => ApiError::ModelUnavailable(msg),
            VisionError::InferenceFailed(msg) => ApiError::InferenceFailed(msg),
            VisionError::InferenceTimeout(ms) => {
                ApiError::Timeout(format!("inference exceeded {} ms", ms))
            }
            VisionError::Overloaded(ms) => ApiError::ServiceUnavailable(format!(
                "all inference slots busy for {} ms, retry later",
                ms
            )),
            VisionError::EncodeFailed(msg) => ApiError::EncodeFailed(msg),
            VisionError::Config(msg) => ApiError::InternalError(msg),
        }
    }
}

/// HTTP error: an [`ApiError`] plus the request it belongs to
#[derive(Debug)]
pub struct ApiErrorResponse {
    pub error: ApiError,
    pub request_id: Option<String>,
}

impl From<ApiError> for ApiErrorResponse {
    fn from(error: ApiError) -> Self {
        Self {
            error,
            request_id: None,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let error_response = self.error.to_response(self.request_id);

        (status, Json(error_response)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        ApiErrorResponse::from(self).into_response()
    }
}
