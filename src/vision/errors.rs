// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for the detection pipeline

use thiserror::Error;

use super::image_utils::ImageError;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("Invalid confidence threshold {0}: must be between 0.0 and 1.0")]
    InvalidThreshold(f32),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Inference timed out after {0} ms")]
    InferenceTimeout(u64),

    #[error("No inference slot became free within {0} ms")]
    Overloaded(u64),

    #[error("Encoding failed: {0}")]
    EncodeFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl VisionError {
    /// Classify a decode-side image error into the client-facing taxonomy
    pub fn from_decode(err: ImageError) -> Self {
        if err.is_encoding_error() {
            VisionError::InvalidEncoding(err.to_string())
        } else {
            VisionError::InvalidImage(err.to_string())
        }
    }
}

pub type VisionResult<T> = Result<T, VisionError>;
