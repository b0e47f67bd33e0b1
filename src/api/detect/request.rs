// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection request types and validation

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::api::errors::ApiError;

fn default_draw_boxes() -> bool {
    true
}

/// Flag spellings clients send in query strings and JSON bodies
#[derive(Deserialize)]
#[serde(untagged)]
enum FlagValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// Accepts true/false, 1/0, yes/no and on/off, case-insensitive
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match FlagValue::deserialize(deserializer)? {
        FlagValue::Bool(value) => Ok(value),
        FlagValue::Int(1) => Ok(true),
        FlagValue::Int(0) => Ok(false),
        FlagValue::Int(other) => Err(de::Error::custom(format!(
            "invalid boolean flag: {}",
            other
        ))),
        FlagValue::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(de::Error::custom(format!("invalid boolean flag: {}", text))),
        },
    }
}

/// Query parameters for POST /api/detect
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectQuery {
    /// Minimum confidence (0.0-1.0); service default when absent
    #[serde(default)]
    pub confidence: Option<f32>,

    /// Return an annotated image
    #[serde(
        default = "default_draw_boxes",
        alias = "draw_boxes",
        deserialize_with = "deserialize_flag"
    )]
    pub draw_boxes: bool,
}

impl Default for DetectQuery {
    fn default() -> Self {
        Self {
            confidence: None,
            draw_boxes: true,
        }
    }
}

impl DetectQuery {
    pub fn resolve_confidence(&self, default: f32) -> Result<f32, ApiError> {
        validate_confidence(self.confidence.unwrap_or(default))
    }
}

/// Body for POST /api/detect/base64
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Base64DetectRequest {
    /// Base64-encoded image data (plain or data URI)
    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub confidence: Option<f32>,

    #[serde(
        default = "default_draw_boxes",
        alias = "draw_boxes",
        deserialize_with = "deserialize_flag"
    )]
    pub draw_boxes: bool,
}

impl Base64DetectRequest {
    /// Validate the request
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.image.as_ref().map(|s| s.trim().is_empty()).unwrap_or(true) {
            return Err(ApiError::ValidationError {
                field: "image".to_string(),
                message: "image is required".to_string(),
            });
        }

        if let Some(confidence) = self.confidence {
            validate_confidence(confidence)?;
        }

        Ok(())
    }

    pub fn resolve_confidence(&self, default: f32) -> Result<f32, ApiError> {
        validate_confidence(self.confidence.unwrap_or(default))
    }
}

fn validate_confidence(confidence: f32) -> Result<f32, ApiError> {
    if !(0.0..=1.0).contains(&confidence) {
        return Err(ApiError::ValidationError {
            field: "confidence".to_string(),
            message: format!("confidence must be between 0.0 and 1.0, got {}", confidence),
        });
    }
    Ok(confidence)
}
