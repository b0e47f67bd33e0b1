// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Fabstir Detection Node

/// Full version string with feature description
pub const VERSION: &str = "v1.0.0-object-detection-2025-11-04";

/// Semantic version number
pub const VERSION_NUMBER: &str = "1.0.0";

pub const VERSION_MAJOR: u32 = 1;
pub const VERSION_MINOR: u32 = 0;
pub const VERSION_PATCH: u32 = 0;

/// Build date
pub const BUILD_DATE: &str = "2025-11-04";

/// Service name reported by `GET /`
pub const SERVICE_NAME: &str = "Fabstir Detection Node";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "object-detection",
    "multipart-upload",
    "base64-input",
    "box-annotation",
    "vehicle-filter",
    "plate-regions",
    "lazy-model-loading",
    "admission-control",
    "request-ids",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("{} {} ({})", SERVICE_NAME, VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info for API responses
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
