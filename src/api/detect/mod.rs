// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Object detection endpoints
//!
//! - `POST /api/detect` takes a multipart upload
//! - `POST /api/detect/base64` takes a JSON body with base64 image data

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{detect_base64_handler, detect_handler};
pub use request::{Base64DetectRequest, DetectQuery};
pub use response::DetectionResponse;
