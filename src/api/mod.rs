// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod detect;
pub mod errors;
pub mod handlers;
pub mod http_server;
pub mod pipeline;
pub mod plate;
pub mod server;
pub mod upload;

pub use detect::{
    detect_base64_handler, detect_handler, Base64DetectRequest, DetectQuery, DetectionResponse,
};
pub use errors::{ApiError, ApiErrorResponse, ErrorResponse};
pub use handlers::{ClassesResponse, HealthResponse, RootResponse};
pub use http_server::{create_app, AppState};
pub use pipeline::{DetectOptions, DetectionPipeline, ImageInput, PipelineError, Stage};
pub use plate::{plate_recognize_handler, PlateRecognitionResponse};
pub use server::DetectionServer;
