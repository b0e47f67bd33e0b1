// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /api/detect/base64 tests

use axum::http::StatusCode;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::json;
use std::sync::Arc;
use tower::util::ServiceExt;

use super::support::*;

#[tokio::test]
async fn test_base64_detection() {
    let app = app_with(Arc::new(FixedDetector::new(street_detections())));
    let image = STANDARD.encode(png_image(160, 120));

    let response = app
        .oneshot(json_request(
            "/api/detect/base64",
            json!({ "image": image, "confidence": 0.3, "drawBoxes": false }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 3);
    assert!(body.get("annotatedImage").is_none());
    assert!(body["processingTimeMs"].is_u64());
}

#[tokio::test]
async fn test_data_uri_is_accepted() {
    let app = app_with(Arc::new(FixedDetector::empty()));
    let image = format!("data:image/png;base64,{}", STANDARD.encode(png_image(32, 32)));

    let response = app
        .oneshot(json_request("/api/detect/base64", json!({ "image": image })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["count"], 0);
    // drawBoxes defaults to true
    assert!(body["annotatedImage"].is_string());
}

#[tokio::test]
async fn test_malformed_base64_is_encoding_error() {
    let detector = Arc::new(FixedDetector::empty());
    let app = app_with(detector.clone());

    let response = app
        .oneshot(json_request(
            "/api/detect/base64",
            json!({ "image": "this is not base64!!" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["errorType"], "invalid_encoding");
    assert_eq!(detector.calls(), 0);
}

#[tokio::test]
async fn test_valid_base64_invalid_image_is_image_error() {
    let app = app_with(Arc::new(FixedDetector::empty()));

    let response = app
        .oneshot(json_request(
            "/api/detect/base64",
            json!({ "image": STANDARD.encode(b"plain text, not pixels") }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["errorType"], "invalid_image");
}

#[tokio::test]
async fn test_missing_image_field() {
    let app = app_with(Arc::new(FixedDetector::empty()));

    let response = app
        .oneshot(json_request("/api/detect/base64", json!({ "confidence": 0.5 })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["errorType"], "validation_error");
    assert_eq!(body["details"]["field"], "image");
}

#[tokio::test]
async fn test_malformed_json_body() {
    let app = app_with(Arc::new(FixedDetector::empty()));

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/detect/base64")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["errorType"], "invalid_request");
}

#[tokio::test]
async fn test_line_wrapped_base64_is_accepted() {
    let app = app_with(Arc::new(FixedDetector::empty()));
    let encoded = STANDARD.encode(png_image(32, 32));
    let wrapped = encoded
        .as_bytes()
        .chunks(76)
        .map(|line| std::str::from_utf8(line).unwrap())
        .collect::<Vec<_>>()
        .join("\n");

    let response = app
        .oneshot(json_request(
            "/api/detect/base64",
            json!({ "image": wrapped, "drawBoxes": false }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 0);
}
