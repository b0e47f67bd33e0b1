// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /api/detect tests
//!
//! These tests verify that:
//! - Undecodable or empty uploads are rejected with 400
//! - Blank images produce an empty, successful response
//! - The confidence query parameter filters detections
//! - drawBoxes controls the annotatedImage field
//! - Request ids are echoed back

use axum::http::StatusCode;
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`

use super::support::*;

#[tokio::test]
async fn test_empty_upload_is_rejected() {
    let detector = Arc::new(FixedDetector::new(street_detections()));
    let app = app_with(detector.clone());

    let response = app
        .oneshot(multipart_request("/api/detect", "file", &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["errorType"], "invalid_image");
    assert!(body["detail"].as_str().unwrap().contains("Invalid image"));
    // Decode failures never reach the detector
    assert_eq!(detector.calls(), 0);
}

#[tokio::test]
async fn test_non_multipart_body_is_rejected() {
    let app = app_with(Arc::new(FixedDetector::empty()));

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/detect")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["errorType"], "invalid_image");
}

#[tokio::test]
async fn test_corrupt_upload_is_rejected() {
    let app = app_with(Arc::new(FixedDetector::empty()));

    let response = app
        .oneshot(multipart_request("/api/detect", "file", b"definitely not an image"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_blank_image_high_confidence_returns_nothing() {
    let app = app_with(Arc::new(FixedDetector::empty()));

    let response = app
        .oneshot(multipart_request(
            "/api/detect?confidence=0.9",
            "file",
            &png_image(320, 240),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 0);
    assert_eq!(body["detections"], serde_json::json!([]));
}

#[tokio::test]
async fn test_default_confidence_and_annotation() {
    let app = app_with(Arc::new(FixedDetector::new(street_detections())));

    let response = app
        .oneshot(multipart_request("/api/detect", "image", &png_image(200, 120)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    // The car at 0.4 falls below the 0.5 default
    assert_eq!(body["count"], 2);
    let names: Vec<&str> = body["detections"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["className"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"person"));
    assert!(names.contains(&"truck"));
    assert!(!names.contains(&"car"));

    let annotated = body["annotatedImage"].as_str().unwrap();
    let (image, _) = fabstir_detect_node::vision::decode_base64_image(annotated).unwrap();
    assert_eq!((image.width(), image.height()), (200, 120));
}

#[tokio::test]
async fn test_draw_boxes_false_omits_image() {
    let app = app_with(Arc::new(FixedDetector::new(street_detections())));

    let response = app
        .oneshot(multipart_request(
            "/api/detect?drawBoxes=false",
            "file",
            &png_image(200, 120),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body.get("annotatedImage").is_none());
    assert!(body["count"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_draw_boxes_numeric_flags() {
    let detector = Arc::new(FixedDetector::new(street_detections()));

    let response = app_with(detector.clone())
        .oneshot(multipart_request(
            "/api/detect?drawBoxes=0",
            "file",
            &png_image(200, 120),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await.get("annotatedImage").is_none());

    let response = app_with(detector)
        .oneshot(multipart_request(
            "/api/detect?draw_boxes=1",
            "file",
            &png_image(200, 120),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["annotatedImage"].is_string());
}

#[tokio::test]
async fn test_draw_boxes_capitalized_false() {
    let app = app_with(Arc::new(FixedDetector::new(street_detections())));

    let response = app
        .oneshot(multipart_request(
            "/api/detect?drawBoxes=False",
            "file",
            &png_image(200, 120),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await.get("annotatedImage").is_none());
}

#[tokio::test]
async fn test_raising_confidence_never_adds_detections() {
    let mut previous = usize::MAX;
    for confidence in ["0.1", "0.3", "0.5", "0.9", "1.0"] {
        let app = app_with(Arc::new(FixedDetector::new(street_detections())));
        let uri = format!("/api/detect?confidence={}&drawBoxes=false", confidence);
        let response = app
            .oneshot(multipart_request(&uri, "file", &png_image(200, 120)))
            .await
            .unwrap();

        let count = body_json(response).await["count"].as_u64().unwrap() as usize;
        assert!(count <= previous, "count rose at confidence {}", confidence);
        previous = count;
    }
}

#[tokio::test]
async fn test_boxes_stay_inside_image() {
    let detector = FixedDetector::new(vec![raw(2, 0.9, [-30.0, 50.0, 500.0, 10.0])]);
    let app = app_with(Arc::new(detector));

    let response = app
        .oneshot(multipart_request(
            "/api/detect?drawBoxes=false",
            "file",
            &png_image(100, 80),
        ))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["detections"][0]["bbox"], serde_json::json!([0, 10, 100, 50]));
}

#[tokio::test]
async fn test_invalid_confidence_is_rejected() {
    let app = app_with(Arc::new(FixedDetector::empty()));

    let response = app
        .oneshot(multipart_request(
            "/api/detect?confidence=1.5",
            "file",
            &png_image(10, 10),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["errorType"], "validation_error");
}

#[tokio::test]
async fn test_inference_failure_is_server_error() {
    let app = app_with(Arc::new(BrokenDetector));

    let response = app
        .oneshot(multipart_request("/api/detect", "file", &png_image(10, 10)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["errorType"], "inference_failed");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = app_with(Arc::new(FixedDetector::empty()));

    let mut request = multipart_request("/api/detect?drawBoxes=false", "file", &png_image(10, 10));
    request
        .headers_mut()
        .insert("x-request-id", "trace-1234".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "trace-1234");
    let body = body_json(response).await;
    assert_eq!(body["requestId"], "trace-1234");
}

#[tokio::test]
async fn test_request_id_generated_when_absent() {
    let app = app_with(Arc::new(FixedDetector::empty()));

    let response = app
        .oneshot(multipart_request("/api/detect?drawBoxes=false", "file", &png_image(10, 10)))
        .await
        .unwrap();

    let header = response.headers()["x-request-id"].to_str().unwrap().to_string();
    let body = body_json(response).await;
    assert_eq!(body["requestId"], header.as_str());
    assert!(uuid::Uuid::parse_str(&header).is_ok());
}
