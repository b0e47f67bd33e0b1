// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /api/plate/recognize tests

use axum::http::StatusCode;
use std::sync::Arc;
use tower::util::ServiceExt;

use super::support::*;

#[tokio::test]
async fn test_low_confidence_car_is_reported() {
    // 0.4 is below the detect default but above the plate threshold
    let detector = FixedDetector::new(vec![raw(2, 0.4, [50.0, 40.0, 150.0, 100.0])]);
    let app = app_with(Arc::new(detector));

    let response = app
        .oneshot(multipart_request(
            "/api/plate/recognize",
            "file",
            &png_image(200, 120),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["vehicleCount"], 1);
    assert_eq!(body["vehicles"][0]["type"], "car");
    assert_eq!(body["vehicles"][0]["bbox"], serde_json::json!([50, 40, 150, 100]));
    assert_eq!(body["message"], "1 vehicle detected");
}

#[tokio::test]
async fn test_non_vehicles_are_dropped() {
    let app = app_with(Arc::new(FixedDetector::new(street_detections())));

    let response = app
        .oneshot(multipart_request(
            "/api/plate/recognize",
            "image",
            &png_image(200, 120),
        ))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["vehicleCount"], 2);
    let types: Vec<&str> = body["vehicles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["type"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["car", "truck"]);

    // Bottom 30% of the car box
    assert_eq!(
        body["vehicles"][0]["plateRegion"],
        serde_json::json!({ "x": 50, "y": 82, "width": 100, "height": 18 })
    );
}

#[tokio::test]
async fn test_below_plate_threshold_is_ignored() {
    let detector = FixedDetector::new(vec![raw(5, 0.2, [0.0, 0.0, 50.0, 50.0])]);
    let app = app_with(Arc::new(detector));

    let response = app
        .oneshot(multipart_request(
            "/api/plate/recognize",
            "file",
            &png_image(64, 64),
        ))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["vehicleCount"], 0);
    assert_eq!(body["vehicles"], serde_json::json!([]));
    assert_eq!(body["message"], "0 vehicles detected");
}

#[tokio::test]
async fn test_plate_rejects_empty_upload() {
    let app = app_with(Arc::new(FixedDetector::empty()));

    let response = app
        .oneshot(multipart_request("/api/plate/recognize", "file", &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_custom_labels_resolve_vehicles_by_name() {
    let mut labels = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(&mut labels, b"plate\nperson\ntruck\ncar\n").unwrap();

    let config = fabstir_detect_node::config::ServiceConfig {
        class_labels_path: Some(labels.path().to_path_buf()),
        ..Default::default()
    };
    // id 2 is a truck and id 0 a plate under these labels
    let detector = FixedDetector::new(vec![
        raw(0, 0.9, [10.0, 10.0, 40.0, 20.0]),
        raw(2, 0.8, [50.0, 40.0, 150.0, 100.0]),
    ]);
    let app = app_with_config(config, Arc::new(detector));

    let response = app
        .oneshot(multipart_request(
            "/api/plate/recognize",
            "file",
            &png_image(200, 120),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["vehicleCount"], 1);
    assert_eq!(body["vehicles"][0]["type"], "truck");
    assert_eq!(body["message"], "1 vehicle detected");
}
