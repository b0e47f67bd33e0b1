// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Concurrency limits and deadlines on inference

use axum::http::StatusCode;
use fabstir_detect_node::config::ServiceConfig;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

use super::support::*;

#[tokio::test]
async fn test_busy_slots_return_503() {
    let config = ServiceConfig {
        max_concurrent_inferences: 1,
        queue_timeout_ms: 50,
        ..Default::default()
    };
    let detector = Arc::new(SlowDetector {
        delay: Duration::from_millis(400),
    });
    let app = app_with_config(config, detector);

    let image = png_image(16, 16);
    let first = app.clone().oneshot(multipart_request(
        "/api/detect?drawBoxes=false",
        "file",
        &image,
    ));
    let second = async {
        // Let the first request take the only slot
        tokio::time::sleep(Duration::from_millis(100)).await;
        app.clone()
            .oneshot(multipart_request("/api/detect?drawBoxes=false", "file", &image))
            .await
    };

    let (first, second) = tokio::join!(first, second);
    assert_eq!(first.unwrap().status(), StatusCode::OK);

    let second = second.unwrap();
    assert_eq!(second.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(second).await;
    assert_eq!(body["errorType"], "service_unavailable");
}

#[tokio::test]
async fn test_slow_inference_returns_504() {
    let config = ServiceConfig {
        inference_timeout_secs: 1,
        ..Default::default()
    };
    let detector = Arc::new(SlowDetector {
        delay: Duration::from_millis(1500),
    });
    let app = app_with_config(config, detector);

    let response = app
        .oneshot(multipart_request("/api/detect", "file", &png_image(16, 16)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body = body_json(response).await;
    assert_eq!(body["errorType"], "timeout");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_requests_within_capacity() {
    let detector = Arc::new(FixedDetector::new(street_detections()));
    let app = app_with(detector.clone());
    let image = png_image(64, 64);

    let requests = (0..4).map(|_| {
        app.clone()
            .oneshot(multipart_request("/api/detect?drawBoxes=false", "file", &image))
    });
    let responses = futures_util::future::join_all(requests).await;

    for response in responses {
        assert_eq!(response.unwrap().status(), StatusCode::OK);
    }
    assert_eq!(detector.calls(), 4);
}
