// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared helpers for the endpoint tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};
use fabstir_detect_node::{
    api::http_server::{create_app, AppState},
    config::ServiceConfig,
    vision::{encode_image, Detector, EncodeFormat, RawDetection},
};
use image::{DynamicImage, Rgb, RgbImage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const BOUNDARY: &str = "----fabstir-detect-test-boundary";

/// Detector returning a fixed set of boxes, filtered by the requested confidence
#[derive(Debug, Default)]
pub struct FixedDetector {
    detections: Vec<RawDetection>,
    calls: AtomicUsize,
}

impl FixedDetector {
    pub fn new(detections: Vec<RawDetection>) -> Self {
        Self {
            detections,
            calls: AtomicUsize::new(0),
        }
    }

    /// Nothing is ever found
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Detector for FixedDetector {
    fn detect(&self, _image: &DynamicImage, confidence: f32) -> anyhow::Result<Vec<RawDetection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .detections
            .iter()
            .filter(|d| d.confidence >= confidence)
            .cloned()
            .collect())
    }
}

/// Detector that always fails
pub struct BrokenDetector;

impl Detector for BrokenDetector {
    fn detect(&self, _image: &DynamicImage, _confidence: f32) -> anyhow::Result<Vec<RawDetection>> {
        anyhow::bail!("output tensor has unexpected shape")
    }
}

pub fn raw(class_id: u32, confidence: f32, bbox: [f32; 4]) -> RawDetection {
    RawDetection {
        class_id,
        confidence,
        bbox,
    }
}

/// Street scene: a person, a car at 0.4 and a truck at 0.85
pub fn street_detections() -> Vec<RawDetection> {
    vec![
        raw(0, 0.92, [10.0, 10.0, 40.0, 90.0]),
        raw(2, 0.4, [50.0, 40.0, 150.0, 100.0]),
        raw(7, 0.85, [20.0, 5.0, 120.0, 60.0]),
    ]
}

pub fn app_with(detector: Arc<dyn Detector>) -> Router {
    app_with_config(ServiceConfig::default(), detector)
}

pub fn app_with_config(config: ServiceConfig, detector: Arc<dyn Detector>) -> Router {
    let state = AppState::with_detector(config, detector).expect("state");
    create_app(Arc::new(state))
}

/// Solid-color PNG
pub fn png_image(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([128, 128, 128])));
    encode_image(&img, EncodeFormat::Png).expect("encode png")
}

/// Multipart body holding one file field
pub fn multipart_body(field: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"upload.png\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_request(uri: &str, field: &str, data: &[u8]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(field, data)))
        .unwrap()
}

pub fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Detector that blocks its worker thread before answering
pub struct SlowDetector {
    pub delay: std::time::Duration,
}

impl Detector for SlowDetector {
    fn detect(&self, _image: &DynamicImage, _confidence: f32) -> anyhow::Result<Vec<RawDetection>> {
        std::thread::sleep(self.delay);
        Ok(Vec::new())
    }
}
