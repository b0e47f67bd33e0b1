// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! DetectorManager tests through the public API
//!
//! Once-only building and retry after failure are covered by the unit tests
//! in `model_manager.rs`. These cover:
//! - Reporting load state without triggering a load
//! - The ONNX loader surfacing missing weights as ModelUnavailable

use fabstir_detect_node::vision::{
    Detector, DetectorLoader, DetectorManager, OnnxYoloLoader, VisionError, YoloConfig,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Loader that only counts attempts
#[derive(Default)]
struct CountingLoader {
    builds: AtomicUsize,
}

impl DetectorLoader for CountingLoader {
    fn load(&self) -> anyhow::Result<Arc<dyn Detector>> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("not expected to load")
    }
}

#[tokio::test]
async fn test_info_does_not_load() {
    let loader = Arc::new(CountingLoader::default());
    let manager = DetectorManager::new("yolov8s", loader.clone());

    let info = manager.info();
    assert_eq!(info.name, "yolov8s");
    assert!(!info.loaded);
    assert!(!manager.is_loaded());
    assert_eq!(loader.builds.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_onnx_loader_missing_weights() {
    let loader = Arc::new(OnnxYoloLoader::new(YoloConfig {
        model_path: "/nonexistent/yolov8n.onnx".into(),
        ..Default::default()
    }));
    let manager = DetectorManager::new("yolov8n", loader);

    match manager.ensure_loaded().await {
        Err(VisionError::ModelUnavailable(msg)) => assert!(msg.contains("not found")),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("load should fail without weights"),
    }
}
