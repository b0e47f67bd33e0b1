// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plate recognition response types

use serde::Serialize;

use crate::vision::{Vehicle, VehicleSummary};

/// Response from POST /api/plate/recognize
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlateRecognitionResponse {
    pub success: bool,
    pub vehicle_count: usize,
    pub vehicles: Vec<Vehicle>,
    /// e.g. "2 vehicles detected"
    pub message: String,
    pub request_id: String,
    pub processing_time_ms: u64,
}

impl PlateRecognitionResponse {
    pub fn new(summary: VehicleSummary, request_id: String, processing_time_ms: u64) -> Self {
        Self {
            success: true,
            vehicle_count: summary.count(),
            message: summary.message(),
            vehicles: summary.vehicles,
            request_id,
            processing_time_ms,
        }
    }
}
