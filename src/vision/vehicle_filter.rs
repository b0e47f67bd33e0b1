// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vehicle-only view of a detection set, used by plate recognition

use serde::Serialize;
use tracing::{debug, warn};

use super::classes::ClassRegistry;
use super::executor::{round_confidence, Detection};

/// Class names treated as vehicles, matched case-insensitively
pub const VEHICLE_CLASS_NAMES: [&str; 3] = ["car", "bus", "truck"];

/// COCO ids for car, bus and truck
pub const VEHICLE_CLASS_IDS: [u32; 3] = [2, 5, 7];

/// Share of the vehicle box height, from the bottom, searched for a plate
const PLATE_REGION_FRACTION: f32 = 0.3;

/// Region of a vehicle box where a licence plate is expected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlateRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub confidence: f64,
    pub bbox: [u32; 4],
    pub plate_region: PlateRegion,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSummary {
    pub vehicles: Vec<Vehicle>,
}

impl VehicleSummary {
    pub fn count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn message(&self) -> String {
        match self.vehicles.len() {
            1 => "1 vehicle detected".to_string(),
            n => format!("{} vehicles detected", n),
        }
    }
}

/// Allowlist filter over class ids
#[derive(Debug, Clone)]
pub struct VehicleFilter {
    class_ids: Vec<u32>,
}

impl Default for VehicleFilter {
    fn default() -> Self {
        Self {
            class_ids: VEHICLE_CLASS_IDS.to_vec(),
        }
    }
}

impl VehicleFilter {
    pub fn new(class_ids: impl IntoIterator<Item = u32>) -> Self {
        Self {
            class_ids: class_ids.into_iter().collect(),
        }
    }

    /// Vehicle ids resolved by name from the active label set
    pub fn from_registry(registry: &ClassRegistry) -> Self {
        let class_ids: Vec<u32> = registry
            .entries()
            .filter(|entry| {
                VEHICLE_CLASS_NAMES
                    .iter()
                    .any(|name| entry.name.eq_ignore_ascii_case(name))
            })
            .map(|entry| entry.id)
            .collect();

        if class_ids.is_empty() {
            warn!(
                "No vehicle classes ({}) in the label set; plate recognition will find nothing",
                VEHICLE_CLASS_NAMES.join(", ")
            );
        } else {
            debug!("Vehicle class ids: {:?}", class_ids);
        }

        Self { class_ids }
    }

    pub fn class_ids(&self) -> &[u32] {
        &self.class_ids
    }

    pub fn is_vehicle(&self, class_id: u32) -> bool {
        self.class_ids.contains(&class_id)
    }

    /// Keep vehicle detections, preserving order
    pub fn filter(&self, detections: &[Detection]) -> VehicleSummary {
        let vehicles = detections
            .iter()
            .filter(|det| self.is_vehicle(det.class_id))
            .map(|det| Vehicle {
                vehicle_type: det.class_name.clone(),
                confidence: round_confidence(det.confidence),
                bbox: det.bbox,
                plate_region: plate_region(det.bbox),
            })
            .collect();

        VehicleSummary { vehicles }
    }
}

/// Bottom 30% of a vehicle box
pub fn plate_region(bbox: [u32; 4]) -> PlateRegion {
    let [x1, y1, x2, y2] = bbox;
    let height = y2.saturating_sub(y1);
    let top = y1 + ((1.0 - PLATE_REGION_FRACTION) * height as f32).round() as u32;

    PlateRegion {
        x: x1,
        y: top.min(y2),
        width: x2.saturating_sub(x1),
        height: y2.saturating_sub(top.min(y2)),
    }
}
