// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLOv8 output decoding and non-maximum suppression

use anyhow::{bail, Result};
use ndarray::{ArrayView2, ArrayViewD, Axis, Ix2};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::RawDetection;

/// Decode a YOLOv8 head output into candidate boxes in model-input space.
///
/// Accepts `[1, 4 + classes, anchors]` (the default export layout) or the
/// transposed `[1, anchors, 4 + classes]`. Each candidate keeps its best class;
/// candidates scoring below `confidence` are dropped here.
pub fn decode_yolov8(output: ArrayViewD<'_, f32>, confidence: f32) -> Result<Vec<RawDetection>> {
    let shape = output.shape().to_vec();
    let view = match shape.len() {
        3 if shape[0] == 1 => output.index_axis_move(Axis(0), 0),
        2 => output,
        _ => bail!("Unexpected detector output shape: {:?}", shape),
    };

    let view: ArrayView2<'_, f32> = view.into_dimensionality::<Ix2>()?;

    // Attributes are the short axis: 84 attrs vs 8400 anchors for COCO exports
    let view = if view.shape()[0] <= view.shape()[1] {
        view
    } else {
        view.reversed_axes()
    };

    let attrs = view.shape()[0];
    if attrs < 5 {
        bail!("Detector output has {} attributes per anchor, need at least 5", attrs);
    }

    let mut candidates = Vec::new();
    for anchor in view.axis_iter(Axis(1)) {
        let best = anchor
            .iter()
            .skip(4)
            .enumerate()
            .filter(|(_, score)| score.is_finite())
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let Some((class_id, &score)) = best else {
            continue;
        };

        if score < confidence {
            continue;
        }

        let (cx, cy, w, h) = (anchor[0], anchor[1], anchor[2], anchor[3]);
        candidates.push(RawDetection {
            class_id: class_id as u32,
            confidence: score,
            bbox: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
        });
    }

    Ok(candidates)
}

/// Intersection over union of two corner-format boxes
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let inter_x1 = a[0].max(b[0]);
    let inter_y1 = a[1].max(b[1]);
    let inter_x2 = a[2].min(b[2]);
    let inter_y2 = a[3].min(b[3]);

    let inter_area = (inter_x2 - inter_x1).max(0.0) * (inter_y2 - inter_y1).max(0.0);
    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union_area = area_a + area_b - inter_area;

    if union_area <= 0.0 {
        0.0
    } else {
        inter_area / union_area
    }
}

/// Class-aware NMS. Returns at most `max_detections` boxes ordered by
/// descending confidence.
pub fn non_max_suppression(
    detections: Vec<RawDetection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<RawDetection> {
    let mut by_class: BTreeMap<u32, Vec<RawDetection>> = BTreeMap::new();
    for det in detections {
        by_class.entry(det.class_id).or_default().push(det);
    }

    let mut kept = Vec::new();
    for (_class_id, mut group) in by_class {
        group.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
        });

        let mut suppressed = vec![false; group.len()];
        for i in 0..group.len() {
            if suppressed[i] {
                continue;
            }
            for j in (i + 1)..group.len() {
                if !suppressed[j] && iou(&group[i].bbox, &group[j].bbox) > iou_threshold {
                    suppressed[j] = true;
                }
            }
        }

        kept.extend(
            group
                .into_iter()
                .zip(suppressed)
                .filter_map(|(det, dropped)| (!dropped).then_some(det)),
        );
    }

    kept.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
    kept.truncate(max_detections);
    kept
}
