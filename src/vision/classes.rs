// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Class registry: detector class id -> display name and color

use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;

use super::errors::VisionError;

/// RGB color used for box and label rendering
pub type Rgb = [u8; 3];

/// Display palette, indexed by `class_id % PALETTE.len()`
///
/// Triples are RGB: person (0) renders blue, car (2) red, truck (7) dark green.
pub const PALETTE: [Rgb; 12] = [
    [0, 0, 255],
    [0, 255, 0],
    [255, 0, 0],
    [0, 255, 255],
    [255, 0, 255],
    [255, 255, 0],
    [0, 0, 128],
    [0, 128, 0],
    [128, 0, 0],
    [0, 128, 128],
    [128, 0, 128],
    [128, 128, 0],
];

/// The 80 COCO class names YOLOv8 checkpoints are trained on
pub const COCO_CLASSES: [&str; 80] = [
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

/// One entry of the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassEntry {
    pub id: u32,
    pub name: String,
    #[serde(skip)]
    pub color: Rgb,
}

/// Immutable id -> entry map, built once at startup
#[derive(Debug, Clone)]
pub struct ClassRegistry {
    entries: BTreeMap<u32, ClassEntry>,
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::coco()
    }
}

impl ClassRegistry {
    /// Registry with the COCO label set
    pub fn coco() -> Self {
        Self::from_names(COCO_CLASSES.iter().copied())
    }

    /// Build a registry from names in id order (ids are dense from 0)
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                let id = idx as u32;
                (
                    id,
                    ClassEntry {
                        id,
                        name: name.into(),
                        color: color_for(id),
                    },
                )
            })
            .collect();

        Self { entries }
    }

    /// Load names from a labels file, one per line; blank lines are skipped
    pub fn from_labels_file<P: AsRef<Path>>(path: P) -> Result<Self, VisionError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            VisionError::Config(format!("Failed to read labels file {}: {}", path.display(), e))
        })?;

        let names: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        if names.is_empty() {
            return Err(VisionError::Config(format!(
                "Labels file {} contains no class names",
                path.display()
            )));
        }

        Ok(Self::from_names(names))
    }

    /// Display name for a class id, synthesizing `class_<id>` for unknown ids
    pub fn name(&self, class_id: u32) -> Cow<'_, str> {
        match self.entries.get(&class_id) {
            Some(entry) => Cow::Borrowed(entry.name.as_str()),
            None => Cow::Owned(format!("class_{}", class_id)),
        }
    }

    /// Display color for a class id; defined for every id
    pub fn color(&self, class_id: u32) -> Rgb {
        color_for(class_id)
    }

    pub fn contains(&self, class_id: u32) -> bool {
        self.entries.contains_key(&class_id)
    }

    pub fn get(&self, class_id: u32) -> Option<&ClassEntry> {
        self.entries.get(&class_id)
    }

    /// Entries in ascending id order
    pub fn entries(&self) -> impl Iterator<Item = &ClassEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Pure color lookup by class id
pub fn color_for(class_id: u32) -> Rgb {
    PALETTE[class_id as usize % PALETTE.len()]
}
