// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Bounding box and label rendering

use ab_glyph::{FontArc, PxScale};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::path::Path;
use std::sync::Arc;

use super::classes::ClassRegistry;
use super::errors::VisionError;
use super::executor::Detection;

/// Embedded label font
const DEFAULT_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

const LABEL_FONT_SIZE: f32 = 18.0;
const LABEL_PADDING: u32 = 3;
const BOX_THICKNESS: u32 = 2;
const DARK_TEXT: Rgb<u8> = Rgb([0, 0, 0]);
const LIGHT_TEXT: Rgb<u8> = Rgb([255, 255, 255]);
/// Backgrounds brighter than this (Rec. 601 luma) get dark text
const LIGHT_BACKGROUND_LUMA: f32 = 128.0;

/// Draws detections onto a copy of an image
#[derive(Clone)]
pub struct Annotator {
    registry: Arc<ClassRegistry>,
    font: FontArc,
    scale: PxScale,
}

impl std::fmt::Debug for Annotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotator")
            .field("scale", &self.scale)
            .finish_non_exhaustive()
    }
}

impl Annotator {
    /// Annotator using the embedded font
    pub fn new(registry: Arc<ClassRegistry>) -> Result<Self, VisionError> {
        let font = FontArc::try_from_slice(DEFAULT_FONT)
            .map_err(|e| VisionError::Config(format!("embedded font is invalid: {}", e)))?;
        Ok(Self::with_font(registry, font))
    }

    /// Annotator using a TrueType/OpenType font from disk
    pub fn from_font_file<P: AsRef<Path>>(
        registry: Arc<ClassRegistry>,
        path: P,
    ) -> Result<Self, VisionError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            VisionError::Config(format!("Failed to read font {}: {}", path.display(), e))
        })?;
        let font = FontArc::try_from_vec(data)
            .map_err(|e| VisionError::Config(format!("Invalid font {}: {}", path.display(), e)))?;
        Ok(Self::with_font(registry, font))
    }

    pub fn with_font(registry: Arc<ClassRegistry>, font: FontArc) -> Self {
        Self {
            registry,
            font,
            scale: PxScale::from(LABEL_FONT_SIZE),
        }
    }

    /// Render every detection, in order, onto a copy of `image`
    pub fn annotate(&self, image: &DynamicImage, detections: &[Detection]) -> RgbImage {
        let mut canvas = image.to_rgb8();
        for det in detections {
            self.draw_detection(&mut canvas, det);
        }
        canvas
    }

    fn draw_detection(&self, canvas: &mut RgbImage, det: &Detection) {
        let (img_w, img_h) = canvas.dimensions();
        let [x1, y1, x2, y2] = det.bbox;

        let x1 = x1.min(img_w);
        let y1 = y1.min(img_h);
        let box_w = x2.min(img_w).saturating_sub(x1);
        let box_h = y2.min(img_h).saturating_sub(y1);

        if box_w == 0 || box_h == 0 {
            return;
        }

        let color = Rgb(self.registry.color(det.class_id));

        for inset in 0..BOX_THICKNESS {
            if box_w <= 2 * inset || box_h <= 2 * inset {
                break;
            }
            let rect = Rect::at((x1 + inset) as i32, (y1 + inset) as i32)
                .of_size(box_w - 2 * inset, box_h - 2 * inset);
            draw_hollow_rect_mut(canvas, rect, color);
        }

        let label = format!("{} {:.2}", self.registry.name(det.class_id), det.confidence);
        let (text_w, text_h) = text_size(self.scale, &self.font, &label);

        let Some(background) = label_rect(
            x1,
            y1,
            text_w + 2 * LABEL_PADDING,
            text_h + 2 * LABEL_PADDING,
            img_w,
            img_h,
        ) else {
            return;
        };

        draw_filled_rect_mut(canvas, background, color);
        draw_text_mut(
            canvas,
            label_text_color(color),
            background.left() + LABEL_PADDING as i32,
            background.top() + LABEL_PADDING as i32,
            self.scale,
            &self.font,
            &label,
        );
    }
}

/// Black on light label backgrounds (yellow, cyan, green), white otherwise
pub fn label_text_color(background: Rgb<u8>) -> Rgb<u8> {
    let [r, g, b] = background.0;
    let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    if luma > LIGHT_BACKGROUND_LUMA {
        DARK_TEXT
    } else {
        LIGHT_TEXT
    }
}

/// Label background placement for a box whose top-left corner is `(x1, y1)`.
///
/// The label sits directly above the box. When that would leave the canvas
/// it moves down to start at the box's top edge, and it is shifted/cropped
/// horizontally so it always lies fully inside the image. Returns `None` when
/// nothing can be drawn.
pub fn label_rect(
    x1: u32,
    y1: u32,
    label_w: u32,
    label_h: u32,
    img_w: u32,
    img_h: u32,
) -> Option<Rect> {
    if label_w == 0 || label_h == 0 || img_w == 0 || img_h == 0 {
        return None;
    }

    let width = label_w.min(img_w);
    let height = label_h.min(img_h);

    let top = if y1 >= height {
        y1 - height
    } else {
        y1.min(img_h - height)
    };
    let left = x1.min(img_w - width);

    Some(Rect::at(left as i32, top as i32).of_size(width, height))
}
