// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Overlay annotator — draws a closed polygon, and optionally a text label, on
// a copy of an image.

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use flatscan_core::error::{Result, ScanError};
use flatscan_core::types::Point2D;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_line_segment_mut, draw_text_mut};
use tracing::{debug, instrument};

/// Vertical gap between the first vertex and the label baseline box.
const LABEL_OFFSET_PX: i32 = 10;

pub struct OverlayAnnotator {
    pub color: Rgb<u8>,
    pub thickness: u32,
    /// Label height in pixels.
    pub text_scale: f32,
    font: Option<FontArc>,
}

impl Default for OverlayAnnotator {
    fn default() -> Self {
        Self {
            color: Rgb([0, 255, 0]),
            thickness: 3,
            text_scale: 16.0,
            font: None,
        }
    }
}

impl OverlayAnnotator {
    /// Labels are only drawn once a font is supplied.
    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    /// Read a TrueType/OpenType font from disk.
    pub fn load_font(path: impl AsRef<Path>) -> Result<FontArc> {
        let bytes = std::fs::read(path.as_ref())?;
        FontArc::try_from_vec(bytes).map_err(|err| {
            ScanError::InvalidInput(format!(
                "{} is not a usable font: {err}",
                path.as_ref().display()
            ))
        })
    }

    /// Draw `points` as a closed polygon (last vertex joins the first) on an
    /// RGB copy of `image`, with `label` anchored just above the first vertex.
    #[instrument(skip_all, fields(vertices = points.len(), labelled = label.is_some()))]
    pub fn annotate(
        &self,
        image: &DynamicImage,
        points: &[Point2D],
        label: Option<&str>,
    ) -> Result<DynamicImage> {
        if points.len() < 2 {
            return Err(ScanError::InvalidInput(format!(
                "a polygon needs at least 2 vertices, got {}",
                points.len()
            )));
        }

        let mut canvas = image.to_rgb8();
        draw_closed_polyline(&mut canvas, points, self.color, self.thickness);

        match (label.filter(|text| !text.is_empty()), &self.font) {
            (Some(text), Some(font)) => {
                let (x, y) = label_anchor(&canvas, points[0]);
                draw_text_mut(
                    &mut canvas,
                    self.color,
                    x,
                    y,
                    PxScale::from(self.text_scale),
                    font,
                    text,
                );
            }
            (Some(_), None) => debug!("No font loaded; label skipped"),
            _ => {}
        }

        Ok(DynamicImage::ImageRgb8(canvas))
    }
}

fn label_anchor(canvas: &RgbImage, first: Point2D) -> (i32, i32) {
    let max_x = canvas.width().saturating_sub(1) as i32;
    let max_y = canvas.height().saturating_sub(1) as i32;
    let x = (first.x.round() as i32).clamp(0, max_x);
    let y = (first.y.round() as i32 - LABEL_OFFSET_PX).clamp(0, max_y);
    (x, y)
}

/// Stroke each edge of the closed polygon with a square brush `thickness`
/// pixels wide.
pub(crate) fn draw_closed_polyline(
    canvas: &mut RgbImage,
    points: &[Point2D],
    color: Rgb<u8>,
    thickness: u32,
) {
    let t = thickness.max(1) as i32;
    let (lo, hi) = (-(t - 1) / 2, t / 2);
    let n = points.len();

    for i in 0..n {
        let (a, b) = (points[i], points[(i + 1) % n]);
        for ox in lo..=hi {
            for oy in lo..=hi {
                let (dx, dy) = (ox as f32, oy as f32);
                draw_line_segment_mut(
                    canvas,
                    (a.x as f32 + dx, a.y as f32 + dy),
                    (b.x as f32 + dx, b.y as f32 + dy),
                    color,
                );
            }
        }
    }
}
