// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decoding, alpha flattening, aspect-preserving resize and
// encoding. Operates on in-memory images using the `image` crate.

use flatscan_core::error::ScanError;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, info, instrument};

/// Thin wrapper around a single in-memory image.
///
/// All operations are non-destructive: each method consumes `self` and returns a
/// new `ImageProcessor` wrapping the transformed image, enabling method chaining.
///
/// ```ignore
/// let working = ImageProcessor::open("page.jpg")?
///     .flatten_alpha()
///     .resize_to_height(500)
///     .into_dynamic();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, ScanError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            ScanError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, ScanError> {
        let img = image::load_from_memory(data)
            .map_err(|err| ScanError::ImageError(format!("failed to decode image: {}", err)))?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Drop an alpha channel, if any, so camera captures and PNG screenshots
    /// enter the scanner as plain RGB (or luma).
    pub fn flatten_alpha(self) -> Self {
        let color = self.image.color();
        let image = if !color.has_alpha() {
            self.image
        } else if color.has_color() {
            DynamicImage::ImageRgb8(self.image.to_rgb8())
        } else {
            DynamicImage::ImageLuma8(self.image.to_luma8())
        };
        Self { image }
    }

    /// Resize so the height equals `height`, preserving aspect ratio.
    pub fn resize_to_height(self, height: u32) -> Self {
        self.resize_aspect(None, Some(height))
    }

    /// Resize so the width equals `width`, preserving aspect ratio.
    pub fn resize_to_width(self, width: u32) -> Self {
        self.resize_aspect(Some(width), None)
    }

    /// Aspect-preserving resize driven by one target side.
    ///
    /// When both are given the width wins; when neither is given the image is
    /// returned unchanged. The derived side is truncated and kept >= 1.
    #[instrument(skip(self), fields(from_w = self.image.width(), from_h = self.image.height()))]
    pub fn resize_aspect(self, width: Option<u32>, height: Option<u32>) -> Self {
        let (w, h) = (self.image.width(), self.image.height());
        if w == 0 || h == 0 {
            return self;
        }

        let (new_w, new_h) = match (width, height) {
            (Some(target_w), _) => {
                let r = target_w as f64 / w as f64;
                (target_w, ((h as f64 * r) as u32).max(1))
            }
            (None, Some(target_h)) => {
                let r = target_h as f64 / h as f64;
                (((w as f64 * r) as u32).max(1), target_h)
            }
            (None, None) => return self,
        };

        if (new_w, new_h) == (w, h) {
            return self;
        }

        // Triangle is a cheap area-style filter that behaves well when shrinking.
        let resized = self.image.resize_exact(new_w, new_h, FilterType::Triangle);
        debug!(new_w, new_h, "Resize complete");
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, ScanError> {
        encode_to_format(&self.image, ImageFormat::Png)
    }

    /// Write the image to a file. The format is inferred from the file extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), ScanError> {
        self.image.save(path.as_ref()).map_err(|err| {
            ScanError::ImageError(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
pub(crate) fn encode_to_format(
    image: &DynamicImage,
    format: ImageFormat,
) -> Result<Vec<u8>, ScanError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| ScanError::ImageError(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn resize_to_height_keeps_aspect() {
        let img = DynamicImage::new_rgb8(1000, 2000);
        let out = ImageProcessor::from_dynamic(img).resize_to_height(500);
        assert_eq!((out.width(), out.height()), (250, 500));
    }

    #[test]
    fn resize_to_width_truncates_derived_side() {
        let img = DynamicImage::new_rgb8(300, 200);
        let out = ImageProcessor::from_dynamic(img).resize_to_width(100);
        assert_eq!((out.width(), out.height()), (100, 66));
    }

    #[test]
    fn resize_without_target_is_identity() {
        let img = DynamicImage::new_luma8(30, 20);
        let out = ImageProcessor::from_dynamic(img.clone()).resize_aspect(None, None);
        assert_eq!(out.into_dynamic().as_bytes(), img.as_bytes());
    }

    #[test]
    fn flatten_alpha_drops_channel() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 128])));
        let out = ImageProcessor::from_dynamic(img).flatten_alpha().into_dynamic();
        assert!(!out.color().has_alpha());
        assert_eq!(out.to_rgb8().get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn png_round_trip_decodes() {
        let img = DynamicImage::new_rgb8(8, 6);
        let bytes = ImageProcessor::from_dynamic(img).to_png_bytes().unwrap();
        let back = ImageProcessor::from_bytes(&bytes).unwrap();
        assert_eq!((back.width(), back.height()), (8, 6));
    }
}
