// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan enhancement — local adaptive thresholding that turns a rectified page
// into a two-tone "scanned" image.

use flatscan_core::config::{ThresholdConfig, ThresholdMethod};
use image::{GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;
use tracing::{debug, instrument};

/// Converts a grayscale page into a black-and-white one.
pub trait Binarizer: Send + Sync {
    /// Output pixels are exactly 0 or 255.
    fn binarize(&self, gray: &GrayImage) -> GrayImage;
}

/// Adaptive thresholding against a local neighbourhood mean.
///
/// A pixel becomes white when it is brighter than its neighbourhood mean minus
/// `c`, black otherwise. Uniform regions therefore come out white, which keeps
/// blank paper clean.
#[derive(Debug, Clone, Copy)]
pub struct AdaptiveThreshold {
    pub method: ThresholdMethod,
    /// Odd neighbourhood side length in pixels.
    pub block_size: u32,
    pub c: i32,
}

impl Default for AdaptiveThreshold {
    fn default() -> Self {
        Self::from_config(&ThresholdConfig::default())
    }
}

impl AdaptiveThreshold {
    pub fn from_config(config: &ThresholdConfig) -> Self {
        Self {
            method: config.method,
            block_size: config.block_size,
            c: config.c,
        }
    }

    /// Gaussian sigma matching a `block_size` kernel, using the usual
    /// `0.3 * ((k - 1) * 0.5 - 1) + 0.8` rule.
    fn sigma(&self) -> f32 {
        let k = self.block_size.max(3) as f32;
        0.3 * ((k - 1.0) * 0.5 - 1.0) + 0.8
    }
}

impl Binarizer for AdaptiveThreshold {
    #[instrument(skip_all, fields(method = ?self.method, block = self.block_size, c = self.c))]
    fn binarize(&self, gray: &GrayImage) -> GrayImage {
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return gray.clone();
        }

        let output = match self.method {
            ThresholdMethod::Gaussian => {
                let local = gaussian_blur_f32(gray, self.sigma());
                GrayImage::from_fn(width, height, |x, y| {
                    let mean = local.get_pixel(x, y).0[0] as f64;
                    threshold_pixel(gray.get_pixel(x, y).0[0], mean, self.c)
                })
            }
            ThresholdMethod::Mean => {
                let integral = compute_integral_image(gray);
                let radius = self.block_size / 2;
                GrayImage::from_fn(width, height, |x, y| {
                    let mean = region_mean(&integral, width, height, x, y, radius);
                    threshold_pixel(gray.get_pixel(x, y).0[0], mean, self.c)
                })
            }
        };

        debug!(
            white = output.pixels().filter(|p| p.0[0] == 255).count(),
            "Binarization complete"
        );
        output
    }
}

fn threshold_pixel(value: u8, mean: f64, c: i32) -> Luma<u8> {
    if value as f64 > mean - c as f64 {
        Luma([255])
    } else {
        Luma([0])
    }
}

// -- Integral image helpers ---------------------------------------------------

/// Summed-area table of a grayscale image.
///
/// `integral[y * (width+1) + x]` holds the sum over `[0, x) x [0, y)`; the
/// table is `(width+1) x (height+1)` with a zero border.
fn compute_integral_image(gray: &GrayImage) -> Vec<u64> {
    let (w, h) = gray.dimensions();
    let stride = (w + 1) as usize;
    let mut table = vec![0u64; stride * (h + 1) as usize];

    for y in 0..h {
        let mut row_sum: u64 = 0;
        for x in 0..w {
            row_sum += gray.get_pixel(x, y).0[0] as u64;
            let idx = (y + 1) as usize * stride + (x + 1) as usize;
            let above = y as usize * stride + (x + 1) as usize;
            table[idx] = row_sum + table[above];
        }
    }

    table
}

/// Mean over the square of `radius` around (cx, cy), clipped to the image.
fn region_mean(
    integral: &[u64],
    img_width: u32,
    img_height: u32,
    cx: u32,
    cy: u32,
    radius: u32,
) -> f64 {
    let stride = (img_width + 1) as usize;

    let x1 = cx.saturating_sub(radius) as usize;
    let y1 = cy.saturating_sub(radius) as usize;
    let x2 = ((cx + radius + 1) as usize).min(img_width as usize);
    let y2 = ((cy + radius + 1) as usize).min(img_height as usize);

    let area = ((x2 - x1) * (y2 - y1)) as f64;
    let sum = integral[y2 * stride + x2] as f64 - integral[y1 * stride + x2] as f64
        - integral[y2 * stride + x1] as f64
        + integral[y1 * stride + x1] as f64;

    sum / area
}

#[cfg(test)]
mod tests {
    use super::*;

    /// White page with a few dark strokes.
    fn text_like() -> GrayImage {
        GrayImage::from_fn(80, 60, |x, y| {
            if (20..60).contains(&x) && (y == 15 || y == 16 || y == 40) {
                Luma([30])
            } else {
                Luma([210 + ((x + y) % 2) as u8])
            }
        })
    }

    fn is_two_tone(img: &GrayImage) -> bool {
        img.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255)
    }

    #[test]
    fn gaussian_output_is_two_tone() {
        let out = AdaptiveThreshold::default().binarize(&text_like());
        assert!(is_two_tone(&out));
        assert_eq!(out.get_pixel(30, 15).0[0], 0);
        assert_eq!(out.get_pixel(5, 5).0[0], 255);
    }

    #[test]
    fn mean_output_is_two_tone() {
        let threshold = AdaptiveThreshold {
            method: ThresholdMethod::Mean,
            ..AdaptiveThreshold::default()
        };
        let out = threshold.binarize(&text_like());
        assert!(is_two_tone(&out));
        assert_eq!(out.get_pixel(40, 40).0[0], 0);
    }

    #[test]
    fn uniform_page_goes_white() {
        let flat = GrayImage::from_pixel(32, 32, Luma([140]));
        for method in [ThresholdMethod::Gaussian, ThresholdMethod::Mean] {
            let out = AdaptiveThreshold {
                method,
                ..AdaptiveThreshold::default()
            }
            .binarize(&flat);
            assert!(out.pixels().all(|p| p.0[0] == 255), "{method:?}");
        }
    }

    #[test]
    fn sigma_for_default_block() {
        assert!((AdaptiveThreshold::default().sigma() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn integral_region_mean_matches_direct_sum() {
        let img = GrayImage::from_fn(5, 4, |x, y| Luma([(x * 10 + y) as u8]));
        let integral = compute_integral_image(&img);
        // Full-image window.
        let total: u32 = img.pixels().map(|p| p.0[0] as u32).sum();
        let mean = region_mean(&integral, 5, 4, 2, 2, 10);
        assert!((mean - total as f64 / 20.0).abs() < 1e-9);
    }
}
