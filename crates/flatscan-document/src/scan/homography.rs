// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Planar homography estimation and perspective rectification.
//
// The 3x3 transform is solved from four point correspondences (h33 fixed to
// 1, leaving an 8x8 linear system). Resampling walks the destination grid and
// pulls each pixel from the source through the inverse transform.

use flatscan_core::error::{Result, ScanError};
use flatscan_core::types::{DestinationRect, Interpolation, OrderedQuad, Point2D};
use image::{
    DynamicImage, GenericImageView, GrayImage, ImageBuffer, Luma, Pixel, Rgb, RgbImage, Rgba,
    RgbaImage,
};
use imageproc::geometric_transformations::{Interpolation as Sampling, warp_into_with};
use tracing::{debug, info, instrument};

/// Relative pivot magnitude below which the DLT system counts as singular.
const PIVOT_EPSILON: f64 = 1e-12;

/// Relative cross-product magnitude below which three corners are collinear.
const COLLINEAR_EPSILON: f64 = 1e-9;

/// A projective transform of the plane, row-major with `h33 == 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    m: [[f64; 3]; 3],
}

impl Homography {
    pub fn identity() -> Self {
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    pub fn matrix(&self) -> [[f64; 3]; 3] {
        self.m
    }

    /// Solve the transform taking each `src[i]` to `dst[i]`.
    ///
    /// Fails with [`ScanError::DegenerateQuad`] when three of the source points
    /// are collinear or the linear system is otherwise singular.
    pub fn from_correspondences(src: [Point2D; 4], dst: [Point2D; 4]) -> Result<Self> {
        check_not_collinear(&src)?;

        // Each correspondence (x, y) -> (u, v) contributes two rows:
        //   [x y 1 0 0 0 -ux -uy] . h = u
        //   [0 0 0 x y 1 -vx -vy] . h = v
        let mut system = [[0.0f64; 9]; 8];
        for (i, (s, d)) in src.iter().zip(dst.iter()).enumerate() {
            system[2 * i] = [s.x, s.y, 1.0, 0.0, 0.0, 0.0, -d.x * s.x, -d.x * s.y, d.x];
            system[2 * i + 1] = [0.0, 0.0, 0.0, s.x, s.y, 1.0, -d.y * s.x, -d.y * s.y, d.y];
        }
        let h = solve_8x8(system)?;

        Ok(Self {
            m: [[h[0], h[1], h[2]], [h[3], h[4], h[5]], [h[6], h[7], 1.0]],
        })
    }

    /// Map a point through the transform.
    pub fn apply(&self, p: Point2D) -> Point2D {
        let m = &self.m;
        let w = m[2][0] * p.x + m[2][1] * p.y + m[2][2];
        Point2D::new(
            (m[0][0] * p.x + m[0][1] * p.y + m[0][2]) / w,
            (m[1][0] * p.x + m[1][1] * p.y + m[1][2]) / w,
        )
    }

    /// Inverse transform via the adjugate, renormalised so `h33 == 1` where
    /// possible.
    pub fn inverse(&self) -> Result<Self> {
        let m = &self.m;
        let cof = |r0: usize, r1: usize, c0: usize, c1: usize| {
            m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0]
        };

        let adj = [
            [cof(1, 2, 1, 2), -cof(0, 2, 1, 2), cof(0, 1, 1, 2)],
            [-cof(1, 2, 0, 2), cof(0, 2, 0, 2), -cof(0, 1, 0, 2)],
            [cof(1, 2, 0, 1), -cof(0, 2, 0, 1), cof(0, 1, 0, 1)],
        ];
        let det = m[0][0] * adj[0][0] + m[0][1] * adj[1][0] + m[0][2] * adj[2][0];

        let magnitude = m.iter().flatten().fold(0.0f64, |acc, v| acc.max(v.abs()));
        if !det.is_finite() || det.abs() <= PIVOT_EPSILON * magnitude.powi(3).max(1.0) {
            return Err(ScanError::DegenerateQuad(
                "homography is not invertible".into(),
            ));
        }

        let norm = if adj[2][2].abs() > f64::EPSILON {
            adj[2][2]
        } else {
            det
        };
        Ok(Self {
            m: adj.map(|row| row.map(|v| v / norm)),
        })
    }
}

/// Reject a quad where any three of the four corners lie on one line.
fn check_not_collinear(points: &[Point2D; 4]) -> Result<()> {
    let scale = points
        .iter()
        .flat_map(|a| points.iter().map(move |b| a.distance(b)))
        .fold(0.0f64, f64::max);
    if scale == 0.0 {
        return Err(ScanError::DegenerateQuad("all four corners coincide".into()));
    }

    for (i, j, k) in [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)] {
        let (a, b, c) = (points[i], points[j], points[k]);
        let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
        if cross.abs() <= COLLINEAR_EPSILON * scale * scale {
            return Err(ScanError::DegenerateQuad(format!(
                "corners {a}, {b} and {c} are collinear"
            )));
        }
    }
    Ok(())
}

/// Gaussian elimination with partial pivoting on an augmented 8x9 system.
fn solve_8x8(mut a: [[f64; 9]; 8]) -> Result<[f64; 8]> {
    let magnitude = a
        .iter()
        .flat_map(|row| row[..8].iter())
        .fold(0.0f64, |acc, v| acc.max(v.abs()));
    let threshold = PIVOT_EPSILON * magnitude.max(1.0);

    for col in 0..8 {
        let pivot_row = (col..8)
            .max_by(|&r1, &r2| a[r1][col].abs().total_cmp(&a[r2][col].abs()))
            .unwrap_or(col);
        if a[pivot_row][col].abs() < threshold {
            return Err(ScanError::DegenerateQuad(
                "correspondence system is singular".into(),
            ));
        }
        a.swap(col, pivot_row);

        for row in col + 1..8 {
            let factor = a[row][col] / a[col][col];
            if factor != 0.0 {
                for k in col..9 {
                    a[row][k] -= factor * a[col][k];
                }
            }
        }
    }

    let mut x = [0.0f64; 8];
    for row in (0..8).rev() {
        let tail: f64 = (row + 1..8).map(|k| a[row][k] * x[k]).sum();
        x[row] = (a[row][8] - tail) / a[row][row];
    }
    Ok(x)
}

// -- Rectification ------------------------------------------------------------

/// Warps the region bounded by an ordered quad onto an axis-aligned
/// rectangle.
#[derive(Debug, Clone, Copy, Default)]
pub struct HomographyRectifier {
    pub interpolation: Interpolation,
}

impl HomographyRectifier {
    pub fn new(interpolation: Interpolation) -> Self {
        Self { interpolation }
    }

    /// Rectify `image` so `quad`'s corners land on the corners of a
    /// `rect.width` x `rect.height` output.
    ///
    /// Luma8, Rgb8 and Rgba8 inputs keep their colour type; anything else is
    /// converted to Rgb8 first.
    #[instrument(skip_all, fields(dst_w = rect.width, dst_h = rect.height))]
    pub fn rectify(
        &self,
        image: &DynamicImage,
        quad: &OrderedQuad,
        rect: DestinationRect,
    ) -> Result<DynamicImage> {
        let (src_w, src_h) = image.dimensions();
        if src_w == 0 || src_h == 0 {
            return Err(ScanError::InvalidInput(
                "cannot rectify an empty image".into(),
            ));
        }

        let forward = Homography::from_correspondences(quad.corners(), destination_corners(rect))?;
        let mapper = SourceMapper {
            inverse: forward.inverse()?,
            max_x: src_w as f64 - 1.0,
            max_y: src_h as f64 - 1.0,
        };
        debug!(matrix = ?forward.matrix(), "Homography solved");

        let sampling = match self.interpolation {
            Interpolation::Nearest => Sampling::Nearest,
            Interpolation::Bilinear => Sampling::Bilinear,
        };
        let mapping = move |x: f32, y: f32| mapper.source(x, y);

        // Sources are padded so bilinear reads at the clamped last row and
        // column still find a right/bottom neighbour.
        let (w, h) = (rect.width, rect.height);
        let output = match image {
            DynamicImage::ImageLuma8(src) => {
                let mut out = GrayImage::new(w, h);
                warp_into_with(&edge_padded(src), mapping, sampling, Luma([255]), &mut out);
                DynamicImage::ImageLuma8(out)
            }
            DynamicImage::ImageRgb8(src) => {
                let mut out = RgbImage::new(w, h);
                let fill = Rgb([255, 255, 255]);
                warp_into_with(&edge_padded(src), mapping, sampling, fill, &mut out);
                DynamicImage::ImageRgb8(out)
            }
            DynamicImage::ImageRgba8(src) => {
                let mut out = RgbaImage::new(w, h);
                let fill = Rgba([255, 255, 255, 255]);
                warp_into_with(&edge_padded(src), mapping, sampling, fill, &mut out);
                DynamicImage::ImageRgba8(out)
            }
            other => {
                let src = other.to_rgb8();
                let mut out = RgbImage::new(w, h);
                let fill = Rgb([255, 255, 255]);
                warp_into_with(&edge_padded(&src), mapping, sampling, fill, &mut out);
                DynamicImage::ImageRgb8(out)
            }
        };

        info!(src_w, src_h, dst_w = w, dst_h = h, "Perspective rectified");
        Ok(output)
    }
}

/// Output-rectangle corners in top-left, top-right, bottom-right, bottom-left
/// order. A one-pixel side still spans a unit interval so the system stays
/// solvable.
fn destination_corners(rect: DestinationRect) -> [Point2D; 4] {
    let right = (rect.width.max(2) - 1) as f64;
    let bottom = (rect.height.max(2) - 1) as f64;
    [
        Point2D::new(0.0, 0.0),
        Point2D::new(right, 0.0),
        Point2D::new(right, bottom),
        Point2D::new(0.0, bottom),
    ]
}

/// Copy of `src` with the last column and row repeated once.
fn edge_padded<P: Pixel>(
    src: &ImageBuffer<P, Vec<P::Subpixel>>,
) -> ImageBuffer<P, Vec<P::Subpixel>> {
    let (w, h) = src.dimensions();
    ImageBuffer::from_fn(w + 1, h + 1, |x, y| *src.get_pixel(x.min(w - 1), y.min(h - 1)))
}

/// Inverse mapping from destination pixels to source coordinates clamped to
/// the last real pixel.
#[derive(Debug, Clone, Copy)]
struct SourceMapper {
    inverse: Homography,
    max_x: f64,
    max_y: f64,
}

impl SourceMapper {
    fn source(&self, x: f32, y: f32) -> (f32, f32) {
        let p = self.inverse.apply(Point2D::new(x as f64, y as f64));
        // `max` is an integer, exact in f32 up to 2^24, so the rounded cast
        // never lands past it.
        let clamp = |v: f64, max: f64| {
            if v.is_nan() {
                0.0
            } else {
                v.clamp(0.0, max) as f32
            }
        };
        (clamp(p.x, self.max_x), clamp(p.y, self.max_y))
    }
}
