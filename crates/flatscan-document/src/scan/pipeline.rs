// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan pipeline — orchestrates one scan from a decoded photograph to a
// rectified, binarized page.
//
//   AwaitingInput -> CandidateScan -> Rectified
//                                  \-> Unrectified (input handed back as-is)
//
// Contour search runs on a copy downscaled to a fixed working height; the
// selected quad is scaled back up so the warp samples the full-resolution
// source.

use flatscan_core::config::ScanConfig;
use flatscan_core::error::{Result, ScanError};
use flatscan_core::geometry::{PointOrderer, RectangleSizer};
use flatscan_core::types::{CandidateContour, DestinationRect, OrderedQuad, ScanState};
use image::{DynamicImage, GenericImageView, Rgb};
use tracing::{debug, info, instrument, warn};

use super::detect::{
    ContourDetector, DouglasPeucker, EdgeContourDetector, PolygonApproximator, prepare_edges,
};
use super::enhance::{AdaptiveThreshold, Binarizer};
use super::homography::HomographyRectifier;
use super::select::QuadSelector;
use crate::image::processor::ImageProcessor;
use crate::overlay::draw_closed_polyline;

/// Result of one scan.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// `Rectified` or `Unrectified`.
    pub state: ScanState,
    /// The binarized page, or the untouched input when unrectified.
    pub scanned: DynamicImage,
    /// Working copy with the detected outline drawn on it, or the untouched
    /// input when unrectified.
    pub overlay: DynamicImage,
    /// Page corners in source-image coordinates.
    pub quad: Option<OrderedQuad>,
    pub rect: Option<DestinationRect>,
}

impl ScanOutcome {
    fn unrectified(image: &DynamicImage) -> Self {
        Self {
            state: ScanState::Unrectified,
            scanned: image.clone(),
            overlay: image.clone(),
            quad: None,
            rect: None,
        }
    }

    pub fn is_rectified(&self) -> bool {
        self.state == ScanState::Rectified
    }
}

/// The document scanner. Stateless between calls, so one instance can serve
/// many threads.
pub struct ScanPipeline {
    config: ScanConfig,
    detector: Box<dyn ContourDetector>,
    approximator: Box<dyn PolygonApproximator>,
    binarizer: Box<dyn Binarizer>,
}

impl Default for ScanPipeline {
    fn default() -> Self {
        Self::with_parts(ScanConfig::default())
    }
}

impl ScanPipeline {
    /// Build a pipeline with the default imaging collaborators.
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_parts(config))
    }

    fn with_parts(config: ScanConfig) -> Self {
        let binarizer = AdaptiveThreshold::from_config(&config.threshold);
        Self {
            config,
            detector: Box::new(EdgeContourDetector),
            approximator: Box::new(DouglasPeucker),
            binarizer: Box::new(binarizer),
        }
    }

    pub fn with_detector(mut self, detector: impl ContourDetector + 'static) -> Self {
        self.detector = Box::new(detector);
        self
    }

    pub fn with_approximator(mut self, approximator: impl PolygonApproximator + 'static) -> Self {
        self.approximator = Box::new(approximator);
        self
    }

    pub fn with_binarizer(mut self, binarizer: impl Binarizer + 'static) -> Self {
        self.binarizer = Box::new(binarizer);
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    fn selector(&self) -> QuadSelector {
        QuadSelector::new(
            self.config.candidate_cap,
            self.config.approx_tolerance,
            self.config.policy,
        )
    }

    /// Scan a photograph.
    ///
    /// Returns `Unrectified` with the caller's image when no page outline is
    /// found. Fails with `InvalidInput` on an empty image and with
    /// `DegenerateQuad` when the selected outline has collinear corners.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn scan(&self, image: &DynamicImage) -> Result<ScanOutcome> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ScanError::InvalidInput("cannot scan an empty image".into()));
        }

        let working_height = self.config.working_height;
        let ratio = height as f64 / working_height as f64;
        let working = ImageProcessor::from_dynamic(image.clone())
            .resize_to_height(working_height)
            .into_dynamic();
        debug!(
            working_w = working.width(),
            working_h = working.height(),
            ratio,
            "Working copy ready"
        );

        let edges = prepare_edges(
            &working.to_luma8(),
            self.config.blur_sigma,
            self.config.canny_low,
            self.config.canny_high,
        );
        let candidates = self.detector.detect_contours(&edges);

        self.run(image, &working, &candidates, self.approximator.as_ref(), ratio)
    }

    /// Like [`scan`](Self::scan), but a degenerate outline also falls back to
    /// the unrectified input instead of failing.
    pub fn scan_or_original(&self, image: &DynamicImage) -> Result<ScanOutcome> {
        match self.scan(image) {
            Err(err) if err.is_recoverable() => {
                warn!(reason = %err, "Unusable page outline; returning input unrectified");
                Ok(ScanOutcome::unrectified(image))
            }
            other => other,
        }
    }

    /// Select and rectify from candidates the caller traced itself, in
    /// `image` coordinates. The overlay is drawn on a copy of `image`.
    pub fn scan_contours(
        &self,
        image: &DynamicImage,
        candidates: &[CandidateContour],
        approximator: &dyn PolygonApproximator,
    ) -> Result<ScanOutcome> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ScanError::InvalidInput("cannot scan an empty image".into()));
        }
        self.run(image, image, candidates, approximator, 1.0)
    }

    fn run(
        &self,
        image: &DynamicImage,
        working: &DynamicImage,
        candidates: &[CandidateContour],
        approximator: &dyn PolygonApproximator,
        ratio: f64,
    ) -> Result<ScanOutcome> {
        transition(ScanState::AwaitingInput, ScanState::CandidateScan);

        let selection = match self.selector().select(candidates, approximator) {
            Ok(selection) => selection,
            Err(ScanError::NoQuadFound) => {
                transition(ScanState::CandidateScan, ScanState::Unrectified);
                info!(candidates = candidates.len(), "No page outline found");
                return Ok(ScanOutcome::unrectified(image));
            }
            Err(err) => return Err(err),
        };

        let quad = PointOrderer::order(&selection.quad.scale(ratio));
        let rect = RectangleSizer::size(&quad);
        debug!(
            tl = %quad.top_left(),
            tr = %quad.top_right(),
            br = %quad.bottom_right(),
            bl = %quad.bottom_left(),
            width = rect.width,
            height = rect.height,
            "Page outline ordered"
        );

        let warped = HomographyRectifier::new(self.config.interpolation)
            .rectify(image, &quad, rect)?;
        let binary = self.binarizer.binarize(&warped.to_luma8());
        let scanned = DynamicImage::ImageRgb8(DynamicImage::ImageLuma8(binary).to_rgb8());

        let mut overlay = working.to_rgb8();
        draw_closed_polyline(
            &mut overlay,
            &PointOrderer::order(&selection.quad).corners(),
            Rgb(self.config.overlay.color),
            self.config.overlay.thickness,
        );

        transition(ScanState::CandidateScan, ScanState::Rectified);
        info!(
            rank = selection.rank,
            width = rect.width,
            height = rect.height,
            aspect = rect.aspect_ratio(),
            "Page rectified"
        );

        Ok(ScanOutcome {
            state: ScanState::Rectified,
            scanned,
            overlay: DynamicImage::ImageRgb8(overlay),
            quad: Some(quad),
            rect: Some(rect),
        })
    }
}

fn transition(from: ScanState, to: ScanState) {
    debug!(%from, %to, "Scan state");
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatscan_core::types::Point2D;
    use image::{GrayImage, Luma, RgbImage};
    use imageproc::drawing::{draw_filled_circle_mut, draw_polygon_mut};
    use imageproc::point::Point;

    /// Bright, slightly rotated A4-proportioned sheet on a dark table.
    fn photographed_page() -> DynamicImage {
        let mut img = RgbImage::from_pixel(800, 1000, Rgb([30, 30, 35]));
        let corners = [
            Point::new(150, 120),
            Point::new(640, 180),
            Point::new(600, 880),
            Point::new(110, 820),
        ];
        draw_polygon_mut(&mut img, &corners, Rgb([230, 228, 225]));
        DynamicImage::ImageRgb8(img)
    }

    fn is_two_tone_rgb(img: &DynamicImage) -> bool {
        img.to_rgb8().pixels().all(|p| {
            let [r, g, b] = p.0;
            r == g && g == b && (r == 0 || r == 255)
        })
    }

    #[test]
    fn oblique_page_is_rectified() {
        let outcome = ScanPipeline::default().scan(&photographed_page()).unwrap();
        assert_eq!(outcome.state, ScanState::Rectified);

        let rect = outcome.rect.unwrap();
        assert!((rect.aspect_ratio() - 1.414).abs() < 0.05, "{rect:?}");
        assert!((480..=510).contains(&rect.width), "{rect:?}");
        assert_eq!(outcome.scanned.dimensions(), (rect.width, rect.height));
        assert!(is_two_tone_rgb(&outcome.scanned));

        let quad = outcome.quad.unwrap();
        assert!(quad.top_left().distance(&Point2D::new(150.0, 120.0)) < 12.0);
        assert!(quad.bottom_right().distance(&Point2D::new(600.0, 880.0)) < 12.0);
    }

    #[test]
    fn overlay_is_working_copy_with_outline() {
        let outcome = ScanPipeline::default().scan(&photographed_page()).unwrap();
        assert_eq!(outcome.overlay.height(), 500);
        let green = outcome
            .overlay
            .to_rgb8()
            .pixels()
            .filter(|p| p.0 == [0, 255, 0])
            .count();
        assert!(green > 500);
    }

    #[test]
    fn blank_frame_is_returned_byte_identical() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(300, 400, Luma([128])));
        let outcome = ScanPipeline::default().scan(&img).unwrap();
        assert_eq!(outcome.state, ScanState::Unrectified);
        assert_eq!(outcome.scanned.color(), img.color());
        assert_eq!(outcome.scanned.as_bytes(), img.as_bytes());
        assert_eq!(outcome.overlay.as_bytes(), img.as_bytes());
        assert!(outcome.quad.is_none() && outcome.rect.is_none());
    }

    #[test]
    fn round_object_is_not_a_page() {
        let mut img = RgbImage::from_pixel(400, 400, Rgb([20, 20, 20]));
        draw_filled_circle_mut(&mut img, (200, 200), 110, Rgb([240, 240, 240]));
        let img = DynamicImage::ImageRgb8(img);
        let outcome = ScanPipeline::default().scan(&img).unwrap();
        assert!(!outcome.is_rectified());
        assert_eq!(outcome.scanned.as_bytes(), img.as_bytes());
    }

    #[test]
    fn empty_image_is_invalid_input() {
        let err = ScanPipeline::default()
            .scan(&DynamicImage::new_rgb8(0, 0))
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidInput(_)));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ScanConfig {
            candidate_cap: 0,
            ..ScanConfig::default()
        };
        assert!(matches!(ScanPipeline::new(config), Err(ScanError::Config(_))));
    }

    /// Reports every candidate as four collinear points.
    struct Flattening;

    impl PolygonApproximator for Flattening {
        fn approximate_polygon(&self, _: &CandidateContour, _: f64) -> Vec<Point2D> {
            (0..4).map(|i| Point2D::new(i as f64 * 20.0, i as f64 * 20.0)).collect()
        }
    }

    #[test]
    fn degenerate_outline_fails_or_falls_back() {
        let pipeline = ScanPipeline::default().with_approximator(Flattening);
        let page = photographed_page();

        assert!(matches!(
            pipeline.scan(&page),
            Err(ScanError::DegenerateQuad(_))
        ));

        let outcome = pipeline.scan_or_original(&page).unwrap();
        assert_eq!(outcome.state, ScanState::Unrectified);
        assert_eq!(outcome.scanned.as_bytes(), page.as_bytes());
    }

    #[test]
    fn fallback_still_rejects_bad_input() {
        let err = ScanPipeline::default()
            .scan_or_original(&DynamicImage::new_rgb8(0, 0))
            .unwrap_err();
        assert!(!err.is_recoverable());
        assert!(matches!(err, ScanError::InvalidInput(_)));
    }

    #[test]
    fn caller_supplied_contours_skip_detection() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(200, 150, Luma([200])));
        let outline = vec![
            Point2D::new(20.0, 30.0),
            Point2D::new(170.0, 30.0),
            Point2D::new(170.0, 130.0),
            Point2D::new(20.0, 130.0),
        ];
        let candidates = vec![CandidateContour::from_points(outline)];

        let outcome = ScanPipeline::default()
            .scan_contours(&img, &candidates, &DouglasPeucker)
            .unwrap();
        assert!(outcome.is_rectified());
        assert_eq!(outcome.rect, Some(DestinationRect::new(150, 100)));
        assert_eq!(outcome.overlay.dimensions(), (200, 150));
    }
}
