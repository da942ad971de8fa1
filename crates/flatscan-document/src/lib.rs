// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// flatscan-document — image work for Flatscan.
//
// Recovers the page quadrilateral from a photograph, rectifies it with a
// homography, binarizes the result, and exports it as an image, a PDF or an
// annotated overlay.

pub mod image;
pub mod overlay;
pub mod pdf;
pub mod scan;

// Re-export the primary structs so callers can use `flatscan_document::ScanPipeline` etc.
pub use crate::image::processor::ImageProcessor;
pub use overlay::OverlayAnnotator;
pub use pdf::writer::PdfWriter;
pub use scan::pipeline::{ScanOutcome, ScanPipeline};
pub use scan::report::ScanReport;
