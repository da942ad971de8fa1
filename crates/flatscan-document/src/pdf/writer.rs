// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan-to-PDF export using `printpdf` 0.8.
//
// printpdf 0.8 is data-oriented: each page is a `PdfPage` holding a `Vec<Op>`,
// and the finished document is serialised with `PdfDocument::save()`.

use std::path::Path;

use flatscan_core::PaperSize;
use flatscan_core::error::ScanError;
use image::DynamicImage;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

/// Nominal resolution used to size scans on the page.
const DEFAULT_DPI: f32 = 150.0;

/// Page margin on every side.
const MARGIN_MM: f32 = 15.0;

/// Places scanned pages onto paper-sized PDF pages, one image per page.
pub struct PdfWriter {
    paper_size: PaperSize,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: Option<String>,
    dpi: f32,
}

impl PdfWriter {
    pub fn new(paper_size: PaperSize) -> Self {
        Self {
            paper_size,
            title: None,
            dpi: DEFAULT_DPI,
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        (Mm(w_mm as f32), Mm(h_mm as f32))
    }

    /// Single-page PDF containing `image`, centred and shrunk to fit inside
    /// the margins (never upscaled).
    pub fn create_from_image(&self, image: &DynamicImage) -> Result<Vec<u8>, ScanError> {
        self.create_from_images(std::slice::from_ref(image))
    }

    /// One page per image, in order.
    #[instrument(skip_all, fields(pages = images.len(), paper = ?self.paper_size))]
    pub fn create_from_images(&self, images: &[DynamicImage]) -> Result<Vec<u8>, ScanError> {
        if images.is_empty() {
            return Err(ScanError::PdfError("no pages to export".into()));
        }
        let title = self.title.as_deref().unwrap_or("Flatscan Scan");
        let mut doc = PdfDocument::new(title);

        let mut pages = Vec::with_capacity(images.len());
        for image in images {
            if image.width() == 0 || image.height() == 0 {
                return Err(ScanError::PdfError("cannot place an empty image".into()));
            }
            let page = self.place_image(&mut doc, image);
            pages.push(page);
        }
        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(
            bytes = output.len(),
            warnings = warnings.len(),
            "PDF serialised"
        );
        info!(pages = images.len(), title, "Scan exported to PDF");
        Ok(output)
    }

    fn place_image(&self, doc: &mut PdfDocument, image: &DynamicImage) -> PdfPage {
        let (page_w, page_h) = self.page_dimensions();
        let (img_width, img_height) = (image.width() as usize, image.height() as usize);

        let raw = RawImage {
            pixels: RawImageData::U8(image.to_rgb8().into_raw()),
            width: img_width,
            height: img_height,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let xobject_id = doc.add_image(&raw);

        let usable_w_pt = Mm(page_w.0 - 2.0 * MARGIN_MM).into_pt().0;
        let usable_h_pt = Mm(page_h.0 - 2.0 * MARGIN_MM).into_pt().0;

        let img_w_pt = img_width as f32 / self.dpi * 72.0;
        let img_h_pt = img_height as f32 / self.dpi * 72.0;
        let scale = (usable_w_pt / img_w_pt).min(usable_h_pt / img_h_pt).min(1.0);

        let rendered_w_pt = img_w_pt * scale;
        let rendered_h_pt = img_h_pt * scale;
        let margin_pt = Mm(MARGIN_MM).into_pt().0;
        let x_offset = margin_pt + (usable_w_pt - rendered_w_pt) / 2.0;
        let y_offset = margin_pt + (usable_h_pt - rendered_h_pt) / 2.0;

        debug!(rendered_w_pt, rendered_h_pt, scale, "Image placed on page");

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(x_offset)),
                translate_y: Some(Pt(y_offset)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(self.dpi),
                rotate: None,
            },
        }];
        PdfPage::new(page_w, page_h, ops)
    }

    /// Export `image` as a one-page PDF at `path`.
    pub fn write_image_to_file(
        &self,
        image: &DynamicImage,
        path: impl AsRef<Path>,
    ) -> Result<(), ScanError> {
        let bytes = self.create_from_image(image)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote scan PDF to {}", path.as_ref().display());
        Ok(())
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new(PaperSize::A4)
    }
}
