// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `flatscan annotate` — outline a polygon on an image.

use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use clap::Args;
use flatscan_core::Point2D;
use flatscan_document::{ImageProcessor, OverlayAnnotator};
use tracing::info;

use super::{load_image, report};

#[derive(Args, Debug)]
pub struct AnnotateCommand {
    /// Image to draw on
    #[arg(value_name = "IMAGE")]
    input: PathBuf,

    /// Vertices as "x,y;x,y;..."; the last joins back to the first
    #[arg(long)]
    polygon: String,

    /// Label drawn just above the first vertex (needs --font)
    #[arg(long)]
    text: Option<String>,

    /// TrueType/OpenType font for the label
    #[arg(long, value_name = "TTF")]
    font: Option<PathBuf>,

    /// Line thickness in pixels
    #[arg(long, default_value_t = 3)]
    thickness: u32,

    /// Annotated output
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,
}

impl AnnotateCommand {
    pub fn execute(self) -> Result<()> {
        let points = parse_polygon(&self.polygon)?;
        let image = load_image(&self.input)?;

        let mut annotator = OverlayAnnotator::default();
        annotator.thickness = self.thickness.max(1);
        if let Some(path) = &self.font {
            let font = OverlayAnnotator::load_font(path)
                .with_context(|| format!("loading font {}", path.display()))?;
            annotator = annotator.with_font(font);
        }

        let annotated = annotator
            .annotate(&image, &points, self.text.as_deref())
            .map_err(report)?;
        ImageProcessor::from_dynamic(annotated)
            .save(&self.output)
            .with_context(|| format!("writing {}", self.output.display()))?;

        info!(vertices = points.len(), output = %self.output.display(), "Annotation written");
        Ok(())
    }
}

/// Parse `"x,y;x,y;..."` into points. Whitespace around numbers is allowed.
pub fn parse_polygon(input: &str) -> Result<Vec<Point2D>> {
    let mut points = Vec::new();
    for pair in input.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let Some((x, y)) = pair.split_once(',') else {
            bail!("vertex {pair:?} is not of the form x,y");
        };
        let x: f64 = x.trim().parse().with_context(|| format!("bad x in {pair:?}"))?;
        let y: f64 = y.trim().parse().with_context(|| format!("bad y in {pair:?}"))?;
        points.push(Point2D::new(x, y));
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vertices() {
        let points = parse_polygon("10,10; 200, 12;190.5,300 ;").unwrap();
        assert_eq!(
            points,
            vec![
                Point2D::new(10.0, 10.0),
                Point2D::new(200.0, 12.0),
                Point2D::new(190.5, 300.0),
            ]
        );
    }

    #[test]
    fn rejects_malformed_vertices() {
        assert!(parse_polygon("10;20").is_err());
        assert!(parse_polygon("a,b").is_err());
    }

    #[test]
    fn annotate_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("page.png");
        image::DynamicImage::new_rgb8(50, 50).save(&input).unwrap();

        let cmd = AnnotateCommand {
            input,
            polygon: "5,5;45,5;45,45;5,45".into(),
            text: Some("page 1".into()),
            font: None,
            thickness: 2,
            output: dir.path().join("marked.png"),
        };
        let output = cmd.output.clone();
        cmd.execute().unwrap();

        let marked = image::open(&output).unwrap().to_rgb8();
        assert_eq!(marked.get_pixel(25, 5).0, [0, 255, 0]);
    }
}
