// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people holding a camera, not a debugger.
//
// Every technical error is mapped to plain English with a clear suggestion.

use crate::error::ScanError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A retake will probably fix it (glare, angle, framing).
    Retake,
    /// User must change something (file, setting, permission).
    ActionRequired,
    /// Cannot be fixed by retrying: wrong format, broken file, internal fault.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    /// Whether trying again with a new photo could succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `ScanError` into a `HumanError`.
pub fn humanize_error(err: &ScanError) -> HumanError {
    match err {
        ScanError::NoQuadFound => HumanError {
            message: "We couldn't find the edges of the page.".into(),
            suggestion: "Place the document on a plain, contrasting surface and make sure all four corners are in the photo.".into(),
            retriable: true,
            severity: Severity::Retake,
        },

        ScanError::DegenerateQuad(_) => HumanError {
            message: "The page edges we found don't form a proper rectangle.".into(),
            suggestion: "Take the photo from a little further back so the whole page is visible and flat.".into(),
            retriable: true,
            severity: Severity::Retake,
        },

        ScanError::InvalidInput(detail) => HumanError {
            message: "That image can't be scanned.".into(),
            suggestion: format!("The image appears to be empty or malformed. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        ScanError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        ScanError::PdfError(_) => HumanError {
            message: "The scan couldn't be saved as a PDF.".into(),
            suggestion: "Try saving it as an image instead.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        ScanError::Config(detail) => HumanError {
            message: "One of the scanner settings isn't valid.".into(),
            suggestion: format!("Check the configuration file. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "The file couldn't be found.".into(),
                suggestion: "It may have been moved or deleted. Check the path and try again.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Flatscan doesn't have permission to use that file.".into(),
                suggestion: "Check the file permissions, or choose a different output folder.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "There was a problem reading or writing a file.".into(),
                suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                retriable: true,
                severity: Severity::ActionRequired,
            },
        },

        ScanError::Serialization(_) => HumanError {
            message: "A settings or report file couldn't be read.".into(),
            suggestion: "Make sure the file is valid JSON, or delete it to fall back to defaults.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}
