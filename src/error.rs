//! Error types for the edgequake-convert library.
//!
//! Two layers reflect two audiences:
//!
//! * [`ConvertError`]: what a validator check or pipeline stage returns.
//!   Carries structured context (sizes, formats, page numbers) and is
//!   propagated with `?` through every stage.
//!
//! * [`FailureReason`]: the flat tag stored in a failed
//!   [`crate::output::ConversionOutcome`]. Callers branch on this without
//!   matching every error variant.
//!
//! Only the dispatcher in [`crate::convert`] turns a `ConvertError` into an
//! outcome; nothing below it ever panics on bad input.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Bytes per megabyte as used in user-facing size messages.
const MIB: u64 = 1024 * 1024;

fn megabytes(bytes: &u64) -> u64 {
    bytes / MIB
}

/// All errors produced by validation and the conversion pipelines.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Validation ───────────────────────────────────────────────────────
    /// Payload is larger than the configured ceiling.
    #[error("File size exceeds maximum allowed size of {}MB", megabytes(.limit))]
    SizeExceeded { size: u64, limit: u64 },

    /// The source suffix is not a known format, or has no registry entry.
    #[error("Input format '{format}' is not supported")]
    UnsupportedSource { format: String },

    /// Both formats are known but no conversion edge joins them.
    #[error("Conversion from '{from}' to '{to}' is not supported")]
    UnsupportedPair { from: String, to: String },

    // ── Raster stages ────────────────────────────────────────────────────
    /// Source bytes are not a decodable JPEG/PNG.
    #[error("Failed to load image: {0}")]
    ImageDecodeFailed(String),

    /// A drawing surface of the requested size could not be allocated.
    #[error("Failed to get drawing surface of {width}x{height} px")]
    SurfaceUnavailable { width: u32, height: u32 },

    /// Re-encoding the surface produced an error or no bytes at all.
    #[error("Failed to encode image: {0}")]
    EncodeFailed(String),

    // ── Paged documents ──────────────────────────────────────────────────
    /// Byte stream is not a valid paged document.
    #[error("Failed to open PDF document: {0}")]
    DocumentOpenFailed(String),

    /// The rasterizer failed on one page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    PageRenderFailed { page: usize, detail: String },

    /// The document opened but contains zero pages.
    #[error("PDF document has no pages")]
    EmptyDocument,

    // ── Text documents ───────────────────────────────────────────────────
    /// The structured document could not be unpacked or parsed.
    #[error("Unable to extract content from document: {0}")]
    TextExtractionFailed(String),

    /// Extraction succeeded but produced only whitespace.
    #[error("No text content found in the Word document")]
    NoTextContent,

    /// Composing the output PDF failed.
    #[error("Failed to build PDF document: {0}")]
    DocumentBuildFailed(String),

    // ── Ambient ──────────────────────────────────────────────────────────
    /// A PDF rasterizer is required but none is configured or bindable.
    #[error("PDF rasterizer engine is not available: {0}")]
    EngineUnavailable(String),

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// Could not create or write the converted file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error (e.g. the worker task panicked).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// The outcome tag this error is reported under.
    pub fn reason(&self) -> FailureReason {
        match self {
            ConvertError::SizeExceeded { .. } => FailureReason::SizeExceeded,
            ConvertError::UnsupportedSource { .. } | ConvertError::UnsupportedPair { .. } => {
                FailureReason::UnsupportedConversion
            }
            ConvertError::ImageDecodeFailed(_) => FailureReason::ImageDecodeFailed,
            ConvertError::SurfaceUnavailable { .. } => FailureReason::SurfaceUnavailable,
            ConvertError::EncodeFailed(_) => FailureReason::EncodeFailed,
            ConvertError::DocumentOpenFailed(_) => FailureReason::DocumentOpenFailed,
            ConvertError::PageRenderFailed { .. } => FailureReason::PageRenderFailed,
            ConvertError::EmptyDocument => FailureReason::EmptyDocument,
            ConvertError::TextExtractionFailed(_) => FailureReason::TextExtractionFailed,
            ConvertError::NoTextContent => FailureReason::NoTextContent,
            ConvertError::DocumentBuildFailed(_) => FailureReason::DocumentBuildFailed,
            ConvertError::EngineUnavailable(_)
            | ConvertError::FileNotFound { .. }
            | ConvertError::PermissionDenied { .. }
            | ConvertError::OutputWriteFailed { .. }
            | ConvertError::InvalidConfig(_)
            | ConvertError::Internal(_) => FailureReason::ConversionFailed,
        }
    }
}

/// Flat failure tag carried by a failed conversion outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureReason {
    SizeExceeded,
    UnsupportedConversion,
    ImageDecodeFailed,
    SurfaceUnavailable,
    EncodeFailed,
    DocumentOpenFailed,
    PageRenderFailed,
    EmptyDocument,
    TextExtractionFailed,
    NoTextContent,
    DocumentBuildFailed,
    /// Any lower-level fault not otherwise classified.
    ConversionFailed,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::SizeExceeded => "SizeExceeded",
            FailureReason::UnsupportedConversion => "UnsupportedConversion",
            FailureReason::ImageDecodeFailed => "ImageDecodeFailed",
            FailureReason::SurfaceUnavailable => "SurfaceUnavailable",
            FailureReason::EncodeFailed => "EncodeFailed",
            FailureReason::DocumentOpenFailed => "DocumentOpenFailed",
            FailureReason::PageRenderFailed => "PageRenderFailed",
            FailureReason::EmptyDocument => "EmptyDocument",
            FailureReason::TextExtractionFailed => "TextExtractionFailed",
            FailureReason::NoTextContent => "NoTextContent",
            FailureReason::DocumentBuildFailed => "DocumentBuildFailed",
            FailureReason::ConversionFailed => "ConversionFailed",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_exceeded_states_limit_in_mb() {
        let e = ConvertError::SizeExceeded {
            size: 15 * MIB,
            limit: 10 * MIB,
        };
        assert_eq!(
            e.to_string(),
            "File size exceeds maximum allowed size of 10MB"
        );
        assert_eq!(e.reason(), FailureReason::SizeExceeded);
    }

    #[test]
    fn unsupported_messages_are_distinct() {
        let source = ConvertError::UnsupportedSource {
            format: "gif".into(),
        };
        let pair = ConvertError::UnsupportedPair {
            from: "png".into(),
            to: "docx".into(),
        };
        assert!(source.to_string().contains("Input format 'gif'"));
        assert!(pair.to_string().contains("from 'png' to 'docx'"));
        assert_eq!(source.reason(), FailureReason::UnsupportedConversion);
        assert_eq!(pair.reason(), FailureReason::UnsupportedConversion);
    }

    #[test]
    fn page_render_display() {
        let e = ConvertError::PageRenderFailed {
            page: 3,
            detail: "bitmap allocation".into(),
        };
        assert!(e.to_string().contains("page 3"));
        assert!(e.to_string().contains("bitmap allocation"));
    }

    #[test]
    fn ambient_errors_are_catch_all() {
        assert_eq!(
            ConvertError::Internal("boom".into()).reason(),
            FailureReason::ConversionFailed
        );
        assert_eq!(
            ConvertError::EngineUnavailable("unbound".into()).reason(),
            FailureReason::ConversionFailed
        );
    }

    #[test]
    fn reason_display_matches_tag() {
        assert_eq!(FailureReason::NoTextContent.to_string(), "NoTextContent");
    }
}
