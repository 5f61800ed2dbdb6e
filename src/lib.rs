//! # edgequake-convert
//!
//! Convert files between JPG, PNG, PDF and DOCX without a server.
//!
//! ## Supported conversions
//!
//! | From       | To          | Pipeline |
//! |------------|-------------|----------|
//! | JPG / JPEG | PNG, PDF    | transcode / image on an A4 page |
//! | PNG        | JPG, PDF    | transcode (alpha flattened to white) / image on an A4 page |
//! | PDF        | JPG, PNG    | rasterise the first page via pdfium |
//! | DOCX       | PDF         | extract text, wrap and paginate on A4 |
//!
//! `.doc` is listed by the registry but has no pipeline; converting one
//! fails with `UnsupportedConversion`.
//!
//! ## Pipeline Overview
//!
//! ```text
//! SourceFile
//!  │
//!  ├─ 1. Validate  size ≤ 10 MiB, registry has source → destination
//!  ├─ 2. Route     pick one dispatch-table row
//!  ├─ 3. Run       pipeline on a blocking thread (spawn_blocking)
//!  └─ 4. Wrap      OutputArtifact + renamed file, or a failure outcome
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_convert::{Converter, FormatTag, SourceFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = SourceFile::from_path("photo.png").await?;
//!     let outcome = Converter::default().convert(source, FormatTag::Jpg).await;
//!     if let Some(artifact) = outcome.artifact() {
//!         artifact.write_to(outcome.file_name().unwrap_or("out.jpg"))?;
//!     } else {
//!         eprintln!("{}", outcome.error_message().unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! PDF sources need a rasterizer. Bind pdfium once and attach it:
//!
//! ```rust,no_run
//! use edgequake_convert::{Converter, PdfiumEngine};
//! use std::sync::Arc;
//!
//! let engine = PdfiumEngine::bind(None).expect("pdfium library");
//! let converter = Converter::default().with_raster_engine(Arc::new(engine));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `fileconv` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-convert = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod format;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod source;
pub mod validate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, DEFAULT_MAX_FILE_SIZE};
pub use convert::{Converter, Pipeline};
pub use error::{ConvertError, FailureReason};
pub use format::{
    change_suffix, format_file_size, is_reachable, reachable_formats, reachable_from_extension,
    supported_conversions, FormatTag, RasterFormat,
};
pub use output::{ConversionOutcome, OutcomeReport, OutputArtifact};
pub use pipeline::engine::{PdfiumEngine, RasterDocument, RasterEngine};
pub use pipeline::render::{extract_pages, PageImage};
pub use progress::{ConversionObserver, ConversionState, NoopObserver, Observer};
pub use source::SourceFile;
