//! Conversion dispatcher: validate, route, run one pipeline, wrap the result.
//!
//! [`Converter::convert`] never returns an error and never panics on bad
//! input. Every fault, including a panic inside the worker, ends up in a
//! [`ConversionOutcome::Failure`]. Library callers that prefer `?` can use
//! [`Converter::convert_to_file`], which returns the underlying
//! [`ConvertError`] instead.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::format::{change_suffix, FormatTag, RasterFormat};
use crate::output::{ConversionOutcome, OutputArtifact};
use crate::pipeline::engine::RasterEngine;
use crate::pipeline::text_pdf::TextLayout;
use crate::pipeline::{image_pdf, render, text_pdf, transcode};
use crate::progress::ConversionState;
use crate::source::SourceFile;
use crate::validate;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// One row of the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    /// JPEG ↔ PNG.
    Transcode(RasterFormat),
    /// JPEG/PNG → single-page PDF.
    ImageToPdf,
    /// PDF → first page as JPEG/PNG.
    PdfToImage(RasterFormat),
    /// DOCX → multi-page PDF.
    WordToPdf,
}

impl Pipeline {
    /// Look up the pipeline for a pair. `None` means no dispatch row exists,
    /// even if the registry lists the pair (legacy `.doc`).
    pub fn route(source: FormatTag, destination: FormatTag) -> Option<Pipeline> {
        use FormatTag::*;
        match (source.canonical(), destination.canonical()) {
            (Jpg, Png) => Some(Pipeline::Transcode(RasterFormat::Png)),
            (Png, Jpg) => Some(Pipeline::Transcode(RasterFormat::Jpeg)),
            (Jpg, Pdf) | (Png, Pdf) => Some(Pipeline::ImageToPdf),
            (Pdf, Jpg) => Some(Pipeline::PdfToImage(RasterFormat::Jpeg)),
            (Pdf, Png) => Some(Pipeline::PdfToImage(RasterFormat::Png)),
            (Docx, Pdf) => Some(Pipeline::WordToPdf),
            _ => None,
        }
    }

    /// Operation name prepended to pipeline failure messages.
    pub fn failure_prefix(&self) -> &'static str {
        match self {
            Pipeline::Transcode(_) => "Failed to convert image",
            Pipeline::ImageToPdf => "Failed to convert image to PDF",
            Pipeline::PdfToImage(_) => "Failed to convert PDF to images",
            Pipeline::WordToPdf => "Failed to convert Word to PDF",
        }
    }

    pub fn output_mime_type(&self) -> &'static str {
        match self {
            Pipeline::Transcode(f) | Pipeline::PdfToImage(f) => f.mime_type(),
            Pipeline::ImageToPdf | Pipeline::WordToPdf => FormatTag::Pdf.mime_type(),
        }
    }
}

/// Runs conversions with a fixed configuration and optional PDF rasterizer.
///
/// Cheap to clone; share one per process.
#[derive(Clone)]
pub struct Converter {
    config: ConversionConfig,
    engine: Option<Arc<dyn RasterEngine>>,
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("config", &self.config)
            .field("engine", &self.engine.as_ref().map(|e| e.name().to_string()))
            .finish()
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConversionConfig::default())
    }
}

impl Converter {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            config,
            engine: None,
        }
    }

    /// Attach the rasterizer used for PDF → image conversions.
    pub fn with_raster_engine(mut self, engine: Arc<dyn RasterEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Convert `source` to `destination`.
    ///
    /// Always returns an outcome; check [`ConversionOutcome::is_success`].
    ///
    /// # Example
    /// ```rust,no_run
    /// use edgequake_convert::{Converter, FormatTag, SourceFile};
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let source = SourceFile::new("photo.jpg", std::fs::read("photo.jpg").unwrap());
    /// let outcome = Converter::default().convert(source, FormatTag::Png).await;
    /// println!("{:?}", outcome.report());
    /// # }
    /// ```
    pub async fn convert(&self, source: SourceFile, destination: FormatTag) -> ConversionOutcome {
        let name = source.name().to_string();
        let declared = source.declared_format();

        match self.run(source, destination).await {
            Ok((artifact, file_name)) => ConversionOutcome::Success {
                artifact,
                file_name,
            },
            Err(err) => {
                let message = describe_failure(declared, destination, &err);
                warn!("Conversion of '{}' failed: {}", name, message);
                ConversionOutcome::failure(err.reason(), message)
            }
        }
    }

    /// Blocking wrapper around [`Converter::convert`].
    ///
    /// Creates a private tokio runtime. Do not call from inside a runtime.
    pub fn convert_sync(&self, source: SourceFile, destination: FormatTag) -> ConversionOutcome {
        match tokio::runtime::Runtime::new() {
            Ok(rt) => rt.block_on(self.convert(source, destination)),
            Err(e) => {
                let err = ConvertError::Internal(format!("Failed to create tokio runtime: {}", e));
                ConversionOutcome::failure(err.reason(), err.to_string())
            }
        }
    }

    /// Convert and write the result to `output_path` atomically.
    ///
    /// Missing parent directories are created.
    pub async fn convert_to_file(
        &self,
        source: SourceFile,
        destination: FormatTag,
        output_path: impl AsRef<Path>,
    ) -> Result<PathBuf, ConvertError> {
        let path = output_path.as_ref().to_path_buf();
        let (artifact, _) = self.run(source, destination).await?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ConvertError::OutputWriteFailed {
                    path: path.clone(),
                    source: e,
                })?;
        }

        tokio::task::spawn_blocking(move || artifact.write_to(&path))
            .await
            .map_err(|e| ConvertError::Internal(format!("Write task panicked: {}", e)))?
    }

    // ── Internal ─────────────────────────────────────────────────────────

    async fn run(
        &self,
        source: SourceFile,
        destination: FormatTag,
    ) -> Result<(OutputArtifact, String), ConvertError> {
        let start = Instant::now();
        self.notify(ConversionState::Running);
        info!(
            "Converting '{}' ({} bytes) to {}",
            source.name(),
            source.size(),
            destination
        );

        let result = self.dispatch(source, destination).await;
        match &result {
            Ok((artifact, file_name)) => {
                self.notify(ConversionState::Succeeded);
                info!(
                    "Converted to '{}' ({} bytes) in {}ms",
                    file_name,
                    artifact.len(),
                    start.elapsed().as_millis()
                );
            }
            Err(_) => self.notify(ConversionState::Failed),
        }
        result
    }

    async fn dispatch(
        &self,
        source: SourceFile,
        destination: FormatTag,
    ) -> Result<(OutputArtifact, String), ConvertError> {
        // ── Step 1: Validate size and registry edge ──────────────────────
        let source_format = validate::validate(&source, destination, &self.config)?;

        // ── Step 2: Route through the dispatch table ─────────────────────
        let pipeline = Pipeline::route(source_format, destination).ok_or_else(|| {
            ConvertError::UnsupportedPair {
                from: source_format.to_string(),
                to: destination.to_string(),
            }
        })?;
        debug!("Routing {} → {} via {:?}", source_format, destination, pipeline);

        // ── Step 3: Run the pipeline on a blocking thread ────────────────
        let file_name = change_suffix(source.name(), destination);
        let payload = source.into_payload();
        let config = self.config.clone();
        let engine = self.engine.clone();

        let bytes = tokio::task::spawn_blocking(move || {
            run_pipeline(pipeline, &payload, &config, engine.as_deref())
        })
        .await
        .map_err(|e| ConvertError::Internal(format!("Conversion task panicked: {}", e)))??;

        if bytes.is_empty() {
            return Err(ConvertError::EncodeFailed("pipeline produced no output".into()));
        }

        // ── Step 4: Wrap the payload ─────────────────────────────────────
        Ok((
            OutputArtifact::new(bytes, pipeline.output_mime_type()),
            file_name,
        ))
    }

    fn notify(&self, state: ConversionState) {
        debug!("Conversion state → {}", state);
        if let Some(observer) = &self.config.observer {
            observer.on_state_change(state);
        }
    }
}

fn run_pipeline(
    pipeline: Pipeline,
    payload: &[u8],
    config: &ConversionConfig,
    engine: Option<&dyn RasterEngine>,
) -> Result<Vec<u8>, ConvertError> {
    match pipeline {
        Pipeline::Transcode(target) => transcode::transcode(payload, target, config),
        Pipeline::ImageToPdf => image_pdf::image_to_pdf(payload, config),
        Pipeline::PdfToImage(target) => {
            let engine = engine.ok_or_else(|| {
                ConvertError::EngineUnavailable("no PDF rasterizer engine configured".into())
            })?;
            let page = render::extract_first_page(engine, payload, target, config)?;
            Ok(page.data)
        }
        Pipeline::WordToPdf => text_pdf::word_to_pdf(payload, &TextLayout::default()),
    }
}

/// User-facing message: validation errors verbatim, pipeline errors
/// prefixed with the operation name.
fn describe_failure(
    declared: Option<FormatTag>,
    destination: FormatTag,
    err: &ConvertError,
) -> String {
    let is_validation = matches!(
        err,
        ConvertError::SizeExceeded { .. }
            | ConvertError::UnsupportedSource { .. }
            | ConvertError::UnsupportedPair { .. }
    );
    let pipeline = declared.and_then(|src| Pipeline::route(src, destination));
    match pipeline {
        Some(p) if !is_validation => format!("{}: {}", p.failure_prefix(), err),
        _ => err.to_string(),
    }
}
