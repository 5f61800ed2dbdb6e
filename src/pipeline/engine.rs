//! Rasterizer engine seam for PDF → image conversion.
//!
//! The extractor never touches pdfium directly; it talks to a
//! [`RasterEngine`] handed in by the caller. [`PdfiumEngine`] is the
//! production implementation. Bind it once at startup and share the
//! `Arc` with every [`crate::Converter`]; it is never re-bound per request.
//!
//! ## Library resolution
//!
//! [`PdfiumEngine::bind`] tries, in order:
//!
//! 1. the explicit path passed by the caller
//! 2. `PDFIUM_LIB_PATH`
//! 3. the platform library name in the current working directory
//! 4. the system library search path

use crate::error::ConvertError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Opens paged documents for rasterisation.
pub trait RasterEngine: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Parse `bytes` as a paged document.
    ///
    /// Fails with [`ConvertError::DocumentOpenFailed`] when the bytes are
    /// not a valid document.
    fn open<'a>(&'a self, bytes: &'a [u8]) -> Result<Box<dyn RasterDocument + 'a>, ConvertError>;
}

/// An opened document. Page indices are 0-based.
pub trait RasterDocument {
    fn page_count(&self) -> usize;

    /// Native page width at scale 1, in points.
    fn page_width(&self, index: usize) -> Result<f32, ConvertError>;

    /// Rasterise one page so the result is `width_px` pixels wide and at
    /// most `max_height_px` pixels tall.
    fn render_page(
        &self,
        index: usize,
        width_px: u32,
        max_height_px: u32,
    ) -> Result<DynamicImage, ConvertError>;
}

// ── pdfium ───────────────────────────────────────────────────────────────

/// [`RasterEngine`] backed by a bound pdfium library.
pub struct PdfiumEngine {
    pdfium: Pdfium,
}

impl PdfiumEngine {
    /// Wrap an already bound [`Pdfium`].
    pub fn new(pdfium: Pdfium) -> Self {
        Self { pdfium }
    }

    /// Locate and bind the pdfium shared library.
    pub fn bind(explicit: Option<&Path>) -> Result<Self, ConvertError> {
        if let Some(path) = explicit {
            return Self::bind_path(path);
        }

        if let Ok(env_path) = std::env::var("PDFIUM_LIB_PATH") {
            let p = PathBuf::from(env_path);
            if p.exists() {
                return Self::bind_path(&p);
            }
            debug!("PDFIUM_LIB_PATH '{}' does not exist; continuing", p.display());
        }

        let local = PathBuf::from(".").join(platform_library_name());
        if local.exists() {
            return Self::bind_path(&local);
        }

        let bindings = Pdfium::bind_to_system_library().map_err(|e| {
            ConvertError::EngineUnavailable(format!(
                "pdfium not found on the system library path ({:?}); set PDFIUM_LIB_PATH",
                e
            ))
        })?;
        info!("Bound pdfium from system library path");
        Ok(Self::new(Pdfium::new(bindings)))
    }

    fn bind_path(path: &Path) -> Result<Self, ConvertError> {
        let bindings = Pdfium::bind_to_library(path).map_err(|e| {
            ConvertError::EngineUnavailable(format!(
                "failed to bind pdfium from '{}': {:?}",
                path.display(),
                e
            ))
        })?;
        info!("Bound pdfium from {}", path.display());
        Ok(Self::new(Pdfium::new(bindings)))
    }
}

impl RasterEngine for PdfiumEngine {
    fn name(&self) -> &str {
        "pdfium"
    }

    fn open<'a>(&'a self, bytes: &'a [u8]) -> Result<Box<dyn RasterDocument + 'a>, ConvertError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| ConvertError::DocumentOpenFailed(format!("{:?}", e)))?;
        Ok(Box::new(PdfiumDocument { document }))
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumDocument<'a> {
    fn page(&self, index: usize) -> Result<PdfPage<'a>, ConvertError> {
        let render_err = |detail: String| ConvertError::PageRenderFailed {
            page: index + 1,
            detail,
        };
        let idx = u16::try_from(index).map_err(|_| render_err("page index out of range".into()))?;
        self.document
            .pages()
            .get(idx)
            .map_err(|e| render_err(format!("{:?}", e)))
    }
}

impl RasterDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_width(&self, index: usize) -> Result<f32, ConvertError> {
        Ok(self.page(index)?.width().value)
    }

    fn render_page(
        &self,
        index: usize,
        width_px: u32,
        max_height_px: u32,
    ) -> Result<DynamicImage, ConvertError> {
        let page = self.page(index)?;
        let render_config = PdfRenderConfig::new()
            .set_target_width(width_px as i32)
            .set_maximum_height(max_height_px as i32);
        let bitmap =
            page.render_with_config(&render_config)
                .map_err(|e| ConvertError::PageRenderFailed {
                    page: index + 1,
                    detail: format!("{:?}", e),
                })?;
        Ok(bitmap.as_image())
    }
}

/// File name of the pdfium shared library on this platform.
pub fn platform_library_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "pdfium.dll"
    } else if cfg!(target_os = "macos") {
        "libpdfium.dylib"
    } else {
        "libpdfium.so"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_library_name_is_a_shared_object() {
        let name = platform_library_name();
        assert!(name.contains("pdfium"));
        assert!(name.ends_with(".so") || name.ends_with(".dylib") || name.ends_with(".dll"));
    }

    #[test]
    fn binding_a_missing_path_is_engine_unavailable() {
        let err = PdfiumEngine::bind(Some(Path::new("/nonexistent/libpdfium.so")))
            .err()
            .unwrap();
        assert!(matches!(err, ConvertError::EngineUnavailable(_)));
    }
}
