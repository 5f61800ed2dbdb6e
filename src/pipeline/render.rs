//! PDF → image: rasterise pages through a [`RasterEngine`] and encode them.
//!
//! ## Scale
//!
//! Each page is rendered so its width approaches `raster_target_width`, but
//! never at more than `max_render_scale` × its native width. A 2-inch label
//! therefore stays small instead of being blown up to 1920 px. If the
//! rendered bitmap is still wider than the target it is downsampled.
//!
//! Pages are processed one at a time, in document order. This is blocking
//! work; the dispatcher runs it inside `spawn_blocking`.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::format::RasterFormat;
use crate::pipeline::engine::RasterEngine;
use crate::pipeline::surface::Surface;
use tracing::{debug, info};

/// One rasterised and encoded page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    /// 1-indexed.
    pub page_number: usize,
    pub width: u32,
    pub height: u32,
    pub format: RasterFormat,
    /// JPEG quality used, `None` for PNG.
    pub quality: Option<u8>,
    pub data: Vec<u8>,
}

/// Scale that brings `native_width` to `target_width`, capped at `max_scale`.
pub fn render_scale(
    page: usize,
    native_width: f32,
    target_width: u32,
    max_scale: f32,
) -> Result<f32, ConvertError> {
    if !(native_width.is_finite() && native_width > 0.0) {
        return Err(ConvertError::PageRenderFailed {
            page,
            detail: format!("invalid native page width {}", native_width),
        });
    }
    Ok((target_width as f32 / native_width).min(max_scale))
}

/// Tallest bitmap that keeps a `width`-pixel render within `max_pixels`.
pub fn max_render_height(width: u32, max_pixels: u64) -> u32 {
    let rows = max_pixels / u64::from(width.max(1));
    rows.clamp(1, i32::MAX as u64) as u32
}

/// Rasterise up to `limit` pages (all when `None`) of the document in `bytes`.
///
/// Fails with [`ConvertError::EmptyDocument`] when the document has no
/// pages; any page failure aborts the whole extraction.
pub fn extract_pages(
    engine: &dyn RasterEngine,
    bytes: &[u8],
    format: RasterFormat,
    config: &ConversionConfig,
    limit: Option<usize>,
) -> Result<Vec<PageImage>, ConvertError> {
    let document = engine.open(bytes)?;
    let total_pages = document.page_count();
    if total_pages == 0 {
        return Err(ConvertError::EmptyDocument);
    }
    let wanted = limit.unwrap_or(total_pages).min(total_pages);
    info!(
        "Document opened with {}: {} pages, rendering {}",
        engine.name(),
        total_pages,
        wanted
    );

    let quality = match format {
        RasterFormat::Jpeg => Some(config.jpeg_quality),
        RasterFormat::Png => None,
    };

    let mut pages = Vec::with_capacity(wanted);
    for idx in 0..wanted {
        let page_number = idx + 1;
        let native_width = document.page_width(idx)?;
        let scale = render_scale(
            page_number,
            native_width,
            config.raster_target_width,
            config.max_render_scale,
        )?;
        let render_width = ((native_width * scale).round() as u32).max(1);

        let max_height = max_render_height(render_width, config.max_surface_pixels);
        let bitmap = document.render_page(idx, render_width, max_height)?;
        debug!(
            "Rendered page {} at scale {:.3} → {}x{} px",
            page_number,
            scale,
            bitmap.width(),
            bitmap.height()
        );

        let mut surface = Surface::for_format(
            bitmap.width(),
            bitmap.height(),
            format,
            config.max_surface_pixels,
        )?;
        surface.draw(&bitmap);
        drop(bitmap);
        let surface = surface.downsample_to_width(config.raster_target_width);

        let data = surface.encode(format, config.jpeg_quality)?;
        pages.push(PageImage {
            page_number,
            width: surface.width(),
            height: surface.height(),
            format,
            quality,
            data,
        });

        if let Some(observer) = &config.observer {
            observer.on_page_rendered(page_number, wanted);
        }
    }

    Ok(pages)
}

/// Rasterise only the first page.
pub fn extract_first_page(
    engine: &dyn RasterEngine,
    bytes: &[u8],
    format: RasterFormat,
    config: &ConversionConfig,
) -> Result<PageImage, ConvertError> {
    extract_pages(engine, bytes, format, config, Some(1))?
        .into_iter()
        .next()
        .ok_or(ConvertError::EmptyDocument)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::engine::RasterDocument;
    use image::{DynamicImage, Rgba, RgbaImage};

    /// Pages of a fixed native width; each renders as a solid colour at a
    /// 1:√2 aspect ratio.
    struct FakeEngine {
        widths: Vec<f32>,
    }

    struct FakeDocument<'a> {
        widths: &'a [f32],
    }

    impl RasterEngine for FakeEngine {
        fn name(&self) -> &str {
            "fake"
        }

        fn open<'a>(
            &'a self,
            bytes: &'a [u8],
        ) -> Result<Box<dyn RasterDocument + 'a>, ConvertError> {
            if !bytes.starts_with(b"%PDF") {
                return Err(ConvertError::DocumentOpenFailed("bad header".into()));
            }
            Ok(Box::new(FakeDocument {
                widths: &self.widths,
            }))
        }
    }

    impl RasterDocument for FakeDocument<'_> {
        fn page_count(&self) -> usize {
            self.widths.len()
        }

        fn page_width(&self, index: usize) -> Result<f32, ConvertError> {
            Ok(self.widths[index])
        }

        fn render_page(
            &self,
            index: usize,
            width_px: u32,
            max_height_px: u32,
        ) -> Result<DynamicImage, ConvertError> {
            let height = (((width_px as f32) * 1.414).round() as u32).min(max_height_px);
            let shade = (index * 60) as u8;
            Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                width_px,
                height,
                Rgba([shade, 0, 0, 255]),
            )))
        }
    }

    #[test]
    fn scale_targets_width_and_caps() {
        // A4 at 595pt: 1920 / 595 ≈ 3.23, capped at 3.0
        assert!((render_scale(1, 595.0, 1920, 3.0).unwrap() - 3.0).abs() < 1e-6);
        // Letter landscape at 792pt
        let s = render_scale(1, 792.0, 1920, 3.0).unwrap();
        assert!((792.0 * s - 1920.0).abs() < 0.01);
        // Huge page scales down
        assert!(render_scale(1, 4000.0, 1920, 3.0).unwrap() < 1.0);
    }

    #[test]
    fn zero_native_width_fails() {
        let err = render_scale(2, 0.0, 1920, 3.0).unwrap_err();
        assert!(matches!(err, ConvertError::PageRenderFailed { page: 2, .. }));
    }

    #[test]
    fn extracts_all_pages_in_order() {
        let engine = FakeEngine {
            widths: vec![600.0, 600.0, 600.0],
        };
        let pages = extract_pages(
            &engine,
            b"%PDF-1.7",
            RasterFormat::Png,
            &ConversionConfig::default(),
            None,
        )
        .unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(
            pages.iter().map(|p| p.page_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(pages.iter().all(|p| p.width == 1800 && p.quality.is_none()));
    }

    #[test]
    fn small_page_is_capped_at_three_times_native() {
        let engine = FakeEngine {
            widths: vec![144.0],
        };
        let page = extract_first_page(
            &engine,
            b"%PDF",
            RasterFormat::Jpeg,
            &ConversionConfig::default(),
        )
        .unwrap();
        assert_eq!(page.width, 432);
        assert_eq!(page.quality, Some(95));
        assert_eq!(&page.data[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn wide_render_is_downsampled_to_target() {
        let engine = FakeEngine {
            widths: vec![1000.0],
        };
        let config = ConversionConfig::builder()
            .raster_target_width(500)
            .build()
            .unwrap();
        let page = extract_first_page(&engine, b"%PDF", RasterFormat::Png, &config).unwrap();
        assert_eq!(page.width, 500);
    }

    #[test]
    fn empty_document_fails() {
        let engine = FakeEngine { widths: vec![] };
        let err = extract_first_page(
            &engine,
            b"%PDF",
            RasterFormat::Png,
            &ConversionConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::EmptyDocument));
    }

    #[test]
    fn invalid_bytes_fail_to_open() {
        let engine = FakeEngine {
            widths: vec![600.0],
        };
        let err = extract_pages(
            &engine,
            b"hello",
            RasterFormat::Png,
            &ConversionConfig::default(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::DocumentOpenFailed(_)));
    }

    #[test]
    fn render_height_bound_follows_surface_limit() {
        assert_eq!(max_render_height(1800, 1920 * 1000), 1066);
        assert_eq!(max_render_height(1920, 16384 * 16384), 139_810);
        assert_eq!(max_render_height(0, 100), 100);
        assert_eq!(max_render_height(1000, 10), 1);
    }

    #[test]
    fn tall_page_render_stays_within_surface_limit() {
        let engine = FakeEngine {
            widths: vec![600.0],
        };
        let config = ConversionConfig::builder()
            .max_surface_pixels(1920 * 1000)
            .build()
            .unwrap();
        let page = extract_first_page(&engine, b"%PDF", RasterFormat::Png, &config).unwrap();
        assert_eq!(page.width, 1800);
        assert_eq!(page.height, 1066);
        assert!(u64::from(page.width) * u64::from(page.height) <= config.max_surface_pixels);
    }
}
