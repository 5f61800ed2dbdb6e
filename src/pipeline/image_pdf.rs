//! Image → PDF: place one JPEG/PNG centred on a single A4 page.
//!
//! Landscape images get a landscape sheet. The image is fitted inside a
//! 10 mm margin with its aspect ratio preserved, then centred on both axes.
//! Wide sources are downsampled to `embed_max_width` before embedding.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::format::RasterFormat;
use crate::pipeline::pdf_writer::{PageSize, Placement, PdfBuilder};
use crate::pipeline::surface::Surface;
use crate::pipeline::transcode::decode_image;
use tracing::debug;

pub const IMAGE_PAGE_MARGIN_MM: f32 = 10.0;

/// Page size and image rectangle for a `width × height` px image.
pub fn fit_on_page(width: u32, height: u32) -> (PageSize, Placement) {
    let ratio = width as f32 / height.max(1) as f32;
    let page = if ratio > 1.0 {
        PageSize::A4_LANDSCAPE
    } else {
        PageSize::A4_PORTRAIT
    };

    let box_w = page.width_mm - 2.0 * IMAGE_PAGE_MARGIN_MM;
    let box_h = page.height_mm - 2.0 * IMAGE_PAGE_MARGIN_MM;
    let (draw_w, draw_h) = if ratio > box_w / box_h {
        (box_w, box_w / ratio)
    } else {
        (box_h * ratio, box_h)
    };

    let placement = Placement {
        x_mm: (page.width_mm - draw_w) / 2.0,
        y_mm: (page.height_mm - draw_h) / 2.0,
        width_mm: draw_w,
        height_mm: draw_h,
    };
    (page, placement)
}

/// Compose a one-page PDF around the image in `bytes`.
pub fn image_to_pdf(bytes: &[u8], config: &ConversionConfig) -> Result<Vec<u8>, ConvertError> {
    let img = decode_image(bytes)?;
    let (page, placement) = fit_on_page(img.width(), img.height());
    debug!(
        "Placing {}x{} px image at {:.1},{:.1} mm ({:.1}x{:.1} mm) on {}x{} mm page",
        img.width(),
        img.height(),
        placement.x_mm,
        placement.y_mm,
        placement.width_mm,
        placement.height_mm,
        page.width_mm,
        page.height_mm
    );

    let mut surface = Surface::for_format(
        img.width(),
        img.height(),
        RasterFormat::Jpeg,
        config.max_surface_pixels,
    )?;
    surface.draw(&img);
    drop(img);
    let surface = surface.downsample_to_width(config.embed_max_width);
    let jpeg = surface.encode(RasterFormat::Jpeg, config.jpeg_quality)?;

    let mut pdf = PdfBuilder::new();
    pdf.add_image_page(page, jpeg, surface.width(), surface.height(), placement)?;
    pdf.finish()
}
