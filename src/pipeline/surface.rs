//! Off-screen RGBA drawing surface shared by every raster stage.
//!
//! A [`Surface`] is the one place pixels are composed and re-encoded.
//! JPEG has no alpha, so a surface headed for JPEG is filled white before
//! anything is drawn; PNG keeps whatever transparency the source had.

use crate::error::ConvertError;
use crate::format::RasterFormat;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use std::io::Cursor;
use tracing::debug;

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// A fixed-size RGBA canvas.
#[derive(Debug, Clone)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    /// Allocate a transparent `width × height` surface.
    ///
    /// Fails with [`ConvertError::SurfaceUnavailable`] for a zero dimension
    /// or when the area exceeds `max_pixels`.
    pub fn new(width: u32, height: u32, max_pixels: u64) -> Result<Self, ConvertError> {
        let area = u64::from(width) * u64::from(height);
        if width == 0 || height == 0 || area > max_pixels {
            return Err(ConvertError::SurfaceUnavailable { width, height });
        }
        Ok(Self {
            pixels: RgbaImage::new(width, height),
        })
    }

    /// Allocate a surface prepared for `format`: white-filled for JPEG,
    /// transparent for PNG.
    pub fn for_format(
        width: u32,
        height: u32,
        format: RasterFormat,
        max_pixels: u64,
    ) -> Result<Self, ConvertError> {
        let mut surface = Self::new(width, height, max_pixels)?;
        if !format.has_alpha() {
            surface.fill(WHITE);
        }
        Ok(surface)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn fill(&mut self, color: Rgba<u8>) {
        for px in self.pixels.pixels_mut() {
            *px = color;
        }
    }

    /// Alpha-blend `image` onto the surface with its top-left at the origin.
    pub fn draw(&mut self, image: &DynamicImage) {
        imageops::overlay(&mut self.pixels, &image.to_rgba8(), 0, 0);
    }

    /// Shrink to `max_width` keeping the aspect ratio; no-op when already
    /// narrow enough.
    pub fn downsample_to_width(self, max_width: u32) -> Self {
        let (w, h) = (self.width(), self.height());
        if w <= max_width || max_width == 0 {
            return self;
        }
        let new_h = ((f64::from(h) * f64::from(max_width) / f64::from(w)).round() as u32).max(1);
        debug!("Downsampling surface {}x{} → {}x{}", w, h, max_width, new_h);
        Self {
            pixels: imageops::resize(&self.pixels, max_width, new_h, FilterType::Triangle),
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.pixels.get_pixel(x, y)
    }

    /// Encode the surface. `quality` applies to JPEG only.
    pub fn encode(&self, format: RasterFormat, quality: u8) -> Result<Vec<u8>, ConvertError> {
        let (w, h) = (self.width(), self.height());
        let mut buffer = Cursor::new(Vec::new());

        match format {
            RasterFormat::Jpeg => {
                let rgb = DynamicImage::ImageRgba8(self.pixels.clone()).to_rgb8();
                JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
                    .write_image(rgb.as_raw(), w, h, ExtendedColorType::Rgb8)
                    .map_err(|e| ConvertError::EncodeFailed(e.to_string()))?;
            }
            RasterFormat::Png => {
                PngEncoder::new(&mut buffer)
                    .write_image(self.pixels.as_raw(), w, h, ExtendedColorType::Rgba8)
                    .map_err(|e| ConvertError::EncodeFailed(e.to_string()))?;
            }
        }

        let bytes = buffer.into_inner();
        if bytes.is_empty() {
            return Err(ConvertError::EncodeFailed(
                "encoder produced no output".into(),
            ));
        }
        Ok(bytes)
    }
}
