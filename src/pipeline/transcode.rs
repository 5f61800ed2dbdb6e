//! Image → Image: re-encode a JPEG/PNG payload as the other raster format.
//!
//! The output has the exact pixel dimensions of the input. A JPEG target is
//! flattened onto white first, so transparent PNG regions come out white.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::format::RasterFormat;
use crate::pipeline::surface::Surface;
use image::DynamicImage;
use tracing::debug;

/// Decode `bytes` as a raster image, whatever its declared suffix.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ConvertError> {
    let img =
        image::load_from_memory(bytes).map_err(|e| ConvertError::ImageDecodeFailed(e.to_string()))?;
    debug!("Decoded image {}x{}", img.width(), img.height());
    Ok(img)
}

/// Re-encode `bytes` as `target`.
pub fn transcode(
    bytes: &[u8],
    target: RasterFormat,
    config: &ConversionConfig,
) -> Result<Vec<u8>, ConvertError> {
    let img = decode_image(bytes)?;
    let mut surface =
        Surface::for_format(img.width(), img.height(), target, config.max_surface_pixels)?;
    surface.draw(&img);
    surface.encode(target, config.jpeg_quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    fn png_bytes(img: RgbaImage) -> Vec<u8> {
        let mut out = std::io::Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn png_to_jpeg_keeps_dimensions_and_whitens_alpha() {
        let src = png_bytes(RgbaImage::from_pixel(30, 20, Rgba([0, 0, 0, 0])));
        let out = transcode(&src, RasterFormat::Jpeg, &ConversionConfig::default()).unwrap();

        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.dimensions(), (30, 20));
        let px = decoded.to_rgb8().get_pixel(15, 10).0;
        assert!(px.iter().all(|&c| c >= 250), "expected white, got {px:?}");
    }

    #[test]
    fn jpeg_to_png_keeps_dimensions() {
        let jpeg = transcode(
            &png_bytes(RgbaImage::from_pixel(64, 48, Rgba([10, 120, 200, 255]))),
            RasterFormat::Jpeg,
            &ConversionConfig::default(),
        )
        .unwrap();
        let png = transcode(&jpeg, RasterFormat::Png, &ConversionConfig::default()).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
        assert_eq!(decoded.to_rgba8().get_pixel(0, 0)[3], 255);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = transcode(b"not an image", RasterFormat::Png, &ConversionConfig::default())
            .unwrap_err();
        assert!(matches!(err, ConvertError::ImageDecodeFailed(_)));
        assert!(err.to_string().starts_with("Failed to load image"));
    }
}
