//! Configuration types for file conversion.
//!
//! Every knob the pipelines read lives in [`ConversionConfig`], built via
//! its [`ConversionConfigBuilder`]. Defaults reproduce the reference
//! behaviour: a 10 MiB upload ceiling, JPEG quality 0.95, and 1920 px as the
//! width bound for both rasterised pages and embedded images.

use crate::error::ConvertError;
use crate::progress::Observer;
use std::fmt;

/// Default upload ceiling: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Configuration for a conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_convert::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .jpeg_quality(90)
///     .raster_target_width(1280)
///     .build()
///     .unwrap();
/// assert_eq!(config.raster_target_width, 1280);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Largest accepted payload in bytes. Default: 10 MiB.
    ///
    /// A payload of exactly this size passes; one byte more fails with
    /// [`ConvertError::SizeExceeded`].
    pub max_file_size: u64,

    /// Quality for lossy (JPEG) output, 1–100. Default: 95.
    pub jpeg_quality: u8,

    /// Width the PDF rasterizer aims for, in pixels. Default: 1920.
    pub raster_target_width: u32,

    /// Upper bound on the render scale relative to a page's native width.
    /// Default: 3.0.
    ///
    /// Stops a tiny page (a business card, a label) from being blown up
    /// 20× just to reach the target width.
    pub max_render_scale: f32,

    /// Images wider than this are downsampled before being embedded into a
    /// PDF. Default: 1920.
    pub embed_max_width: u32,

    /// Largest drawing surface (width × height) that may be allocated.
    /// Default: 16384 × 16384.
    pub max_surface_pixels: u64,

    /// Optional state/page observer. Default: None.
    pub observer: Option<Observer>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            jpeg_quality: 95,
            raster_target_width: 1920,
            max_render_scale: 3.0,
            embed_max_width: 1920,
            max_surface_pixels: 16384 * 16384,
            observer: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("max_file_size", &self.max_file_size)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("raster_target_width", &self.raster_target_width)
            .field("max_render_scale", &self.max_render_scale)
            .field("embed_max_width", &self.embed_max_width)
            .field("max_surface_pixels", &self.max_surface_pixels)
            .field(
                "observer",
                &self.observer.as_ref().map(|_| "<dyn ConversionObserver>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn raster_target_width(mut self, px: u32) -> Self {
        self.config.raster_target_width = px.max(16);
        self
    }

    pub fn max_render_scale(mut self, scale: f32) -> Self {
        self.config.max_render_scale = scale.clamp(0.1, 10.0);
        self
    }

    pub fn embed_max_width(mut self, px: u32) -> Self {
        self.config.embed_max_width = px.max(16);
        self
    }

    pub fn max_surface_pixels(mut self, pixels: u64) -> Self {
        self.config.max_surface_pixels = pixels;
        self
    }

    pub fn observer(mut self, observer: Observer) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        if c.max_file_size == 0 {
            return Err(ConvertError::InvalidConfig(
                "Maximum file size must be ≥ 1 byte".into(),
            ));
        }
        if !c.max_render_scale.is_finite() {
            return Err(ConvertError::InvalidConfig(format!(
                "Render scale must be finite, got {}",
                c.max_render_scale
            )));
        }
        let widest = u64::from(c.raster_target_width.max(c.embed_max_width));
        if c.max_surface_pixels < widest {
            return Err(ConvertError::InvalidConfig(format!(
                "Surface limit of {} px cannot hold a {} px wide row",
                c.max_surface_pixels, widest
            )));
        }
        Ok(self.config)
    }
}
