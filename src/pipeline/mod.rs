//! Conversion pipelines and the building blocks they share.
//!
//! Every pipeline is a blocking, pure function of its input bytes and the
//! [`crate::ConversionConfig`]; the dispatcher moves them onto a blocking
//! thread.
//!
//! ## Data Flow
//!
//! ```text
//! jpg/png ──▶ transcode ────────────────────────────▶ png/jpg
//! jpg/png ──▶ image_pdf ──▶ pdf_writer ─────────────▶ pdf
//! pdf ──────▶ render (engine) ──▶ surface ──────────▶ jpg/png
//! docx ─────▶ docx ──▶ text_pdf ──▶ pdf_writer ─────▶ pdf
//! ```
//!
//! 1. [`transcode`]: decode, composite onto a [`surface::Surface`], re-encode
//! 2. [`image_pdf`]: fit one image on an A4 page
//! 3. [`render`]: rasterise PDF pages through an [`engine::RasterEngine`]
//! 4. [`docx`]: pull run text out of `word/document.xml`
//! 5. [`text_pdf`]: wrap and paginate text, then write it with [`pdf_writer`]

pub mod docx;
pub mod engine;
pub mod image_pdf;
pub mod pdf_writer;
pub mod render;
pub mod surface;
pub mod text_pdf;
pub mod transcode;
