//! Minimal PDF composer on top of `lopdf`.
//!
//! Callers lay pages out in millimetres with a top-left origin (y grows
//! downward). This module converts to PDF points and flips the y-axis.
//! Two page kinds are supported: one full-colour JPEG image, or lines of
//! Helvetica text.

use crate::error::ConvertError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

const PT_PER_MM: f32 = 72.0 / 25.4;

pub fn mm_to_pt(mm: f32) -> f32 {
    mm * PT_PER_MM
}

/// Physical page size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PageSize {
    pub const A4_PORTRAIT: PageSize = PageSize {
        width_mm: 210.0,
        height_mm: 297.0,
    };
    pub const A4_LANDSCAPE: PageSize = PageSize {
        width_mm: 297.0,
        height_mm: 210.0,
    };

    pub fn width_pt(&self) -> f32 {
        mm_to_pt(self.width_mm)
    }

    pub fn height_pt(&self) -> f32 {
        mm_to_pt(self.height_mm)
    }
}

/// Rectangle on a page, top-left origin, millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

/// One line of text; `baseline_mm` is measured from the top edge.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub x_mm: f32,
    pub baseline_mm: f32,
    pub text: String,
}

/// Incrementally builds a PDF document in memory.
pub struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    font_id: Option<ObjectId>,
}

impl Default for PdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
            font_id: None,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Add a page showing one baseline JPEG at `placement`.
    pub fn add_image_page(
        &mut self,
        size: PageSize,
        jpeg: Vec<u8>,
        pixel_width: u32,
        pixel_height: u32,
        placement: Placement,
    ) -> Result<(), ConvertError> {
        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(pixel_width),
                "Height" => i64::from(pixel_height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        )
        .with_compression(false);
        let image_id = self.doc.add_object(image);

        let w = mm_to_pt(placement.width_mm);
        let h = mm_to_pt(placement.height_mm);
        let x = mm_to_pt(placement.x_mm);
        let y = size.height_pt() - mm_to_pt(placement.y_mm) - h;

        let ops = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![w.into(), 0.into(), 0.into(), h.into(), x.into(), y.into()],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ];
        let resources = dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        };
        self.push_page(size, ops, resources)
    }

    /// Add a page of Helvetica text lines at `font_size` points.
    pub fn add_text_page(
        &mut self,
        size: PageSize,
        lines: &[TextLine],
        font_size: f32,
    ) -> Result<(), ConvertError> {
        let font_id = self.font();

        let mut ops = Vec::with_capacity(lines.len() * 2 + 3);
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![Object::Name(b"F1".to_vec()), font_size.into()],
        ));
        for line in lines {
            let x = mm_to_pt(line.x_mm);
            let y = size.height_pt() - mm_to_pt(line.baseline_mm);
            ops.push(Operation::new(
                "Tm",
                vec![1.into(), 0.into(), 0.into(), 1.into(), x.into(), y.into()],
            ));
            ops.push(Operation::new(
                "Tj",
                vec![Object::String(
                    encode_win_ansi(&line.text),
                    StringFormat::Literal,
                )],
            ));
        }
        ops.push(Operation::new("ET", vec![]));

        let resources = dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        };
        self.push_page(size, ops, resources)
    }

    /// Serialise the document.
    pub fn finish(mut self) -> Result<Vec<u8>, ConvertError> {
        if self.page_ids.is_empty() {
            return Err(ConvertError::DocumentBuildFailed(
                "document has no pages".into(),
            ));
        }

        let kids: Vec<Object> = self.page_ids.iter().map(|&id| id.into()).collect();
        let count = kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let info_id = self.doc.add_object(dictionary! {
            "Producer" => Object::string_literal(concat!("edgequake-convert ", env!("CARGO_PKG_VERSION"))),
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.trailer.set("Info", info_id);
        self.doc.compress();

        let mut out = Vec::new();
        self.doc
            .save_to(&mut out)
            .map_err(|e| ConvertError::DocumentBuildFailed(e.to_string()))?;
        debug!("Built PDF: {} pages, {} bytes", count, out.len());
        Ok(out)
    }

    fn font(&mut self) -> ObjectId {
        if let Some(id) = self.font_id {
            return id;
        }
        let id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        self.font_id = Some(id);
        id
    }

    fn push_page(
        &mut self,
        size: PageSize,
        ops: Vec<Operation>,
        resources: lopdf::Dictionary,
    ) -> Result<(), ConvertError> {
        let content = Content { operations: ops }
            .encode()
            .map_err(|e| ConvertError::DocumentBuildFailed(e.to_string()))?;
        let content_id = self
            .doc
            .add_object(Stream::new(lopdf::Dictionary::new(), content));

        let media_box: Vec<Object> = vec![
            0.into(),
            0.into(),
            size.width_pt().into(),
            size.height_pt().into(),
        ];
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => media_box,
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.page_ids.push(page_id);
        Ok(())
    }
}

/// Map text onto WinAnsiEncoding bytes. Unmappable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> u8 {
    match c {
        '\u{20}'..='\u{7E}' => c as u8,
        '\u{A0}'..='\u{FF}' => c as u32 as u8,
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => b'?',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_jpeg() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 2, image::Rgb([9, 9, 9]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Jpeg)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn empty_document_is_rejected() {
        let err = PdfBuilder::new().finish().unwrap_err();
        assert!(matches!(err, ConvertError::DocumentBuildFailed(_)));
    }

    #[test]
    fn image_page_round_trips_through_lopdf() {
        let mut b = PdfBuilder::new();
        b.add_image_page(
            PageSize::A4_LANDSCAPE,
            tiny_jpeg(),
            4,
            2,
            Placement {
                x_mm: 10.0,
                y_mm: 10.0,
                width_mm: 100.0,
                height_mm: 50.0,
            },
        )
        .unwrap();
        let bytes = b.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn text_pages_share_one_font() {
        let mut b = PdfBuilder::new();
        let line = TextLine {
            x_mm: 20.0,
            baseline_mm: 20.0,
            text: "Hello (world)".into(),
        };
        b.add_text_page(PageSize::A4_PORTRAIT, std::slice::from_ref(&line), 11.0)
            .unwrap();
        b.add_text_page(PageSize::A4_PORTRAIT, &[line], 11.0).unwrap();
        assert_eq!(b.page_count(), 2);

        let doc = Document::load_mem(&b.finish().unwrap()).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn win_ansi_mapping() {
        assert_eq!(encode_win_ansi("Aé€"), vec![b'A', 0xE9, 0x80]);
        assert_eq!(encode_win_ansi("“x”"), vec![0x93, b'x', 0x94]);
        assert_eq!(encode_win_ansi("日"), vec![b'?']);
    }

    #[test]
    fn millimetres_to_points() {
        assert!((mm_to_pt(25.4) - 72.0).abs() < 1e-4);
        assert!((PageSize::A4_PORTRAIT.width_pt() - 595.28).abs() < 0.01);
    }
}
