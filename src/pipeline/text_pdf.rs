//! DOCX → PDF: flow extracted text onto A4 pages of Helvetica.
//!
//! Layout is fixed: 20 mm margins, 11 pt type, 7 mm line pitch. Lines are
//! wrapped against Helvetica's standard glyph widths, so what is measured
//! here is what the viewer draws with the built-in font.

use crate::error::ConvertError;
use crate::pipeline::docx;
use crate::pipeline::pdf_writer::{PageSize, PdfBuilder, TextLine};
use tracing::debug;

/// Page geometry for flowed text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayout {
    pub page: PageSize,
    pub margin_mm: f32,
    pub font_size: f32,
    pub line_height_mm: f32,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self {
            page: PageSize::A4_PORTRAIT,
            margin_mm: 20.0,
            font_size: 11.0,
            line_height_mm: 7.0,
        }
    }
}

impl TextLayout {
    /// Width available to a line between the side margins.
    pub fn text_width_mm(&self) -> f32 {
        self.page.width_mm - 2.0 * self.margin_mm
    }
}

/// Convert a DOCX payload into a multi-page PDF.
pub fn word_to_pdf(bytes: &[u8], layout: &TextLayout) -> Result<Vec<u8>, ConvertError> {
    let text = docx::extract_text(bytes)?;
    if text.trim().is_empty() {
        return Err(ConvertError::NoTextContent);
    }

    let lines = wrap_text(&text, layout.text_width_mm(), layout.font_size);
    let pages = paginate(lines, layout);
    debug!("Laid out text on {} pages", pages.len());

    let mut pdf = PdfBuilder::new();
    for page in &pages {
        pdf.add_text_page(layout.page, page, layout.font_size)?;
    }
    pdf.finish()
}

/// Place lines top to bottom, starting a new page whenever the cursor has
/// passed the bottom margin.
pub fn paginate(lines: Vec<String>, layout: &TextLayout) -> Vec<Vec<TextLine>> {
    let bottom = layout.page.height_mm - layout.margin_mm;
    let mut pages: Vec<Vec<TextLine>> = Vec::new();
    let mut current: Vec<TextLine> = Vec::new();
    let mut y = layout.margin_mm;

    for text in lines {
        if y > bottom {
            pages.push(std::mem::take(&mut current));
            y = layout.margin_mm;
        }
        current.push(TextLine {
            x_mm: layout.margin_mm,
            baseline_mm: y,
            text,
        });
        y += layout.line_height_mm;
    }
    if !current.is_empty() {
        pages.push(current);
    }
    pages
}

// ── Wrapping ─────────────────────────────────────────────────────────────

/// Split `text` into lines no wider than `max_width_mm` at `font_size` pt.
///
/// Hard line breaks are kept (blank lines included). Lines break at spaces;
/// a single word wider than the line is broken between characters.
pub fn wrap_text(text: &str, max_width_mm: f32, font_size: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for raw in text.split('\n') {
        let raw = raw.trim_end_matches('\r').replace('\t', "    ");
        if raw.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut line = String::new();
        for word in raw.split(' ') {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", line, word)
            };
            if text_width_mm(&candidate, font_size) <= max_width_mm {
                line = candidate;
                continue;
            }

            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if text_width_mm(word, font_size) <= max_width_mm {
                line = word.to_string();
            } else {
                let mut pieces = break_word(word, max_width_mm, font_size);
                line = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            }
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }

    lines
}

fn break_word(word: &str, max_width_mm: f32, font_size: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut width = 0.0;
    for c in word.chars() {
        let w = char_width_mm(c, font_size);
        if width + w > max_width_mm && !piece.is_empty() {
            pieces.push(std::mem::take(&mut piece));
            width = 0.0;
        }
        piece.push(c);
        width += w;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Rendered width of `text` in Helvetica at `font_size` pt, in millimetres.
pub fn text_width_mm(text: &str, font_size: f32) -> f32 {
    text.chars().map(|c| char_width_mm(c, font_size)).sum()
}

fn char_width_mm(c: char, font_size: f32) -> f32 {
    f32::from(helvetica_width(c)) / 1000.0 * font_size * 25.4 / 72.0
}

/// Helvetica advance widths (1/1000 em) for printable ASCII.
#[rustfmt::skip]
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,      // 'p'..'~'
];

fn helvetica_width(c: char) -> u16 {
    match c {
        ' '..='~' => HELVETICA_ASCII[c as usize - 0x20],
        _ => 556,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn layout_defaults() {
        let l = TextLayout::default();
        assert!((l.text_width_mm() - 170.0).abs() < f32::EPSILON);
        assert!((l.font_size - 11.0).abs() < f32::EPSILON);
    }

    #[test]
    fn glyph_widths() {
        assert_eq!(helvetica_width(' '), 278);
        assert_eq!(helvetica_width('W'), 944);
        assert_eq!(helvetica_width('~'), 584);
        assert_eq!(helvetica_width('é'), 556);
    }

    #[test]
    fn short_text_is_one_line() {
        assert_eq!(wrap_text("Hello world", 170.0, 11.0), vec!["Hello world"]);
    }

    #[test]
    fn hard_breaks_and_blank_lines_survive() {
        let lines = wrap_text("one\n\ntwo", 170.0, 11.0);
        assert_eq!(lines, vec!["one", "", "two"]);
    }

    #[test]
    fn long_paragraph_wraps_at_spaces() {
        let text = "lorem ipsum dolor sit amet ".repeat(30);
        let lines = wrap_text(text.trim(), 170.0, 11.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width_mm(line, 11.0) <= 170.0);
            assert!(!line.starts_with(' '));
        }
    }

    #[test]
    fn overlong_word_is_split() {
        let word = "x".repeat(400);
        let lines = wrap_text(&word, 170.0, 11.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn thirty_seven_lines_per_page() {
        let layout = TextLayout::default();
        let lines: Vec<String> = (0..80).map(|i| format!("line {i}")).collect();
        let pages = paginate(lines, &layout);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].len(), 37);
        assert_eq!(pages[1].len(), 37);
        assert_eq!(pages[2].len(), 6);
        assert!((pages[1][0].baseline_mm - 20.0).abs() < f32::EPSILON);
        assert_eq!(pages[2][0].text, "line 74");
    }

    #[test]
    fn no_lines_no_pages() {
        assert!(paginate(Vec::new(), &TextLayout::default()).is_empty());
    }

    fn words_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-zA-Z0-9,.!?]{1,30}", 0..120).prop_map(|w| w.join(" "))
    }

    proptest! {
        /// Property: every wrapped line fits the measure.
        #[test]
        fn prop_lines_fit_width(text in words_strategy(), width in 20.0f32..200.0) {
            for line in wrap_text(&text, width, 11.0) {
                prop_assert!(text_width_mm(&line, 11.0) <= width + 1e-3);
            }
        }

        /// Property: wrapping never drops or reorders non-space characters.
        #[test]
        fn prop_wrap_preserves_characters(text in words_strategy()) {
            let joined: String = wrap_text(&text, 60.0, 11.0).concat();
            let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
            prop_assert_eq!(strip(&joined), strip(&text));
        }
    }
}
