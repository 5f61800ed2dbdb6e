//! Format tags and the static conversion registry.
//!
//! `jpg` and `jpeg` are two spellings of one format: they share
//! reachability, compare equal after [`FormatTag::canonical`], and only
//! differ in [`FormatTag::display_name`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Canonical identifier of a supported file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag {
    Jpg,
    Jpeg,
    Png,
    Pdf,
    Docx,
    Doc,
}

/// A suffix or format name that is not one of the [`FormatTag`] values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown format '{0}'")]
pub struct UnknownFormat(pub String);

/// Raster encodings a pipeline can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RasterFormat {
    Jpeg,
    Png,
}

impl RasterFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            RasterFormat::Jpeg => "image/jpeg",
            RasterFormat::Png => "image/png",
        }
    }

    /// JPEG has no alpha channel; transparent pixels must be flattened first.
    pub fn has_alpha(&self) -> bool {
        matches!(self, RasterFormat::Png)
    }
}

impl FormatTag {
    pub const ALL: [FormatTag; 6] = [
        FormatTag::Jpg,
        FormatTag::Jpeg,
        FormatTag::Png,
        FormatTag::Pdf,
        FormatTag::Docx,
        FormatTag::Doc,
    ];

    /// Parse a file suffix (`"JPG"`, `".png"`) into a tag.
    pub fn from_extension(ext: &str) -> Option<FormatTag> {
        let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "jpg" => Some(FormatTag::Jpg),
            "jpeg" => Some(FormatTag::Jpeg),
            "png" => Some(FormatTag::Png),
            "pdf" => Some(FormatTag::Pdf),
            "docx" => Some(FormatTag::Docx),
            "doc" => Some(FormatTag::Doc),
            _ => None,
        }
    }

    /// Derive the tag from a file name's suffix, case-insensitively.
    pub fn from_file_name(name: &str) -> Option<FormatTag> {
        Self::from_extension(&file_extension(name))
    }

    /// Collapse aliases: `jpeg` becomes `jpg`, everything else is unchanged.
    pub fn canonical(self) -> FormatTag {
        match self {
            FormatTag::Jpeg => FormatTag::Jpg,
            other => other,
        }
    }

    /// Suffix written on output files (`jpg` for both JPEG spellings).
    pub fn extension(&self) -> &'static str {
        match self.canonical() {
            FormatTag::Jpg | FormatTag::Jpeg => "jpg",
            FormatTag::Png => "png",
            FormatTag::Pdf => "pdf",
            FormatTag::Docx => "docx",
            FormatTag::Doc => "doc",
        }
    }

    /// Lower-case tag name as the user typed it.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatTag::Jpg => "jpg",
            FormatTag::Jpeg => "jpeg",
            FormatTag::Png => "png",
            FormatTag::Pdf => "pdf",
            FormatTag::Docx => "docx",
            FormatTag::Doc => "doc",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FormatTag::Jpg => "JPG",
            FormatTag::Jpeg => "JPEG",
            FormatTag::Png => "PNG",
            FormatTag::Pdf => "PDF",
            FormatTag::Docx => "Word (DOCX)",
            FormatTag::Doc => "Word (DOC)",
        }
    }

    /// MIME type used at the file-picking boundary. Informational only.
    pub fn mime_type(&self) -> &'static str {
        match self {
            FormatTag::Jpg | FormatTag::Jpeg => "image/jpeg",
            FormatTag::Png => "image/png",
            FormatTag::Pdf => "application/pdf",
            FormatTag::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            FormatTag::Doc => "application/msword",
        }
    }

    pub fn raster_format(&self) -> Option<RasterFormat> {
        match self.canonical() {
            FormatTag::Jpg => Some(RasterFormat::Jpeg),
            FormatTag::Png => Some(RasterFormat::Png),
            _ => None,
        }
    }

    /// Alias-aware equality (`jpg` matches `jpeg`).
    pub fn same_format(self, other: FormatTag) -> bool {
        self.canonical() == other.canonical()
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatTag {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormatTag::from_extension(s).ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

// ── Registry ─────────────────────────────────────────────────────────────

const FROM_JPG: &[FormatTag] = &[FormatTag::Png, FormatTag::Pdf];
const FROM_PNG: &[FormatTag] = &[FormatTag::Jpg, FormatTag::Pdf];
const FROM_PDF: &[FormatTag] = &[FormatTag::Jpg, FormatTag::Png];
const FROM_WORD: &[FormatTag] = &[FormatTag::Pdf];

/// Formats reachable from `source`. Aliases share one entry.
pub fn reachable_formats(source: FormatTag) -> &'static [FormatTag] {
    match source.canonical() {
        FormatTag::Jpg | FormatTag::Jpeg => FROM_JPG,
        FormatTag::Png => FROM_PNG,
        FormatTag::Pdf => FROM_PDF,
        FormatTag::Docx | FormatTag::Doc => FROM_WORD,
    }
}

/// Same lookup keyed by a raw suffix; unknown suffixes reach nothing.
pub fn reachable_from_extension(ext: &str) -> &'static [FormatTag] {
    FormatTag::from_extension(ext)
        .map(reachable_formats)
        .unwrap_or(&[])
}

/// Whether the registry has an edge from `source` to `destination`.
pub fn is_reachable(source: FormatTag, destination: FormatTag) -> bool {
    reachable_formats(source)
        .iter()
        .any(|target| target.same_format(destination))
}

/// Every registry row in a stable order, for listings.
pub fn supported_conversions() -> Vec<(FormatTag, &'static [FormatTag])> {
    FormatTag::ALL
        .iter()
        .map(|&tag| (tag, reachable_formats(tag)))
        .collect()
}

// ── File-name helpers ────────────────────────────────────────────────────

/// Lower-cased suffix after the last dot, or `""` when there is none.
pub fn file_extension(name: &str) -> String {
    match name.rfind('.') {
        Some(idx) => name[idx + 1..].to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Replace the suffix of `name` with the canonical suffix of `format`,
/// appending one when `name` has none.
pub fn change_suffix(name: &str, format: FormatTag) -> String {
    let stem = match name.rfind('.') {
        Some(idx) => &name[..idx],
        None => name,
    };
    format!("{}.{}", stem, format.extension())
}

/// Human readable byte count (`0 Bytes`, `1.5 KB`, `10 MB`).
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
