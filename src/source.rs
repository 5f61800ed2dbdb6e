//! Source files: the immutable input of one conversion request.
//!
//! The declared format comes from the file name's suffix alone; the bytes
//! are not sniffed. A file whose suffix is not a known [`FormatTag`] keeps
//! its raw suffix so validation can name it in the error message.

use crate::error::ConvertError;
use crate::format::{file_extension, FormatTag};
use std::path::Path;
use tracing::debug;

/// Binary payload plus the metadata the validator and dispatcher need.
#[derive(Debug, Clone)]
pub struct SourceFile {
    payload: Vec<u8>,
    name: String,
    size: u64,
    extension: String,
    declared_format: Option<FormatTag>,
}

impl SourceFile {
    /// Wrap an in-memory payload. Size is the payload length.
    pub fn new(name: impl Into<String>, payload: Vec<u8>) -> Self {
        let size = payload.len() as u64;
        Self::with_declared_size(name, payload, size)
    }

    /// Wrap a payload whose size was reported by the picker rather than
    /// measured (the validator trusts this value).
    pub fn with_declared_size(name: impl Into<String>, payload: Vec<u8>, size: u64) -> Self {
        let name = name.into();
        let extension = file_extension(&name);
        let declared_format = FormatTag::from_extension(&extension);
        Self {
            payload,
            name,
            size,
            extension,
            declared_format,
        }
    }

    /// Read a local file into a `SourceFile`.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        let payload = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => ConvertError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => ConvertError::FileNotFound {
                path: path.to_path_buf(),
            },
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        debug!("Loaded source {} ({} bytes)", name, payload.len());
        Ok(Self::new(name, payload))
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Lower-cased raw suffix, possibly empty or unknown.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// `None` when the suffix is not a supported format.
    pub fn declared_format(&self) -> Option<FormatTag> {
        self.declared_format
    }
}
