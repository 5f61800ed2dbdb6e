//! Conversion outcomes and the download handle for produced bytes.

use crate::error::{ConvertError, FailureReason};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Bytes produced by a pipeline plus their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    data: Vec<u8>,
    mime_type: String,
}

impl OutputArtifact {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// `data:<mime>;base64,<payload>` for handing straight to a browser.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }

    /// Write the bytes to `path` atomically.
    ///
    /// The data lands in a temp file beside `path` first and is renamed
    /// into place, so a reader never sees a half-written file.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<PathBuf, ConvertError> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let write_err = |source: std::io::Error| ConvertError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&parent).map_err(write_err)?;
        tmp.write_all(&self.data).map_err(write_err)?;
        tmp.flush().map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;

        debug!("Wrote {} bytes to {}", self.data.len(), path.display());
        Ok(path.to_path_buf())
    }
}

/// Result of one `convert` call. Exactly one variant is ever produced.
#[derive(Debug, Clone)]
pub enum ConversionOutcome {
    Success {
        artifact: OutputArtifact,
        /// Source name with its suffix replaced by the destination's.
        file_name: String,
    },
    Failure {
        reason: FailureReason,
        message: String,
    },
}

impl ConversionOutcome {
    pub fn failure(reason: FailureReason, message: impl Into<String>) -> Self {
        ConversionOutcome::Failure {
            reason,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ConversionOutcome::Success { .. })
    }

    pub fn artifact(&self) -> Option<&OutputArtifact> {
        match self {
            ConversionOutcome::Success { artifact, .. } => Some(artifact),
            ConversionOutcome::Failure { .. } => None,
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        match self {
            ConversionOutcome::Success { file_name, .. } => Some(file_name),
            ConversionOutcome::Failure { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            ConversionOutcome::Success { .. } => None,
            ConversionOutcome::Failure { reason, .. } => Some(*reason),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ConversionOutcome::Success { .. } => None,
            ConversionOutcome::Failure { message, .. } => Some(message),
        }
    }

    /// Flat, serialisable summary without the payload.
    pub fn report(&self) -> OutcomeReport {
        match self {
            ConversionOutcome::Success {
                artifact,
                file_name,
            } => OutcomeReport {
                success: true,
                file_name: Some(file_name.clone()),
                mime_type: Some(artifact.mime_type().to_string()),
                size_bytes: Some(artifact.len() as u64),
                reason: None,
                error: None,
            },
            ConversionOutcome::Failure { reason, message } => OutcomeReport {
                success: false,
                file_name: None,
                mime_type: None,
                size_bytes: None,
                reason: Some(*reason),
                error: Some(message.clone()),
            },
        }
    }
}

/// JSON-friendly view of a [`ConversionOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
