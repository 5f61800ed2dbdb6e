//! Pre-flight checks run before any pipeline is allowed to start.
//!
//! Both checks only look at values already known about the source (its
//! declared size and suffix); no bytes are read and no I/O happens.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::format::{is_reachable, FormatTag};
use crate::source::SourceFile;

/// Fail with [`ConvertError::SizeExceeded`] when `size > limit`.
pub fn check_size(size: u64, limit: u64) -> Result<(), ConvertError> {
    if size > limit {
        return Err(ConvertError::SizeExceeded { size, limit });
    }
    Ok(())
}

/// Resolve `source_ext` and check the registry has an edge to `destination`.
///
/// Distinguishes an unknown source (`Input format 'gif' is not supported`)
/// from a known source with no such edge.
pub fn check_pair(source_ext: &str, destination: FormatTag) -> Result<FormatTag, ConvertError> {
    let source =
        FormatTag::from_extension(source_ext).ok_or_else(|| ConvertError::UnsupportedSource {
            format: source_ext.to_string(),
        })?;

    if !is_reachable(source, destination) {
        return Err(ConvertError::UnsupportedPair {
            from: source.to_string(),
            to: destination.to_string(),
        });
    }
    Ok(source)
}

/// Run both checks; returns the resolved source format.
pub fn validate(
    source: &SourceFile,
    destination: FormatTag,
    config: &ConversionConfig,
) -> Result<FormatTag, ConvertError> {
    check_size(source.size(), config.max_file_size)?;
    check_pair(source.extension(), destination)
}
