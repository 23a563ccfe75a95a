//! Error types for gribview.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using GribviewError.
pub type GribviewResult<T> = Result<T, GribviewError>;

/// Failure to turn a record locator into samples or metadata.
///
/// Callers in the viewer never propagate these: a failed decode degrades to
/// an empty grid (blank raster, missing samples).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Source unavailable: {source_id}: {reason}")]
    SourceUnavailable { source_id: String, reason: String },

    #[error("No message at offset {offset} in {source_id}")]
    InvalidOffset { source_id: String, offset: u64 },

    #[error("Invalid GRIB data: {0}")]
    Format(String),

    #[error("Unsupported GRIB edition {0}")]
    UnsupportedEdition(u8),

    #[error("Section {section} invalid: {reason}")]
    InvalidSection { section: u8, reason: String },

    #[error("Unpacking failed: {0}")]
    Unpacking(String),
}

/// Failure writing one of the flat outputs (PNG, CSV, GRIB selection).
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to export: {0}")]
    NothingToExport(String),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error("Record {index} could not be read: {source}")]
    Record {
        index: usize,
        #[source]
        source: DecodeError,
    },
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Primary error type for gribview operations.
#[derive(Debug, Error)]
pub enum GribviewError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for GribviewError {
    fn from(err: std::io::Error) -> Self {
        GribviewError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for GribviewError {
    fn from(err: serde_json::Error) -> Self {
        GribviewError::Internal(format!("JSON error: {}", err))
    }
}
