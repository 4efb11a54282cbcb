//! Export errors

use std::io;

/// Failure of a track export batch
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Destination directory or file can't be written
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Track metadata or records could not be obtained
    #[error("Record source unavailable: {0}")]
    RecordSourceUnavailable(String),

    /// I/O failure while writing the document
    #[error("Failed on write the GPX: {0}")]
    EncodingFailure(#[from] io::Error),
}

impl ExportError {
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::StorageUnavailable(msg.into())
    }

    pub fn record_source<S: Into<String>>(msg: S) -> Self {
        Self::RecordSourceUnavailable(msg.into())
    }
}
