//! Domain error types

use thiserror::Error;

use super::file::{FileId, FileStatus};

/// Errors from working-set and lifecycle operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: FileStatus, to: FileStatus },

    #[error("File not found in working set: {0}")]
    UnknownFile(FileId),

    #[error("File is uploading and cannot be removed: {0}")]
    FileBusy(FileId),
}
