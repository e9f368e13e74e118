//! Staged files and the working set
//!
//! An [`UploadedFile`] moves through `ready -> uploading -> {success, error}`
//! and never backwards. The [`WorkingSet`] owns every staged file together
//! with its preview copy, which is deleted from disk when the file is removed
//! or the set is dropped.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use super::error::DomainError;

/// Local identifier assigned to a file at intake time
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(String);

impl FileId {
    /// Generate a fresh, unique id
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().simple().to_string())
    }

    /// Create from an existing id string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the full id string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for display (last 8 hex chars, which are random in a v7 uuid)
    pub fn short(&self) -> &str {
        let start = self.0.len().saturating_sub(8);
        &self.0[start..]
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Upload lifecycle status of a staged file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ready,
    Uploading,
    Success,
    Error,
}

impl FileStatus {
    /// Whether moving from `self` to `next` keeps the lifecycle monotonic
    pub fn can_transition_to(self, next: FileStatus) -> bool {
        matches!(
            (self, next),
            (FileStatus::Ready, FileStatus::Uploading)
                | (FileStatus::Uploading, FileStatus::Success)
                | (FileStatus::Uploading, FileStatus::Error)
        )
    }

    /// Success and error are terminal
    pub fn is_terminal(self) -> bool {
        matches!(self, FileStatus::Success | FileStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileStatus::Ready => "ready",
            FileStatus::Uploading => "uploading",
            FileStatus::Success => "success",
            FileStatus::Error => "error",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The underlying file handle: a name, its bytes, and where it came from
#[derive(Debug, Clone)]
pub struct PdfSource {
    name: String,
    path: Option<PathBuf>,
    declared_mime: Option<String>,
    bytes: Arc<[u8]>,
}

impl PdfSource {
    /// Read a file from disk
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "PdfSource::from_path: called");
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            path: Some(path.to_path_buf()),
            declared_mime: None,
            bytes: bytes.into(),
        })
    }

    /// Build from in-memory bytes
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            name: name.into(),
            path: None,
            declared_mime: None,
            bytes: bytes.into(),
        }
    }

    /// Attach a MIME type declared by the caller (overrides extension sniffing)
    pub fn with_declared_mime(mut self, mime: impl Into<String>) -> Self {
        self.declared_mime = Some(mime.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn declared_mime(&self) -> Option<&str> {
        self.declared_mime.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Local preview copy of a staged file
///
/// The copy lives in the system temp dir and is removed when the handle drops.
#[derive(Debug)]
pub struct PreviewHandle {
    file: NamedTempFile,
}

impl PreviewHandle {
    /// Write a preview copy of `source`
    pub fn create(source: &PdfSource) -> io::Result<Self> {
        debug!(name = %source.name(), size = source.size(), "PreviewHandle::create: called");
        let mut file = tempfile::Builder::new().prefix("cg-preview-").suffix(".pdf").tempfile()?;
        file.write_all(source.bytes())?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// `file://` URL of the preview copy
    pub fn url(&self) -> String {
        format!("file://{}", self.path().display())
    }
}

/// A file staged for upload
#[derive(Debug)]
pub struct UploadedFile {
    id: FileId,
    source: PdfSource,
    status: FileStatus,
    progress: u8,
    remote_url: Option<String>,
    preview: Option<PreviewHandle>,
}

impl UploadedFile {
    /// Stage a new file in the `ready` state
    pub fn new(source: PdfSource, preview: Option<PreviewHandle>) -> Self {
        let id = FileId::generate();
        debug!(%id, name = %source.name(), "UploadedFile::new: called");
        Self {
            id,
            source,
            status: FileStatus::Ready,
            progress: 0,
            remote_url: None,
            preview,
        }
    }

    pub fn id(&self) -> &FileId {
        &self.id
    }

    pub fn source(&self) -> &PdfSource {
        &self.source
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn size(&self) -> u64 {
        self.source.size()
    }

    pub fn status(&self) -> FileStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }

    pub fn preview_url(&self) -> Option<String> {
        self.preview.as_ref().map(PreviewHandle::url)
    }

    pub fn preview_path(&self) -> Option<&Path> {
        self.preview.as_ref().map(PreviewHandle::path)
    }

    fn transition(&mut self, next: FileStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            debug!(id = %self.id, from = %self.status, to = %next, "UploadedFile::transition: rejected");
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        debug!(id = %self.id, from = %self.status, to = %next, "UploadedFile::transition");
        self.status = next;
        Ok(())
    }

    /// ready -> uploading
    pub(crate) fn begin_upload(&mut self) -> Result<(), DomainError> {
        self.transition(FileStatus::Uploading)?;
        self.progress = 0;
        Ok(())
    }

    /// uploading -> success, recording the remote URL
    pub(crate) fn complete(&mut self, remote_url: String) -> Result<(), DomainError> {
        self.transition(FileStatus::Success)?;
        self.remote_url = Some(remote_url);
        self.progress = 100;
        Ok(())
    }

    /// uploading -> error
    pub(crate) fn fail(&mut self) -> Result<(), DomainError> {
        self.transition(FileStatus::Error)
    }
}

/// Client-local list of files staged for upload
#[derive(Debug, Default)]
pub struct WorkingSet {
    files: Vec<UploadedFile>,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UploadedFile> {
        self.files.iter()
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn get(&self, id: &FileId) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: &FileId) -> Option<&mut UploadedFile> {
        self.files.iter_mut().find(|f| f.id() == id)
    }

    /// Append a file (no de-duplication)
    pub fn push(&mut self, file: UploadedFile) -> FileId {
        let id = file.id().clone();
        debug!(%id, count = self.files.len() + 1, "WorkingSet::push");
        self.files.push(file);
        id
    }

    /// Remove a file, releasing its preview copy
    ///
    /// Files in the `uploading` state are busy and cannot be removed.
    pub fn remove(&mut self, id: &FileId) -> Result<(), DomainError> {
        debug!(%id, "WorkingSet::remove: called");
        let pos = self
            .files
            .iter()
            .position(|f| f.id() == id)
            .ok_or_else(|| DomainError::UnknownFile(id.clone()))?;

        if self.files[pos].status() == FileStatus::Uploading {
            debug!(%id, "WorkingSet::remove: file is uploading");
            return Err(DomainError::FileBusy(id.clone()));
        }

        // Dropping the file drops its PreviewHandle, which deletes the temp copy
        drop(self.files.remove(pos));
        Ok(())
    }

    /// Ids of files still in the `ready` state, in order
    pub fn ready_ids(&self) -> Vec<FileId> {
        self.files
            .iter()
            .filter(|f| f.status() == FileStatus::Ready)
            .map(|f| f.id().clone())
            .collect()
    }

    pub fn any_uploading(&self) -> bool {
        self.files.iter().any(|f| f.status() == FileStatus::Uploading)
    }
}
