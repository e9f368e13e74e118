//! Upload client
//!
//! Sends every `ready` file of a [`WorkingSet`] to the storage endpoint and
//! records the resulting public URL. Files are transferred one after another
//! unless `upload.concurrency` allows more; either way the working set is only
//! mutated here, by the single owner of the submission.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, info, warn};

use crate::config::UploadConfig;
use crate::domain::{DomainError, FileId, FileStatus, PdfSource, WorkingSet};
use crate::events::EventEmitter;
use crate::service::{DocumentService, ServiceError};
use crate::state::OpState;

/// Errors that stop a submission before any transfer starts
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No files selected")]
    NoFilesSelected,

    #[error("All staged files have already been processed")]
    NothingToUpload,

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Final state of one file after a submission
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub id: FileId,
    pub name: String,
    pub status: FileStatus,
    pub remote_url: Option<String>,
    pub error: Option<String>,
}

/// Result of [`UploadClient::submit`]: per-file outcomes in input order
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub files: Vec<FileOutcome>,
    /// Remote URL of the last file that succeeded, if any did
    pub redirect: Option<String>,
}

impl UploadOutcome {
    pub fn succeeded(&self) -> usize {
        self.files.iter().filter(|f| f.status == FileStatus::Success).count()
    }

    pub fn failed(&self) -> usize {
        self.files.iter().filter(|f| f.status == FileStatus::Error).count()
    }
}

/// Message from a concurrent transfer task to the owner of the working set
enum TransferMessage {
    Started(FileId),
    Finished(FileId, Result<String, ServiceError>),
}

pub struct UploadClient {
    service: Arc<dyn DocumentService>,
    events: EventEmitter,
    concurrency: usize,
    state: OpState,
}

impl UploadClient {
    pub fn new(service: Arc<dyn DocumentService>, config: &UploadConfig, events: EventEmitter) -> Self {
        Self {
            service,
            events,
            concurrency: config.concurrency.max(1),
            state: OpState::Idle,
        }
    }

    pub fn state(&self) -> OpState {
        self.state
    }

    /// Upload every `ready` file in `set`
    ///
    /// Individual failures do not stop the submission; they are reported in
    /// the outcome and as notifications. If the returned future is dropped
    /// mid-transfer, files still `uploading` are marked `error` so they can be
    /// removed, and the client state settles to `error`.
    pub async fn submit(&mut self, set: &mut WorkingSet) -> Result<UploadOutcome, UploadError> {
        debug!(files = set.len(), concurrency = self.concurrency, "submit: called");

        if set.is_empty() {
            debug!("submit: empty working set");
            self.events.error("No files selected", "Please upload at least one PDF file");
            return Err(UploadError::NoFilesSelected);
        }

        let ids = set.ready_ids();
        if ids.is_empty() {
            debug!("submit: no ready files");
            self.events
                .error("Nothing to upload", "All staged files have already been processed");
            return Err(UploadError::NothingToUpload);
        }

        self.state.begin();
        let mut transfer = Transfer {
            service: &self.service,
            events: &self.events,
            state: &mut self.state,
            set,
            ids,
        };
        let errors = if self.concurrency > 1 && transfer.ids.len() > 1 {
            transfer.run_concurrent(self.concurrency).await?
        } else {
            transfer.run_sequential().await?
        };
        Ok(transfer.finish(errors))
    }
}

/// One submission in flight
///
/// Holds the working set for the duration of the transfers. Dropping it before
/// [`Transfer::finish`] fails every file it left in `uploading`.
struct Transfer<'a> {
    service: &'a Arc<dyn DocumentService>,
    events: &'a EventEmitter,
    state: &'a mut OpState,
    set: &'a mut WorkingSet,
    ids: Vec<FileId>,
}

impl Transfer<'_> {
    async fn run_sequential(&mut self) -> Result<HashMap<FileId, String>, UploadError> {
        let mut errors = HashMap::new();
        for id in self.ids.clone() {
            let source = self.start(&id)?;
            let result = self.service.upload(&source).await;
            if let Some(message) = self.settle(&id, result)? {
                errors.insert(id, message);
            }
        }
        Ok(errors)
    }

    async fn run_concurrent(&mut self, concurrency: usize) -> Result<HashMap<FileId, String>, UploadError> {
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let (tx, mut rx) = mpsc::channel(self.ids.len() * 2);

        for id in &self.ids {
            let source = self
                .set
                .get(id)
                .map(|file| file.source().clone())
                .ok_or_else(|| DomainError::UnknownFile(id.clone()))?;
            let service = self.service.clone();
            let semaphore = semaphore.clone();
            let tx = tx.clone();
            let id = id.clone();

            tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                debug!(%id, "transfer task: got permit");
                if tx.send(TransferMessage::Started(id.clone())).await.is_err() {
                    return;
                }
                let result = service.upload(&source).await;
                let _ = tx.send(TransferMessage::Finished(id, result)).await;
            });
        }
        drop(tx);

        let mut errors = HashMap::new();
        while let Some(message) = rx.recv().await {
            match message {
                TransferMessage::Started(id) => {
                    self.start(&id)?;
                }
                TransferMessage::Finished(id, result) => {
                    if let Some(message) = self.settle(&id, result)? {
                        errors.insert(id, message);
                    }
                }
            }
        }

        // A task that died without reporting still owes its file a terminal status
        for id in self.ids.clone() {
            let status = self.set.get(&id).map(|f| f.status());
            if status.is_some_and(|s| !s.is_terminal()) {
                warn!(%id, "run_concurrent: task ended without a result");
                if status == Some(FileStatus::Ready) {
                    self.start(&id)?;
                }
                let lost = Err(ServiceError::MalformedResponse("upload task ended unexpectedly".to_string()));
                if let Some(message) = self.settle(&id, lost)? {
                    errors.insert(id, message);
                }
            }
        }
        Ok(errors)
    }

    /// ready -> uploading; returns the bytes to send
    fn start(&mut self, id: &FileId) -> Result<PdfSource, UploadError> {
        let file = self.set.get_mut(id).ok_or_else(|| DomainError::UnknownFile(id.clone()))?;
        file.begin_upload()?;
        debug!(%id, name = %file.name(), "start: uploading");
        self.events.file_status(file);
        Ok(file.source().clone())
    }

    /// uploading -> success | error; returns the failure detail, if any
    fn settle(&mut self, id: &FileId, result: Result<String, ServiceError>) -> Result<Option<String>, UploadError> {
        let file = self.set.get_mut(id).ok_or_else(|| DomainError::UnknownFile(id.clone()))?;
        let failure = match result {
            Ok(url) => {
                debug!(%id, %url, "settle: success");
                file.complete(url)?;
                None
            }
            Err(e) => {
                warn!(%id, name = %file.name(), error = %e, "settle: upload failed");
                file.fail()?;
                self.events.error(
                    "Upload failed",
                    &format!("There was an error uploading {}. Please try again.", file.name()),
                );
                Some(e.to_string())
            }
        };
        self.events.file_status(file);
        Ok(failure)
    }

    /// Build the outcome in input order, emit the redirect and settle the state
    fn finish(mut self, mut errors: HashMap<FileId, String>) -> UploadOutcome {
        let files: Vec<FileOutcome> = self
            .ids
            .iter()
            .filter_map(|id| self.set.get(id))
            .map(|file| FileOutcome {
                id: file.id().clone(),
                name: file.name().to_string(),
                status: file.status(),
                remote_url: file.remote_url().map(str::to_string),
                error: errors.remove(file.id()),
            })
            .collect();

        let redirect = files
            .iter()
            .rev()
            .find(|f| f.status == FileStatus::Success)
            .and_then(|f| f.remote_url.clone());
        let outcome = UploadOutcome { files, redirect };

        let succeeded = outcome.succeeded();
        info!(succeeded, failed = outcome.failed(), "submit: complete");
        if let Some(url) = &outcome.redirect {
            self.events.info(
                "Upload complete",
                &format!("{} of {} file(s) uploaded", succeeded, outcome.files.len()),
            );
            self.events.redirect(url);
        }
        self.state.settle(succeeded > 0);
        outcome
    }
}

impl Drop for Transfer<'_> {
    fn drop(&mut self) {
        for id in &self.ids {
            let Some(file) = self.set.get_mut(id) else {
                continue;
            };
            if file.status() == FileStatus::Uploading && file.fail().is_ok() {
                warn!(%id, name = %file.name(), "Transfer::drop: upload abandoned");
                self.events.file_status(file);
            }
        }
        if self.state.is_in_progress() {
            self.state.settle(false);
        }
    }
}
