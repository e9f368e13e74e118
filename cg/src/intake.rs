//! File intake: validate candidates and stage them in the working set
//!
//! A candidate is accepted when it is a PDF and no larger than the configured
//! limit. Rejected candidates produce a notification and never touch the
//! working set.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::IntakeConfig;
use crate::domain::{FileId, PdfSource, PreviewHandle, UploadedFile, WorkingSet};
use crate::events::{EventEmitter, Notification};

/// Default size limit: 10 MiB
pub const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// The only accepted MIME type
pub const PDF_MIME: &str = "application/pdf";

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Why a candidate was not staged
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("{name}: {size} bytes exceeds the {limit} byte limit")]
    TooLarge { name: String, size: u64, limit: u64 },

    #[error("{name}: not a PDF ({reason})")]
    InvalidType { name: String, reason: String },
}

impl Rejection {
    pub fn name(&self) -> &str {
        match self {
            Rejection::TooLarge { name, .. } | Rejection::InvalidType { name, .. } => name,
        }
    }

    /// Category-specific notification for this rejection
    pub fn notification(&self) -> Notification {
        match self {
            Rejection::TooLarge { name, limit, .. } => Notification::error(
                "File too large",
                format!("{}: please select files smaller than {}", name, format_file_size(*limit)),
            ),
            Rejection::InvalidType { name, reason } => Notification::error(
                "Invalid file type",
                format!("{}: please select PDF files only ({})", name, reason),
            ),
        }
    }
}

/// Result of one `accept` call
#[derive(Debug, Default)]
pub struct IntakeReport {
    /// Ids of newly staged files, in input order
    pub accepted: Vec<FileId>,
    /// Candidates that were dropped, in input order
    pub rejected: Vec<Rejection>,
}

/// Validates candidates and appends accepted ones to a [`WorkingSet`]
pub struct FileIntake {
    max_size: u64,
    previews: bool,
    events: EventEmitter,
}

impl FileIntake {
    pub fn new(config: &IntakeConfig, events: EventEmitter) -> Self {
        debug!(max_size = config.max_file_size_bytes, previews = config.previews, "FileIntake::new: called");
        Self {
            max_size: config.max_file_size_bytes,
            previews: config.previews,
            events,
        }
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Validate in-memory candidates and stage the accepted ones
    pub fn accept(&self, set: &mut WorkingSet, candidates: Vec<PdfSource>) -> IntakeReport {
        debug!(count = candidates.len(), "FileIntake::accept: called");
        let outcomes = candidates.into_iter().map(|c| self.check(c)).collect();
        self.stage(set, outcomes)
    }

    /// Read files from disk, validate them and stage the accepted ones
    ///
    /// Oversized files are rejected from their metadata without being read.
    pub fn accept_paths(&self, set: &mut WorkingSet, paths: &[PathBuf]) -> IntakeReport {
        debug!(count = paths.len(), "FileIntake::accept_paths: called");
        let outcomes = paths.iter().map(|p| self.load(p).and_then(|c| self.check(c))).collect();
        self.stage(set, outcomes)
    }

    fn load(&self, path: &Path) -> Result<PdfSource, Rejection> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let unreadable = |e: std::io::Error| Rejection::InvalidType {
            name: name.clone(),
            reason: format!("unreadable: {}", e),
        };

        let metadata = std::fs::metadata(path).map_err(unreadable)?;
        if !metadata.is_file() {
            debug!(path = %path.display(), "FileIntake::load: not a regular file");
            return Err(Rejection::InvalidType {
                name: name.clone(),
                reason: "not a regular file".to_string(),
            });
        }
        if metadata.len() > self.max_size {
            debug!(path = %path.display(), size = metadata.len(), "FileIntake::load: too large by metadata");
            return Err(Rejection::TooLarge {
                name: name.clone(),
                size: metadata.len(),
                limit: self.max_size,
            });
        }

        PdfSource::from_path(path).map_err(unreadable)
    }

    /// Type first, then size
    fn check(&self, candidate: PdfSource) -> Result<PdfSource, Rejection> {
        if let Err(reason) = sniff_pdf(&candidate) {
            debug!(name = %candidate.name(), %reason, "FileIntake::check: invalid type");
            return Err(Rejection::InvalidType {
                name: candidate.name().to_string(),
                reason,
            });
        }
        if candidate.size() > self.max_size {
            debug!(name = %candidate.name(), size = candidate.size(), "FileIntake::check: too large");
            return Err(Rejection::TooLarge {
                name: candidate.name().to_string(),
                size: candidate.size(),
                limit: self.max_size,
            });
        }
        Ok(candidate)
    }

    fn stage(&self, set: &mut WorkingSet, outcomes: Vec<Result<PdfSource, Rejection>>) -> IntakeReport {
        let mut report = IntakeReport::default();

        for outcome in outcomes {
            match outcome {
                Ok(source) => {
                    let preview = if self.previews {
                        match PreviewHandle::create(&source) {
                            Ok(p) => Some(p),
                            Err(e) => {
                                warn!(name = %source.name(), error = %e, "Could not create preview copy");
                                None
                            }
                        }
                    } else {
                        None
                    };
                    report.accepted.push(set.push(UploadedFile::new(source, preview)));
                }
                Err(rejection) => {
                    info!(%rejection, "Rejected file");
                    self.events.notify(rejection.notification());
                    report.rejected.push(rejection);
                }
            }
        }

        if !report.accepted.is_empty() {
            self.events.info(
                "Files added successfully",
                &format!("{} PDF file(s) ready for analysis", report.accepted.len()),
            );
        }

        debug!(
            accepted = report.accepted.len(),
            rejected = report.rejected.len(),
            staged = set.len(),
            "FileIntake::stage: done"
        );
        report
    }
}

/// Decide whether a candidate is `application/pdf`
///
/// A declared MIME type wins over the extension; the `%PDF-` magic is
/// always required.
fn sniff_pdf(candidate: &PdfSource) -> Result<(), String> {
    match candidate.declared_mime() {
        Some(mime) if !mime.eq_ignore_ascii_case(PDF_MIME) => {
            return Err(format!("declared type {}", mime));
        }
        Some(_) => {}
        None => {
            let has_pdf_ext = Path::new(candidate.name())
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
            if !has_pdf_ext {
                return Err("missing .pdf extension".to_string());
            }
        }
    }

    if !candidate.bytes().starts_with(PDF_MAGIC) {
        return Err("content is not a PDF".to_string());
    }
    Ok(())
}

/// Human-readable size: base 1024, two decimals, trailing zeros trimmed
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut idx = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && idx < UNITS.len() - 1 {
        value /= 1024.0;
        idx += 1;
    }
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[idx])
}
