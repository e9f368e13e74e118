//! Domain types shared by the intake, upload, analysis and chat clients

mod analysis;
mod chat;
mod error;
mod file;

pub use analysis::{AnalysisResponse, CategoryCount, ClauseAnalysis, ClauseCategory, DocumentSummary, RiskBand};
pub use chat::{APOLOGY, ChatMessage, GREETING, Sender, Transcript};
pub use error::DomainError;
pub use file::{FileId, FileStatus, PdfSource, PreviewHandle, UploadedFile, WorkingSet};
