//! clauseguard - contract risk review client
//!
//! Stages PDF contracts, uploads them to a storage endpoint, asks an external
//! analysis service for a clause-by-clause risk assessment and lets the user
//! ask follow-up questions about the document.
//!
//! # Flow
//!
//! intake -> upload -> (public URL) -> analysis -> presentation, with the chat
//! loop running against the same URL.
//!
//! # Modules
//!
//! - [`intake`] - Validation and staging of local PDF files
//! - [`upload`] - Transfer of staged files to storage
//! - [`analysis`] - Analysis request with a cosmetic progress indicator
//! - [`chat`] - Question answering and the transcript
//! - [`service`] - The `DocumentService` seam and its HTTP implementation
//! - [`events`] - Notifications and status events for front ends
//! - [`render`] - Terminal presentation
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod analysis;
pub mod chat;
pub mod cli;
pub mod config;
pub mod domain;
pub mod events;
pub mod intake;
pub mod render;
pub mod repl;
pub mod service;
pub mod state;
pub mod upload;

pub use analysis::{AnalysisClient, AnalysisError, ProgressTicker};
pub use chat::{ChatClient, ChatOutcome};
pub use config::Config;
pub use domain::{
    AnalysisResponse, ChatMessage, ClauseAnalysis, ClauseCategory, DocumentSummary, FileId, FileStatus, PdfSource,
    RiskBand, Sender, Transcript, UploadedFile, WorkingSet,
};
pub use events::{ClientEvent, EventBus, EventEmitter, Notification, Severity};
pub use intake::{FileIntake, IntakeReport, Rejection, format_file_size};
pub use service::{DocumentService, HttpDocumentService, ServiceError, create_service};
pub use state::OpState;
pub use upload::{FileOutcome, UploadClient, UploadError, UploadOutcome};
