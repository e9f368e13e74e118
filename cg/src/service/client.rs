//! DocumentService trait definition

use async_trait::async_trait;

use super::ServiceError;
use crate::domain::{AnalysisResponse, PdfSource};

/// The external storage, analysis and chat backends
///
/// Every call is independent: one request, one response, no retry.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Store a file and return its publicly addressable URL
    async fn upload(&self, file: &PdfSource) -> Result<String, ServiceError>;

    /// Request a risk analysis of the document at `document_url`
    async fn analyze(&self, document_url: &str) -> Result<AnalysisResponse, ServiceError>;

    /// Ask a question about the document at `document_url`
    async fn ask(&self, document_url: &str, question: &str) -> Result<String, ServiceError>;
}
