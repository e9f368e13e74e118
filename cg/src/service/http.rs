//! HTTP implementation of [`DocumentService`]
//!
//! - upload: `POST` multipart form with a single `file` part, answers `{"publicUrl": ...}`
//! - analyze: `GET ?fileUrl=` or `POST {"fileUrl": ...}` depending on [`RequestStyle`]
//! - chat: `GET ?fileUrl=&question=`, answers `{"answer": ...}`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{DocumentService, ServiceError};
use crate::config::{RequestStyle, ServiceConfig};
use crate::domain::{AnalysisResponse, PdfSource};

const PDF_MIME: &str = "application/pdf";

#[derive(Debug, Deserialize)]
struct UploadReply {
    #[serde(rename = "publicUrl", alias = "fileUrl")]
    public_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    answer: String,
}

/// reqwest-backed client for the three external endpoints
pub struct HttpDocumentService {
    http: Client,
    config: ServiceConfig,
}

impl HttpDocumentService {
    /// Create a new client from service configuration
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServiceError> {
        debug!(?config, "HttpDocumentService::from_config: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(concat!("clauseguard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Turn a response into its body text, mapping non-2xx to `ServiceError::Api`
    async fn body_of(response: Response) -> Result<String, ServiceError> {
        let status = response.status();
        if !status.is_success() {
            debug!(%status, "HttpDocumentService::body_of: non-success status");
            return Err(ServiceError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        let text = response.text().await?;
        debug!(%status, body_len = text.len(), "HttpDocumentService::body_of: success");
        Ok(text)
    }

    fn parse<T: DeserializeOwned>(body: &str) -> Result<T, ServiceError> {
        serde_json::from_str(body).map_err(|e| ServiceError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl DocumentService for HttpDocumentService {
    async fn upload(&self, file: &PdfSource) -> Result<String, ServiceError> {
        let url = self.config.upload_url();
        debug!(%url, name = %file.name(), size = file.size(), "upload: called");

        let part = Part::bytes(file.bytes().to_vec())
            .file_name(file.name().to_string())
            .mime_str(PDF_MIME)?;
        let form = Form::new().part("file", part);

        let response = self.http.post(&url).multipart(form).send().await?;
        let body = Self::body_of(response).await?;
        let reply: UploadReply = Self::parse(&body)?;

        match reply.public_url {
            Some(public_url) if !public_url.is_empty() => {
                debug!(%public_url, "upload: success");
                Ok(public_url)
            }
            _ => {
                debug!("upload: response has no publicUrl");
                Err(ServiceError::MalformedResponse("response has no publicUrl".to_string()))
            }
        }
    }

    async fn analyze(&self, document_url: &str) -> Result<AnalysisResponse, ServiceError> {
        let url = self.config.analyze_url();
        debug!(%url, %document_url, style = ?self.config.request_style, "analyze: called");

        let request = match self.config.request_style {
            RequestStyle::Query => self.http.get(&url).query(&[("fileUrl", document_url)]),
            RequestStyle::Json => self
                .http
                .post(&url)
                .json(&serde_json::json!({ "fileUrl": document_url })),
        };

        let response = request.send().await?;
        let body = Self::body_of(response).await?;
        let analysis: AnalysisResponse = Self::parse(&body)?;
        analysis.validate().map_err(ServiceError::MalformedResponse)?;

        if !analysis.is_consistent() {
            warn!(
                total_clauses = analysis.document_summary.total_clauses,
                listed = analysis.clause_by_clause_analysis.len(),
                "analyze: clause list length differs from total_clauses"
            );
        }

        Ok(analysis)
    }

    async fn ask(&self, document_url: &str, question: &str) -> Result<String, ServiceError> {
        let url = self.config.chat_url();
        debug!(%url, %document_url, question_len = question.len(), "ask: called");

        let response = self
            .http
            .get(&url)
            .query(&[("fileUrl", document_url), ("question", question)])
            .send()
            .await?;
        let body = Self::body_of(response).await?;
        let reply: ChatReply = Self::parse(&body)?;
        Ok(reply.answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_reply_accepts_both_field_names() {
        let reply: UploadReply = serde_json::from_str(r#"{"publicUrl": "https://x/a.pdf"}"#).unwrap();
        assert_eq!(reply.public_url.as_deref(), Some("https://x/a.pdf"));

        let reply: UploadReply =
            serde_json::from_str(r#"{"message": "Upload successful", "fileUrl": "https://x/b.pdf"}"#).unwrap();
        assert_eq!(reply.public_url.as_deref(), Some("https://x/b.pdf"));

        let reply: UploadReply = serde_json::from_str(r#"{"error": "bucket missing"}"#).unwrap();
        assert!(reply.public_url.is_none());
    }

    #[test]
    fn test_parse_reports_malformed() {
        let err = HttpDocumentService::parse::<ChatReply>("{\"reply\": 1}").unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_from_config() {
        let service = HttpDocumentService::from_config(&ServiceConfig::default()).unwrap();
        assert_eq!(service.config().analyze_url(), "http://127.0.0.1:8000/analyze");
    }
}
