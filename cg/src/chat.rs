//! Chat client: question answering about one analyzed document

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{APOLOGY, ChatMessage, Transcript};
use crate::service::DocumentService;

/// What a call to [`ChatClient::ask`] did to the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatOutcome {
    /// Blank question or no document: nothing sent, nothing appended
    Skipped,
    /// Question and answer appended
    Answered,
    /// Question and the apology appended
    Failed,
}

pub struct ChatClient {
    service: Arc<dyn DocumentService>,
    transcript: Transcript,
}

impl ChatClient {
    pub fn new(service: Arc<dyn DocumentService>) -> Self {
        Self {
            service,
            transcript: Transcript::new(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Ask `question` about the document at `document_url`
    pub async fn ask(&mut self, document_url: Option<&str>, question: &str) -> ChatOutcome {
        let question = question.trim();
        let url = match document_url.map(str::trim) {
            Some(url) if !url.is_empty() && !question.is_empty() => url,
            _ => {
                debug!(has_url = document_url.is_some(), "ask: skipped");
                return ChatOutcome::Skipped;
            }
        };

        debug!(%url, question_len = question.len(), "ask: called");
        self.transcript.push(ChatMessage::user(question));

        match self.service.ask(url, question).await {
            Ok(answer) => {
                debug!(answer_len = answer.len(), "ask: answered");
                self.transcript.push(ChatMessage::assistant(answer));
                ChatOutcome::Answered
            }
            Err(e) => {
                warn!(%url, error = %e, "ask: chat request failed");
                self.transcript.push(ChatMessage::assistant(APOLOGY));
                ChatOutcome::Failed
            }
        }
    }
}
