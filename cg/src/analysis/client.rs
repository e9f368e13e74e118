//! Analysis client: one analyze request with a cosmetic progress indicator

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::ticker::ProgressTicker;
use crate::config::ProgressConfig;
use crate::domain::AnalysisResponse;
use crate::events::EventEmitter;
use crate::service::{DocumentService, ServiceError};
use crate::state::OpState;

const GENERIC_FAILURE: &str = "Failed to fetch analysis";

/// Errors from a single analyze invocation
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No file URL provided")]
    MissingUrl,

    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: ServiceError,
    },
}

/// Fetches the risk analysis of one document URL
///
/// Owns the operation state, the last result or error message, and the
/// progress channel. Every call to [`AnalysisClient::analyze`] issues a fresh
/// request; nothing is cached.
pub struct AnalysisClient {
    service: Arc<dyn DocumentService>,
    events: EventEmitter,
    progress_config: ProgressConfig,
    progress: Arc<watch::Sender<f64>>,
    state: OpState,
    result: Option<AnalysisResponse>,
    error: Option<String>,
}

impl AnalysisClient {
    pub fn new(service: Arc<dyn DocumentService>, config: &ProgressConfig, events: EventEmitter) -> Self {
        let (progress, _) = watch::channel(0.0);
        Self {
            service,
            events,
            progress_config: config.clone(),
            progress: Arc::new(progress),
            state: OpState::Idle,
            result: None,
            error: None,
        }
    }

    pub fn state(&self) -> OpState {
        self.state
    }

    /// Subscribe to the progress indicator (0-100)
    pub fn progress(&self) -> watch::Receiver<f64> {
        self.progress.subscribe()
    }

    pub fn progress_value(&self) -> f64 {
        *self.progress.borrow()
    }

    pub fn result(&self) -> Option<&AnalysisResponse> {
        self.result.as_ref()
    }

    /// Message of the last failure, if the last invocation failed
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Request the analysis of `document_url`
    ///
    /// The previous result, error and state are replaced only once the request
    /// settles. Dropping the returned future before then stops the progress
    /// ticker and keeps all three as they were.
    pub async fn analyze(&mut self, document_url: Option<&str>) -> Result<&AnalysisResponse, AnalysisError> {
        let url = match document_url.map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => {
                debug!("analyze: no document URL, not sending a request");
                let err = AnalysisError::MissingUrl;
                self.state.settle(false);
                self.result = None;
                self.error = Some(err.to_string());
                self.progress.send_replace(100.0);
                self.events.error("Analysis failed", &err.to_string());
                return Err(err);
            }
        };

        debug!(%url, "analyze: called");
        let in_flight = InFlight::enter(&mut self.state);

        let ticker = ProgressTicker::start(self.progress.clone(), &self.progress_config);
        let outcome = self.service.analyze(&url).await;
        ticker.stop().await;
        self.progress.send_replace(100.0);

        match outcome {
            Ok(analysis) => {
                let summary = &analysis.document_summary;
                info!(
                    %url,
                    score = summary.overall_risk_score,
                    total = summary.total_clauses,
                    risky = summary.risky_clause_count,
                    "analyze: success"
                );
                self.events.info(
                    "Analysis complete",
                    &format!(
                        "{} of {} clauses flagged as risky",
                        summary.risky_clause_count, summary.total_clauses
                    ),
                );
                in_flight.settle(true);
                self.error = None;
                Ok(&*self.result.insert(analysis))
            }
            Err(source) => {
                let message = source.detail_or(GENERIC_FAILURE);
                warn!(%url, error = %source, "analyze: failed");
                self.events.error("Analysis failed", &message);
                in_flight.settle(false);
                self.result = None;
                self.error = Some(message.clone());
                Err(AnalysisError::Failed { message, source })
            }
        }
    }
}

/// `in_progress` for the duration of one request
///
/// Dropped without [`InFlight::settle`], it puts back the state the client had
/// before the request.
struct InFlight<'a> {
    state: &'a mut OpState,
    previous: OpState,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn enter(state: &'a mut OpState) -> Self {
        let previous = *state;
        state.begin();
        Self {
            state,
            previous,
            settled: false,
        }
    }

    fn settle(mut self, success: bool) {
        self.state.settle(success);
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            debug!(restored = %self.previous, "InFlight::drop: request abandoned");
            *self.state = self.previous;
        }
    }
}
