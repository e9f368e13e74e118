//! External service boundary
//!
//! [`DocumentService`] is the only way the clients reach the network.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod http;

pub use client::DocumentService;
pub use error::ServiceError;
pub use http::HttpDocumentService;

use crate::config::ServiceConfig;

/// Create the HTTP-backed service from configuration
pub fn create_service(config: &ServiceConfig) -> Result<Arc<dyn DocumentService>, ServiceError> {
    debug!(base_url = %config.base_url, "create_service: called");
    Ok(Arc::new(HttpDocumentService::from_config(config)?))
}
