//! Analysis client and its progress indicator

mod client;
mod ticker;

pub use client::{AnalysisClient, AnalysisError};
pub use ticker::ProgressTicker;
